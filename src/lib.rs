//! Ships application log records to a remote append-only log-stream service.
//!
//! Producer threads hand records to a [`Shipper`] through the
//! [`RecordSink`] seam; a single periodic task drains the pending buffer,
//! formats the batch and writes it to one stream per (day, host, process)
//! identity, tracking the continuation token the service demands on every
//! write. Stale tokens and vanished streams (daily rotation) are recovered
//! transparently with a single rotate-and-retry.

pub mod buffer;
pub mod client;
pub mod config;
pub mod format;
pub mod identity;
pub mod naming;
pub mod publisher;
pub mod record;
pub mod shipper;

pub use buffer::RecordBuffer;
pub use client::{HttpLogStore, LogStore, StoreError};
pub use config::ShipperConfig;
pub use identity::ProcessIdentity;
pub use publisher::Publisher;
pub use record::{ErrorInfo, Level, LogRecord};
pub use shipper::{RecordSink, Shipper};
