use crate::buffer::RecordBuffer;
use crate::client::{HttpLogStore, StoreError};
use crate::config::ShipperConfig;
use crate::identity;
use crate::publisher::Publisher;
use crate::record::LogRecord;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Seam for the host logging framework: called for every record it emits.
/// Implementations must be cheap and never touch the network.
pub trait RecordSink: Send + Sync {
    fn on_record(&self, record: LogRecord);
}

/// Known noisy diagnostic emitted by instrumentation SDKs when they observe
/// our own outbound log writes. Enqueueing it would feed the loop, so it is
/// suppressed by substring match before buffering.
const SUPPRESSED_DIAGNOSTIC: &str =
    "Failed to begin subsegment named 'AWSLogs': segment cannot be found";

/// Buffers records from arbitrary threads and flushes them to the remote
/// service on a fixed cadence.
///
/// The flush loop runs in a single spawned task that owns the [`Publisher`],
/// so publish cycles never overlap. Shutdown stops future cycles; an
/// in-flight send always completes, but records still buffered at that point
/// are dropped.
pub struct Shipper {
    buffer: Arc<RecordBuffer>,
    flush_interval: Duration,
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Shipper {
    pub fn new(flush_interval: Duration) -> Self {
        Self {
            buffer: Arc::new(RecordBuffer::new()),
            flush_interval,
            shutdown: CancellationToken::new(),
            task: None,
        }
    }

    /// Build everything from config and start flushing: HTTP store, process
    /// identity, publisher (fatal on container/stream bring-up failure),
    /// then the periodic flush task.
    pub async fn launch(config: ShipperConfig) -> Result<Self, StoreError> {
        let store = Arc::new(HttpLogStore::new(&config)?);
        let identity = identity::resolve(config.metadata_url.as_deref()).await;
        info!(
            instance = %identity.instance_id,
            host = %identity.host_address,
            container = %config.container,
            "starting log shipper"
        );

        let publisher =
            Publisher::connect(store, config.container, config.stream_prefix, identity).await?;

        let mut shipper = Self::new(config.flush_interval);
        shipper.start(publisher);
        Ok(shipper)
    }

    /// Spawn the flush loop. The publisher moves into the task; serialized
    /// publishing falls out of single ownership.
    pub fn start(&mut self, mut publisher: Publisher) {
        let buffer = Arc::clone(&self.buffer);
        let shutdown = self.shutdown.clone();
        let flush_interval = self.flush_interval;

        self.task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(flush_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick fires immediately; skip it so the initial flush
            // waits a full interval like every later one.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        let mut batch = buffer.drain();
                        if batch.is_empty() {
                            continue;
                        }
                        batch.sort_by_key(|r| r.timestamp);
                        if let Err(err) = publisher.publish(&batch).await {
                            // Accepted policy: failed batches are dropped,
                            // the next cycle starts clean.
                            error!(
                                error = %err,
                                dropped = batch.len(),
                                "failed to publish log batch"
                            );
                        }
                    }
                }
            }
        }));
    }

    /// Stop scheduling flush cycles and wait for the current one to finish.
    pub async fn stop(&mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                error!(error = %err, "flush task ended abnormally");
            }
        }
    }

    /// Number of records currently waiting for the next flush.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

impl RecordSink for Shipper {
    fn on_record(&self, record: LogRecord) {
        if record.message.contains(SUPPRESSED_DIAGNOSTIC) {
            return;
        }
        self.buffer.append(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Level;
    use chrono::Utc;

    fn make_record(message: &str) -> LogRecord {
        LogRecord {
            timestamp: Utc::now(),
            level: Level::Info,
            logger: "app.Logger".to_string(),
            thread: "main".to_string(),
            message: message.to_string(),
            error: None,
        }
    }

    #[test]
    fn test_on_record_buffers() {
        let shipper = Shipper::new(Duration::from_secs(7));
        shipper.on_record(make_record("hello"));
        shipper.on_record(make_record("world"));
        assert_eq!(shipper.pending(), 2);
    }

    #[test]
    fn test_suppressed_diagnostic_never_buffered() {
        let shipper = Shipper::new(Duration::from_secs(7));
        shipper.on_record(make_record(&format!("prefix {SUPPRESSED_DIAGNOSTIC} suffix")));
        shipper.on_record(make_record(SUPPRESSED_DIAGNOSTIC));
        assert_eq!(shipper.pending(), 0);

        // Only the exact substring is suppressed, not anything that looks
        // similar.
        shipper.on_record(make_record("Failed to begin subsegment"));
        assert_eq!(shipper.pending(), 1);
    }
}
