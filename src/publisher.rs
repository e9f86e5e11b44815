use crate::client::{LogStore, StoreError, WriteEntry};
use crate::format;
use crate::identity::ProcessIdentity;
use crate::naming;
use crate::record::LogRecord;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Owns the write-continuation token and the daily stream lifecycle for one
/// process.
///
/// Not internally synchronized: the flush task is the only caller, and it
/// calls `publish` serially. Construction fails fatally if the remote
/// container cannot be listed or created; everything after construction is
/// handled per-cycle.
pub struct Publisher {
    store: Arc<dyn LogStore>,
    container: String,
    stream_prefix: String,
    identity: ProcessIdentity,
    /// Token from the most recent successful write or rotation. Absent only
    /// before the current stream has ever been written to.
    token: Option<String>,
    /// Time the last write was *initiated* (not completed). Drives the
    /// proactive day-boundary rotation check.
    last_publish: Option<DateTime<Utc>>,
}

impl Publisher {
    /// Build a publisher: ensure the container exists, then adopt today's
    /// stream. Remote errors here propagate; a publisher that could not
    /// complete construction is never used.
    pub async fn connect(
        store: Arc<dyn LogStore>,
        container: impl Into<String>,
        stream_prefix: impl Into<String>,
        identity: ProcessIdentity,
    ) -> Result<Self, StoreError> {
        let mut publisher = Self {
            store,
            container: container.into(),
            stream_prefix: stream_prefix.into(),
            identity,
            token: None,
            last_publish: None,
        };

        publisher.ensure_container().await?;
        publisher.rotate_stream().await?;
        Ok(publisher)
    }

    /// Idempotent check-then-create for the remote container. Pages through
    /// the listing until an exact name match or the pages run out.
    async fn ensure_container(&self) -> Result<(), StoreError> {
        let mut page_token: Option<String> = None;
        loop {
            let page = self
                .store
                .list_containers(&self.container, page_token.as_deref())
                .await?;

            if page.containers.iter().any(|c| c.name == self.container) {
                return Ok(());
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        info!(container = %self.container, "container missing, creating it");
        self.store.create_container(&self.container).await
    }

    /// Adopt today's stream: reuse it (and its token) if it exists, create it
    /// otherwise. Creation does not return a usable token, so a fresh stream
    /// is re-listed to pick up its initial (absent) token.
    pub async fn rotate_stream(&mut self) -> Result<(), StoreError> {
        let name = self.stream_name();

        let streams = self.store.list_streams(&self.container, &name).await?;
        if let Some(stream) = streams.into_iter().next() {
            self.token = stream.continuation_token;
            debug!(stream = %name, "adopted existing stream");
            return Ok(());
        }

        self.store.create_stream(&self.container, &name).await?;

        let streams = self.store.list_streams(&self.container, &name).await?;
        self.token = streams.into_iter().next().and_then(|s| s.continuation_token);
        info!(stream = %name, "created stream");
        Ok(())
    }

    /// Send one drained, timestamp-ordered batch.
    ///
    /// Rotates first if no write has been attempted since the start of the
    /// current UTC day. A write rejected for token or missing-stream reasons
    /// gets exactly one rotate-and-retry; any other failure (and a failed
    /// retry) is returned to the caller, which drops the batch.
    pub async fn publish(&mut self, batch: &[LogRecord]) -> Result<(), StoreError> {
        if !self.published_today() {
            self.rotate_stream().await?;
        }

        let entries: Vec<WriteEntry> = batch
            .iter()
            .filter(|r| !r.message.trim().is_empty() || r.error.is_some())
            .map(|r| WriteEntry {
                timestamp: r.timestamp.timestamp_millis(),
                message: format::render(r),
            })
            .collect();

        if entries.is_empty() {
            return Ok(());
        }

        self.last_publish = Some(Utc::now());

        let stream = self.stream_name();
        match self
            .store
            .write(&self.container, &stream, &entries, self.token.as_deref())
            .await
        {
            Ok(token) => {
                self.token = Some(token);
                Ok(())
            }
            Err(err) if err.is_recoverable() => {
                // Stale token, or the day rolled over and the stream is gone.
                // Reacquire and retry the same payload once.
                warn!(error = %err, "write rejected, rotating stream and retrying");
                self.rotate_stream().await?;

                let stream = self.stream_name();
                let token = self
                    .store
                    .write(&self.container, &stream, &entries, self.token.as_deref())
                    .await?;
                self.token = Some(token);
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    fn stream_name(&self) -> String {
        naming::stream_name(
            &self.stream_prefix,
            Utc::now().date_naive(),
            &self.identity.host_address,
            &self.identity.instance_id,
        )
    }

    fn published_today(&self) -> bool {
        let today_start = Utc::now()
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .expect("midnight is a valid time")
            .and_utc();
        self.last_publish.is_some_and(|t| t >= today_start)
    }
}
