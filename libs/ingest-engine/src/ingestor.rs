use std::sync::Arc;

use tokio::io::AsyncRead;

use ingest_api::{IngestError, RecordPublisher};

use crate::batch::Batch;
use crate::source::RecordSource;
use crate::splitter::LineSplitter;

/// Where records of one request are published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicPolicy {
    /// Process-wide default topic.
    Configured,
    /// Topic supplied by the request itself.
    Request(String),
}

/// Outcome of one ingestion request. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    /// Records the publisher accepted. Failed attempts are not counted.
    pub records_written: usize,
    pub error: Option<IngestError>,
}

impl IngestReport {
    fn failed(records_written: usize, error: IngestError) -> Self {
        Self { records_written, error: Some(error) }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Count on success, the error otherwise.
    pub fn into_result(self) -> Result<usize, IngestError> {
        match self.error {
            None => Ok(self.records_written),
            Some(e) => Err(e),
        }
    }
}

/// Drives record sources into the publisher.
///
/// Holds the only process-wide state of the gateway: the publisher handle
/// and the default topic. Cheap to share behind an `Arc`.
pub struct Ingestor {
    publisher: Arc<dyn RecordPublisher>,
    default_topic: String,
    max_line_length: usize,
}

impl Ingestor {
    pub fn new(publisher: Arc<dyn RecordPublisher>, default_topic: impl Into<String>) -> Self {
        Self {
            publisher,
            default_topic: default_topic.into(),
            max_line_length: 0,
        }
    }

    /// Limit for upload lines in bytes (0 = unlimited).
    pub fn with_max_line_length(mut self, max_line_length: usize) -> Self {
        self.max_line_length = max_line_length;
        self
    }

    fn resolve_topic<'a>(&'a self, policy: &'a TopicPolicy) -> &'a str {
        match policy {
            TopicPolicy::Configured => &self.default_topic,
            TopicPolicy::Request(topic) => topic,
        }
    }

    /// Publish every record of `source` in order.
    ///
    /// Stops at the first source error or the first rejected publish.
    /// Records accepted before the failure stay published.
    pub async fn run<S: RecordSource>(&self, policy: &TopicPolicy, mut source: S) -> IngestReport {
        let topic = self.resolve_topic(policy);
        let mut written = 0usize;

        loop {
            let record = match source.next_record().await {
                Ok(Some(record)) => record,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(topic = %topic, records = written, error = ?e, "source failed");
                    return IngestReport::failed(written, e);
                }
            };

            if let Err(e) = self.publisher.publish(topic, record).await {
                tracing::warn!(topic = %topic, records = written, error = ?e, "publish rejected, aborting");
                return IngestReport::failed(written, e);
            }
            written += 1;
        }

        tracing::info!(topic = %topic, records = written, "ingestion completed");
        IngestReport {
            records_written: written,
            error: None,
        }
    }

    /// Newline-delimited upload into the configured topic.
    ///
    /// `reader` is owned for the duration of the call and dropped on return.
    pub async fn ingest_stream<R>(&self, reader: R) -> IngestReport
    where
        R: AsyncRead + Unpin + Send,
    {
        let splitter = LineSplitter::new(reader).max_length(self.max_line_length);
        self.run(&TopicPolicy::Configured, splitter).await
    }

    /// Batch JSON body into the topic named by the body.
    pub async fn ingest_batch(&self, body: &[u8]) -> IngestReport {
        let batch = match Batch::parse(body) {
            Ok(batch) => batch,
            Err(e) => {
                tracing::warn!(error = ?e, "malformed batch request");
                return IngestReport::failed(0, e);
            }
        };
        let policy = TopicPolicy::Request(batch.topic.clone());
        self.run(&policy, batch.into_source()).await
    }
}
