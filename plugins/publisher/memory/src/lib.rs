use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::RwLock;

use ingest_api::{IngestError, Record, RecordPublisher};

/// A record accepted by [`MemoryPublisher`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishedRecord {
    pub topic: String,
    pub record: Record,
}

// ═══════════════════════════════════════════════════════════════
//  MemoryPublisher
// ═══════════════════════════════════════════════════════════════

/// In-process publisher. Keeps accepted records in submission order,
/// optionally as a ring buffer of the last `max_records`.
///
/// Used by `--dry-run` and as the broker double in tests. Failures can be
/// injected by attempt number to exercise partial-failure paths.
#[derive(Default)]
pub struct MemoryPublisher {
    records: RwLock<VecDeque<PublishedRecord>>,
    /// 0 = unlimited.
    max_records: usize,
    attempts: AtomicUsize,
    /// 1-based attempt numbers that are rejected.
    fail_on: Vec<usize>,
}

impl MemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only the most recent `max_records` records (0 = unlimited).
    pub fn with_max_records(mut self, max_records: usize) -> Self {
        self.max_records = max_records;
        self
    }

    /// Reject the given 1-based publish attempts with a broker error.
    pub fn failing_on(attempts: impl IntoIterator<Item = usize>) -> Self {
        Self {
            fail_on: attempts.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Number of `publish` calls so far, accepted or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Snapshot of accepted records in submission order.
    pub async fn published(&self) -> Vec<PublishedRecord> {
        self.records.read().await.iter().cloned().collect()
    }
}

impl RecordPublisher for MemoryPublisher {
    fn publish(
        &self,
        topic: &str,
        record: Record,
    ) -> Pin<Box<dyn Future<Output = Result<(), IngestError>> + Send + '_>> {
        let topic = topic.to_string();
        Box::pin(async move {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_on.contains(&attempt) {
                return Err(IngestError::broker(format!(
                    "memory publisher: rejected attempt {attempt} on topic '{topic}'"
                )));
            }
            tracing::debug!(topic = %topic, bytes = record.len(), "memory publish");
            let mut buf = self.records.write().await;
            if self.max_records > 0 && buf.len() >= self.max_records {
                buf.pop_front();
            }
            buf.push_back(PublishedRecord { topic, record });
            Ok(())
        })
    }

    fn flush(&self) -> Pin<Box<dyn Future<Output = Result<(), IngestError>> + Send + '_>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingest_api::ErrorKind;

    #[tokio::test]
    async fn keeps_records_in_order() {
        let p = MemoryPublisher::new();
        p.publish("a", Record::from(&b"1"[..])).await.unwrap();
        p.publish("b", Record::from(&b"2"[..])).await.unwrap();

        let got = p.published().await;
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].topic, "a");
        assert_eq!(got[1].record.as_bytes(), b"2");
        assert_eq!(p.attempts(), 2);
    }

    #[tokio::test]
    async fn ring_buffer_keeps_latest() {
        let p = MemoryPublisher::new().with_max_records(2);
        for payload in [b"1", b"2", b"3"] {
            p.publish("t", Record::from(&payload[..])).await.unwrap();
        }

        let got = p.published().await;
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].record.as_bytes(), b"2");
        assert_eq!(p.attempts(), 3);
    }

    #[tokio::test]
    async fn injected_failure_counts_as_attempt() {
        let p = MemoryPublisher::failing_on([2]);
        assert!(p.publish("t", Record::from(&b"1"[..])).await.is_ok());
        let err = p.publish("t", Record::from(&b"2"[..])).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Broker);
        assert!(p.publish("t", Record::from(&b"3"[..])).await.is_ok());

        assert_eq!(p.attempts(), 3);
        assert_eq!(p.published().await.len(), 2);
    }
}
