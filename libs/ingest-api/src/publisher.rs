use std::future::Future;
use std::pin::Pin;

use crate::{IngestError, Record};

/// Broker-facing capability: submit one record to one named topic.
///
/// Created once at startup and shared by every request through
/// `Arc<dyn RecordPublisher>`. Implementations must be safe for concurrent
/// use without external locking.
///
/// `publish` does not buffer, batch or retry. `Ok(())` means the record was
/// handed to the broker client without a local submission error; delivery
/// is not confirmed.
pub trait RecordPublisher: Send + Sync {
    /// Submit a record. Rejections use `ErrorKind::Broker`.
    fn publish(
        &self,
        topic: &str,
        record: Record,
    ) -> Pin<Box<dyn Future<Output = Result<(), IngestError>> + Send + '_>>;

    /// Drain locally queued records (at graceful shutdown).
    fn flush(&self) -> Pin<Box<dyn Future<Output = Result<(), IngestError>> + Send + '_>>;
}
