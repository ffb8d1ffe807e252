use std::future::Future;
use std::pin::Pin;

use ingest_api::{IngestError, Record};

/// Lazy, finite, non-restartable producer of records for one request.
///
/// `Ok(None)` ends the sequence. An `Err` is fatal for the rest of the
/// source; records yielded before it stay yielded.
pub trait RecordSource: Send {
    fn next_record(
        &mut self,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Record>, IngestError>> + Send + '_>>;
}
