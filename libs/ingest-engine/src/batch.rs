use std::future::Future;
use std::pin::Pin;

use serde::Deserialize;

use ingest_api::{IngestError, Record};

use crate::source::RecordSource;

/// Wire shape of a batch request body.
#[derive(Debug, Deserialize)]
struct BatchRequest {
    topic: String,
    lines: Vec<serde_json::Value>,
}

/// A parsed batch: target topic plus one canonical JSON record per element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub topic: String,
    pub records: Vec<Record>,
}

impl Batch {
    /// Parse `{"topic": "...", "lines": [...]}`.
    ///
    /// Every element of `lines` is re-encoded through `serde_json::Value`,
    /// so formatting in the original body does not reach the broker.
    /// Any failure is a `Format` error and nothing is extracted.
    pub fn parse(body: &[u8]) -> Result<Self, IngestError> {
        let request: BatchRequest = serde_json::from_slice(body)?;
        if request.topic.is_empty() {
            return Err(IngestError::format("topic must not be empty"));
        }

        let records = request
            .lines
            .iter()
            .enumerate()
            .map(|(i, value)| {
                Record::from_json(value).map_err(|e| e.with_context(format!("lines[{i}]")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            topic: request.topic,
            records,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_source(self) -> BatchRecords {
        BatchRecords {
            records: self.records.into_iter(),
        }
    }
}

/// In-memory record source over an already parsed batch.
pub struct BatchRecords {
    records: std::vec::IntoIter<Record>,
}

impl RecordSource for BatchRecords {
    fn next_record(
        &mut self,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Record>, IngestError>> + Send + '_>> {
        let next = self.records.next();
        Box::pin(async move { Ok(next) })
    }
}
