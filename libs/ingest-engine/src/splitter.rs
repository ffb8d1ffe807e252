use std::future::Future;
use std::pin::Pin;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

use ingest_api::{IngestError, Record};

use crate::source::RecordSource;

const DEFAULT_READ_CAPACITY: usize = 8192;

/// Splits a byte stream into newline-delimited records.
///
/// Lines may be longer than the read buffer: partial reads accumulate in
/// `pending` until `\n` or end of stream. A trailing `\r` is stripped.
/// End of stream with an empty accumulator ends the sequence without an
/// extra empty record.
pub struct LineSplitter<R> {
    reader: BufReader<R>,
    pending: Vec<u8>,
    /// Maximum line length in bytes (0 = unlimited).
    max_length: usize,
    done: bool,
}

impl<R: AsyncRead + Unpin + Send> LineSplitter<R> {
    pub fn new(reader: R) -> Self {
        Self::with_capacity(DEFAULT_READ_CAPACITY, reader)
    }

    pub fn with_capacity(capacity: usize, reader: R) -> Self {
        Self {
            reader: BufReader::with_capacity(capacity, reader),
            pending: Vec::new(),
            max_length: 0,
            done: false,
        }
    }

    /// Reject lines longer than `max_length` bytes (0 = unlimited).
    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    /// Next line without its terminator, `None` at end of stream.
    ///
    /// After an error every further call returns `Ok(None)`.
    pub async fn next_line(&mut self) -> Result<Option<Record>, IngestError> {
        if self.done {
            return Ok(None);
        }
        match self.read_line().await {
            Ok(Some(line)) => Ok(Some(line)),
            other => {
                self.done = true;
                other
            }
        }
    }

    async fn read_line(&mut self) -> Result<Option<Record>, IngestError> {
        loop {
            let available = self
                .reader
                .fill_buf()
                .await
                .map_err(|e| IngestError::from(e).with_context("read upload"))?;

            if available.is_empty() {
                if self.pending.is_empty() {
                    return Ok(None);
                }
                let line = finish_line(std::mem::take(&mut self.pending));
                self.check_length(line.len())?;
                return Ok(Some(line));
            }

            match available.iter().position(|&b| b == b'\n') {
                Some(pos) => {
                    self.pending.extend_from_slice(&available[..pos]);
                    self.reader.consume(pos + 1);
                    let line = finish_line(std::mem::take(&mut self.pending));
                    self.check_length(line.len())?;
                    return Ok(Some(line));
                }
                None => {
                    let n = available.len();
                    self.pending.extend_from_slice(available);
                    self.reader.consume(n);
                    // a trailing \r may still be stripped, allow one byte of slack
                    self.check_length(self.pending.len().saturating_sub(1))?;
                }
            }
        }
    }

    fn check_length(&self, len: usize) -> Result<(), IngestError> {
        if self.max_length > 0 && len > self.max_length {
            return Err(IngestError::format(format!(
                "line too long: more than {} bytes",
                self.max_length
            )));
        }
        Ok(())
    }
}

fn finish_line(mut line: Vec<u8>) -> Record {
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    Record::new(line)
}

impl<R: AsyncRead + Unpin + Send> RecordSource for LineSplitter<R> {
    fn next_record(
        &mut self,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Record>, IngestError>> + Send + '_>> {
        Box::pin(self.next_line())
    }
}
