use std::fmt;

/// Category of an ingestion error. Lets the HTTP layer and the binary
/// decide how to surface a failure without matching on messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or invalid startup configuration — fatal, process exits.
    Config,
    /// Read failure on an upload stream.
    Io,
    /// Request body or upload could not be parsed into records.
    Format,
    /// The broker client rejected a record at submission time.
    Broker,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Config => f.write_str("config"),
            ErrorKind::Io => f.write_str("io"),
            ErrorKind::Format => f.write_str("format"),
            ErrorKind::Broker => f.write_str("broker"),
        }
    }
}

/// Unified error for the ingestion pipeline.
///
/// Carries an `ErrorKind` and a human-readable message. The message is
/// what the HTTP caller sees in a `400` body, so it never includes the kind.
#[derive(Clone, PartialEq, Eq)]
pub struct IngestError {
    kind: ErrorKind,
    message: String,
}

impl IngestError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Config, message: msg.into() }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Io, message: msg.into() }
    }

    /// Malformed request body or upload.
    pub fn format(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Format, message: msg.into() }
    }

    pub fn broker(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Broker, message: msg.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Add context to the error, preserving the original ErrorKind.
    ///
    /// Produces: `"context: original message"`.
    pub fn with_context(self, ctx: impl fmt::Display) -> Self {
        Self {
            kind: self.kind,
            message: format!("{ctx}: {}", self.message),
        }
    }
}

impl fmt::Debug for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for IngestError {}

// ---------------------------------------------------------------------------
// From impls: standard error types → IngestError with correct ErrorKind
// ---------------------------------------------------------------------------

impl From<std::io::Error> for IngestError {
    fn from(e: std::io::Error) -> Self {
        Self::io(e.to_string())
    }
}

impl From<serde_json::Error> for IngestError {
    fn from(e: serde_json::Error) -> Self {
        Self::format(e.to_string())
    }
}
