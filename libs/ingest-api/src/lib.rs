pub mod error;
pub mod publisher;
pub mod record;

pub use error::{ErrorKind, IngestError};
pub use publisher::RecordPublisher;
pub use record::Record;
