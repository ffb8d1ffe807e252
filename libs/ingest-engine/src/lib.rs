pub mod batch;
pub mod ingestor;
pub mod source;
pub mod splitter;

pub use batch::{Batch, BatchRecords};
pub use ingestor::{IngestReport, Ingestor, TopicPolicy};
pub use source::RecordSource;
pub use splitter::LineSplitter;
