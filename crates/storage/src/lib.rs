mod error;
mod file;
mod memory;
mod record;
mod traits;

pub mod conformance;

pub use error::StorageError;
pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use record::AnswerRecord;
pub use traits::HistoryStore;
