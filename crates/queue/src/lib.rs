//! A file-backed, single-producer/single-consumer message queue (§3.2, §4.2).
//!
//! Built from two primitives: [`IndexFile`], a durable 64-bit counter, and
//! [`FileQueueWriter`]/[`FileQueueReader`], which layer the queue's
//! publish/consume protocol on top of it.

mod error;
mod file_queue;
mod index_file;

pub use error::{FileQueueError, IndexFileError};
pub use file_queue::{message_file_name, FileQueueReader, FileQueueWriter};
pub use index_file::IndexFile;
