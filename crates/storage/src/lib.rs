//! Sharded data-directory layout, canonical/staged block storage and state
//! storage (§3.4, §3.5, §4.3, §4.4).

mod block_storage;
mod data_directory;
mod error;
mod state_storage;

pub use block_storage::{BlockStorage, SaveMode, StagedBlockStorage};
pub use data_directory::{shard_seq_path, CatapultDataDirectory};
pub use error::StorageError;
pub use state_storage::{promote_dir, StateStorage};
