//! Configuration for a file system session.

use crate::error::{FsError, Result};

/// Tunables fixed for the lifetime of a session, between `tfs_init` and
/// `tfs_destroy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Params {
    /// Capacity of the inode pool, including the root directory's inode.
    pub max_inode_count: usize,
    /// Capacity of the data-block pool.
    pub max_block_count: usize,
    /// Capacity of the open-file table.
    pub max_open_files_count: usize,
    /// Size, in bytes, of a single data block.
    pub block_size: usize,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            max_inode_count: 64,
            max_block_count: 1024,
            max_open_files_count: 16,
            block_size: 1024,
        }
    }
}

impl Params {
    /// Reject configurations that could never support a usable file system,
    /// rather than letting them fail confusingly deep inside the pools.
    pub fn validate(&self) -> Result<()> {
        if self.max_inode_count == 0 {
            return Err(FsError::InvalidArgument("max_inode_count must be > 0"));
        }
        if self.max_block_count == 0 {
            return Err(FsError::InvalidArgument("max_block_count must be > 0"));
        }
        if self.max_open_files_count == 0 {
            return Err(FsError::InvalidArgument(
                "max_open_files_count must be > 0",
            ));
        }
        if self.block_size < *crate::dir::ENTRY_SIZE {
            return Err(FsError::InvalidArgument(
                "block_size must fit at least one directory entry",
            ));
        }
        Ok(())
    }
}

/// Equivalent to the crate root's [`crate::tfs_default_params`], provided here
/// so library consumers using the idiomatic surface do not need to reach for
/// the C-shaped function.
pub fn default_params() -> Params {
    Params::default()
}
