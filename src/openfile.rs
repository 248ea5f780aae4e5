//! The open-file table: a bounded pool of handles, each binding an inumber
//! to a byte offset.

use crate::alloc::Pool;
use crate::error::{FsError, Result};
use crate::inode::Inum;

/// An index into the open-file table, returned to callers as an opaque
/// handle.
pub type Handle = usize;

/// The state tracked for one open file.
#[derive(Debug, Clone, Copy)]
pub struct OpenFileEntry {
    /// The inode this handle was opened against.
    pub inumber: Inum,
    /// The current read/write cursor, in bytes from the start of the file.
    pub offset: usize,
}

/// Wraps the open-file [`Pool`].
#[derive(Debug)]
pub struct OpenFileTable {
    pool: Pool<OpenFileEntry>,
}

impl OpenFileTable {
    /// Create an empty table with room for `capacity` concurrently open
    /// files.
    pub fn new(capacity: usize) -> Self {
        OpenFileTable {
            pool: Pool::new(capacity, "open-files"),
        }
    }

    /// Register a new open file at `inumber` with the given initial
    /// `offset`, returning its handle.
    pub fn add(&mut self, inumber: Inum, offset: usize) -> Result<Handle> {
        self.pool.alloc(OpenFileEntry { inumber, offset })
    }

    /// Close the handle, freeing its slot for reuse.
    pub fn remove(&mut self, handle: Handle) -> Result<()> {
        self.pool.free(handle).map(|_| ()).map_err(bad_handle)
    }

    /// Borrow the entry for `handle`.
    pub fn get(&self, handle: Handle) -> Result<&OpenFileEntry> {
        self.pool.get(handle).map_err(bad_handle)
    }

    /// Mutably borrow the entry for `handle`.
    pub fn get_mut(&mut self, handle: Handle) -> Result<&mut OpenFileEntry> {
        self.pool.get_mut(handle).map_err(bad_handle)
    }
}

/// A handle is not a path: any failure to resolve one reads as `BadHandle`,
/// never as `NotFound`.
fn bad_handle(err: FsError) -> FsError {
    match err {
        FsError::NotFound => FsError::BadHandle,
        other => other,
    }
}
