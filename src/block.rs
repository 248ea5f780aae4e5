//! The byte-addressable contents of a single data block.
//!
//! This plays the role the reference material's `Buffer`/`Block` types play
//! over a memory-mapped disk image, minus the disk: a block here is simply
//! `block_size` bytes living on the heap, with bounds-checked read/write and
//! (de)serialization helpers built on `bincode`.

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{FsError, Result};

/// A single fixed-size block of bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataBlock {
    contents: Box<[u8]>,
}

impl DataBlock {
    /// A new block of `len` zero bytes.
    pub fn new_zero(len: usize) -> Self {
        DataBlock {
            contents: vec![0u8; len].into_boxed_slice(),
        }
    }

    /// Size of this block, in bytes.
    pub fn len(&self) -> usize {
        self.contents.len()
    }

    /// Read-only view of the full contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.contents
    }

    /// Reset every byte to zero, without changing the block's size.
    pub fn zero(&mut self) {
        self.contents.iter_mut().for_each(|b| *b = 0);
    }

    /// Copy `data` into this block at `offset`. Fails if the write would run
    /// past the end of the block.
    pub fn write_data(&mut self, data: &[u8], offset: usize) -> Result<()> {
        let end = offset
            .checked_add(data.len())
            .ok_or(FsError::InvalidArgument("offset overflow"))?;
        if end > self.len() {
            return Err(FsError::InvalidArgument(
                "write would run past the end of the block",
            ));
        }
        self.contents[offset..end].copy_from_slice(data);
        Ok(())
    }

    /// Copy bytes from this block at `offset` into `data`. Fails if the read
    /// would run past the end of the block.
    pub fn read_data(&self, data: &mut [u8], offset: usize) -> Result<()> {
        let end = offset
            .checked_add(data.len())
            .ok_or(FsError::InvalidArgument("offset overflow"))?;
        if end > self.len() {
            return Err(FsError::InvalidArgument(
                "read would run past the end of the block",
            ));
        }
        data.copy_from_slice(&self.contents[offset..end]);
        Ok(())
    }

    /// Serialize `value` with `bincode` and write it at `offset`.
    ///
    /// Used only for our own fixed-size, fixed-layout records (directory
    /// entries); a failure here means the record no longer fits the layout
    /// we designed for it, which is a bug in this crate rather than bad
    /// caller input, so it panics instead of threading through `FsError`.
    pub fn serialize_into<S: Serialize>(&mut self, value: &S, offset: usize) {
        let bytes = bincode::serialize(value).expect("record is not serializable");
        self.write_data(&bytes, offset)
            .expect("record does not fit in the block at the given offset");
    }

    /// Deserialize a `S` with `bincode` starting at `offset`.
    pub fn deserialize_from<S: DeserializeOwned>(&self, offset: usize) -> S {
        bincode::deserialize(&self.contents[offset..]).expect("corrupt in-memory record")
    }
}
