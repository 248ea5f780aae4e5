//! The directory store: a single flat directory whose data block holds a
//! fixed-size table of name -> inumber entries.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::block::DataBlock;
use crate::error::{FsError, Result};
use crate::inode::Inum;

/// Longest name a directory entry can hold, in bytes.
///
/// Kept at or below 32 so the fixed-size `[u8; MAX_FILE_NAME]` array can use
/// serde's built-in `Serialize`/`Deserialize` impls for arrays, the same way
/// the reference material's `[char; DIRNAME_SIZE]` does.
pub const MAX_FILE_NAME: usize = 28;

#[derive(Serialize, Deserialize, Debug, Clone)]
struct RawEntry {
    name: [u8; MAX_FILE_NAME],
    inumber: u32,
}

impl RawEntry {
    fn empty() -> Self {
        RawEntry {
            name: [0u8; MAX_FILE_NAME],
            inumber: 0,
        }
    }

    fn is_free(&self) -> bool {
        self.name[0] == 0
    }

    fn name_str(&self) -> &str {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(self.name.len());
        std::str::from_utf8(&self.name[..end]).expect("directory entry name is not valid utf-8")
    }
}

lazy_static! {
    /// Size, in bytes, of a single serialized directory entry. Computed at
    /// runtime, like the reference material's `DINODE_SIZE`/`DIRENTRY_SIZE`,
    /// because the exact width `bincode` picks for the wrapper fields is not
    /// something we want to hand-compute and risk drifting out of sync with.
    pub static ref ENTRY_SIZE: usize =
        bincode::serialize(&RawEntry::empty()).unwrap().len();
}

/// How many directory entries fit in a block of `block_size` bytes.
pub fn capacity(block_size: usize) -> usize {
    block_size / *ENTRY_SIZE
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > MAX_FILE_NAME || name.as_bytes().contains(&0) {
        return Err(FsError::InvalidArgument(
            "directory entry name is empty, too long, or contains a NUL byte",
        ));
    }
    Ok(())
}

fn read_entry(block: &DataBlock, slot: usize) -> RawEntry {
    block.deserialize_from(slot * *ENTRY_SIZE)
}

fn write_entry(block: &mut DataBlock, slot: usize, entry: &RawEntry) {
    block.serialize_into(entry, slot * *ENTRY_SIZE);
}

/// Look up `name` in the directory's entry block. Returns the inumber of
/// the first matching entry, or [`FsError::NotFound`].
pub fn find_in_dir(block: &DataBlock, name: &str) -> Result<Inum> {
    validate_name(name)?;
    for slot in 0..capacity(block.len()) {
        let entry = read_entry(block, slot);
        if !entry.is_free() && entry.name_str() == name {
            return Ok(entry.inumber as Inum);
        }
    }
    Err(FsError::NotFound)
}

/// Write a new entry `name -> inumber` into the first free slot.
///
/// Does not check for duplicate names: if `name` is already present, a
/// second entry is added and `find_in_dir` will keep returning the first
/// one. See `DESIGN.md` for why this mirrors the reference behavior rather
/// than "fixing" it.
pub fn add_dir_entry(block: &mut DataBlock, name: &str, inumber: Inum) -> Result<()> {
    validate_name(name)?;
    let slot = (0..capacity(block.len()))
        .find(|&slot| read_entry(block, slot).is_free())
        .ok_or(FsError::Full)?;
    let mut raw = RawEntry::empty();
    raw.name[..name.len()].copy_from_slice(name.as_bytes());
    raw.inumber = inumber as u32;
    write_entry(block, slot, &raw);
    Ok(())
}

/// Zero out the entry whose name matches `name`. Fails with
/// [`FsError::NotFound`] if there is none.
pub fn clear_dir_entry(block: &mut DataBlock, name: &str) -> Result<()> {
    validate_name(name)?;
    let slot = (0..capacity(block.len())).find(|&slot| {
        let entry = read_entry(block, slot);
        !entry.is_free() && entry.name_str() == name
    });
    match slot {
        Some(slot) => {
            write_entry(block, slot, &RawEntry::empty());
            Ok(())
        }
        None => Err(FsError::NotFound),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_block() -> DataBlock {
        DataBlock::new_zero(1024)
    }

    #[test]
    fn add_then_find() {
        let mut b = empty_block();
        add_dir_entry(&mut b, "f1", 7).unwrap();
        assert_eq!(find_in_dir(&b, "f1").unwrap(), 7);
        assert!(matches!(find_in_dir(&b, "f2"), Err(FsError::NotFound)));
    }

    #[test]
    fn clear_then_reuse_slot() {
        let mut b = empty_block();
        add_dir_entry(&mut b, "f1", 7).unwrap();
        clear_dir_entry(&mut b, "f1").unwrap();
        assert!(matches!(find_in_dir(&b, "f1"), Err(FsError::NotFound)));
        assert!(matches!(clear_dir_entry(&mut b, "f1"), Err(FsError::NotFound)));
        // The freed slot is reusable.
        add_dir_entry(&mut b, "f2", 9).unwrap();
        assert_eq!(find_in_dir(&b, "f2").unwrap(), 9);
    }

    #[test]
    fn duplicate_names_resolve_to_the_first_entry() {
        let mut b = empty_block();
        add_dir_entry(&mut b, "dup", 1).unwrap();
        add_dir_entry(&mut b, "dup", 2).unwrap();
        assert_eq!(find_in_dir(&b, "dup").unwrap(), 1);
    }

    #[test]
    fn full_directory_rejects_further_entries() {
        let mut b = DataBlock::new_zero(*ENTRY_SIZE * 2);
        add_dir_entry(&mut b, "a", 1).unwrap();
        add_dir_entry(&mut b, "b", 2).unwrap();
        assert!(matches!(add_dir_entry(&mut b, "c", 3), Err(FsError::Full)));
    }

    #[test]
    fn rejects_invalid_names() {
        let mut b = empty_block();
        assert!(matches!(
            add_dir_entry(&mut b, "", 1),
            Err(FsError::InvalidArgument(_))
        ));
        let too_long = "x".repeat(MAX_FILE_NAME + 1);
        assert!(matches!(
            add_dir_entry(&mut b, &too_long, 1),
            Err(FsError::InvalidArgument(_))
        ));
    }
}
