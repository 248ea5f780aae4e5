//! The inode store: typed metadata records referencing at most one data
//! block, layered on top of the allocation pools in [`crate::alloc`].

use crate::alloc::Pool;
use crate::block::DataBlock;
use crate::error::Result;

/// Index of an inode in the inode pool. Stable for the inode's lifetime.
pub type Inum = usize;
/// Index of a data block in the block pool.
pub type BlockNo = usize;

/// The inumber of the fixed root directory, created by `tfs_init` and never
/// unlinked.
pub const ROOT_DIR_INUM: Inum = 0;

/// What an inode represents.
///
/// Kept as a plain field on [`Inode`] rather than three separate structs:
/// all three kinds share the same shape (`size`, `data_block`,
/// `hard_link_count`), and every place that branches on `kind` does so with
/// an exhaustive `match`, which the compiler enforces stays total as new
/// kinds are added.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InodeKind {
    /// A regular file holding up to `block_size` bytes.
    File,
    /// A directory; its data block holds a table of directory entries.
    Directory,
    /// A symbolic link; its data block holds the raw bytes of the target
    /// path.
    SymLink,
}

/// An in-memory inode.
#[derive(Debug, Clone)]
pub struct Inode {
    /// The kind of object this inode represents.
    pub kind: InodeKind,
    /// Bytes of content (or, for a directory, bytes of entry table in use).
    pub size: usize,
    /// The data block backing this inode's content, if any has been
    /// allocated yet.
    pub data_block: Option<BlockNo>,
    /// Number of directory entries that resolve directly to this inode.
    pub hard_link_count: u32,
}

impl Inode {
    fn new(kind: InodeKind) -> Self {
        Inode {
            kind,
            size: 0,
            data_block: None,
            hard_link_count: 1,
        }
    }
}

/// Wraps the inode [`Pool`], coordinating inode and data-block lifecycles.
#[derive(Debug)]
pub struct InodeTable {
    pool: Pool<Inode>,
}

impl InodeTable {
    /// Create an empty table with room for `capacity` inodes.
    pub fn new(capacity: usize) -> Self {
        InodeTable {
            pool: Pool::new(capacity, "inodes"),
        }
    }

    /// Allocate a new inode of the given `kind`. A fresh `Directory` also
    /// gets a zero-filled data block for its entry table, allocated from
    /// `blocks`.
    pub fn create(
        &mut self,
        kind: InodeKind,
        blocks: &mut Pool<DataBlock>,
        block_size: usize,
    ) -> Result<Inum> {
        let mut inode = Inode::new(kind);
        if kind == InodeKind::Directory {
            let block_no = blocks.alloc(DataBlock::new_zero(block_size))?;
            inode.data_block = Some(block_no);
        }
        self.pool.alloc(inode)
    }

    /// Free the inode at `i`, releasing its attached data block (if any)
    /// back to `blocks`.
    pub fn delete(&mut self, i: Inum, blocks: &mut Pool<DataBlock>) -> Result<()> {
        let inode = self.pool.free(i)?;
        if let Some(block_no) = inode.data_block {
            blocks.free(block_no)?;
        }
        Ok(())
    }

    /// Borrow the inode at `i`.
    pub fn get(&self, i: Inum) -> Result<&Inode> {
        self.pool.get(i)
    }

    /// Mutably borrow the inode at `i`.
    pub fn get_mut(&mut self, i: Inum) -> Result<&mut Inode> {
        self.pool.get_mut(i)
    }

    /// Total number of inode slots.
    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }
}
