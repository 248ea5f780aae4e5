//! The operations layer: ties the allocation pools, inode table, directory
//! store, and open-file table together into the `tfs_*` operation set.

use log::debug;

use crate::alloc::Pool;
use crate::block::DataBlock;
use crate::dir;
use crate::error::{FsError, Result};
use crate::host::HostFs;
use crate::inode::{InodeKind, InodeTable, Inum, ROOT_DIR_INUM};
use crate::mode::OpenMode;
use crate::openfile::{Handle, OpenFileTable};
use crate::params::Params;
use crate::path;

/// A single in-memory file system session: the four tables described in
/// `params::Params`, bound together for the lifetime between `tfs_init` and
/// `tfs_destroy`.
#[derive(Debug)]
pub struct Tfs {
    params: Params,
    inodes: InodeTable,
    blocks: Pool<DataBlock>,
    open_files: OpenFileTable,
}

impl Tfs {
    /// Build a fresh session: allocate the pools described by `params` and
    /// create the root directory.
    pub fn init(params: Params) -> Result<Self> {
        params.validate()?;
        let mut inodes = InodeTable::new(params.max_inode_count);
        let mut blocks = Pool::new(params.max_block_count, "blocks");
        let open_files = OpenFileTable::new(params.max_open_files_count);

        let root = inodes.create(InodeKind::Directory, &mut blocks, params.block_size)?;
        assert_eq!(
            root, ROOT_DIR_INUM,
            "the root directory must be the first inode allocated"
        );

        Ok(Tfs {
            params,
            inodes,
            blocks,
            open_files,
        })
    }

    /// The parameters this session was initialized with.
    pub fn params(&self) -> Params {
        self.params
    }

    fn root_block(&self) -> Result<&DataBlock> {
        let block_no = self
            .inodes
            .get(ROOT_DIR_INUM)?
            .data_block
            .expect("root directory inode must have a data block");
        self.blocks.get(block_no)
    }

    fn root_block_mut(&mut self) -> Result<&mut DataBlock> {
        let block_no = self
            .inodes
            .get(ROOT_DIR_INUM)?
            .data_block
            .expect("root directory inode must have a data block");
        self.blocks.get_mut(block_no)
    }

    /// Open `path`, creating it first if `mode` contains `CREATE` and it
    /// does not already exist. Following a symbolic link closes the
    /// intermediate handle used to read its target before recursing.
    pub fn open(&mut self, path: &str, mode: OpenMode) -> Result<Handle> {
        let name = path::validate(path)?;
        let lookup = dir::find_in_dir(self.root_block()?, name);

        let handle = match lookup {
            Ok(inum) => self.open_existing(inum, mode)?,
            Err(FsError::NotFound) => {
                if !mode.contains(OpenMode::CREATE) {
                    return Err(FsError::NotFound);
                }
                self.create_and_open(name)?
            }
            Err(e) => return Err(e),
        };

        debug!("open {:?} mode={:?} -> handle {}", path, mode, handle);
        Ok(handle)
    }

    fn open_existing(&mut self, inum: Inum, mode: OpenMode) -> Result<Handle> {
        match self.inodes.get(inum)?.kind {
            InodeKind::SymLink => self.follow_symlink(inum, mode),
            InodeKind::File => self.open_file(inum, mode),
            InodeKind::Directory => Err(FsError::BadKind),
        }
    }

    fn follow_symlink(&mut self, inum: Inum, mode: OpenMode) -> Result<Handle> {
        let size = self.inodes.get(inum)?.size;
        let handle = self.open_files.add(inum, 0)?;
        let mut target = vec![0u8; size];
        self.read(handle, &mut target)?;
        self.close(handle)?;
        let target = String::from_utf8(target)
            .map_err(|_| FsError::InvalidArgument("symlink target is not valid utf-8"))?;
        self.open(&target, mode)
    }

    fn open_file(&mut self, inum: Inum, mode: OpenMode) -> Result<Handle> {
        if mode.contains(OpenMode::TRUNCATE) {
            let inode = self.inodes.get_mut(inum)?;
            if inode.size > 0 {
                if let Some(block_no) = inode.data_block.take() {
                    self.blocks.free(block_no)?;
                }
                inode.size = 0;
            }
        }
        let offset = if mode.contains(OpenMode::APPEND) {
            self.inodes.get(inum)?.size
        } else {
            0
        };
        self.open_files.add(inum, offset)
    }

    fn create_and_open(&mut self, name: &str) -> Result<Handle> {
        let inum = self
            .inodes
            .create(InodeKind::File, &mut self.blocks, self.params.block_size)?;
        if let Err(e) = dir::add_dir_entry(self.root_block_mut()?, name, inum) {
            self.inodes
                .delete(inum, &mut self.blocks)
                .expect("rolling back a just-created inode must not fail");
            return Err(e);
        }
        self.open_files.add(inum, 0)
    }

    /// Close `handle`. Fails with [`FsError::BadHandle`] if it is not
    /// currently open.
    pub fn close(&mut self, handle: Handle) -> Result<()> {
        self.open_files.remove(handle)
    }

    /// Read up to `buf.len()` bytes from `handle`'s current offset, advancing
    /// it by the number of bytes actually read.
    pub fn read(&mut self, handle: Handle, buf: &mut [u8]) -> Result<usize> {
        let entry = *self.open_files.get(handle)?;
        let inode = self.inodes.get(entry.inumber)?;
        let available = inode.size.saturating_sub(entry.offset);
        let to_read = available.min(buf.len());
        if to_read == 0 {
            return Ok(0);
        }
        let block_no = inode
            .data_block
            .expect("a file with size > 0 must have a data block");
        self.blocks
            .get(block_no)?
            .read_data(&mut buf[..to_read], entry.offset)?;
        self.open_files.get_mut(handle)?.offset += to_read;
        Ok(to_read)
    }

    /// Write up to `buf.len()` bytes at `handle`'s current offset, allocating
    /// a data block on first write, and advance the offset by the number of
    /// bytes actually written.
    pub fn write(&mut self, handle: Handle, buf: &[u8]) -> Result<usize> {
        let entry = *self.open_files.get(handle)?;
        let block_size = self.params.block_size;
        let to_write = buf.len().min(block_size.saturating_sub(entry.offset));
        if to_write == 0 {
            return Ok(0);
        }

        if self.inodes.get(entry.inumber)?.data_block.is_none() {
            let block_no = self.blocks.alloc(DataBlock::new_zero(block_size))?;
            self.inodes.get_mut(entry.inumber)?.data_block = Some(block_no);
        }
        let block_no = self.inodes.get(entry.inumber)?.data_block.unwrap();
        self.blocks
            .get_mut(block_no)?
            .write_data(&buf[..to_write], entry.offset)?;

        let inode = self.inodes.get_mut(entry.inumber)?;
        inode.size = inode.size.max(entry.offset + to_write);
        self.open_files.get_mut(handle)?.offset = entry.offset + to_write;
        Ok(to_write)
    }

    /// Hard-link `link` to the same inode as `target`. Fails and rolls back
    /// the directory write if `target` resolves to a directory or symlink.
    pub fn link(&mut self, target: &str, link: &str) -> Result<()> {
        let target_name = path::validate(target)?;
        let link_name = path::validate(link)?;
        let target_inum = dir::find_in_dir(self.root_block()?, target_name)?;

        dir::add_dir_entry(self.root_block_mut()?, link_name, target_inum)?;

        match self.inodes.get(target_inum)?.kind {
            InodeKind::File => {
                self.inodes.get_mut(target_inum)?.hard_link_count += 1;
                debug!("link {:?} -> {:?}", link, target);
                Ok(())
            }
            InodeKind::SymLink | InodeKind::Directory => {
                dir::clear_dir_entry(self.root_block_mut()?, link_name)?;
                Err(FsError::NotAFile)
            }
        }
    }

    /// Create a symbolic link at `link` pointing at the literal text
    /// `target`. `target`'s existence is never checked.
    pub fn sym_link(&mut self, target: &str, link: &str) -> Result<()> {
        path::validate(target)?;
        let handle = self.open(link, OpenMode::CREATE)?;
        let write_result = self.write(handle, target.as_bytes());
        self.close(handle)?;
        write_result?;

        let link_name = path::validate(link)?;
        let link_inum = dir::find_in_dir(self.root_block()?, link_name)?;
        self.inodes.get_mut(link_inum)?.kind = InodeKind::SymLink;
        debug!("sym_link {:?} -> {:?}", link, target);
        Ok(())
    }

    /// Remove the directory entry `path` and, once its hard-link count drops
    /// to zero, delete the underlying inode. Fails if `path` does not name a
    /// plain file.
    pub fn unlink(&mut self, path: &str) -> Result<()> {
        let name = path::validate(path)?;
        let inum = dir::find_in_dir(self.root_block()?, name)?;
        if self.inodes.get(inum)?.kind != InodeKind::File {
            return Err(FsError::NotAFile);
        }

        let inode = self.inodes.get_mut(inum)?;
        inode.hard_link_count -= 1;
        let remaining = inode.hard_link_count;

        dir::clear_dir_entry(self.root_block_mut()?, name)?;
        if remaining == 0 {
            self.inodes.delete(inum, &mut self.blocks)?;
        }
        debug!("unlink {:?} remaining_links={}", path, remaining);
        Ok(())
    }

    /// Read the whole of `host_path` off the host file system via `host`,
    /// and write it into `dest_path` (created, truncating any prior
    /// contents). Fails if the host file is larger than `block_size`.
    pub fn copy_from_external_fs(
        &mut self,
        host: &dyn HostFs,
        host_path: &str,
        dest_path: &str,
    ) -> Result<()> {
        let data = host.read_all(host_path)?;
        if data.len() > self.params.block_size {
            return Err(FsError::InvalidArgument(
                "host file is larger than block_size",
            ));
        }

        let handle = self.open(dest_path, OpenMode::CREATE | OpenMode::TRUNCATE)?;
        let write_result = self.write(handle, &data);
        self.close(handle)?;
        let written = write_result?;
        if written != data.len() {
            return Err(FsError::OutOfSpace);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostFs;
    use std::io;

    struct FakeHost(Vec<u8>);

    impl HostFs for FakeHost {
        fn read_all(&self, _path: &str) -> io::Result<Vec<u8>> {
            Ok(self.0.clone())
        }
    }

    fn small_fs() -> Tfs {
        Tfs::init(Params {
            max_inode_count: 8,
            max_block_count: 8,
            max_open_files_count: 4,
            block_size: 64,
        })
        .unwrap()
    }

    #[test]
    fn write_then_read_round_trips() {
        let mut fs = small_fs();
        let h = fs.open("/f1", OpenMode::CREATE).unwrap();
        assert_eq!(fs.write(h, b"hello world").unwrap(), 11);
        fs.close(h).unwrap();

        let h = fs.open("/f1", OpenMode::empty()).unwrap();
        let mut buf = [0u8; 11];
        assert_eq!(fs.read(h, &mut buf).unwrap(), 11);
        assert_eq!(&buf, b"hello world");
        assert_eq!(fs.read(h, &mut buf).unwrap(), 0);
        fs.close(h).unwrap();
    }

    #[test]
    fn open_without_create_fails_for_missing_file() {
        let mut fs = small_fs();
        assert!(matches!(
            fs.open("/nope", OpenMode::empty()),
            Err(FsError::NotFound)
        ));
    }

    #[test]
    fn truncate_discards_existing_contents() {
        let mut fs = small_fs();
        let h = fs.open("/f1", OpenMode::CREATE).unwrap();
        fs.write(h, b"abcdef").unwrap();
        fs.close(h).unwrap();

        let h = fs.open("/f1", OpenMode::TRUNCATE).unwrap();
        let mut buf = [0u8; 1];
        assert_eq!(fs.read(h, &mut buf).unwrap(), 0);
        fs.close(h).unwrap();
    }

    #[test]
    fn append_starts_at_end_of_file() {
        let mut fs = small_fs();
        let h = fs.open("/f1", OpenMode::CREATE).unwrap();
        fs.write(h, b"abc").unwrap();
        fs.close(h).unwrap();

        let h = fs.open("/f1", OpenMode::APPEND).unwrap();
        fs.write(h, b"def").unwrap();
        fs.close(h).unwrap();

        let h = fs.open("/f1", OpenMode::empty()).unwrap();
        let mut buf = [0u8; 6];
        fs.read(h, &mut buf).unwrap();
        assert_eq!(&buf, b"abcdef");
    }

    #[test]
    fn write_is_capped_at_block_size() {
        let mut fs = small_fs();
        let h = fs.open("/f1", OpenMode::CREATE).unwrap();
        let data = vec![b'x'; 100];
        assert_eq!(fs.write(h, &data).unwrap(), 64);
    }

    #[test]
    fn hard_link_shares_content_and_unlink_respects_refcount() {
        let mut fs = small_fs();
        let h = fs.open("/f1", OpenMode::CREATE).unwrap();
        fs.write(h, b"shared").unwrap();
        fs.close(h).unwrap();

        fs.link("/f1", "/f2").unwrap();
        fs.unlink("/f1").unwrap();

        let h = fs.open("/f2", OpenMode::empty()).unwrap();
        let mut buf = [0u8; 6];
        fs.read(h, &mut buf).unwrap();
        assert_eq!(&buf, b"shared");
        fs.close(h).unwrap();

        fs.unlink("/f2").unwrap();
        assert!(matches!(
            fs.open("/f2", OpenMode::empty()),
            Err(FsError::NotFound)
        ));
    }

    #[test]
    fn link_to_symlink_rolls_back_and_fails() {
        let mut fs = small_fs();
        fs.sym_link("/missing-target", "/s1").unwrap();
        assert!(matches!(
            fs.link("/s1", "/l1"),
            Err(FsError::NotAFile)
        ));
        // The rolled-back entry must not shadow a later legitimate use of the name.
        let h = fs.open("/l1", OpenMode::CREATE).unwrap();
        fs.close(h).unwrap();
    }

    #[test]
    fn sym_link_resolves_lazily_on_open() {
        let mut fs = small_fs();
        let h = fs.open("/target", OpenMode::CREATE).unwrap();
        fs.write(h, b"real contents").unwrap();
        fs.close(h).unwrap();

        fs.sym_link("/target", "/link").unwrap();
        let h = fs.open("/link", OpenMode::empty()).unwrap();
        let mut buf = [0u8; 13];
        fs.read(h, &mut buf).unwrap();
        assert_eq!(&buf, b"real contents");
    }

    #[test]
    fn unlink_rejects_symlinks_and_directories() {
        let mut fs = small_fs();
        fs.sym_link("/target", "/link").unwrap();
        assert!(matches!(fs.unlink("/link"), Err(FsError::NotAFile)));
    }

    #[test]
    fn inode_pool_exhaustion_surfaces_out_of_space() {
        let mut fs = Tfs::init(Params {
            max_inode_count: 1,
            max_block_count: 4,
            max_open_files_count: 4,
            block_size: 64,
        })
        .unwrap();
        // The root directory already consumed the only inode.
        assert!(matches!(
            fs.open("/f1", OpenMode::CREATE),
            Err(FsError::OutOfSpace)
        ));
    }

    #[test]
    fn copy_from_external_fs_writes_host_bytes() {
        let mut fs = small_fs();
        let host = FakeHost(b"from host".to_vec());
        fs.copy_from_external_fs(&host, "/etc/hosts", "/copied")
            .unwrap();

        let h = fs.open("/copied", OpenMode::empty()).unwrap();
        let mut buf = [0u8; 9];
        fs.read(h, &mut buf).unwrap();
        assert_eq!(&buf, b"from host");
    }

    #[test]
    fn copy_from_external_fs_rejects_oversized_files() {
        let mut fs = small_fs();
        let host = FakeHost(vec![0u8; 1000]);
        assert!(matches!(
            fs.copy_from_external_fs(&host, "/big", "/too-big"),
            Err(FsError::InvalidArgument(_))
        ));
    }
}
