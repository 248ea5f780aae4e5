//! The narrow boundary at which this crate touches the host operating
//! system: `tfs_copy_from_external_fs` needs to read a named resource on
//! the host, and nothing more.

use std::io;

/// "Open by name, read the whole thing." Kept as a trait so tests can
/// substitute an in-memory fixture instead of touching the real
/// filesystem.
pub trait HostFs {
    /// Read the full contents of the resource named `path`.
    fn read_all(&self, path: &str) -> io::Result<Vec<u8>>;
}

/// The default [`HostFs`], backed by `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdHostFs;

impl HostFs for StdHostFs {
    fn read_all(&self, path: &str) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn std_host_fs_reads_real_files() {
        let mut path = std::env::temp_dir();
        path.push(format!("tfs-host-test-{}", std::process::id()));
        {
            let mut f = std::fs::File::create(&path).unwrap();
            f.write_all(b"hello").unwrap();
        }
        let contents = StdHostFs.read_all(path.to_str().unwrap()).unwrap();
        assert_eq!(contents, b"hello");
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn std_host_fs_propagates_missing_file_error() {
        let result = StdHostFs.read_all("/no/such/path/tfs-does-not-exist");
        assert!(result.is_err());
    }
}
