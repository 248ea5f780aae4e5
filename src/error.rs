//! The error type surfaced by every operation in this crate.
//!
//! A single closed enum is used rather than one error type per layer: the
//! C-shaped wrapper functions at the crate root collapse any `Err` to `-1`
//! anyway, so there is little to gain from a `#[from]` chain of per-module
//! error types, and a flat enum makes it easy for callers of the idiomatic
//! surface to match on the exact failure kind.

use thiserror::Error;

/// Everything that can go wrong while using a [`crate::Tfs`].
#[derive(Error, Debug)]
pub enum FsError {
    /// An operation was attempted before `tfs_init` or after `tfs_destroy`.
    #[error("file system is not initialized")]
    NotInitialized,

    /// A malformed, relative, or otherwise unusable path or name was given.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// No such directory entry, inode, data block, or open-file handle.
    #[error("not found")]
    NotFound,

    /// The inode pool, block pool, directory, or open-file pool is full.
    #[error("out of space")]
    OutOfSpace,

    /// The directory has no free entry to write into.
    #[error("directory is full")]
    Full,

    /// The target of the operation is a directory or a symbolic link where a
    /// plain file was required.
    #[error("not a file")]
    NotAFile,

    /// The handle does not currently refer to an open file.
    #[error("bad handle")]
    BadHandle,

    /// An inode was found but its kind does not match what the caller
    /// assumed (a programming error inside this crate; never raised as a
    /// result of bad caller input).
    #[error("inode has the wrong kind")]
    BadKind,

    /// Reading or writing the host file system failed.
    #[error("host I/O error")]
    Io(#[from] std::io::Error),
}

/// Shorthand for `Result<T, FsError>`, used throughout the crate.
pub type Result<T> = std::result::Result<T, FsError>;
