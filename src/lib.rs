//! An educational, in-memory, single-directory file system core.
//!
//! This crate offers two layers. The idiomatic one is [`Tfs`]: construct a
//! session with [`Tfs::init`], call its methods, and propagate `Result`s the
//! normal way. The second is a literal C-shaped contract — a handful of
//! free functions (`tfs_init`, `tfs_open`, `tfs_read`, ...) operating on a
//! single process-wide session and collapsing every error to `-1`, for
//! callers that expect that shape.
//!
//! Only one session may exist at a time, between a `tfs_init` and the
//! matching `tfs_destroy`.

pub mod alloc;
pub mod block;
pub mod dir;
pub mod error;
pub mod fs;
pub mod host;
pub mod inode;
pub mod mode;
pub mod openfile;
pub mod params;
pub mod path;

use std::convert::TryFrom;
use std::sync::Mutex;

use lazy_static::lazy_static;
use log::debug;

pub use error::{FsError, Result};
pub use fs::Tfs;
pub use host::{HostFs, StdHostFs};
pub use mode::OpenMode;
pub use openfile::Handle;
pub use params::Params;

lazy_static! {
    static ref SESSION: Mutex<Option<Tfs>> = Mutex::new(None);
}

/// The default parameters `tfs_init(None)` uses when none are supplied.
pub fn tfs_default_params() -> Params {
    Params::default()
}

/// Start a session, replacing any prior one. `params` defaults to
/// [`tfs_default_params`] when `None`. Returns `0` on success, `-1` if
/// `params` fails validation.
pub fn tfs_init(params: Option<Params>) -> i32 {
    let params = params.unwrap_or_default();
    match Tfs::init(params) {
        Ok(session) => {
            *SESSION.lock().expect("session lock is never poisoned") = Some(session);
            0
        }
        Err(_) => -1,
    }
}

/// Tear down the current session. Returns `0` on success, `-1` if there was
/// no session to tear down.
pub fn tfs_destroy() -> i32 {
    let mut guard = SESSION.lock().expect("session lock is never poisoned");
    match guard.take() {
        Some(_) => 0,
        None => -1,
    }
}

/// Run `f` against the active session, or fail with [`FsError::NotInitialized`]
/// if there is none — there is no session before the first `tfs_init` or
/// after a `tfs_destroy`.
fn with_session<T>(f: impl FnOnce(&mut Tfs) -> Result<T>) -> Result<T> {
    let mut guard = SESSION.lock().expect("session lock is never poisoned");
    match guard.as_mut() {
        Some(session) => f(session),
        None => Err(FsError::NotInitialized),
    }
}

/// Collapse `result` to its sentinel-friendly success value, logging and
/// discarding the error otherwise. Every `tfs_*` wrapper funnels through
/// this so a failed operation always leaves a trace even though the
/// C-shaped contract only has room for a bare `-1`.
fn collapse<T>(label: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            debug!("{} failed: {}", label, e);
            None
        }
    }
}

/// Open `path` under `mode`, creating it first if `CREATE` is set and it is
/// absent. Returns the new handle, or `-1` on any failure.
pub fn tfs_open(path: &str, mode: OpenMode) -> i32 {
    collapse("tfs_open", with_session(|session| session.open(path, mode)))
        .map(|h| h as i32)
        .unwrap_or(-1)
}

/// Close `handle`. Returns `0` on success, `-1` on failure (including an
/// unrecognized or negative handle).
pub fn tfs_close(handle: i32) -> i32 {
    let handle = match usize::try_from(handle) {
        Ok(h) => h,
        Err(_) => return -1,
    };
    match collapse("tfs_close", with_session(|session| session.close(handle))) {
        Some(()) => 0,
        None => -1,
    }
}

/// Read up to `buf.len()` bytes from `handle` into `buf`. Returns the number
/// of bytes read, or `-1` on failure.
pub fn tfs_read(handle: i32, buf: &mut [u8]) -> i64 {
    let handle = match usize::try_from(handle) {
        Ok(h) => h,
        Err(_) => return -1,
    };
    collapse("tfs_read", with_session(|session| session.read(handle, buf)))
        .map(|n| n as i64)
        .unwrap_or(-1)
}

/// Write up to `buf.len()` bytes from `buf` into `handle`. Returns the
/// number of bytes written, or `-1` on failure.
pub fn tfs_write(handle: i32, buf: &[u8]) -> i64 {
    let handle = match usize::try_from(handle) {
        Ok(h) => h,
        Err(_) => return -1,
    };
    collapse("tfs_write", with_session(|session| session.write(handle, buf)))
        .map(|n| n as i64)
        .unwrap_or(-1)
}

/// Hard-link `link` to the same inode as `target`. Returns `0` on success,
/// `-1` on failure.
pub fn tfs_link(target: &str, link: &str) -> i32 {
    match collapse("tfs_link", with_session(|session| session.link(target, link))) {
        Some(()) => 0,
        None => -1,
    }
}

/// Create a symbolic link at `link` pointing at the literal text `target`.
/// Returns `0` on success, `-1` on failure.
pub fn tfs_sym_link(target: &str, link: &str) -> i32 {
    match collapse(
        "tfs_sym_link",
        with_session(|session| session.sym_link(target, link)),
    ) {
        Some(()) => 0,
        None => -1,
    }
}

/// Remove the directory entry `path`, deleting its inode once no entry
/// refers to it. Returns `0` on success, `-1` on failure.
pub fn tfs_unlink(path: &str) -> i32 {
    match collapse("tfs_unlink", with_session(|session| session.unlink(path))) {
        Some(()) => 0,
        None => -1,
    }
}

/// Copy the full contents of `host_path` on the real file system into
/// `dest_path`. Returns `0` on success, `-1` on failure.
pub fn tfs_copy_from_external_fs(host_path: &str, dest_path: &str) -> i32 {
    match collapse(
        "tfs_copy_from_external_fs",
        with_session(|session| session.copy_from_external_fs(&StdHostFs, host_path, dest_path)),
    ) {
        Some(()) => 0,
        None => -1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::MutexGuard;

    // The session is a process-wide singleton, so these tests serialize
    // through a second lock to avoid clobbering each other's state.
    lazy_static! {
        static ref TEST_LOCK: Mutex<()> = Mutex::new(());
    }

    fn locked_session() -> MutexGuard<'static, ()> {
        TEST_LOCK.lock().unwrap_or_else(|p| p.into_inner())
    }

    #[test]
    fn init_open_write_read_close_destroy() {
        let _guard = locked_session();
        assert_eq!(tfs_init(None), 0);

        let h = tfs_open("/f1", OpenMode::CREATE);
        assert!(h >= 0);
        assert_eq!(tfs_write(h, b"hi"), 2);
        assert_eq!(tfs_close(h), 0);

        let h = tfs_open("/f1", OpenMode::empty());
        let mut buf = [0u8; 2];
        assert_eq!(tfs_read(h, &mut buf), 2);
        assert_eq!(&buf, b"hi");
        assert_eq!(tfs_close(h), 0);

        assert_eq!(tfs_destroy(), 0);
    }

    #[test]
    fn operations_fail_before_init_and_after_destroy() {
        let _guard = locked_session();
        assert_eq!(tfs_destroy(), -1);
        assert_eq!(tfs_open("/f1", OpenMode::CREATE), -1);
        assert_eq!(tfs_unlink("/f1"), -1);
    }

    #[test]
    fn destroyed_session_leaves_no_trace_for_the_next_one() {
        let _guard = locked_session();
        assert_eq!(tfs_init(None), 0);
        let h = tfs_open("/f1", OpenMode::CREATE);
        tfs_write(h, b"leftover");
        tfs_close(h);
        assert_eq!(tfs_destroy(), 0);

        assert_eq!(tfs_init(None), 0);
        assert_eq!(tfs_open("/f1", OpenMode::empty()), -1);
        assert_eq!(tfs_destroy(), 0);
    }

    #[test]
    fn rejects_invalid_params() {
        let _guard = locked_session();
        let mut params = tfs_default_params();
        params.block_size = 0;
        assert_eq!(tfs_init(Some(params)), -1);
    }

    #[test]
    fn with_session_reports_not_initialized_when_no_session_exists() {
        let _guard = locked_session();
        assert!(SESSION.lock().unwrap().is_none());
        let result = with_session(|session| session.unlink("/f1"));
        assert!(matches!(result, Err(FsError::NotInitialized)));
    }
}
