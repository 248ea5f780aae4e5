//! Path validation.
//!
//! Only a single, flat root directory exists, so "resolving" a path is
//! really just validating it and stripping the leading `/`: every path is
//! `/` followed by exactly one name, with no further separators.

use relative_path::{Component, RelativePath};

use crate::error::{FsError, Result};

/// Validate `path` and return the single name it names (without the
/// leading `/`).
///
/// A path is valid iff it starts with `/`, is longer than one character,
/// and the remainder is a single plain component — no embedded `/`, and
/// not `.` or `..`. Component decomposition goes through the
/// `relative-path` crate so the "exactly one normal component" rule is
/// enforced the same way it would be for a richer, hierarchical path
/// scheme, rather than by ad hoc string splitting.
pub fn validate(path: &str) -> Result<&str> {
    if path.len() <= 1 || !path.starts_with('/') {
        return Err(FsError::InvalidArgument(
            "path must be absolute and name at least one component",
        ));
    }
    let rest = &path[1..];
    if rest.contains('/') {
        return Err(FsError::InvalidArgument(
            "nested paths are not supported; only a root directory exists",
        ));
    }

    let relative = RelativePath::new(rest);
    let mut components = relative.components();
    let name = match components.next() {
        Some(Component::Normal(name)) => name,
        _ => {
            return Err(FsError::InvalidArgument(
                "path component must be a plain name",
            ))
        }
    };
    if components.next().is_some() {
        return Err(FsError::InvalidArgument(
            "nested paths are not supported; only a root directory exists",
        ));
    }
    Ok(name)
}
