//! Flags accepted by `tfs_open`.

use bitflags::bitflags;

bitflags! {
    /// Bitset of flags controlling `tfs_open`'s behavior.
    ///
    /// The concrete bit values are conventional, not load-bearing: nothing
    /// in this crate or its tests depends on `CREATE` being `1` rather than
    /// some other bit, only on the three flags being distinct.
    pub struct OpenMode: u8 {
        /// Create the file if it does not already exist.
        const CREATE = 0b001;
        /// If the file exists and is not empty, discard its contents first.
        const TRUNCATE = 0b010;
        /// Start the cursor at the end of the file's current contents
        /// instead of at the beginning.
        const APPEND = 0b100;
    }
}

impl Default for OpenMode {
    fn default() -> Self {
        OpenMode::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_compose() {
        let m = OpenMode::CREATE | OpenMode::TRUNCATE;
        assert!(m.contains(OpenMode::CREATE));
        assert!(m.contains(OpenMode::TRUNCATE));
        assert!(!m.contains(OpenMode::APPEND));
    }
}
