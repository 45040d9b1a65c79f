//! Error taxonomy for page and tree operations.
//!
//! `KeyExists` and `KeyNotExists` are expected outcomes of `insert`,
//! `update` and `erase`. `NoSpace` is transient at the tree level: the tree
//! recovers it internally with compaction or a split and never surfaces it
//! from `BtreeMap::insert`. `InvalidKey` guards in-place key rewrites that
//! would break slot ordering.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BtreeError>;

/// Errors reported by page-level operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BtreeError {
    /// A record with an equal key is already present.
    #[error("key already exists")]
    KeyExists,

    /// No record with the given key is present.
    #[error("key does not exist")]
    KeyNotExists,

    /// The page has too little free space for the operation.
    #[error("not enough free space in page")]
    NoSpace,

    /// The new key would violate the strict ordering of the stub directory.
    #[error("key would break slot ordering")]
    InvalidKey,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(BtreeError::KeyExists.to_string(), "key already exists");
        assert_eq!(
            BtreeError::NoSpace.to_string(),
            "not enough free space in page"
        );
    }
}
