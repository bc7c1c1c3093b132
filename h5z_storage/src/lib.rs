//! The storage API underlying the `h5z` storage engine.
//!
//! A store maps [`StoreKey`]s to byte values and groups keys under [`StorePrefix`]es, much like files in directories.
//! The engine lays out node metadata and array chunks as values in a store.
//!
//! This crate includes an in-memory store implementation ([`store::MemoryStore`]).
//! A directory-backed store is provided by the `h5z_filesystem` crate.
//!
//! ## Licence
//! `h5z_storage` is licensed under either of
//! - the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> or
//! - the MIT license <http://opensource.org/licenses/MIT>, at your option.

mod storage_sync;
pub mod store;
mod store_key;
mod store_prefix;


use std::sync::Arc;

use thiserror::Error;

pub use store_key::{StoreKey, StoreKeyError, StoreKeys};
pub use store_prefix::{StorePrefix, StorePrefixError, StorePrefixes};

pub use self::storage_sync::{
    ListableStorageTraits, ReadableStorageTraits, ReadableWritableListableStorageTraits,
    WritableStorageTraits,
};

/// A shared store backing one open file.
pub type ReadableWritableListableStorage = Arc<dyn ReadableWritableListableStorageTraits>;

/// A stored value.
pub type Bytes = bytes::Bytes;

/// A stored value, or [`None`] for a missing key.
pub type MaybeBytes = Option<Bytes>;

/// The keys and child prefixes directly below a prefix.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct StoreKeysPrefixes {
    keys: StoreKeys,
    prefixes: StorePrefixes,
}

impl StoreKeysPrefixes {
    /// Pair `keys` with child `prefixes`.
    #[must_use]
    pub fn new(keys: StoreKeys, prefixes: StorePrefixes) -> Self {
        Self { keys, prefixes }
    }

    /// Returns the keys.
    #[must_use]
    pub const fn keys(&self) -> &StoreKeys {
        &self.keys
    }

    /// Returns the prefixes.
    #[must_use]
    pub const fn prefixes(&self) -> &StorePrefixes {
        &self.prefixes
    }
}

/// A failure of a store operation.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// The store was opened read only.
    #[error("the store is read only")]
    ReadOnly,
    /// The underlying file system failed.
    #[error(transparent)]
    IOError(#[from] Arc<std::io::Error>),
    /// A prefix failed validation.
    #[error(transparent)]
    StorePrefixError(#[from] StorePrefixError),
    /// A key failed validation.
    #[error(transparent)]
    InvalidStoreKey(#[from] StoreKeyError),
    /// A store specific failure.
    #[error("{0}")]
    Other(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::IOError(Arc::new(err))
    }
}
