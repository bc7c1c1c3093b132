use std::sync::Arc;

use h5z_filesystem::FilesystemStoreCreateError;
use h5z_storage::{StorageError, StoreKeyError, StorePrefixError};
use thiserror::Error;

use crate::{Hid, ObjectKind, TypeClass};

/// An engine error.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    /// An underlying store error.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// A file could not be created or opened as a store.
    #[error(transparent)]
    FilesystemStore(Arc<FilesystemStoreCreateError>),
    /// The identifier does not refer to a live object.
    #[error("identifier {0} does not refer to an open object")]
    InvalidId(Hid),
    /// The identifier refers to an object of another kind.
    #[error("identifier {id} is not a {expected}")]
    WrongKind {
        /// The identifier.
        id: Hid,
        /// The expected object kind.
        expected: ObjectKind,
    },
    /// A node, file, or member does not exist.
    #[error("{0} does not exist")]
    NotFound(String),
    /// A node or file already exists.
    #[error("{0} already exists")]
    AlreadyExists(String),
    /// A node on a path is not a group.
    #[error("{0} is not a group")]
    NotAGroup(String),
    /// A node is not a dataset.
    #[error("{0} is not a dataset")]
    NotADataset(String),
    /// A path is not a valid node path.
    #[error("invalid path {0:?}")]
    InvalidPath(String),
    /// An argument is not valid for the operation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// A write was attempted on a file opened read only.
    #[error("file {0} was opened read only")]
    ReadOnly(String),
    /// A metadata document could not be parsed.
    #[error("invalid metadata at {key}: {message}")]
    InvalidMetadata {
        /// The metadata key.
        key: String,
        /// The parse error.
        message: String,
    },
    /// Elements cannot be converted between the two type classes.
    #[error("no conversion from {from} to {to}")]
    NoConversion {
        /// The source type class.
        from: TypeClass,
        /// The destination type class.
        to: TypeClass,
    },
    /// A filter failed to encode or decode a chunk.
    #[error("{filter} filter failed: {message}")]
    Filter {
        /// The filter name.
        filter: &'static str,
        /// The failure.
        message: String,
    },
}

impl From<FilesystemStoreCreateError> for EngineError {
    fn from(err: FilesystemStoreCreateError) -> Self {
        Self::FilesystemStore(Arc::new(err))
    }
}

impl From<StoreKeyError> for EngineError {
    fn from(err: StoreKeyError) -> Self {
        Self::Storage(err.into())
    }
}

impl From<StorePrefixError> for EngineError {
    fn from(err: StorePrefixError) -> Self {
        Self::Storage(err.into())
    }
}
