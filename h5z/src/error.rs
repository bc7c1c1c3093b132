use h5z_engine::EngineError;
use thiserror::Error;

use crate::ElementKind;

/// A typed access error.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum H5Error {
    /// An invalid file mode or dataset option.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// An engine call failed.
    #[error("{context}: {source}")]
    Resource {
        /// What was being done.
        context: String,
        /// The engine failure.
        source: EngineError,
    },
    /// The rank of a dataset differs from the declared rank.
    #[error("unexpected dataset rank {actual}, expected {expected}")]
    RankMismatch {
        /// The declared rank.
        expected: usize,
        /// The rank of the dataset.
        actual: usize,
    },
    /// The datatype of a dataset cannot be converted to the declared element kind.
    #[error("incompatible dataset type, expected elements convertible to {expected}")]
    TypeMismatch {
        /// The declared element kind.
        expected: ElementKind,
    },
    /// The enumeration datatype of a dataset differs from the declared mapping.
    #[error("enum mismatch: {0}")]
    EnumMismatch(String),
    /// A shape differs from the shape of a dataset, record, or buffer.
    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// The expected extents.
        expected: Vec<usize>,
        /// The actual extents.
        actual: Vec<usize>,
    },
}

impl H5Error {
    /// Returns a function wrapping an [`EngineError`] into [`H5Error::Resource`] with `context`.
    pub(crate) fn resource(context: impl Into<String>) -> impl FnOnce(EngineError) -> Self {
        move |source| Self::Resource {
            context: context.into(),
            source,
        }
    }
}
