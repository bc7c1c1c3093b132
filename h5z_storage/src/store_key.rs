use derive_more::Display;
use thiserror::Error;

use super::StorePrefix;

/// A key identifying one value in a store.
///
/// A key is a non-empty `/` separated string that neither starts nor ends with `/`.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display)]
pub struct StoreKey(String);

/// An invalid store key.
#[derive(Clone, Debug, Error)]
#[error("invalid store key {0:?}")]
pub struct StoreKeyError(String);

/// A list of [`StoreKey`].
pub type StoreKeys = Vec<StoreKey>;

impl StoreKey {
    /// Create a new store key from `key`.
    ///
    /// # Errors
    /// Returns [`StoreKeyError`] if `key` is not valid according to [`StoreKey::validate()`].
    pub fn new(key: impl Into<String>) -> Result<Self, StoreKeyError> {
        let key = key.into();
        if Self::validate(&key) {
            Ok(Self(key))
        } else {
            Err(StoreKeyError(key))
        }
    }

    pub(crate) fn new_validated(key: String) -> Self {
        debug_assert!(Self::validate(&key));
        Self(key)
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validates a key.
    ///
    /// A key is invalid if it is empty, starts or ends with `/`, or contains an empty component.
    #[must_use]
    pub fn validate(key: &str) -> bool {
        !key.is_empty() && key.split('/').all(|component| !component.is_empty())
    }

    /// Returns true if the key lies under `prefix`.
    #[must_use]
    pub fn has_prefix(&self, prefix: &StorePrefix) -> bool {
        self.0.starts_with(prefix.as_str())
    }

    /// Returns the prefix naming this key as a directory.
    #[must_use]
    pub fn to_prefix(&self) -> StorePrefix {
        StorePrefix::new_validated(self.0.clone() + "/")
    }

    /// Returns the prefix containing this key.
    #[must_use]
    pub fn parent(&self) -> StorePrefix {
        match self.0.rfind('/') {
            Some(pos) => StorePrefix::new_validated(self.0[..=pos].to_string()),
            None => StorePrefix::root(),
        }
    }

    /// Returns the final component of the key.
    #[must_use]
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or_default()
    }
}

impl TryFrom<&str> for StoreKey {
    type Error = StoreKeyError;

    fn try_from(key: &str) -> Result<Self, Self::Error> {
        Self::new(key)
    }
}
