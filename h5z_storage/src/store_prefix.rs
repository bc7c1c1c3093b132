use derive_more::Display;
use thiserror::Error;

use super::{StoreKey, StoreKeyError};

/// A prefix grouping store keys, like a directory.
///
/// A prefix is either empty (the root) or a valid [`StoreKey`] followed by a trailing `/`.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display)]
pub struct StorePrefix(String);

/// An invalid store prefix.
#[derive(Clone, Debug, Error)]
#[error("invalid store prefix {0:?}")]
pub struct StorePrefixError(String);

/// A list of [`StorePrefix`].
pub type StorePrefixes = Vec<StorePrefix>;

impl StorePrefix {
    /// Create a new store prefix from `prefix`.
    ///
    /// # Errors
    /// Returns [`StorePrefixError`] if `prefix` is not valid according to [`StorePrefix::validate()`].
    pub fn new(prefix: impl Into<String>) -> Result<Self, StorePrefixError> {
        let prefix = prefix.into();
        if Self::validate(&prefix) {
            Ok(Self(prefix))
        } else {
            Err(StorePrefixError(prefix))
        }
    }

    pub(crate) fn new_validated(prefix: String) -> Self {
        debug_assert!(Self::validate(&prefix));
        Self(prefix)
    }

    /// The root prefix.
    #[must_use]
    pub const fn root() -> Self {
        Self(String::new())
    }

    /// Create a prefix from a sequence of path components.
    ///
    /// An empty sequence gives the root prefix.
    ///
    /// # Errors
    /// Returns [`StorePrefixError`] if the components do not form a valid prefix, e.g. one is empty.
    pub fn from_components<'a>(
        components: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, StorePrefixError> {
        let mut prefix = String::new();
        for component in components {
            prefix.push_str(component);
            prefix.push('/');
        }
        Self::new(prefix)
    }

    /// Returns the prefix as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if this is the root prefix.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Validates a prefix.
    ///
    /// A prefix is valid if it is empty, or if it ends with `/` and the remainder is a valid [`StoreKey`].
    #[must_use]
    pub fn validate(prefix: &str) -> bool {
        prefix.is_empty()
            || prefix
                .strip_suffix('/')
                .is_some_and(StoreKey::validate)
    }

    /// Returns the key `name` directly under this prefix.
    ///
    /// # Errors
    /// Returns [`StoreKeyError`] if `name` does not form a valid key.
    pub fn key(&self, name: &str) -> Result<StoreKey, StoreKeyError> {
        StoreKey::new(format!("{}{name}", self.0))
    }

    /// Returns the prefix `name/` directly under this prefix.
    ///
    /// # Errors
    /// Returns [`StorePrefixError`] if `name` does not form a valid prefix.
    pub fn child(&self, name: &str) -> Result<StorePrefix, StorePrefixError> {
        StorePrefix::new(format!("{}{name}/", self.0))
    }

    /// Returns the parent prefix, or [`None`] for the root.
    #[must_use]
    pub fn parent(&self) -> Option<StorePrefix> {
        let trimmed = self.0.strip_suffix('/')?;
        Some(StoreKey::new_validated(trimmed.to_string()).parent())
    }
}

impl TryFrom<&str> for StorePrefix {
    type Error = StorePrefixError;

    fn try_from(prefix: &str) -> Result<Self, Self::Error> {
        Self::new(prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_prefix() {
        assert!(StorePrefix::new("").is_ok());
        assert!(StorePrefix::new("a/").is_ok());
        assert!(StorePrefix::new("a/b/").is_ok());
        assert!(StorePrefix::new("a").is_err());
        assert!(StorePrefix::new("/a/").is_err());
        assert!(StorePrefix::new("a//").is_err());
        assert_eq!(
            StorePrefix::new("a").unwrap_err().to_string(),
            "invalid store prefix \"a\""
        );
    }

    #[test]
    fn store_prefix_components() {
        let prefix = StorePrefix::from_components(["a", "b"]).unwrap();
        assert_eq!(prefix.as_str(), "a/b/");
        assert_eq!(prefix.key("c").unwrap().as_str(), "a/b/c");
        assert_eq!(prefix.child("c").unwrap().as_str(), "a/b/c/");
        assert_eq!(prefix.parent(), Some(StorePrefix::new("a/").unwrap()));
        assert_eq!(
            StorePrefix::new("a/").unwrap().parent(),
            Some(StorePrefix::root())
        );
        assert_eq!(StorePrefix::root().parent(), None);
        assert!(StorePrefix::from_components(std::iter::empty())
            .unwrap()
            .is_root());
        assert!(StorePrefix::from_components(["a", ""]).is_err());
    }
}
