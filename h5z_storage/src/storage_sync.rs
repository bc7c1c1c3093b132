use super::{
    Bytes, MaybeBytes, StorageError, StoreKey, StoreKeys, StoreKeysPrefixes, StorePrefix,
};

/// Lookup of stored values.
pub trait ReadableStorageTraits: Send + Sync {
    /// Returns the value at `key`, or [`None`] if nothing is stored there.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the store cannot be read.
    fn get(&self, key: &StoreKey) -> Result<MaybeBytes, StorageError>;

    /// Returns the length of the value at `key`, or [`None`] if nothing is stored there.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the store cannot be read.
    fn size_key(&self, key: &StoreKey) -> Result<Option<u64>, StorageError>;

    /// Returns true if a value is stored at `key`.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the store cannot be read.
    fn contains(&self, key: &StoreKey) -> Result<bool, StorageError> {
        Ok(self.size_key(key)?.is_some())
    }
}

/// Enumeration of stored keys.
pub trait ListableStorageTraits: Send + Sync {
    /// Returns every key in the store.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the store cannot be listed.
    fn list(&self) -> Result<StoreKeys, StorageError> {
        self.list_prefix(&StorePrefix::root())
    }

    /// Returns every key under `prefix`, at any depth.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the store cannot be listed.
    fn list_prefix(&self, prefix: &StorePrefix) -> Result<StoreKeys, StorageError>;

    /// Returns the keys and prefixes one level below `prefix`.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the store cannot be listed.
    fn list_dir(&self, prefix: &StorePrefix) -> Result<StoreKeysPrefixes, StorageError>;

    /// Returns the summed value lengths under `prefix`.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the store cannot be listed.
    fn size_prefix(&self, prefix: &StorePrefix) -> Result<u64, StorageError>;

    /// Returns the summed value lengths of the whole store.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the store cannot be listed.
    fn size(&self) -> Result<u64, StorageError> {
        self.size_prefix(&StorePrefix::root())
    }
}

/// Modification of stored values.
pub trait WritableStorageTraits: Send + Sync {
    /// Store `value` at `key`, replacing what was there.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the store is read only or the value cannot be written.
    fn set(&self, key: &StoreKey, value: Bytes) -> Result<(), StorageError>;

    /// Remove the value at `key`. Removing a missing key succeeds.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the store is read only or the value cannot be removed.
    fn erase(&self, key: &StoreKey) -> Result<(), StorageError>;

    /// Remove every value under `prefix`.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the store is read only or a value cannot be removed.
    fn erase_prefix(&self, prefix: &StorePrefix) -> Result<(), StorageError>;

    /// Make every value stored so far durable.
    ///
    /// Stores without a durability boundary succeed immediately.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the store cannot be synchronised.
    fn flush(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// A store that can be read, written, and listed, as the engine requires of file backends.
pub trait ReadableWritableListableStorageTraits:
    ReadableStorageTraits + WritableStorageTraits + ListableStorageTraits
{
}

impl<T> ReadableWritableListableStorageTraits for T where
    T: ReadableStorageTraits + WritableStorageTraits + ListableStorageTraits
{
}
