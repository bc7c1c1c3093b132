//! A synchronous in-memory store.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use crate::{
    Bytes, ListableStorageTraits, MaybeBytes, ReadableStorageTraits, StorageError, StoreKey,
    StoreKeys, StoreKeysPrefixes, StorePrefix, WritableStorageTraits,
};

/// A synchronous in-memory store.
///
/// Values live for as long as the store; [`WritableStorageTraits::flush`] is a no-op.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data_map: Mutex<BTreeMap<StoreKey, Bytes>>,
}

impl MemoryStore {
    /// Create a new, empty memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<StoreKey, Bytes>>, StorageError> {
        self.data_map
            .lock()
            .map_err(|_| StorageError::Other("memory store lock poisoned".to_string()))
    }
}

impl ReadableStorageTraits for MemoryStore {
    fn get(&self, key: &StoreKey) -> Result<MaybeBytes, StorageError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn size_key(&self, key: &StoreKey) -> Result<Option<u64>, StorageError> {
        Ok(self.lock()?.get(key).map(|value| value.len() as u64))
    }
}

impl WritableStorageTraits for MemoryStore {
    fn set(&self, key: &StoreKey, value: Bytes) -> Result<(), StorageError> {
        self.lock()?.insert(key.clone(), value);
        Ok(())
    }

    fn erase(&self, key: &StoreKey) -> Result<(), StorageError> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn erase_prefix(&self, prefix: &StorePrefix) -> Result<(), StorageError> {
        self.lock()?.retain(|key, _| !key.has_prefix(prefix));
        Ok(())
    }
}

impl ListableStorageTraits for MemoryStore {
    fn list_prefix(&self, prefix: &StorePrefix) -> Result<StoreKeys, StorageError> {
        Ok(self
            .lock()?
            .keys()
            .filter(|key| key.has_prefix(prefix))
            .cloned()
            .collect())
    }

    fn list_dir(&self, prefix: &StorePrefix) -> Result<StoreKeysPrefixes, StorageError> {
        let mut keys: StoreKeys = vec![];
        let mut prefixes: BTreeSet<StorePrefix> = BTreeSet::new();
        for key in self.lock()?.keys().filter(|key| key.has_prefix(prefix)) {
            let remainder = &key.as_str()[prefix.as_str().len()..];
            match remainder.split_once('/') {
                Some((child, _)) => {
                    prefixes.insert(prefix.child(child)?);
                }
                None => keys.push(key.clone()),
            }
        }
        Ok(StoreKeysPrefixes::new(keys, prefixes.into_iter().collect()))
    }

    fn size_prefix(&self, prefix: &StorePrefix) -> Result<u64, StorageError> {
        Ok(self
            .lock()?
            .iter()
            .filter(|(key, _)| key.has_prefix(prefix))
            .map(|(_, value)| value.len() as u64)
            .sum())
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;

    #[test]
    fn memory() -> Result<(), Box<dyn Error>> {
        let store = MemoryStore::new();
        crate::store_test::store_write(&store)?;
        crate::store_test::store_read(&store)?;
        crate::store_test::store_list(&store)?;
        Ok(())
    }

    #[test]
    fn memory_erase_prefix() -> Result<(), Box<dyn Error>> {
        let store = MemoryStore::new();
        store.set(&"a/b".try_into()?, Bytes::from_static(&[1]))?;
        store.set(&"a/c/d".try_into()?, Bytes::from_static(&[2, 3]))?;
        store.set(&"ab".try_into()?, Bytes::from_static(&[4]))?;
        assert_eq!(store.size()?, 4);
        store.erase_prefix(&"a/".try_into()?)?;
        assert_eq!(store.list()?, vec![StoreKey::new("ab")?]);
        Ok(())
    }
}
