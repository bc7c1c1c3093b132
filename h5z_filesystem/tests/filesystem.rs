use std::error::Error;

use h5z_filesystem::{FilesystemStore, FilesystemStoreOptions};
use h5z_storage::{
    store_test, ReadableStorageTraits, StorageError, StoreKey, WritableStorageTraits,
};

#[test]
fn filesystem() -> Result<(), Box<dyn Error>> {
    let path = tempfile::TempDir::new()?;
    let store = FilesystemStore::new(path.path())?.sorted();
    store_test::store_write(&store)?;
    store_test::store_read(&store)?;
    store_test::store_list(&store)?;
    Ok(())
}

#[test]
fn filesystem_layout() -> Result<(), Box<dyn Error>> {
    let path = tempfile::TempDir::new()?;
    let store = FilesystemStore::new(path.path())?;
    store.set(&StoreKey::new("group/value")?, vec![1, 2, 3].into())?;
    store.flush()?;
    assert_eq!(std::fs::read(path.path().join("group").join("value"))?, vec![1, 2, 3]);
    Ok(())
}

#[test]
fn filesystem_readonly() -> Result<(), Box<dyn Error>> {
    let path = tempfile::TempDir::new()?;
    {
        let store = FilesystemStore::new(path.path())?;
        store.set(&StoreKey::new("a")?, vec![1].into())?;
    }
    let mut options = FilesystemStoreOptions::default();
    options.readonly(true);
    let store = FilesystemStore::new_with_options(path.path(), options)?;
    assert!(store.is_readonly());
    assert_eq!(store.get(&StoreKey::new("a")?)?, Some(vec![1].into()));
    assert!(matches!(
        store.set(&StoreKey::new("a")?, vec![2].into()),
        Err(StorageError::ReadOnly)
    ));
    Ok(())
}

#[test]
fn filesystem_not_a_directory() -> Result<(), Box<dyn Error>> {
    let file = tempfile::NamedTempFile::new()?;
    assert!(FilesystemStore::new(file.path()).is_err());
    Ok(())
}
