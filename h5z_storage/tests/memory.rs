use std::{error::Error, sync::Arc};

use h5z_storage::{
    store::MemoryStore, ReadableWritableListableStorage, StoreKey, StorePrefix,
};

#[test]
fn memory_store_shared() -> Result<(), Box<dyn Error>> {
    let store: ReadableWritableListableStorage = Arc::new(MemoryStore::default());
    store.set(&StoreKey::new("g/.h5z.json")?, vec![b'{', b'}'].into())?;
    store.set(&StoreKey::new("g/d/c/0")?, vec![0; 16].into())?;
    assert_eq!(store.size_prefix(&StorePrefix::new("g/d/")?)?, 16);
    let listing = store.list_dir(&StorePrefix::new("g/")?)?;
    assert_eq!(listing.keys(), &vec![StoreKey::new("g/.h5z.json")?]);
    assert_eq!(listing.prefixes(), &vec![StorePrefix::new("g/d/")?]);
    store.erase_prefix(&StorePrefix::new("g/d/")?)?;
    assert_eq!(store.size()?, 2);
    Ok(())
}
