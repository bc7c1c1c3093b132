//! Files, links, and groups.

use std::{path::Path, sync::Arc};

use h5z_filesystem::{FilesystemStore, FilesystemStoreOptions};
use h5z_storage::{
    ListableStorageTraits, ReadableStorageTraits, ReadableWritableListableStorage, StorePrefix,
    WritableStorageTraits, store::MemoryStore,
};

use crate::{
    EngineError, Hid,
    metadata::{self, NodeMetadata, NodePath},
    plist,
    registry::{self, Object, ObjectKind},
};

/// How [`file_create`] treats an existing file.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CreateMode {
    /// Truncate an existing file.
    Truncate,
    /// Fail if the file exists.
    Exclusive,
}

/// How [`file_open`] opens a file.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AccessMode {
    /// Reject writes.
    ReadOnly,
    /// Permit reads and writes.
    ReadWrite,
}

/// An open file.
pub(crate) struct FileObject {
    store: ReadableWritableListableStorage,
    name: String,
    writable: bool,
}

impl FileObject {
    pub(crate) fn store(&self) -> &ReadableWritableListableStorage {
        &self.store
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn check_writable(&self) -> Result<(), EngineError> {
        if self.writable {
            Ok(())
        } else {
            Err(EngineError::ReadOnly(self.name.clone()))
        }
    }
}

fn register_file(store: ReadableWritableListableStorage, name: String, writable: bool) -> Hid {
    registry::register(Object::File(Arc::new(FileObject {
        store,
        name,
        writable,
    })))
}

fn create_root(store: ReadableWritableListableStorage, name: String) -> Result<Hid, EngineError> {
    metadata::save(&store, &NodePath::parse("/")?, &NodeMetadata::Group)?;
    store.flush()?;
    let id = register_file(store, name, true);
    log::debug!("created file {id}");
    Ok(id)
}

/// Create a file at `path`, a directory holding the nodes of the file.
///
/// With [`CreateMode::Truncate`] an existing file is emptied.
/// Only directories holding a file, or empty directories, are truncated.
///
/// # Errors
/// Returns an [`EngineError`] if the file exists and `mode` is [`CreateMode::Exclusive`], if `path`
/// is not a file or an empty directory, or if the directory cannot be created.
pub fn file_create(path: impl AsRef<Path>, mode: CreateMode) -> Result<Hid, EngineError> {
    let path = path.as_ref();
    let name = path.display().to_string();
    if path.exists() {
        if mode == CreateMode::Exclusive {
            return Err(EngineError::AlreadyExists(name));
        }
        let store = FilesystemStore::new(path)?;
        let root = NodePath::parse("/")?;
        let listing = store.list_dir(&StorePrefix::root())?;
        let is_empty = listing.keys().is_empty() && listing.prefixes().is_empty();
        if !is_empty && !store.contains(&root.metadata_key()?)? {
            return Err(EngineError::InvalidArgument(format!(
                "refusing to truncate {name}, which is not a file"
            )));
        }
        log::debug!("truncating file {name}");
        store.erase_prefix(&StorePrefix::root())?;
    }
    let store: ReadableWritableListableStorage = Arc::new(FilesystemStore::new(path)?);
    create_root(store, name)
}

/// Create a file held in memory, discarded when closed.
///
/// # Errors
/// Returns an [`EngineError`] if the root group cannot be created.
pub fn file_create_in_memory() -> Result<Hid, EngineError> {
    create_root(Arc::new(MemoryStore::new()), "<memory>".to_string())
}

/// Open an existing file.
///
/// # Errors
/// Returns an [`EngineError`] if `path` is not a file.
pub fn file_open(path: impl AsRef<Path>, mode: AccessMode) -> Result<Hid, EngineError> {
    let path = path.as_ref();
    let name = path.display().to_string();
    if !path.is_dir() {
        return Err(EngineError::NotFound(name));
    }
    let mut options = FilesystemStoreOptions::default();
    options.readonly(mode == AccessMode::ReadOnly);
    let store: ReadableWritableListableStorage =
        Arc::new(FilesystemStore::new_with_options(path, options)?);
    match metadata::load(&store, &NodePath::parse("/")?)? {
        Some(NodeMetadata::Group) => {}
        Some(NodeMetadata::Dataset(_)) | None => return Err(EngineError::NotFound(name)),
    }
    let id = register_file(store, name, mode == AccessMode::ReadWrite);
    log::debug!("opened file {id} ({mode:?})");
    Ok(id)
}

/// Make all writes to a file durable.
///
/// # Errors
/// Returns an [`EngineError`] if `id` is not a file or the store fails to flush.
pub fn file_flush(id: Hid) -> Result<(), EngineError> {
    let file = registry::file(id)?;
    if file.writable {
        file.store.flush()?;
    }
    Ok(())
}

/// Close a file, flushing it if writable.
///
/// Datasets opened from the file remain usable until closed.
///
/// # Errors
/// Returns an [`EngineError`] if `id` is not a file or the store fails to flush.
pub fn file_close(id: Hid) -> Result<(), EngineError> {
    let Object::File(file) = registry::unregister(id, ObjectKind::File)? else {
        return Err(EngineError::WrongKind {
            id,
            expected: ObjectKind::File,
        });
    };
    log::debug!("closing file {id} ({})", file.name);
    if file.writable {
        file.store.flush()?;
    }
    Ok(())
}

/// Returns the total size in bytes of the stored nodes of a file.
///
/// # Errors
/// Returns an [`EngineError`] if `id` is not a file or the store cannot be listed.
pub fn file_size(id: Hid) -> Result<u64, EngineError> {
    Ok(registry::file(id)?.store.size()?)
}

/// Check that every ancestor of `node` is a group.
fn check_ancestors(file: &FileObject, node: &NodePath) -> Result<(), EngineError> {
    for ancestor in node.ancestors() {
        match metadata::load(&file.store, &ancestor)? {
            Some(NodeMetadata::Group) => {}
            Some(NodeMetadata::Dataset(_)) => {
                return Err(EngineError::NotAGroup(ancestor.to_string()));
            }
            None => return Err(EngineError::NotFound(ancestor.to_string())),
        }
    }
    Ok(())
}

/// Create a node, and any missing ancestor groups if `create_intermediate` is set.
pub(crate) fn create_node(
    file: &FileObject,
    node: &NodePath,
    node_metadata: &NodeMetadata,
    create_intermediate: bool,
) -> Result<(), EngineError> {
    file.check_writable()?;
    if node.is_root() {
        return Err(EngineError::AlreadyExists(node.to_string()));
    }
    for ancestor in node.ancestors() {
        match metadata::load(&file.store, &ancestor)? {
            Some(NodeMetadata::Group) => {}
            Some(NodeMetadata::Dataset(_)) => {
                return Err(EngineError::NotAGroup(ancestor.to_string()));
            }
            None if create_intermediate => {
                log::debug!("creating intermediate group {ancestor} in {}", file.name);
                metadata::save(&file.store, &ancestor, &NodeMetadata::Group)?;
            }
            None => return Err(EngineError::NotFound(ancestor.to_string())),
        }
    }
    if file.store.contains(&node.metadata_key()?)? {
        return Err(EngineError::AlreadyExists(node.to_string()));
    }
    metadata::save(&file.store, node, node_metadata)
}

/// Returns true if a node exists at `path`.
///
/// # Errors
/// Returns an [`EngineError`] if `loc` is not a file, `path` is invalid, or an ancestor of `path` is
/// missing or not a group.
pub fn link_exists(loc: Hid, path: &str) -> Result<bool, EngineError> {
    let file = registry::file(loc)?;
    let node = NodePath::parse(path)?;
    if node.is_root() {
        return Ok(true);
    }
    check_ancestors(&file, &node)?;
    Ok(file.store.contains(&node.metadata_key()?)?)
}

/// Delete the node at `path` and everything below it.
///
/// # Errors
/// Returns an [`EngineError`] if `loc` is not a writable file or no node exists at `path`.
pub fn link_delete(loc: Hid, path: &str) -> Result<(), EngineError> {
    let file = registry::file(loc)?;
    file.check_writable()?;
    let node = NodePath::parse(path)?;
    if node.is_root() {
        return Err(EngineError::InvalidArgument(
            "the root group cannot be deleted".to_string(),
        ));
    }
    if !file.store.contains(&node.metadata_key()?)? {
        return Err(EngineError::NotFound(node.to_string()));
    }
    log::debug!("deleting {node} from {}", file.name);
    file.store.erase_prefix(&node.prefix()?)?;
    Ok(())
}

/// Create a group at `path`.
///
/// # Errors
/// Returns an [`EngineError`] if `loc` is not a writable file, the node exists, or an ancestor is
/// missing (and not created per `lcpl`) or not a group.
pub fn group_create(loc: Hid, path: &str, lcpl: Hid) -> Result<(), EngineError> {
    let file = registry::file(loc)?;
    let node = NodePath::parse(path)?;
    let create_intermediate = plist::create_intermediate_group(lcpl)?;
    create_node(&file, &node, &NodeMetadata::Group, create_intermediate)?;
    log::debug!("created group {node} in {}", file.name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PropertyListClass, plist_close, plist_create, plist_set_create_intermediate_group};

    #[test]
    fn file_groups() {
        let file = file_create_in_memory().unwrap();
        assert!(link_exists(file, "/").unwrap());
        assert!(!link_exists(file, "a").unwrap());
        assert!(link_exists(file, "a/b").is_err());
        assert!(group_create(file, "a/b", crate::P_DEFAULT).is_err());

        let lcpl = plist_create(PropertyListClass::LinkCreate);
        plist_set_create_intermediate_group(lcpl, true).unwrap();
        group_create(file, "a/b", lcpl).unwrap();
        plist_close(lcpl).unwrap();
        assert!(link_exists(file, "a").unwrap());
        assert!(link_exists(file, "/a/b").unwrap());
        assert!(group_create(file, "a", crate::P_DEFAULT).is_err());

        link_delete(file, "a").unwrap();
        assert!(!link_exists(file, "a").unwrap());
        assert!(link_delete(file, "a").is_err());
        assert!(link_delete(file, "/").is_err());
        file_close(file).unwrap();
        assert!(file_close(file).is_err());
    }
}
