//! A directory-backed store for the `h5z` storage engine.
//!
//! Each [`StoreKey`] maps to a file below a base directory, and each [`StorePrefix`] to a directory.
//! Written files are remembered until [`WritableStorageTraits::flush`] synchronises them to disk.
//!
//! ## Licence
//! `h5z_filesystem` is licensed under either of
//! - the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> or
//! - the MIT license <http://opensource.org/licenses/MIT>, at your option.

use std::{
    collections::{HashMap, HashSet},
    fs::OpenOptions,
    io::{ErrorKind, Read, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use h5z_storage::{
    Bytes, ListableStorageTraits, MaybeBytes, ReadableStorageTraits, StorageError, StoreKey,
    StoreKeyError, StoreKeys, StoreKeysPrefixes, StorePrefix, StorePrefixes,
    WritableStorageTraits,
};
use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use walkdir::WalkDir;

/// Options for use with [`FilesystemStore`].
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct FilesystemStoreOptions {
    readonly: bool,
    sync_on_flush: bool,
}

impl Default for FilesystemStoreOptions {
    fn default() -> Self {
        Self {
            readonly: false,
            sync_on_flush: true,
        }
    }
}

impl FilesystemStoreOptions {
    /// Set whether the store rejects writes.
    pub fn readonly(&mut self, readonly: bool) -> &mut Self {
        self.readonly = readonly;
        self
    }

    /// Set whether [`WritableStorageTraits::flush`] calls `fsync` on written files.
    pub fn sync_on_flush(&mut self, sync_on_flush: bool) -> &mut Self {
        self.sync_on_flush = sync_on_flush;
        self
    }
}

/// A synchronous file system store.
#[derive(Debug)]
pub struct FilesystemStore {
    base_path: PathBuf,
    sort: bool,
    options: FilesystemStoreOptions,
    files: Mutex<HashMap<StoreKey, Arc<RwLock<()>>>>,
    unsynced: Mutex<HashSet<PathBuf>>,
}

impl FilesystemStore {
    /// Create a new file system store at a given `base_path`.
    ///
    /// # Errors
    /// Returns a [`FilesystemStoreCreateError`] if `base_path` is not valid or points to an existing file rather than a directory.
    pub fn new<P: AsRef<Path>>(base_path: P) -> Result<Self, FilesystemStoreCreateError> {
        Self::new_with_options(base_path, FilesystemStoreOptions::default())
    }

    /// Create a new file system store at a given `base_path` and `options`.
    ///
    /// The base directory is created if it does not exist and the store is writable.
    ///
    /// # Errors
    /// Returns a [`FilesystemStoreCreateError`] if `base_path` is not valid or points to an existing file rather than a directory.
    pub fn new_with_options<P: AsRef<Path>>(
        base_path: P,
        options: FilesystemStoreOptions,
    ) -> Result<Self, FilesystemStoreCreateError> {
        let base_path = base_path.as_ref().to_path_buf();
        if base_path.to_str().is_none() {
            return Err(FilesystemStoreCreateError::InvalidBasePath(base_path));
        }
        if base_path.is_file() {
            return Err(FilesystemStoreCreateError::NotADirectory(base_path));
        }
        if !options.readonly && !base_path.exists() {
            std::fs::create_dir_all(&base_path)?;
        }

        Ok(Self {
            base_path,
            sort: false,
            options,
            files: Mutex::default(),
            unsynced: Mutex::default(),
        })
    }

    /// Makes the store sort directories/files when listing.
    #[must_use]
    pub const fn sorted(mut self) -> Self {
        self.sort = true;
        self
    }

    /// Returns the base directory of the store.
    #[must_use]
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Returns true if the store rejects writes.
    #[must_use]
    pub fn is_readonly(&self) -> bool {
        self.options.readonly
    }

    /// Maps a [`StoreKey`] to a filesystem [`PathBuf`].
    #[must_use]
    pub fn key_to_fspath(&self, key: &StoreKey) -> PathBuf {
        self.base_path.join(key.as_str())
    }

    /// Maps a store [`StorePrefix`] to a filesystem [`PathBuf`].
    #[must_use]
    pub fn prefix_to_fspath(&self, prefix: &StorePrefix) -> PathBuf {
        self.base_path.join(prefix.as_str())
    }

    /// Maps a filesystem path below the base directory to a [`StoreKey`].
    fn fspath_to_key(&self, path: &Path) -> Result<StoreKey, StoreKeyError> {
        let relative = pathdiff::diff_paths(path, &self.base_path).unwrap_or_default();
        let relative = relative.to_string_lossy();
        #[cfg(target_os = "windows")]
        {
            StoreKey::new(relative.replace('\\', "/"))
        }
        #[cfg(not(target_os = "windows"))]
        {
            StoreKey::new(relative)
        }
    }

    fn get_file_mutex(&self, key: &StoreKey) -> Arc<RwLock<()>> {
        self.files
            .lock()
            .entry(key.clone())
            .or_insert_with(|| Arc::new(RwLock::default()))
            .clone()
    }

    fn check_writable(&self) -> Result<(), StorageError> {
        if self.options.readonly {
            Err(StorageError::ReadOnly)
        } else {
            Ok(())
        }
    }

    fn walk_files(&self, path: PathBuf) -> impl Iterator<Item = walkdir::DirEntry> {
        WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_file())
    }
}

impl ReadableStorageTraits for FilesystemStore {
    fn get(&self, key: &StoreKey) -> Result<MaybeBytes, StorageError> {
        let file = self.get_file_mutex(key);
        let _lock = file.read();
        let mut file = match OpenOptions::new().read(true).open(self.key_to_fspath(key)) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;
        Ok(Some(Bytes::from(buffer)))
    }

    fn size_key(&self, key: &StoreKey) -> Result<Option<u64>, StorageError> {
        match std::fs::metadata(self.key_to_fspath(key)) {
            Ok(metadata) if metadata.is_file() => Ok(Some(metadata.len())),
            Ok(_) => Ok(None),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

impl WritableStorageTraits for FilesystemStore {
    fn set(&self, key: &StoreKey, value: Bytes) -> Result<(), StorageError> {
        self.check_writable()?;
        let file = self.get_file_mutex(key);
        let _lock = file.write();

        let key_path = self.key_to_fspath(key);
        if let Some(parent) = key_path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&key_path)?;
        file.write_all(&value)?;
        self.unsynced.lock().insert(key_path);
        Ok(())
    }

    fn erase(&self, key: &StoreKey) -> Result<(), StorageError> {
        self.check_writable()?;
        let file = self.get_file_mutex(key);
        let _lock = file.write();

        let key_path = self.key_to_fspath(key);
        self.unsynced.lock().remove(&key_path);
        match std::fs::remove_file(key_path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn erase_prefix(&self, prefix: &StorePrefix) -> Result<(), StorageError> {
        self.check_writable()?;
        let _lock = self.files.lock(); // lock all operations

        let prefix_path = self.prefix_to_fspath(prefix);
        self.unsynced
            .lock()
            .retain(|path| !path.starts_with(&prefix_path));
        if prefix.is_root() {
            // keep the base directory itself
            let entries = match std::fs::read_dir(&prefix_path) {
                Ok(entries) => entries,
                Err(err) if err.kind() == ErrorKind::NotFound => return Ok(()),
                Err(err) => return Err(err.into()),
            };
            for entry in entries {
                let entry = entry?;
                if entry.file_type()?.is_dir() {
                    std::fs::remove_dir_all(entry.path())?;
                } else {
                    std::fs::remove_file(entry.path())?;
                }
            }
            return Ok(());
        }
        match std::fs::remove_dir_all(prefix_path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn flush(&self) -> Result<(), StorageError> {
        let unsynced: Vec<PathBuf> = self.unsynced.lock().drain().collect();
        if !self.options.sync_on_flush {
            return Ok(());
        }
        log::trace!("syncing {} files under {:?}", unsynced.len(), self.base_path);
        for path in unsynced {
            match OpenOptions::new().read(true).open(&path) {
                Ok(file) => file.sync_all()?,
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }
}

impl ListableStorageTraits for FilesystemStore {
    fn list_prefix(&self, prefix: &StorePrefix) -> Result<StoreKeys, StorageError> {
        Ok(self
            .walk_files(self.prefix_to_fspath(prefix))
            .filter_map(|entry| self.fspath_to_key(entry.path()).ok())
            .collect())
    }

    fn list_dir(&self, prefix: &StorePrefix) -> Result<StoreKeysPrefixes, StorageError> {
        let mut keys: StoreKeys = vec![];
        let mut prefixes: StorePrefixes = vec![];
        let dir = match std::fs::read_dir(self.prefix_to_fspath(prefix)) {
            Ok(dir) => dir,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Ok(StoreKeysPrefixes::new(keys, prefixes))
            }
            Err(err) => return Err(err.into()),
        };
        for entry in dir {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if entry.file_type()?.is_dir() {
                prefixes.push(prefix.child(name)?);
            } else {
                keys.push(prefix.key(name)?);
            }
        }
        if self.sort {
            keys.sort();
            prefixes.sort();
        }
        Ok(StoreKeysPrefixes::new(keys, prefixes))
    }

    fn size_prefix(&self, prefix: &StorePrefix) -> Result<u64, StorageError> {
        let mut size = 0;
        for entry in self.walk_files(self.prefix_to_fspath(prefix)) {
            size += entry.metadata().map_err(std::io::Error::from)?.len();
        }
        Ok(size)
    }
}

/// A filesystem store creation error.
#[derive(Debug, Error)]
pub enum FilesystemStoreCreateError {
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    /// The path is not valid on this system.
    #[error("base path {0} is not valid")]
    InvalidBasePath(PathBuf),
    /// The path points to a file.
    #[error("base path {0} is not a directory")]
    NotADirectory(PathBuf),
}
