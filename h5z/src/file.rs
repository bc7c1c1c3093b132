use std::{path::Path, str::FromStr};

use derive_more::Display;
use h5z_engine::{
    AccessMode, CreateMode, Hid, file_create, file_create_in_memory, file_flush, file_open,
    file_size,
};

use crate::{
    Dataset, EnumMapping, EnumValue, H5Error, StorageElement,
    hid::{FileRelease, UniqueHid},
};

/// How a [`File`] is opened.
///
/// | Mode | Meaning                                   |
/// |------|-------------------------------------------|
/// | `r`  | Read only. File must exist.               |
/// | `r+` | Read-write. File must exist.              |
/// | `w`  | Read-write. File is created or truncated. |
/// | `w-` | Read-write. File must not exist.          |
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display)]
pub enum FileMode {
    /// `r`
    #[display("r")]
    ReadOnly,
    /// `r+`
    #[display("r+")]
    ReadWrite,
    /// `w`
    #[display("w")]
    Truncate,
    /// `w-`
    #[display("w-")]
    Exclusive,
}

impl FromStr for FileMode {
    type Err = H5Error;

    fn from_str(mode: &str) -> Result<Self, Self::Err> {
        match mode {
            "r" => Ok(Self::ReadOnly),
            "r+" => Ok(Self::ReadWrite),
            "w" => Ok(Self::Truncate),
            "w-" => Ok(Self::Exclusive),
            _ => Err(H5Error::Configuration(format!(
                "unrecognized file mode {mode:?}"
            ))),
        }
    }
}

/// An open file.
///
/// Datasets obtained from a file borrow it, so the file outlives them.
#[derive(Debug)]
pub struct File {
    file: UniqueHid<FileRelease>,
}

impl File {
    /// Open or create the file at `path` with a mode string: `r`, `r+`, `w`, or `w-`.
    ///
    /// # Errors
    /// Returns [`H5Error::Configuration`] for an unrecognized mode and [`H5Error::Resource`] if the file
    /// cannot be opened or created.
    pub fn open(path: impl AsRef<Path>, mode: &str) -> Result<Self, H5Error> {
        Self::open_with_mode(path, mode.parse()?)
    }

    /// Open or create the file at `path` with `mode`.
    ///
    /// # Errors
    /// Returns [`H5Error::Resource`] if the file cannot be opened or created.
    pub fn open_with_mode(path: impl AsRef<Path>, mode: FileMode) -> Result<Self, H5Error> {
        let path = path.as_ref();
        let file = match mode {
            FileMode::ReadOnly => file_open(path, AccessMode::ReadOnly)
                .map_err(H5Error::resource(format!("cannot open file {}", path.display()))),
            FileMode::ReadWrite => file_open(path, AccessMode::ReadWrite)
                .map_err(H5Error::resource(format!("cannot open file {}", path.display()))),
            FileMode::Truncate => file_create(path, CreateMode::Truncate)
                .map_err(H5Error::resource(format!("cannot create file {}", path.display()))),
            FileMode::Exclusive => file_create(path, CreateMode::Exclusive)
                .map_err(H5Error::resource(format!("cannot create file {}", path.display()))),
        }?;
        Ok(Self { file: file.into() })
    }

    /// Create a writable file held in memory.
    ///
    /// # Errors
    /// Returns [`H5Error::Resource`] if the file cannot be created.
    pub fn in_memory() -> Result<Self, H5Error> {
        let file =
            file_create_in_memory().map_err(H5Error::resource("cannot create in-memory file"))?;
        Ok(Self { file: file.into() })
    }

    /// Returns the underlying file identifier.
    #[must_use]
    pub fn handle(&self) -> Hid {
        self.file.hid()
    }

    /// Access the dataset at `path` with elements of `D` and rank `RANK`.
    ///
    /// The accessor is unbound if nothing exists at `path`; writing binds it.
    ///
    /// # Errors
    /// Returns an [`H5Error`] if the dataset cannot be opened, or its rank or datatype differs from
    /// the declaration.
    pub fn dataset<D: StorageElement, const RANK: usize>(
        &self,
        path: &str,
    ) -> Result<Dataset<'_, D, RANK>, H5Error> {
        Dataset::open(self, path, None)
    }

    /// Access the enumeration dataset at `path` with values of `D`, rank `RANK`, and `mapping`.
    ///
    /// Datasets created through the accessor carry `mapping` in their datatype.
    ///
    /// # Errors
    /// Returns an [`H5Error`] if the dataset cannot be opened, or its rank, datatype, or members differ
    /// from the declaration.
    pub fn dataset_with_enum<D: EnumValue, const RANK: usize>(
        &self,
        path: &str,
        mapping: &EnumMapping<D>,
    ) -> Result<Dataset<'_, D, RANK>, H5Error> {
        Dataset::open(self, path, Some(mapping.to_members()?))
    }

    /// Flush written data to durable storage.
    ///
    /// # Errors
    /// Returns [`H5Error::Resource`] if the file cannot be flushed.
    pub fn flush(&self) -> Result<(), H5Error> {
        file_flush(self.handle()).map_err(H5Error::resource("failed to flush file"))
    }

    /// Returns the total size of the file contents in bytes.
    ///
    /// # Errors
    /// Returns [`H5Error::Resource`] if the size cannot be determined.
    pub fn size(&self) -> Result<u64, H5Error> {
        file_size(self.handle()).map_err(H5Error::resource("failed to determine file size"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_mode_parse() {
        assert_eq!("r".parse::<FileMode>().unwrap(), FileMode::ReadOnly);
        assert_eq!("r+".parse::<FileMode>().unwrap(), FileMode::ReadWrite);
        assert_eq!("w".parse::<FileMode>().unwrap(), FileMode::Truncate);
        assert_eq!("w-".parse::<FileMode>().unwrap(), FileMode::Exclusive);
        for mode in ["", "a", "rw", "W", "x"] {
            assert!(matches!(
                mode.parse::<FileMode>(),
                Err(H5Error::Configuration(_))
            ));
        }
        assert_eq!(FileMode::ReadWrite.to_string(), "r+");
    }

    #[test]
    fn file_in_memory() {
        let file = File::in_memory().unwrap();
        assert!(file.handle() >= 0);
        assert!(file.size().unwrap() > 0);
        file.flush().unwrap();
    }
}
