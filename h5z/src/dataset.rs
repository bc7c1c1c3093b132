use std::marker::PhantomData;

use h5z_engine::{
    Hid, PropertyListClass, ScaleType, dataset_create, dataset_get_space,
    dataset_get_type, dataset_open, dataset_read, dataset_write, link_delete, plist_create,
    plist_set_chunk, plist_set_create_intermediate_group, plist_set_deflate,
    plist_set_scaleoffset, plist_set_shuffle, space_create_simple, space_dims, space_max_dims,
    space_ndims, type_enum_create, type_enum_insert, type_find_conversion, type_size,
};

use crate::{
    Buffer, DatasetOptions, ElementKind, File, H5Error, NativeElement, Shape, StorageElement,
    StreamWriter, chunking::halve_extents, enums::validate_dataset_enum, global_config,
    hid::{DatasetRelease, DataspaceRelease, DatatypeRelease, PropertyListRelease, UniqueHid},
    native_type, path_exists, storage_type,
};

/// The extents and maximum extents of a dataset.
pub(crate) struct Extents {
    pub(crate) dims: Vec<u64>,
    pub(crate) max_dims: Vec<Option<u64>>,
}

pub(crate) fn dataset_extents(dataset: Hid) -> Result<Extents, H5Error> {
    let space = UniqueHid::<DataspaceRelease>::from(
        dataset_get_space(dataset).map_err(H5Error::resource("failed to determine dataspace"))?,
    );
    let dims =
        space_dims(space.hid()).map_err(H5Error::resource("failed to determine dataset shape"))?;
    let max_dims = space_max_dims(space.hid())
        .map_err(H5Error::resource("failed to determine maximum dataset shape"))?;
    Ok(Extents { dims, max_dims })
}

/// Returns the shape of `dataset`, checking its rank is `RANK`.
pub(crate) fn check_dataset_rank<const RANK: usize>(dataset: Hid) -> Result<Shape<RANK>, H5Error> {
    let space = UniqueHid::<DataspaceRelease>::from(
        dataset_get_space(dataset).map_err(H5Error::resource("failed to determine dataspace"))?,
    );
    let rank =
        space_ndims(space.hid()).map_err(H5Error::resource("failed to determine dataset rank"))?;
    if rank != RANK {
        return Err(H5Error::RankMismatch {
            expected: RANK,
            actual: rank,
        });
    }
    let dims =
        space_dims(space.hid()).map_err(H5Error::resource("failed to determine dataset shape"))?;
    Shape::from_extents(&dims).ok_or_else(|| H5Error::RankMismatch {
        expected: RANK,
        actual: dims.len(),
    })
}

/// Check that the datatype of `dataset` converts to elements of `kind`.
fn check_dataset_type(dataset: Hid, kind: ElementKind) -> Result<(), H5Error> {
    let datatype = UniqueHid::<DatatypeRelease>::from(
        dataset_get_type(dataset).map_err(H5Error::resource("failed to determine datatype"))?,
    );
    if type_find_conversion(datatype.hid(), storage_type(kind)?)
        .map_err(H5Error::resource("failed to find a datatype conversion"))?
    {
        Ok(())
    } else {
        Err(H5Error::TypeMismatch { expected: kind })
    }
}

/// The parameters of a dataset to create.
pub(crate) struct NewDataset<'a> {
    pub(crate) dims: Vec<u64>,
    pub(crate) max_dims: Vec<Option<u64>>,
    /// The shape the chunk shape heuristic is applied to.
    pub(crate) chunk_basis: Vec<usize>,
    /// Chunk even without filters.
    pub(crate) force_chunked: bool,
    pub(crate) options: &'a DatasetOptions,
    pub(crate) enum_members: Option<&'a [(String, i64)]>,
}

fn chunk_shape(basis: &[usize], element_size: usize) -> Vec<u64> {
    let mut extents = basis.to_vec();
    halve_extents(&mut extents, element_size);
    extents.into_iter().map(|extent| extent as u64).collect()
}

/// Check that elements of `memory` convert to elements of `kind`.
pub(crate) fn check_memory_type(memory: ElementKind, kind: ElementKind) -> Result<(), H5Error> {
    if type_find_conversion(native_type(memory)?, storage_type(kind)?)
        .map_err(H5Error::resource("failed to find a datatype conversion"))?
    {
        Ok(())
    } else {
        Err(H5Error::TypeMismatch { expected: kind })
    }
}

/// Create a dataset of elements of `kind` at `path`, creating missing ancestor groups.
pub(crate) fn create_dataset(
    file: &File,
    path: &str,
    kind: ElementKind,
    new: &NewDataset,
) -> Result<UniqueHid<DatasetRelease>, H5Error> {
    let space = UniqueHid::<DataspaceRelease>::from(
        space_create_simple(&new.dims, &new.max_dims)
            .map_err(H5Error::resource("failed to create dataspace"))?,
    );

    let enum_type = match new.enum_members {
        Some(members) => {
            let enum_type = UniqueHid::<DatatypeRelease>::from(
                type_enum_create(storage_type(kind)?)
                    .map_err(H5Error::resource("failed to create enum datatype"))?,
            );
            for (name, value) in members {
                type_enum_insert(enum_type.hid(), name, *value)
                    .map_err(H5Error::resource(format!("failed to insert enum member {name:?}")))?;
            }
            enum_type
        }
        None => UniqueHid::default(),
    };
    let datatype = if enum_type.is_empty() {
        storage_type(kind)?
    } else {
        enum_type.hid()
    };

    let link_props = UniqueHid::<PropertyListRelease>::from(plist_create(
        PropertyListClass::LinkCreate,
    ));
    plist_set_create_intermediate_group(link_props.hid(), true)
        .map_err(H5Error::resource("failed to configure link props"))?;

    let dataset_props = UniqueHid::<PropertyListRelease>::from(plist_create(
        PropertyListClass::DatasetCreate,
    ));
    if new.force_chunked || new.options.is_filtered() {
        let element_size =
            type_size(datatype).map_err(H5Error::resource("failed to determine element size"))?;
        plist_set_chunk(
            dataset_props.hid(),
            &chunk_shape(&new.chunk_basis, element_size),
        )
        .map_err(H5Error::resource("failed to set chunk size"))?;
    }
    if let Some(factor) = new.options.scaleoffset() {
        let scale_type = if kind.is_float() {
            ScaleType::FloatDScale
        } else {
            ScaleType::Int
        };
        plist_set_scaleoffset(dataset_props.hid(), scale_type, factor)
            .map_err(H5Error::resource("failed to set scaleoffset filter"))?;
    }
    if let Some(level) = new.options.compression() {
        plist_set_shuffle(dataset_props.hid())
            .map_err(H5Error::resource("failed to set shuffle filter"))?;
        plist_set_deflate(dataset_props.hid(), level)
            .map_err(H5Error::resource("failed to set deflate filter"))?;
    }

    let dataset = dataset_create(
        file.handle(),
        path,
        datatype,
        space.hid(),
        link_props.hid(),
        dataset_props.hid(),
    )
    .map_err(H5Error::resource(format!("failed to create dataset {path}")))?;
    Ok(dataset.into())
}

/// Typed read and write access to a dataset of rank `RANK` holding elements of `D`.
///
/// An accessor is either *bound* to an existing dataset, validated against the declared rank, element
/// type, and enumeration members, or *unbound* if nothing existed at its path when it was obtained.
/// [`write`](Dataset::write) and [`stream_writer`](Dataset::stream_writer) bind an unbound accessor.
///
/// Elements are converted between `D` and the element type `T` of memory buffers on reads and writes,
/// so for example a `f32` dataset can be written from `f64` data.
///
/// ```
/// # use h5z::{DatasetOptions, File, Shape};
/// let file = File::in_memory()?;
/// let mut dataset = file.dataset::<f32, 2>("group/values")?;
/// assert!(!dataset.is_bound());
///
/// let data: Vec<f64> = (0..6).map(f64::from).collect();
/// dataset.write(&data, &Shape::new([2, 3]), &DatasetOptions::default())?;
/// assert_eq!(dataset.shape()?, Shape::new([2, 3]));
///
/// let mut read = vec![0i32; 6];
/// dataset.read(&mut read, &Shape::new([2, 3]))?;
/// assert_eq!(read, vec![0, 1, 2, 3, 4, 5]);
/// # Ok::<_, h5z::H5Error>(())
/// ```
#[derive(Debug)]
pub struct Dataset<'f, D: StorageElement, const RANK: usize> {
    file: &'f File,
    path: String,
    enum_members: Option<Vec<(String, i64)>>,
    dataset: UniqueHid<DatasetRelease>,
    _element: PhantomData<D>,
}

impl<'f, D: StorageElement, const RANK: usize> Dataset<'f, D, RANK> {
    pub(crate) fn open(
        file: &'f File,
        path: &str,
        enum_members: Option<Vec<(String, i64)>>,
    ) -> Result<Self, H5Error> {
        let mut dataset = Self {
            file,
            path: path.to_string(),
            enum_members,
            dataset: UniqueHid::default(),
            _element: PhantomData,
        };
        if path_exists(file.handle(), path)? {
            // Dropping `dataset` on a validation failure releases the handle
            dataset.dataset = dataset_open(file.handle(), path)
                .map_err(H5Error::resource(format!("failed to open dataset {path}")))?
                .into();
            check_dataset_rank::<RANK>(dataset.handle())?;
            check_dataset_type(dataset.handle(), D::KIND)?;
            if let Some(members) = &dataset.enum_members {
                validate_dataset_enum(dataset.handle(), storage_type(D::KIND)?, members)?;
            }
        }
        Ok(dataset)
    }

    /// Returns the dataset path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns true if the accessor holds a dataset.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        !self.dataset.is_empty()
    }

    /// Returns the dataset identifier, or `-1` if the accessor is unbound.
    #[must_use]
    pub fn handle(&self) -> Hid {
        self.dataset.hid()
    }

    /// Returns the current shape of the dataset, or zeros if the accessor is unbound.
    ///
    /// # Errors
    /// Returns [`H5Error::RankMismatch`] if the dataset rank has changed, or [`H5Error::Resource`] if the
    /// shape cannot be determined.
    pub fn shape(&self) -> Result<Shape<RANK>, H5Error> {
        if self.is_bound() {
            check_dataset_rank(self.handle())
        } else {
            Ok(Shape::zeros())
        }
    }

    /// Read all elements into `data`, which must hold at least `shape.size()` elements.
    ///
    /// # Errors
    /// Returns [`H5Error::ShapeMismatch`] if `shape` is not the dataset shape or `data` is too short,
    /// or [`H5Error::Resource`] if the elements cannot be read.
    pub fn read<T: NativeElement>(&self, data: &mut [T], shape: &Shape<RANK>) -> Result<(), H5Error> {
        let actual = self.shape()?;
        if actual != *shape {
            return Err(H5Error::ShapeMismatch {
                expected: shape.dims().to_vec(),
                actual: actual.dims().to_vec(),
            });
        }
        let size = shape.size();
        let Some(data) = data.get_mut(..size) else {
            return Err(H5Error::ShapeMismatch {
                expected: vec![size],
                actual: vec![data.len()],
            });
        };
        if !self.is_bound() {
            return Ok(());
        }
        dataset_read(self.handle(), native_type(T::KIND)?, T::mem_buf_mut(data))
            .map_err(H5Error::resource(format!("failed to read from dataset {}", self.path)))
    }

    /// Read all elements into `buffer`, whose shape must be the dataset shape.
    ///
    /// # Errors
    /// See [`Dataset::read`].
    pub fn read_buffer<B: Buffer<RANK>>(&self, buffer: &mut B) -> Result<(), H5Error> {
        let shape = buffer.shape();
        self.read(buffer.data_mut(), &shape)
    }

    /// Reshape `buffer` to the dataset shape and read all elements into it.
    ///
    /// # Errors
    /// Returns [`H5Error::ShapeMismatch`] if `buffer` cannot take the dataset shape, otherwise see
    /// [`Dataset::read`].
    pub fn read_fit<B: Buffer<RANK>>(&self, buffer: &mut B) -> Result<(), H5Error> {
        let shape = self.shape()?;
        buffer.reshape(&shape)?;
        self.read(buffer.data_mut(), &shape)
    }

    /// Write a new dataset of `shape` from `data`, replacing any existing node at the path.
    ///
    /// Missing ancestor groups are created, the accessor is bound to the new dataset, and the file is
    /// flushed.
    ///
    /// The replacement is not atomic: if creating or writing the new dataset fails after the old one
    /// was removed, the path is left without a dataset.
    ///
    /// # Errors
    /// Returns [`H5Error::ShapeMismatch`] if `data` holds fewer than `shape.size()` elements,
    /// [`H5Error::Configuration`] if `options` are invalid for `D`, or [`H5Error::Resource`] if an engine
    /// call fails.
    pub fn write<T: NativeElement>(
        &mut self,
        data: &[T],
        shape: &Shape<RANK>,
        options: &DatasetOptions,
    ) -> Result<(), H5Error> {
        let size = shape.size();
        let Some(data) = data.get(..size) else {
            return Err(H5Error::ShapeMismatch {
                expected: vec![size],
                actual: vec![data.len()],
            });
        };
        options.validate(D::KIND)?;
        check_memory_type(T::KIND, D::KIND)?;
        let file = self.file.handle();

        self.dataset
            .release()
            .map_err(H5Error::resource("failed to close dataset"))?;
        if path_exists(file, &self.path)? {
            log::debug!("unlinking {} before writing", self.path);
            link_delete(file, &self.path)
                .map_err(H5Error::resource(format!("failed to delete {}", self.path)))?;
        }

        let extents = shape.to_extents();
        self.dataset = create_dataset(
            self.file,
            &self.path,
            D::KIND,
            &NewDataset {
                max_dims: extents.iter().copied().map(Some).collect(),
                dims: extents,
                chunk_basis: shape.dims().to_vec(),
                force_chunked: false,
                options,
                enum_members: self.enum_members.as_deref(),
            },
        )?;

        dataset_write(self.handle(), native_type(T::KIND)?, T::mem_buf(data))
            .map_err(H5Error::resource(format!("failed to write to dataset {}", self.path)))?;
        if global_config().flush_after_write() {
            self.file.flush()?;
        }
        Ok(())
    }

    /// Write a new dataset from `buffer`, see [`Dataset::write`].
    ///
    /// # Errors
    /// See [`Dataset::write`].
    pub fn write_buffer<B: Buffer<RANK>>(
        &mut self,
        buffer: &B,
        options: &DatasetOptions,
    ) -> Result<(), H5Error> {
        self.write(buffer.data(), &buffer.shape(), options)
    }

    /// Returns a writer appending records of `record_shape` along the leading axis.
    ///
    /// `RECORD_RANK` must be one less than `RANK`.
    /// If the accessor is unbound, a dataset with a leading extent of zero, an unlimited leading
    /// maximum extent, and chunks of one record is created with `options`, and the accessor is bound
    /// to it.
    /// Otherwise `options` are ignored.
    ///
    /// # Errors
    /// Returns [`H5Error::ShapeMismatch`] if the trailing extents of an existing dataset differ from
    /// `record_shape`, [`H5Error::Configuration`] if its leading axis cannot grow or `options` are
    /// invalid, or [`H5Error::Resource`] if an engine call fails.
    pub fn stream_writer<T: NativeElement, const RECORD_RANK: usize>(
        &mut self,
        record_shape: &Shape<RECORD_RANK>,
        options: &DatasetOptions,
    ) -> Result<StreamWriter<'f, T, RECORD_RANK>, H5Error> {
        const {
            assert!(
                RECORD_RANK + 1 == RANK,
                "record rank must be one less than the dataset rank"
            );
        };
        check_memory_type(T::KIND, D::KIND)?;
        if !self.is_bound() {
            options.validate(D::KIND)?;
            let record_extents = record_shape.to_extents();
            let mut chunk_basis = vec![1];
            chunk_basis.extend_from_slice(record_shape.dims());
            self.dataset = create_dataset(
                self.file,
                &self.path,
                D::KIND,
                &NewDataset {
                    dims: std::iter::once(0).chain(record_extents.iter().copied()).collect(),
                    max_dims: std::iter::once(None)
                        .chain(record_extents.iter().copied().map(Some))
                        .collect(),
                    chunk_basis,
                    force_chunked: true,
                    options,
                    enum_members: self.enum_members.as_deref(),
                },
            )?;
        }
        StreamWriter::new(self.file, &self.path, record_shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EnumMapping;

    #[test]
    fn dataset_unbound() {
        let file = File::in_memory().unwrap();
        let dataset = file.dataset::<i32, 2>("missing/values").unwrap();
        assert!(!dataset.is_bound());
        assert_eq!(dataset.handle(), -1);
        assert_eq!(dataset.shape().unwrap(), Shape::zeros());
        dataset.read::<i32>(&mut [], &Shape::zeros()).unwrap();
        assert!(matches!(
            dataset.read(&mut [0i32; 4], &Shape::new([2, 2])),
            Err(H5Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn dataset_write_read() {
        let file = File::in_memory().unwrap();
        let mut dataset = file.dataset::<i64, 1>("values").unwrap();
        dataset
            .write(&[1i64, 2, 3], &Shape::new([3]), &DatasetOptions::default())
            .unwrap();
        assert!(dataset.is_bound());
        let mut read = vec![0u8; 3];
        dataset.read(&mut read, &Shape::new([3])).unwrap();
        assert_eq!(read, vec![1, 2, 3]);
        assert!(matches!(
            dataset.read(&mut [0i64; 2], &Shape::new([3])),
            Err(H5Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn dataset_write_short_data() {
        let file = File::in_memory().unwrap();
        let mut dataset = file.dataset::<f64, 1>("values").unwrap();
        dataset
            .write(&[1.0f64], &Shape::new([1]), &DatasetOptions::default())
            .unwrap();
        assert!(matches!(
            dataset.write(&[1.0f64], &Shape::new([2]), &DatasetOptions::default()),
            Err(H5Error::ShapeMismatch { .. })
        ));
        assert!(matches!(
            dataset.write(&[String::new()], &Shape::new([1]), &DatasetOptions::default()),
            Err(H5Error::TypeMismatch { .. })
        ));
        // Nothing was replaced
        assert_eq!(dataset.shape().unwrap(), Shape::new([1]));
    }

    #[test]
    fn dataset_validation_errors() {
        let file = File::in_memory().unwrap();
        file.dataset::<i32, 2>("values")
            .unwrap()
            .write(&[0i32; 4], &Shape::new([2, 2]), &DatasetOptions::default())
            .unwrap();
        assert!(matches!(
            file.dataset::<i32, 3>("values"),
            Err(H5Error::RankMismatch {
                expected: 3,
                actual: 2
            })
        ));
        assert!(matches!(
            file.dataset::<String, 2>("values"),
            Err(H5Error::TypeMismatch {
                expected: ElementKind::String
            })
        ));
        let mapping = EnumMapping::try_from([("A", 1i32)]).unwrap();
        assert!(matches!(
            file.dataset_with_enum::<i32, 2>("values", &mapping),
            Err(H5Error::EnumMismatch(_))
        ));
    }

    #[test]
    fn dataset_chunk_shape() {
        assert_eq!(chunk_shape(&[1, 2, 3], 4), vec![1, 2, 3]);
        assert_eq!(chunk_shape(&[0; 9], 4), vec![1; 9]);
        // The size rule holds beyond rank 8
        let chunk = chunk_shape(&[64; 9], 1);
        assert_eq!(chunk.len(), 9);
        assert!(chunk.iter().product::<u64>() < 1024 * 1024);
    }
}
