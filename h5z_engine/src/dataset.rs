//! Datasets.

use std::sync::Arc;

use crate::{
    Datatype, EngineError, Hid,
    chunk::{ChunkStorage, Elements, num_elements},
    conversion::{convert_bytes, convertible},
    datatype::register_datatype,
    dataspace::Dataspace,
    file::{self, FileObject},
    metadata::{self, DatasetMetadata, Layout, NodeMetadata, NodePath},
    plist,
    registry::{self, Object, ObjectKind},
};

/// An open dataset.
#[derive(Clone)]
pub(crate) struct DatasetObject {
    file: Arc<FileObject>,
    node: NodePath,
}

impl DatasetObject {
    fn metadata(&self) -> Result<DatasetMetadata, EngineError> {
        match metadata::load(self.file.store(), &self.node)? {
            Some(NodeMetadata::Dataset(metadata)) => Ok(metadata),
            Some(NodeMetadata::Group) => Err(EngineError::NotADataset(self.node.to_string())),
            None => Err(EngineError::NotFound(self.node.to_string())),
        }
    }

    fn save_metadata(&self, metadata: DatasetMetadata) -> Result<(), EngineError> {
        metadata::save(
            self.file.store(),
            &self.node,
            &NodeMetadata::Dataset(metadata),
        )
    }

    fn chunks<'a>(&'a self, metadata: &'a DatasetMetadata) -> ChunkStorage<'a> {
        ChunkStorage::new(self.file.store(), &self.node, metadata)
    }
}

/// Elements in memory, passed to dataset writes.
#[derive(Copy, Clone, Debug)]
pub enum MemBuf<'a> {
    /// Fixed-size elements in the memory datatype.
    Bytes(&'a [u8]),
    /// Variable-length strings.
    Strings(&'a [String]),
}

/// Elements in memory, filled by dataset reads.
#[derive(Debug)]
pub enum MemBufMut<'a> {
    /// Fixed-size elements in the memory datatype.
    Bytes(&'a mut [u8]),
    /// Variable-length strings.
    Strings(&'a mut [String]),
}

fn validate_layout(
    datatype: &Datatype,
    space: &Dataspace,
    chunk: Option<&[u64]>,
    filters: &[crate::Filter],
) -> Result<Layout, EngineError> {
    if datatype.numeric().is_none() && !datatype.is_variable_string() {
        return Err(EngineError::InvalidArgument(format!(
            "datasets of fixed-length {} elements are not supported",
            datatype.class()
        )));
    }
    for filter in filters {
        filter.validate(datatype)?;
    }
    let Some(chunk_shape) = chunk else {
        let extendible = space
            .dims
            .iter()
            .zip(&space.max_dims)
            .any(|(dim, max_dim)| *max_dim != Some(*dim));
        if extendible {
            return Err(EngineError::InvalidArgument(
                "extendible datasets require a chunked layout".to_string(),
            ));
        }
        if !filters.is_empty() {
            return Err(EngineError::InvalidArgument(
                "filters require a chunked layout".to_string(),
            ));
        }
        return Ok(Layout::Contiguous);
    };
    if chunk_shape.len() != space.dims.len() {
        return Err(EngineError::InvalidArgument(format!(
            "chunk shape {chunk_shape:?} does not match the dataspace rank {}",
            space.dims.len()
        )));
    }
    if chunk_shape
        .iter()
        .zip(&space.max_dims)
        .any(|(extent, max_dim)| max_dim.is_some_and(|max_dim| *extent > max_dim))
    {
        return Err(EngineError::InvalidArgument(format!(
            "chunk shape {chunk_shape:?} exceeds the maximum dimensions {:?}",
            space.max_dims
        )));
    }
    Ok(Layout::Chunked {
        chunk_shape: chunk_shape.to_vec(),
    })
}

/// Create a dataset at `path` with datatype `dtype` and dataspace `space`.
///
/// `lcpl` selects whether missing intermediate groups are created, and `dcpl` the chunk shape and
/// filters. Either may be [`P_DEFAULT`](crate::P_DEFAULT).
///
/// # Errors
/// Returns an [`EngineError`] if an identifier is invalid, the node exists, an ancestor is missing or
/// not a group, or the layout and filters are not supported for the datatype and dataspace.
pub fn dataset_create(
    loc: Hid,
    path: &str,
    dtype: Hid,
    space: Hid,
    lcpl: Hid,
    dcpl: Hid,
) -> Result<Hid, EngineError> {
    let file = registry::file(loc)?;
    let node = NodePath::parse(path)?;
    let datatype = registry::datatype(dtype)?;
    let space = registry::dataspace(space)?;
    let create_intermediate = plist::create_intermediate_group(lcpl)?;
    let properties = plist::dataset_create_properties(dcpl)?;

    let layout = validate_layout(
        &datatype,
        &space,
        properties.chunk.as_deref(),
        &properties.filters,
    )?;
    let dataset_metadata = DatasetMetadata {
        shape: space.dims,
        max_shape: space.max_dims,
        datatype,
        layout,
        filters: properties.filters,
    };
    log::debug!(
        "creating dataset {node} in {}: shape {:?}, layout {:?}, filters {:?}",
        file.name(),
        dataset_metadata.shape,
        dataset_metadata.layout,
        dataset_metadata.filters
    );
    file::create_node(
        &file,
        &node,
        &NodeMetadata::Dataset(dataset_metadata),
        create_intermediate,
    )?;
    Ok(registry::register(Object::Dataset(DatasetObject {
        file,
        node,
    })))
}

/// Open the dataset at `path`.
///
/// # Errors
/// Returns an [`EngineError`] if `loc` is not a file or no dataset exists at `path`.
pub fn dataset_open(loc: Hid, path: &str) -> Result<Hid, EngineError> {
    let dataset = DatasetObject {
        file: registry::file(loc)?,
        node: NodePath::parse(path)?,
    };
    dataset.metadata()?;
    Ok(registry::register(Object::Dataset(dataset)))
}

/// Returns a new dataspace holding the current and maximum extents of a dataset.
///
/// # Errors
/// Returns an [`EngineError`] if `id` is not a dataset.
pub fn dataset_get_space(id: Hid) -> Result<Hid, EngineError> {
    let metadata = registry::dataset(id)?.metadata()?;
    let space = Dataspace::new(metadata.shape, metadata.max_shape)?;
    Ok(registry::register(Object::Dataspace(space)))
}

/// Returns a new datatype which is a copy of the datatype of a dataset.
///
/// # Errors
/// Returns an [`EngineError`] if `id` is not a dataset.
pub fn dataset_get_type(id: Hid) -> Result<Hid, EngineError> {
    let metadata = registry::dataset(id)?.metadata()?;
    Ok(register_datatype(metadata.datatype))
}

/// Returns the chunk shape of a dataset, or [`None`] if it is contiguous.
///
/// # Errors
/// Returns an [`EngineError`] if `id` is not a dataset.
pub fn dataset_get_chunk(id: Hid) -> Result<Option<Vec<u64>>, EngineError> {
    match registry::dataset(id)?.metadata()?.layout {
        Layout::Contiguous => Ok(None),
        Layout::Chunked { chunk_shape } => Ok(Some(chunk_shape)),
    }
}

/// Change the extents of a dataset.
///
/// Elements outside of a reduced extent are discarded.
///
/// # Errors
/// Returns an [`EngineError`] if `id` is not a writable dataset, the rank differs, an extent exceeds its
/// maximum, or the dataset is contiguous.
pub fn dataset_set_extent(id: Hid, dims: &[u64]) -> Result<(), EngineError> {
    let dataset = registry::dataset(id)?;
    dataset.file.check_writable()?;
    let mut metadata = dataset.metadata()?;
    if dims == metadata.shape {
        return Ok(());
    }
    if dims.len() != metadata.shape.len() {
        return Err(EngineError::InvalidArgument(format!(
            "extent {dims:?} does not match the dataset rank {}",
            metadata.shape.len()
        )));
    }
    if metadata.layout == Layout::Contiguous {
        return Err(EngineError::InvalidArgument(format!(
            "the extent of contiguous dataset {} cannot change",
            dataset.node
        )));
    }
    // Validate against the maximum extents
    Dataspace::new(dims.to_vec(), metadata.max_shape.clone())?;

    if dims.iter().zip(&metadata.shape).any(|(new, old)| new < old) {
        dataset.chunks(&metadata).trim(dims)?;
    }
    log::debug!(
        "changing the extent of dataset {} from {:?} to {dims:?}",
        dataset.node,
        metadata.shape
    );
    metadata.shape = dims.to_vec();
    dataset.save_metadata(metadata)
}

/// Read all elements of a dataset, converted to the memory datatype `mem_type`.
///
/// # Errors
/// Returns an [`EngineError`] if an identifier is invalid, the elements cannot be converted, `buf` does
/// not match the memory datatype or the number of elements, or a chunk cannot be retrieved.
pub fn dataset_read(id: Hid, mem_type: Hid, buf: MemBufMut) -> Result<(), EngineError> {
    let dataset = registry::dataset(id)?;
    let mem_datatype = registry::datatype(mem_type)?;
    let metadata = dataset.metadata()?;
    check_conversion(&metadata.datatype, &mem_datatype)?;
    let len = num_elements(&metadata.shape);
    match &buf {
        MemBufMut::Bytes(bytes) => check_len(bytes.len(), len * mem_datatype.size())?,
        MemBufMut::Strings(strings) => check_len(strings.len(), len)?,
    }

    let start = vec![0; metadata.shape.len()];
    let elements = dataset.chunks(&metadata).read_region(&start, &metadata.shape)?;
    match (elements, buf) {
        (Elements::Fixed(bytes), MemBufMut::Bytes(out)) => {
            out.copy_from_slice(&convert_bytes(&bytes, &metadata.datatype, &mem_datatype)?);
            Ok(())
        }
        (Elements::Strings(strings), MemBufMut::Strings(out)) => {
            out.clone_from_slice(&strings);
            Ok(())
        }
        _ => Err(mismatched_buffer()),
    }
}

/// Write all elements of a dataset from the memory datatype `mem_type`.
///
/// # Errors
/// Returns an [`EngineError`] if an identifier is invalid, the dataset is not writable, the elements
/// cannot be converted, `buf` does not match the memory datatype or the number of elements, or a chunk
/// cannot be stored.
pub fn dataset_write(id: Hid, mem_type: Hid, buf: MemBuf) -> Result<(), EngineError> {
    let shape = registry::dataset(id)?.metadata()?.shape;
    dataset_write_hyperslab(id, mem_type, &vec![0; shape.len()], &shape, buf)
}

/// Write the elements of the region `start..start + count` of a dataset from the memory datatype `mem_type`.
///
/// # Errors
/// Returns an [`EngineError`] if an identifier is invalid, the dataset is not writable, the region is out
/// of bounds, the elements cannot be converted, `buf` does not match the memory datatype or the number
/// of elements, or a chunk cannot be stored.
pub fn dataset_write_hyperslab(
    id: Hid,
    mem_type: Hid,
    start: &[u64],
    count: &[u64],
    buf: MemBuf,
) -> Result<(), EngineError> {
    let dataset = registry::dataset(id)?;
    dataset.file.check_writable()?;
    let mem_datatype = registry::datatype(mem_type)?;
    let metadata = dataset.metadata()?;
    check_conversion(&mem_datatype, &metadata.datatype)?;

    let rank = metadata.shape.len();
    if start.len() != rank
        || count.len() != rank
        || itertools::izip!(start, count, &metadata.shape).any(|(start, count, extent)| {
            start.checked_add(*count).is_none_or(|end| end > *extent)
        })
    {
        return Err(EngineError::InvalidArgument(format!(
            "region starting at {start:?} with extents {count:?} is outside of dataset {} with shape {:?}",
            dataset.node, metadata.shape
        )));
    }

    let len = num_elements(count);
    let elements = match buf {
        MemBuf::Bytes(bytes) if !mem_datatype.is_variable_string() => {
            check_len(bytes.len(), len * mem_datatype.size())?;
            Elements::Fixed(convert_bytes(bytes, &mem_datatype, &metadata.datatype)?)
        }
        MemBuf::Strings(strings) if mem_datatype.is_variable_string() => {
            check_len(strings.len(), len)?;
            Elements::Strings(strings.to_vec())
        }
        _ => return Err(mismatched_buffer()),
    };
    log::trace!(
        "writing {len} elements to dataset {} at {start:?}",
        dataset.node
    );
    dataset.chunks(&metadata).write_region(start, count, &elements)
}

/// Close a dataset.
///
/// # Errors
/// Returns an [`EngineError`] if `id` is not a dataset.
pub fn dataset_close(id: Hid) -> Result<(), EngineError> {
    registry::unregister(id, ObjectKind::Dataset).map(|_| ())
}

fn check_conversion(src: &Datatype, dst: &Datatype) -> Result<(), EngineError> {
    if convertible(src, dst) {
        Ok(())
    } else {
        Err(EngineError::NoConversion {
            from: src.class(),
            to: dst.class(),
        })
    }
}

fn check_len(len: usize, expected: usize) -> Result<(), EngineError> {
    if len == expected {
        Ok(())
    } else {
        Err(EngineError::InvalidArgument(format!(
            "memory buffer holds {len} units, expected {expected}"
        )))
    }
}

fn mismatched_buffer() -> EngineError {
    EngineError::InvalidArgument("memory buffer does not match the memory datatype".to_string())
}
