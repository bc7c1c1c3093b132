//! A hierarchical, chunked array storage engine addressed through integer resource identifiers.
//!
//! Every object the engine hands out (files, datasets, dataspaces, datatypes, and property lists) is
//! registered in a process-wide object table and referred to by a [`Hid`].
//! Objects stay alive until the matching `*_close` function is called with their identifier.
//!
//! A file is a directory (or an in-memory store).
//! Groups and datasets are nodes of the hierarchy, each described by a `.h5z.json` metadata document at
//! its prefix.
//! Dataset elements are stored in chunks below the dataset prefix (`<dataset>/c/<i>/<j>/...`), passed
//! through the dataset's filter pipeline:
//!  - `scaleoffset`: lossy quantisation with minimum-bit packing,
//!  - `shuffle`: byte transposition by element size, and
//!  - `deflate`: zlib compression.
//!
//! ```
//! # use h5z_engine::*;
//! # fn main() -> Result<(), EngineError> {
//! let file = file_create_in_memory()?;
//! let space = space_create_simple(&[2, 3], &[Some(2), Some(3)])?;
//! let dataset = dataset_create(file, "group/values", STD_I32LE, space, P_DEFAULT, P_DEFAULT)?;
//! let values: Vec<i32> = (0..6).collect();
//! dataset_write(dataset, NATIVE_INT32, MemBuf::Bytes(bytemuck::cast_slice(&values)))?;
//! let mut read = vec![0.0f64; 6];
//! dataset_read(dataset, NATIVE_DOUBLE, MemBufMut::Bytes(bytemuck::cast_slice_mut(&mut read)))?;
//! assert_eq!(read, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
//! # dataset_close(dataset)?;
//! # space_close(space)?;
//! # file_close(file)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Licence
//! `h5z_engine` is licensed under either of
//! - the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> or
//! - the MIT license <http://opensource.org/licenses/MIT>, at your option.

mod chunk;
mod conversion;
mod dataset;
mod dataspace;
mod datatype;
mod error;
mod file;
mod filter;
mod metadata;
mod plist;
mod registry;

pub use dataset::{
    MemBuf, MemBufMut, dataset_close, dataset_create, dataset_get_chunk, dataset_get_space,
    dataset_get_type, dataset_open, dataset_read, dataset_set_extent, dataset_write,
    dataset_write_hyperslab,
};
pub use dataspace::{space_close, space_create_simple, space_dims, space_max_dims, space_ndims};
pub use datatype::{
    ByteOrder, C_S1, CharacterSet, Datatype, EnumMember, IEEE_F32LE, IEEE_F64LE, NATIVE_DOUBLE,
    NATIVE_FLOAT, NATIVE_INT8, NATIVE_INT16, NATIVE_INT32, NATIVE_INT64, NATIVE_UINT8,
    NATIVE_UINT16, NATIVE_UINT32, NATIVE_UINT64, NumericType, STD_I8LE, STD_I16LE, STD_I32LE,
    STD_I64LE, STD_U8LE, STD_U16LE, STD_U32LE, STD_U64LE, StringSize, TypeClass, type_class,
    type_close, type_copy, type_enum_create, type_enum_insert, type_enum_member,
    type_enum_nmembers, type_equal, type_find_conversion, type_lock, type_set_cset,
    type_set_variable_size, type_size, type_super,
};
pub use error::EngineError;
pub use file::{
    AccessMode, CreateMode, file_close, file_create, file_create_in_memory, file_flush, file_open,
    file_size, group_create, link_delete, link_exists,
};
pub use filter::{Filter, ScaleType};
pub use metadata::{DatasetMetadata, Layout, NodeMetadata};
pub use plist::{
    PropertyListClass, plist_close, plist_create, plist_set_chunk,
    plist_set_create_intermediate_group, plist_set_deflate, plist_set_scaleoffset,
    plist_set_shuffle,
};
pub use registry::{ObjectKind, is_valid, object_count};

/// An engine resource identifier.
///
/// Negative identifiers never refer to an object.
pub type Hid = i64;

/// The identifier selecting default properties wherever a property list is accepted.
pub const P_DEFAULT: Hid = 0;
