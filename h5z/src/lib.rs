//! `h5z` provides typed, rank-checked access to datasets in hierarchical chunked array files.
//!
//! A [`File`] is opened with a mode string (`r`, `r+`, `w`, or `w-`).
//! [`File::dataset`] returns a [`Dataset`] accessor declaring the element type and rank of the dataset
//! at a path.
//! The declaration is checked against the file when the accessor is obtained, and whole arrays are
//! read and written through it:
//!  - [`Dataset::read`], [`Dataset::read_buffer`], and [`Dataset::read_fit`] read all elements, with
//!    conversion to the element type of the memory buffer,
//!  - [`Dataset::write`] and [`Dataset::write_buffer`] replace the dataset with a new one, optionally
//!    chunked and compressed per [`DatasetOptions`], and
//!  - [`Dataset::stream_writer`] appends fixed-shape records along a growing leading axis.
//!
//! Enumeration datasets are accessed with [`File::dataset_with_enum`] and an [`EnumMapping`], which is
//! validated against the members stored in the file.
//!
//! Storage is provided by the [`h5z_engine`] crate, whose identifiers are owned by [`UniqueHid`]
//! handles.
//!
//! ## Example
//! ```
//! # use h5z::{DatasetOptions, File, Shape};
//! let dir = tempfile::TempDir::new()?;
//! let path = dir.path().join("example.h5z");
//! {
//!     let file = File::open(&path, "w")?;
//!     let mut dataset = file.dataset::<f64, 2>("group/matrix")?;
//!     let data: Vec<f64> = (0..12).map(f64::from).collect();
//!     dataset.write(&data, &Shape::new([3, 4]), &DatasetOptions::new().with_compression(6))?;
//!
//!     let mut stream = file
//!         .dataset::<u32, 2>("group/stream")?
//!         .stream_writer::<u32, 1>(&Shape::new([2]), &DatasetOptions::default())?;
//!     stream.write(&[1, 2])?;
//!     stream.write(&[3, 4])?;
//! }
//!
//! let file = File::open(&path, "r")?;
//! let mut matrix = Vec::<[f32; 4]>::new();
//! file.dataset::<f64, 2>("group/matrix")?.read_fit(&mut matrix)?;
//! assert_eq!(matrix[2], [8.0, 9.0, 10.0, 11.0]);
//!
//! let stream = file.dataset::<u32, 2>("group/stream")?;
//! assert_eq!(stream.shape()?, Shape::new([2, 2]));
//! # Ok::<_, Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Crate Features
//! #### Default
//!  - `ndarray`: implement [`Buffer`] for [`ndarray`] arrays of rank 1 to 4.
//!
//! ## Licence
//! `h5z` is licensed under either of
//! - the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> or
//! - the MIT license <http://opensource.org/licenses/MIT>, at your option.

mod buffer;
mod chunking;
pub mod config;
mod dataset;
mod enums;
mod error;
mod file;
pub mod hid;
mod options;
mod path;
mod shape;
mod stream_writer;
mod types;

pub use buffer::Buffer;
pub use chunking::determine_chunk_size;
pub use config::{global_config, global_config_mut};
pub use dataset::Dataset;
pub use enums::{EnumMapping, EnumMappingError};
pub use error::H5Error;
pub use file::{File, FileMode};
pub use h5z_engine::Hid;
pub use hid::UniqueHid;
pub use options::{DatasetOptions, MAX_COMPRESSION_LEVEL};
pub use path::path_exists;
pub use shape::Shape;
pub use stream_writer::StreamWriter;
pub use types::{
    ElementKind, EnumValue, NativeElement, StorageElement, native_type, storage_type, string_type,
};

pub use h5z_engine;
