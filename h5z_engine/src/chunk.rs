//! Chunked element storage.

use h5z_storage::{
    Bytes, ReadableStorageTraits, ReadableWritableListableStorage, WritableStorageTraits,
};
use itertools::Itertools;

use crate::{Datatype, EngineError, metadata::DatasetMetadata, metadata::NodePath};

/// The elements of an array region in a file datatype.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Elements {
    /// Fixed-size elements, laid out contiguously.
    Fixed(Vec<u8>),
    /// Variable-length strings.
    Strings(Vec<String>),
}

impl Elements {
    /// `len` fill elements: zero bytes, or empty strings.
    pub(crate) fn fill(datatype: &Datatype, len: usize) -> Self {
        if datatype.is_variable_string() {
            Self::Strings(vec![String::new(); len])
        } else {
            Self::Fixed(vec![0; len * datatype.size()])
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
pub(crate) fn to_usize(value: u64) -> usize {
    value as usize
}

/// The number of elements of an array of extents `shape`.
pub(crate) fn num_elements(shape: &[u64]) -> usize {
    shape.iter().map(|extent| to_usize(*extent)).product()
}

fn linear_index(shape: &[u64], position: impl Iterator<Item = u64>) -> usize {
    shape
        .iter()
        .zip(position)
        .fold(0, |index, (extent, coordinate)| {
            index * to_usize(*extent) + to_usize(coordinate)
        })
}

/// Copy the box of extents `count` at `src_start` of the row-major array `src` into `dst` at `dst_start`.
///
/// Each element occupies `element_len` consecutive entries of the slices.
#[allow(clippy::too_many_arguments)]
fn copy_box<T: Clone>(
    src: &[T],
    src_shape: &[u64],
    src_start: &[u64],
    dst: &mut [T],
    dst_shape: &[u64],
    dst_start: &[u64],
    count: &[u64],
    element_len: usize,
) {
    let Some((&run, outer)) = count.split_last() else {
        return;
    };
    if count.contains(&0) {
        return;
    }
    let run = to_usize(run) * element_len;
    let mut index = vec![0u64; outer.len()];
    loop {
        let src_offset = linear_index(
            src_shape,
            src_start
                .iter()
                .zip(index.iter().chain(std::iter::once(&0)))
                .map(|(start, i)| start + i),
        ) * element_len;
        let dst_offset = linear_index(
            dst_shape,
            dst_start
                .iter()
                .zip(index.iter().chain(std::iter::once(&0)))
                .map(|(start, i)| start + i),
        ) * element_len;
        dst[dst_offset..dst_offset + run].clone_from_slice(&src[src_offset..src_offset + run]);

        // Advance the outer index, last axis fastest
        let mut axis = outer.len();
        loop {
            if axis == 0 {
                return;
            }
            axis -= 1;
            index[axis] += 1;
            if index[axis] < outer[axis] {
                break;
            }
            index[axis] = 0;
        }
    }
}

/// Copy a box between two regions of elements of `datatype`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn copy_elements(
    datatype: &Datatype,
    src: &Elements,
    src_shape: &[u64],
    src_start: &[u64],
    dst: &mut Elements,
    dst_shape: &[u64],
    dst_start: &[u64],
    count: &[u64],
) -> Result<(), EngineError> {
    match (src, dst) {
        (Elements::Fixed(src), Elements::Fixed(dst)) => {
            copy_box(
                src,
                src_shape,
                src_start,
                dst,
                dst_shape,
                dst_start,
                count,
                datatype.size(),
            );
            Ok(())
        }
        (Elements::Strings(src), Elements::Strings(dst)) => {
            copy_box(src, src_shape, src_start, dst, dst_shape, dst_start, count, 1);
            Ok(())
        }
        _ => Err(EngineError::InvalidArgument(
            "cannot copy between fixed-size and variable-length elements".to_string(),
        )),
    }
}

/// Encode variable-length strings: a `u32` count followed by a `u32` length and the bytes of each string.
pub(crate) fn encode_strings(strings: &[String]) -> Result<Vec<u8>, EngineError> {
    let too_long = |_| EngineError::InvalidArgument("string is too long to be stored".to_string());
    let mut bytes = Vec::with_capacity(
        4 + strings.iter().map(|string| 4 + string.len()).sum::<usize>(),
    );
    bytes.extend_from_slice(&u32::try_from(strings.len()).map_err(too_long)?.to_le_bytes());
    for string in strings {
        bytes.extend_from_slice(&u32::try_from(string.len()).map_err(too_long)?.to_le_bytes());
        bytes.extend_from_slice(string.as_bytes());
    }
    Ok(bytes)
}

/// Decode strings encoded with [`encode_strings`].
pub(crate) fn decode_strings(bytes: &[u8]) -> Result<Vec<String>, String> {
    fn take<'a>(bytes: &mut &'a [u8], len: usize) -> Result<&'a [u8], String> {
        if bytes.len() < len {
            return Err("string data is truncated".to_string());
        }
        let (head, tail) = bytes.split_at(len);
        *bytes = tail;
        Ok(head)
    }
    fn take_u32(bytes: &mut &[u8]) -> Result<usize, String> {
        let head = take(bytes, 4)?;
        let value = u32::from_le_bytes([head[0], head[1], head[2], head[3]]);
        usize::try_from(value).map_err(|err| err.to_string())
    }

    let mut bytes = bytes;
    let count = take_u32(&mut bytes)?;
    let mut strings = Vec::with_capacity(count.min(bytes.len() / 4));
    for _ in 0..count {
        let len = take_u32(&mut bytes)?;
        let string = take(&mut bytes, len)?;
        strings.push(String::from_utf8(string.to_vec()).map_err(|err| err.to_string())?);
    }
    Ok(strings)
}

/// The chunks of one dataset.
pub(crate) struct ChunkStorage<'a> {
    store: &'a ReadableWritableListableStorage,
    node: &'a NodePath,
    metadata: &'a DatasetMetadata,
    chunk_shape: Vec<u64>,
}

impl<'a> ChunkStorage<'a> {
    pub(crate) fn new(
        store: &'a ReadableWritableListableStorage,
        node: &'a NodePath,
        metadata: &'a DatasetMetadata,
    ) -> Self {
        Self {
            store,
            node,
            metadata,
            chunk_shape: metadata.chunk_shape(),
        }
    }

    fn chunk_len(&self) -> usize {
        num_elements(&self.chunk_shape)
    }

    fn chunk_start(&self, chunk_indices: &[u64]) -> Vec<u64> {
        chunk_indices
            .iter()
            .zip(&self.chunk_shape)
            .map(|(index, extent)| index * extent)
            .collect()
    }

    /// The indices of the chunks intersecting the region `start..start + count`.
    pub(crate) fn chunks_intersecting(&self, start: &[u64], count: &[u64]) -> Vec<Vec<u64>> {
        if count.contains(&0) {
            return vec![];
        }
        start
            .iter()
            .zip(count)
            .zip(&self.chunk_shape)
            .map(|((start, count), extent)| (start / extent)..=((start + count - 1) / extent))
            .multi_cartesian_product()
            .collect()
    }

    /// Retrieve the elements of a chunk, or fill elements if it has not been stored.
    pub(crate) fn retrieve_chunk(&self, chunk_indices: &[u64]) -> Result<Elements, EngineError> {
        let key = self.node.chunk_key(chunk_indices)?;
        let datatype = &self.metadata.datatype;
        let Some(encoded) = self.store.get(&key)? else {
            log::trace!("chunk {key} is not stored, using the fill value");
            return Ok(Elements::fill(datatype, self.chunk_len()));
        };
        log::trace!("decoding chunk {key} ({} bytes)", encoded.len());

        let mut bytes = encoded.to_vec();
        for filter in self.metadata.filters.iter().rev() {
            bytes = filter.decode(&bytes, datatype)?;
        }
        let invalid = |message: String| EngineError::InvalidMetadata {
            key: key.to_string(),
            message,
        };
        let elements = if datatype.is_variable_string() {
            Elements::Strings(decode_strings(&bytes).map_err(invalid)?)
        } else {
            Elements::Fixed(bytes)
        };
        let len = match &elements {
            Elements::Fixed(bytes) => bytes.len() / datatype.size().max(1),
            Elements::Strings(strings) => strings.len(),
        };
        if len == self.chunk_len() {
            Ok(elements)
        } else {
            Err(invalid(format!(
                "chunk holds {len} elements, expected {}",
                self.chunk_len()
            )))
        }
    }

    /// Encode and store a whole chunk.
    pub(crate) fn store_chunk(
        &self,
        chunk_indices: &[u64],
        elements: &Elements,
    ) -> Result<(), EngineError> {
        let key = self.node.chunk_key(chunk_indices)?;
        let datatype = &self.metadata.datatype;
        let mut bytes = match elements {
            Elements::Fixed(bytes) => bytes.clone(),
            Elements::Strings(strings) => encode_strings(strings)?,
        };
        for filter in &self.metadata.filters {
            bytes = filter.encode(&bytes, datatype)?;
        }
        log::trace!("storing chunk {key} ({} bytes)", bytes.len());
        self.store.set(&key, Bytes::from(bytes))?;
        Ok(())
    }

    /// Erase a chunk, reverting it to the fill value.
    pub(crate) fn erase_chunk(&self, chunk_indices: &[u64]) -> Result<(), EngineError> {
        let key = self.node.chunk_key(chunk_indices)?;
        log::trace!("erasing chunk {key}");
        self.store.erase(&key)?;
        Ok(())
    }

    /// Read the region `start..start + count`.
    pub(crate) fn read_region(&self, start: &[u64], count: &[u64]) -> Result<Elements, EngineError> {
        let datatype = &self.metadata.datatype;
        let mut region = Elements::fill(datatype, num_elements(count));
        for chunk_indices in self.chunks_intersecting(start, count) {
            let chunk_start = self.chunk_start(&chunk_indices);
            let (overlap_start, overlap_count) = overlap(start, count, &chunk_start, &self.chunk_shape);
            let chunk = self.retrieve_chunk(&chunk_indices)?;
            copy_elements(
                datatype,
                &chunk,
                &self.chunk_shape,
                &subtract(&overlap_start, &chunk_start),
                &mut region,
                count,
                &subtract(&overlap_start, start),
                &overlap_count,
            )?;
        }
        Ok(region)
    }

    /// Write `elements` to the region `start..start + count`.
    pub(crate) fn write_region(
        &self,
        start: &[u64],
        count: &[u64],
        elements: &Elements,
    ) -> Result<(), EngineError> {
        let datatype = &self.metadata.datatype;
        for chunk_indices in self.chunks_intersecting(start, count) {
            let chunk_start = self.chunk_start(&chunk_indices);
            let (overlap_start, overlap_count) = overlap(start, count, &chunk_start, &self.chunk_shape);
            let mut chunk = if overlap_start == chunk_start && overlap_count == self.chunk_shape {
                Elements::fill(datatype, self.chunk_len())
            } else {
                self.retrieve_chunk(&chunk_indices)?
            };
            copy_elements(
                datatype,
                elements,
                count,
                &subtract(&overlap_start, start),
                &mut chunk,
                &self.chunk_shape,
                &subtract(&overlap_start, &chunk_start),
                &overlap_count,
            )?;
            self.store_chunk(&chunk_indices, &chunk)?;
        }
        Ok(())
    }

    /// Discard the elements outside of `shape`, erasing chunks entirely outside of it.
    pub(crate) fn trim(&self, shape: &[u64]) -> Result<(), EngineError> {
        let datatype = &self.metadata.datatype;
        let zeros = vec![0; shape.len()];
        for chunk_indices in self.chunks_intersecting(&zeros, &self.metadata.shape) {
            let chunk_start = self.chunk_start(&chunk_indices);
            let kept: Vec<u64> = chunk_start
                .iter()
                .zip(&self.chunk_shape)
                .zip(shape)
                .map(|((start, extent), limit)| (*extent).min(limit.saturating_sub(*start)))
                .collect();
            if kept == self.chunk_shape {
                continue;
            }
            if kept.contains(&0) {
                self.erase_chunk(&chunk_indices)?;
            } else {
                let chunk = self.retrieve_chunk(&chunk_indices)?;
                let mut trimmed = Elements::fill(datatype, self.chunk_len());
                copy_elements(
                    datatype,
                    &chunk,
                    &self.chunk_shape,
                    &zeros,
                    &mut trimmed,
                    &self.chunk_shape,
                    &zeros,
                    &kept,
                )?;
                self.store_chunk(&chunk_indices, &trimmed)?;
            }
        }
        Ok(())
    }
}

/// The intersection of the region `start..start + count` with a chunk.
fn overlap(
    start: &[u64],
    count: &[u64],
    chunk_start: &[u64],
    chunk_shape: &[u64],
) -> (Vec<u64>, Vec<u64>) {
    itertools::izip!(start, count, chunk_start, chunk_shape)
        .map(|(start, count, chunk_start, chunk_extent)| {
            let begin = (*start).max(*chunk_start);
            let end = (start + count).min(chunk_start + chunk_extent);
            (begin, end - begin)
        })
        .unzip()
}

fn subtract(a: &[u64], b: &[u64]) -> Vec<u64> {
    a.iter().zip(b).map(|(a, b)| a - b).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_box_bytes() {
        // 3x4 source, copy the 2x2 box at (1, 1) into a 2x3 destination at (0, 1)
        let src: Vec<u8> = (0..12).collect();
        let mut dst = vec![0u8; 6];
        copy_box(&src, &[3, 4], &[1, 1], &mut dst, &[2, 3], &[0, 1], &[2, 2], 1);
        assert_eq!(dst, vec![0, 5, 6, 0, 9, 10]);

        // Two byte elements
        let src: Vec<u8> = (0..8).collect();
        let mut dst = vec![0u8; 4];
        copy_box(&src, &[4], &[2], &mut dst, &[2], &[0], &[2], 2);
        assert_eq!(dst, vec![4, 5, 6, 7]);
    }

    #[test]
    fn copy_box_strings() {
        let src: Vec<String> = ["a", "b", "c", "d"].map(String::from).to_vec();
        let mut dst = vec![String::new(); 4];
        copy_box(&src, &[2, 2], &[0, 1], &mut dst, &[2, 2], &[0, 0], &[2, 1], 1);
        assert_eq!(dst, ["b", "", "d", ""].map(String::from).to_vec());
    }

    #[test]
    fn strings_encoding() {
        let strings: Vec<String> = ["", "abc", "ünï"].map(String::from).to_vec();
        let bytes = encode_strings(&strings).unwrap();
        assert_eq!(&bytes[..8], &[3, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(decode_strings(&bytes).unwrap(), strings);
        assert!(decode_strings(&bytes[..bytes.len() - 1]).is_err());
    }
}
