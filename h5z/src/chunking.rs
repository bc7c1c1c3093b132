use crate::Shape;

const KIB: usize = 1024;
const MIB: usize = 1024 * 1024;
const MIN_SIZE: usize = 8 * KIB;
const BASE_SIZE: usize = 24 * KIB;
const MAX_SIZE: usize = MIB;

/// Choose a chunk shape for a dataset of `shape` with elements of `element_size` bytes.
///
/// The byte threshold is 24 KiB scaled by a power of two per order of magnitude of the dataset size
/// in MiB, halving below 1 MiB and doubling above it, and is clamped to `8 KiB..=1 MiB`.
/// Axes are halved in turn, rounding up, until a chunk is smaller than the threshold.
/// Every extent of the result is at least one and at most the corresponding extent of `shape` (or one
/// for a zero extent).
#[must_use]
pub fn determine_chunk_size<const RANK: usize>(
    shape: &Shape<RANK>,
    element_size: usize,
) -> Shape<RANK> {
    let mut chunk = *shape;
    halve_extents(chunk.dims_mut(), element_size);
    chunk
}

/// The chunk size threshold in bytes for a dataset of `data_size` bytes.
fn threshold(data_size: usize) -> usize {
    #[allow(clippy::cast_precision_loss)]
    let magnitude = (data_size as f64 / MIB as f64).log10().trunc();
    // An empty dataset has a magnitude of -inf
    if !magnitude.is_finite() {
        return MIN_SIZE;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let shift = magnitude.abs().min(f64::from(usize::BITS)) as u32;
    let scaled = if magnitude >= 0.0 {
        BASE_SIZE.checked_shl(shift).unwrap_or(MAX_SIZE)
    } else {
        BASE_SIZE.checked_shr(shift).unwrap_or(0)
    };
    scaled.clamp(MIN_SIZE, MAX_SIZE)
}

fn chunk_bytes(extents: &[usize], element_size: usize) -> usize {
    extents
        .iter()
        .fold(element_size, |size, &extent| size.saturating_mul(extent))
}

/// Apply the chunk size heuristic in place to extents of any rank.
pub(crate) fn halve_extents(extents: &mut [usize], element_size: usize) {
    let limit = threshold(chunk_bytes(extents, element_size));

    for extent in extents.iter_mut() {
        *extent = (*extent).max(1);
    }
    let mut axis = 0;
    while chunk_bytes(extents, element_size) >= limit && extents.iter().any(|&extent| extent > 1) {
        extents[axis] = extents[axis].div_ceil(2);
        axis = (axis + 1) % extents.len();
    }
}
