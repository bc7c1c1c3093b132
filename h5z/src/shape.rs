use std::{
    fmt,
    ops::{Index, IndexMut},
};

/// The extents of a dataset of rank `RANK`.
///
/// The rank must be positive; a zero rank fails to compile.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Shape<const RANK: usize> {
    dims: [usize; RANK],
}

impl<const RANK: usize> Shape<RANK> {
    /// Create a shape from its extents.
    #[must_use]
    pub const fn new(dims: [usize; RANK]) -> Self {
        const { assert!(RANK > 0, "rank must be positive") };
        Self { dims }
    }

    /// Create a shape with all extents zero.
    #[must_use]
    pub const fn zeros() -> Self {
        Self::new([0; RANK])
    }

    /// Returns the extents.
    #[must_use]
    pub const fn dims(&self) -> &[usize; RANK] {
        &self.dims
    }

    pub(crate) fn dims_mut(&mut self) -> &mut [usize; RANK] {
        &mut self.dims
    }

    /// Returns the total number of elements.
    #[must_use]
    pub fn size(&self) -> usize {
        self.dims.iter().product()
    }

    pub(crate) fn to_extents(self) -> Vec<u64> {
        self.dims.iter().map(|&dim| dim as u64).collect()
    }

    /// Returns [`None`] if `extents` has another rank or an extent does not fit in [`usize`].
    pub(crate) fn from_extents(extents: &[u64]) -> Option<Self> {
        if extents.len() != RANK {
            return None;
        }
        let mut dims = [0; RANK];
        for (dim, extent) in dims.iter_mut().zip(extents) {
            *dim = usize::try_from(*extent).ok()?;
        }
        Some(Self::new(dims))
    }
}

impl<const RANK: usize> Default for Shape<RANK> {
    fn default() -> Self {
        Self::zeros()
    }
}

impl<const RANK: usize> From<[usize; RANK]> for Shape<RANK> {
    fn from(dims: [usize; RANK]) -> Self {
        Self::new(dims)
    }
}

impl<const RANK: usize> Index<usize> for Shape<RANK> {
    type Output = usize;

    fn index(&self, axis: usize) -> &usize {
        &self.dims[axis]
    }
}

impl<const RANK: usize> IndexMut<usize> for Shape<RANK> {
    fn index_mut(&mut self, axis: usize) -> &mut usize {
        &mut self.dims[axis]
    }
}

impl<const RANK: usize> fmt::Display for Shape<RANK> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (axis, dim) in self.dims.iter().enumerate() {
            if axis > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{dim}")?;
        }
        write!(f, "}}")
    }
}
