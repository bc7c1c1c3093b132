use crate::{ElementKind, H5Error};

/// The highest deflate compression level.
pub const MAX_COMPRESSION_LEVEL: u32 = 9;

/// Storage options for newly created datasets.
///
/// Requesting compression or scale-offset quantisation stores the dataset in chunks of a shape chosen by
/// [`determine_chunk_size`](crate::determine_chunk_size).
/// Compression applies the shuffle filter followed by deflate.
///
/// ```
/// # use h5z::DatasetOptions;
/// let options = DatasetOptions::new().with_compression(6).with_scaleoffset(3);
/// assert_eq!(options.compression(), Some(6));
/// assert_eq!(options.scaleoffset(), Some(3));
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DatasetOptions {
    compression: Option<u32>,
    scaleoffset: Option<i32>,
}

impl DatasetOptions {
    /// Create options without filters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compress with deflate at `level` (0 to 9).
    #[must_use]
    pub fn with_compression(mut self, level: u32) -> Self {
        self.compression = Some(level);
        self
    }

    /// Quantise with scale-offset.
    ///
    /// For floating point elements `factor` is the number of decimal digits kept after the point.
    /// For integers it is the number of bits kept, or automatic if not positive.
    #[must_use]
    pub fn with_scaleoffset(mut self, factor: i32) -> Self {
        self.scaleoffset = Some(factor);
        self
    }

    /// Returns the deflate level.
    #[must_use]
    pub fn compression(&self) -> Option<u32> {
        self.compression
    }

    /// Returns the scale-offset factor.
    #[must_use]
    pub fn scaleoffset(&self) -> Option<i32> {
        self.scaleoffset
    }

    /// Returns true if any filter is requested.
    #[must_use]
    pub fn is_filtered(&self) -> bool {
        self.compression.is_some() || self.scaleoffset.is_some()
    }

    /// Check the options are applicable to elements of `kind`.
    pub(crate) fn validate(&self, kind: ElementKind) -> Result<(), H5Error> {
        if let Some(level) = self.compression {
            if level > MAX_COMPRESSION_LEVEL {
                return Err(H5Error::Configuration(format!(
                    "compression level {level} is not in 0..={MAX_COMPRESSION_LEVEL}"
                )));
            }
        }
        if self.scaleoffset.is_some() && !kind.is_float() && !kind.is_integer() {
            return Err(H5Error::Configuration(format!(
                "cannot apply scaleoffset to {kind} elements"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_options_validate() {
        assert!(!DatasetOptions::new().is_filtered());
        assert!(DatasetOptions::new().with_compression(9).is_filtered());
        assert!(
            DatasetOptions::new()
                .with_compression(9)
                .validate(ElementKind::Float64)
                .is_ok()
        );
        assert!(matches!(
            DatasetOptions::new()
                .with_compression(10)
                .validate(ElementKind::Float64),
            Err(H5Error::Configuration(_))
        ));
        assert!(
            DatasetOptions::new()
                .with_scaleoffset(0)
                .validate(ElementKind::Int32)
                .is_ok()
        );
        assert!(matches!(
            DatasetOptions::new()
                .with_scaleoffset(2)
                .validate(ElementKind::String),
            Err(H5Error::Configuration(_))
        ));
    }
}
