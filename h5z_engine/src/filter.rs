//! Chunk filters.

mod deflate;
mod scaleoffset;
mod shuffle;

use serde::{Deserialize, Serialize};

use crate::{Datatype, EngineError, TypeClass};

use deflate::DeflateFilter;
use scaleoffset::ScaleOffsetFilter;
use shuffle::ShuffleFilter;

/// The quantisation applied by the scale-offset filter.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleType {
    /// Floating point values are rounded to `10^-factor` (D-scaling).
    FloatDScale,
    /// Integer values are stored with `factor` bits, or the minimum number of bits if `factor <= 0`.
    Int,
}

/// A filter applied to the bytes of each chunk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "id", rename_all = "snake_case")]
pub enum Filter {
    /// Lossy quantisation of numeric elements relative to the chunk minimum.
    ScaleOffset {
        /// The quantisation kind.
        scale_type: ScaleType,
        /// The quantisation factor.
        factor: i32,
    },
    /// Byte transposition by element size.
    Shuffle,
    /// zlib compression.
    Deflate {
        /// The compression level (0-9).
        level: u32,
    },
}

impl Filter {
    /// The name of the filter.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ScaleOffset { .. } => "scaleoffset",
            Self::Shuffle => "shuffle",
            Self::Deflate { .. } => "deflate",
        }
    }

    /// Check that the filter supports elements of `datatype`.
    pub(crate) fn validate(&self, datatype: &Datatype) -> Result<(), EngineError> {
        let Self::ScaleOffset { scale_type, .. } = self else {
            return Ok(());
        };
        let supported = match (scale_type, datatype.class()) {
            (ScaleType::FloatDScale, TypeClass::Float) => true,
            (ScaleType::Int, TypeClass::Integer | TypeClass::Enum) => true,
            _ => false,
        };
        if supported && datatype.numeric().is_some() {
            Ok(())
        } else {
            Err(EngineError::InvalidArgument(format!(
                "the {} filter with {scale_type:?} scaling does not support {} elements",
                self.name(),
                datatype.class()
            )))
        }
    }

    fn error(&self, message: impl ToString) -> EngineError {
        EngineError::Filter {
            filter: self.name(),
            message: message.to_string(),
        }
    }

    pub(crate) fn encode(&self, decoded: &[u8], datatype: &Datatype) -> Result<Vec<u8>, EngineError> {
        match self {
            Self::ScaleOffset { scale_type, factor } => {
                let (numeric, order) = datatype
                    .numeric()
                    .ok_or_else(|| self.error("unsupported element type"))?;
                ScaleOffsetFilter::new(*scale_type, *factor)
                    .encode(decoded, numeric, order)
                    .map_err(|err| self.error(err))
            }
            Self::Shuffle => Ok(ShuffleFilter::new(shuffle_element_size(datatype)).encode(decoded)),
            Self::Deflate { level } => DeflateFilter::new(*level)
                .encode(decoded)
                .map_err(|err| self.error(err)),
        }
    }

    pub(crate) fn decode(&self, encoded: &[u8], datatype: &Datatype) -> Result<Vec<u8>, EngineError> {
        match self {
            Self::ScaleOffset { scale_type, factor } => {
                let (numeric, order) = datatype
                    .numeric()
                    .ok_or_else(|| self.error("unsupported element type"))?;
                ScaleOffsetFilter::new(*scale_type, *factor)
                    .decode(encoded, numeric, order)
                    .map_err(|err| self.error(err))
            }
            Self::Shuffle => Ok(ShuffleFilter::new(shuffle_element_size(datatype)).decode(encoded)),
            Self::Deflate { level } => DeflateFilter::new(*level)
                .decode(encoded)
                .map_err(|err| self.error(err)),
        }
    }
}

/// Variable-length strings are shuffled byte by byte, which leaves them unchanged.
fn shuffle_element_size(datatype: &Datatype) -> usize {
    datatype
        .numeric()
        .map_or(1, |(numeric, _)| numeric.size())
}
