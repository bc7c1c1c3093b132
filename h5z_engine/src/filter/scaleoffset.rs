//! Scale-offset quantisation.
//!
//! Each chunk is quantised to integers, offset by the chunk minimum, and bit packed with the fewest
//! bits holding the largest offset (or `factor` bits for [`ScaleType::Int`] with a positive factor).
//!
//! Encoded layout (little endian):
//!  - `u8`: bits per value,
//!  - `i128`: the chunk minimum,
//!  - `u64`: the number of values, and
//!  - the packed offsets, least significant bit first.
//!
//! Floating point values are rounded to `10^-factor`; `NaN` is stored as zero and infinities
//! saturate.

use num::traits::AsPrimitive;

use super::ScaleType;
use crate::{
    ByteOrder, NumericType,
    conversion::{cast_all, decode_elements, encode_elements},
};

const HEADER_SIZE: usize = 1 + 16 + 8;

/// Scale-offset quantisation with minimum-bit packing.
#[derive(Clone, Debug)]
pub(super) struct ScaleOffsetFilter {
    scale_type: ScaleType,
    factor: i32,
}

impl ScaleOffsetFilter {
    pub(super) fn new(scale_type: ScaleType, factor: i32) -> Self {
        Self { scale_type, factor }
    }

    fn scale(&self) -> f64 {
        10f64.powi(self.factor)
    }

    pub(super) fn encode(
        &self,
        decoded: &[u8],
        numeric: NumericType,
        order: ByteOrder,
    ) -> Result<Vec<u8>, String> {
        let (values, max_bits) = match self.scale_type {
            ScaleType::FloatDScale => {
                let floats = floats_to_f64(decoded, numeric, order)
                    .ok_or("D-scaling requires floating point elements")?;
                let scale = self.scale();
                let quantised: Vec<i128> = floats
                    .iter()
                    .map(|value| {
                        let value: i64 = (value * scale).round().as_();
                        i128::from(value)
                    })
                    .collect();
                (quantised, None)
            }
            ScaleType::Int => {
                let integers = integers_to_i128(decoded, numeric, order)
                    .ok_or("integer scaling requires integer elements")?;
                let max_bits = u32::try_from(self.factor)
                    .ok()
                    .filter(|bits| *bits > 0)
                    .map(|bits| bits.min(64));
                (integers, max_bits)
            }
        };

        let minimum = values.iter().copied().min().unwrap_or(0);
        let limit = max_bits.map_or(u64::MAX, bit_mask);
        let offsets: Vec<u64> = values
            .iter()
            .map(|value| u64::try_from(value - minimum).unwrap_or(u64::MAX).min(limit))
            .collect();
        let bits = max_bits.unwrap_or_else(|| {
            let largest = offsets.iter().copied().max().unwrap_or(0);
            u64::BITS - largest.leading_zeros()
        });

        let mut encoded = Vec::with_capacity(HEADER_SIZE + (offsets.len() * bits as usize).div_ceil(8));
        encoded.push(u8::try_from(bits).map_err(|err| err.to_string())?);
        encoded.extend_from_slice(&minimum.to_le_bytes());
        encoded.extend_from_slice(&(offsets.len() as u64).to_le_bytes());
        encoded.extend(pack(&offsets, bits));
        Ok(encoded)
    }

    pub(super) fn decode(
        &self,
        encoded: &[u8],
        numeric: NumericType,
        order: ByteOrder,
    ) -> Result<Vec<u8>, String> {
        if encoded.len() < HEADER_SIZE {
            return Err("encoded chunk is shorter than the header".to_string());
        }
        let (header, payload) = encoded.split_at(HEADER_SIZE);
        let bits = u32::from(header[0]);
        if bits > 64 {
            return Err(format!("invalid bit width {bits}"));
        }
        let minimum = i128::from_le_bytes(header[1..17].try_into().map_err(|_| "invalid minimum")?);
        let count = u64::from_le_bytes(header[17..25].try_into().map_err(|_| "invalid count")?);
        let count = usize::try_from(count).map_err(|err| err.to_string())?;
        let values: Vec<i128> = unpack(payload, bits, count)?
            .into_iter()
            .map(|offset| minimum + i128::from(offset))
            .collect();

        match self.scale_type {
            ScaleType::FloatDScale => {
                let scale = self.scale();
                let floats: Vec<f64> = values
                    .iter()
                    .map(|value| {
                        let value: f64 = value.as_();
                        value / scale
                    })
                    .collect();
                floats_from_f64(&floats, numeric, order)
                    .ok_or_else(|| "D-scaling requires floating point elements".to_string())
            }
            ScaleType::Int => integers_from_i128(&values, numeric, order)
                .ok_or_else(|| "integer scaling requires integer elements".to_string()),
        }
    }
}

fn bit_mask(bits: u32) -> u64 {
    if bits >= u64::BITS {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

fn pack(values: &[u64], bits: u32) -> Vec<u8> {
    let mut packed = Vec::with_capacity((values.len() * bits as usize).div_ceil(8));
    if bits == 0 {
        return packed;
    }
    let mut accumulator: u128 = 0;
    let mut accumulated = 0;
    for value in values {
        accumulator |= u128::from(*value) << accumulated;
        accumulated += bits;
        while accumulated >= 8 {
            packed.push(accumulator.to_le_bytes()[0]);
            accumulator >>= 8;
            accumulated -= 8;
        }
    }
    if accumulated > 0 {
        packed.push(accumulator.to_le_bytes()[0]);
    }
    packed
}

#[allow(clippy::cast_possible_truncation)]
fn unpack(packed: &[u8], bits: u32, count: usize) -> Result<Vec<u64>, String> {
    if bits == 0 {
        return Ok(vec![0; count]);
    }
    let expected = (count * bits as usize).div_ceil(8);
    if packed.len() < expected {
        return Err(format!(
            "expected {expected} packed bytes, got {}",
            packed.len()
        ));
    }
    let mask = u128::from(bit_mask(bits));
    let mut bytes = packed.iter();
    let mut accumulator: u128 = 0;
    let mut accumulated = 0;
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        while accumulated < bits {
            let byte = bytes.next().copied().unwrap_or_default();
            accumulator |= u128::from(byte) << accumulated;
            accumulated += 8;
        }
        values.push((accumulator & mask) as u64);
        accumulator >>= bits;
        accumulated -= bits;
    }
    Ok(values)
}

fn integers_to_i128(bytes: &[u8], numeric: NumericType, order: ByteOrder) -> Option<Vec<i128>> {
    macro_rules! widen {
        ($ty:ty) => {
            cast_all::<$ty, i128>(&decode_elements::<$ty>(bytes, order))
        };
    }
    Some(match numeric {
        NumericType::I8 => widen!(i8),
        NumericType::I16 => widen!(i16),
        NumericType::I32 => widen!(i32),
        NumericType::I64 => widen!(i64),
        NumericType::U8 => widen!(u8),
        NumericType::U16 => widen!(u16),
        NumericType::U32 => widen!(u32),
        NumericType::U64 => widen!(u64),
        NumericType::F32 | NumericType::F64 => return None,
    })
}

fn integers_from_i128(values: &[i128], numeric: NumericType, order: ByteOrder) -> Option<Vec<u8>> {
    macro_rules! narrow {
        ($ty:ty) => {
            encode_elements(&cast_all::<i128, $ty>(values), order)
        };
    }
    Some(match numeric {
        NumericType::I8 => narrow!(i8),
        NumericType::I16 => narrow!(i16),
        NumericType::I32 => narrow!(i32),
        NumericType::I64 => narrow!(i64),
        NumericType::U8 => narrow!(u8),
        NumericType::U16 => narrow!(u16),
        NumericType::U32 => narrow!(u32),
        NumericType::U64 => narrow!(u64),
        NumericType::F32 | NumericType::F64 => return None,
    })
}

fn floats_to_f64(bytes: &[u8], numeric: NumericType, order: ByteOrder) -> Option<Vec<f64>> {
    match numeric {
        NumericType::F32 => Some(cast_all::<f32, f64>(&decode_elements::<f32>(bytes, order))),
        NumericType::F64 => Some(decode_elements::<f64>(bytes, order)),
        _ => None,
    }
}

fn floats_from_f64(values: &[f64], numeric: NumericType, order: ByteOrder) -> Option<Vec<u8>> {
    match numeric {
        NumericType::F32 => Some(encode_elements(&cast_all::<f64, f32>(values), order)),
        NumericType::F64 => Some(encode_elements(values, order)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaleoffset_float() {
        let filter = ScaleOffsetFilter::new(ScaleType::FloatDScale, 2);
        let values = [1.234f64, 1.0, 0.5, 2.0];
        let decoded = encode_elements(&values, ByteOrder::Little);
        let encoded = filter
            .encode(&decoded, NumericType::F64, ByteOrder::Little)
            .unwrap();
        // 123, 100, 50, 200 offset by 50 fits in 8 bits
        assert_eq!(encoded[0], 8);
        assert_eq!(encoded.len(), HEADER_SIZE + 4);
        let roundtrip = filter
            .decode(&encoded, NumericType::F64, ByteOrder::Little)
            .unwrap();
        assert_eq!(
            decode_elements::<f64>(&roundtrip, ByteOrder::Little),
            vec![1.23, 1.0, 0.5, 2.0]
        );
    }

    #[test]
    fn scaleoffset_integer_automatic() {
        let filter = ScaleOffsetFilter::new(ScaleType::Int, 0);
        let values = [1000i32, 1003, 1001, 1007, -4];
        let decoded = encode_elements(&values, ByteOrder::Little);
        let encoded = filter
            .encode(&decoded, NumericType::I32, ByteOrder::Little)
            .unwrap();
        assert_eq!(encoded[0], 10);
        let roundtrip = filter
            .decode(&encoded, NumericType::I32, ByteOrder::Little)
            .unwrap();
        assert_eq!(roundtrip, decoded);
    }

    #[test]
    fn scaleoffset_integer_bits() {
        let filter = ScaleOffsetFilter::new(ScaleType::Int, 2);
        let values = [10u64, 11, 12, 13, 20];
        let decoded = encode_elements(&values, ByteOrder::Little);
        let encoded = filter
            .encode(&decoded, NumericType::U64, ByteOrder::Little)
            .unwrap();
        let roundtrip = filter
            .decode(&encoded, NumericType::U64, ByteOrder::Little)
            .unwrap();
        assert_eq!(
            decode_elements::<u64>(&roundtrip, ByteOrder::Little),
            vec![10, 11, 12, 13, 13]
        );
    }

    #[test]
    fn scaleoffset_constant() {
        let filter = ScaleOffsetFilter::new(ScaleType::Int, 0);
        let decoded = encode_elements(&[u64::MAX; 3], ByteOrder::Little);
        let encoded = filter
            .encode(&decoded, NumericType::U64, ByteOrder::Little)
            .unwrap();
        assert_eq!(encoded.len(), HEADER_SIZE);
        assert_eq!(
            filter
                .decode(&encoded, NumericType::U64, ByteOrder::Little)
                .unwrap(),
            decoded
        );
        assert!(filter.decode(&encoded[..4], NumericType::U64, ByteOrder::Little).is_err());
    }

    #[test]
    fn scaleoffset_wide_range() {
        let filter = ScaleOffsetFilter::new(ScaleType::Int, 0);
        let decoded = encode_elements(&[i64::MIN, 0, i64::MAX], ByteOrder::Big);
        let encoded = filter
            .encode(&decoded, NumericType::I64, ByteOrder::Big)
            .unwrap();
        assert_eq!(encoded[0], 64);
        assert_eq!(
            filter
                .decode(&encoded, NumericType::I64, ByteOrder::Big)
                .unwrap(),
            decoded
        );
    }

    #[test]
    fn pack_unpack() {
        let values = [0, 5, 7, 1, 3];
        let packed = pack(&values, 3);
        assert_eq!(packed.len(), 2);
        assert_eq!(unpack(&packed, 3, 5).unwrap(), values);
    }
}
