//! Element conversion between datatypes.
//!
//! Numeric datatypes (integers, floats, and enumerations through their base type) convert to each
//! other with `as` semantics. Variable-length strings convert only to variable-length strings.

use bytemuck::Pod;
use num::traits::AsPrimitive;

use crate::{ByteOrder, Datatype, EngineError, NumericType};

/// Returns true if elements of `src` can be converted to `dst`.
pub(crate) fn convertible(src: &Datatype, dst: &Datatype) -> bool {
    match (src.numeric(), dst.numeric()) {
        (Some(_), Some(_)) => true,
        _ => src.is_variable_string() && dst.is_variable_string(),
    }
}

/// Reverse the byte order of each `element_size` element of `bytes`.
pub(crate) fn reverse_endianness(bytes: &mut [u8], element_size: usize) {
    if element_size > 1 {
        for element in bytes.chunks_exact_mut(element_size) {
            element.reverse();
        }
    }
}

/// Interpret `bytes` as elements of `T` in byte order `order`.
pub(crate) fn decode_elements<T: Pod>(bytes: &[u8], order: ByteOrder) -> Vec<T> {
    if order == ByteOrder::native() {
        bytemuck::pod_collect_to_vec(bytes)
    } else {
        let mut bytes = bytes.to_vec();
        reverse_endianness(&mut bytes, size_of::<T>());
        bytemuck::pod_collect_to_vec(&bytes)
    }
}

/// Lay out `values` as bytes in byte order `order`.
pub(crate) fn encode_elements<T: Pod>(values: &[T], order: ByteOrder) -> Vec<u8> {
    let mut bytes = bytemuck::cast_slice::<T, u8>(values).to_vec();
    if order != ByteOrder::native() {
        reverse_endianness(&mut bytes, size_of::<T>());
    }
    bytes
}

/// Convert each value with `as` semantics.
pub(crate) fn cast_all<S, D>(values: &[S]) -> Vec<D>
where
    S: AsPrimitive<D>,
    D: Copy + 'static,
{
    values.iter().map(|value| value.as_()).collect()
}

/// Convert numeric elements between layouts.
pub(crate) fn convert_numeric(
    bytes: &[u8],
    (src, src_order): (NumericType, ByteOrder),
    (dst, dst_order): (NumericType, ByteOrder),
) -> Vec<u8> {
    if src == dst {
        let mut bytes = bytes.to_vec();
        if src_order != dst_order {
            reverse_endianness(&mut bytes, src.size());
        }
        return bytes;
    }

    macro_rules! convert_from {
        ($src:ty) => {{
            let values = decode_elements::<$src>(bytes, src_order);
            match dst {
                NumericType::I8 => encode_elements(&cast_all::<$src, i8>(&values), dst_order),
                NumericType::I16 => encode_elements(&cast_all::<$src, i16>(&values), dst_order),
                NumericType::I32 => encode_elements(&cast_all::<$src, i32>(&values), dst_order),
                NumericType::I64 => encode_elements(&cast_all::<$src, i64>(&values), dst_order),
                NumericType::U8 => encode_elements(&cast_all::<$src, u8>(&values), dst_order),
                NumericType::U16 => encode_elements(&cast_all::<$src, u16>(&values), dst_order),
                NumericType::U32 => encode_elements(&cast_all::<$src, u32>(&values), dst_order),
                NumericType::U64 => encode_elements(&cast_all::<$src, u64>(&values), dst_order),
                NumericType::F32 => encode_elements(&cast_all::<$src, f32>(&values), dst_order),
                NumericType::F64 => encode_elements(&cast_all::<$src, f64>(&values), dst_order),
            }
        }};
    }

    match src {
        NumericType::I8 => convert_from!(i8),
        NumericType::I16 => convert_from!(i16),
        NumericType::I32 => convert_from!(i32),
        NumericType::I64 => convert_from!(i64),
        NumericType::U8 => convert_from!(u8),
        NumericType::U16 => convert_from!(u16),
        NumericType::U32 => convert_from!(u32),
        NumericType::U64 => convert_from!(u64),
        NumericType::F32 => convert_from!(f32),
        NumericType::F64 => convert_from!(f64),
    }
}

/// Convert fixed-size numeric elements from `src` to `dst`.
pub(crate) fn convert_bytes(
    bytes: &[u8],
    src: &Datatype,
    dst: &Datatype,
) -> Result<Vec<u8>, EngineError> {
    match (src.numeric(), dst.numeric()) {
        (Some(src), Some(dst)) => Ok(convert_numeric(bytes, src, dst)),
        _ => Err(EngineError::NoConversion {
            from: src.class(),
            to: dst.class(),
        }),
    }
}
