//! The mapping from element kinds to engine datatypes.
//!
//! Numeric elements are stored little endian at their natural width and held in memory in host byte
//! order.
//! Strings are variable-length UTF-8 in both places, described by a single process-wide datatype
//! which is built on first use and locked against modification.

use std::sync::OnceLock;

use derive_more::Display;
use h5z_engine::{
    C_S1, CharacterSet, Hid, IEEE_F32LE, IEEE_F64LE, MemBuf, MemBufMut, NATIVE_DOUBLE,
    NATIVE_FLOAT, NATIVE_INT8, NATIVE_INT16, NATIVE_INT32, NATIVE_INT64, NATIVE_UINT8,
    NATIVE_UINT16, NATIVE_UINT32, NATIVE_UINT64, STD_I8LE, STD_I16LE, STD_I32LE, STD_I64LE,
    STD_U8LE, STD_U16LE, STD_U32LE, STD_U64LE, type_close, type_copy, type_lock, type_set_cset,
    type_set_variable_size,
};

use crate::H5Error;

/// The kind of a dataset or memory element.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display)]
#[allow(missing_docs)]
pub enum ElementKind {
    #[display("int8")]
    Int8,
    #[display("int16")]
    Int16,
    #[display("int32")]
    Int32,
    #[display("int64")]
    Int64,
    #[display("uint8")]
    UInt8,
    #[display("uint16")]
    UInt16,
    #[display("uint32")]
    UInt32,
    #[display("uint64")]
    UInt64,
    #[display("float32")]
    Float32,
    #[display("float64")]
    Float64,
    #[display("string")]
    String,
}

impl ElementKind {
    /// Returns true for floating point kinds.
    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    /// Returns true for integer kinds.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        !self.is_float() && !matches!(self, Self::String)
    }
}

static STRING_TYPE: OnceLock<Hid> = OnceLock::new();

fn build_string_type() -> Result<Hid, H5Error> {
    let string_type = type_copy(C_S1).map_err(H5Error::resource("failed to copy C_S1"))?;
    let configured = type_set_cset(string_type, CharacterSet::Utf8)
        .map_err(H5Error::resource("failed to set UTF-8 charset"))
        .and_then(|()| {
            type_set_variable_size(string_type)
                .map_err(H5Error::resource("failed to set variable length"))
        })
        .and_then(|()| {
            type_lock(string_type).map_err(H5Error::resource("failed to lock string datatype"))
        });
    if let Err(err) = configured {
        if let Err(close_err) = type_close(string_type) {
            log::warn!("failed to release datatype {string_type}: {close_err}");
        }
        return Err(err);
    }
    Ok(string_type)
}

/// Returns the variable-length UTF-8 string datatype.
///
/// The datatype is created once per process and never released.
///
/// # Errors
/// Returns [`H5Error::Resource`] if the datatype cannot be built.
pub fn string_type() -> Result<Hid, H5Error> {
    if let Some(string_type) = STRING_TYPE.get() {
        return Ok(*string_type);
    }
    let built = build_string_type()?;
    let string_type = *STRING_TYPE.get_or_init(|| built);
    if string_type != built {
        // Another thread won the race
        if let Err(err) = type_close(built) {
            log::warn!("failed to release datatype {built}: {err}");
        }
    }
    Ok(string_type)
}

/// Returns the datatype elements of `kind` are stored as.
///
/// # Errors
/// Returns [`H5Error::Resource`] if the string datatype cannot be built.
pub fn storage_type(kind: ElementKind) -> Result<Hid, H5Error> {
    Ok(match kind {
        ElementKind::Int8 => STD_I8LE,
        ElementKind::Int16 => STD_I16LE,
        ElementKind::Int32 => STD_I32LE,
        ElementKind::Int64 => STD_I64LE,
        ElementKind::UInt8 => STD_U8LE,
        ElementKind::UInt16 => STD_U16LE,
        ElementKind::UInt32 => STD_U32LE,
        ElementKind::UInt64 => STD_U64LE,
        ElementKind::Float32 => IEEE_F32LE,
        ElementKind::Float64 => IEEE_F64LE,
        ElementKind::String => string_type()?,
    })
}

/// Returns the datatype elements of `kind` have in memory.
///
/// # Errors
/// Returns [`H5Error::Resource`] if the string datatype cannot be built.
pub fn native_type(kind: ElementKind) -> Result<Hid, H5Error> {
    Ok(match kind {
        ElementKind::Int8 => NATIVE_INT8,
        ElementKind::Int16 => NATIVE_INT16,
        ElementKind::Int32 => NATIVE_INT32,
        ElementKind::Int64 => NATIVE_INT64,
        ElementKind::UInt8 => NATIVE_UINT8,
        ElementKind::UInt16 => NATIVE_UINT16,
        ElementKind::UInt32 => NATIVE_UINT32,
        ElementKind::UInt64 => NATIVE_UINT64,
        ElementKind::Float32 => NATIVE_FLOAT,
        ElementKind::Float64 => NATIVE_DOUBLE,
        ElementKind::String => string_type()?,
    })
}

mod private {
    pub trait Sealed {}
}

/// An element type a dataset can be declared with.
pub trait StorageElement: private::Sealed {
    /// The element kind.
    const KIND: ElementKind;
}

/// An element type of in-memory buffers.
pub trait NativeElement: private::Sealed + Clone + Default {
    /// The element kind.
    const KIND: ElementKind;

    /// Present `data` to the engine for writing.
    fn mem_buf(data: &[Self]) -> MemBuf<'_>;

    /// Present `data` to the engine for reading.
    fn mem_buf_mut(data: &mut [Self]) -> MemBufMut<'_>;
}

/// An integer element type usable as an enumeration value.
pub trait EnumValue: StorageElement + num::PrimInt + std::fmt::Display {}

macro_rules! numeric_element {
    ($ty:ty, $kind:ident) => {
        impl private::Sealed for $ty {}

        impl StorageElement for $ty {
            const KIND: ElementKind = ElementKind::$kind;
        }

        impl NativeElement for $ty {
            const KIND: ElementKind = ElementKind::$kind;

            fn mem_buf(data: &[Self]) -> MemBuf<'_> {
                MemBuf::Bytes(bytemuck::cast_slice(data))
            }

            fn mem_buf_mut(data: &mut [Self]) -> MemBufMut<'_> {
                MemBufMut::Bytes(bytemuck::cast_slice_mut(data))
            }
        }
    };
}

numeric_element!(i8, Int8);
numeric_element!(i16, Int16);
numeric_element!(i32, Int32);
numeric_element!(i64, Int64);
numeric_element!(u8, UInt8);
numeric_element!(u16, UInt16);
numeric_element!(u32, UInt32);
numeric_element!(u64, UInt64);
numeric_element!(f32, Float32);
numeric_element!(f64, Float64);

impl EnumValue for i8 {}
impl EnumValue for i16 {}
impl EnumValue for i32 {}
impl EnumValue for i64 {}
impl EnumValue for u8 {}
impl EnumValue for u16 {}
impl EnumValue for u32 {}
impl EnumValue for u64 {}

impl private::Sealed for String {}

impl StorageElement for String {
    const KIND: ElementKind = ElementKind::String;
}

impl NativeElement for String {
    const KIND: ElementKind = ElementKind::String;

    fn mem_buf(data: &[Self]) -> MemBuf<'_> {
        MemBuf::Strings(data)
    }

    fn mem_buf_mut(data: &mut [Self]) -> MemBufMut<'_> {
        MemBufMut::Strings(data)
    }
}

#[cfg(test)]
mod tests {
    use h5z_engine::{TypeClass, type_class, type_size};

    use super::*;

    #[test]
    fn string_type_shared() {
        let string_type = string_type().unwrap();
        assert_eq!(string_type, storage_type(ElementKind::String).unwrap());
        assert_eq!(string_type, native_type(ElementKind::String).unwrap());
        assert_eq!(type_class(string_type).unwrap(), TypeClass::String);
        // Locked after construction
        assert!(type_set_cset(string_type, CharacterSet::Ascii).is_err());
    }

    #[test]
    fn numeric_types() {
        for (kind, size) in [
            (ElementKind::Int8, 1),
            (ElementKind::UInt16, 2),
            (ElementKind::Int32, 4),
            (ElementKind::Float32, 4),
            (ElementKind::UInt64, 8),
            (ElementKind::Float64, 8),
        ] {
            assert_eq!(type_size(storage_type(kind).unwrap()).unwrap(), size);
            assert_eq!(type_size(native_type(kind).unwrap()).unwrap(), size);
        }
        assert_eq!(
            type_class(storage_type(ElementKind::Float64).unwrap()).unwrap(),
            TypeClass::Float
        );
        assert_eq!(
            type_class(storage_type(ElementKind::Int16).unwrap()).unwrap(),
            TypeClass::Integer
        );
    }

    #[test]
    fn element_kinds() {
        assert_eq!(<f32 as StorageElement>::KIND, ElementKind::Float32);
        assert_eq!(<String as NativeElement>::KIND, ElementKind::String);
        assert!(ElementKind::Float64.is_float());
        assert!(ElementKind::UInt8.is_integer());
        assert!(!ElementKind::String.is_integer());
        assert_eq!(ElementKind::UInt32.to_string(), "uint32");
    }
}
