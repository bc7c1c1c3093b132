//! Element datatypes.
//!
//! Predefined datatypes have fixed identifiers and can be neither modified nor closed.
//! Copies made with [`type_copy`] are independent objects which can be modified until closed or locked
//! with [`type_lock`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    EngineError, Hid,
    registry::{self, Object},
};

/// The byte order of a fixed-size numeric datatype.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    /// Little endian.
    Little,
    /// Big endian.
    Big,
}

impl ByteOrder {
    /// The byte order of the host.
    #[must_use]
    pub const fn native() -> Self {
        if cfg!(target_endian = "little") {
            Self::Little
        } else {
            Self::Big
        }
    }
}

/// The character set of a string datatype.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacterSet {
    /// US-ASCII.
    Ascii,
    /// UTF-8.
    Utf8,
}

/// The size of a string datatype.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StringSize {
    /// A fixed number of bytes per element.
    Fixed(usize),
    /// Variable length.
    Variable,
}

/// A named member of an enumeration datatype.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnumMember {
    /// The member name.
    pub name: String,
    /// The member value.
    pub value: i64,
}

/// The class of a datatype.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeClass {
    /// Signed or unsigned integers.
    Integer,
    /// IEEE 754 floating point numbers.
    Float,
    /// Strings.
    String,
    /// Enumerations over an integer base type.
    Enum,
}

impl fmt::Display for TypeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::Enum => "enum",
        })
    }
}

/// A fixed-size numeric element layout.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum NumericType {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

impl NumericType {
    /// The size of an element in bytes.
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::I32 | Self::U32 | Self::F32 => 4,
            Self::I64 | Self::U64 | Self::F64 => 8,
        }
    }

    /// Returns true for floating point types.
    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }
}

/// An element datatype.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "class", rename_all = "snake_case")]
pub enum Datatype {
    /// An integer.
    Integer {
        /// The size in bytes (1, 2, 4, or 8).
        size: usize,
        /// Whether the integer is signed.
        signed: bool,
        /// The byte order.
        order: ByteOrder,
    },
    /// A floating point number.
    Float {
        /// The size in bytes (4 or 8).
        size: usize,
        /// The byte order.
        order: ByteOrder,
    },
    /// A string.
    String {
        /// The character set.
        cset: CharacterSet,
        /// The element size.
        size: StringSize,
    },
    /// An enumeration.
    Enum {
        /// The integer base type.
        base: Box<Datatype>,
        /// The members, in insertion order.
        members: Vec<EnumMember>,
    },
}

impl Datatype {
    /// The class of the datatype.
    #[must_use]
    pub fn class(&self) -> TypeClass {
        match self {
            Self::Integer { .. } => TypeClass::Integer,
            Self::Float { .. } => TypeClass::Float,
            Self::String { .. } => TypeClass::String,
            Self::Enum { .. } => TypeClass::Enum,
        }
    }

    /// The size of an element in bytes.
    ///
    /// Variable-length strings report the size of a pointer.
    #[must_use]
    pub fn size(&self) -> usize {
        match self {
            Self::Integer { size, .. } | Self::Float { size, .. } => *size,
            Self::String {
                size: StringSize::Fixed(size),
                ..
            } => *size,
            Self::String {
                size: StringSize::Variable,
                ..
            } => size_of::<usize>(),
            Self::Enum { base, .. } => base.size(),
        }
    }

    /// The numeric layout of the datatype, if any. Enumerations report their base type.
    #[must_use]
    pub fn numeric(&self) -> Option<(NumericType, ByteOrder)> {
        match self {
            Self::Integer {
                size,
                signed,
                order,
            } => {
                let numeric = match (size, signed) {
                    (1, true) => NumericType::I8,
                    (2, true) => NumericType::I16,
                    (4, true) => NumericType::I32,
                    (8, true) => NumericType::I64,
                    (1, false) => NumericType::U8,
                    (2, false) => NumericType::U16,
                    (4, false) => NumericType::U32,
                    (8, false) => NumericType::U64,
                    _ => return None,
                };
                Some((numeric, *order))
            }
            Self::Float { size: 4, order } => Some((NumericType::F32, *order)),
            Self::Float { size: 8, order } => Some((NumericType::F64, *order)),
            Self::Float { .. } | Self::String { .. } => None,
            Self::Enum { base, .. } => base.numeric(),
        }
    }

    /// Returns true for variable-length strings.
    #[must_use]
    pub fn is_variable_string(&self) -> bool {
        matches!(
            self,
            Self::String {
                size: StringSize::Variable,
                ..
            }
        )
    }

    /// The representable range of an integer datatype.
    fn integer_range(&self) -> Option<(i128, i128)> {
        match self {
            Self::Integer { size, signed, .. } if (1..=8).contains(size) => {
                let bits = u32::try_from(size * 8).ok()?;
                if *signed {
                    Some((-(1i128 << (bits - 1)), (1i128 << (bits - 1)) - 1))
                } else {
                    Some((0, (1i128 << bits) - 1))
                }
            }
            _ => None,
        }
    }
}

/// A signed 8-bit little endian integer.
pub const STD_I8LE: Hid = 1;
/// A signed 16-bit little endian integer.
pub const STD_I16LE: Hid = 2;
/// A signed 32-bit little endian integer.
pub const STD_I32LE: Hid = 3;
/// A signed 64-bit little endian integer.
pub const STD_I64LE: Hid = 4;
/// An unsigned 8-bit little endian integer.
pub const STD_U8LE: Hid = 5;
/// An unsigned 16-bit little endian integer.
pub const STD_U16LE: Hid = 6;
/// An unsigned 32-bit little endian integer.
pub const STD_U32LE: Hid = 7;
/// An unsigned 64-bit little endian integer.
pub const STD_U64LE: Hid = 8;
/// A 32-bit little endian IEEE 754 float.
pub const IEEE_F32LE: Hid = 9;
/// A 64-bit little endian IEEE 754 float.
pub const IEEE_F64LE: Hid = 10;
/// A signed 8-bit integer in host byte order.
pub const NATIVE_INT8: Hid = 11;
/// A signed 16-bit integer in host byte order.
pub const NATIVE_INT16: Hid = 12;
/// A signed 32-bit integer in host byte order.
pub const NATIVE_INT32: Hid = 13;
/// A signed 64-bit integer in host byte order.
pub const NATIVE_INT64: Hid = 14;
/// An unsigned 8-bit integer in host byte order.
pub const NATIVE_UINT8: Hid = 15;
/// An unsigned 16-bit integer in host byte order.
pub const NATIVE_UINT16: Hid = 16;
/// An unsigned 32-bit integer in host byte order.
pub const NATIVE_UINT32: Hid = 17;
/// An unsigned 64-bit integer in host byte order.
pub const NATIVE_UINT64: Hid = 18;
/// A 32-bit float in host byte order.
pub const NATIVE_FLOAT: Hid = 19;
/// A 64-bit float in host byte order.
pub const NATIVE_DOUBLE: Hid = 20;
/// A one byte ASCII string.
pub const C_S1: Hid = 21;

pub(crate) fn predefined(id: Hid) -> Option<Datatype> {
    let integer = |size, signed, order| Datatype::Integer {
        size,
        signed,
        order,
    };
    let float = |size, order| Datatype::Float { size, order };
    let little = ByteOrder::Little;
    let native = ByteOrder::native();
    Some(match id {
        STD_I8LE => integer(1, true, little),
        STD_I16LE => integer(2, true, little),
        STD_I32LE => integer(4, true, little),
        STD_I64LE => integer(8, true, little),
        STD_U8LE => integer(1, false, little),
        STD_U16LE => integer(2, false, little),
        STD_U32LE => integer(4, false, little),
        STD_U64LE => integer(8, false, little),
        IEEE_F32LE => float(4, little),
        IEEE_F64LE => float(8, little),
        NATIVE_INT8 => integer(1, true, native),
        NATIVE_INT16 => integer(2, true, native),
        NATIVE_INT32 => integer(4, true, native),
        NATIVE_INT64 => integer(8, true, native),
        NATIVE_UINT8 => integer(1, false, native),
        NATIVE_UINT16 => integer(2, false, native),
        NATIVE_UINT32 => integer(4, false, native),
        NATIVE_UINT64 => integer(8, false, native),
        NATIVE_FLOAT => float(4, native),
        NATIVE_DOUBLE => float(8, native),
        C_S1 => Datatype::String {
            cset: CharacterSet::Ascii,
            size: StringSize::Fixed(1),
        },
        _ => return None,
    })
}

pub(crate) fn register_datatype(datatype: Datatype) -> Hid {
    registry::register(Object::Datatype {
        datatype,
        locked: false,
    })
}

/// Copy a datatype into a new, modifiable datatype object.
///
/// # Errors
/// Returns an [`EngineError`] if `id` is not a datatype.
pub fn type_copy(id: Hid) -> Result<Hid, EngineError> {
    Ok(register_datatype(registry::datatype(id)?))
}

/// Set the character set of a string datatype.
///
/// # Errors
/// Returns an [`EngineError`] if `id` is not a modifiable string datatype.
pub fn type_set_cset(id: Hid, cset: CharacterSet) -> Result<(), EngineError> {
    registry::datatype_mut(id, |datatype| match datatype {
        Datatype::String { cset: current, .. } => {
            *current = cset;
            Ok(())
        }
        _ => Err(EngineError::InvalidArgument(format!(
            "datatype {id} is not a string"
        ))),
    })
}

/// Make a string datatype variable length.
///
/// # Errors
/// Returns an [`EngineError`] if `id` is not a modifiable string datatype.
pub fn type_set_variable_size(id: Hid) -> Result<(), EngineError> {
    registry::datatype_mut(id, |datatype| match datatype {
        Datatype::String { size, .. } => {
            *size = StringSize::Variable;
            Ok(())
        }
        _ => Err(EngineError::InvalidArgument(format!(
            "datatype {id} is not a string"
        ))),
    })
}

/// Lock a datatype, making it immutable until closed.
///
/// Locking a predefined datatype is a no-op.
///
/// # Errors
/// Returns an [`EngineError`] if `id` is not a datatype.
pub fn type_lock(id: Hid) -> Result<(), EngineError> {
    if predefined(id).is_some() {
        return Ok(());
    }
    // Validate the identifier before locking
    registry::datatype(id)?;
    registry::lock_datatype(id)
}

/// Create an empty enumeration datatype over the integer datatype `base`.
///
/// # Errors
/// Returns an [`EngineError`] if `base` is not an integer datatype.
pub fn type_enum_create(base: Hid) -> Result<Hid, EngineError> {
    let base = registry::datatype(base)?;
    if base.class() != TypeClass::Integer {
        return Err(EngineError::InvalidArgument(format!(
            "enumeration base type must be an integer, not {}",
            base.class()
        )));
    }
    Ok(register_datatype(Datatype::Enum {
        base: Box::new(base),
        members: vec![],
    }))
}

/// Append a member to an enumeration datatype.
///
/// # Errors
/// Returns an [`EngineError`] if `id` is not a modifiable enumeration, the name or value is already
/// present, or the value is not representable by the base type.
pub fn type_enum_insert(id: Hid, name: &str, value: i64) -> Result<(), EngineError> {
    registry::datatype_mut(id, |datatype| {
        let Datatype::Enum { base, members } = datatype else {
            return Err(EngineError::InvalidArgument(format!(
                "datatype {id} is not an enumeration"
            )));
        };
        if let Some((min, max)) = base.integer_range() {
            if !(min..=max).contains(&i128::from(value)) {
                return Err(EngineError::InvalidArgument(format!(
                    "enumeration value {value} is out of range for the base type"
                )));
            }
        }
        if members.iter().any(|member| member.name == name) {
            return Err(EngineError::AlreadyExists(format!(
                "enumeration member {name:?}"
            )));
        }
        if members.iter().any(|member| member.value == value) {
            return Err(EngineError::AlreadyExists(format!(
                "enumeration value {value}"
            )));
        }
        members.push(EnumMember {
            name: name.to_string(),
            value,
        });
        Ok(())
    })
}

fn enum_members(id: Hid) -> Result<Vec<EnumMember>, EngineError> {
    match registry::datatype(id)? {
        Datatype::Enum { members, .. } => Ok(members),
        _ => Err(EngineError::InvalidArgument(format!(
            "datatype {id} is not an enumeration"
        ))),
    }
}

/// Returns the number of members of an enumeration datatype.
///
/// # Errors
/// Returns an [`EngineError`] if `id` is not an enumeration datatype.
pub fn type_enum_nmembers(id: Hid) -> Result<usize, EngineError> {
    Ok(enum_members(id)?.len())
}

/// Returns the name and value of the enumeration member at `index`.
///
/// # Errors
/// Returns an [`EngineError`] if `id` is not an enumeration datatype or `index` is out of bounds.
pub fn type_enum_member(id: Hid, index: usize) -> Result<(String, i64), EngineError> {
    enum_members(id)?
        .into_iter()
        .nth(index)
        .map(|member| (member.name, member.value))
        .ok_or_else(|| EngineError::NotFound(format!("enumeration member {index}")))
}

/// Returns a copy of the base datatype of an enumeration.
///
/// # Errors
/// Returns an [`EngineError`] if `id` is not an enumeration datatype.
pub fn type_super(id: Hid) -> Result<Hid, EngineError> {
    match registry::datatype(id)? {
        Datatype::Enum { base, .. } => Ok(register_datatype(*base)),
        _ => Err(EngineError::InvalidArgument(format!(
            "datatype {id} has no base type"
        ))),
    }
}

/// Returns the class of a datatype.
///
/// # Errors
/// Returns an [`EngineError`] if `id` is not a datatype.
pub fn type_class(id: Hid) -> Result<TypeClass, EngineError> {
    Ok(registry::datatype(id)?.class())
}

/// Returns the element size of a datatype in bytes.
///
/// # Errors
/// Returns an [`EngineError`] if `id` is not a datatype.
pub fn type_size(id: Hid) -> Result<usize, EngineError> {
    Ok(registry::datatype(id)?.size())
}

/// Returns true if two datatypes are identical.
///
/// # Errors
/// Returns an [`EngineError`] if either identifier is not a datatype.
pub fn type_equal(a: Hid, b: Hid) -> Result<bool, EngineError> {
    Ok(registry::datatype(a)? == registry::datatype(b)?)
}

/// Returns true if elements of datatype `src` can be converted to datatype `dst`.
///
/// # Errors
/// Returns an [`EngineError`] if either identifier is not a datatype.
pub fn type_find_conversion(src: Hid, dst: Hid) -> Result<bool, EngineError> {
    Ok(crate::conversion::convertible(
        &registry::datatype(src)?,
        &registry::datatype(dst)?,
    ))
}

/// Close a datatype.
///
/// # Errors
/// Returns an [`EngineError`] if `id` is a predefined datatype or not a datatype.
pub fn type_close(id: Hid) -> Result<(), EngineError> {
    if predefined(id).is_some() {
        return Err(EngineError::InvalidArgument(format!(
            "predefined datatype {id} cannot be closed"
        )));
    }
    registry::unregister(id, registry::ObjectKind::Datatype).map(|_| ())
}
