//! Enumeration mappings.

use h5z_engine::{
    Hid, TypeClass, dataset_get_type, type_class, type_enum_member, type_enum_nmembers,
    type_equal, type_super,
};
use thiserror::Error;

use crate::{
    EnumValue, H5Error,
    hid::{DatatypeRelease, UniqueHid},
};

/// An invalid enumeration mapping.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EnumMappingError {
    /// A name is mapped twice.
    #[error("duplicate enum member name {0:?}")]
    DuplicateName(String),
    /// A value is mapped twice.
    #[error("duplicate enum value {value} for member {name:?}")]
    DuplicateValue {
        /// The name of the rejected member.
        name: String,
        /// The value.
        value: String,
    },
}

/// A bijection between member names and integer values.
///
/// Members are kept in insertion order.
///
/// ```
/// # use h5z::EnumMapping;
/// let mapping = EnumMapping::try_from([("A", 1), ("B", 2), ("C", 3)])?;
/// assert_eq!(mapping.size(), 3);
/// assert_eq!(mapping.value("B"), Some(2));
/// assert_eq!(mapping.name(3), Some("C"));
/// assert_eq!(mapping.name(0), None);
/// # Ok::<_, h5z::EnumMappingError>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumMapping<V> {
    members: Vec<(String, V)>,
}

impl<V> Default for EnumMapping<V> {
    fn default() -> Self {
        Self {
            members: Vec::new(),
        }
    }
}

impl<V: EnumValue> EnumMapping<V> {
    /// Create an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the member `name` with `value`.
    ///
    /// # Errors
    /// Returns an [`EnumMappingError`] if `name` or `value` is already mapped.
    pub fn insert(&mut self, name: impl Into<String>, value: V) -> Result<(), EnumMappingError> {
        let name = name.into();
        if self.value(&name).is_some() {
            return Err(EnumMappingError::DuplicateName(name));
        }
        if self.name(value).is_some() {
            return Err(EnumMappingError::DuplicateValue {
                name,
                value: value.to_string(),
            });
        }
        self.members.push((name, value));
        Ok(())
    }

    /// Returns the number of members.
    #[must_use]
    pub fn size(&self) -> usize {
        self.members.len()
    }

    /// Returns true if there are no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns the value of the member `name`.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<V> {
        self.members
            .iter()
            .find(|(member, _)| member == name)
            .map(|(_, value)| *value)
    }

    /// Returns the name of the member with `value`.
    #[must_use]
    pub fn name(&self, value: V) -> Option<&str> {
        self.members
            .iter()
            .find(|(_, member)| *member == value)
            .map(|(name, _)| name.as_str())
    }

    /// Returns an iterator over the members in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, V)> {
        self.members
            .iter()
            .map(|(name, value)| (name.as_str(), *value))
    }

    /// Returns the members with values widened to `i64`.
    pub(crate) fn to_members(&self) -> Result<Vec<(String, i64)>, H5Error> {
        self.members
            .iter()
            .map(|(name, value)| {
                value.to_i64().map(|value| (name.clone(), value)).ok_or_else(|| {
                    H5Error::EnumMismatch(format!(
                        "value {value} of member {name:?} is not representable"
                    ))
                })
            })
            .collect()
    }
}

impl<V: EnumValue, S: Into<String>, const N: usize> TryFrom<[(S, V); N]> for EnumMapping<V> {
    type Error = EnumMappingError;

    fn try_from(members: [(S, V); N]) -> Result<Self, Self::Error> {
        let mut mapping = Self::new();
        for (name, value) in members {
            mapping.insert(name, value)?;
        }
        Ok(mapping)
    }
}

/// Check that the datatype of `dataset` is an enumeration over `base` with exactly `members`.
pub(crate) fn validate_dataset_enum(
    dataset: Hid,
    base: Hid,
    members: &[(String, i64)],
) -> Result<(), H5Error> {
    let datatype = UniqueHid::<DatatypeRelease>::from(
        dataset_get_type(dataset).map_err(H5Error::resource("failed to determine datatype"))?,
    );
    let class = type_class(datatype.hid())
        .map_err(H5Error::resource("failed to determine datatype class"))?;
    if class != TypeClass::Enum {
        return Err(H5Error::EnumMismatch(format!(
            "dataset datatype is {class}, not an enumeration"
        )));
    }

    let dataset_base = UniqueHid::<DatatypeRelease>::from(
        type_super(datatype.hid()).map_err(H5Error::resource("failed to determine enum base"))?,
    );
    if !type_equal(dataset_base.hid(), base)
        .map_err(H5Error::resource("failed to compare enum base"))?
    {
        return Err(H5Error::EnumMismatch(
            "enumeration base type differs".to_string(),
        ));
    }

    let count = type_enum_nmembers(datatype.hid())
        .map_err(H5Error::resource("failed to count enum members"))?;
    if count != members.len() {
        return Err(H5Error::EnumMismatch(format!(
            "dataset has {count} members, expected {}",
            members.len()
        )));
    }
    for index in 0..count {
        let (name, value) = type_enum_member(datatype.hid(), index)
            .map_err(H5Error::resource("failed to read enum member"))?;
        match members.iter().find(|(expected, _)| *expected == name) {
            None => {
                return Err(H5Error::EnumMismatch(format!(
                    "unexpected member {name:?}"
                )));
            }
            Some((_, expected)) if *expected != value => {
                return Err(H5Error::EnumMismatch(format!(
                    "member {name:?} has value {value}, expected {expected}"
                )));
            }
            Some(_) => {}
        }
    }
    Ok(())
}
