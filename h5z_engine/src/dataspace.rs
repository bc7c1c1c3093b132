use crate::{
    EngineError, Hid,
    registry::{self, Object, ObjectKind},
};

/// The rank, extents, and maximum extents of an array.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Dataspace {
    pub(crate) dims: Vec<u64>,
    pub(crate) max_dims: Vec<Option<u64>>,
}

impl Dataspace {
    pub(crate) fn new(dims: Vec<u64>, max_dims: Vec<Option<u64>>) -> Result<Self, EngineError> {
        if dims.is_empty() {
            return Err(EngineError::InvalidArgument(
                "a simple dataspace must have at least one dimension".to_string(),
            ));
        }
        if dims.len() != max_dims.len() {
            return Err(EngineError::InvalidArgument(format!(
                "dataspace has {} dimensions but {} maximum dimensions",
                dims.len(),
                max_dims.len()
            )));
        }
        if dims
            .iter()
            .zip(&max_dims)
            .any(|(dim, max_dim)| max_dim.is_some_and(|max_dim| *dim > max_dim))
        {
            return Err(EngineError::InvalidArgument(format!(
                "dataspace dimensions {dims:?} exceed the maximum dimensions {max_dims:?}"
            )));
        }
        Ok(Self { dims, max_dims })
    }
}

/// Create a simple dataspace with extents `dims` and maximum extents `max_dims` ([`None`] is unlimited).
///
/// # Errors
/// Returns an [`EngineError`] if the rank is zero, the ranks differ, or an extent exceeds its maximum.
pub fn space_create_simple(dims: &[u64], max_dims: &[Option<u64>]) -> Result<Hid, EngineError> {
    let space = Dataspace::new(dims.to_vec(), max_dims.to_vec())?;
    Ok(registry::register(Object::Dataspace(space)))
}

/// Returns the rank of a dataspace.
///
/// # Errors
/// Returns an [`EngineError`] if `id` is not a dataspace.
pub fn space_ndims(id: Hid) -> Result<usize, EngineError> {
    Ok(registry::dataspace(id)?.dims.len())
}

/// Returns the extents of a dataspace.
///
/// # Errors
/// Returns an [`EngineError`] if `id` is not a dataspace.
pub fn space_dims(id: Hid) -> Result<Vec<u64>, EngineError> {
    Ok(registry::dataspace(id)?.dims)
}

/// Returns the maximum extents of a dataspace.
///
/// # Errors
/// Returns an [`EngineError`] if `id` is not a dataspace.
pub fn space_max_dims(id: Hid) -> Result<Vec<Option<u64>>, EngineError> {
    Ok(registry::dataspace(id)?.max_dims)
}

/// Close a dataspace.
///
/// # Errors
/// Returns an [`EngineError`] if `id` is not a dataspace.
pub fn space_close(id: Hid) -> Result<(), EngineError> {
    registry::unregister(id, ObjectKind::Dataspace).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataspace() {
        let space = space_create_simple(&[0, 2, 3], &[None, Some(2), Some(4)]).unwrap();
        assert_eq!(space_ndims(space).unwrap(), 3);
        assert_eq!(space_dims(space).unwrap(), vec![0, 2, 3]);
        assert_eq!(space_max_dims(space).unwrap(), vec![None, Some(2), Some(4)]);
        space_close(space).unwrap();
        assert!(space_close(space).is_err());
        assert!(space_dims(space).is_err());

        assert!(space_create_simple(&[], &[]).is_err());
        assert!(space_create_simple(&[2], &[None, None]).is_err());
        assert!(space_create_simple(&[3], &[Some(2)]).is_err());
    }
}
