use crate::{
    EngineError, Filter, Hid, P_DEFAULT, ScaleType,
    registry::{self, Object, ObjectKind},
};

/// The class of a property list.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PropertyListClass {
    /// Link creation properties.
    LinkCreate,
    /// Dataset creation properties.
    DatasetCreate,
}

#[derive(Clone, Debug)]
pub(crate) enum PropertyList {
    LinkCreate { create_intermediate_group: bool },
    DatasetCreate(DatasetCreateProperties),
}

/// Dataset creation properties.
#[derive(Clone, Debug, Default)]
pub(crate) struct DatasetCreateProperties {
    pub(crate) chunk: Option<Vec<u64>>,
    pub(crate) filters: Vec<Filter>,
}

/// Create a property list with default properties.
#[must_use]
pub fn plist_create(class: PropertyListClass) -> Hid {
    let plist = match class {
        PropertyListClass::LinkCreate => PropertyList::LinkCreate {
            create_intermediate_group: false,
        },
        PropertyListClass::DatasetCreate => {
            PropertyList::DatasetCreate(DatasetCreateProperties::default())
        }
    };
    registry::register(Object::PropertyList(plist))
}

fn with_dataset_create<R>(
    id: Hid,
    f: impl FnOnce(&mut DatasetCreateProperties) -> Result<R, EngineError>,
) -> Result<R, EngineError> {
    registry::plist_mut(id, |plist| match plist {
        PropertyList::DatasetCreate(properties) => f(properties),
        PropertyList::LinkCreate { .. } => Err(EngineError::InvalidArgument(format!(
            "property list {id} is not a dataset creation property list"
        ))),
    })
}

/// Set whether missing intermediate groups are created with a link.
///
/// # Errors
/// Returns an [`EngineError`] if `id` is not a link creation property list.
pub fn plist_set_create_intermediate_group(id: Hid, create: bool) -> Result<(), EngineError> {
    registry::plist_mut(id, |plist| match plist {
        PropertyList::LinkCreate {
            create_intermediate_group,
        } => {
            *create_intermediate_group = create;
            Ok(())
        }
        PropertyList::DatasetCreate(_) => Err(EngineError::InvalidArgument(format!(
            "property list {id} is not a link creation property list"
        ))),
    })
}

/// Set the chunk shape, selecting a chunked layout.
///
/// # Errors
/// Returns an [`EngineError`] if `id` is not a dataset creation property list or `chunk` is empty or
/// has a zero extent.
pub fn plist_set_chunk(id: Hid, chunk: &[u64]) -> Result<(), EngineError> {
    if chunk.is_empty() || chunk.contains(&0) {
        return Err(EngineError::InvalidArgument(format!(
            "invalid chunk shape {chunk:?}"
        )));
    }
    with_dataset_create(id, |properties| {
        properties.chunk = Some(chunk.to_vec());
        Ok(())
    })
}

/// Append the shuffle filter.
///
/// # Errors
/// Returns an [`EngineError`] if `id` is not a dataset creation property list.
pub fn plist_set_shuffle(id: Hid) -> Result<(), EngineError> {
    with_dataset_create(id, |properties| {
        properties.filters.push(Filter::Shuffle);
        Ok(())
    })
}

/// Append the deflate filter with compression `level`.
///
/// # Errors
/// Returns an [`EngineError`] if `id` is not a dataset creation property list or `level` exceeds 9.
pub fn plist_set_deflate(id: Hid, level: u32) -> Result<(), EngineError> {
    if level > 9 {
        return Err(EngineError::InvalidArgument(format!(
            "invalid deflate level {level}, expected 0-9"
        )));
    }
    with_dataset_create(id, |properties| {
        properties.filters.push(Filter::Deflate { level });
        Ok(())
    })
}

/// Append the scale-offset filter.
///
/// # Errors
/// Returns an [`EngineError`] if `id` is not a dataset creation property list.
pub fn plist_set_scaleoffset(id: Hid, scale_type: ScaleType, factor: i32) -> Result<(), EngineError> {
    with_dataset_create(id, |properties| {
        properties.filters.push(Filter::ScaleOffset { scale_type, factor });
        Ok(())
    })
}

/// Close a property list.
///
/// # Errors
/// Returns an [`EngineError`] if `id` is not a property list.
pub fn plist_close(id: Hid) -> Result<(), EngineError> {
    registry::unregister(id, ObjectKind::PropertyList).map(|_| ())
}

/// Whether links created with `lcpl` create missing intermediate groups.
pub(crate) fn create_intermediate_group(lcpl: Hid) -> Result<bool, EngineError> {
    if lcpl == P_DEFAULT {
        return Ok(false);
    }
    match registry::plist(lcpl)? {
        PropertyList::LinkCreate {
            create_intermediate_group,
        } => Ok(create_intermediate_group),
        PropertyList::DatasetCreate(_) => Err(EngineError::InvalidArgument(format!(
            "property list {lcpl} is not a link creation property list"
        ))),
    }
}

/// The dataset creation properties of `dcpl`.
pub(crate) fn dataset_create_properties(dcpl: Hid) -> Result<DatasetCreateProperties, EngineError> {
    if dcpl == P_DEFAULT {
        return Ok(DatasetCreateProperties::default());
    }
    match registry::plist(dcpl)? {
        PropertyList::DatasetCreate(properties) => Ok(properties),
        PropertyList::LinkCreate { .. } => Err(EngineError::InvalidArgument(format!(
            "property list {dcpl} is not a dataset creation property list"
        ))),
    }
}
