//! The process-wide object table.

use std::{collections::HashMap, fmt, sync::Arc, sync::LazyLock};

use parking_lot::Mutex;

use crate::{
    EngineError, Hid, dataset::DatasetObject, dataspace::Dataspace, datatype::Datatype,
    file::FileObject, plist::PropertyList,
};

/// Identifiers below this value are reserved for predefined objects.
const FIRST_ID: Hid = 1 << 16;

/// The kind of object an identifier refers to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// A file.
    File,
    /// A dataset.
    Dataset,
    /// A dataspace.
    Dataspace,
    /// A datatype.
    Datatype,
    /// A property list.
    PropertyList,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::File => "file",
            Self::Dataset => "dataset",
            Self::Dataspace => "dataspace",
            Self::Datatype => "datatype",
            Self::PropertyList => "property list",
        })
    }
}

pub(crate) enum Object {
    File(Arc<FileObject>),
    Dataset(DatasetObject),
    Dataspace(Dataspace),
    Datatype { datatype: Datatype, locked: bool },
    PropertyList(PropertyList),
}

impl Object {
    fn kind(&self) -> ObjectKind {
        match self {
            Self::File(_) => ObjectKind::File,
            Self::Dataset(_) => ObjectKind::Dataset,
            Self::Dataspace(_) => ObjectKind::Dataspace,
            Self::Datatype { .. } => ObjectKind::Datatype,
            Self::PropertyList(_) => ObjectKind::PropertyList,
        }
    }
}

struct Registry {
    next_id: Hid,
    objects: HashMap<Hid, Object>,
}

static REGISTRY: LazyLock<Mutex<Registry>> = LazyLock::new(|| {
    Mutex::new(Registry {
        next_id: FIRST_ID,
        objects: HashMap::new(),
    })
});

/// Returns true if `id` refers to an open object or a predefined datatype.
#[must_use]
pub fn is_valid(id: Hid) -> bool {
    crate::datatype::predefined(id).is_some() || REGISTRY.lock().objects.contains_key(&id)
}

/// Returns the number of open objects, excluding predefined datatypes.
#[must_use]
pub fn object_count() -> usize {
    REGISTRY.lock().objects.len()
}

pub(crate) fn register(object: Object) -> Hid {
    let mut registry = REGISTRY.lock();
    let id = registry.next_id;
    registry.next_id += 1;
    registry.objects.insert(id, object);
    id
}

pub(crate) fn unregister(id: Hid, expected: ObjectKind) -> Result<Object, EngineError> {
    let mut registry = REGISTRY.lock();
    let kind = registry
        .objects
        .get(&id)
        .map(Object::kind)
        .ok_or(EngineError::InvalidId(id))?;
    if kind != expected {
        return Err(EngineError::WrongKind { id, expected });
    }
    registry.objects.remove(&id).ok_or(EngineError::InvalidId(id))
}

fn with_object<R>(
    id: Hid,
    expected: ObjectKind,
    f: impl FnOnce(&mut Object) -> Option<R>,
) -> Result<R, EngineError> {
    let mut registry = REGISTRY.lock();
    let object = registry
        .objects
        .get_mut(&id)
        .ok_or(EngineError::InvalidId(id))?;
    f(object).ok_or(EngineError::WrongKind { id, expected })
}

pub(crate) fn file(id: Hid) -> Result<Arc<FileObject>, EngineError> {
    with_object(id, ObjectKind::File, |object| match object {
        Object::File(file) => Some(file.clone()),
        _ => None,
    })
}

pub(crate) fn dataset(id: Hid) -> Result<DatasetObject, EngineError> {
    with_object(id, ObjectKind::Dataset, |object| match object {
        Object::Dataset(dataset) => Some(dataset.clone()),
        _ => None,
    })
}

pub(crate) fn dataspace(id: Hid) -> Result<Dataspace, EngineError> {
    with_object(id, ObjectKind::Dataspace, |object| match object {
        Object::Dataspace(space) => Some(space.clone()),
        _ => None,
    })
}

pub(crate) fn datatype(id: Hid) -> Result<Datatype, EngineError> {
    if let Some(datatype) = crate::datatype::predefined(id) {
        return Ok(datatype);
    }
    with_object(id, ObjectKind::Datatype, |object| match object {
        Object::Datatype { datatype, .. } => Some(datatype.clone()),
        _ => None,
    })
}

/// Modify an unlocked datatype in place.
pub(crate) fn datatype_mut<R>(
    id: Hid,
    f: impl FnOnce(&mut Datatype) -> Result<R, EngineError>,
) -> Result<R, EngineError> {
    if crate::datatype::predefined(id).is_some() {
        return Err(EngineError::InvalidArgument(format!(
            "predefined datatype {id} cannot be modified"
        )));
    }
    with_object(id, ObjectKind::Datatype, |object| match object {
        Object::Datatype {
            datatype,
            locked: false,
        } => Some(f(datatype)),
        Object::Datatype { locked: true, .. } => Some(Err(EngineError::InvalidArgument(
            format!("datatype {id} is locked"),
        ))),
        _ => None,
    })?
}

pub(crate) fn lock_datatype(id: Hid) -> Result<(), EngineError> {
    with_object(id, ObjectKind::Datatype, |object| match object {
        Object::Datatype { locked, .. } => {
            *locked = true;
            Some(())
        }
        _ => None,
    })
}

pub(crate) fn plist(id: Hid) -> Result<PropertyList, EngineError> {
    with_object(id, ObjectKind::PropertyList, |object| match object {
        Object::PropertyList(plist) => Some(plist.clone()),
        _ => None,
    })
}

pub(crate) fn plist_mut<R>(
    id: Hid,
    f: impl FnOnce(&mut PropertyList) -> Result<R, EngineError>,
) -> Result<R, EngineError> {
    with_object(id, ObjectKind::PropertyList, |object| match object {
        Object::PropertyList(plist) => Some(f(plist)),
        _ => None,
    })?
}
