//! Scoped ownership of engine resource identifiers.

use std::{fmt, marker::PhantomData};

use h5z_engine::{EngineError, Hid};

/// Releases one kind of engine resource.
pub trait Release {
    /// The resource kind, used in log messages.
    const KIND: &'static str;

    /// Release the resource identified by `hid`.
    ///
    /// # Errors
    /// Returns an [`EngineError`] if the engine rejects the release.
    fn release(hid: Hid) -> Result<(), EngineError>;
}

macro_rules! release_marker {
    ($name:ident, $kind:literal, $close:path) => {
        #[doc = concat!("Releases a ", $kind, " with [`", stringify!($close), "`].")]
        #[derive(Debug)]
        pub struct $name;

        impl Release for $name {
            const KIND: &'static str = $kind;

            fn release(hid: Hid) -> Result<(), EngineError> {
                $close(hid)
            }
        }
    };
}

release_marker!(FileRelease, "file", h5z_engine::file_close);
release_marker!(DatasetRelease, "dataset", h5z_engine::dataset_close);
release_marker!(DataspaceRelease, "dataspace", h5z_engine::space_close);
release_marker!(DatatypeRelease, "datatype", h5z_engine::type_close);
release_marker!(PropertyListRelease, "property list", h5z_engine::plist_close);

/// An owned engine resource identifier, released exactly once.
///
/// A negative identifier means the handle is empty.
/// The resource is released when the handle is dropped; release failures are logged, not propagated.
/// Call [`UniqueHid::release`] to observe them.
pub struct UniqueHid<R: Release> {
    hid: Hid,
    _release: PhantomData<fn() -> R>,
}

impl<R: Release> UniqueHid<R> {
    /// Returns the identifier, or `-1` if the handle is empty.
    #[must_use]
    pub fn hid(&self) -> Hid {
        self.hid
    }

    /// Returns true if the handle holds no resource.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hid < 0
    }

    /// Moves the resource out, leaving this handle empty.
    #[must_use]
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    /// Exchanges the resources of two handles.
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(&mut self.hid, &mut other.hid);
    }

    /// Releases the resource now, leaving the handle empty.
    ///
    /// # Errors
    /// Returns an [`EngineError`] if the engine rejects the release.
    pub fn release(&mut self) -> Result<(), EngineError> {
        let hid = std::mem::replace(&mut self.hid, -1);
        if hid >= 0 { R::release(hid) } else { Ok(()) }
    }

    /// Gives up ownership of the identifier without releasing it.
    #[must_use]
    pub fn into_raw(mut self) -> Hid {
        std::mem::replace(&mut self.hid, -1)
    }
}

impl<R: Release> Default for UniqueHid<R> {
    fn default() -> Self {
        Self {
            hid: -1,
            _release: PhantomData,
        }
    }
}

impl<R: Release> From<Hid> for UniqueHid<R> {
    fn from(hid: Hid) -> Self {
        Self {
            hid: hid.max(-1),
            _release: PhantomData,
        }
    }
}

impl<R: Release> PartialEq<Hid> for UniqueHid<R> {
    fn eq(&self, other: &Hid) -> bool {
        self.hid == *other
    }
}

impl<R: Release> fmt::Debug for UniqueHid<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UniqueHid<{}>({})", R::KIND, self.hid)
    }
}

impl<R: Release> Drop for UniqueHid<R> {
    fn drop(&mut self) {
        let hid = self.hid;
        if let Err(err) = self.release() {
            log::warn!("failed to release {} {hid}: {err}", R::KIND);
        }
    }
}
