use h5z_engine::{Hid, link_exists};

use crate::H5Error;

/// Returns true if a node exists at `path` in `file`.
///
/// Ancestors are checked first, outermost last to innermost, so a missing ancestor yields `false`
/// instead of an engine failure.
///
/// # Errors
/// Returns [`H5Error::Resource`] if the engine cannot check a link, for example because an ancestor is
/// a dataset.
pub fn path_exists(file: Hid, path: &str) -> Result<bool, H5Error> {
    if let Some((parent, _)) = path.rsplit_once('/') {
        if !parent.is_empty() && !path_exists(file, parent)? {
            return Ok(false);
        }
    }
    link_exists(file, path).map_err(H5Error::resource(format!(
        "failed to check if {path} exists"
    )))
}

#[cfg(test)]
mod tests {
    use h5z_engine::{P_DEFAULT, file_close, file_create_in_memory, group_create};

    use super::*;

    #[test]
    fn path_exists_nested() {
        let file = file_create_in_memory().unwrap();
        group_create(file, "a", P_DEFAULT).unwrap();
        group_create(file, "a/b", P_DEFAULT).unwrap();
        assert!(path_exists(file, "a").unwrap());
        assert!(path_exists(file, "a/b").unwrap());
        assert!(path_exists(file, "/a/b").unwrap());
        assert!(!path_exists(file, "a/c").unwrap());
        assert!(!path_exists(file, "x/y/z").unwrap());
        file_close(file).unwrap();
    }

    #[test]
    fn path_exists_invalid_file() {
        assert!(matches!(
            path_exists(-5, "a"),
            Err(H5Error::Resource { .. })
        ));
    }
}
