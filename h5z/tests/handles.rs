#![allow(missing_docs)]

use std::error::Error;

use h5z::{
    DatasetOptions, EnumMapping, File, H5Error, Shape, h5z_engine::object_count, string_type,
};

// The only test in this binary, so the process-wide object count is stable.
#[test]
fn dataset_validation_releases_handles() -> Result<(), Box<dyn Error>> {
    // The string datatype is created once and kept for the process
    string_type()?;
    let file = File::in_memory()?;
    file.dataset::<i32, 2>("values")?
        .write(&[0i32; 4], &Shape::new([2, 2]), &DatasetOptions::default())?;
    let open = object_count();

    assert!(matches!(
        file.dataset::<i32, 3>("values"),
        Err(H5Error::RankMismatch {
            expected: 3,
            actual: 2
        })
    ));
    assert_eq!(object_count(), open);

    assert!(matches!(
        file.dataset::<String, 2>("values"),
        Err(H5Error::TypeMismatch { .. })
    ));
    assert_eq!(object_count(), open);

    let mapping = EnumMapping::try_from([("A", 1i32)])?;
    assert!(matches!(
        file.dataset_with_enum::<i32, 2>("values", &mapping),
        Err(H5Error::EnumMismatch(_))
    ));
    assert_eq!(object_count(), open);

    {
        let dataset = file.dataset::<i32, 2>("values")?;
        assert!(dataset.is_bound());
        assert_eq!(object_count(), open + 1);
    }
    assert_eq!(object_count(), open);

    drop(file);
    assert_eq!(object_count(), open - 1);
    Ok(())
}
