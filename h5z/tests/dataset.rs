#![allow(missing_docs)]

mod common;

use std::error::Error;

use common::{Sample, noise};
use h5z::{DatasetOptions, ElementKind, File, H5Error, Shape, path_exists};

#[test]
fn dataset_open_existing() -> Result<(), Box<dyn Error>> {
    let sample = Sample::new()?;
    let file = File::open(sample.path(), "r")?;
    assert!(file.dataset::<f32, 1>("simple/float_1")?.handle() >= 0);
    assert!(file.dataset::<f32, 2>("simple/float_2")?.handle() >= 0);
    assert!(file.dataset::<i32, 1>("simple/int_1")?.handle() >= 0);
    assert!(file.dataset::<i32, 2>("simple/int_2")?.handle() >= 0);
    assert!(file.dataset::<String, 1>("simple/string")?.handle() >= 0);

    let missing = file.dataset::<f32, 1>("simple/missing")?;
    assert_eq!(missing.handle(), -1);
    assert!(!missing.is_bound());
    assert_eq!(missing.path(), "simple/missing");
    Ok(())
}

#[test]
fn dataset_read_sample() -> Result<(), Box<dyn Error>> {
    let sample = Sample::new()?;
    let file = File::open(sample.path(), "r")?;

    let float_1 = file.dataset::<f32, 1>("simple/float_1")?;
    assert_eq!(float_1.shape()?, Shape::new([10]));
    let mut values = vec![0.0f32; 10];
    float_1.read(&mut values, &Shape::new([10]))?;
    for (i, value) in values.iter().enumerate() {
        assert_eq!(*value, (i as f64 / 9.0) as f32);
    }

    let float_2 = file.dataset::<f32, 2>("simple/float_2")?;
    let mut values = vec![0.0f64; 50];
    float_2.read(&mut values, &Shape::new([5, 10]))?;
    assert_eq!(values[0], 0.0);
    assert!((values[10 * 4 + 9] - (1.0 - 1.0)).abs() < 1e-6);
    assert!((values[10 * 2 + 3] - (0.5 - 3.0 / 9.0)).abs() < 1e-6);
    Ok(())
}

#[test]
fn dataset_read_shape_mismatch() -> Result<(), Box<dyn Error>> {
    let sample = Sample::new()?;
    let file = File::open(sample.path(), "r")?;
    let int_2 = file.dataset::<i32, 2>("simple/int_2")?;

    let mut values = vec![0i32; 50];
    assert!(matches!(
        int_2.read(&mut values, &Shape::new([5, 10])),
        Err(H5Error::ShapeMismatch { .. })
    ));

    int_2.read(&mut values, &Shape::new([10, 5]))?;
    for i in 0..10 {
        for j in 0..5 {
            assert_eq!(values[i * 5 + j], i as i32 - j as i32);
        }
    }
    Ok(())
}

#[test]
fn dataset_create_converted() -> Result<(), Box<dyn Error>> {
    let sample = Sample::new()?;
    let data = noise(60);
    {
        let file = File::open(sample.path(), "r+")?;
        let mut dataset = file.dataset::<f32, 3>("simple/noise")?;
        assert!(!dataset.is_bound());
        dataset.write(&data, &Shape::new([10, 2, 3]), &DatasetOptions::default())?;
        assert!(dataset.is_bound());
        assert_eq!(dataset.shape()?, Shape::new([10, 2, 3]));
    }

    let file = File::open(sample.path(), "r")?;
    let dataset = file.dataset::<f32, 3>("simple/noise")?;
    let mut read = vec![0.0f64; 60];
    dataset.read(&mut read, &Shape::new([10, 2, 3]))?;
    for (read, expected) in read.iter().zip(&data) {
        assert!((read - expected).abs() <= 1e-6 * expected.abs().max(1.0));
    }
    Ok(())
}

#[test]
fn dataset_replace() -> Result<(), Box<dyn Error>> {
    let sample = Sample::new()?;
    let file = File::open(sample.path(), "r+")?;
    let mut dataset = file.dataset::<f32, 2>("simple/float_2")?;
    assert_eq!(dataset.shape()?, Shape::new([5, 10]));

    dataset.write(&noise(20), &Shape::new([10, 2]), &DatasetOptions::default())?;
    assert_eq!(dataset.shape()?, Shape::new([10, 2]));

    let large: Vec<f32> = (0..10_000u16).map(f32::from).collect();
    dataset.write(&large, &Shape::new([100, 100]), &DatasetOptions::default())?;
    assert_eq!(dataset.shape()?, Shape::new([100, 100]));

    let reopened = file.dataset::<f32, 2>("simple/float_2")?;
    let mut read = vec![0.0f32; 10_000];
    reopened.read(&mut read, &Shape::new([100, 100]))?;
    assert_eq!(read, large);
    Ok(())
}

#[test]
fn dataset_round_trip_scalars() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("scalars.h5z");
    {
        let file = File::open(&path, "w")?;
        let options = DatasetOptions::default();
        let one = Shape::new([1]);
        file.dataset::<i32, 1>("i32")?.write(&[12_345_678i32], &one, &options)?;
        file.dataset::<u32, 1>("u32")?.write(&[0x1234_5678u32], &one, &options)?;
        file.dataset::<f32, 1>("f32")?.write(&[1.23456f32], &one, &options)?;
        file.dataset::<f64, 1>("f64")?.write(&[1.234_567_890_123_45f64], &one, &options)?;
    }

    let file = File::open(&path, "r")?;
    let one = Shape::new([1]);
    let mut i = [0i32];
    file.dataset::<i32, 1>("i32")?.read(&mut i, &one)?;
    assert_eq!(i, [12_345_678]);
    let mut u = [0u32];
    file.dataset::<u32, 1>("u32")?.read(&mut u, &one)?;
    assert_eq!(u, [0x1234_5678]);
    let mut f = [0f32];
    file.dataset::<f32, 1>("f32")?.read(&mut f, &one)?;
    assert_eq!(f, [1.23456]);
    let mut d = [0f64];
    file.dataset::<f64, 1>("f64")?.read(&mut d, &one)?;
    assert_eq!(d, [1.234_567_890_123_45]);
    Ok(())
}

#[test]
fn dataset_round_trip_strings() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("strings.h5z");
    let strings = ["The quick brown fox", "jumps over", "the lazy dog", "."].map(String::from);
    {
        let file = File::open(&path, "w")?;
        file.dataset::<String, 1>("text")?
            .write(&strings, &Shape::new([4]), &DatasetOptions::default())?;
    }

    let file = File::open(&path, "r")?;
    let mut read = vec![String::new(); 4];
    file.dataset::<String, 1>("text")?
        .read(&mut read, &Shape::new([4]))?;
    assert_eq!(read, strings);

    let mut sample = vec![String::new(); 3];
    let sample_file = Sample::new()?;
    let file = File::open(sample_file.path(), "r")?;
    file.dataset::<String, 1>("simple/string")?
        .read(&mut sample, &Shape::new([3]))?;
    assert_eq!(sample, ["alpha", "beta", "gamma"]);
    Ok(())
}

#[test]
fn dataset_declaration_mismatch() -> Result<(), Box<dyn Error>> {
    let sample = Sample::new()?;
    let file = File::open(sample.path(), "r")?;
    assert!(matches!(
        file.dataset::<f32, 2>("simple/float_1"),
        Err(H5Error::RankMismatch {
            expected: 2,
            actual: 1
        })
    ));
    assert!(matches!(
        file.dataset::<i32, 1>("simple/int_2"),
        Err(H5Error::RankMismatch {
            expected: 1,
            actual: 2
        })
    ));
    assert!(matches!(
        file.dataset::<i32, 1>("simple/string"),
        Err(H5Error::TypeMismatch {
            expected: ElementKind::Int32
        })
    ));
    assert!(matches!(
        file.dataset::<String, 1>("simple/int_1"),
        Err(H5Error::TypeMismatch {
            expected: ElementKind::String
        })
    ));
    Ok(())
}

#[test]
fn dataset_intermediate_groups() -> Result<(), Box<dyn Error>> {
    let file = File::in_memory()?;
    assert!(!path_exists(file.handle(), "a/b")?);
    file.dataset::<u8, 1>("a/b/c/values")?
        .write(&[1u8, 2, 3], &Shape::new([3]), &DatasetOptions::default())?;
    assert!(path_exists(file.handle(), "a")?);
    assert!(path_exists(file.handle(), "a/b/c")?);
    assert!(path_exists(file.handle(), "a/b/c/values")?);

    file.dataset::<u8, 1>("a/b/other")?
        .write(&[4u8], &Shape::new([1]), &DatasetOptions::default())?;
    assert!(path_exists(file.handle(), "a/b/c/values")?);
    Ok(())
}

#[test]
fn dataset_filters_reduce_size() -> Result<(), Box<dyn Error>> {
    let data: Vec<f32> = (0..40_000u16).map(|i| f32::from(i % 100) * 0.5).collect();
    let shape = Shape::new([200, 200]);
    let size_with = |options: DatasetOptions| -> Result<u64, H5Error> {
        let file = File::in_memory()?;
        file.dataset::<f32, 2>("values")?
            .write(&data, &shape, &options)?;
        let mut read = vec![0.0f32; data.len()];
        file.dataset::<f32, 2>("values")?.read(&mut read, &shape)?;
        assert_eq!(read, data);
        file.size()
    };

    let plain = size_with(DatasetOptions::default())?;
    let compressed = size_with(DatasetOptions::new().with_compression(6))?;
    let scaled = size_with(DatasetOptions::new().with_scaleoffset(1))?;
    let both = size_with(DatasetOptions::new().with_compression(9).with_scaleoffset(1))?;
    assert!(plain > 160_000);
    assert!(compressed < plain);
    assert!(scaled < plain);
    assert!(both < plain);
    Ok(())
}

#[test]
fn dataset_invalid_options() -> Result<(), Box<dyn Error>> {
    let file = File::in_memory()?;
    let mut strings = file.dataset::<String, 1>("strings")?;
    assert!(matches!(
        strings.write(
            &[String::from("a")],
            &Shape::new([1]),
            &DatasetOptions::new().with_scaleoffset(2)
        ),
        Err(H5Error::Configuration(_))
    ));
    let mut values = file.dataset::<i16, 1>("values")?;
    assert!(matches!(
        values.write(
            &[1i16],
            &Shape::new([1]),
            &DatasetOptions::new().with_compression(10)
        ),
        Err(H5Error::Configuration(_))
    ));
    assert!(!strings.is_bound());
    assert!(!values.is_bound());
    Ok(())
}

#[test]
fn dataset_write_logs() -> Result<(), Box<dyn Error>> {
    let file = File::in_memory()?;
    let mut dataset = file.dataset::<i32, 1>("group/values")?;
    dataset.write(&[1i32], &Shape::new([1]), &DatasetOptions::default())?;

    testing_logger::setup();
    dataset.write(&[1i32, 2], &Shape::new([2]), &DatasetOptions::default())?;
    testing_logger::validate(|captured_logs| {
        assert!(
            captured_logs
                .iter()
                .any(|log| log.body == "unlinking group/values before writing")
        );
        assert!(
            captured_logs
                .iter()
                .any(|log| log.body.starts_with("creating dataset"))
        );
    });
    Ok(())
}
