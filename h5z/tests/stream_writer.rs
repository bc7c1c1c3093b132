#![allow(missing_docs)]

mod common;

use std::error::Error;

use common::Sample;
use h5z::{DatasetOptions, File, H5Error, Shape, global_config_mut};
use serial_test::serial;

fn record(index: usize) -> Vec<f64> {
    (0..6).map(|i| (index * 6 + i) as f64 * 0.25).collect()
}

#[test]
#[serial]
fn stream_writer_binds_dataset() -> Result<(), Box<dyn Error>> {
    let file = File::in_memory()?;
    let mut dataset = file.dataset::<f32, 3>("streams/records")?;
    assert!(!dataset.is_bound());
    let writer = dataset.stream_writer::<f64, 2>(&Shape::new([2, 3]), &DatasetOptions::default())?;
    assert!(dataset.is_bound());
    assert_eq!(dataset.shape()?, Shape::new([0, 2, 3]));
    assert_eq!(writer.record_shape(), &Shape::new([2, 3]));
    assert_eq!(writer.records_written(), 0);
    assert_eq!(writer.buffered_records(), 0);
    Ok(())
}

#[test]
#[serial]
fn stream_writer_write_flush() -> Result<(), Box<dyn Error>> {
    let sample = Sample::new()?;
    {
        let file = File::open(sample.path(), "r+")?;
        let mut dataset = file.dataset::<f32, 3>("simple/stream")?;
        let mut writer =
            dataset.stream_writer::<f64, 2>(&Shape::new([2, 3]), &DatasetOptions::default())?;
        for index in 0..10 {
            writer.write(&record(index))?;
        }
        assert_eq!(writer.buffered_records(), 10);
        assert_eq!(dataset.shape()?, Shape::new([0, 2, 3]));
        writer.flush()?;
        assert_eq!(writer.buffered_records(), 0);
        assert_eq!(writer.records_written(), 10);
        assert_eq!(dataset.shape()?, Shape::new([10, 2, 3]));
    }

    let file = File::open(sample.path(), "r")?;
    let dataset = file.dataset::<f32, 3>("simple/stream")?;
    let mut read = vec![0.0f64; 60];
    dataset.read(&mut read, &Shape::new([10, 2, 3]))?;
    let expected: Vec<f64> = (0..10).flat_map(record).collect();
    assert_eq!(read, expected);
    Ok(())
}

#[test]
#[serial]
fn stream_writer_auto_flush() -> Result<(), Box<dyn Error>> {
    let record_bytes = 6 * std::mem::size_of::<f64>();
    global_config_mut().set_stream_writer_batch_bytes(4 * record_bytes);
    let result = (|| -> Result<(), Box<dyn Error>> {
        let file = File::in_memory()?;
        let mut dataset = file.dataset::<f32, 3>("records")?;
        let mut writer = dataset.stream_writer::<f64, 2>(
            &Shape::new([2, 3]),
            &DatasetOptions::new().with_compression(1),
        )?;
        for index in 0..10 {
            writer.write(&record(index))?;
            let written = (index + 1) / 4 * 4;
            assert_eq!(writer.records_written(), written as u64);
            assert_eq!(writer.buffered_records(), index + 1 - written);
        }
        assert_eq!(dataset.shape()?, Shape::new([8, 2, 3]));
        drop(writer);
        assert_eq!(dataset.shape()?, Shape::new([10, 2, 3]));
        Ok(())
    })();
    global_config_mut().set_stream_writer_batch_bytes(1024 * 1024);
    result
}

#[test]
#[serial]
fn stream_writer_append() -> Result<(), Box<dyn Error>> {
    let sample = Sample::new()?;
    {
        let file = File::open(sample.path(), "r+")?;
        let mut dataset = file.dataset::<f32, 3>("simple/stream")?;
        let mut writer =
            dataset.stream_writer::<f64, 2>(&Shape::new([2, 3]), &DatasetOptions::default())?;
        for index in 0..3 {
            writer.write(&record(index))?;
        }
    }
    {
        let file = File::open(sample.path(), "r+")?;
        let mut dataset = file.dataset::<f32, 3>("simple/stream")?;
        assert_eq!(dataset.shape()?, Shape::new([3, 2, 3]));
        let mut writer =
            dataset.stream_writer::<f64, 2>(&Shape::new([2, 3]), &DatasetOptions::default())?;
        assert_eq!(writer.records_written(), 3);
        for index in 3..5 {
            writer.write(&record(index))?;
        }
        writer.flush()?;
        assert_eq!(writer.records_written(), 5);
    }

    let file = File::open(sample.path(), "r")?;
    let mut read = vec![0.0f64; 30];
    file.dataset::<f32, 3>("simple/stream")?
        .read(&mut read, &Shape::new([5, 2, 3]))?;
    let expected: Vec<f64> = (0..5).flat_map(record).collect();
    assert_eq!(read, expected);
    Ok(())
}

#[test]
#[serial]
fn stream_writer_shape_mismatch() -> Result<(), Box<dyn Error>> {
    let file = File::in_memory()?;
    let mut dataset = file.dataset::<f32, 3>("records")?;
    let mut writer =
        dataset.stream_writer::<f64, 2>(&Shape::new([2, 3]), &DatasetOptions::default())?;
    assert!(matches!(
        writer.write(&[0.0; 5]),
        Err(H5Error::ShapeMismatch { .. })
    ));
    assert!(matches!(
        writer.write(&[0.0; 7]),
        Err(H5Error::ShapeMismatch { .. })
    ));
    assert_eq!(writer.buffered_records(), 0);
    drop(writer);

    assert!(matches!(
        dataset.stream_writer::<f64, 2>(&Shape::new([3, 2]), &DatasetOptions::default()),
        Err(H5Error::ShapeMismatch { .. })
    ));
    Ok(())
}

#[test]
#[serial]
fn stream_writer_fixed_dataset() -> Result<(), Box<dyn Error>> {
    let file = File::in_memory()?;
    let mut dataset = file.dataset::<i32, 2>("fixed")?;
    dataset.write(&[0i32; 8], &Shape::new([4, 2]), &DatasetOptions::default())?;
    assert!(matches!(
        dataset.stream_writer::<i32, 1>(&Shape::new([2]), &DatasetOptions::default()),
        Err(H5Error::Configuration(_))
    ));
    assert!(matches!(
        dataset.stream_writer::<String, 1>(&Shape::new([2]), &DatasetOptions::default()),
        Err(H5Error::TypeMismatch { .. })
    ));
    Ok(())
}

#[test]
#[serial]
fn stream_writer_strings() -> Result<(), Box<dyn Error>> {
    let file = File::in_memory()?;
    let mut dataset = file.dataset::<String, 2>("log")?;
    {
        let mut writer =
            dataset.stream_writer::<String, 1>(&Shape::new([2]), &DatasetOptions::default())?;
        writer.write(&["start".to_string(), "ok".to_string()])?;
        writer.write(&["stop".to_string(), "done".to_string()])?;
    }
    let mut read = Vec::<[String; 2]>::new();
    dataset.read_fit(&mut read)?;
    assert_eq!(
        read,
        [
            ["start".to_string(), "ok".to_string()],
            ["stop".to_string(), "done".to_string()]
        ]
    );
    Ok(())
}
