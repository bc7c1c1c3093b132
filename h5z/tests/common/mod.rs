#![allow(dead_code)]

use std::{error::Error, path::Path};

use h5z::{DatasetOptions, EnumMapping, File, Shape};

/// The members of the `simple/enum` sample dataset.
pub fn sample_enum() -> EnumMapping<i32> {
    let mut mapping = EnumMapping::new();
    for (name, value) in [("A", 1), ("B", 2), ("C", 3)] {
        mapping.insert(name, value).expect("unique members");
    }
    mapping
}

/// Write the sample file to `path`:
/// - `simple/float_1`: `f32`, `{10}`, `i / 9`
/// - `simple/float_2`: `f32`, `{5, 10}`, `i / 4 - j / 9`
/// - `simple/int_1`: `i32`, `{10}`, `i`
/// - `simple/int_2`: `i32`, `{10, 5}`, `i - j`
/// - `simple/enum`: `i32` enum `{A: 1, B: 2, C: 3}`, `{5}`, `[1, 2, 3, 2, 1]`
/// - `simple/string`: strings, `{3}`
pub fn make_sample(path: &Path) -> Result<(), Box<dyn Error>> {
    let file = File::open(path, "w")?;
    let options = DatasetOptions::default();

    let float_1: Vec<f64> = (0..10).map(|i| f64::from(i) / 9.0).collect();
    file.dataset::<f32, 1>("simple/float_1")?
        .write(&float_1, &Shape::new([10]), &options)?;

    let float_2: Vec<f64> = (0..5)
        .flat_map(|i| (0..10).map(move |j| f64::from(i) / 4.0 - f64::from(j) / 9.0))
        .collect();
    file.dataset::<f32, 2>("simple/float_2")?
        .write(&float_2, &Shape::new([5, 10]), &options)?;

    let int_1: Vec<i32> = (0..10).collect();
    file.dataset::<i32, 1>("simple/int_1")?
        .write(&int_1, &Shape::new([10]), &options)?;

    let int_2: Vec<i32> = (0..10)
        .flat_map(|i| (0..5).map(move |j| i - j))
        .collect();
    file.dataset::<i32, 2>("simple/int_2")?
        .write(&int_2, &Shape::new([10, 5]), &options)?;

    file.dataset_with_enum::<i32, 1>("simple/enum", &sample_enum())?
        .write(&[1i32, 2, 3, 2, 1], &Shape::new([5]), &options)?;

    let strings = ["alpha", "beta", "gamma"].map(String::from);
    file.dataset::<String, 1>("simple/string")?
        .write(&strings, &Shape::new([3]), &options)?;
    Ok(())
}

/// A temporary directory holding a sample file.
pub struct Sample {
    pub dir: tempfile::TempDir,
}

impl Sample {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        let sample = Self {
            dir: tempfile::TempDir::new()?,
        };
        make_sample(&sample.path())?;
        Ok(sample)
    }

    pub fn path(&self) -> std::path::PathBuf {
        self.dir.path().join("sample.h5z")
    }
}

/// Deterministic values resembling normally distributed samples.
pub fn noise(len: usize) -> Vec<f64> {
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    (0..len)
        .map(|_| {
            let mut sum = 0.0;
            for _ in 0..4 {
                state = state
                    .wrapping_mul(6_364_136_223_846_793_005)
                    .wrapping_add(1_442_695_040_888_963_407);
                sum += (state >> 11) as f64 / (1u64 << 53) as f64;
            }
            (sum - 2.0) * 1.7
        })
        .collect()
}
