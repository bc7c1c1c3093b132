use h5z_engine::{dataset_open, dataset_set_extent, dataset_write_hyperslab};

use crate::{
    File, H5Error, NativeElement, Shape,
    dataset::dataset_extents,
    global_config,
    hid::{DatasetRelease, UniqueHid},
    native_type,
};

/// Appends records of rank `RECORD_RANK` with elements of `T` along the leading axis of a dataset.
///
/// Records are buffered and written in batches by [`flush`](StreamWriter::flush), which happens
/// automatically once the buffer reaches the
/// [stream writer batch bytes](crate::config::Config#stream-writer-batch-bytes) and when the writer is
/// dropped.
/// Buffered records are not visible to readers until flushed.
/// A writer dropped while panicking does not flush, and a flush failure on drop is only logged; call
/// [`flush`](StreamWriter::flush) to observe it.
///
/// Obtain a writer with [`Dataset::stream_writer`](crate::Dataset::stream_writer).
pub struct StreamWriter<'f, T: NativeElement, const RECORD_RANK: usize> {
    file: &'f File,
    path: String,
    dataset: UniqueHid<DatasetRelease>,
    record_shape: Shape<RECORD_RANK>,
    buffer: Vec<T>,
    buffered_records: usize,
    records_written: u64,
    batch_records: usize,
}

impl<'f, T: NativeElement, const RECORD_RANK: usize> StreamWriter<'f, T, RECORD_RANK> {
    pub(crate) fn new(
        file: &'f File,
        path: &str,
        record_shape: &Shape<RECORD_RANK>,
    ) -> Result<Self, H5Error> {
        let dataset = UniqueHid::<DatasetRelease>::from(
            dataset_open(file.handle(), path)
                .map_err(H5Error::resource(format!("failed to open dataset {path}")))?,
        );
        let extents = dataset_extents(dataset.hid())?;
        let record_extents = record_shape.to_extents();
        if extents.dims.get(1..) != Some(record_extents.as_slice()) {
            return Err(H5Error::ShapeMismatch {
                expected: record_shape.dims().to_vec(),
                actual: extents
                    .dims
                    .iter()
                    .skip(1)
                    .map(|&dim| usize::try_from(dim).unwrap_or(usize::MAX))
                    .collect(),
            });
        }
        let (Some(&records_written), Some(None)) = (extents.dims.first(), extents.max_dims.first())
        else {
            return Err(H5Error::Configuration(format!(
                "dataset {path} cannot grow along its leading axis"
            )));
        };

        let record_bytes = record_shape.size() * std::mem::size_of::<T>();
        let batch_records = (global_config().stream_writer_batch_bytes() / record_bytes.max(1)).max(1);
        log::debug!(
            "streaming records of shape {record_shape} to {path} after {records_written} records"
        );
        Ok(Self {
            file,
            path: path.to_string(),
            dataset,
            record_shape: *record_shape,
            buffer: Vec::with_capacity(batch_records.min(1024) * record_shape.size()),
            buffered_records: 0,
            records_written,
            batch_records,
        })
    }

    /// Returns the record shape.
    #[must_use]
    pub fn record_shape(&self) -> &Shape<RECORD_RANK> {
        &self.record_shape
    }

    /// Returns the number of records in the dataset, excluding buffered records.
    #[must_use]
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Returns the number of records not yet flushed.
    #[must_use]
    pub fn buffered_records(&self) -> usize {
        self.buffered_records
    }

    /// Buffer one record, flushing if the batch is full.
    ///
    /// # Errors
    /// Returns [`H5Error::ShapeMismatch`] if `record` does not hold exactly one record, or an error from
    /// an automatic [`flush`](StreamWriter::flush).
    pub fn write(&mut self, record: &[T]) -> Result<(), H5Error> {
        if record.len() != self.record_shape.size() {
            return Err(H5Error::ShapeMismatch {
                expected: self.record_shape.dims().to_vec(),
                actual: vec![record.len()],
            });
        }
        self.buffer.extend_from_slice(record);
        self.buffered_records += 1;
        if self.buffered_records >= self.batch_records {
            self.flush()?;
        }
        Ok(())
    }

    /// Extend the dataset by the buffered records and write them.
    ///
    /// # Errors
    /// Returns [`H5Error::Resource`] if the dataset cannot be extended or written, or the file cannot
    /// be flushed.
    pub fn flush(&mut self) -> Result<(), H5Error> {
        if self.buffered_records == 0 {
            return Ok(());
        }
        let count = self.buffered_records as u64;
        let mut start = vec![0; RECORD_RANK + 1];
        start[0] = self.records_written;
        let mut extents = vec![count];
        extents.extend(self.record_shape.to_extents());

        let mut dims = extents.clone();
        dims[0] += self.records_written;
        dataset_set_extent(self.dataset.hid(), &dims)
            .map_err(H5Error::resource(format!("failed to extend dataset {}", self.path)))?;
        dataset_write_hyperslab(
            self.dataset.hid(),
            native_type(T::KIND)?,
            &start,
            &extents,
            T::mem_buf(&self.buffer),
        )
        .map_err(H5Error::resource(format!("failed to write to dataset {}", self.path)))?;
        log::trace!(
            "appended {count} records to {} after {}",
            self.path,
            self.records_written
        );

        self.records_written += count;
        self.buffered_records = 0;
        self.buffer.clear();
        if global_config().flush_after_write() {
            self.file.flush()?;
        }
        Ok(())
    }
}

impl<T: NativeElement, const RECORD_RANK: usize> Drop for StreamWriter<'_, T, RECORD_RANK> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            return;
        }
        if let Err(err) = self.flush() {
            log::warn!(
                "failed to flush {} buffered records to {}: {err}",
                self.buffered_records,
                self.path
            );
        }
    }
}
