//! `h5z` global configuration options.

use std::sync::OnceLock;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Global configuration options for the h5z crate.
///
/// Retrieve the global [`Config`] with [`global_config`] and modify it with [`global_config_mut`].
///
/// ## Stream Writer Batch Bytes
/// > default: `1048576` (1 MiB)
///
/// A [`StreamWriter`](crate::StreamWriter) flushes automatically once its buffered records occupy at
/// least this many bytes.
/// At least one record is always buffered.
///
/// ## Flush After Write
/// > default: [`true`]
///
/// If enabled, [`Dataset::write`](crate::Dataset::write) and stream writer flushes flush the file to
/// durable storage before returning.
#[derive(Debug)]
pub struct Config {
    stream_writer_batch_bytes: usize,
    flush_after_write: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stream_writer_batch_bytes: 1024 * 1024,
            flush_after_write: true,
        }
    }
}

impl Config {
    /// Get the [stream writer batch bytes](#stream-writer-batch-bytes) configuration.
    #[must_use]
    pub fn stream_writer_batch_bytes(&self) -> usize {
        self.stream_writer_batch_bytes
    }

    /// Set the [stream writer batch bytes](#stream-writer-batch-bytes) configuration.
    pub fn set_stream_writer_batch_bytes(&mut self, batch_bytes: usize) {
        self.stream_writer_batch_bytes = batch_bytes;
    }

    /// Get the [flush after write](#flush-after-write) configuration.
    #[must_use]
    pub fn flush_after_write(&self) -> bool {
        self.flush_after_write
    }

    /// Set the [flush after write](#flush-after-write) configuration.
    pub fn set_flush_after_write(&mut self, flush_after_write: bool) {
        self.flush_after_write = flush_after_write;
    }
}

static CONFIG: OnceLock<RwLock<Config>> = OnceLock::new();

/// Returns a reference to the global h5z configuration.
///
/// Deadlocks if the global config is already held mutably by the current thread.
pub fn global_config() -> RwLockReadGuard<'static, Config> {
    CONFIG.get_or_init(|| RwLock::new(Config::default())).read()
}

/// Returns a mutable reference to the global h5z configuration.
///
/// Deadlocks if the global config is already held by the current thread.
pub fn global_config_mut() -> RwLockWriteGuard<'static, Config> {
    CONFIG.get_or_init(|| RwLock::new(Config::default())).write()
}
