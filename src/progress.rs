//! Byte-based progress tracking for dump reading.
//!
//! `ProgressReader` wraps the raw (possibly compressed) file so the bar
//! tracks bytes on disk, which is the only size known up front.

use indicatif::{ProgressBar, ProgressStyle};
use std::io::Read;

/// A reader wrapper that tracks bytes read and calls a progress callback.
pub struct ProgressReader<R: Read> {
    reader: R,
    callback: Box<dyn Fn(u64) + Send>,
    bytes_read: u64,
}

impl<R: Read> ProgressReader<R> {
    /// The callback receives the total bytes read so far after each read.
    pub fn new<F>(reader: R, callback: F) -> Self
    where
        F: Fn(u64) + Send + 'static,
    {
        Self {
            reader,
            callback: Box::new(callback),
            bytes_read: 0,
        }
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.reader.read(buf)?;
        self.bytes_read += n as u64;
        (self.callback)(self.bytes_read);
        Ok(n)
    }
}

/// Progress bar for reading a file of `total` bytes.
pub fn byte_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({percent}%) {msg}",
    ) {
        pb.set_style(style.progress_chars("█▓▒░  ").tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb
}

/// Spinner with a message, for phases with no known size.
pub fn phase_spinner(msg: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb.set_message(msg.into());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
