//! The byte sink boundary.
//!
//! A sink receives one finished, newline-terminated record per log call in a
//! single `write_record` call. Everything behind that call (console
//! pretty-printing, files, network transports, retry policy) is the sink's
//! concern, not this core's. The implementations here are the minimal
//! boundary set: process streams, a generic adapter over any `io::Write`,
//! and an in-memory capture for tests.

use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;

/// Destination for finished records.
///
/// Takes `&self` because one sink is shared by every clone of a logger;
/// implementations synchronize internally.
pub trait Sink: Send + Sync {
    /// Write one complete record, returning how many bytes were accepted.
    fn write_record(&self, record: &[u8]) -> io::Result<usize>;
}

/// Sink writing records to standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl Sink for StdoutSink {
    fn write_record(&self, record: &[u8]) -> io::Result<usize> {
        let mut out = io::stdout().lock();
        out.write_all(record)?;
        Ok(record.len())
    }
}

/// Sink writing records to standard error.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrSink;

impl Sink for StderrSink {
    fn write_record(&self, record: &[u8]) -> io::Result<usize> {
        let mut out = io::stderr().lock();
        out.write_all(record)?;
        Ok(record.len())
    }
}

/// Adapter turning any `io::Write` into a sink by serializing access
/// through a mutex.
#[derive(Debug)]
pub struct SyncWriter<W> {
    inner: Mutex<W>,
}

impl<W: Write + Send> SyncWriter<W> {
    /// Wrap a writer.
    pub fn new(writer: W) -> Self {
        Self {
            inner: Mutex::new(writer),
        }
    }
}

impl<W: Write + Send> Sink for SyncWriter<W> {
    fn write_record(&self, record: &[u8]) -> io::Result<usize> {
        let mut writer = self.inner.lock();
        writer.write_all(record)?;
        Ok(record.len())
    }
}

#[derive(Debug, Default)]
struct CaptureState {
    bytes: Vec<u8>,
    writes: usize,
}

/// In-memory sink recording every record and the number of writes.
///
/// Cloning shares the underlying storage, so a test can keep one handle
/// while the logger owns another.
#[derive(Debug, Default, Clone)]
pub struct CaptureSink {
    state: Arc<Mutex<CaptureState>>,
}

impl CaptureSink {
    /// Create an empty capture sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, as UTF-8.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.state.lock().bytes).into_owned()
    }

    /// Number of `write_record` calls observed.
    pub fn write_count(&self) -> usize {
        self.state.lock().writes
    }

    /// Discard captured records.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.bytes.clear();
        state.writes = 0;
    }
}

impl Sink for CaptureSink {
    fn write_record(&self, record: &[u8]) -> io::Result<usize> {
        let mut state = self.state.lock();
        state.bytes.extend_from_slice(record);
        state.writes += 1;
        Ok(record.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_sink_records_writes() {
        let sink = CaptureSink::new();
        let shared = sink.clone();
        sink.write_record(b"{\"a\":1}\n").unwrap();
        sink.write_record(b"{\"b\":2}\n").unwrap();
        assert_eq!(shared.write_count(), 2);
        assert_eq!(shared.contents(), "{\"a\":1}\n{\"b\":2}\n");
        shared.clear();
        assert_eq!(sink.write_count(), 0);
    }

    #[test]
    fn test_sync_writer_over_vec() {
        let sink = SyncWriter::new(Vec::new());
        assert_eq!(sink.write_record(b"abc").unwrap(), 3);
        assert_eq!(&*sink.inner.lock(), b"abc");
    }
}
