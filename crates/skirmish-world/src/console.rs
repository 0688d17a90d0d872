//! Serialized console sink.
//!
//! Every worker writes status text through one mutex so lines from
//! different threads never interleave.

use parking_lot::Mutex;
use std::fmt;
use std::io::{self, Write};
use tracing::warn;

pub struct Console {
    out: Mutex<Box<dyn Write + Send>>,
}

impl Console {
    pub fn stdout() -> Self {
        Self::with_writer(io::stdout())
    }

    /// Discard all output
    pub fn sink() -> Self {
        Self::with_writer(io::sink())
    }

    pub fn with_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            out: Mutex::new(Box::new(writer)),
        }
    }

    /// Write a single line.
    pub fn line(&self, message: &str) {
        self.write_block(|out| writeln!(out, "{}", message));
    }

    /// Write several lines while holding the console lock once.
    pub fn write_block<F>(&self, f: F)
    where
        F: FnOnce(&mut dyn Write) -> io::Result<()>,
    {
        let mut out = self.out.lock();
        let result = f(&mut **out).and_then(|_| out.flush());
        if let Err(e) = result {
            warn!("Console write failed: {}", e);
        }
    }
}

impl fmt::Debug for Console {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Console").finish_non_exhaustive()
    }
}

/// In-memory writer that can be cloned and inspected.
#[derive(Debug, Clone, Default)]
pub struct CaptureBuffer {
    bytes: std::sync::Arc<Mutex<Vec<u8>>>,
}

impl CaptureBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock()).into_owned()
    }
}

impl Write for CaptureBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
