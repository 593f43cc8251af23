use std::io::{self, Write};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Inner {
    written: Vec<u8>,
    attempts: usize,
    fail_after: Option<usize>,
}

/// In-memory stand-in for a serial port, used in tests to capture records
/// and script write failures. Clones share the same buffer.
#[derive(Clone, Default)]
pub struct FakeSerialPort {
    inner: Arc<Mutex<Inner>>,
}

impl FakeSerialPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts `ok_writes` writes, then fails every write after that.
    pub fn failing_after(ok_writes: usize) -> Self {
        let fake = Self::default();
        if let Ok(mut inner) = fake.inner.lock() {
            inner.fail_after = Some(ok_writes);
        }
        fake
    }

    /// Lines written so far, without terminators.
    pub fn lines(&self) -> Vec<String> {
        let raw = self.raw();
        let text = String::from_utf8_lossy(&raw);
        text.split_terminator('\n').map(str::to_string).collect()
    }

    pub fn raw(&self) -> Vec<u8> {
        self.inner.lock().map(|i| i.written.clone()).unwrap_or_default()
    }

    pub fn write_attempts(&self) -> usize {
        self.inner.lock().map(|i| i.attempts).unwrap_or(0)
    }
}

impl Write for FakeSerialPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "fake port poisoned"))?;
        inner.attempts += 1;
        if let Some(limit) = inner.fail_after {
            if inner.attempts > limit {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device disconnected"));
            }
        }
        inner.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
