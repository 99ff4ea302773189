use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::RuntimeError;

enum Sink {
    Stdout,
    Buffer(Vec<u8>),
}

/// Where the printing primitives write. Clones share the same sink.
#[derive(Clone)]
pub struct Output(Arc<Mutex<Sink>>);

impl Output {
    pub fn stdout() -> Self {
        Self(Arc::new(Mutex::new(Sink::Stdout)))
    }

    /// An in-memory sink, read back with [`contents`](Self::contents).
    pub fn buffer() -> Self {
        Self(Arc::new(Mutex::new(Sink::Buffer(Vec::new()))))
    }

    pub fn write_str(&self, text: &str) -> Result<(), RuntimeError> {
        match &mut *self.0.lock() {
            Sink::Stdout => {
                let mut out = io::stdout().lock();
                out.write_all(text.as_bytes())
                    .and_then(|_| out.flush())
                    .map_err(|e| RuntimeError::Output(e.to_string()))
            }
            Sink::Buffer(buf) => {
                buf.extend_from_slice(text.as_bytes());
                Ok(())
            }
        }
    }

    /// Everything written so far. Empty for stdout.
    pub fn contents(&self) -> String {
        match &*self.0.lock() {
            Sink::Stdout => String::new(),
            Sink::Buffer(buf) => String::from_utf8_lossy(buf).into_owned(),
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::stdout()
    }
}
