//! Process-wide append-only log: an in-memory mirror plus a log file.
//!
//! Installed as a `tracing` writer by the binary and read back by `GET /log`.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing_subscriber::fmt::MakeWriter;

pub const LOG_FILE_NAME: &str = "backend.log";

#[derive(Debug, Default)]
pub struct LogSink {
    memory: Mutex<String>,
    file: Mutex<Option<File>>,
    path: Option<PathBuf>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panic mid-append leaves at worst a partial line.
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl LogSink {
    /// Memory-only sink
    pub fn in_memory() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Sink backed by `<dir>/backend.log`. If the file cannot be opened the
    /// sink still works from memory.
    pub fn open(dir: &Path) -> Arc<Self> {
        let path = dir.join(LOG_FILE_NAME);
        let file = std::fs::create_dir_all(dir)
            .and_then(|_| OpenOptions::new().create(true).append(true).open(&path))
            .ok();
        Arc::new(Self {
            memory: Mutex::new(String::new()),
            file: Mutex::new(file),
            path: Some(path),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn append(&self, text: &str) {
        lock(&self.memory).push_str(text);
        if let Some(file) = lock(&self.file).as_mut() {
            // File errors never reach the logger's caller
            let _ = file.write_all(text.as_bytes());
        }
    }

    /// Everything appended through this handle
    pub fn memory(&self) -> String {
        lock(&self.memory).clone()
    }

    /// Log file contents, or the in-memory mirror when the file is unavailable.
    pub async fn dump(&self) -> String {
        match &self.path {
            Some(path) => match tokio::fs::read(path).await {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(_) => self.memory(),
            },
            None => self.memory(),
        }
    }

    pub fn writer(self: &Arc<Self>) -> SinkWriter {
        SinkWriter(self.clone())
    }
}

/// `io::Write` / `MakeWriter` adapter over a shared [`LogSink`]
#[derive(Debug, Clone)]
pub struct SinkWriter(Arc<LogSink>);

impl Write for SinkWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.append(&String::from_utf8_lossy(buf));
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for SinkWriter {
    type Writer = SinkWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
