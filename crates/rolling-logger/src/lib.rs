//! Rolling Logger
//!
//! Installs a `tracing` subscriber that writes to stderr and to a size-capped
//! log file rotating into numbered backups (`app.log`, `app.log.1`, ...).
//! The most recent lines are also kept in a circular buffer so the app can
//! show them without reading the file. `log` records are forwarded through
//! the tracing-log bridge, so crates using either facade end up here.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use chrono::Utc;
use thiserror::Error;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_MAX_BYTES: u64 = 1024 * 1024;
pub const DEFAULT_MAX_FILES: usize = 3;
pub const DEFAULT_RING_LINES: usize = 500;

static RECENT: OnceLock<Arc<Mutex<RecentLines>>> = OnceLock::new();

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("log file error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid log filter '{filter}': {reason}")]
    Filter { filter: String, reason: String },
    #[error("a global logger is already installed")]
    AlreadyInitialized,
    #[error("logger not initialized")]
    NotInitialized,
}

#[derive(Debug, Clone)]
pub struct LoggerOptions {
    pub app_name: String,
    /// No file output when unset
    pub log_dir: Option<PathBuf>,
    /// env-filter directive, e.g. `info` or `live_todo=debug`
    pub filter: String,
    pub max_bytes: u64,
    /// Rotated backups kept next to the active file
    pub max_files: usize,
    pub ring_lines: usize,
    pub stderr: bool,
}

impl LoggerOptions {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            log_dir: None,
            filter: "info".to_string(),
            max_bytes: DEFAULT_MAX_BYTES,
            max_files: DEFAULT_MAX_FILES,
            ring_lines: DEFAULT_RING_LINES,
            stderr: true,
        }
    }

    pub fn with_dir(mut self, log_dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(log_dir.into());
        self
    }
}

/// Size-capped log file with numbered backups
pub struct RollingFile {
    dir: PathBuf,
    app_name: String,
    max_bytes: u64,
    max_files: usize,
    file: File,
    written: u64,
}

impl RollingFile {
    pub fn open(dir: &Path, app_name: &str, max_bytes: u64, max_files: usize) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.log", app_name));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            dir: dir.to_path_buf(),
            app_name: app_name.to_string(),
            max_bytes: max_bytes.max(1),
            max_files: max_files.max(1),
            file,
            written,
        })
    }

    /// Path of the active file
    pub fn path(&self) -> PathBuf {
        self.backup_path(0)
    }

    fn backup_path(&self, n: usize) -> PathBuf {
        if n == 0 {
            self.dir.join(format!("{}.log", self.app_name))
        } else {
            self.dir.join(format!("{}.log.{}", self.app_name, n))
        }
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        let oldest = self.backup_path(self.max_files);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for n in (1..self.max_files).rev() {
            let from = self.backup_path(n);
            if from.exists() {
                fs::rename(&from, self.backup_path(n + 1))?;
            }
        }
        fs::rename(self.backup_path(0), self.backup_path(1))?;

        self.file = OpenOptions::new().create(true).append(true).open(self.backup_path(0))?;
        self.written = 0;
        let header = format!("--- {} log rotated {} ---\n", self.app_name, Utc::now().to_rfc3339());
        self.file.write_all(header.as_bytes())?;
        self.written = header.len() as u64;
        Ok(())
    }
}

impl Write for RollingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.max_bytes {
            self.rotate()?;
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// Circular buffer of the last complete lines
#[derive(Debug)]
pub struct RecentLines {
    lines: VecDeque<String>,
    capacity: usize,
    partial: String,
}

impl RecentLines {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            partial: String::new(),
        }
    }

    pub fn push_bytes(&mut self, buf: &[u8]) {
        self.partial.push_str(&String::from_utf8_lossy(buf));
        while let Some(end) = self.partial.find('\n') {
            let line: String = self.partial.drain(..=end).collect();
            if self.lines.len() == self.capacity {
                self.lines.pop_front();
            }
            self.lines.push_back(line.trim_end().to_string());
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.iter().cloned().collect()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> io::Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer lock poisoned"))
}

/// Writer handed to the fmt layer: ring buffer plus optional rolling file
#[derive(Clone)]
pub struct LogWriter {
    file: Option<Arc<Mutex<RollingFile>>>,
    recent: Arc<Mutex<RecentLines>>,
}

impl LogWriter {
    pub fn open(options: &LoggerOptions) -> io::Result<Self> {
        let file = match &options.log_dir {
            Some(dir) => Some(Arc::new(Mutex::new(RollingFile::open(
                dir,
                &options.app_name,
                options.max_bytes,
                options.max_files,
            )?))),
            None => None,
        };
        Ok(Self {
            file,
            recent: Arc::new(Mutex::new(RecentLines::new(options.ring_lines))),
        })
    }

    pub fn recent_lines(&self) -> Vec<String> {
        lock(&self.recent).map(|recent| recent.lines()).unwrap_or_default()
    }
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        lock(&self.recent)?.push_bytes(buf);
        if let Some(file) = &self.file {
            lock(file)?.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        match &self.file {
            Some(file) => lock(file)?.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for LogWriter {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Install the global logger writing `<log_dir>/<app_name>.log`
pub fn init_logger(log_dir: impl Into<PathBuf>, app_name: &str) -> Result<(), LoggerError> {
    init_logger_with(LoggerOptions::new(app_name).with_dir(log_dir))
}

pub fn init_logger_with(options: LoggerOptions) -> Result<(), LoggerError> {
    let filter = EnvFilter::try_new(&options.filter).map_err(|e| LoggerError::Filter {
        filter: options.filter.clone(),
        reason: e.to_string(),
    })?;
    let writer = LogWriter::open(&options)?;
    let stderr_layer = options.stderr.then(|| fmt::layer().with_writer(io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_ansi(false).with_writer(writer.clone()))
        .with(stderr_layer)
        .try_init()
        .map_err(|_| LoggerError::AlreadyInitialized)?;

    let _ = RECENT.set(Arc::clone(&writer.recent));
    tracing::info!(
        app = %options.app_name,
        dir = ?options.log_dir,
        "logger initialized"
    );
    Ok(())
}

/// Last lines written by the global logger
pub fn recent_lines() -> Vec<String> {
    RECENT
        .get()
        .and_then(|recent| recent.lock().ok().map(|recent| recent.lines()))
        .unwrap_or_default()
}

pub fn info(message: &str) -> Result<(), LoggerError> {
    RECENT.get().ok_or(LoggerError::NotInitialized)?;
    log::info!("{}", message);
    Ok(())
}

pub fn error(message: &str) -> Result<(), LoggerError> {
    RECENT.get().ok_or(LoggerError::NotInitialized)?;
    log::error!("{}", message);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_keeps_last_lines() {
        let mut ring = RecentLines::new(2);
        ring.push_bytes(b"one\ntwo\nthree\n");
        assert_eq!(ring.lines(), vec!["two", "three"]);
    }

    #[test]
    fn test_ring_joins_partial_writes() {
        let mut ring = RecentLines::new(4);
        ring.push_bytes(b"hel");
        assert!(ring.lines().is_empty());
        ring.push_bytes(b"lo\n");
        assert_eq!(ring.lines(), vec!["hello"]);
    }

    #[test]
    fn test_rolling_file_rotates() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = RollingFile::open(dir.path(), "App", 64, 2).unwrap();

        for i in 0..20 {
            file.write_all(format!("line number {:02}\n", i).as_bytes()).unwrap();
        }
        file.flush().unwrap();

        assert!(file.path().exists());
        assert!(dir.path().join("App.log.1").exists());
        assert!(dir.path().join("App.log.2").exists());
        assert!(!dir.path().join("App.log.3").exists());

        let active = fs::read_to_string(file.path()).unwrap();
        assert!(active.contains("line number 19"));
        assert!(fs::metadata(file.path()).unwrap().len() <= 64 + 20);
    }

    #[test]
    fn test_writer_without_dir_only_buffers() {
        let options = LoggerOptions {
            ring_lines: 8,
            ..LoggerOptions::new("App")
        };
        let mut writer = LogWriter::open(&options).unwrap();
        writer.write_all(b"first\nsecond\n").unwrap();
        assert_eq!(writer.recent_lines(), vec!["first", "second"]);
    }

    #[test]
    fn test_writer_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let options = LoggerOptions::new("App").with_dir(dir.path());
        let mut writer = LogWriter::open(&options).unwrap();
        writer.write_all(b"hello file\n").unwrap();
        writer.flush().unwrap();

        let content = fs::read_to_string(dir.path().join("App.log")).unwrap();
        assert_eq!(content, "hello file\n");
    }

    #[test]
    fn test_helpers_require_init() {
        if RECENT.get().is_none() {
            assert!(matches!(info("x"), Err(LoggerError::NotInitialized)));
        }
    }

    #[test]
    fn test_bad_filter() {
        let options = LoggerOptions {
            filter: "live_todo=loud".to_string(),
            ..LoggerOptions::new("App")
        };
        assert!(matches!(init_logger_with(options), Err(LoggerError::Filter { .. })));
    }
}
