use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LogConfig;

/// Appends to `file_path` and moves it aside to `<name>.1` once it would
/// grow past `max_size_bytes`. Only one rotated file is kept.
#[derive(Debug)]
pub(crate) struct SizeRotatingFileWriter {
    file_path: PathBuf,
    rotated_path: PathBuf,
    max_size_bytes: u64,
    file: Option<File>,
    written_bytes: u64,
}

impl SizeRotatingFileWriter {
    pub(crate) fn new(file_path: PathBuf, max_size_bytes: u64) -> io::Result<Self> {
        if let Some(parent) = file_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
        {
            fs::create_dir_all(parent)?;
        }
        let mut rotated_name = file_path
            .file_name()
            .map(|value| value.to_os_string())
            .unwrap_or_else(|| "aiterm.log".into());
        rotated_name.push(".1");
        let rotated_path = file_path.with_file_name(rotated_name);
        let written_bytes = fs::metadata(&file_path)
            .map(|metadata| metadata.len())
            .unwrap_or(0);

        Ok(Self {
            file_path,
            rotated_path,
            max_size_bytes,
            file: None,
            written_bytes,
        })
    }

    fn rotate_if_needed(&mut self, incoming_len: usize) -> io::Result<()> {
        if self.max_size_bytes == 0 || self.written_bytes == 0 {
            return Ok(());
        }
        if self.written_bytes.saturating_add(incoming_len as u64) <= self.max_size_bytes {
            return Ok(());
        }
        self.file = None;
        if self.rotated_path.exists() {
            fs::remove_file(&self.rotated_path)?;
        }
        if self.file_path.exists() {
            fs::rename(&self.file_path, &self.rotated_path)?;
        }
        self.written_bytes = 0;
        Ok(())
    }

    fn open_file(&mut self) -> io::Result<&mut File> {
        if self.file.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.file_path)?;
            self.file = Some(file);
        }
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::other("log file unavailable"))
    }
}

impl Write for SizeRotatingFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.rotate_if_needed(buf.len())?;
        self.open_file()?.write_all(buf)?;
        self.written_bytes = self.written_bytes.saturating_add(buf.len() as u64);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

/// Installs the global subscriber. The TUI owns stdout, so events go to the
/// log file and optionally to stderr.
pub fn init_tracing(config: &LogConfig) {
    static TRACE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

    let file_writer =
        match SizeRotatingFileWriter::new(config.file_path.clone(), config.rotate_size_bytes) {
            Ok(writer) => writer,
            Err(error) => {
                eprintln!(
                    "warning: failed to open log file {}: {error}",
                    config.file_path.display()
                );
                return;
            }
        };
    let (non_blocking, guard) = tracing_appender::non_blocking(file_writer);
    let _ = TRACE_GUARD.set(guard);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(non_blocking);
    let stderr_layer = config.stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(io::stderr)
    });

    if let Err(error) = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
    {
        eprintln!(
            "warning: failed to initialize tracing for {}: {error}",
            config.file_path.display()
        );
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Write;

    use super::SizeRotatingFileWriter;

    #[test]
    fn writer_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("logs").join("aiterm.log");
        let mut writer = SizeRotatingFileWriter::new(path.clone(), 1024).expect("writer");
        writer.write_all(b"hello\n").expect("write");
        writer.flush().expect("flush");
        assert_eq!(fs::read_to_string(&path).expect("log content"), "hello\n");
    }

    #[test]
    fn writer_rotates_when_size_limit_is_exceeded() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("aiterm.log");
        let mut writer = SizeRotatingFileWriter::new(path.clone(), 10).expect("writer");

        writer.write_all(b"first-line\n").expect("first write");
        writer.write_all(b"second\n").expect("second write");
        writer.flush().expect("flush");

        let rotated = dir.path().join("aiterm.log.1");
        assert_eq!(fs::read_to_string(&rotated).expect("rotated"), "first-line\n");
        assert_eq!(fs::read_to_string(&path).expect("current"), "second\n");
    }

    #[test]
    fn writer_keeps_a_single_rotated_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("aiterm.log");
        let mut writer = SizeRotatingFileWriter::new(path.clone(), 4).expect("writer");
        for chunk in [b"aaaa", b"bbbb", b"cccc"] {
            writer.write_all(chunk).expect("write");
        }
        writer.flush().expect("flush");

        let rotated = fs::read_to_string(dir.path().join("aiterm.log.1")).expect("rotated");
        assert_eq!(rotated, "bbbb");
        assert_eq!(fs::read_to_string(&path).expect("current"), "cccc");
        assert!(!dir.path().join("aiterm.log.2").exists());
    }

    #[test]
    fn zero_limit_disables_rotation() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("aiterm.log");
        let mut writer = SizeRotatingFileWriter::new(path.clone(), 0).expect("writer");
        writer.write_all(b"0123456789").expect("write");
        writer.write_all(b"0123456789").expect("write");
        writer.flush().expect("flush");
        assert!(!dir.path().join("aiterm.log.1").exists());
        assert_eq!(fs::read(&path).expect("current").len(), 20);
    }
}
