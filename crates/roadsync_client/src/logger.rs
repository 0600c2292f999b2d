//! FileLogger: stdout + logs/roadsync.log
//!
//! Уровень фильтрует `log_with_level` в core, здесь только вывод.

use roadsync_simulation::{LogLevel, LogPrinter};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

pub const DEFAULT_LOG_PATH: &str = "logs/roadsync.log";

pub struct FileLogger {
    path: PathBuf,
    open_error_reported: AtomicBool,
}

impl FileLogger {
    /// Новая сессия: файл пересоздаётся с заголовком
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let logger = Self {
            path: path.into(),
            open_error_reported: AtomicBool::new(false),
        };
        logger.start_session();
        logger
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn start_session(&self) {
        if let Some(parent) = self.path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        let header = format!(
            "=== RoadSync client session {} ===",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );

        if let Err(e) = std::fs::write(&self.path, format!("{header}\n")) {
            self.report_open_error(&e);
        }
    }

    fn append(&self, line: &str) {
        match std::fs::OpenOptions::new().create(true).append(true).open(&self.path) {
            Ok(mut file) => {
                let _ = writeln!(file, "{}", line);
            }
            Err(e) => self.report_open_error(&e),
        }
    }

    /// Ошибку открытия файла показываем один раз, дальше молча
    fn report_open_error(&self, error: &std::io::Error) {
        if !self.open_error_reported.swap(true, Ordering::Relaxed) {
            eprintln!("❌ Failed to open log file {:?}: {}", self.path, error);
        }
    }
}

impl LogPrinter for FileLogger {
    fn log(&self, level: LogLevel, message: &str) {
        let line = format!("[{}] {}", level.as_str(), message);

        if level == LogLevel::Error {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }

        self.append(&line);
    }
}
