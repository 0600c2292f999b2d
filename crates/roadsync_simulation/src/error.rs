//! Ошибки слоя синхронизации (feed, config, scene)
//!
//! Никакая ошибка не эскалируется дальше логов: poll цикл пропускается,
//! headless binary выходит с ненулевым кодом только при старте.

use std::path::PathBuf;

/// Ошибка одного poll цикла
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server responded with HTTP {0}")]
    Status(u16),

    #[error("malformed car snapshot: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("poll worker stopped without a response")]
    Disconnected,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error in {path}: {detail}")]
    Parse { path: PathBuf, detail: String },

    #[error("invalid config value `{field}`: {detail}")]
    InvalidValue { field: &'static str, detail: String },
}

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("failed to read scene {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error in {path}: {detail}")]
    Parse { path: PathBuf, detail: String },
}
