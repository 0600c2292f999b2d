//! Конфигурация клиента (RON файл + env overrides)
//!
//! Все поля имеют defaults: пустой файл `()` валиден.

use crate::error::ConfigError;
use crate::logger::LogLevel;
use bevy::prelude::*;
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000/simulate";

/// Env override для URL сервера симуляции
pub const ENV_SERVER_URL: &str = "ROADSYNC_SERVER_URL";
/// Env override для периода poll (миллисекунды)
pub const ENV_POLL_MS: &str = "ROADSYNC_POLL_MS";

const MAX_POLL_INTERVAL_MS: u64 = 60_000;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub server_url: String,
    pub poll_interval_ms: u64,
    /// Частота FixedUpdate (motion tick)
    pub tick_hz: f64,
    pub log_level: LogLevel,
    pub car_name_prefix: String,
    pub motion: MotionConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            poll_interval_ms: 500,
            tick_hz: 60.0,
            log_level: LogLevel::Info,
            car_name_prefix: "Car_".to_string(),
            motion: MotionConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn from_ron_str(input: &str) -> Result<Self, ConfigError> {
        ron::from_str(input).map_err(|e| ConfigError::Parse {
            path: "<inline>".into(),
            detail: e.to_string(),
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        ron::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
    }

    /// Применяет ROADSYNC_SERVER_URL / ROADSYNC_POLL_MS поверх файла
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(
            std::env::var(ENV_SERVER_URL).ok(),
            std::env::var(ENV_POLL_MS).ok(),
        )
    }

    fn with_overrides(
        mut self,
        server_url: Option<String>,
        poll_ms: Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(url) = server_url {
            self.server_url = url;
        }

        if let Some(raw) = poll_ms {
            self.poll_interval_ms = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                field: "poll_interval_ms",
                detail: format!("{ENV_POLL_MS}={raw:?} is not an integer"),
            })?;
        }

        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "server_url",
                detail: "must not be empty".to_string(),
            });
        }

        if !(1..=MAX_POLL_INTERVAL_MS).contains(&self.poll_interval_ms) {
            return Err(ConfigError::InvalidValue {
                field: "poll_interval_ms",
                detail: format!("{} is outside 1..={MAX_POLL_INTERVAL_MS}", self.poll_interval_ms),
            });
        }

        if !(self.tick_hz.is_finite() && self.tick_hz > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "tick_hz",
                detail: format!("{} must be a positive number", self.tick_hz),
            });
        }

        self.motion.validate()
    }

    /// Период poll в FixedUpdate тиках (минимум 1)
    pub fn poll_interval_ticks(&self) -> u64 {
        let ticks = (self.poll_interval_ms as f64 / 1000.0 * self.tick_hz).round() as u64;
        ticks.max(1)
    }
}

/// Параметры движения машины по маршруту
#[derive(Resource, Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Крейсерская скорость (units/sec)
    pub speed: f32,
    /// Коэффициент slerp поворота (× dt)
    pub rotation_speed: f32,
    /// Коэффициент сглаживания velocity (× dt)
    pub velocity_blend: f32,
    /// Дистанция "waypoint достигнут"
    pub arrival_threshold: f32,
    /// Дистанция до первого waypoint, после которой машину телепортируем
    pub teleport_threshold: f32,
    /// Минимальная длина direction для поворота
    pub heading_epsilon: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            speed: 10.0,
            rotation_speed: 5.0,
            velocity_blend: 5.0,
            arrival_threshold: 1.0,
            teleport_threshold: 100.0,
            heading_epsilon: 0.1,
        }
    }
}

impl MotionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("motion.speed", self.speed),
            ("motion.rotation_speed", self.rotation_speed),
            ("motion.velocity_blend", self.velocity_blend),
            ("motion.arrival_threshold", self.arrival_threshold),
            ("motion.teleport_threshold", self.teleport_threshold),
            ("motion.heading_epsilon", self.heading_epsilon),
        ];

        for (field, value) in fields {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::InvalidValue {
                    field,
                    detail: format!("{value} must be a non-negative number"),
                });
            }
        }

        Ok(())
    }
}
