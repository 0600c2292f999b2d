//! Источник snapshot'ов машин (network seam)
//!
//! Poller не знает про HTTP: он вызывает `CarFeed::fetch` на worker thread
//! и получает результат через канал. Тесты и `--replay` подменяют feed на `ScriptedFeed`.

mod http;

pub use http::HttpCarFeed;

use crate::error::FeedError;
use crate::wire::CarRecord;
use bevy::prelude::*;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub type FeedResult = Result<Vec<CarRecord>, FeedError>;

/// Один poll = один fetch. Блокирующий вызов (выполняется вне main thread).
pub trait CarFeed: Send + Sync {
    fn fetch(&self) -> FeedResult;

    /// Для логов (URL, "scripted", ...)
    fn describe(&self) -> String;
}

/// Resource: активный feed
#[derive(Resource, Clone)]
pub struct TrafficFeed(pub Arc<dyn CarFeed>);

impl TrafficFeed {
    pub fn new(feed: impl CarFeed + 'static) -> Self {
        Self(Arc::new(feed))
    }
}

/// Feed с заранее заданными ответами (по одному на fetch)
///
/// Когда ответы закончились: возвращает последний снова (сервер "застыл").
#[derive(Default)]
pub struct ScriptedFeed {
    responses: Mutex<VecDeque<FeedResult>>,
    last: Mutex<Vec<CarRecord>>,
}

impl ScriptedFeed {
    pub fn new(responses: impl IntoIterator<Item = FeedResult>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            last: Mutex::new(Vec::new()),
        }
    }

    /// Replay запись: JSON массив snapshot'ов, каждый в wire формате сервера
    /// (`null` = ноль машин). Offline прогон без сервера симуляции.
    pub fn from_json(body: &str) -> Result<Self, FeedError> {
        let snapshots: Vec<Option<Vec<CarRecord>>> = serde_json::from_str(body)?;
        Ok(Self::new(
            snapshots.into_iter().map(|snapshot| Ok(snapshot.unwrap_or_default())),
        ))
    }
}

impl CarFeed for ScriptedFeed {
    fn fetch(&self) -> FeedResult {
        let next = self.responses.lock().ok().and_then(|mut queue| queue.pop_front());

        match next {
            Some(Ok(records)) => {
                if let Ok(mut last) = self.last.lock() {
                    *last = records.clone();
                }
                Ok(records)
            }
            Some(Err(e)) => Err(e),
            None => Ok(self.last.lock().map(|last| last.clone()).unwrap_or_default()),
        }
    }

    fn describe(&self) -> String {
        "scripted feed".to_string()
    }
}
