//! Wire формат ответа сервера симуляции
//!
//! GET /simulate → JSON массив:
//! `{ "id", "pos": [x, y], "state", "fuel", "route_index", "route_indices": [..] }`
//!
//! Legacy сервер присылает только `id` + `pos` (pos может быть null),
//! поэтому всё кроме `id` опционально.

use crate::components::{CarId, CarState};
use crate::error::FeedError;
use serde::{Deserialize, Deserializer};

/// Одна машина из poll ответа (живёт только один цикл)
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct CarRecord {
    pub id: i64,
    /// Позиция в grid (legacy, motion не использует)
    #[serde(default)]
    pub pos: Option<[i64; 2]>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fuel: i64,
    /// Индекс waypoint для начальной позиции
    #[serde(default, deserialize_with = "null_as_default")]
    pub route_index: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub route_indices: Vec<i64>,
}

impl CarRecord {
    pub fn car_id(&self) -> CarId {
        CarId(self.id)
    }

    pub fn car_state(&self) -> CarState {
        CarState::from_wire(self.state.as_deref())
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Тело ответа → snapshot машин
///
/// Пустое тело или `null` = ноль машин. Битый JSON = FeedError::Decode
/// (цикл пропускается, состояние не меняется).
pub fn decode_snapshot(body: &str) -> Result<Vec<CarRecord>, FeedError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    let records: Option<Vec<CarRecord>> = serde_json::from_str(body)?;
    Ok(records.unwrap_or_default())
}
