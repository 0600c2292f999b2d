//! Custom schedules and tick counter
//!
//! Tick-based scheduling для poll цикла.
//!
//! # Архитектура
//!
//! **FixedUpdate (tick_hz)** → increment_tick_counter
//!   └─ poller enabled && !in_flight && tick >= next_tick → PollUpdate
//!
//! PollUpdate только запускает fetch на worker thread. Результат собирает
//! `collect_poll_results` в FixedUpdate, он же назначает следующий deadline
//! (tick + период): период отсчитывается ПОСЛЕ ответа.

use bevy::ecs::schedule::ScheduleLabel;
use bevy::prelude::Resource;

pub mod timer_systems;

/// Глобальный tick counter (инкрементируется в каждом FixedUpdate)
///
/// u64 при 60 Hz не переполнится за время жизни процесса (wrapping_add).
#[derive(Resource, Default, Debug)]
pub struct FixedTickCounter {
    pub tick: u64,
}

/// Custom schedule: PollUpdate (dispatch HTTP poll)
///
/// Запускается из FixedUpdate, когда наступил deadline и нет запроса в полёте.
#[derive(ScheduleLabel, Debug, Clone, PartialEq, Eq, Hash)]
pub struct PollUpdate;
