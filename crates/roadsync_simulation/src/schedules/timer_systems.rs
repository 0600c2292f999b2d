//! Timer systems для tick-based schedules

use super::{FixedTickCounter, PollUpdate};
use crate::sync::PollClock;
use bevy::prelude::{ResMut, World};

/// System: Increment tick counter (FixedUpdate, запускается ПЕРВЫМ)
pub fn increment_tick_counter(mut counter: ResMut<FixedTickCounter>) {
    counter.tick = counter.tick.wrapping_add(1);
}

/// System: Run PollUpdate schedule когда poll due
///
/// Exclusive system (требует &mut World для run_schedule).
pub fn run_poll_update_timer(world: &mut World) {
    let tick = world.resource::<FixedTickCounter>().tick;
    let due = world
        .get_resource::<PollClock>()
        .is_some_and(|clock| clock.is_due(tick));

    if due {
        world.run_schedule(PollUpdate);
    }
}
