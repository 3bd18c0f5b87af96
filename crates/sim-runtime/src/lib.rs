#![deny(warnings)]

//! Tick driver and query surface over the persisted world.
//!
//! Every operation is load-mutate-save against the snapshot file; no
//! world instance outlives a call. The surrounding request loop
//! serializes access, so there is no locking here.

use persistence::StoreError;
use serde::{Deserialize, Serialize};
use sim_core::{DayLog, Npc, WorldState};
use std::path::Path;
use tracing::info;

/// Read-only projection of the current world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateView {
    /// Current day counter.
    pub day: u64,
    /// Remaining shared food stock.
    pub food_stock: u32,
    /// Full population, dead villagers included.
    pub npcs: Vec<Npc>,
}

/// Advance the world by `requested_days` days and persist the result.
///
/// Negative requests are treated as zero. The day counter is incremented
/// before each engine run, so the log for the Nth simulated day carries
/// `day = current_day + N`. The world is saved once after all iterations;
/// requesting zero days still loads and re-saves the (unchanged) state.
/// Returns the final day.
pub fn tick(path: &Path, requested_days: i64) -> Result<u64, StoreError> {
    let mut world = persistence::load_world(path);
    let days = requested_days.max(0);
    for _ in 0..days {
        world.advance_day();
        sim_engine::run_day(&mut world);
    }
    persistence::save_world(path, &world)?;
    info!(
        days,
        day = world.day,
        food_stock = world.food_stock,
        alive = world.alive_count(),
        "advanced simulation"
    );
    Ok(world.day)
}

/// Current snapshot projection. Does not mutate or persist; field-repair
/// defaults are applied by the store's load path.
pub fn get_state(path: &Path) -> StateView {
    let world = persistence::load_world(path);
    StateView {
        day: world.day,
        food_stock: world.food_stock,
        npcs: world.npcs,
    }
}

/// The most recent `limit` day logs in chronological order.
///
/// A `limit` below 1 yields an empty history; a `limit` at or above the
/// retained length returns everything.
pub fn get_logs(path: &Path, limit: i64) -> Vec<DayLog> {
    let world = persistence::load_world(path);
    if limit < 1 {
        return Vec::new();
    }
    let logs = world.day_logs;
    let keep = usize::try_from(limit).unwrap_or(usize::MAX).min(logs.len());
    logs[logs.len() - keep..].to_vec()
}

/// Overwrite the persisted state with a freshly synthesized default world
/// and return it.
pub fn reset(path: &Path) -> Result<WorldState, StoreError> {
    let world = sim_core::default_world();
    persistence::save_world(path, &world)?;
    info!(day = world.day, npcs = world.npcs.len(), "reset world");
    Ok(world)
}
