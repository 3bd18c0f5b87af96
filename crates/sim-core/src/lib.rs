#![deny(warnings)]

//! Core domain models and invariants for the Hearthvale village simulation.
//!
//! This crate defines the serializable world types shared across the
//! simulation with validation helpers to guarantee basic invariants.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

/// Lower hunger bound (sated).
pub const HUNGER_MIN: i32 = 0;
/// Upper hunger bound (starving).
pub const HUNGER_MAX: i32 = 100;
/// Lower health bound; reaching it is fatal.
pub const HEALTH_MIN: i32 = 0;
/// Upper health bound.
pub const HEALTH_MAX: i32 = 100;
/// Lower mood bound.
pub const MOOD_MIN: i32 = -50;
/// Upper mood bound.
pub const MOOD_MAX: i32 = 50;

/// Maximum number of day logs a world retains; oldest entries are evicted
/// first.
pub const DAY_LOG_CAP: usize = 30;

/// Food stock of a freshly synthesized world.
pub const DEFAULT_FOOD_STOCK: u32 = 50;
/// Population of a freshly synthesized world.
pub const DEFAULT_POPULATION: usize = 24;

const DEFAULT_JOBS: [&str; 6] = ["Farmer", "Cook", "Carpenter", "Guard", "Healer", "Fisher"];

/// One villager. All three numeric attributes stay within their closed
/// ranges after any mutation; `alive` is the sole gate for participation
/// in future daily updates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Npc {
    /// Opaque identifier (uuid string for synthesized villagers).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Assigned job.
    pub job: String,
    /// Hunger in [0, 100]; higher is hungrier.
    pub hunger: i32,
    /// Health in [0, 100].
    pub health: i32,
    /// Mood in [-50, 50].
    pub mood: i32,
    /// Dead villagers are never updated again.
    pub alive: bool,
}

impl Npc {
    /// Construct a validated villager. Out-of-range attributes are
    /// rejected, never clamped; clamping is a runtime behavior of the
    /// simulation engine only.
    pub fn new(
        id: String,
        name: String,
        job: String,
        hunger: i32,
        health: i32,
        mood: i32,
        alive: bool,
    ) -> Result<Self, ValidationError> {
        let npc = Npc {
            id,
            name,
            job,
            hunger,
            health,
            mood,
            alive,
        };
        validate_npc(&npc)?;
        Ok(npc)
    }
}

/// Per-villager delta recorded for one simulated day.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NpcChange {
    /// Identifier of the villager the change belongs to. Optional so that
    /// legacy snapshots without ids still decode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub npc_id: Option<String>,
    /// Hunger at the start of the day.
    pub hunger_before: i32,
    /// Hunger after the daily update.
    pub hunger_after: i32,
    /// Health at the start of the day.
    pub health_before: i32,
    /// Health after the daily update.
    pub health_after: i32,
    /// Mood at the start of the day.
    pub mood_before: i32,
    /// Mood after the daily update.
    pub mood_after: i32,
    /// Set only on the day the villager dies; serialized only when true.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub died: bool,
}

/// Historical record of one simulated day.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DayLog {
    /// Day the log describes (>= 1).
    pub day: u64,
    /// Food stock before any villager was processed.
    pub food_stock_before: u32,
    /// Food stock after all villagers were processed.
    pub food_stock_after: u32,
    /// One entry per villager alive at the start of the day.
    pub npc_changes: Vec<NpcChange>,
    /// Optional free-form note; serialized only when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// The single root of the simulation. Villagers and day logs are owned
/// exclusively by the world they belong to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    /// Current day counter (>= 1).
    pub day: u64,
    /// Shared food stock consumed by the daily update.
    pub food_stock: u32,
    /// Population in iteration order; order is the tie-break when food is
    /// scarce.
    pub npcs: Vec<Npc>,
    /// Bounded history, most recent last.
    pub day_logs: Vec<DayLog>,
    /// Unknown snapshot fields, preserved through a load-save round trip.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WorldState {
    /// Advance the day counter by one and return the new day.
    pub fn advance_day(&mut self) -> u64 {
        self.day += 1;
        self.day
    }

    /// Append a day log, evicting the oldest entries beyond
    /// [`DAY_LOG_CAP`].
    pub fn push_day_log(&mut self, log: DayLog) {
        self.day_logs.push(log);
        let excess = self.day_logs.len().saturating_sub(DAY_LOG_CAP);
        if excess > 0 {
            self.day_logs.drain(..excess);
        }
    }

    /// Number of villagers still alive.
    pub fn alive_count(&self) -> usize {
        self.npcs.iter().filter(|npc| npc.alive).count()
    }
}

/// Synthesize the default population: numbered names, jobs cycled from a
/// fixed roster, fresh uuid identifiers.
pub fn default_npcs() -> Vec<Npc> {
    (0..DEFAULT_POPULATION)
        .map(|i| Npc {
            id: Uuid::new_v4().to_string(),
            name: format!("Villager {}", i + 1),
            job: DEFAULT_JOBS[i % DEFAULT_JOBS.len()].to_string(),
            hunger: 30,
            health: 90,
            mood: 0,
            alive: true,
        })
        .collect()
}

/// Synthesize a fresh world: day 1, stocked larder, default population,
/// empty history.
pub fn default_world() -> WorldState {
    WorldState {
        day: 1,
        food_stock: DEFAULT_FOOD_STOCK,
        npcs: default_npcs(),
        day_logs: Vec::new(),
        extra: Map::new(),
    }
}

/// Validation errors for domain invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// The day counter starts at 1.
    #[error("day must be >= 1")]
    DayBeforeStart,
    /// Hunger outside [0, 100].
    #[error("hunger {0} is out of range [0, 100]")]
    HungerOutOfRange(i32),
    /// Health outside [0, 100].
    #[error("health {0} is out of range [0, 100]")]
    HealthOutOfRange(i32),
    /// Mood outside [-50, 50].
    #[error("mood {0} is out of range [-50, 50]")]
    MoodOutOfRange(i32),
    /// Villager identifiers must be non-empty.
    #[error("npc id must not be empty")]
    EmptyNpcId,
    /// More day logs than the retention cap allows.
    #[error("day log history exceeds the retention cap")]
    LogHistoryOverCap,
}

/// Validate a single villager.
pub fn validate_npc(npc: &Npc) -> Result<(), ValidationError> {
    if npc.id.is_empty() {
        return Err(ValidationError::EmptyNpcId);
    }
    if !(HUNGER_MIN..=HUNGER_MAX).contains(&npc.hunger) {
        return Err(ValidationError::HungerOutOfRange(npc.hunger));
    }
    if !(HEALTH_MIN..=HEALTH_MAX).contains(&npc.health) {
        return Err(ValidationError::HealthOutOfRange(npc.health));
    }
    if !(MOOD_MIN..=MOOD_MAX).contains(&npc.mood) {
        return Err(ValidationError::MoodOutOfRange(npc.mood));
    }
    Ok(())
}

/// Validate the whole world, including log retention.
pub fn validate_world(world: &WorldState) -> Result<(), ValidationError> {
    if world.day < 1 {
        return Err(ValidationError::DayBeforeStart);
    }
    for npc in &world.npcs {
        validate_npc(npc)?;
    }
    if world.day_logs.len() > DAY_LOG_CAP {
        return Err(ValidationError::LogHistoryOverCap);
    }
    for log in &world.day_logs {
        if log.day < 1 {
            return Err(ValidationError::DayBeforeStart);
        }
    }
    Ok(())
}
