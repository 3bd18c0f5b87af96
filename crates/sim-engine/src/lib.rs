#![deny(warnings)]

//! Daily simulation rules for the Hearthvale village.
//!
//! One call to [`run_day`] applies exactly one day's worth of change to a
//! world: every living villager gets hungrier, eats from the shared stock
//! while it lasts, and gains or loses health and mood accordingly. The day
//! is summarized into a [`DayLog`] appended to the world's bounded history.

use sim_core::{
    DayLog, Npc, NpcChange, WorldState, HEALTH_MAX, HEALTH_MIN, HUNGER_MAX, HUNGER_MIN, MOOD_MAX,
    MOOD_MIN,
};
use tracing::debug;

/// Hunger above this threshold drains health and mood.
const HUNGER_STARVING: i32 = 70;
/// Hunger below this threshold lets health recover.
const HUNGER_SATED: i32 = 30;
/// Health below this threshold weighs on mood.
const HEALTH_AILING: i32 = 50;

/// Apply the daily rule to a single living villager. `fed` reports whether
/// the villager drew a ration from the shared stock this day.
fn step_npc(npc: &mut Npc, fed: bool) -> NpcChange {
    let hunger_before = npc.hunger;
    let health_before = npc.health;
    let mood_before = npc.mood;

    let mut hunger = npc.hunger + 10;
    if fed {
        hunger -= 20;
    }
    let hunger = hunger.clamp(HUNGER_MIN, HUNGER_MAX);

    let mut health = npc.health;
    if hunger > HUNGER_STARVING {
        health -= 5;
    } else if hunger < HUNGER_SATED {
        health += 1;
    }
    let health = health.clamp(HEALTH_MIN, HEALTH_MAX);

    let mut mood = npc.mood;
    if hunger > HUNGER_STARVING {
        mood -= 3;
    }
    if health < HEALTH_AILING {
        mood -= 2;
    } else {
        mood += 1;
    }
    let mood = mood.clamp(MOOD_MIN, MOOD_MAX);

    let died = health <= HEALTH_MIN;
    if died {
        npc.alive = false;
    }
    npc.hunger = hunger;
    npc.health = health;
    npc.mood = mood;

    NpcChange {
        npc_id: Some(npc.id.clone()),
        hunger_before,
        hunger_after: hunger,
        health_before,
        health_after: health,
        mood_before,
        mood_after: mood,
        died,
    }
}

/// Apply exactly one day's worth of change to `world` and append the day's
/// log entry.
///
/// Villagers are processed in iteration order and the food stock is
/// decremented at most once per villager, so early-ordered villagers are
/// preferentially fed when stock runs short. Dead villagers are left
/// entirely untouched and produce no change record. The log carries the
/// world's current `day`, which the caller advances beforehand.
pub fn run_day(world: &mut WorldState) {
    let food_stock_before = world.food_stock;
    let mut food_stock = world.food_stock;
    let mut npc_changes = Vec::new();
    let mut fed = 0usize;
    let mut deaths = 0usize;

    for npc in &mut world.npcs {
        if !npc.alive {
            continue;
        }
        let ration = food_stock > 0;
        if ration {
            food_stock -= 1;
            fed += 1;
        }
        let change = step_npc(npc, ration);
        if change.died {
            deaths += 1;
        }
        npc_changes.push(change);
    }

    world.food_stock = food_stock;
    world.push_day_log(DayLog {
        day: world.day,
        food_stock_before,
        food_stock_after: food_stock,
        npc_changes,
        summary: None,
    });
    debug!(
        day = world.day,
        fed,
        deaths,
        food_stock,
        alive = world.alive_count(),
        "simulated day"
    );
}
