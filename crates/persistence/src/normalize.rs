//! Field-by-field repair of persisted snapshots.
//!
//! Each accessor inspects the raw JSON value and returns a safe in-range
//! value, recording a [`Repair`] diagnostic when the input did not
//! conform. Booleans are never accepted where an integer is expected.

use serde_json::Value;
use sim_core::{
    default_npcs, default_world, DayLog, Npc, NpcChange, WorldState, DAY_LOG_CAP, HEALTH_MAX,
    HEALTH_MIN, HUNGER_MAX, HUNGER_MIN, MOOD_MAX, MOOD_MIN,
};
use std::fmt;
use uuid::Uuid;

/// Diagnostic for one coerced snapshot field.
#[derive(Clone, Debug, PartialEq)]
pub struct Repair {
    /// Dotted path of the field that was repaired.
    pub field: String,
    /// What was substituted.
    pub note: String,
}

impl Repair {
    fn new(field: impl Into<String>, note: &str) -> Self {
        Repair {
            field: field.into(),
            note: note.to_string(),
        }
    }
}

impl fmt::Display for Repair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.note)
    }
}

/// Repair a decoded snapshot into a well-formed world.
///
/// Wrong-typed or out-of-range fields are independently coerced to safe
/// defaults. Unknown top-level keys are kept in [`WorldState::extra`] so
/// they survive a load-save round trip. Applying `normalize` to its own
/// output reproduces it unchanged.
pub fn normalize(value: Value) -> (WorldState, Vec<Repair>) {
    let mut repairs = Vec::new();
    let mut obj = match value {
        Value::Object(obj) => obj,
        _ => {
            repairs.push(Repair::new(
                "$",
                "root is not an object; default world substituted",
            ));
            return (default_world(), repairs);
        }
    };

    let day = match as_int(obj.remove("day"), 1, "day", &mut repairs) {
        n if n < 1 => {
            repairs.push(Repair::new("day", "below 1; reset to 1"));
            1
        }
        n => n as u64,
    };

    let food_stock = as_stock(obj.remove("food_stock"), "food_stock", &mut repairs);

    let mut npcs = Vec::new();
    match obj.remove("npcs") {
        Some(Value::Array(entries)) => {
            for (i, entry) in entries.into_iter().enumerate() {
                if let Some(npc) = normalize_npc(entry, i, &mut repairs) {
                    npcs.push(npc);
                }
            }
        }
        Some(_) => repairs.push(Repair::new("npcs", "not a list")),
        None => {}
    }
    if npcs.is_empty() {
        repairs.push(Repair::new(
            "npcs",
            "no usable villagers; default population synthesized",
        ));
        npcs = default_npcs();
    }

    let mut day_logs = Vec::new();
    match obj.remove("day_logs") {
        Some(Value::Array(entries)) => {
            for (i, entry) in entries.into_iter().enumerate() {
                if let Some(log) = normalize_day_log(entry, i, &mut repairs) {
                    day_logs.push(log);
                }
            }
        }
        Some(_) => repairs.push(Repair::new("day_logs", "not a list; history cleared")),
        None => {}
    }
    if day_logs.len() > DAY_LOG_CAP {
        repairs.push(Repair::new(
            "day_logs",
            "over the retention cap; oldest entries dropped",
        ));
        day_logs = day_logs.split_off(day_logs.len() - DAY_LOG_CAP);
    }

    let world = WorldState {
        day,
        food_stock,
        npcs,
        day_logs,
        extra: obj,
    };
    (world, repairs)
}

fn normalize_npc(entry: Value, index: usize, repairs: &mut Vec<Repair>) -> Option<Npc> {
    let mut obj = match entry {
        Value::Object(obj) => obj,
        _ => {
            repairs.push(Repair::new(
                format!("npcs[{index}]"),
                "not an object; entry dropped",
            ));
            return None;
        }
    };

    let id = match obj.remove("id") {
        Some(Value::String(id)) if !id.is_empty() => id,
        Some(Value::Number(n)) => {
            repairs.push(Repair::new(
                format!("npcs[{index}].id"),
                "numeric id; stringified",
            ));
            n.to_string()
        }
        _ => {
            repairs.push(Repair::new(
                format!("npcs[{index}].id"),
                "missing or invalid; fresh uuid assigned",
            ));
            Uuid::new_v4().to_string()
        }
    };
    let name = as_string(
        obj.remove("name"),
        "Unnamed",
        &format!("npcs[{index}].name"),
        repairs,
    );
    let job = as_string(
        obj.remove("job"),
        "Laborer",
        &format!("npcs[{index}].job"),
        repairs,
    );
    let hunger = as_attr(
        obj.remove("hunger"),
        0,
        HUNGER_MIN,
        HUNGER_MAX,
        &format!("npcs[{index}].hunger"),
        repairs,
    );
    let health = as_attr(
        obj.remove("health"),
        100,
        HEALTH_MIN,
        HEALTH_MAX,
        &format!("npcs[{index}].health"),
        repairs,
    );
    let mood = as_attr(
        obj.remove("mood"),
        0,
        MOOD_MIN,
        MOOD_MAX,
        &format!("npcs[{index}].mood"),
        repairs,
    );
    let alive = as_bool(
        obj.remove("alive"),
        true,
        &format!("npcs[{index}].alive"),
        repairs,
    );

    Some(Npc {
        id,
        name,
        job,
        hunger,
        health,
        mood,
        alive,
    })
}

fn normalize_day_log(entry: Value, index: usize, repairs: &mut Vec<Repair>) -> Option<DayLog> {
    let mut obj = match entry {
        Value::Object(obj) => obj,
        _ => {
            repairs.push(Repair::new(
                format!("day_logs[{index}]"),
                "not an object; entry dropped",
            ));
            return None;
        }
    };

    let day = match as_int(
        obj.remove("day"),
        1,
        &format!("day_logs[{index}].day"),
        repairs,
    ) {
        n if n < 1 => {
            repairs.push(Repair::new(
                format!("day_logs[{index}].day"),
                "below 1; reset to 1",
            ));
            1
        }
        n => n as u64,
    };
    let food_stock_before = as_stock(
        obj.remove("food_stock_before"),
        &format!("day_logs[{index}].food_stock_before"),
        repairs,
    );
    let food_stock_after = as_stock(
        obj.remove("food_stock_after"),
        &format!("day_logs[{index}].food_stock_after"),
        repairs,
    );

    let mut npc_changes = Vec::new();
    match obj.remove("npc_changes") {
        Some(Value::Array(entries)) => {
            for (i, entry) in entries.into_iter().enumerate() {
                if let Some(change) = normalize_npc_change(entry, index, i, repairs) {
                    npc_changes.push(change);
                }
            }
        }
        Some(_) => repairs.push(Repair::new(
            format!("day_logs[{index}].npc_changes"),
            "not a list",
        )),
        None => {}
    }

    let summary = match obj.remove("summary") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(_) => {
            repairs.push(Repair::new(
                format!("day_logs[{index}].summary"),
                "not a string; dropped",
            ));
            None
        }
    };

    Some(DayLog {
        day,
        food_stock_before,
        food_stock_after,
        npc_changes,
        summary,
    })
}

fn normalize_npc_change(
    entry: Value,
    log_index: usize,
    index: usize,
    repairs: &mut Vec<Repair>,
) -> Option<NpcChange> {
    let path = format!("day_logs[{log_index}].npc_changes[{index}]");
    let mut obj = match entry {
        Value::Object(obj) => obj,
        _ => {
            repairs.push(Repair::new(path, "not an object; entry dropped"));
            return None;
        }
    };

    let npc_id = match obj.remove("npc_id") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(_) => {
            repairs.push(Repair::new(format!("{path}.npc_id"), "not a string; dropped"));
            None
        }
    };
    let hunger_before = as_change_int(
        obj.remove("hunger_before"),
        &format!("{path}.hunger_before"),
        repairs,
    );
    let hunger_after = as_change_int(
        obj.remove("hunger_after"),
        &format!("{path}.hunger_after"),
        repairs,
    );
    let health_before = as_change_int(
        obj.remove("health_before"),
        &format!("{path}.health_before"),
        repairs,
    );
    let health_after = as_change_int(
        obj.remove("health_after"),
        &format!("{path}.health_after"),
        repairs,
    );
    let mood_before = as_change_int(
        obj.remove("mood_before"),
        &format!("{path}.mood_before"),
        repairs,
    );
    let mood_after = as_change_int(
        obj.remove("mood_after"),
        &format!("{path}.mood_after"),
        repairs,
    );
    let died = as_bool(obj.remove("died"), false, &format!("{path}.died"), repairs);

    Some(NpcChange {
        npc_id,
        hunger_before,
        hunger_after,
        health_before,
        health_after,
        mood_before,
        mood_after,
        died,
    })
}

fn as_int(value: Option<Value>, default: i64, field: &str, repairs: &mut Vec<Repair>) -> i64 {
    match value {
        None => default,
        // `as_i64` rejects booleans and non-integral numbers
        Some(v) => match v.as_i64() {
            Some(n) => n,
            None => {
                repairs.push(Repair::new(field, "not an integer; default substituted"));
                default
            }
        },
    }
}

fn as_stock(value: Option<Value>, field: &str, repairs: &mut Vec<Repair>) -> u32 {
    let raw = as_int(value, 0, field, repairs);
    if raw < 0 {
        repairs.push(Repair::new(field, "negative; reset to 0"));
        return 0;
    }
    u32::try_from(raw).unwrap_or(u32::MAX)
}

fn as_attr(
    value: Option<Value>,
    default: i32,
    min: i32,
    max: i32,
    field: &str,
    repairs: &mut Vec<Repair>,
) -> i32 {
    let raw = match value {
        None => i64::from(default),
        Some(v) => match v.as_i64() {
            Some(n) => n,
            None => {
                repairs.push(Repair::new(field, "not an integer; default substituted"));
                i64::from(default)
            }
        },
    };
    if raw < i64::from(min) || raw > i64::from(max) {
        repairs.push(Repair::new(field, "out of range; clamped"));
    }
    raw.clamp(i64::from(min), i64::from(max)) as i32
}

fn as_change_int(value: Option<Value>, field: &str, repairs: &mut Vec<Repair>) -> i32 {
    as_int(value, 0, field, repairs).clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

fn as_string(value: Option<Value>, default: &str, field: &str, repairs: &mut Vec<Repair>) -> String {
    match value {
        None => default.to_string(),
        Some(Value::String(s)) => s,
        Some(_) => {
            repairs.push(Repair::new(field, "not a string; default substituted"));
            default.to_string()
        }
    }
}

fn as_bool(value: Option<Value>, default: bool, field: &str, repairs: &mut Vec<Repair>) -> bool {
    match value {
        None => default,
        Some(Value::Bool(b)) => b,
        Some(_) => {
            repairs.push(Repair::new(field, "not a boolean; default substituted"));
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;
    use sim_core::DEFAULT_POPULATION;

    #[test]
    fn conforming_snapshot_needs_no_repairs() {
        let world = default_world();
        let value = serde_json::to_value(&world).unwrap();
        let (normalized, repairs) = normalize(value);
        assert_eq!(normalized, world);
        assert!(repairs.is_empty(), "unexpected repairs: {repairs:?}");
    }

    #[test]
    fn booleans_are_not_integers() {
        let (world, repairs) = normalize(json!({
            "day": true,
            "food_stock": false,
            "npcs": [{"id": "a", "hunger": true}],
        }));
        assert_eq!(world.day, 1);
        assert_eq!(world.food_stock, 0);
        assert_eq!(world.npcs[0].hunger, 0);
        assert!(repairs.iter().any(|r| r.field == "day"));
        assert!(repairs.iter().any(|r| r.field == "food_stock"));
        assert!(repairs.iter().any(|r| r.field == "npcs[0].hunger"));
    }

    #[test]
    fn out_of_range_scalars_are_reset() {
        let (world, _) = normalize(json!({"day": -4, "food_stock": -10}));
        assert_eq!(world.day, 1);
        assert_eq!(world.food_stock, 0);
    }

    #[test]
    fn wrong_typed_npcs_fall_back_to_default_population() {
        let (world, repairs) = normalize(json!({"day": 3, "npcs": "nobody"}));
        assert_eq!(world.day, 3);
        assert_eq!(world.npcs.len(), DEFAULT_POPULATION);
        assert!(repairs.iter().any(|r| r.field == "npcs"));
    }

    #[test]
    fn empty_npc_list_is_repopulated() {
        let (world, _) = normalize(json!({"npcs": []}));
        assert_eq!(world.npcs.len(), DEFAULT_POPULATION);
    }

    #[test]
    fn npc_fields_are_repaired_independently() {
        let (world, _) = normalize(json!({
            "npcs": [{
                "id": 7,
                "name": 12,
                "hunger": 300,
                "health": -5,
                "mood": "grim",
                "alive": "yes",
            }],
        }));
        let npc = &world.npcs[0];
        assert_eq!(npc.id, "7");
        assert_eq!(npc.name, "Unnamed");
        assert_eq!(npc.job, "Laborer");
        assert_eq!(npc.hunger, 100);
        assert_eq!(npc.health, 0);
        assert_eq!(npc.mood, 0);
        assert!(npc.alive);
    }

    #[test]
    fn missing_npc_id_gets_a_fresh_uuid() {
        let (world, _) = normalize(json!({"npcs": [{"name": "Ida"}]}));
        assert!(!world.npcs[0].id.is_empty());
        assert_eq!(world.npcs[0].name, "Ida");
    }

    #[test]
    fn invalid_npc_entries_are_dropped() {
        let (world, _) = normalize(json!({
            "npcs": [42, {"id": "keeper"}, "junk", null],
        }));
        assert_eq!(world.npcs.len(), 1);
        assert_eq!(world.npcs[0].id, "keeper");
    }

    #[test]
    fn day_logs_are_trimmed_to_the_cap() {
        let logs: Vec<Value> = (1..=40)
            .map(|day| json!({"day": day, "food_stock_before": 5, "food_stock_after": 4, "npc_changes": []}))
            .collect();
        let (world, _) = normalize(json!({"day_logs": logs}));
        assert_eq!(world.day_logs.len(), DAY_LOG_CAP);
        assert_eq!(world.day_logs.first().unwrap().day, 11);
        assert_eq!(world.day_logs.last().unwrap().day, 40);
    }

    #[test]
    fn day_log_entries_are_repaired() {
        let (world, _) = normalize(json!({
            "day_logs": [
                "garbage",
                {
                    "day": 0,
                    "food_stock_before": "lots",
                    "npc_changes": [
                        {"npc_id": null, "hunger_before": 10, "hunger_after": 20, "died": true},
                        "junk",
                    ],
                    "summary": 9,
                },
            ],
        }));
        assert_eq!(world.day_logs.len(), 1);
        let log = &world.day_logs[0];
        assert_eq!(log.day, 1);
        assert_eq!(log.food_stock_before, 0);
        assert_eq!(log.food_stock_after, 0);
        assert_eq!(log.npc_changes.len(), 1);
        assert!(log.npc_changes[0].died);
        assert!(log.npc_changes[0].npc_id.is_none());
        assert!(log.summary.is_none());
    }

    #[test]
    fn unknown_top_level_fields_are_preserved() {
        let (world, _) = normalize(json!({
            "day": 2,
            "weather": "rain",
            "mods": {"enabled": true},
        }));
        assert_eq!(world.extra.get("weather").unwrap(), &json!("rain"));
        assert_eq!(world.extra.get("mods").unwrap(), &json!({"enabled": true}));
    }

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
            any::<f64>().prop_map(Value::from),
            "[a-z]{0,8}".prop_map(Value::from),
        ];
        leaf.prop_recursive(3, 32, 8, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::from),
                prop::collection::btree_map("[a-z_]{1,12}", inner, 0..6)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(value in arb_json()) {
            let (once, _) = normalize(value);
            let reencoded = serde_json::to_value(&once).unwrap();
            let (twice, repairs) = normalize(reencoded);
            prop_assert_eq!(&twice, &once);
            prop_assert!(repairs.is_empty(), "second pass repaired: {:?}", repairs);
        }

        #[test]
        fn normalized_worlds_always_validate(value in arb_json()) {
            let (world, _) = normalize(value);
            prop_assert!(sim_core::validate_world(&world).is_ok());
        }
    }
}
