#![deny(warnings)]

//! Flat-file snapshot store for the village world.
//!
//! The entire [`WorldState`] is persisted as one UTF-8 JSON document.
//! Loads never fail: a missing, unreadable, or corrupt snapshot is
//! repaired field-by-field into a well-formed world (see [`normalize`]).
//! Saves replace the destination atomically and surface I/O errors to the
//! caller.

mod normalize;

pub use normalize::{normalize, Repair};

use sim_core::{default_world, WorldState};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors surfaced when writing a snapshot. Reads repair instead of
/// erroring.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying filesystem failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// The world could not be encoded as JSON.
    #[error("serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Load the world from `path`, repairing any damage.
///
/// A missing file, unreadable bytes, invalid JSON, or a non-object root
/// all fall back to the default world. An object root is coerced
/// field-by-field; every repair is logged at `warn`.
pub fn load_world(path: &Path) -> WorldState {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            warn!(path = %path.display(), %err, "snapshot unreadable, using default world");
            return default_world();
        }
    };
    let value = match serde_json::from_str(&text) {
        Ok(value) => value,
        Err(err) => {
            warn!(path = %path.display(), %err, "snapshot is not valid json, using default world");
            return default_world();
        }
    };
    let (world, repairs) = normalize(value);
    for repair in &repairs {
        warn!(path = %path.display(), %repair, "repaired snapshot field");
    }
    debug!(path = %path.display(), day = world.day, npcs = world.npcs.len(), "loaded snapshot");
    world
}

/// Serialize `world` and replace the snapshot at `path` in one move.
///
/// The document is written to a sibling temp file first and renamed over
/// the destination, so a crash mid-write never leaves a torn snapshot.
pub fn save_world(path: &Path, world: &WorldState) -> Result<(), StoreError> {
    let text = serde_json::to_string(world)?;
    let tmp = tmp_path(path);
    fs::write(&tmp, text)?;
    fs::rename(&tmp, path)?;
    debug!(path = %path.display(), day = world.day, "saved snapshot");
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("snapshot"));
    name.push(".tmp");
    path.with_file_name(name)
}
