#![deny(warnings)]

//! Headless CLI for the village simulation backend.
//!
//! Two modes: a one-shot tick (`--state <path> --multiplier <n>`) that
//! prints the new day, and a line-oriented server (`--state <path>
//! --server`) speaking the stdin/stdout protocol consumed by front-ends.
//! Logs go to stderr; stdout is reserved for protocol responses.

use anyhow::{bail, Result};
use serde_json::{json, Value};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

struct Args {
    state: Option<PathBuf>,
    multiplier: Option<i64>,
    server: bool,
}

fn parse_args() -> Args {
    let mut args = Args {
        state: None,
        multiplier: None,
        server: false,
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--state" => args.state = it.next().map(PathBuf::from),
            "--multiplier" => args.multiplier = it.next().and_then(|s| s.parse().ok()),
            "--server" => args.server = true,
            _ => {}
        }
    }
    args
}

/// Dispatch one decoded protocol request. Runtime failures (for example a
/// snapshot that cannot be written) bubble up and are turned into error
/// responses by the caller.
fn handle_request(state_path: &Path, request: &Value) -> Result<Value> {
    match request.get("cmd").and_then(Value::as_str) {
        Some("state") => {
            let state = sim_runtime::get_state(state_path);
            Ok(json!({"ok": true, "state": state}))
        }
        Some("tick") => {
            let multiplier = request.get("multiplier").map_or(1, |v| v.as_i64().unwrap_or(1));
            let day = sim_runtime::tick(state_path, multiplier)?;
            let state = sim_runtime::get_state(state_path);
            Ok(json!({
                "ok": true,
                "day": day,
                "food_stock": state.food_stock,
                "state": state,
            }))
        }
        Some("logs") => {
            let limit = request.get("limit").map_or(20, |v| v.as_i64().unwrap_or(20));
            let logs = sim_runtime::get_logs(state_path, limit);
            Ok(json!({"ok": true, "logs": logs}))
        }
        Some("reset") => {
            let state = sim_runtime::reset(state_path)?;
            Ok(json!({"ok": true, "state": state}))
        }
        Some(other) => Ok(json!({"ok": false, "error": format!("unknown command: {other}")})),
        None => Ok(json!({"ok": false, "error": "unknown command"})),
    }
}

/// Line loop: bare integers are tick multipliers answered with the bare
/// new day; `{`-prefixed lines are JSON commands answered with a JSON
/// object. Malformed requests produce error responses without ending the
/// loop; end of input ends it with success.
fn run_server(state_path: &Path) -> Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in stdin.lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with('{') {
            let response = match serde_json::from_str::<Value>(line) {
                Ok(request) => handle_request(state_path, &request)
                    .unwrap_or_else(|err| json!({"ok": false, "error": err.to_string()})),
                Err(err) => json!({"ok": false, "error": format!("invalid json: {err}")}),
            };
            writeln!(out, "{response}")?;
            out.flush()?;
            continue;
        }
        match line.parse::<i64>() {
            Ok(multiplier) => {
                let day = sim_runtime::tick(state_path, multiplier)?;
                writeln!(out, "{day}")?;
            }
            Err(_) => writeln!(out, "0")?,
        }
        out.flush()?;
    }
    Ok(())
}

fn main() -> Result<()> {
    // Logging setup; stdout carries the protocol, so the subscriber
    // writes to stderr.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let args = parse_args();
    let Some(state_path) = args.state else {
        bail!("missing --state");
    };
    info!(path = %state_path.display(), server = args.server, "starting backend");

    if args.server {
        return run_server(&state_path);
    }

    let Some(multiplier) = args.multiplier else {
        eprintln!("missing --multiplier");
        std::process::exit(2);
    };
    let day = sim_runtime::tick(&state_path, multiplier)?;
    println!("{day}");
    Ok(())
}
