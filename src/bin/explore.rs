use clap::Parser;
use echo_maze::engine::GameEngine;
use echo_maze::level::{load_level_file, sample_level};
use echo_maze::types::{Direction, GameEvent, MoveOutcome, Snapshot};
use echo_maze::world::WorldGraph;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    single: bool,
    #[arg(long)]
    steps: Option<u64>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    level: Option<PathBuf>,
    #[arg(long)]
    run_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct Scenario {
    name: String,
    steps: u64,
    seed: u64,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioResultLine {
    scenario: String,
    seed: u64,
    steps: u64,
    moves: u64,
    blocked: u64,
    busy: u64,
    pickups: u64,
    unlocks: u64,
    #[serde(rename = "puzzlesCompleted")]
    puzzles_completed: u64,
    #[serde(rename = "sonarPings")]
    sonar_pings: u64,
    #[serde(rename = "roomsVisited")]
    rooms_visited: usize,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    step: u64,
    message: String,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioRunResult {
    #[serde(flatten)]
    result: ScenarioResultLine,
    #[serde(rename = "anomalyRecords")]
    anomaly_records: Vec<AnomalyRecord>,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    #[serde(rename = "scenarioCount")]
    scenario_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "totalSteps")]
    total_steps: u64,
    scenarios: Vec<ScenarioResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    timestamp_ms: u64,
    level: String,
    event: String,
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    scenario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    step: Option<u64>,
    details: Value,
}

fn main() {
    let cli = Cli::parse();
    let world = match load_world(&cli) {
        Ok(world) => world,
        Err(error) => {
            eprintln!("[explore] failed to load level: {error}");
            std::process::exit(2);
        }
    };
    let scenarios = resolve_scenarios(&cli);
    let run_started_at_ms = now_ms();
    let seed_hint = scenarios.first().map(|scenario| scenario.seed).unwrap_or(0);
    let run_id = cli
        .run_id
        .clone()
        .unwrap_or_else(|| default_run_id(seed_hint, run_started_at_ms));
    let mut has_anomaly = false;
    let mut scenario_results = Vec::new();
    let mut total_steps = 0u64;
    let mut total_anomalies = 0usize;

    for scenario in scenarios {
        emit_log(
            "info",
            "scenario_started",
            &run_id,
            Some(&scenario.name),
            Some(scenario.seed),
            None,
            json!({
                "steps": scenario.steps,
            }),
        );
        let scenario_run = run_scenario(&scenario, world.clone());

        for anomaly in &scenario_run.anomaly_records {
            emit_log(
                "warn",
                "anomaly_detected",
                &run_id,
                Some(&scenario.name),
                Some(scenario.seed),
                Some(anomaly.step),
                json!({
                    "message": anomaly.message,
                }),
            );
        }

        if !scenario_run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += scenario_run.anomaly_records.len();
        total_steps += scenario_run.result.steps;

        emit_log(
            "info",
            "scenario_finished",
            &run_id,
            Some(&scenario.name),
            Some(scenario.seed),
            Some(scenario_run.result.steps),
            json!({
                "moves": scenario_run.result.moves,
                "roomsVisited": scenario_run.result.rooms_visited,
                "puzzlesCompleted": scenario_run.result.puzzles_completed,
                "anomalyCount": scenario_run.anomaly_records.len(),
            }),
        );

        println!(
            "{}",
            serde_json::to_string(&scenario_run.result).expect("scenario result should serialize")
        );
        scenario_results.push(scenario_run.result);
    }

    let run_finished_at_ms = now_ms();
    let summary = RunSummary {
        run_id: run_id.clone(),
        started_at_ms: run_started_at_ms,
        finished_at_ms: run_finished_at_ms,
        scenario_count: scenario_results.len(),
        anomaly_count: total_anomalies,
        total_steps,
        scenarios: scenario_results,
    };

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &run_id,
                None,
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "run_finished",
        &run_id,
        None,
        None,
        None,
        json!({
            "scenarioCount": summary.scenario_count,
            "anomalyCount": summary.anomaly_count,
            "totalSteps": summary.total_steps,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn run_scenario(scenario: &Scenario, world: WorldGraph) -> ScenarioRunResult {
    let mut engine = GameEngine::new(world);
    let mut rng = StdRng::seed_from_u64(scenario.seed);

    let mut moves = 0u64;
    let mut blocked = 0u64;
    let mut busy = 0u64;
    let mut pickups = 0u64;
    let mut unlocks = 0u64;
    let mut puzzles_completed = 0u64;
    let mut sonar_pings = 0u64;
    let mut rooms_visited = HashSet::new();
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();

    rooms_visited.insert(engine.player().room().to_string());
    let mut unlocked_before = engine.player().unlocked_passages().len();
    let mut completed_before = engine.player().completed_puzzles().len();

    for step in 0..scenario.steps {
        let previous_room = engine.player().room().to_string();
        let mut expected_room_changes = 0u64;

        match rng.random_range(0..100u32) {
            0..=34 => match engine.move_forward() {
                MoveOutcome::Moved => {
                    moves += 1;
                    expected_room_changes = 1;
                }
                MoveOutcome::Wall | MoveOutcome::Locked => blocked += 1,
                MoveOutcome::Busy => busy += 1,
            },
            35..=49 => {
                engine.rotate_right();
            }
            50..=59 => {
                engine.rotate_left();
            }
            60..=64 => {
                engine.turn_around();
            }
            65..=79 => {
                engine.activate_sonar();
                sonar_pings += 1;
            }
            80..=89 => {
                engine.interact();
            }
            90..=94 => {
                engine.cycle_inventory();
            }
            _ => engine.cue_finished(),
        }

        // the cue ack is only probabilistic above, so force it now and then
        // to keep the walk from starving on the in-flight guard
        if engine.is_move_in_flight() && rng.random_range(0..4u32) == 0 {
            engine.cue_finished();
        }

        let snapshot = engine.build_snapshot(true);
        rooms_visited.insert(snapshot.room.id.clone());

        let mut room_changes = 0u64;
        for event in &snapshot.events {
            match event {
                GameEvent::RoomChanged { .. } => room_changes += 1,
                GameEvent::ItemPickedUp { .. } => pickups += 1,
                GameEvent::PassageUnlocked { .. } => unlocks += 1,
                GameEvent::PuzzleCompleted { .. } => puzzles_completed += 1,
                _ => {}
            }
        }
        if room_changes != expected_room_changes {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                step,
                format!(
                    "room change events {room_changes} do not match accepted moves {expected_room_changes}"
                ),
            );
        }
        if expected_room_changes == 0 && snapshot.room.id != previous_room {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                step,
                format!(
                    "room changed from {previous_room} to {} without an accepted move",
                    snapshot.room.id
                ),
            );
        }

        for message in collect_snapshot_anomalies(&engine, &snapshot) {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                step,
                message,
            );
        }

        let unlocked_now = engine.player().unlocked_passages().len();
        let completed_now = engine.player().completed_puzzles().len();
        if unlocked_now < unlocked_before {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                step,
                format!("unlocked passages shrank from {unlocked_before} to {unlocked_now}"),
            );
        }
        if completed_now < completed_before {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                step,
                format!("completed puzzles shrank from {completed_before} to {completed_now}"),
            );
        }
        unlocked_before = unlocked_now;
        completed_before = completed_now;
    }

    ScenarioRunResult {
        result: ScenarioResultLine {
            scenario: scenario.name.clone(),
            seed: scenario.seed,
            steps: scenario.steps,
            moves,
            blocked,
            busy,
            pickups,
            unlocks,
            puzzles_completed,
            sonar_pings,
            rooms_visited: rooms_visited.len(),
            anomalies,
        },
        anomaly_records,
    }
}

fn collect_snapshot_anomalies(engine: &GameEngine, snapshot: &Snapshot) -> Vec<String> {
    let mut anomalies = Vec::new();

    if engine.world().get_node(&snapshot.room.id).is_none() {
        anomalies.push(format!("player is in unknown room: {}", snapshot.room.id));
    }

    let inventory_len = snapshot.inventory.len() as i32;
    if snapshot.selected_index < -1 || snapshot.selected_index >= inventory_len {
        anomalies.push(format!(
            "selected index {} out of range for inventory of {}",
            snapshot.selected_index, inventory_len
        ));
    }

    let mut item_ids = HashSet::new();
    for item in &snapshot.inventory {
        if !item_ids.insert(item.id.clone()) {
            anomalies.push(format!("duplicate inventory item: {}", item.id));
        }
    }

    if !Direction::ALL.contains(&snapshot.facing) {
        anomalies.push("invalid facing direction".to_string());
    }

    anomalies
}

fn load_world(cli: &Cli) -> Result<WorldGraph, echo_maze::world::LevelError> {
    let level = match cli.level.as_ref() {
        Some(path) => load_level_file(path)?,
        None => sample_level(),
    };
    WorldGraph::load_level(level)
}

fn resolve_scenarios(cli: &Cli) -> Vec<Scenario> {
    let seed = cli.seed.unwrap_or_else(now_ms);

    if cli.single || cli.steps.is_some() {
        let steps = cli.steps.unwrap_or(1_000).clamp(1, 1_000_000);
        return vec![Scenario {
            name: format!("custom-{steps}"),
            steps,
            seed,
        }];
    }

    vec![
        Scenario {
            name: "quick-walk".to_string(),
            steps: 500,
            seed,
        },
        Scenario {
            name: "long-walk".to_string(),
            steps: 5_000,
            seed: seed.wrapping_add(1),
        },
    ]
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    step: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        step,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_run_id(seed: u64, timestamp_ms: u64) -> String {
    format!("walk-{seed}-{timestamp_ms}")
}

fn emit_log(
    level: &str,
    event: &str,
    run_id: &str,
    scenario: Option<&str>,
    seed: Option<u64>,
    step: Option<u64>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp_ms: now_ms(),
        level: level.to_string(),
        event: event.to_string(),
        run_id: run_id.to_string(),
        scenario: scenario.map(|value| value.to_string()),
        seed,
        step,
        details,
    };
    eprintln!(
        "{}",
        serde_json::to_string(&log_line).expect("structured log should serialize")
    );
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).expect("run summary should serialize");
    std::fs::write(path, summary_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_run_id_contains_seed_and_timestamp() {
        assert_eq!(default_run_id(42, 123456789), "walk-42-123456789");
    }

    #[test]
    fn push_anomaly_keeps_records_and_deduplicates_summary_messages() {
        let mut anomalies = Vec::new();
        let mut records = Vec::new();
        let mut seen = HashSet::new();
        push_anomaly(
            &mut anomalies,
            &mut records,
            &mut seen,
            10,
            "same anomaly".to_string(),
        );
        push_anomaly(
            &mut anomalies,
            &mut records,
            &mut seen,
            11,
            "same anomaly".to_string(),
        );

        assert_eq!(anomalies.len(), 1);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].step, 10);
        assert_eq!(records[1].step, 11);
    }

    #[test]
    fn same_seed_produces_identical_walks() {
        let world = WorldGraph::load_level(sample_level()).expect("sample level loads");
        let scenario = Scenario {
            name: "repro".to_string(),
            steps: 300,
            seed: 7,
        };
        let first = run_scenario(&scenario, world.clone());
        let second = run_scenario(&scenario, world);
        assert_eq!(first.result.moves, second.result.moves);
        assert_eq!(first.result.pickups, second.result.pickups);
        assert_eq!(first.result.rooms_visited, second.result.rooms_visited);
    }

    #[test]
    fn random_walk_stays_anomaly_free() {
        let world = WorldGraph::load_level(sample_level()).expect("sample level loads");
        for seed in [1u64, 99, 4242] {
            let scenario = Scenario {
                name: format!("soak-{seed}"),
                steps: 2_000,
                seed,
            };
            let run = run_scenario(&scenario, world.clone());
            assert!(
                run.result.anomalies.is_empty(),
                "seed {seed}: {:?}",
                run.result.anomalies
            );
        }
    }

    #[test]
    fn resolve_scenarios_honors_explicit_steps() {
        let cli = Cli {
            single: false,
            steps: Some(50),
            seed: Some(3),
            level: None,
            run_id: None,
            summary_out: None,
        };
        let scenarios = resolve_scenarios(&cli);
        assert_eq!(scenarios.len(), 1);
        assert_eq!(scenarios[0].steps, 50);
        assert_eq!(scenarios[0].seed, 3);
    }
}
