use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Parser;
use echo_maze::command::{parse_command, Command, HELP_TEXT};
use echo_maze::constants::{
    bearing_pan, cue_tone_hz, BLOCKED_CUE_MS, DEFAULT_SAVE_FILE, MOVE_CUE_MS, SONAR_STEP_MS,
};
use echo_maze::engine::GameEngine;
use echo_maze::level::{load_level_file, sample_level};
use echo_maze::save_store::SaveStore;
use echo_maze::types::{CueKind, GameEvent, MoveOutcome, SonarCue};
use echo_maze::world::WorldGraph;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Level definition file; the built-in level is used when omitted.
    #[arg(long)]
    level: Option<PathBuf>,
    /// Save slot location.
    #[arg(long)]
    save: Option<PathBuf>,
    /// Start fresh even when a save slot exists.
    #[arg(long)]
    new: bool,
}

fn main() {
    let cli = Cli::parse();
    let world = match load_world(&cli) {
        Ok(world) => world,
        Err(error) => {
            eprintln!("[play] failed to load level: {error}");
            std::process::exit(2);
        }
    };
    let store = SaveStore::new(
        cli.save
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SAVE_FILE)),
    );

    let mut engine = build_engine(world, &store, cli.new);
    print_status(&mut engine);

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("> ");
        let _ = stdout.flush();
        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(error) => {
                eprintln!("[play] failed to read input: {error}");
                break;
            }
        }
        if line.trim().is_empty() {
            continue;
        }
        let Some(command) = parse_command(&line) else {
            println!("unknown command (try 'help')");
            continue;
        };
        if !dispatch(&mut engine, &store, command) {
            break;
        }
    }
    println!("goodbye");
}

fn build_engine(world: WorldGraph, store: &SaveStore, force_new: bool) -> GameEngine {
    if !force_new {
        if let Some(save) = store.load() {
            match GameEngine::resume(world.clone(), &save) {
                Some(engine) => {
                    println!("(resumed from {})", store.file_path().display());
                    return engine;
                }
                None => {
                    eprintln!("[play] save does not match this level, starting fresh");
                }
            }
        }
    }
    GameEngine::new(world)
}

/// Runs one command against the engine. Returns false when the session ends.
fn dispatch(engine: &mut GameEngine, store: &SaveStore, command: Command) -> bool {
    match command {
        Command::Forward => {
            let outcome = engine.move_forward();
            // the text front end plays no audio, so acknowledge the cue at once
            if outcome == MoveOutcome::Moved {
                engine.cue_finished();
            }
            render_events(engine);
        }
        Command::Left => {
            engine.rotate_left();
            render_events(engine);
        }
        Command::Right => {
            engine.rotate_right();
            render_events(engine);
        }
        Command::TurnAround => {
            engine.turn_around();
            render_events(engine);
        }
        Command::Face(direction) => {
            engine.face(direction);
            render_events(engine);
        }
        Command::Sonar => {
            engine.activate_sonar();
            render_events(engine);
        }
        Command::Interact => {
            engine.interact();
            render_events(engine);
        }
        Command::Cycle => {
            engine.cycle_inventory();
            render_events(engine);
        }
        Command::Save => {
            if engine.save(store) {
                println!("saved to {}", store.file_path().display());
            } else {
                println!("save failed");
            }
        }
        Command::Status => print_status(engine),
        Command::Help => println!("{HELP_TEXT}"),
        Command::Quit => return false,
    }
    true
}

fn render_events(engine: &mut GameEngine) {
    let snapshot = engine.build_snapshot(true);
    for event in &snapshot.events {
        match event {
            GameEvent::RoomChanged { room_id, .. } => {
                println!("you step forward ({MOVE_CUE_MS}ms footsteps) into {room_id}");
                if let Some(node) = engine.world().get_node(room_id) {
                    let view = node.view();
                    if !view.description.is_empty() {
                        println!("  {}", view.description);
                    }
                    if !view.ambience.is_empty() {
                        println!("  [ambience: {}]", view.ambience);
                    }
                }
            }
            GameEvent::MoveBlocked { direction, locked } => {
                let sound = if *locked { "rattle" } else { "thud" };
                println!("{sound} to the {direction:?} ({BLOCKED_CUE_MS}ms)");
            }
            GameEvent::OrientationChanged { facing } => {
                println!("now facing {}", facing.as_str());
            }
            GameEvent::SonarPing { cues } => {
                for cue in cues {
                    println!("  {}", describe_cue(cue));
                }
            }
            GameEvent::ItemPickedUp { item_id, sound } => {
                println!("picked up {item_id} [{sound}]");
            }
            GameEvent::SelectionChanged { item_id } => match item_id {
                Some(id) => println!("selected: {id}"),
                None => println!("selected: (nothing)"),
            },
            GameEvent::PassageUnlocked { lock_id, item_id } => {
                println!("{item_id} turns, {lock_id} swings open");
            }
            GameEvent::Interaction { message, .. } => {
                println!("{message}");
            }
            GameEvent::SequenceProgress { puzzle_id, length } => {
                println!("a faint chime ({puzzle_id}: {length})");
            }
            GameEvent::SequenceReset { puzzle_id } => {
                println!("a flat buzz ({puzzle_id} resets)");
            }
            GameEvent::PuzzleCompleted { puzzle_id } => {
                println!("a triumphant chord! {puzzle_id} is solved");
            }
        }
    }
}

fn describe_cue(cue: &SonarCue) -> String {
    let label = match cue.kind {
        CueKind::Open => "open passage".to_string(),
        CueKind::Wall => "wall".to_string(),
        CueKind::Locked => match &cue.required_item {
            Some(item) => format!("locked (needs {item})"),
            None => "locked".to_string(),
        },
        CueKind::ItemAhead => match &cue.item_sound {
            Some(sound) => format!("something ahead [{sound}]"),
            None => "something ahead".to_string(),
        },
    };
    format!(
        "{} ({:?}): {label} [{:.1} Hz, pan {:+.1}, {}ms apart]",
        cue.direction.as_str(),
        cue.bearing,
        cue_tone_hz(cue.kind),
        bearing_pan(cue.bearing),
        SONAR_STEP_MS
    )
}

fn print_status(engine: &mut GameEngine) {
    let snapshot = engine.build_snapshot(false);
    println!(
        "room: {} ({}), facing {}",
        snapshot.room.name,
        snapshot.room.id,
        snapshot.facing.as_str()
    );
    if snapshot.inventory.is_empty() {
        println!("inventory: (empty)");
    } else {
        let names: Vec<String> = snapshot
            .inventory
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                if idx as i32 == snapshot.selected_index {
                    format!("[{}]", item.name)
                } else {
                    item.name.clone()
                }
            })
            .collect();
        println!("inventory: {}", names.join(", "));
    }
    if !snapshot.completed_puzzles.is_empty() {
        println!("solved: {}", snapshot.completed_puzzles.join(", "));
    }
}

fn load_world(cli: &Cli) -> Result<WorldGraph, echo_maze::world::LevelError> {
    let level = match cli.level.as_ref() {
        Some(path) => load_level_file(path)?,
        None => sample_level(),
    };
    WorldGraph::load_level(level)
}
