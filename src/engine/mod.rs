use crate::player::PlayerState;
use crate::save_store::SaveStore;
use crate::types::{
    Direction, GameEvent, InteractionKind, ItemView, MoveOutcome, RoomView, SaveData, Snapshot,
    SonarCue, TriggerType,
};
use crate::world::{Exit, WorldGraph};

pub mod puzzle_system;
pub mod sonar_system;

use self::puzzle_system::{PuzzleStep, PuzzleTable};

/// The navigation core. Owns the world graph and the session state, maps
/// input commands 1:1 onto operations, and queues events for the external
/// audio/UI collaborators, which drain them through `build_snapshot`.
#[derive(Clone, Debug)]
pub struct GameEngine {
    world: WorldGraph,
    player: PlayerState,
    puzzles: PuzzleTable,
    move_in_flight: bool,
    events: Vec<GameEvent>,
}

impl GameEngine {
    pub fn new(world: WorldGraph) -> Self {
        let player = PlayerState::new(&world.start_room, world.start_facing);
        Self {
            world,
            player,
            puzzles: PuzzleTable::default(),
            move_in_flight: false,
            events: Vec::new(),
        }
    }

    /// Reconstructs a session from the save slot. Collected flags are
    /// replayed for held items and for the required items of every recorded
    /// unlock, so a key consumed at a gate does not respawn.
    pub fn resume(mut world: WorldGraph, save: &SaveData) -> Option<Self> {
        let player = PlayerState::from_save_data(&world, save)?;
        let mut collected: Vec<String> = save.inventory.clone();
        for lock_id in &save.unlocked_passages {
            if let Some(lock) = world.lock(lock_id) {
                collected.push(lock.requires.clone());
            }
        }
        world.mark_items_collected(&collected);
        Some(Self {
            world,
            player,
            puzzles: PuzzleTable::default(),
            move_in_flight: false,
            events: Vec::new(),
        })
    }

    pub fn world(&self) -> &WorldGraph {
        &self.world
    }

    pub fn player(&self) -> &PlayerState {
        &self.player
    }

    pub fn is_move_in_flight(&self) -> bool {
        self.move_in_flight
    }

    pub fn puzzle_progress(&self, puzzle_id: &str) -> usize {
        self.puzzles.progress_len(puzzle_id)
    }

    /// Attempts one step in the facing direction. Exactly one move may be in
    /// flight at a time: while the previous move's cue is unacknowledged,
    /// further calls are dropped without any event.
    pub fn move_forward(&mut self) -> MoveOutcome {
        if self.move_in_flight {
            return MoveOutcome::Busy;
        }
        let direction = self.player.facing();
        let room = self.player.room().to_string();
        match self.world.exit(&room, direction) {
            None => {
                self.events.push(GameEvent::MoveBlocked {
                    direction,
                    locked: false,
                });
                MoveOutcome::Wall
            }
            Some(Exit::Locked(lock_id)) if !self.player.is_passage_unlocked(lock_id) => {
                self.events.push(GameEvent::MoveBlocked {
                    direction,
                    locked: true,
                });
                MoveOutcome::Locked
            }
            Some(exit) => {
                let target = match exit {
                    Exit::Open(target) => target.clone(),
                    Exit::Locked(lock_id) => match self.world.lock(lock_id) {
                        Some(lock) => lock.target.clone(),
                        None => {
                            self.events.push(GameEvent::MoveBlocked {
                                direction,
                                locked: true,
                            });
                            return MoveOutcome::Locked;
                        }
                    },
                };
                self.commit_move(room, target, direction);
                MoveOutcome::Moved
            }
        }
    }

    fn commit_move(&mut self, previous: String, target: String, direction: Direction) {
        self.player.move_to(&target);
        self.move_in_flight = true;
        self.puzzles.reset_room_progress(&self.world, &previous);
        self.events.push(GameEvent::RoomChanged {
            room_id: target,
            previous: Some(previous),
        });
        self.apply_puzzle_trigger(TriggerType::RoomEntry, direction);
    }

    /// Acknowledgement from the audio side that the movement cue finished
    /// playing; re-enables `move_forward`.
    pub fn cue_finished(&mut self) {
        self.move_in_flight = false;
    }

    pub fn rotate_left(&mut self) -> Direction {
        let facing = self.player.facing().left();
        self.apply_facing(facing)
    }

    pub fn rotate_right(&mut self) -> Direction {
        let facing = self.player.facing().right();
        self.apply_facing(facing)
    }

    pub fn turn_around(&mut self) -> Direction {
        let facing = self.player.facing().opposite();
        self.apply_facing(facing)
    }

    pub fn face(&mut self, direction: Direction) -> Direction {
        self.apply_facing(direction)
    }

    fn apply_facing(&mut self, facing: Direction) -> Direction {
        self.player.set_facing(facing);
        self.events.push(GameEvent::OrientationChanged { facing });
        self.apply_puzzle_trigger(TriggerType::Rotation, facing);
        facing
    }

    /// Probes the four directions around the current room and queues the
    /// structured cues for the audio collaborator. Reads state only.
    pub fn activate_sonar(&mut self) -> Vec<SonarCue> {
        let cues = sonar_system::sweep(&self.world, &self.player);
        self.events.push(GameEvent::SonarPing { cues: cues.clone() });
        self.apply_puzzle_trigger(TriggerType::FacingScan, self.player.facing());
        cues
    }

    /// The two-step interaction rule: an uncollected item in the room is
    /// picked up first, unconditionally; otherwise the selected item is
    /// tried against a locked passage in the facing direction.
    pub fn interact(&mut self) -> InteractionKind {
        let room = self.player.room().to_string();

        if self.world.uncollected_item_at(&room).is_some() {
            if let Some(item) = self.world.collect_item(&room) {
                if self.player.pick_up(item.clone()) {
                    self.events.push(GameEvent::ItemPickedUp {
                        item_id: item.id.clone(),
                        sound: item.sound.clone(),
                    });
                    self.events.push(GameEvent::SelectionChanged {
                        item_id: Some(item.id.clone()),
                    });
                    self.push_interaction(
                        InteractionKind::Pickup,
                        format!("picked up the {}", item.name),
                        Some(item.id),
                    );
                    return InteractionKind::Pickup;
                }
            }
        }

        let direction = self.player.facing();
        if let Some(lock) = self.world.get_lock(&room, direction) {
            if !self.player.is_passage_unlocked(&lock.id) {
                let lock_id = lock.id.clone();
                let requires = lock.requires.clone();
                return match self.player.selected_item().cloned() {
                    Some(item) if item.id == requires => {
                        self.player.unlock_passage(&lock_id);
                        self.player.remove_item(&item.id);
                        self.events.push(GameEvent::PassageUnlocked {
                            lock_id,
                            item_id: item.id.clone(),
                        });
                        self.events.push(GameEvent::SelectionChanged {
                            item_id: self
                                .player
                                .selected_item()
                                .map(|selected| selected.id.clone()),
                        });
                        self.push_interaction(
                            InteractionKind::Unlock,
                            format!("the {} opens the passage", item.name),
                            Some(item.id),
                        );
                        InteractionKind::Unlock
                    }
                    Some(item) => {
                        self.push_interaction(
                            InteractionKind::Error,
                            format!("the {} does not fit", item.name),
                            Some(item.id),
                        );
                        InteractionKind::Error
                    }
                    None => {
                        self.push_interaction(
                            InteractionKind::Nothing,
                            "nothing happens".to_string(),
                            None,
                        );
                        InteractionKind::Nothing
                    }
                };
            }
        }

        self.push_interaction(InteractionKind::Nothing, "nothing happens".to_string(), None);
        InteractionKind::Nothing
    }

    pub fn cycle_inventory(&mut self) -> Option<ItemView> {
        let item = self.player.select_next();
        self.events.push(GameEvent::SelectionChanged {
            item_id: item.as_ref().map(|selected| selected.id.clone()),
        });
        item
    }

    pub fn save(&self, store: &SaveStore) -> bool {
        store.save(&self.player.to_save_data())
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let room = match self.world.get_node(self.player.room()) {
            Some(node) => node.view(),
            None => RoomView {
                id: self.player.room().to_string(),
                name: String::new(),
                description: String::new(),
                ambience: String::new(),
                item: None,
            },
        };
        let snapshot = Snapshot {
            room,
            facing: self.player.facing(),
            inventory: self.player.inventory().to_vec(),
            selected_index: self.player.selected_index(),
            unlocked_passages: self.player.unlocked_passages().iter().cloned().collect(),
            completed_puzzles: self.player.completed_puzzles().iter().cloned().collect(),
            events: if include_events {
                self.events.clone()
            } else {
                Vec::new()
            },
        };
        if include_events {
            self.events.clear();
        }
        snapshot
    }

    fn push_interaction(&mut self, kind: InteractionKind, message: String, item_id: Option<String>) {
        self.events.push(GameEvent::Interaction {
            kind,
            message,
            item_id,
        });
    }

    fn apply_puzzle_trigger(&mut self, trigger: TriggerType, direction: Direction) {
        let room = self.player.room().to_string();
        let steps = self
            .puzzles
            .apply(&self.world, &self.player, &room, trigger, direction);
        for step in steps {
            match step {
                PuzzleStep::Advanced { puzzle_id, length } => {
                    self.events
                        .push(GameEvent::SequenceProgress { puzzle_id, length });
                }
                PuzzleStep::Reset { puzzle_id } => {
                    self.events.push(GameEvent::SequenceReset { puzzle_id });
                }
                PuzzleStep::Completed { puzzle_id } => {
                    if !self.player.is_sequence_completed(&puzzle_id) {
                        self.player.complete_sequence(&puzzle_id);
                        self.events.push(GameEvent::PuzzleCompleted { puzzle_id });
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{sample_level, PuzzleData};
    use crate::types::CueKind;

    fn engine() -> GameEngine {
        let world = WorldGraph::load_level(sample_level()).expect("sample level loads");
        GameEngine::new(world)
    }

    fn drain(engine: &mut GameEngine) -> Vec<GameEvent> {
        engine.build_snapshot(true).events
    }

    fn count_room_changes(events: &[GameEvent]) -> usize {
        events
            .iter()
            .filter(|event| matches!(event, GameEvent::RoomChanged { .. }))
            .count()
    }

    #[test]
    fn move_into_wall_is_rejected_without_state_change() {
        let mut engine = engine();
        engine.face(Direction::South);
        drain(&mut engine);

        assert_eq!(engine.move_forward(), MoveOutcome::Wall);
        assert_eq!(engine.player().room(), "foyer");
        assert!(!engine.is_move_in_flight());
        let events = drain(&mut engine);
        assert!(events
            .iter()
            .any(|event| matches!(event, GameEvent::MoveBlocked { locked: false, .. })));
        assert_eq!(count_room_changes(&events), 0);
    }

    #[test]
    fn locked_passage_blocks_until_unlocked() {
        let mut engine = engine();
        engine.face(Direction::East);

        // no key collected yet
        assert_eq!(engine.move_forward(), MoveOutcome::Locked);
        assert_eq!(engine.player().room(), "foyer");
        let events = drain(&mut engine);
        assert!(events
            .iter()
            .any(|event| matches!(event, GameEvent::MoveBlocked { locked: true, .. })));
    }

    #[test]
    fn second_move_is_dropped_until_cue_finishes() {
        let mut engine = engine();
        engine.face(Direction::North);
        assert_eq!(engine.move_forward(), MoveOutcome::Moved);
        assert_eq!(engine.player().room(), "gallery");
        assert!(engine.is_move_in_flight());

        engine.face(Direction::South);
        assert_eq!(engine.move_forward(), MoveOutcome::Busy);
        assert_eq!(engine.player().room(), "gallery");

        engine.cue_finished();
        assert_eq!(engine.move_forward(), MoveOutcome::Moved);
        assert_eq!(engine.player().room(), "foyer");
    }

    #[test]
    fn room_change_event_fires_exactly_once_per_accepted_move() {
        let mut engine = engine();
        engine.face(Direction::North);
        engine.move_forward();
        engine.move_forward(); // dropped: in flight
        let events = drain(&mut engine);
        assert_eq!(count_room_changes(&events), 1);
        assert!(events.iter().any(|event| matches!(
            event,
            GameEvent::RoomChanged { room_id, previous }
                if room_id == "gallery" && previous.as_deref() == Some("foyer")
        )));
    }

    #[test]
    fn reverse_move_returns_to_original_room() {
        let mut engine = engine();
        engine.face(Direction::North);
        assert_eq!(engine.move_forward(), MoveOutcome::Moved);
        engine.cue_finished();
        engine.face(Direction::North.opposite());
        assert_eq!(engine.move_forward(), MoveOutcome::Moved);
        assert_eq!(engine.player().room(), "foyer");
    }

    #[test]
    fn pickup_then_unlock_consumes_the_key() {
        let mut engine = engine();
        engine.face(Direction::North);
        engine.move_forward();
        engine.cue_finished();

        assert_eq!(engine.interact(), InteractionKind::Pickup);
        assert!(engine.player().has_item("brass_key"));

        engine.face(Direction::South);
        engine.move_forward();
        engine.cue_finished();
        engine.face(Direction::East);

        assert_eq!(engine.interact(), InteractionKind::Unlock);
        assert!(engine.player().is_passage_unlocked("brass_gate"));
        assert!(!engine.player().has_item("brass_key"));

        // the gate stays open and further interaction finds nothing
        assert_eq!(engine.interact(), InteractionKind::Nothing);
        assert_eq!(engine.move_forward(), MoveOutcome::Moved);
        assert_eq!(engine.player().room(), "archive");
    }

    #[test]
    fn wrong_item_at_lock_is_an_error_without_mutation() {
        let mut engine = engine();
        // the fork is unreachable while the gate is shut, so plant it
        engine.player.pick_up(ItemView {
            id: "tuning_fork".to_string(),
            name: "tuning fork".to_string(),
            sound: "fork_ring".to_string(),
        });
        engine.face(Direction::East);

        assert_eq!(engine.interact(), InteractionKind::Error);
        assert!(!engine.player().is_passage_unlocked("brass_gate"));
        assert!(engine.player().has_item("tuning_fork"));
    }

    #[test]
    fn interact_with_no_selection_at_lock_is_nothing() {
        let mut engine = engine();
        engine.face(Direction::East);
        assert_eq!(engine.interact(), InteractionKind::Nothing);
        assert!(!engine.player().is_passage_unlocked("brass_gate"));
    }

    #[test]
    fn rotation_puzzle_completes_once_and_mismatch_resets() {
        let mut engine = engine();
        engine.face(Direction::West);
        engine.move_forward();
        engine.cue_finished();
        assert_eq!(engine.player().room(), "organ_loft");
        drain(&mut engine);

        // east, north, west: the third rotation resets progress
        engine.face(Direction::East);
        engine.face(Direction::North);
        engine.face(Direction::West);
        let events = drain(&mut engine);
        assert!(events
            .iter()
            .any(|event| matches!(event, GameEvent::SequenceReset { .. })));
        assert_eq!(engine.puzzle_progress("organ_chords"), 0);

        // east, north, east completes, exactly once
        engine.face(Direction::East);
        engine.face(Direction::North);
        engine.face(Direction::East);
        let events = drain(&mut engine);
        let completions = events
            .iter()
            .filter(|event| matches!(event, GameEvent::PuzzleCompleted { .. }))
            .count();
        assert_eq!(completions, 1);
        assert!(engine.player().is_sequence_completed("organ_chords"));

        // replaying the sequence does not re-fire completion
        engine.face(Direction::East);
        engine.face(Direction::North);
        engine.face(Direction::East);
        let events = drain(&mut engine);
        assert_eq!(
            events
                .iter()
                .filter(|event| matches!(event, GameEvent::PuzzleCompleted { .. }))
                .count(),
            0
        );
    }

    #[test]
    fn leaving_a_room_resets_its_puzzle_progress() {
        let mut engine = engine();
        engine.face(Direction::West);
        engine.move_forward();
        engine.cue_finished();

        engine.face(Direction::East);
        engine.face(Direction::North);
        assert_eq!(engine.puzzle_progress("organ_chords"), 2);

        // walk out east mid-sequence without another rotation event
        engine.player.set_facing(Direction::East);
        engine.move_forward();
        engine.cue_finished();
        assert_eq!(engine.player().room(), "foyer");
        assert_eq!(engine.puzzle_progress("organ_chords"), 0);
    }

    #[test]
    fn room_entry_puzzle_completes_on_entry_and_goes_inert() {
        let mut level = sample_level();
        level.puzzles.push(PuzzleData {
            id: "gallery_threshold".to_string(),
            room: "gallery".to_string(),
            trigger: TriggerType::RoomEntry,
            sequence: vec![Direction::North],
            requires: None,
        });
        let world = WorldGraph::load_level(level).expect("level loads");
        let mut engine = GameEngine::new(world);

        engine.face(Direction::North);
        engine.move_forward();
        engine.cue_finished();
        let events = drain(&mut engine);
        assert!(events.iter().any(|event| matches!(
            event,
            GameEvent::PuzzleCompleted { puzzle_id } if puzzle_id == "gallery_threshold"
        )));
        assert!(engine.player().is_sequence_completed("gallery_threshold"));

        // stepping out and back in must not re-fire the completion
        engine.face(Direction::South);
        engine.move_forward();
        engine.cue_finished();
        engine.face(Direction::North);
        engine.move_forward();
        engine.cue_finished();
        assert_eq!(engine.player().room(), "gallery");
        let events = drain(&mut engine);
        assert_eq!(
            events
                .iter()
                .filter(|event| matches!(event, GameEvent::PuzzleCompleted { .. }))
                .count(),
            0
        );
    }

    #[test]
    fn sonar_feeds_facing_scan_puzzles() {
        let mut engine = engine();
        // plant the fork and walk the player into the vault directly
        engine.player.pick_up(ItemView {
            id: "tuning_fork".to_string(),
            name: "tuning fork".to_string(),
            sound: "fork_ring".to_string(),
        });
        engine.player.move_to("vault");

        engine.face(Direction::North);
        engine.activate_sonar();
        assert_eq!(engine.puzzle_progress("vault_resonance"), 1);
        engine.face(Direction::West);
        engine.activate_sonar();
        assert!(engine.player().is_sequence_completed("vault_resonance"));
    }

    #[test]
    fn sonar_never_mutates_position_or_unlocks() {
        let mut engine = engine();
        let cues = engine.activate_sonar();
        assert_eq!(cues.len(), 4);
        assert!(cues.iter().any(|cue| cue.kind == CueKind::Locked));
        assert_eq!(engine.player().room(), "foyer");
        assert_eq!(engine.player().facing(), Direction::North);
        assert!(engine.player().unlocked_passages().is_empty());
    }

    #[test]
    fn cycle_inventory_emits_selection_events() {
        let mut engine = engine();
        assert!(engine.cycle_inventory().is_none());
        let events = drain(&mut engine);
        assert!(events
            .iter()
            .any(|event| matches!(event, GameEvent::SelectionChanged { item_id: None })));
    }

    #[test]
    fn resume_replays_collected_and_consumed_items() {
        let world = WorldGraph::load_level(sample_level()).expect("sample level loads");
        let mut engine = GameEngine::new(world.clone());
        engine.face(Direction::North);
        engine.move_forward();
        engine.cue_finished();
        engine.interact(); // pick up brass key
        engine.face(Direction::South);
        engine.move_forward();
        engine.cue_finished();
        engine.face(Direction::East);
        engine.interact(); // unlock, consuming the key

        let save = engine.player().to_save_data();
        let resumed = GameEngine::resume(world, &save).expect("resume succeeds");
        assert_eq!(resumed.player().room(), "foyer");
        assert!(resumed.player().is_passage_unlocked("brass_gate"));
        // the consumed key must not reappear in the gallery
        assert!(resumed.world().uncollected_item_at("gallery").is_none());
        // the fork was never taken
        assert!(resumed.world().uncollected_item_at("archive").is_some());
    }

    #[test]
    fn snapshot_drains_events_only_when_requested() {
        let mut engine = engine();
        engine.face(Direction::East);
        let silent = engine.build_snapshot(false);
        assert!(silent.events.is_empty());
        let first = engine.build_snapshot(true);
        assert!(!first.events.is_empty());
        let second = engine.build_snapshot(true);
        assert!(second.events.is_empty());
    }
}
