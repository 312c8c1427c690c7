use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::{Direction, TriggerType};
use crate::world::LevelError;

/// Level document consumed by `WorldGraph::load_level`. This is the boundary
/// format: per-room exits name either a neighbor room or a lock, and locks
/// and puzzles are declared in global lists.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LevelData {
    #[serde(rename = "startRoom", alias = "start_room")]
    pub start_room: String,
    #[serde(rename = "startFacing", alias = "start_facing")]
    pub start_facing: Direction,
    pub rooms: Vec<RoomData>,
    #[serde(default)]
    pub locks: Vec<LockData>,
    #[serde(default)]
    pub puzzles: Vec<PuzzleData>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoomData {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub ambience: String,
    #[serde(default)]
    pub exits: BTreeMap<Direction, ExitData>,
    #[serde(default)]
    pub item: Option<ItemData>,
}

/// An exit is either a plain neighbor id or a reference to a locked passage.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExitData {
    Open(String),
    Locked { lock: String },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LockData {
    pub id: String,
    pub room: String,
    pub direction: Direction,
    pub requires: String,
    pub target: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PuzzleData {
    pub id: String,
    pub room: String,
    pub trigger: TriggerType,
    pub sequence: Vec<Direction>,
    #[serde(default)]
    pub requires: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ItemData {
    pub id: String,
    pub name: String,
    pub sound: String,
}

pub fn load_level_file(path: &Path) -> Result<LevelData, LevelError> {
    let text = fs::read_to_string(path)?;
    let data: LevelData = serde_json::from_str(&text)?;
    Ok(data)
}

/// The built-in museum level: five rooms, one lock/key pair and two sequence
/// puzzles. Used by both binaries when no level file is given, and as a
/// fixture across the test suites.
pub fn sample_level() -> LevelData {
    fn open(target: &str) -> ExitData {
        ExitData::Open(target.to_string())
    }

    fn room(
        id: &str,
        name: &str,
        description: &str,
        ambience: &str,
        exits: Vec<(Direction, ExitData)>,
        item: Option<ItemData>,
    ) -> RoomData {
        RoomData {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            ambience: ambience.to_string(),
            exits: exits.into_iter().collect(),
            item,
        }
    }

    LevelData {
        start_room: "foyer".to_string(),
        start_facing: Direction::North,
        rooms: vec![
            room(
                "foyer",
                "Foyer",
                "A tall entrance hall. Your footsteps echo off marble.",
                "hall",
                vec![
                    (Direction::North, open("gallery")),
                    (
                        Direction::East,
                        ExitData::Locked {
                            lock: "brass_gate".to_string(),
                        },
                    ),
                    (Direction::West, open("organ_loft")),
                ],
                None,
            ),
            room(
                "gallery",
                "Long Gallery",
                "Paintings you will never see line the walls.",
                "gallery",
                vec![(Direction::South, open("foyer"))],
                Some(ItemData {
                    id: "brass_key".to_string(),
                    name: "brass key".to_string(),
                    sound: "key_jingle".to_string(),
                }),
            ),
            room(
                "organ_loft",
                "Organ Loft",
                "Dusty pipes hum faintly when you move.",
                "organ",
                vec![(Direction::East, open("foyer"))],
                None,
            ),
            room(
                "archive",
                "Archive",
                "Shelves of brittle paper swallow every sound.",
                "archive",
                vec![
                    (Direction::West, open("foyer")),
                    (Direction::North, open("vault")),
                ],
                Some(ItemData {
                    id: "tuning_fork".to_string(),
                    name: "tuning fork".to_string(),
                    sound: "fork_ring".to_string(),
                }),
            ),
            room(
                "vault",
                "Resonance Vault",
                "The air itself seems to ring here.",
                "vault",
                vec![(Direction::South, open("archive"))],
                None,
            ),
        ],
        locks: vec![LockData {
            id: "brass_gate".to_string(),
            room: "foyer".to_string(),
            direction: Direction::East,
            requires: "brass_key".to_string(),
            target: "archive".to_string(),
        }],
        puzzles: vec![
            PuzzleData {
                id: "organ_chords".to_string(),
                room: "organ_loft".to_string(),
                trigger: TriggerType::Rotation,
                sequence: vec![Direction::East, Direction::North, Direction::East],
                requires: None,
            },
            PuzzleData {
                id: "vault_resonance".to_string(),
                room: "vault".to_string(),
                trigger: TriggerType::FacingScan,
                sequence: vec![Direction::North, Direction::West],
                requires: Some("tuning_fork".to_string()),
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_data_parses_both_encodings() {
        let raw = r#"{
            "id": "a",
            "name": "A",
            "exits": {
                "north": "b",
                "east": { "lock": "gate_1" }
            }
        }"#;
        let parsed: RoomData = serde_json::from_str(raw).expect("room parses");
        assert!(matches!(
            parsed.exits.get(&Direction::North),
            Some(ExitData::Open(target)) if target == "b"
        ));
        assert!(matches!(
            parsed.exits.get(&Direction::East),
            Some(ExitData::Locked { lock }) if lock == "gate_1"
        ));
        assert!(parsed.exits.get(&Direction::South).is_none());
    }

    #[test]
    fn level_round_trips_through_json() {
        let level = sample_level();
        let text = serde_json::to_string(&level).expect("level serializes");
        let parsed: LevelData = serde_json::from_str(&text).expect("level parses");
        assert_eq!(parsed.start_room, "foyer");
        assert_eq!(parsed.rooms.len(), level.rooms.len());
        assert_eq!(parsed.locks.len(), 1);
        assert_eq!(parsed.puzzles.len(), 2);
    }

    #[test]
    fn sample_level_has_consistent_lock_placement() {
        let level = sample_level();
        let lock = &level.locks[0];
        let owner = level
            .rooms
            .iter()
            .find(|room| room.id == lock.room)
            .expect("lock owner exists");
        assert!(matches!(
            owner.exits.get(&lock.direction),
            Some(ExitData::Locked { lock: id }) if *id == lock.id
        ));
    }
}
