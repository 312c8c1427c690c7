use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::level::{ExitData, LevelData};
use crate::types::{Direction, ItemView, RoomView, TriggerType};

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("failed to read level file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse level file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate room id '{0}'")]
    DuplicateRoom(String),
    #[error("duplicate lock id '{0}'")]
    DuplicateLock(String),
    #[error("duplicate puzzle id '{0}'")]
    DuplicatePuzzle(String),
    #[error("duplicate item id '{0}'")]
    DuplicateItem(String),
    #[error("room '{room}' exit {direction:?} references unknown room '{target}'")]
    UnknownNeighbor {
        room: String,
        direction: Direction,
        target: String,
    },
    #[error("room '{room}' exit {direction:?} references unknown lock '{lock}'")]
    UnknownLockRef {
        room: String,
        direction: Direction,
        lock: String,
    },
    #[error("lock '{lock}' is declared for room '{room}' {direction:?} but not placed there")]
    LockPlacementMismatch {
        lock: String,
        room: String,
        direction: Direction,
    },
    #[error("lock '{lock}' references unknown room '{room}'")]
    UnknownLockRoom { lock: String, room: String },
    #[error("lock '{lock}' targets unknown room '{target}'")]
    UnknownLockTarget { lock: String, target: String },
    #[error("lock '{lock}' requires unknown item '{item}'")]
    UnknownLockItem { lock: String, item: String },
    #[error("puzzle '{puzzle}' references unknown room '{room}'")]
    UnknownPuzzleRoom { puzzle: String, room: String },
    #[error("puzzle '{puzzle}' requires unknown item '{item}'")]
    UnknownPuzzleItem { puzzle: String, item: String },
    #[error("puzzle '{puzzle}' has an empty sequence")]
    EmptySequence { puzzle: String },
    #[error("start room '{0}' does not exist")]
    UnknownStartRoom(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Exit {
    Open(String),
    Locked(String),
}

#[derive(Clone, Debug)]
pub struct WorldItem {
    pub id: String,
    pub name: String,
    pub sound: String,
    pub collected: bool,
}

impl WorldItem {
    pub fn view(&self) -> ItemView {
        ItemView {
            id: self.id.clone(),
            name: self.name.clone(),
            sound: self.sound.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Node {
    pub id: String,
    pub name: String,
    pub description: String,
    pub ambience: String,
    pub exits: BTreeMap<Direction, Exit>,
    pub item: Option<WorldItem>,
}

impl Node {
    pub fn view(&self) -> RoomView {
        RoomView {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            ambience: self.ambience.clone(),
            item: self
                .item
                .as_ref()
                .filter(|item| !item.collected)
                .map(WorldItem::view),
        }
    }
}

#[derive(Clone, Debug)]
pub struct LockedPassage {
    pub id: String,
    pub room: String,
    pub direction: Direction,
    pub requires: String,
    pub target: String,
}

#[derive(Clone, Debug)]
pub struct SequencePuzzle {
    pub id: String,
    pub room: String,
    pub trigger: TriggerType,
    pub sequence: Vec<Direction>,
    pub requires: Option<String>,
}

/// Immutable-per-session room graph. After `load_level` the only mutation is
/// the `collected` flag on items.
#[derive(Clone, Debug)]
pub struct WorldGraph {
    nodes: BTreeMap<String, Node>,
    locks: BTreeMap<String, LockedPassage>,
    puzzles: BTreeMap<String, SequencePuzzle>,
    pub start_room: String,
    pub start_facing: Direction,
}

impl WorldGraph {
    pub fn load_level(data: LevelData) -> Result<Self, LevelError> {
        let mut nodes = BTreeMap::new();
        let mut item_ids = BTreeSet::new();
        for room in &data.rooms {
            if nodes.contains_key(&room.id) {
                return Err(LevelError::DuplicateRoom(room.id.clone()));
            }
            if let Some(item) = &room.item {
                if !item_ids.insert(item.id.clone()) {
                    return Err(LevelError::DuplicateItem(item.id.clone()));
                }
            }
            nodes.insert(
                room.id.clone(),
                Node {
                    id: room.id.clone(),
                    name: room.name.clone(),
                    description: room.description.clone(),
                    ambience: room.ambience.clone(),
                    exits: BTreeMap::new(),
                    item: room.item.as_ref().map(|item| WorldItem {
                        id: item.id.clone(),
                        name: item.name.clone(),
                        sound: item.sound.clone(),
                        collected: false,
                    }),
                },
            );
        }

        let mut locks = BTreeMap::new();
        for lock in &data.locks {
            if locks.contains_key(&lock.id) {
                return Err(LevelError::DuplicateLock(lock.id.clone()));
            }
            if !nodes.contains_key(&lock.room) {
                return Err(LevelError::UnknownLockRoom {
                    lock: lock.id.clone(),
                    room: lock.room.clone(),
                });
            }
            if !nodes.contains_key(&lock.target) {
                return Err(LevelError::UnknownLockTarget {
                    lock: lock.id.clone(),
                    target: lock.target.clone(),
                });
            }
            if !item_ids.contains(&lock.requires) {
                return Err(LevelError::UnknownLockItem {
                    lock: lock.id.clone(),
                    item: lock.requires.clone(),
                });
            }
            locks.insert(
                lock.id.clone(),
                LockedPassage {
                    id: lock.id.clone(),
                    room: lock.room.clone(),
                    direction: lock.direction,
                    requires: lock.requires.clone(),
                    target: lock.target.clone(),
                },
            );
        }

        for room in &data.rooms {
            for (&direction, exit) in &room.exits {
                let resolved = match exit {
                    ExitData::Open(target) => {
                        if !nodes.contains_key(target) {
                            return Err(LevelError::UnknownNeighbor {
                                room: room.id.clone(),
                                direction,
                                target: target.clone(),
                            });
                        }
                        Exit::Open(target.clone())
                    }
                    ExitData::Locked { lock } => {
                        let Some(declared) = locks.get(lock) else {
                            return Err(LevelError::UnknownLockRef {
                                room: room.id.clone(),
                                direction,
                                lock: lock.clone(),
                            });
                        };
                        if declared.room != room.id || declared.direction != direction {
                            return Err(LevelError::LockPlacementMismatch {
                                lock: lock.clone(),
                                room: declared.room.clone(),
                                direction: declared.direction,
                            });
                        }
                        Exit::Locked(lock.clone())
                    }
                };
                if let Some(node) = nodes.get_mut(&room.id) {
                    node.exits.insert(direction, resolved);
                }
            }
        }

        let mut puzzles = BTreeMap::new();
        for puzzle in &data.puzzles {
            if puzzles.contains_key(&puzzle.id) {
                return Err(LevelError::DuplicatePuzzle(puzzle.id.clone()));
            }
            if !nodes.contains_key(&puzzle.room) {
                return Err(LevelError::UnknownPuzzleRoom {
                    puzzle: puzzle.id.clone(),
                    room: puzzle.room.clone(),
                });
            }
            if puzzle.sequence.is_empty() {
                return Err(LevelError::EmptySequence {
                    puzzle: puzzle.id.clone(),
                });
            }
            if let Some(item) = &puzzle.requires {
                if !item_ids.contains(item) {
                    return Err(LevelError::UnknownPuzzleItem {
                        puzzle: puzzle.id.clone(),
                        item: item.clone(),
                    });
                }
            }
            puzzles.insert(
                puzzle.id.clone(),
                SequencePuzzle {
                    id: puzzle.id.clone(),
                    room: puzzle.room.clone(),
                    trigger: puzzle.trigger,
                    sequence: puzzle.sequence.clone(),
                    requires: puzzle.requires.clone(),
                },
            );
        }

        if !nodes.contains_key(&data.start_room) {
            return Err(LevelError::UnknownStartRoom(data.start_room));
        }

        Ok(Self {
            nodes,
            locks,
            puzzles,
            start_room: data.start_room,
            start_facing: data.start_facing,
        })
    }

    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn exit(&self, room: &str, direction: Direction) -> Option<&Exit> {
        self.nodes.get(room)?.exits.get(&direction)
    }

    /// The locked passage gating `direction` out of `room`, independent of
    /// unlock state. None when the direction is open or leads nowhere.
    pub fn get_lock(&self, room: &str, direction: Direction) -> Option<&LockedPassage> {
        match self.exit(room, direction)? {
            Exit::Locked(lock_id) => self.locks.get(lock_id),
            Exit::Open(_) => None,
        }
    }

    pub fn lock(&self, id: &str) -> Option<&LockedPassage> {
        self.locks.get(id)
    }

    pub fn puzzle(&self, id: &str) -> Option<&SequencePuzzle> {
        self.puzzles.get(id)
    }

    pub fn puzzles(&self) -> impl Iterator<Item = &SequencePuzzle> {
        self.puzzles.values()
    }

    pub fn puzzles_in_room(&self, room: &str) -> Vec<&SequencePuzzle> {
        self.puzzles
            .values()
            .filter(|puzzle| puzzle.room == room)
            .collect()
    }

    pub fn find_item(&self, item_id: &str) -> Option<&WorldItem> {
        self.nodes
            .values()
            .find_map(|node| node.item.as_ref().filter(|item| item.id == item_id))
    }

    pub fn uncollected_item_at(&self, room: &str) -> Option<&WorldItem> {
        self.nodes
            .get(room)?
            .item
            .as_ref()
            .filter(|item| !item.collected)
    }

    /// Picks up the room's item: flips `collected` and returns its view.
    /// None when the room has no item or it was already taken.
    pub fn collect_item(&mut self, room: &str) -> Option<ItemView> {
        let item = self.nodes.get_mut(room)?.item.as_mut()?;
        if item.collected {
            return None;
        }
        item.collected = true;
        Some(item.view())
    }

    /// Replays collected state after a load.
    pub fn mark_items_collected(&mut self, ids: &[String]) {
        for node in self.nodes.values_mut() {
            if let Some(item) = node.item.as_mut() {
                if ids.iter().any(|id| *id == item.id) {
                    item.collected = true;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{sample_level, LockData, PuzzleData};

    #[test]
    fn sample_level_loads() {
        let world = WorldGraph::load_level(sample_level()).expect("sample level loads");
        assert_eq!(world.start_room, "foyer");
        assert_eq!(world.start_facing, Direction::North);
        assert!(world.get_node("vault").is_some());
        assert!(world.get_node("basement").is_none());
        assert_eq!(world.puzzles_in_room("organ_loft").len(), 1);
    }

    #[test]
    fn dangling_neighbor_fails_load() {
        let mut level = sample_level();
        level.rooms[0]
            .exits
            .insert(Direction::South, crate::level::ExitData::Open("nowhere".to_string()));
        let result = WorldGraph::load_level(level);
        assert!(matches!(
            result,
            Err(LevelError::UnknownNeighbor { target, .. }) if target == "nowhere"
        ));
    }

    #[test]
    fn duplicate_item_id_fails_load() {
        let mut level = sample_level();
        // second brass key planted in the organ loft
        level.rooms[2].item = Some(crate::level::ItemData {
            id: "brass_key".to_string(),
            name: "spare brass key".to_string(),
            sound: "key_jingle".to_string(),
        });
        let result = WorldGraph::load_level(level);
        assert!(matches!(
            result,
            Err(LevelError::DuplicateItem(item)) if item == "brass_key"
        ));
    }

    #[test]
    fn lock_requiring_unknown_item_fails_load() {
        let mut level = sample_level();
        level.locks[0].requires = "ghost_key".to_string();
        let result = WorldGraph::load_level(level);
        assert!(matches!(
            result,
            Err(LevelError::UnknownLockItem { item, .. }) if item == "ghost_key"
        ));
    }

    #[test]
    fn lock_declared_elsewhere_fails_load() {
        let mut level = sample_level();
        level.locks.push(LockData {
            id: "side_gate".to_string(),
            room: "gallery".to_string(),
            direction: Direction::West,
            requires: "brass_key".to_string(),
            target: "vault".to_string(),
        });
        level.rooms[0].exits.insert(
            Direction::South,
            crate::level::ExitData::Locked {
                lock: "side_gate".to_string(),
            },
        );
        let result = WorldGraph::load_level(level);
        assert!(matches!(
            result,
            Err(LevelError::LockPlacementMismatch { lock, .. }) if lock == "side_gate"
        ));
    }

    #[test]
    fn puzzle_with_empty_sequence_fails_load() {
        let mut level = sample_level();
        level.puzzles.push(PuzzleData {
            id: "hollow".to_string(),
            room: "foyer".to_string(),
            trigger: crate::types::TriggerType::Rotation,
            sequence: Vec::new(),
            requires: None,
        });
        let result = WorldGraph::load_level(level);
        assert!(matches!(
            result,
            Err(LevelError::EmptySequence { puzzle }) if puzzle == "hollow"
        ));
    }

    #[test]
    fn get_lock_resolves_only_locked_exits() {
        let world = WorldGraph::load_level(sample_level()).expect("sample level loads");
        let lock = world
            .get_lock("foyer", Direction::East)
            .expect("east exit is locked");
        assert_eq!(lock.id, "brass_gate");
        assert_eq!(lock.requires, "brass_key");
        assert!(world.get_lock("foyer", Direction::North).is_none());
        assert!(world.get_lock("foyer", Direction::South).is_none());
    }

    #[test]
    fn collect_item_flips_flag_once() {
        let mut world = WorldGraph::load_level(sample_level()).expect("sample level loads");
        assert!(world.uncollected_item_at("gallery").is_some());
        let item = world.collect_item("gallery").expect("first pickup succeeds");
        assert_eq!(item.id, "brass_key");
        assert!(world.collect_item("gallery").is_none());
        assert!(world.uncollected_item_at("gallery").is_none());
    }

    #[test]
    fn mark_items_collected_replays_save_state() {
        let mut world = WorldGraph::load_level(sample_level()).expect("sample level loads");
        world.mark_items_collected(&["brass_key".to_string(), "unknown".to_string()]);
        assert!(world.uncollected_item_at("gallery").is_none());
        assert!(world.uncollected_item_at("archive").is_some());
    }
}
