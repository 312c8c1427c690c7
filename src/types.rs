use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "north" | "n" => Some(Self::North),
            "east" | "e" => Some(Self::East),
            "south" | "s" => Some(Self::South),
            "west" | "w" => Some(Self::West),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::North => "north",
            Self::East => "east",
            Self::South => "south",
            Self::West => "west",
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }

    /// Quarter turn clockwise.
    pub fn right(self) -> Self {
        match self {
            Self::North => Self::East,
            Self::East => Self::South,
            Self::South => Self::West,
            Self::West => Self::North,
        }
    }

    /// Quarter turn counterclockwise.
    pub fn left(self) -> Self {
        self.right().opposite()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    FacingScan,
    Rotation,
    RoomEntry,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CueKind {
    Open,
    Wall,
    Locked,
    ItemAhead,
}

/// Direction of a cue relative to the player's facing. Drives stereo panning
/// on the audio side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bearing {
    Ahead,
    Right,
    Behind,
    Left,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SonarCue {
    pub direction: Direction,
    pub bearing: Bearing,
    pub kind: CueKind,
    #[serde(rename = "requiredItem")]
    pub required_item: Option<String>,
    #[serde(rename = "itemSound")]
    pub item_sound: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Pickup,
    Unlock,
    Error,
    Nothing,
}

/// Result of a `move_forward` request. `Busy` means a previous move's audio
/// cue has not been acknowledged yet and the input was dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    Wall,
    Locked,
    Busy,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ItemView {
    pub id: String,
    pub name: String,
    pub sound: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct RoomView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub ambience: String,
    pub item: Option<ItemView>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    RoomChanged {
        #[serde(rename = "roomId")]
        room_id: String,
        previous: Option<String>,
    },
    MoveBlocked {
        direction: Direction,
        locked: bool,
    },
    OrientationChanged {
        facing: Direction,
    },
    SonarPing {
        cues: Vec<SonarCue>,
    },
    ItemPickedUp {
        #[serde(rename = "itemId")]
        item_id: String,
        sound: String,
    },
    SelectionChanged {
        #[serde(rename = "itemId")]
        item_id: Option<String>,
    },
    PassageUnlocked {
        #[serde(rename = "lockId")]
        lock_id: String,
        #[serde(rename = "itemId")]
        item_id: String,
    },
    Interaction {
        kind: InteractionKind,
        message: String,
        #[serde(rename = "itemId")]
        item_id: Option<String>,
    },
    SequenceProgress {
        #[serde(rename = "puzzleId")]
        puzzle_id: String,
        length: usize,
    },
    SequenceReset {
        #[serde(rename = "puzzleId")]
        puzzle_id: String,
    },
    PuzzleCompleted {
        #[serde(rename = "puzzleId")]
        puzzle_id: String,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub room: RoomView,
    pub facing: Direction,
    pub inventory: Vec<ItemView>,
    #[serde(rename = "selectedIndex")]
    pub selected_index: i32,
    #[serde(rename = "unlockedPassages")]
    pub unlocked_passages: Vec<String>,
    #[serde(rename = "completedPuzzles")]
    pub completed_puzzles: Vec<String>,
    pub events: Vec<GameEvent>,
}

/// The single persisted save slot. Selection is not persisted; a restored
/// session starts with no active item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveData {
    pub version: u8,
    #[serde(rename = "roomId", alias = "room_id")]
    pub room_id: String,
    pub facing: Direction,
    pub inventory: Vec<String>,
    #[serde(rename = "unlockedPassages", alias = "unlocked_passages")]
    pub unlocked_passages: Vec<String>,
    #[serde(rename = "completedPuzzles", alias = "completed_puzzles")]
    pub completed_puzzles: Vec<String>,
    #[serde(rename = "savedAtIso", alias = "saved_at_iso", default)]
    pub saved_at_iso: String,
}
