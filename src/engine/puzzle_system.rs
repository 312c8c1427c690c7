use std::collections::BTreeMap;

use crate::player::PlayerState;
use crate::types::{Direction, TriggerType};
use crate::world::WorldGraph;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PuzzleStep {
    Advanced { puzzle_id: String, length: usize },
    Reset { puzzle_id: String },
    Completed { puzzle_id: String },
}

/// Per-puzzle progress, keyed by puzzle id. Puzzle definitions live in the
/// world graph; only the recorded direction sequences live here. Progress
/// never reaches the full sequence length: completion clears the entry.
#[derive(Clone, Debug, Default)]
pub struct PuzzleTable {
    progress: BTreeMap<String, Vec<Direction>>,
}

impl PuzzleTable {
    /// Feeds one qualifying directional action to every active puzzle of the
    /// room with a matching trigger type. Completed puzzles are filtered out
    /// before matching, so completion can never fire twice. A declared
    /// required item that is not held freezes the puzzle (no transition).
    /// A mismatch resets progress to empty, with no partial credit.
    pub fn apply(
        &mut self,
        world: &WorldGraph,
        player: &PlayerState,
        room: &str,
        trigger: TriggerType,
        direction: Direction,
    ) -> Vec<PuzzleStep> {
        let mut steps = Vec::new();
        for puzzle in world.puzzles_in_room(room) {
            if puzzle.trigger != trigger {
                continue;
            }
            if player.is_sequence_completed(&puzzle.id) {
                continue;
            }
            if let Some(required) = &puzzle.requires {
                if !player.has_item(required) {
                    continue;
                }
            }

            let progress = self.progress.entry(puzzle.id.clone()).or_default();
            let expected = puzzle.sequence[progress.len()];
            if direction != expected {
                progress.clear();
                steps.push(PuzzleStep::Reset {
                    puzzle_id: puzzle.id.clone(),
                });
                continue;
            }

            progress.push(direction);
            if progress.len() == puzzle.sequence.len() {
                progress.clear();
                steps.push(PuzzleStep::Completed {
                    puzzle_id: puzzle.id.clone(),
                });
            } else {
                steps.push(PuzzleStep::Advanced {
                    puzzle_id: puzzle.id.clone(),
                    length: progress.len(),
                });
            }
        }
        steps
    }

    /// Forces all of a room's puzzles back to empty progress (used when the
    /// player leaves the room).
    pub fn reset_room_progress(&mut self, world: &WorldGraph, room: &str) {
        for puzzle in world.puzzles_in_room(room) {
            self.progress.remove(&puzzle.id);
        }
    }

    pub fn progress_len(&self, puzzle_id: &str) -> usize {
        self.progress
            .get(puzzle_id)
            .map(|recorded| recorded.len())
            .unwrap_or(0)
    }
}
