use std::collections::BTreeSet;

use crate::constants::SAVE_FORMAT_VERSION;
use crate::types::{Direction, ItemView, SaveData};
use crate::world::WorldGraph;

/// Mutable session state. Position and facing are read-only projections,
/// changed only through the dedicated setters; the unlocked and completed
/// sets are monotonic (nothing ever re-locks or un-completes).
#[derive(Clone, Debug)]
pub struct PlayerState {
    room: String,
    facing: Direction,
    inventory: Vec<ItemView>,
    selected: Option<usize>,
    unlocked: BTreeSet<String>,
    completed: BTreeSet<String>,
}

impl PlayerState {
    pub fn new(room: &str, facing: Direction) -> Self {
        Self {
            room: room.to_string(),
            facing,
            inventory: Vec::new(),
            selected: None,
            unlocked: BTreeSet::new(),
            completed: BTreeSet::new(),
        }
    }

    pub fn room(&self) -> &str {
        &self.room
    }

    pub fn facing(&self) -> Direction {
        self.facing
    }

    pub fn move_to(&mut self, room: &str) {
        self.room = room.to_string();
    }

    pub fn set_facing(&mut self, facing: Direction) {
        self.facing = facing;
    }

    pub fn inventory(&self) -> &[ItemView] {
        &self.inventory
    }

    pub fn has_item(&self, item_id: &str) -> bool {
        self.inventory.iter().any(|item| item.id == item_id)
    }

    /// Appends to the inventory and selects the new item. A duplicate id is
    /// a silent no-op returning false.
    pub fn pick_up(&mut self, item: ItemView) -> bool {
        if self.has_item(&item.id) {
            return false;
        }
        self.inventory.push(item);
        self.selected = Some(self.inventory.len() - 1);
        true
    }

    pub fn selected_item(&self) -> Option<&ItemView> {
        self.selected.and_then(|idx| self.inventory.get(idx))
    }

    pub fn selected_index(&self) -> i32 {
        match self.selected {
            Some(idx) => idx as i32,
            None => -1,
        }
    }

    /// Cycles the selection forward through the inventory; none (and no
    /// selection) when the inventory is empty.
    pub fn select_next(&mut self) -> Option<ItemView> {
        if self.inventory.is_empty() {
            self.selected = None;
            return None;
        }
        let next = match self.selected {
            Some(idx) => (idx + 1) % self.inventory.len(),
            None => 0,
        };
        self.selected = Some(next);
        self.inventory.get(next).cloned()
    }

    /// Drop-on-use removal. Removing the selected item clears the selection;
    /// removing an earlier item shifts it down.
    pub fn remove_item(&mut self, item_id: &str) -> Option<ItemView> {
        let idx = self.inventory.iter().position(|item| item.id == item_id)?;
        let removed = self.inventory.remove(idx);
        self.selected = match self.selected {
            Some(selected) if selected == idx => None,
            Some(selected) if selected > idx => Some(selected - 1),
            other => other,
        };
        Some(removed)
    }

    pub fn is_passage_unlocked(&self, lock_id: &str) -> bool {
        self.unlocked.contains(lock_id)
    }

    pub fn unlock_passage(&mut self, lock_id: &str) {
        self.unlocked.insert(lock_id.to_string());
    }

    pub fn unlocked_passages(&self) -> &BTreeSet<String> {
        &self.unlocked
    }

    pub fn is_sequence_completed(&self, puzzle_id: &str) -> bool {
        self.completed.contains(puzzle_id)
    }

    pub fn complete_sequence(&mut self, puzzle_id: &str) {
        self.completed.insert(puzzle_id.to_string());
    }

    pub fn completed_puzzles(&self) -> &BTreeSet<String> {
        &self.completed
    }

    pub fn to_save_data(&self) -> SaveData {
        SaveData {
            version: SAVE_FORMAT_VERSION,
            room_id: self.room.clone(),
            facing: self.facing,
            inventory: self.inventory.iter().map(|item| item.id.clone()).collect(),
            unlocked_passages: self.unlocked.iter().cloned().collect(),
            completed_puzzles: self.completed.iter().cloned().collect(),
            saved_at_iso: String::new(),
        }
    }

    /// Reconstructs session state from a save. A save naming an unknown room
    /// is rejected; unknown item/lock/puzzle ids are dropped silently so a
    /// save from an older level revision still loads.
    pub fn from_save_data(world: &WorldGraph, data: &SaveData) -> Option<Self> {
        world.get_node(&data.room_id)?;

        let mut inventory = Vec::new();
        for item_id in &data.inventory {
            if inventory.iter().any(|item: &ItemView| item.id == *item_id) {
                continue;
            }
            if let Some(item) = world.find_item(item_id) {
                inventory.push(item.view());
            }
        }
        let unlocked = data
            .unlocked_passages
            .iter()
            .filter(|id| world.lock(id).is_some())
            .cloned()
            .collect();
        let completed = data
            .completed_puzzles
            .iter()
            .filter(|id| world.puzzle(id).is_some())
            .cloned()
            .collect();

        Some(Self {
            room: data.room_id.clone(),
            facing: data.facing,
            inventory,
            selected: None,
            unlocked,
            completed,
        })
    }
}
