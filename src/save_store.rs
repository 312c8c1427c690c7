use std::fs;
use std::path::PathBuf;

use chrono::{SecondsFormat, Utc};

use crate::constants::SAVE_FORMAT_VERSION;
use crate::types::SaveData;

/// Single-slot JSON save file. Failures are logged and reported as a bool;
/// a broken or missing file never aborts the game, it just means a fresh
/// start.
pub struct SaveStore {
    file_path: PathBuf,
}

impl SaveStore {
    pub fn new(file_path: PathBuf) -> Self {
        Self { file_path }
    }

    pub fn file_path(&self) -> &PathBuf {
        &self.file_path
    }

    pub fn exists(&self) -> bool {
        self.file_path.is_file()
    }

    pub fn save(&self, data: &SaveData) -> bool {
        if let Some(parent) = self.file_path.parent() {
            if let Err(error) = fs::create_dir_all(parent) {
                eprintln!(
                    "[save-store] failed to create parent dir {}: {error}",
                    parent.display()
                );
                return false;
            }
        }

        let mut payload = data.clone();
        payload.version = SAVE_FORMAT_VERSION;
        payload.saved_at_iso = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        match serde_json::to_string_pretty(&payload) {
            Ok(text) => {
                if let Err(error) = fs::write(&self.file_path, text) {
                    eprintln!(
                        "[save-store] failed to write {}: {error}",
                        self.file_path.display()
                    );
                    return false;
                }
                true
            }
            Err(error) => {
                eprintln!(
                    "[save-store] failed to serialize payload for {}: {error}",
                    self.file_path.display()
                );
                false
            }
        }
    }

    pub fn load(&self) -> Option<SaveData> {
        let text = match fs::read_to_string(&self.file_path) {
            Ok(value) => value,
            Err(error) => {
                if error.kind() != std::io::ErrorKind::NotFound {
                    eprintln!(
                        "[save-store] failed to read {}: {error}",
                        self.file_path.display()
                    );
                }
                return None;
            }
        };
        let mut parsed: SaveData = match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(error) => {
                eprintln!(
                    "[save-store] failed to parse {}: {error}",
                    self.file_path.display()
                );
                return None;
            }
        };
        if parsed.version != SAVE_FORMAT_VERSION {
            eprintln!(
                "[save-store] unsupported version {} at {}",
                parsed.version,
                self.file_path.display()
            );
            return None;
        }

        let mut seen = Vec::with_capacity(parsed.inventory.len());
        for item_id in parsed.inventory {
            if !seen.contains(&item_id) {
                seen.push(item_id);
            }
        }
        parsed.inventory = seen;
        Some(parsed)
    }

    pub fn clear(&self) -> bool {
        match fs::remove_file(&self.file_path) {
            Ok(()) => true,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => true,
            Err(error) => {
                eprintln!(
                    "[save-store] failed to remove {}: {error}",
                    self.file_path.display()
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Direction;

    fn temp_file(name: &str) -> PathBuf {
        let unique = format!(
            "{}-{}-{}",
            name,
            std::process::id(),
            rand::random::<u32>()
        );
        std::env::temp_dir().join(unique).join("save.json")
    }

    fn sample_save() -> SaveData {
        SaveData {
            version: SAVE_FORMAT_VERSION,
            room_id: "foyer".to_string(),
            facing: Direction::East,
            inventory: vec!["brass_key".to_string()],
            unlocked_passages: vec!["brass_gate".to_string()],
            completed_puzzles: vec![],
            saved_at_iso: String::new(),
        }
    }

    #[test]
    fn save_then_load_round_trips_and_stamps_time() {
        let path = temp_file("save-store-round-trip");
        let store = SaveStore::new(path.clone());
        assert!(!store.exists());

        assert!(store.save(&sample_save()));
        assert!(store.exists());

        let loaded = store.load().expect("save loads");
        assert_eq!(loaded.room_id, "foyer");
        assert_eq!(loaded.facing, Direction::East);
        assert_eq!(loaded.inventory, vec!["brass_key".to_string()]);
        assert_eq!(loaded.unlocked_passages, vec!["brass_gate".to_string()]);
        assert!(!loaded.saved_at_iso.is_empty());

        let _ = fs::remove_file(&path);
        let _ = fs::remove_dir_all(path.parent().expect("parent exists"));
    }

    #[test]
    fn missing_file_loads_as_none_silently() {
        let store = SaveStore::new(temp_file("save-store-missing"));
        assert!(store.load().is_none());
    }

    #[test]
    fn wrong_version_is_rejected() {
        let path = temp_file("save-store-version");
        let parent = path.parent().expect("parent exists").to_path_buf();
        fs::create_dir_all(&parent).expect("create dir");
        let raw = r#"{
  "version": 99,
  "roomId": "foyer",
  "facing": "north",
  "inventory": [],
  "unlockedPassages": [],
  "completedPuzzles": []
}"#;
        fs::write(&path, raw).expect("write file");

        let store = SaveStore::new(path.clone());
        assert!(store.load().is_none());

        let _ = fs::remove_file(&path);
        let _ = fs::remove_dir_all(&parent);
    }

    #[test]
    fn corrupt_json_loads_as_none() {
        let path = temp_file("save-store-corrupt");
        let parent = path.parent().expect("parent exists").to_path_buf();
        fs::create_dir_all(&parent).expect("create dir");
        fs::write(&path, "{ not json").expect("write file");

        let store = SaveStore::new(path.clone());
        assert!(store.load().is_none());

        let _ = fs::remove_file(&path);
        let _ = fs::remove_dir_all(&parent);
    }

    #[test]
    fn load_drops_duplicate_inventory_ids() {
        let path = temp_file("save-store-dupes");
        let store = SaveStore::new(path.clone());
        let mut data = sample_save();
        data.inventory = vec![
            "brass_key".to_string(),
            "tuning_fork".to_string(),
            "brass_key".to_string(),
        ];
        assert!(store.save(&data));

        let loaded = store.load().expect("save loads");
        assert_eq!(
            loaded.inventory,
            vec!["brass_key".to_string(), "tuning_fork".to_string()]
        );

        let _ = fs::remove_file(&path);
        let _ = fs::remove_dir_all(path.parent().expect("parent exists"));
    }

    #[test]
    fn clear_is_idempotent() {
        let path = temp_file("save-store-clear");
        let store = SaveStore::new(path.clone());
        assert!(store.clear());
        assert!(store.save(&sample_save()));
        assert!(store.clear());
        assert!(!store.exists());
        assert!(store.clear());

        let _ = fs::remove_dir_all(path.parent().expect("parent exists"));
    }
}
