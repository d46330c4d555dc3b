//! JSON-file [`PositionStore`] for hosts without their own settings layer.
//!
//! One file holds everything the canvas remembers between sessions: group
//! coordinates and split preferences by client name, explicit pairing rules,
//! and force-mono overrides. The file is rewritten on every change; the
//! amounts involved are tiny and a crash can lose at most the latest edit.

use std::fs;
use std::path::PathBuf;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use patchgrid_graph::{PairingRule, PortMode, PositionStore, StoredPosition};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read canvas store: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse canvas store: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ForceMonoEntry {
    group: String,
    port: String,
    mode: PortMode,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CanvasStoreData {
    #[serde(default)]
    positions: std::collections::HashMap<String, StoredPosition>,
    #[serde(default)]
    pairings: Vec<PairingRule>,
    #[serde(default)]
    force_mono: Vec<ForceMonoEntry>,
}

/// Canvas store persisted as pretty-printed JSON at a fixed path.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    data: Mutex<CanvasStoreData>,
}

impl JsonStore {
    /// Opens the store, reading existing content when the file exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let data = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        } else {
            CanvasStoreData::default()
        };
        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    /// Per-user default location, creating the config directory if needed.
    pub fn default_path() -> Result<PathBuf, StoreError> {
        let mut config_dir = dirs::config_dir().ok_or_else(|| {
            StoreError::Read(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no config directory",
            ))
        })?;
        config_dir.push("Patchgrid");
        fs::create_dir_all(&config_dir)?;
        config_dir.push("canvas.json");
        Ok(config_dir)
    }

    fn persist_locked(&self, data: &CanvasStoreData) {
        let result = serde_json::to_string_pretty(data)
            .map_err(StoreError::from)
            .and_then(|json| fs::write(&self.path, json).map_err(StoreError::from));
        if let Err(err) = result {
            tracing::warn!(%err, path = %self.path.display(), "canvas store write failed");
        }
    }
}

impl PositionStore for JsonStore {
    fn group_position(&self, group: &str) -> Option<StoredPosition> {
        self.data.lock().positions.get(group).copied()
    }

    fn save_group_position(&self, group: &str, position: StoredPosition) {
        let mut data = self.data.lock();
        data.positions.insert(group.to_string(), position);
        self.persist_locked(&data);
    }

    fn pairing_rules(&self, group: &str, mode: PortMode) -> Vec<PairingRule> {
        self.data
            .lock()
            .pairings
            .iter()
            .filter(|rule| rule.group == group && rule.mode == mode)
            .cloned()
            .collect()
    }

    fn remember_pairing(&self, rule: PairingRule) {
        let mut data = self.data.lock();
        if !data.pairings.contains(&rule) {
            data.pairings.push(rule);
            self.persist_locked(&data);
        }
    }

    fn forget_pairing(&self, rule: &PairingRule) {
        let mut data = self.data.lock();
        let before = data.pairings.len();
        data.pairings.retain(|known| known != rule);
        if data.pairings.len() != before {
            self.persist_locked(&data);
        }
    }

    fn is_force_mono(&self, group: &str, port: &str, mode: PortMode) -> bool {
        self.data
            .lock()
            .force_mono
            .iter()
            .any(|entry| entry.group == group && entry.port == port && entry.mode == mode)
    }

    fn set_force_mono(&self, group: &str, port: &str, mode: PortMode, forced: bool) {
        let entry = ForceMonoEntry {
            group: group.to_string(),
            port: port.to_string(),
            mode,
        };
        let mut data = self.data.lock();
        if forced {
            if data.force_mono.contains(&entry) {
                return;
            }
            data.force_mono.push(entry);
        } else {
            let before = data.force_mono.len();
            data.force_mono.retain(|known| known != &entry);
            if data.force_mono.len() == before {
                return;
            }
        }
        self.persist_locked(&data);
    }
}

#[cfg(test)]
mod tests {
    use patchgrid_graph::Point;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn positions_survive_a_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("canvas.json");
        let store = JsonStore::open(&path).unwrap();
        store.save_group_position(
            "system",
            StoredPosition {
                pos: Point::new(12.0, 34.0),
                split_pos: Point::new(400.0, 34.0),
                split: true,
            },
        );
        drop(store);

        let store = JsonStore::open(&path).unwrap();
        let position = store.group_position("system").unwrap();
        assert!(position.split);
        assert_eq!(position.pos, Point::new(12.0, 34.0));
        assert_eq!(position.split_pos, Point::new(400.0, 34.0));
    }

    #[test]
    fn pairings_and_overrides_survive_a_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("canvas.json");
        let rule = PairingRule {
            group: "Mixer".into(),
            mode: PortMode::Output,
            port_names: vec!["Left".into(), "Right".into()],
        };
        {
            let store = JsonStore::open(&path).unwrap();
            store.remember_pairing(rule.clone());
            store.set_force_mono("system", "capture_1", PortMode::Output, true);
        }

        let store = JsonStore::open(&path).unwrap();
        assert_eq!(store.pairing_rules("Mixer", PortMode::Output), vec![rule]);
        assert!(store.is_force_mono("system", "capture_1", PortMode::Output));
        assert!(!store.is_force_mono("system", "capture_1", PortMode::Input));

        store.set_force_mono("system", "capture_1", PortMode::Output, false);
        let store = JsonStore::open(&path).unwrap();
        assert!(!store.is_force_mono("system", "capture_1", PortMode::Output));
    }

    #[test]
    fn forgetting_a_rule_rewrites_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("canvas.json");
        let rule = PairingRule {
            group: "synth".into(),
            mode: PortMode::Output,
            port_names: vec!["out L".into(), "out R".into()],
        };
        {
            let store = JsonStore::open(&path).unwrap();
            store.remember_pairing(rule.clone());
            store.forget_pairing(&rule);
        }
        let store = JsonStore::open(&path).unwrap();
        assert!(store.pairing_rules("synth", PortMode::Output).is_empty());
    }
}
