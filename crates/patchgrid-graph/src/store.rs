//! Persisted canvas state consumed by the model.
//!
//! Storage format and location belong to the implementation; the model only
//! reads and writes through [`PositionStore`]. A file-backed implementation
//! lives in the `patchgrid-store` crate, [`MemoryStore`] covers tests and
//! hosts that persist elsewhere.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::{Point, PortMode};

/// Per-group-name canvas state surviving across sessions.
///
/// `pos` is the single box when joined and the output side when split;
/// `split_pos` is the input side and only meaningful when `split` is set.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StoredPosition {
    pub pos: Point,
    pub split_pos: Point,
    pub split: bool,
}

/// An explicit port pairing remembered for a group.
///
/// `port_names` is ordered; the rule only fires when the full sequence is
/// present, ending at the port being added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingRule {
    pub group: String,
    pub mode: PortMode,
    pub port_names: Vec<String>,
}

/// Position plus group name, used by the save/restore snapshot helpers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedPosition {
    pub name: String,
    #[serde(flatten)]
    pub position: StoredPosition,
}

/// Persisted canvas state collaborator.
///
/// Methods take `&self`; implementations provide their own interior
/// mutability. Write failures are the implementation's problem to log, the
/// model treats every write as fire-and-forget.
pub trait PositionStore {
    fn group_position(&self, group: &str) -> Option<StoredPosition>;
    fn save_group_position(&self, group: &str, position: StoredPosition);
    /// Pairing rules recorded for this group and port direction.
    fn pairing_rules(&self, group: &str, mode: PortMode) -> Vec<PairingRule>;
    fn remember_pairing(&self, rule: PairingRule);
    /// Removes rules exactly matching `rule`, so a dissolved pair is not
    /// immediately recreated.
    fn forget_pairing(&self, rule: &PairingRule);
    fn is_force_mono(&self, group: &str, port: &str, mode: PortMode) -> bool;
    fn set_force_mono(&self, group: &str, port: &str, mode: PortMode, forced: bool);
}

impl<S: PositionStore + ?Sized> PositionStore for Arc<S> {
    fn group_position(&self, group: &str) -> Option<StoredPosition> {
        (**self).group_position(group)
    }

    fn save_group_position(&self, group: &str, position: StoredPosition) {
        (**self).save_group_position(group, position);
    }

    fn pairing_rules(&self, group: &str, mode: PortMode) -> Vec<PairingRule> {
        (**self).pairing_rules(group, mode)
    }

    fn remember_pairing(&self, rule: PairingRule) {
        (**self).remember_pairing(rule);
    }

    fn forget_pairing(&self, rule: &PairingRule) {
        (**self).forget_pairing(rule);
    }

    fn is_force_mono(&self, group: &str, port: &str, mode: PortMode) -> bool {
        (**self).is_force_mono(group, port, mode)
    }

    fn set_force_mono(&self, group: &str, port: &str, mode: PortMode, forced: bool) {
        (**self).set_force_mono(group, port, mode, forced);
    }
}

#[derive(Debug, Default)]
struct MemoryStoreData {
    positions: HashMap<String, StoredPosition>,
    rules: Vec<PairingRule>,
    force_mono: HashSet<(String, PortMode)>,
}

/// In-memory [`PositionStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<MemoryStoreData>,
}

fn mono_key(group: &str, port: &str) -> String {
    format!("{group}:{port}")
}

impl PositionStore for MemoryStore {
    fn group_position(&self, group: &str) -> Option<StoredPosition> {
        self.data.lock().positions.get(group).copied()
    }

    fn save_group_position(&self, group: &str, position: StoredPosition) {
        self.data.lock().positions.insert(group.to_string(), position);
    }

    fn pairing_rules(&self, group: &str, mode: PortMode) -> Vec<PairingRule> {
        self.data
            .lock()
            .rules
            .iter()
            .filter(|rule| rule.group == group && rule.mode == mode)
            .cloned()
            .collect()
    }

    fn remember_pairing(&self, rule: PairingRule) {
        let mut data = self.data.lock();
        if !data.rules.contains(&rule) {
            data.rules.push(rule);
        }
    }

    fn forget_pairing(&self, rule: &PairingRule) {
        self.data.lock().rules.retain(|known| known != rule);
    }

    fn is_force_mono(&self, group: &str, port: &str, mode: PortMode) -> bool {
        self.data
            .lock()
            .force_mono
            .contains(&(mono_key(group, port), mode))
    }

    fn set_force_mono(&self, group: &str, port: &str, mode: PortMode, forced: bool) {
        let key = (mono_key(group, port), mode);
        let mut data = self.data.lock();
        if forced {
            data.force_mono.insert(key);
        } else {
            data.force_mono.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn force_mono_round_trip() {
        let store = MemoryStore::default();
        assert!(!store.is_force_mono("system", "capture_1", PortMode::Output));
        store.set_force_mono("system", "capture_1", PortMode::Output, true);
        assert!(store.is_force_mono("system", "capture_1", PortMode::Output));
        assert!(!store.is_force_mono("system", "capture_1", PortMode::Input));
        store.set_force_mono("system", "capture_1", PortMode::Output, false);
        assert!(!store.is_force_mono("system", "capture_1", PortMode::Output));
    }

    #[test]
    fn forget_pairing_only_removes_exact_match() {
        let store = MemoryStore::default();
        let rule = PairingRule {
            group: "Mixer".into(),
            mode: PortMode::Output,
            port_names: vec!["Left".into(), "Right".into()],
        };
        let other = PairingRule {
            port_names: vec!["Left".into(), "Right".into(), "Center".into()],
            ..rule.clone()
        };
        store.remember_pairing(rule.clone());
        store.remember_pairing(other.clone());
        store.forget_pairing(&rule);
        assert_eq!(store.pairing_rules("Mixer", PortMode::Output), vec![other]);
    }
}
