//! Group records and their registry operations.

use serde::{Deserialize, Serialize};

use crate::model::{resolve_split, GROUP_HEIGHT, GROUP_WIDTH};
use crate::store::{NamedPosition, StoredPosition};
use crate::{GraphError, GraphModel, GroupId, PluginId, SplitHint};

/// Horizontal gap between a freshly split group's two sides.
pub(crate) const SPLIT_GAP: f32 = 300.0;

/// 2D canvas coordinate. The model stores coordinates only to hand them to
/// the position store and the rendering layer; it never measures anything.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Category used by the rendering layer to pick the box decoration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupIcon {
    Application,
    Hardware,
    Distrho,
    File,
    Plugin,
    LadishRoom,
}

/// Plugin instance a group is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginBinding {
    pub plugin_id: PluginId,
    pub has_ui: bool,
    pub has_inline_display: bool,
}

/// One client of the routing graph.
///
/// A split group keeps one logical identity but two visual sides: the
/// output side at `pos`, the input side at `split_pos`.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub group_id: GroupId,
    pub name: String,
    pub icon: GroupIcon,
    pub split: bool,
    pub plugin: Option<PluginBinding>,
    pub pos: Point,
    pub split_pos: Point,
}

impl GraphModel {
    pub fn group(&self, group_id: GroupId) -> Option<&Group> {
        self.groups.iter().find(|g| g.group_id == group_id)
    }

    fn group_mut(&mut self, group_id: GroupId) -> Option<&mut Group> {
        self.groups.iter_mut().find(|g| g.group_id == group_id)
    }

    /// Registers a group announced by the engine.
    ///
    /// An unspecified split hint falls back to the stored preference for the
    /// name, then to splitting hardware groups. Placement comes from the
    /// store, from the session snapshot kept by [`GraphModel::clear`], or
    /// from the packing scan, in that order.
    pub fn add_group(
        &mut self,
        group_id: GroupId,
        name: &str,
        hint: SplitHint,
        icon: GroupIcon,
    ) -> Result<(), GraphError> {
        if self.group(group_id).is_some() {
            return Err(GraphError::DuplicateGroup(group_id));
        }

        let stored = self
            .store
            .group_position(name)
            .or_else(|| self.session_positions.get(name).copied());
        let split = resolve_split(
            hint,
            stored.map(|s| s.split),
            icon == GroupIcon::Hardware,
        );

        let pos = match stored {
            Some(s) => s.pos,
            None => {
                let horizontal = icon == GroupIcon::Hardware || icon == GroupIcon::LadishRoom;
                self.next_group_pos(horizontal && !split)
            }
        };
        let split_pos = match stored.filter(|s| s.split) {
            Some(s) if split => s.split_pos,
            _ => Point::new(pos.x + GROUP_WIDTH + SPLIT_GAP, pos.y),
        };

        self.groups.push(Group {
            group_id,
            name: name.to_string(),
            icon,
            split,
            plugin: None,
            pos,
            split_pos,
        });
        self.listener.on_group_added(group_id);
        Ok(())
    }

    /// Removes a group, persisting its coordinates and split flag first.
    ///
    /// Ports and connections must already be gone; leftovers are an event
    /// ordering violation on the caller's side and are logged, but the group
    /// is removed regardless (the engine will reconcile).
    pub fn remove_group(&mut self, group_id: GroupId) -> Result<(), GraphError> {
        let index = self
            .groups
            .iter()
            .position(|g| g.group_id == group_id)
            .ok_or(GraphError::GroupNotFound(group_id))?;

        let leftover_ports = self.ports.iter().filter(|p| p.group_id == group_id).count();
        if leftover_ports > 0 {
            tracing::error!(
                ?group_id,
                leftover_ports,
                "group removed while its ports are still registered"
            );
        }

        let group = self.groups.remove(index);
        self.store.save_group_position(
            &group.name,
            StoredPosition {
                pos: group.pos,
                split_pos: group.split_pos,
                split: group.split,
            },
        );

        let stale_pairs: Vec<_> = self
            .pairs
            .iter()
            .filter(|pair| pair.group_id == group_id)
            .map(|pair| pair.pair_id)
            .collect();
        for pair_id in stale_pairs {
            self.drop_pair_silently(pair_id);
        }

        self.listener.on_group_removed(group_id);
        Ok(())
    }

    pub fn rename_group(&mut self, group_id: GroupId, name: &str) -> Result<(), GraphError> {
        let group = self
            .group_mut(group_id)
            .ok_or(GraphError::GroupNotFound(group_id))?;
        group.name = name.to_string();
        self.listener.on_group_renamed(group_id, name);
        Ok(())
    }

    pub fn set_group_icon(&mut self, group_id: GroupId, icon: GroupIcon) -> Result<(), GraphError> {
        let group = self
            .group_mut(group_id)
            .ok_or(GraphError::GroupNotFound(group_id))?;
        group.icon = icon;
        self.listener.on_group_changed(group_id);
        Ok(())
    }

    pub fn set_group_as_plugin(
        &mut self,
        group_id: GroupId,
        plugin_id: PluginId,
        has_ui: bool,
        has_inline_display: bool,
    ) -> Result<(), GraphError> {
        let group = self
            .group_mut(group_id)
            .ok_or(GraphError::GroupNotFound(group_id))?;
        group.plugin = Some(PluginBinding {
            plugin_id,
            has_ui,
            has_inline_display,
        });
        self.listener.on_group_changed(group_id);
        Ok(())
    }

    pub fn remove_group_as_plugin(&mut self, group_id: GroupId) -> Result<(), GraphError> {
        let group = self
            .group_mut(group_id)
            .ok_or(GraphError::GroupNotFound(group_id))?;
        group.plugin = None;
        self.listener.on_group_changed(group_id);
        Ok(())
    }

    /// Clears the binding of the removed plugin and shifts later plugin ids
    /// down by one, mirroring the host's own renumbering.
    pub fn handle_plugin_removed(&mut self, plugin_id: PluginId) {
        let mut changed = Vec::new();
        for group in &mut self.groups {
            let Some(binding) = group.plugin.as_mut() else {
                continue;
            };
            if binding.plugin_id == plugin_id {
                group.plugin = None;
                changed.push(group.group_id);
            } else if binding.plugin_id > plugin_id {
                binding.plugin_id = PluginId(binding.plugin_id.0 - 1);
                changed.push(group.group_id);
            }
        }
        for group_id in changed {
            self.listener.on_group_changed(group_id);
        }
    }

    pub fn handle_all_plugins_removed(&mut self) {
        let mut changed = Vec::new();
        for group in &mut self.groups {
            if group.plugin.take().is_some() {
                changed.push(group.group_id);
            }
        }
        for group_id in changed {
            self.listener.on_group_changed(group_id);
        }
    }

    /// Moves both sides of a group to the same coordinate.
    pub fn set_group_pos(&mut self, group_id: GroupId, pos: Point) -> Result<(), GraphError> {
        self.set_group_pos_full(group_id, pos, pos)
    }

    pub fn set_group_pos_full(
        &mut self,
        group_id: GroupId,
        pos: Point,
        split_pos: Point,
    ) -> Result<(), GraphError> {
        let group = self
            .group_mut(group_id)
            .ok_or(GraphError::GroupNotFound(group_id))?;
        group.pos = pos;
        if group.split {
            group.split_pos = split_pos;
        }
        self.listener.on_group_moved(group_id);
        Ok(())
    }

    /// By-name snapshot of every group's coordinates, for project save.
    pub fn save_group_positions(&self) -> Vec<NamedPosition> {
        self.groups
            .iter()
            .map(|group| NamedPosition {
                name: group.name.clone(),
                position: StoredPosition {
                    pos: group.pos,
                    split_pos: if group.split {
                        group.split_pos
                    } else {
                        Point::default()
                    },
                    split: group.split,
                },
            })
            .collect()
    }

    /// Applies a previously saved snapshot to the groups currently present;
    /// unknown names are ignored.
    pub fn restore_group_positions(&mut self, positions: &[NamedPosition]) {
        let mut moved = Vec::new();
        for entry in positions {
            let Some(group) = self.groups.iter_mut().find(|g| g.name == entry.name) else {
                continue;
            };
            group.pos = entry.position.pos;
            if group.split {
                group.split_pos = entry.position.split_pos;
            }
            moved.push(group.group_id);
        }
        for group_id in moved {
            self.listener.on_group_moved(group_id);
        }
    }

    /// Deterministic placement scan: walk from the configured origin in
    /// fixed steps until the nominal box rectangle overlaps no existing
    /// side.
    fn next_group_pos(&self, horizontal: bool) -> Point {
        let (dx, dy) = if horizontal {
            (GROUP_WIDTH + 60.0, 0.0)
        } else {
            (0.0, GROUP_HEIGHT + 30.0)
        };
        let mut candidate = self.options.initial_pos;
        loop {
            if !self.overlaps_any_side(candidate) {
                return candidate;
            }
            candidate = Point::new(candidate.x + dx, candidate.y + dy);
        }
    }

    fn overlaps_any_side(&self, candidate: Point) -> bool {
        let occupied = self.groups.iter().flat_map(|group| {
            let mut sides = vec![group.pos];
            if group.split {
                sides.push(group.split_pos);
            }
            sides
        });
        for side in occupied {
            let apart = candidate.x + GROUP_WIDTH <= side.x
                || side.x + GROUP_WIDTH <= candidate.x
                || candidate.y + GROUP_HEIGHT <= side.y
                || side.y + GROUP_HEIGHT <= candidate.y;
            if !apart {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryStore, NullListener, NullSink, PositionStore};

    fn model() -> GraphModel {
        GraphModel::new(
            Box::new(MemoryStore::default()),
            Box::new(NullListener),
            Box::new(NullSink),
        )
    }

    #[test]
    fn placement_scan_avoids_existing_groups() {
        let mut model = model();
        model
            .add_group(GroupId(1), "a", SplitHint::Joined, GroupIcon::Application)
            .unwrap();
        model
            .add_group(GroupId(2), "b", SplitHint::Joined, GroupIcon::Application)
            .unwrap();
        let a = model.group(GroupId(1)).unwrap().pos;
        let b = model.group(GroupId(2)).unwrap().pos;
        assert_ne!(a, b);
        assert!((b.y - a.y).abs() >= GROUP_HEIGHT);
    }

    #[test]
    fn hardware_groups_split_by_default() {
        let mut model = model();
        model
            .add_group(
                GroupId(7),
                "system",
                SplitHint::Unspecified,
                GroupIcon::Hardware,
            )
            .unwrap();
        assert!(model.group(GroupId(7)).unwrap().split);
    }

    #[test]
    fn stored_split_preference_wins_over_icon_default() {
        let store = std::sync::Arc::new(MemoryStore::default());
        store.save_group_position(
            "system",
            StoredPosition {
                pos: Point::new(10.0, 20.0),
                split_pos: Point::default(),
                split: false,
            },
        );
        let mut model = GraphModel::new(
            Box::new(store),
            Box::new(NullListener),
            Box::new(NullSink),
        );
        model
            .add_group(
                GroupId(7),
                "system",
                SplitHint::Unspecified,
                GroupIcon::Hardware,
            )
            .unwrap();
        let group = model.group(GroupId(7)).unwrap();
        assert!(!group.split);
        assert_eq!(group.pos, Point::new(10.0, 20.0));
    }

    #[test]
    fn remove_group_persists_position() {
        let store = std::sync::Arc::new(MemoryStore::default());
        let mut model = GraphModel::new(
            Box::new(store.clone()),
            Box::new(NullListener),
            Box::new(NullSink),
        );
        model
            .add_group(GroupId(1), "synth", SplitHint::Split, GroupIcon::Plugin)
            .unwrap();
        model
            .set_group_pos_full(GroupId(1), Point::new(5.0, 6.0), Point::new(7.0, 8.0))
            .unwrap();
        model.remove_group(GroupId(1)).unwrap();
        let stored = store.group_position("synth").unwrap();
        assert!(stored.split);
        assert_eq!(stored.pos, Point::new(5.0, 6.0));
        assert_eq!(stored.split_pos, Point::new(7.0, 8.0));
    }
}
