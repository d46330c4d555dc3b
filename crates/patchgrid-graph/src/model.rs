//! The model instance owning every registry.

use std::collections::HashMap;

use crate::store::{PairingRule, PositionStore, StoredPosition};
use crate::{
    ActionRequest, ActionSink, Connection, ConnectionId, EngineEvent, GraphError, Group, GroupId,
    ModelListener, Pair, Point, Port, PortId, SplitHint,
};

/// Nominal footprint of a group box, used by the placement scan. The real
/// geometry lives in the rendering layer.
pub(crate) const GROUP_WIDTH: f32 = 180.0;
pub(crate) const GROUP_HEIGHT: f32 = 80.0;

/// Behaviour switches for a [`GraphModel`].
#[derive(Debug, Clone)]
pub struct GraphOptions {
    /// Enables name-based stereo detection for freshly added ports (trailing
    /// `L`/`R`, `left`/`right`, odd/even channel numbers). Off by default;
    /// persisted pairing rules work either way.
    pub auto_pair_heuristic: bool,
    /// Origin of the placement scan for groups without a stored position.
    pub initial_pos: Point,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            auto_pair_heuristic: false,
            initial_pos: Point::default(),
        }
    }
}

/// The patchbay graph model.
///
/// One instance per session. All mutation is synchronous and single-caller;
/// registry operations notify the listener after the change is committed.
pub struct GraphModel {
    pub(crate) groups: Vec<Group>,
    pub(crate) ports: Vec<Port>,
    pub(crate) pairs: Vec<Pair>,
    pub(crate) connections: Vec<Connection>,
    pub(crate) options: GraphOptions,
    pub(crate) store: Box<dyn PositionStore>,
    pub(crate) listener: Box<dyn ModelListener>,
    pub(crate) sink: Box<dyn ActionSink>,
    pub(crate) last_connection_id: u32,
    pub(crate) next_pair_id: u32,
    /// Pairings seen this session, so removed-and-readded ports (split/join
    /// replay in particular) regain their pairs without user interaction.
    pub(crate) session_rules: Vec<PairingRule>,
    /// Positions captured by [`GraphModel::clear`], keyed by group name, so
    /// groups re-added within the session come back where they were.
    pub(crate) session_positions: HashMap<String, StoredPosition>,
}

impl GraphModel {
    pub fn new(
        store: Box<dyn PositionStore>,
        listener: Box<dyn ModelListener>,
        sink: Box<dyn ActionSink>,
    ) -> Self {
        Self::with_options(store, listener, sink, GraphOptions::default())
    }

    pub fn with_options(
        store: Box<dyn PositionStore>,
        listener: Box<dyn ModelListener>,
        sink: Box<dyn ActionSink>,
        options: GraphOptions,
    ) -> Self {
        Self {
            groups: Vec::new(),
            ports: Vec::new(),
            pairs: Vec::new(),
            connections: Vec::new(),
            options,
            store,
            listener,
            sink,
            last_connection_id: 0,
            next_pair_id: 1,
            session_rules: Vec::new(),
            session_positions: HashMap::new(),
        }
    }

    pub fn options(&self) -> &GraphOptions {
        &self.options
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Ports in rendering order (registration order, with pair members kept
    /// contiguous).
    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn pairs(&self) -> &[Pair] {
        &self.pairs
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Applies an inbound engine event.
    ///
    /// Failures are logged and swallowed: the engine is authoritative, a
    /// rejected event usually means this model missed an earlier one and the
    /// stream will reconcile.
    pub fn apply(&mut self, event: EngineEvent) {
        let result = match event {
            EngineEvent::GroupAdded {
                group,
                name,
                split,
                icon,
            } => self.add_group(group, &name, split, icon),
            EngineEvent::GroupRemoved { group } => self.remove_group(group),
            EngineEvent::GroupRenamed { group, name } => self.rename_group(group, &name),
            EngineEvent::GroupIconChanged { group, icon } => self.set_group_icon(group, icon),
            EngineEvent::GroupAsPlugin {
                group,
                plugin,
                has_ui,
                has_inline_display,
            } => self.set_group_as_plugin(group, plugin, has_ui, has_inline_display),
            EngineEvent::GroupPluginRemoved { plugin } => {
                self.handle_plugin_removed(plugin);
                Ok(())
            }
            EngineEvent::GroupPositionChanged {
                group,
                pos,
                split_pos,
            } => self.set_group_pos_full(group, pos, split_pos),
            EngineEvent::PortAdded {
                group,
                port,
                name,
                mode,
                port_type,
                is_alternate,
            } => self.add_port(group, port, &name, mode, port_type, is_alternate),
            EngineEvent::PortRemoved { group, port } => self.remove_port(group, port),
            EngineEvent::PortRenamed { group, port, name } => {
                self.rename_port(group, port, &name)
            }
            EngineEvent::ConnectionAdded {
                connection,
                group_out,
                port_out,
                group_in,
                port_in,
            } => self.connect(connection, group_out, port_out, group_in, port_in, false),
            EngineEvent::ConnectionRemoved { connection } => self.disconnect(connection),
        };
        if let Err(err) = result {
            tracing::warn!(%err, "rejected engine event");
        }
    }

    /// Tears the whole model down, connections first, then ports, then
    /// groups, keeping a by-name position snapshot so groups re-added later
    /// in the session come back where they were.
    pub fn clear(&mut self) {
        for group in &self.groups {
            self.session_positions.insert(
                group.name.clone(),
                StoredPosition {
                    pos: group.pos,
                    split_pos: group.split_pos,
                    split: group.split,
                },
            );
        }

        let connection_ids: Vec<ConnectionId> =
            self.connections.iter().map(|c| c.connection_id).collect();
        let port_ids: Vec<(GroupId, PortId)> = self
            .ports
            .iter()
            .map(|p| (p.group_id, p.port_id))
            .collect();
        let group_ids: Vec<GroupId> = self.groups.iter().map(|g| g.group_id).collect();

        for id in connection_ids {
            if let Err(err) = self.disconnect(id) {
                tracing::warn!(%err, "clear: disconnect failed");
            }
        }
        for (group, port) in port_ids {
            if let Err(err) = self.remove_port(group, port) {
                tracing::warn!(%err, "clear: port removal failed");
            }
        }
        for id in group_ids {
            if let Err(err) = self.remove_group(id) {
                tracing::warn!(%err, "clear: group removal failed");
            }
        }

        self.last_connection_id = 0;
        self.next_pair_id = 1;
        self.session_rules.clear();
    }

    /// Validates a prospective connection and asks the engine to make it.
    pub fn request_connect(
        &mut self,
        group_out: GroupId,
        port_out: PortId,
        group_in: GroupId,
        port_in: PortId,
    ) -> Result<(), GraphError> {
        self.check_endpoints(group_out, port_out, group_in, port_in)?;
        self.sink.request(ActionRequest::Connect {
            group_out,
            port_out,
            group_in,
            port_in,
        });
        Ok(())
    }

    pub fn request_disconnect(&mut self, connection: ConnectionId) -> Result<(), GraphError> {
        if self.connection(connection).is_none() {
            return Err(GraphError::ConnectionNotFound(connection));
        }
        self.sink.request(ActionRequest::Disconnect { connection });
        Ok(())
    }

    pub fn request_group_split(&mut self, group: GroupId) -> Result<(), GraphError> {
        let record = self
            .group(group)
            .ok_or(GraphError::GroupNotFound(group))?;
        if record.split {
            return Err(GraphError::AlreadySplit(group));
        }
        self.sink.request(ActionRequest::SplitGroup { group });
        Ok(())
    }

    pub fn request_group_join(&mut self, group: GroupId) -> Result<(), GraphError> {
        let record = self
            .group(group)
            .ok_or(GraphError::GroupNotFound(group))?;
        if !record.split {
            return Err(GraphError::NotSplit(group));
        }
        self.sink.request(ActionRequest::JoinGroup { group });
        Ok(())
    }

    pub fn request_group_rename(
        &mut self,
        group: GroupId,
        name: &str,
    ) -> Result<(), GraphError> {
        if self.group(group).is_none() {
            return Err(GraphError::GroupNotFound(group));
        }
        self.sink.request(ActionRequest::RenameGroup {
            group,
            name: name.to_string(),
        });
        Ok(())
    }

    /// Asks the engine binding to persist a group's current coordinates.
    pub fn request_save_position(&mut self, group: GroupId) -> Result<(), GraphError> {
        let record = self
            .group(group)
            .ok_or(GraphError::GroupNotFound(group))?;
        let (pos, split_pos) = (record.pos, record.split_pos);
        self.sink.request(ActionRequest::SaveGroupPosition {
            group,
            pos,
            split_pos,
        });
        Ok(())
    }

    pub(crate) fn check_endpoints(
        &self,
        group_out: GroupId,
        port_out: PortId,
        group_in: GroupId,
        port_in: PortId,
    ) -> Result<(), GraphError> {
        let out = self
            .port(group_out, port_out)
            .ok_or(GraphError::PortNotFound(group_out, port_out))?;
        let inp = self
            .port(group_in, port_in)
            .ok_or(GraphError::PortNotFound(group_in, port_in))?;
        if out.mode != crate::PortMode::Output || inp.mode != crate::PortMode::Input {
            return Err(GraphError::ModeMismatch(port_out, port_in));
        }
        if out.port_type != inp.port_type {
            return Err(GraphError::TypeMismatch(port_out, port_in));
        }
        Ok(())
    }
}

impl std::fmt::Debug for GraphModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphModel")
            .field("groups", &self.groups.len())
            .field("ports", &self.ports.len())
            .field("pairs", &self.pairs.len())
            .field("connections", &self.connections.len())
            .field("last_connection_id", &self.last_connection_id)
            .finish_non_exhaustive()
    }
}

/// Resolves a split hint: explicit hint first, then the stored preference
/// for the group name, then "split if hardware".
pub(crate) fn resolve_split(
    hint: SplitHint,
    stored: Option<bool>,
    is_hardware: bool,
) -> bool {
    match hint {
        SplitHint::Split => true,
        SplitHint::Joined => false,
        SplitHint::Unspecified => stored.unwrap_or(is_hardware),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_hint_resolution() {
        assert!(resolve_split(SplitHint::Split, Some(false), false));
        assert!(!resolve_split(SplitHint::Joined, Some(true), true));
        assert!(resolve_split(SplitHint::Unspecified, Some(true), false));
        assert!(!resolve_split(SplitHint::Unspecified, Some(false), true));
        assert!(resolve_split(SplitHint::Unspecified, None, true));
        assert!(!resolve_split(SplitHint::Unspecified, None, false));
    }
}
