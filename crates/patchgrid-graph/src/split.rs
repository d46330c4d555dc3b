//! Splitting a group into separate input and output sides, and joining it
//! back. Both run the same four-phase transaction: capture the group's
//! record, ports and connections, tear all of them down including the group
//! itself, add the group back under the same id with the flag flipped, then
//! replay the ports and connections under their original ids.

use crate::store::StoredPosition;
use crate::{ActionRequest, Connection, GraphError, GraphModel, GroupId, Port, SplitHint};

impl GraphModel {
    /// Splits a joined group into two sides.
    pub fn split_group(&mut self, group_id: GroupId) -> Result<(), GraphError> {
        self.set_group_split(group_id, true)
    }

    /// Joins a split group back into one box.
    pub fn join_group(&mut self, group_id: GroupId) -> Result<(), GraphError> {
        self.set_group_split(group_id, false)
    }

    fn set_group_split(&mut self, group_id: GroupId, split: bool) -> Result<(), GraphError> {
        let Some(group) = self.group(group_id) else {
            tracing::error!(?group_id, split, "split state change for unknown group");
            return Err(GraphError::GroupNotFound(group_id));
        };
        if group.split == split {
            tracing::warn!(?group_id, split, "group already in requested split state");
            return Ok(());
        }
        let (name, icon, plugin) = (group.name.clone(), group.icon, group.plugin);

        // Capture. Port records in registration order; every connection with
        // an endpoint on this group. Pair membership is not captured: the
        // session rules recorded during teardown rebuild it.
        let ports: Vec<Port> = self
            .ports
            .iter()
            .filter(|p| p.group_id == group_id)
            .cloned()
            .collect();
        let connections: Vec<Connection> = self
            .connections
            .iter()
            .filter(|c| c.group_out == group_id || c.group_in == group_id)
            .copied()
            .collect();

        // Teardown. The group record goes too, so the listener sees the
        // same destroy-and-recreate sequence it would for any other group
        // and can rebuild its box from scratch.
        for connection in &connections {
            if let Err(err) = self.disconnect(connection.connection_id) {
                tracing::warn!(%err, "split: disconnect failed");
            }
        }
        for port in &ports {
            if let Err(err) = self.remove_port(group_id, port.port_id) {
                tracing::warn!(%err, "split: port removal failed");
            }
        }
        if let Err(err) = self.remove_group(group_id) {
            tracing::warn!(%err, "split: group removal failed");
        }

        // Recreate under the same id with an explicit hint. remove_group
        // persisted the coordinates, add_group reads them back.
        let hint = if split {
            SplitHint::Split
        } else {
            SplitHint::Joined
        };
        if let Err(err) = self.add_group(group_id, &name, hint, icon) {
            tracing::error!(%err, "split: group recreation failed");
            return Err(err);
        }
        if let Some(binding) = plugin {
            if let Err(err) = self.set_group_as_plugin(
                group_id,
                binding.plugin_id,
                binding.has_ui,
                binding.has_inline_display,
            ) {
                tracing::warn!(%err, "split: plugin binding restore failed");
            }
        }
        self.persist_split_preference(group_id, split);

        // add_port reruns inference, so pairs come back through the session
        // cache.
        for port in &ports {
            if let Err(err) = self.add_port(
                group_id,
                port.port_id,
                &port.name,
                port.mode,
                port.port_type,
                port.is_alternate,
            ) {
                tracing::warn!(%err, "split: port recreation failed");
            }
        }

        // Replay. The ids were accepted once already, so the monotonicity
        // check is lifted.
        for connection in &connections {
            if let Err(err) = self.connect(
                connection.connection_id,
                connection.group_out,
                connection.port_out,
                connection.group_in,
                connection.port_in,
                true,
            ) {
                tracing::warn!(%err, "split: connection replay failed");
            }
        }

        Ok(())
    }

    /// Saves the flipped preference for the group's name and hands the new
    /// coordinates to the engine binding.
    fn persist_split_preference(&mut self, group_id: GroupId, split: bool) {
        let Some(group) = self.group(group_id) else {
            return;
        };
        let (name, pos, split_pos) = (group.name.clone(), group.pos, group.split_pos);
        self.store.save_group_position(
            &name,
            StoredPosition {
                pos,
                split_pos,
                split,
            },
        );
        self.sink.request(ActionRequest::SaveGroupPosition {
            group: group_id,
            pos,
            split_pos,
        });
    }
}
