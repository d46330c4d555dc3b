//! Port records and their registry operations.

use serde::{Deserialize, Serialize};

use crate::{GraphError, GraphModel, GroupId, PairId, PortId};

/// Direction of a port relative to its owning group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortMode {
    Input,
    Output,
}

/// Signal type carried by a port. Immutable after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortType {
    Audio,
    MidiNative,
    MidiVirtual,
    /// CV / parameter automation port.
    Parameter,
}

/// One named, typed, directional terminal of a group.
#[derive(Debug, Clone, PartialEq)]
pub struct Port {
    pub group_id: GroupId,
    pub port_id: PortId,
    pub name: String,
    pub mode: PortMode,
    pub port_type: PortType,
    /// Presentation hint for secondary ports (e.g. a plugin's sidechain).
    pub is_alternate: bool,
    pub pair: Option<PairId>,
}

impl GraphModel {
    pub fn port(&self, group_id: GroupId, port_id: PortId) -> Option<&Port> {
        self.ports
            .iter()
            .find(|p| p.group_id == group_id && p.port_id == port_id)
    }

    fn port_index(&self, group_id: GroupId, port_id: PortId) -> Option<usize> {
        self.ports
            .iter()
            .position(|p| p.group_id == group_id && p.port_id == port_id)
    }

    /// Registers a port and runs pair inference on it.
    pub fn add_port(
        &mut self,
        group_id: GroupId,
        port_id: PortId,
        name: &str,
        mode: PortMode,
        port_type: PortType,
        is_alternate: bool,
    ) -> Result<(), GraphError> {
        if self.group(group_id).is_none() {
            return Err(GraphError::GroupNotFound(group_id));
        }
        if self.port(group_id, port_id).is_some() {
            return Err(GraphError::DuplicatePort(group_id, port_id));
        }
        self.ports.push(Port {
            group_id,
            port_id,
            name: name.to_string(),
            mode,
            port_type,
            is_alternate,
            pair: None,
        });
        self.listener.on_port_added(group_id, port_id);
        self.infer_pair_for(group_id, port_id);
        Ok(())
    }

    /// Removes a port, shrinking or dissolving its pair first.
    ///
    /// Connections must already be gone; leftovers are logged as an ordering
    /// violation and kept (the core never cascade-deletes).
    pub fn remove_port(&mut self, group_id: GroupId, port_id: PortId) -> Result<(), GraphError> {
        let index = self
            .port_index(group_id, port_id)
            .ok_or(GraphError::PortNotFound(group_id, port_id))?;

        let touching = self.connections_touching(group_id, port_id).len();
        if touching > 0 {
            tracing::error!(
                ?group_id,
                ?port_id,
                touching,
                "port removed while connections still reference it"
            );
        }

        if let Some(pair_id) = self.ports[index].pair {
            self.shrink_or_dissolve_pair(pair_id, port_id);
        }

        // The pair operations above never reorder, the index stays valid.
        let port = self.ports.remove(index);
        debug_assert_eq!(port.port_id, port_id);
        self.listener.on_port_removed(group_id, port_id);
        Ok(())
    }

    pub fn rename_port(
        &mut self,
        group_id: GroupId,
        port_id: PortId,
        name: &str,
    ) -> Result<(), GraphError> {
        let index = self
            .port_index(group_id, port_id)
            .ok_or(GraphError::PortNotFound(group_id, port_id))?;
        self.ports[index].name = name.to_string();
        if let Some(pair_id) = self.ports[index].pair {
            self.refresh_pair_name(pair_id);
        }
        self.listener.on_port_renamed(group_id, port_id, name);
        Ok(())
    }

    pub fn set_port_alternate(
        &mut self,
        group_id: GroupId,
        port_id: PortId,
        is_alternate: bool,
    ) -> Result<(), GraphError> {
        let index = self
            .port_index(group_id, port_id)
            .ok_or(GraphError::PortNotFound(group_id, port_id))?;
        self.ports[index].is_alternate = is_alternate;
        self.listener.on_port_changed(group_id, port_id);
        Ok(())
    }
}
