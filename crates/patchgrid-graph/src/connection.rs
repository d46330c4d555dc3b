//! Connection records and the id-monotonicity watermark.

use serde::{Deserialize, Serialize};

use crate::{ConnectionId, GraphError, GraphModel, GroupId, PortId};

/// A directed edge from an output port to an input port. Holds identifiers
/// only, never endpoint lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub connection_id: ConnectionId,
    pub group_out: GroupId,
    pub port_out: PortId,
    pub group_in: GroupId,
    pub port_in: PortId,
}

impl GraphModel {
    pub fn connection(&self, connection_id: ConnectionId) -> Option<&Connection> {
        self.connections
            .iter()
            .find(|c| c.connection_id == connection_id)
    }

    /// Registers an engine-confirmed connection.
    ///
    /// Ids must arrive strictly increasing; `replay` lifts that check for
    /// the split/join transaction, which re-creates connections whose ids
    /// were already accepted once.
    pub fn connect(
        &mut self,
        connection_id: ConnectionId,
        group_out: GroupId,
        port_out: PortId,
        group_in: GroupId,
        port_in: PortId,
        replay: bool,
    ) -> Result<(), GraphError> {
        if !replay && connection_id.0 <= self.last_connection_id {
            return Err(GraphError::OrderingViolation {
                received: connection_id,
                last: ConnectionId(self.last_connection_id),
            });
        }
        if self.connection(connection_id).is_some() {
            return Err(GraphError::DuplicateConnection(connection_id));
        }
        self.check_endpoints(group_out, port_out, group_in, port_in)?;

        self.connections.push(Connection {
            connection_id,
            group_out,
            port_out,
            group_in,
            port_in,
        });
        self.last_connection_id = self.last_connection_id.max(connection_id.0);
        self.listener.on_connection_added(connection_id);
        Ok(())
    }

    pub fn disconnect(&mut self, connection_id: ConnectionId) -> Result<(), GraphError> {
        let index = self
            .connections
            .iter()
            .position(|c| c.connection_id == connection_id)
            .ok_or(GraphError::ConnectionNotFound(connection_id))?;
        self.connections.remove(index);
        self.listener.on_connection_removed(connection_id);
        Ok(())
    }

    /// Connections with either endpoint on the given port.
    pub fn connections_touching(&self, group_id: GroupId, port_id: PortId) -> Vec<Connection> {
        self.connections
            .iter()
            .filter(|c| {
                (c.group_out == group_id && c.port_out == port_id)
                    || (c.group_in == group_id && c.port_in == port_id)
            })
            .copied()
            .collect()
    }
}
