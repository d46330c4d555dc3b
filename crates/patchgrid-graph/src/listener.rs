use crate::{ActionRequest, ConnectionId, GroupId, PairId, PortId};

/// Receives model-change notifications after each committed mutation.
///
/// The rendering layer implements this. Notifications carry ids and small
/// copies only; implementations look the records up through the model when
/// they need full attributes, and must not call back into the model from
/// inside a notification (the model is mid-operation when these fire).
pub trait ModelListener {
    fn on_group_added(&mut self, _group: GroupId) {}
    fn on_group_removed(&mut self, _group: GroupId) {}
    fn on_group_renamed(&mut self, _group: GroupId, _name: &str) {}
    /// Icon or plugin binding changed.
    fn on_group_changed(&mut self, _group: GroupId) {}
    fn on_group_moved(&mut self, _group: GroupId) {}
    fn on_port_added(&mut self, _group: GroupId, _port: PortId) {}
    fn on_port_removed(&mut self, _group: GroupId, _port: PortId) {}
    fn on_port_renamed(&mut self, _group: GroupId, _port: PortId, _name: &str) {}
    /// Alternate-port presentation hint toggled.
    fn on_port_changed(&mut self, _group: GroupId, _port: PortId) {}
    /// Port rendering order changed after a pair formed.
    fn on_ports_reordered(&mut self, _group: GroupId) {}
    fn on_pair_created(&mut self, _group: GroupId, _pair: PairId) {}
    /// Pair membership shrank or its display name changed.
    fn on_pair_changed(&mut self, _group: GroupId, _pair: PairId) {}
    fn on_pair_dissolved(&mut self, _group: GroupId, _pair: PairId) {}
    fn on_connection_added(&mut self, _connection: ConnectionId) {}
    fn on_connection_removed(&mut self, _connection: ConnectionId) {}
}

/// Carries user-intent requests out to the engine binding layer.
pub trait ActionSink {
    fn request(&mut self, action: ActionRequest);
}

/// Listener that ignores every notification.
#[derive(Debug, Default)]
pub struct NullListener;

impl ModelListener for NullListener {}

/// Sink that drops every request. Useful for tests and offline tools.
#[derive(Debug, Default)]
pub struct NullSink;

impl ActionSink for NullSink {
    fn request(&mut self, _action: ActionRequest) {}
}
