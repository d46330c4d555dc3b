use serde::{Deserialize, Serialize};

use crate::{
    ConnectionId, GroupIcon, GroupId, PluginId, Point, PortId, PortMode, PortType,
};

/// Split preference carried by a group-added event.
///
/// `Unspecified` lets the model consult the position store and fall back to
/// splitting hardware groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitHint {
    Unspecified,
    Split,
    Joined,
}

/// Inbound notification from the engine binding.
///
/// Events must be applied in delivery order; the connection registry enforces
/// this for connection ids, the other registries rely on the caller's
/// ordering discipline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineEvent {
    GroupAdded {
        group: GroupId,
        name: String,
        split: SplitHint,
        icon: GroupIcon,
    },
    GroupRemoved {
        group: GroupId,
    },
    GroupRenamed {
        group: GroupId,
        name: String,
    },
    GroupIconChanged {
        group: GroupId,
        icon: GroupIcon,
    },
    GroupAsPlugin {
        group: GroupId,
        plugin: PluginId,
        has_ui: bool,
        has_inline_display: bool,
    },
    GroupPluginRemoved {
        plugin: PluginId,
    },
    GroupPositionChanged {
        group: GroupId,
        pos: Point,
        split_pos: Point,
    },
    PortAdded {
        group: GroupId,
        port: PortId,
        name: String,
        mode: PortMode,
        port_type: PortType,
        is_alternate: bool,
    },
    PortRemoved {
        group: GroupId,
        port: PortId,
    },
    PortRenamed {
        group: GroupId,
        port: PortId,
        name: String,
    },
    ConnectionAdded {
        connection: ConnectionId,
        group_out: GroupId,
        port_out: PortId,
        group_in: GroupId,
        port_in: PortId,
    },
    ConnectionRemoved {
        connection: ConnectionId,
    },
}

/// Outbound request asking the engine binding to perform an authoritative
/// change. The confirmed change comes back as an [`EngineEvent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActionRequest {
    Connect {
        group_out: GroupId,
        port_out: PortId,
        group_in: GroupId,
        port_in: PortId,
    },
    Disconnect {
        connection: ConnectionId,
    },
    SaveGroupPosition {
        group: GroupId,
        pos: Point,
        split_pos: Point,
    },
    SplitGroup {
        group: GroupId,
    },
    JoinGroup {
        group: GroupId,
    },
    RenameGroup {
        group: GroupId,
        name: String,
    },
}
