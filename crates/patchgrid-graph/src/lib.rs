//! Patchbay graph model and port-grouping inference.
//!
//! This crate mirrors the routing state of an external audio engine: clients
//! ("groups"), their audio/MIDI/CV ports, the connections between them, and
//! the stereo pairs inferred from port names. Engine notifications come in as
//! [`EngineEvent`]s, user intents go back out as [`ActionRequest`]s, and the
//! rendering layer observes committed changes through [`ModelListener`]. The
//! model never paints and never talks to the engine directly.

use serde::{Deserialize, Serialize};

pub mod connection;
pub mod error;
pub mod event;
pub mod group;
mod inference;
pub mod listener;
pub mod model;
pub mod pair;
pub mod port;
mod split;
pub mod store;

pub use connection::Connection;
pub use error::GraphError;
pub use event::{ActionRequest, EngineEvent, SplitHint};
pub use group::{Group, GroupIcon, PluginBinding, Point};
pub use listener::{ActionSink, ModelListener, NullListener, NullSink};
pub use model::{GraphModel, GraphOptions};
pub use pair::Pair;
pub use port::{Port, PortMode, PortType};
pub use store::{MemoryStore, NamedPosition, PairingRule, PositionStore, StoredPosition};

/// Engine-assigned identifier of a group (client).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(pub u32);

/// Engine-assigned identifier of a port, unique within its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PortId(pub u32);

/// Locally allocated identifier of a port pair. Strictly increasing, never
/// reused within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PairId(pub u32);

/// Engine-assigned identifier of a connection, strictly increasing across the
/// session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(pub u32);

/// Host-side plugin instance id a group may be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PluginId(pub u32);
