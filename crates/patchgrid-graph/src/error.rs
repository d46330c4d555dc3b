use thiserror::Error;

use crate::{ConnectionId, GroupId, PairId, PortId};

/// Error produced by graph model operations.
///
/// Every variant is handled locally by [`GraphModel::apply`] (logged, then
/// treated as a no-op); the engine is the source of truth and is expected to
/// reconcile. Direct callers get the error back so they can decide for
/// themselves.
///
/// [`GraphModel::apply`]: crate::GraphModel::apply
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("group {0:?} not found")]
    GroupNotFound(GroupId),
    #[error("port {1:?} not found in group {0:?}")]
    PortNotFound(GroupId, PortId),
    #[error("pair {0:?} not found")]
    PairNotFound(PairId),
    #[error("connection {0:?} not found")]
    ConnectionNotFound(ConnectionId),
    #[error("group {0:?} already exists")]
    DuplicateGroup(GroupId),
    #[error("port {1:?} already exists in group {0:?}")]
    DuplicatePort(GroupId, PortId),
    #[error("connection {0:?} already exists")]
    DuplicateConnection(ConnectionId),
    #[error("ports {0:?} and {1:?} do not form an output/input pair")]
    ModeMismatch(PortId, PortId),
    #[error("ports {0:?} and {1:?} carry different signal types")]
    TypeMismatch(PortId, PortId),
    #[error("port {0:?} already belongs to pair {1:?}")]
    AlreadyPaired(PortId, PairId),
    #[error("a pair needs at least two ports, got {0}")]
    PairTooSmall(usize),
    #[error("pair member {0:?} does not match the pair's group, mode or type")]
    PairMemberMismatch(PortId),
    #[error("group {0:?} is already split")]
    AlreadySplit(GroupId),
    #[error("group {0:?} is not split")]
    NotSplit(GroupId),
    #[error("connection id {received:?} is not above the last accepted id {last:?}")]
    OrderingViolation {
        received: ConnectionId,
        last: ConnectionId,
    },
}
