//! Gameplay validation failures.
use thiserror::Error;

use crate::commander::CommanderId;
use crate::map::NodeId;
use crate::state::Phase;

/// Why an action was refused. A refused action leaves the state untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("insufficient resources: need {needed}, have {available}")]
    InsufficientResources { needed: String, available: String },
    #[error("not your turn (phase is {phase})")]
    InvalidPhase { phase: Phase },
    #[error("node {node} is at its commander capacity of {capacity}")]
    CapacityExceeded { node: NodeId, capacity: usize },
    #[error("invalid target: {reason}")]
    InvalidTarget { reason: &'static str },
    #[error("no node with id {0}")]
    UnknownNode(NodeId),
    #[error("no commander with id {0}")]
    UnknownCommander(CommanderId),
    #[error("node {node} is already at the maximum tier")]
    TierCapped { node: NodeId },
    #[error("the game is over")]
    GameOver,
}

impl ActionError {
    pub(crate) fn insufficient(
        needed: impl std::fmt::Display,
        available: impl std::fmt::Display,
    ) -> Self {
        Self::InsufficientResources {
            needed: needed.to_string(),
            available: available.to_string(),
        }
    }
}
