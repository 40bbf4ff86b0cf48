/// View models for the four named views.
///
/// Each view owns its local state (lists, form input), fetches through a
/// [`Gateway`](crate::api::Gateway) on activation and after a successful
/// mutation, and replaces its list wholesale with the snapshot it gets back.
/// Views hold no session state of their own; the
/// [`SessionContext`](crate::session::SessionContext) is passed into every
/// call.
///
/// A failed fetch leaves the previously rendered list in place. User-facing
/// outcomes of actions are returned as [`Notice`]s for the caller to show.
pub mod agents;
pub mod auth;
pub mod expressions;
pub mod operations;
pub mod sequence;
pub mod status;

use std::fmt;

pub use agents::{AgentRow, AgentsView};
pub use auth::{AuthMode, AuthView};
pub use expressions::{ExpressionRow, ExpressionsView};
pub use operations::{OperationRow, OperationsView};
pub use sequence::{RequestSequence, Ticket};

/// Transient user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self::Success(message.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Success(m) | Self::Error(m) => m,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Outcome of applying a fetched snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The snapshot replaced the local list.
    Replaced,
    /// A newer request was issued meanwhile; the snapshot was dropped.
    Stale,
}
