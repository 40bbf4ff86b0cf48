/// View router: a single-active-view state machine.
///
/// Four states, one event. `navigate(view)` makes `view` active and records
/// it in the session, so the next process start restores it. There is no
/// terminal state.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::session::{SessionContext, SessionError};

/// The four named views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewName {
    #[default]
    Expressions,
    Operations,
    Agents,
    Login,
}

impl ViewName {
    /// All views in header order.
    pub const ALL: [ViewName; 4] = [
        ViewName::Expressions,
        ViewName::Operations,
        ViewName::Agents,
        ViewName::Login,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expressions => "Expressions",
            Self::Operations => "Operations",
            Self::Agents => "Agents",
            Self::Login => "Login",
        }
    }
}

impl fmt::Display for ViewName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "expressions" | "expression" => Ok(Self::Expressions),
            "operations" | "operation" => Ok(Self::Operations),
            "agents" | "agent" => Ok(Self::Agents),
            "login" | "auth" => Ok(Self::Login),
            _ => Err(format!(
                "unknown view '{s}' (expected one of: expressions, operations, agents, login)"
            )),
        }
    }
}

/// Holds exactly one active view.
#[derive(Debug)]
pub struct ViewRouter {
    active: ViewName,
}

impl ViewRouter {
    /// Restore the active view from the session.
    pub fn restore(session: &SessionContext) -> Self {
        let active = session.get_view();
        tracing::debug!(view = %active, "restored active view");
        Self { active }
    }

    pub fn active(&self) -> ViewName {
        self.active
    }

    /// Switch to `view` and record it durably.
    pub fn navigate(
        &mut self,
        session: &mut SessionContext,
        view: ViewName,
    ) -> Result<ViewName, SessionError> {
        session.set_view(view)?;
        if self.active != view {
            tracing::info!(from = %self.active, to = %view, "navigate");
        }
        self.active = view;
        Ok(view)
    }
}
