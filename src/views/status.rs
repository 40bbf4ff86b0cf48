/// Status → description and status → icon tables.
///
/// Both tables are exhaustive `match`es over the status enums, so adding a
/// status without a description or icon fails to compile. Unknown status
/// strings from the service never reach this point: they fail decoding.
use colored::{ColoredString, Colorize};

use crate::api::{AgentStatus, ExpressionStatus};

/// Icon colour shown next to a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusIcon {
    Black,
    Green,
    Yellow,
    Red,
}

impl StatusIcon {
    /// Filled circle tinted with the icon colour.
    pub fn glyph(self) -> ColoredString {
        match self {
            Self::Black => "●".bright_black(),
            Self::Green => "●".green(),
            Self::Yellow => "●".yellow(),
            Self::Red => "●".red(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Black => "black",
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Red => "red",
        }
    }
}

pub fn expression_icon(status: ExpressionStatus) -> StatusIcon {
    match status {
        ExpressionStatus::ReadyForComputation => StatusIcon::Black,
        ExpressionStatus::Computing => StatusIcon::Yellow,
        ExpressionStatus::Result => StatusIcon::Green,
        ExpressionStatus::Terminated => StatusIcon::Red,
    }
}

pub fn expression_description(status: ExpressionStatus) -> &'static str {
    match status {
        ExpressionStatus::ReadyForComputation => {
            "the expression is accepted, it will be processed soon"
        }
        ExpressionStatus::Computing => {
            "the expression is being processed, it will be calculated soon"
        }
        ExpressionStatus::Result => "the expression is ready",
        ExpressionStatus::Terminated => "expression parsing error",
    }
}

pub fn agent_icon(status: AgentStatus) -> StatusIcon {
    match status {
        AgentStatus::Running => StatusIcon::Black,
        AgentStatus::Sleeping => StatusIcon::Green,
        AgentStatus::Waiting => StatusIcon::Yellow,
        AgentStatus::Terminated => StatusIcon::Red,
    }
}

pub fn agent_description(status: AgentStatus) -> &'static str {
    match status {
        AgentStatus::Running => "the server is calculating expressions and waiting for new ones",
        AgentStatus::Sleeping => "the server is calculating the expressions and is fully occupied",
        AgentStatus::Waiting => "the server is waiting for new expressions",
        AgentStatus::Terminated => "the server is down",
    }
}
