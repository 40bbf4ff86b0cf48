/// Agents view: read-only worker health dashboard.
use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::sequence::{RequestSequence, Ticket};
use super::status::{self, StatusIcon};
use super::Applied;
use crate::api::{Agent, AgentStatus, ApiResult, Gateway, Id};
use crate::session::SessionContext;

/// Display form of one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentRow {
    pub id: Id,
    pub status: AgentStatus,
    pub title: String,
    pub description: &'static str,
    #[serde(skip)]
    pub icon: StatusIcon,
    pub last_ping: DateTime<Utc>,
    pub parallel_calculations: u32,
    pub active_calculations: u32,
    pub created_at: DateTime<Utc>,
}

impl AgentRow {
    pub fn from_agent(agent: &Agent) -> Self {
        let description = status::agent_description(agent.status);
        Self {
            id: agent.id.clone(),
            status: agent.status,
            title: format!("Computing server ({description})"),
            description,
            icon: status::agent_icon(agent.status),
            last_ping: agent.last_ping,
            parallel_calculations: agent.number_of_parallel_calculations,
            active_calculations: agent.number_of_active_calculations,
            created_at: agent.created_at,
        }
    }
}

#[derive(Debug, Default)]
pub struct AgentsView {
    agents: Vec<Agent>,
    sequence: RequestSequence,
    /// Agents seen terminated during this view's lifetime.
    terminated: HashSet<Id>,
    violations: u64,
}

impl AgentsView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn rows(&self) -> Vec<AgentRow> {
        self.agents.iter().map(AgentRow::from_agent).collect()
    }

    /// Terminated agents later reported alive.
    pub fn contract_violations(&self) -> u64 {
        self.violations
    }

    pub fn refresh(&mut self, gateway: &impl Gateway, session: &SessionContext) -> ApiResult<Applied> {
        let ticket = self.begin_refresh();
        let result = gateway.list_agents(session);
        self.apply_refresh(ticket, result)
    }

    pub fn begin_refresh(&mut self) -> Ticket {
        self.sequence.begin()
    }

    pub fn apply_refresh(&mut self, ticket: Ticket, result: ApiResult<Vec<Agent>>) -> ApiResult<Applied> {
        let agents = result?;
        if !self.sequence.accept(ticket, "agents") {
            return Ok(Applied::Stale);
        }

        for agent in &agents {
            if agent.status == AgentStatus::Terminated {
                self.terminated.insert(agent.id.clone());
            } else if self.terminated.contains(&agent.id) {
                self.violations += 1;
                tracing::warn!(
                    id = %agent.id,
                    status = %agent.status,
                    "terminated agent reported as alive"
                );
            }
        }

        self.agents = agents;
        Ok(Applied::Replaced)
    }
}
