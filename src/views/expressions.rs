/// Expressions view: submit new expressions and list existing ones.
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::sequence::{RequestSequence, Ticket};
use super::status::{self, StatusIcon};
use super::{Applied, Notice};
use crate::api::{ApiResult, Expression, ExpressionStatus, Gateway, Id};
use crate::config::schema::ClearInput;
use crate::session::SessionContext;

/// Display form of one expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpressionRow {
    pub id: Id,
    /// `"<text> = <result>"`, with `?` until the result is authoritative.
    pub title: String,
    pub status: ExpressionStatus,
    pub description: &'static str,
    #[serde(skip)]
    pub icon: StatusIcon,
    pub result: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl ExpressionRow {
    pub fn from_expression(expr: &Expression) -> Self {
        let result = expr.authoritative_result();
        let shown = result.map_or_else(|| "?".to_string(), |r| r.to_string());
        Self {
            id: expr.id.clone(),
            title: format!("{} = {}", expr.data, shown),
            status: expr.status,
            description: status::expression_description(expr.status),
            icon: status::expression_icon(expr.status),
            result,
            created_at: expr.created_at,
        }
    }
}

#[derive(Debug, Default)]
pub struct ExpressionsView {
    input: String,
    expressions: Vec<Expression>,
    sequence: RequestSequence,
    clear_input: ClearInput,
}

impl ExpressionsView {
    pub fn new(clear_input: ClearInput) -> Self {
        Self {
            clear_input,
            ..Self::default()
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// The submit control is enabled only for non-empty input.
    pub fn can_submit(&self) -> bool {
        !self.input.is_empty()
    }

    pub fn expressions(&self) -> &[Expression] {
        &self.expressions
    }

    pub fn rows(&self) -> Vec<ExpressionRow> {
        self.expressions.iter().map(ExpressionRow::from_expression).collect()
    }

    pub fn discarded_responses(&self) -> u64 {
        self.sequence.discarded()
    }

    /// Fetch the full list and replace the local copy.
    pub fn refresh(&mut self, gateway: &impl Gateway, session: &SessionContext) -> ApiResult<Applied> {
        let ticket = self.begin_refresh();
        let result = gateway.list_expressions(session);
        self.apply_refresh(ticket, result)
    }

    /// Start a fetch; the returned ticket must accompany its response.
    pub fn begin_refresh(&mut self) -> Ticket {
        self.sequence.begin()
    }

    /// Apply a fetched snapshot unless a newer fetch has been issued.
    ///
    /// On error the previous list stays in place.
    pub fn apply_refresh(
        &mut self,
        ticket: Ticket,
        result: ApiResult<Vec<Expression>>,
    ) -> ApiResult<Applied> {
        let expressions = result?;
        if !self.sequence.accept(ticket, "expressions") {
            return Ok(Applied::Stale);
        }
        for expr in expressions.iter().filter(|e| !e.is_consistent()) {
            tracing::warn!(
                id = %expr.id,
                status = %expr.status,
                is_ready = expr.is_ready,
                "expression readiness disagrees with its status"
            );
        }
        self.expressions = expressions;
        Ok(Applied::Replaced)
    }

    /// Submit the current input.
    ///
    /// Returns `None` when the submit control is disabled. On success the
    /// list is refreshed; on failure it is left alone and the service's
    /// message is returned verbatim. The input is cleared once the request
    /// settles according to the [`ClearInput`] policy.
    pub fn submit(&mut self, gateway: &impl Gateway, session: &SessionContext) -> Option<Notice> {
        if !self.can_submit() {
            return None;
        }

        let outcome = gateway.create_expression(session, &self.input);

        if self.clear_input == ClearInput::Always || outcome.is_ok() {
            self.input.clear();
        }

        Some(match outcome {
            Ok(created) => {
                tracing::info!(id = %created.id, "expression accepted");
                if let Err(e) = self.refresh(gateway, session) {
                    tracing::warn!(error = %e, "refresh after submission failed");
                }
                Notice::success(format!("Expression accepted: {}", created.data))
            }
            Err(e) => Notice::error(e.message()),
        })
    }
}
