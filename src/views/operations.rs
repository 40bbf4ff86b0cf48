/// Operations view: per-operation execution cost with dirty-checked edits.
use std::collections::HashMap;

use serde::Serialize;

use super::sequence::{RequestSequence, Ticket};
use super::{Applied, Notice};
use crate::api::{ApiResult, Gateway, Id, Operation};
use crate::session::SessionContext;

/// One editable row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationRow {
    pub operation: Operation,
    /// Locally edited cost; starts at the fetched value.
    pub edited: u64,
}

impl OperationRow {
    fn new(operation: Operation) -> Self {
        let edited = operation.execution_time;
        Self { operation, edited }
    }

    /// Save is enabled only while the edit differs from the fetched value.
    pub fn is_dirty(&self) -> bool {
        self.edited != self.operation.execution_time
    }
}

#[derive(Debug, Default)]
pub struct OperationsView {
    rows: Vec<OperationRow>,
    sequence: RequestSequence,
}

impl OperationsView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[OperationRow] {
        &self.rows
    }

    pub fn row(&self, operation_type: &str) -> Option<&OperationRow> {
        self.rows
            .iter()
            .find(|r| r.operation.operation_type == operation_type)
    }

    /// Set the locally edited cost. Returns `false` for an unknown type.
    pub fn edit(&mut self, operation_type: &str, value: u64) -> bool {
        match self
            .rows
            .iter_mut()
            .find(|r| r.operation.operation_type == operation_type)
        {
            Some(row) => {
                row.edited = value;
                true
            }
            None => false,
        }
    }

    pub fn is_dirty(&self, operation_type: &str) -> bool {
        self.row(operation_type).is_some_and(OperationRow::is_dirty)
    }

    pub fn refresh(&mut self, gateway: &impl Gateway, session: &SessionContext) -> ApiResult<Applied> {
        let ticket = self.begin_refresh();
        let result = gateway.list_operations(session);
        self.apply_refresh(ticket, result)
    }

    pub fn begin_refresh(&mut self) -> Ticket {
        self.sequence.begin()
    }

    /// Replace all rows with the snapshot.
    ///
    /// Rows still present keep their local edit, matched by id; the dirty
    /// check then runs against the newly fetched cost. New rows start at
    /// their fetched value.
    pub fn apply_refresh(
        &mut self,
        ticket: Ticket,
        result: ApiResult<Vec<Operation>>,
    ) -> ApiResult<Applied> {
        let operations = result?;
        if !self.sequence.accept(ticket, "operations") {
            return Ok(Applied::Stale);
        }
        let edits: HashMap<Id, u64> = self
            .rows
            .drain(..)
            .filter(OperationRow::is_dirty)
            .map(|row| (row.operation.id, row.edited))
            .collect();
        self.rows = operations
            .into_iter()
            .map(|operation| {
                let mut row = OperationRow::new(operation);
                if let Some(&edited) = edits.get(&row.operation.id) {
                    row.edited = edited;
                }
                row
            })
            .collect();
        Ok(Applied::Replaced)
    }

    /// Save the edited cost of one row.
    ///
    /// Returns `None` when the row is unknown or clean (Save disabled).
    /// On failure the edited value stays in place.
    pub fn save(
        &mut self,
        gateway: &impl Gateway,
        session: &SessionContext,
        operation_type: &str,
    ) -> Option<Notice> {
        let row = self.row(operation_type).filter(|r| r.is_dirty())?;
        let value = row.edited;

        match gateway.update_operation(session, operation_type, value) {
            Ok(updated) => {
                tracing::info!(
                    operation_type = %updated.operation_type,
                    execution_time = updated.execution_time,
                    "operation updated"
                );
                if let Err(e) = self.refresh(gateway, session) {
                    tracing::warn!(error = %e, "refresh after update failed");
                }
                Some(Notice::success(format!(
                    "{} now takes {}s",
                    updated.operation_type, updated.execution_time
                )))
            }
            Err(e) => Some(Notice::error(e.message())),
        }
    }
}
