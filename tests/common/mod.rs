//! Shared fixtures: a scripted in-memory gateway for view tests and a
//! `tiny_http` server for HTTP contract tests.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread;

use daec::api::{
    Agent, AgentStatus, ApiError, ApiResult, Credentials, Expression, ExpressionStatus, Gateway,
    Id, Operation, Token,
};
use daec::session::SessionContext;

// ---------------------------------------------------------------------------
// Fake gateway
// ---------------------------------------------------------------------------

/// One observed call: operation name and the token it carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub op: &'static str,
    pub token: Option<String>,
}

/// In-memory stand-in for the service.
#[derive(Default)]
pub struct FakeGateway {
    pub expressions: RefCell<Vec<Expression>>,
    pub operations: RefCell<Vec<Operation>>,
    /// Successive agent snapshots; the last one repeats.
    pub agent_snapshots: RefCell<VecDeque<Vec<Agent>>>,
    /// Expression texts the "parser" rejects, with the error message.
    pub rejected_texts: RefCell<Vec<(String, String)>>,
    /// When set, every update fails with this message.
    pub update_error: RefCell<Option<String>>,
    pub accounts: RefCell<Vec<Credentials>>,
    pub calls: RefCell<Vec<Call>>,
    next_id: RefCell<u64>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_operations(ops: &[(&str, u64)]) -> Self {
        let gateway = Self::new();
        *gateway.operations.borrow_mut() = ops
            .iter()
            .enumerate()
            .map(|(i, (kind, cost))| Operation {
                id: Id::new(i.to_string()),
                operation_type: kind.to_string(),
                execution_time: *cost,
                user_id: None,
            })
            .collect();
        gateway
    }

    pub fn reject(&self, text: &str, message: &str) {
        self.rejected_texts
            .borrow_mut()
            .push((text.to_string(), message.to_string()));
    }

    /// Simulate the service finishing an expression.
    pub fn complete(&self, id: &Id, result: f64) {
        for expr in self.expressions.borrow_mut().iter_mut() {
            if &expr.id == id {
                expr.status = ExpressionStatus::Result;
                expr.is_ready = true;
                expr.result = result;
            }
        }
    }

    pub fn push_agents(&self, agents: Vec<Agent>) {
        self.agent_snapshots.borrow_mut().push_back(agents);
    }

    pub fn ops(&self) -> Vec<&'static str> {
        self.calls.borrow().iter().map(|c| c.op).collect()
    }

    fn record(&self, op: &'static str, session: &SessionContext) {
        self.calls.borrow_mut().push(Call {
            op,
            token: session.get_token().map(|t| t.as_str().to_string()),
        });
    }
}

fn validation(message: &str) -> ApiError {
    ApiError::from_status(400, message)
}

impl Gateway for FakeGateway {
    fn list_expressions(&self, session: &SessionContext) -> ApiResult<Vec<Expression>> {
        self.record("list_expressions", session);
        Ok(self.expressions.borrow().clone())
    }

    fn create_expression(&self, session: &SessionContext, text: &str) -> ApiResult<Expression> {
        self.record("create_expression", session);
        if let Some((_, message)) = self
            .rejected_texts
            .borrow()
            .iter()
            .find(|(t, _)| t == text)
        {
            return Err(validation(message));
        }

        let mut next = self.next_id.borrow_mut();
        *next += 1;
        let expr = pending_expression(&next.to_string(), text);
        self.expressions.borrow_mut().push(expr.clone());
        Ok(expr)
    }

    fn list_operations(&self, session: &SessionContext) -> ApiResult<Vec<Operation>> {
        self.record("list_operations", session);
        Ok(self.operations.borrow().clone())
    }

    fn update_operation(
        &self,
        session: &SessionContext,
        operation_type: &str,
        execution_time: u64,
    ) -> ApiResult<Operation> {
        self.record("update_operation", session);
        if let Some(message) = self.update_error.borrow().as_deref() {
            return Err(validation(message));
        }
        let mut ops = self.operations.borrow_mut();
        let op = ops
            .iter_mut()
            .find(|o| o.operation_type == operation_type)
            .ok_or_else(|| validation("can't update operation: no rows in result set"))?;
        op.execution_time = execution_time;
        Ok(op.clone())
    }

    fn list_agents(&self, session: &SessionContext) -> ApiResult<Vec<Agent>> {
        self.record("list_agents", session);
        let mut snapshots = self.agent_snapshots.borrow_mut();
        let snapshot = if snapshots.len() > 1 {
            snapshots.pop_front().unwrap_or_default()
        } else {
            snapshots.front().cloned().unwrap_or_default()
        };
        Ok(snapshot)
    }

    fn login(&self, session: &mut SessionContext, credentials: &Credentials) -> ApiResult<Token> {
        self.record("login", session);
        if !self.accounts.borrow().contains(credentials) {
            return Err(validation("can't login user: invalid credentials"));
        }
        let token = Token::new(format!("token-for-{}", credentials.email));
        session.set_token(token.clone())?;
        Ok(token)
    }

    fn register(&self, session: &SessionContext, credentials: &Credentials) -> ApiResult<Id> {
        self.record("register", session);
        let mut accounts = self.accounts.borrow_mut();
        if accounts.iter().any(|a| a.email == credentials.email) {
            return Err(validation("can't register new user: user already exists"));
        }
        accounts.push(credentials.clone());
        Ok(Id::new(accounts.len().to_string()))
    }
}

pub fn pending_expression(id: &str, text: &str) -> Expression {
    Expression {
        id: Id::new(id),
        data: text.to_string(),
        status: ExpressionStatus::ReadyForComputation,
        is_ready: false,
        result: 0.0,
        created_at: "2024-03-01T10:00:00Z".parse().unwrap(),
        updated_at: None,
        parse_date: None,
        parse_data: None,
        user_id: None,
        agent_id: None,
    }
}

pub fn agent(id: &str, status: AgentStatus, ping: &str) -> Agent {
    Agent {
        id: Id::new(id),
        status,
        number_of_parallel_calculations: 4,
        number_of_active_calculations: 1,
        last_ping: ping.parse().unwrap(),
        created_at: "2024-03-01T09:00:00Z".parse().unwrap(),
    }
}

// ---------------------------------------------------------------------------
// HTTP fixture server
// ---------------------------------------------------------------------------

/// A request as seen by the fixture server.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub body: String,
}

/// Background `tiny_http` server answering with a handler's `(status, body)`.
pub struct TestServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl TestServer {
    pub fn start<F>(handler: F) -> Self
    where
        F: FnMut(&Recorded) -> (u16, String) + Send + 'static,
    {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let port = server.server_addr().to_ip().unwrap().port();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&requests);
        let mut handler = handler;

        thread::spawn(move || {
            for mut request in server.incoming_requests() {
                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);
                let recorded = Recorded {
                    method: request.method().to_string(),
                    path: request.url().to_string(),
                    authorization: request
                        .headers()
                        .iter()
                        .find(|h| h.field.equiv("Authorization"))
                        .map(|h| h.value.as_str().to_string()),
                    body,
                };

                let (status, payload) = handler(&recorded);
                log.lock().unwrap().push(recorded);

                let response = tiny_http::Response::from_string(payload)
                    .with_status_code(tiny_http::StatusCode(status))
                    .with_header(
                        tiny_http::Header::from_bytes("Content-Type", "application/json").unwrap(),
                    );
                let _ = request.respond(response);
            }
        });

        Self {
            base_url: format!("http://127.0.0.1:{port}/v1"),
            requests,
        }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}
