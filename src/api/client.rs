/// Synchronous HTTP client for the expression service.
///
/// Built on `ureq`. One request per call, no retries, no caching. Non-2xx
/// responses are decoded into [`ApiError`] with the service's `error` field
/// preserved verbatim.
use std::time::{Duration, Instant};

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::error::{ApiError, ApiResult};
use super::models::{
    Agent, Credentials, ErrorBody, Expression, Id, LoginResponse, NewExpression, Operation,
    OperationUpdate, RegisterResponse, Token,
};
use super::Gateway;
use crate::config::schema::ApiConfig;
use crate::session::SessionContext;

/// HTTP implementation of [`Gateway`].
#[derive(Debug, Clone)]
pub struct GatewayClient {
    base_url: String,
    timeout: Option<Duration>,
    agent: ureq::Agent,
}

impl GatewayClient {
    /// Build a client from the resolved config.
    ///
    /// A `timeout_ms` of zero leaves requests without a deadline.
    pub fn from_config(config: &ApiConfig) -> Self {
        let timeout = (config.timeout_ms > 0).then(|| Duration::from_millis(config.timeout_ms));
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout,
            agent: builder.build(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn request(&self, method: &str, path: &str, session: &SessionContext) -> ureq::Request {
        let url = format!("{}{}", self.base_url, path);
        let request = self
            .agent
            .request(method, &url)
            .set("Accept", "application/json");
        match session.get_token() {
            Some(token) => request.set("Authorization", &token.bearer()),
            None => request,
        }
    }

    fn get<T: DeserializeOwned>(&self, path: &str, session: &SessionContext) -> ApiResult<T> {
        let request = self.request("GET", path, session);
        finish("GET", path, Instant::now(), request.call())
    }

    fn send<B: Serialize, T: DeserializeOwned>(
        &self,
        method: &str,
        path: &str,
        session: &SessionContext,
        body: &B,
    ) -> ApiResult<T> {
        let request = self.request(method, path, session);
        finish(method, path, Instant::now(), request.send_json(body))
    }
}

impl Gateway for GatewayClient {
    fn list_expressions(&self, session: &SessionContext) -> ApiResult<Vec<Expression>> {
        self.get("/expressions", session)
    }

    fn create_expression(&self, session: &SessionContext, text: &str) -> ApiResult<Expression> {
        self.send("POST", "/expressions", session, &NewExpression { data: text })
    }

    fn list_operations(&self, session: &SessionContext) -> ApiResult<Vec<Operation>> {
        self.get("/operations", session)
    }

    fn update_operation(
        &self,
        session: &SessionContext,
        operation_type: &str,
        execution_time: u64,
    ) -> ApiResult<Operation> {
        let body = OperationUpdate {
            operation_type,
            execution_time,
        };
        self.send("PATCH", "/operations", session, &body)
    }

    fn list_agents(&self, session: &SessionContext) -> ApiResult<Vec<Agent>> {
        self.get("/agents", session)
    }

    fn login(&self, session: &mut SessionContext, credentials: &Credentials) -> ApiResult<Token> {
        let response: LoginResponse = self.send("POST", "/login", session, credentials)?;
        let token = Token::new(response.token);
        session.set_token(token.clone())?;
        tracing::info!(email = %credentials.email, "logged in");
        Ok(token)
    }

    fn register(&self, session: &SessionContext, credentials: &Credentials) -> ApiResult<Id> {
        let response: RegisterResponse = self.send("POST", "/register", session, credentials)?;
        tracing::info!(email = %credentials.email, user_id = %response.user_id, "registered");
        Ok(response.user_id)
    }
}

// ---------------------------------------------------------------------------
// Response handling
// ---------------------------------------------------------------------------

/// Decode a completed request, logging its outcome.
fn finish<T: DeserializeOwned>(
    method: &str,
    path: &str,
    started: Instant,
    result: Result<ureq::Response, ureq::Error>,
) -> ApiResult<T> {
    let elapsed_ms = started.elapsed().as_millis() as u64;
    match result {
        Ok(response) => {
            tracing::debug!(method, path, status = response.status(), elapsed_ms, "request ok");
            response
                .into_json()
                .map_err(|e| ApiError::Decode(e.to_string()))
        }
        Err(ureq::Error::Status(status, response)) => {
            let reason = response.status_text().to_string();
            let body = response.into_string().unwrap_or_default();
            let err = ApiError::from_status(status, error_message(&body, &reason));
            tracing::warn!(method, path, status, elapsed_ms, error = %err, "request rejected");
            Err(err)
        }
        Err(ureq::Error::Transport(transport)) => {
            tracing::warn!(method, path, elapsed_ms, error = %transport, "request failed");
            Err(ApiError::Transport(transport.to_string()))
        }
    }
}

/// Extract the service's error message from a response body.
///
/// Prefers the JSON `error` field; falls back to the raw body, then to the
/// HTTP reason phrase.
fn error_message(body: &str, reason: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return parsed.error;
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        reason.to_string()
    } else {
        trimmed.to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
