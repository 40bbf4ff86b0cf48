/// Gateway to the expression-evaluation service.
///
/// One operation per backend resource, all behind the [`Gateway`] trait so
/// views can be driven by a fake in tests. Every call takes the
/// [`SessionContext`] explicitly: the bearer token is read from it before
/// each request, and `login` writes the returned token back into it.
///
/// | Method | Path          | Operation                         |
/// |--------|---------------|-----------------------------------|
/// | GET    | `/expressions`| [`Gateway::list_expressions`]     |
/// | POST   | `/expressions`| [`Gateway::create_expression`]    |
/// | GET    | `/operations` | [`Gateway::list_operations`]      |
/// | PATCH  | `/operations` | [`Gateway::update_operation`]     |
/// | GET    | `/agents`     | [`Gateway::list_agents`]          |
/// | POST   | `/login`      | [`Gateway::login`]                |
/// | POST   | `/register`   | [`Gateway::register`]             |
pub mod client;
pub mod error;
pub mod models;

pub use client::GatewayClient;
pub use error::{ApiError, ApiResult};
pub use models::{
    Agent, AgentStatus, Credentials, Expression, ExpressionStatus, Id, Operation, Token,
};

use crate::session::SessionContext;

/// Outbound calls to the service.
pub trait Gateway {
    fn list_expressions(&self, session: &SessionContext) -> ApiResult<Vec<Expression>>;

    /// Submit new expression text. Rejected text yields
    /// [`ApiError::Validation`] carrying the service's message.
    fn create_expression(&self, session: &SessionContext, text: &str) -> ApiResult<Expression>;

    fn list_operations(&self, session: &SessionContext) -> ApiResult<Vec<Operation>>;

    /// Replace the cost of one operation type.
    fn update_operation(
        &self,
        session: &SessionContext,
        operation_type: &str,
        execution_time: u64,
    ) -> ApiResult<Operation>;

    fn list_agents(&self, session: &SessionContext) -> ApiResult<Vec<Agent>>;

    /// Exchange credentials for a token and persist it into the session.
    fn login(&self, session: &mut SessionContext, credentials: &Credentials) -> ApiResult<Token>;

    /// Create an account. Does not authenticate.
    fn register(&self, session: &SessionContext, credentials: &Credentials) -> ApiResult<Id>;
}
