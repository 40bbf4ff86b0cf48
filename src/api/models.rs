/// Wire types for the expression-evaluation service.
///
/// The service owns every entity here; the client only decodes snapshots.
/// Decoding is deliberately tolerant about identifier shapes (integer or
/// string, under `id` or a `<entity>_id` key) and deliberately strict about
/// status strings: an unknown status is a decode error, never a blank row.
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Opaque identifier assigned by the service.
///
/// Current service builds send integers, older ones strings. Both decode to
/// the same textual form so identifiers compare equal across versions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Id(String);

impl Id {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Text(String),
}

impl From<RawId> for Id {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Int(n) => Self(n.to_string()),
            RawId::Text(s) => Self(s),
        }
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawId::deserialize(deserializer).map(Id::from)
    }
}

/// Nullable reference as emitted by the service's SQL layer.
///
/// Accepts `null`, a bare integer/string, or `{"Int32": n, "Valid": bool}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawNullableId {
    Sql {
        #[serde(rename = "Int32")]
        value: i64,
        #[serde(rename = "Valid")]
        valid: bool,
    },
    Plain(RawId),
}

fn nullable_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Id>, D::Error> {
    let raw = Option::<RawNullableId>::deserialize(deserializer)?;
    Ok(match raw {
        None => None,
        Some(RawNullableId::Sql { valid: false, .. }) => None,
        Some(RawNullableId::Sql { value, valid: true }) => Some(Id(value.to_string())),
        Some(RawNullableId::Plain(id)) => Some(id.into()),
    })
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

/// Lifecycle states of an expression as reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpressionStatus {
    ReadyForComputation,
    Computing,
    Result,
    /// Permanent parse or evaluation failure.
    Terminated,
}

impl ExpressionStatus {
    /// `result` and `terminated` never transition further.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Result | Self::Terminated)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReadyForComputation => "ready_for_computation",
            Self::Computing => "computing",
            Self::Result => "result",
            Self::Terminated => "terminated",
        }
    }
}

impl fmt::Display for ExpressionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A submitted arithmetic expression and its evaluation state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    #[serde(alias = "expression_id")]
    pub id: Id,
    /// Raw input text as submitted.
    pub data: String,
    pub status: ExpressionStatus,
    pub is_ready: bool,
    /// Only meaningful when [`Expression::has_result`] holds.
    #[serde(default)]
    pub result: f64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub parse_date: Option<DateTime<Utc>>,
    /// Postfix form produced by the service's parser.
    #[serde(default)]
    pub parse_data: Option<String>,
    #[serde(default)]
    pub user_id: Option<Id>,
    #[serde(default, deserialize_with = "nullable_id")]
    pub agent_id: Option<Id>,
}

impl Expression {
    /// `is_ready` must agree with `status == result`.
    pub fn is_consistent(&self) -> bool {
        self.is_ready == (self.status == ExpressionStatus::Result)
    }

    /// Whether `result` may be shown as authoritative.
    pub fn has_result(&self) -> bool {
        self.is_ready && self.status == ExpressionStatus::Result
    }

    /// The result, if it may be displayed.
    pub fn authoritative_result(&self) -> Option<f64> {
        self.has_result().then_some(self.result)
    }
}

/// Body of `POST /expressions`.
#[derive(Debug, Serialize)]
pub struct NewExpression<'a> {
    pub data: &'a str,
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// An arithmetic operator with its configurable execution cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(alias = "operation_id")]
    pub id: Id,
    /// Operator label, e.g. `"+"` or `"addition"`.
    pub operation_type: String,
    /// Execution cost in seconds.
    pub execution_time: u64,
    #[serde(default)]
    pub user_id: Option<Id>,
}

/// Body of `PATCH /operations`.
#[derive(Debug, Serialize)]
pub struct OperationUpdate<'a> {
    pub operation_type: &'a str,
    pub execution_time: u64,
}

// ---------------------------------------------------------------------------
// Agents
// ---------------------------------------------------------------------------

/// Health states of a worker agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Running,
    Waiting,
    Sleeping,
    /// No un-terminate transition exists.
    Terminated,
}

impl AgentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Waiting => "waiting",
            Self::Sleeping => "sleeping",
            Self::Terminated => "terminated",
        }
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A worker agent as seen through its heartbeat record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    #[serde(alias = "agent_id")]
    pub id: Id,
    pub status: AgentStatus,
    pub number_of_parallel_calculations: u32,
    #[serde(default)]
    pub number_of_active_calculations: u32,
    pub last_ping: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

/// Email/password pair for `/login` and `/register`.
#[derive(Clone, Default, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Both fields must be non-empty before submission.
    pub fn is_complete(&self) -> bool {
        !self.email.is_empty() && !self.password.is_empty()
    }
}

// Keep passwords out of debug logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Bearer credential returned by `/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token(String);

impl Token {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value of the `Authorization` header carrying this token.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RegisterResponse {
    pub user_id: Id,
}

/// Error body emitted by the service on non-2xx responses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
