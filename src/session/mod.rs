/// Session store: the bearer credential and the last active view.
///
/// A session is the client-side analogue of a browser tab's
/// `sessionStorage`: it survives process restarts ("reloads") but is scoped
/// to one named session. Starting a new session means picking a new name
/// (`DAEC_SESSION`) or clearing the current one.
///
/// State is written through on every mutation. The storage backend is a
/// trait so tests can inject an in-memory store and simulate a reload by
/// reopening a context over the same backend.
///
/// File layout: `~/.daec/sessions/<name>.json`
///
/// ```json
/// { "page": "Operations", "token": "eyJhbGciOi..." }
/// ```
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::api::Token;
use crate::config::schema::SessionConfig;
use crate::router::ViewName;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("failed to access session file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode session state: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("could not determine session directory")]
    NoSessionDir,
}

// ---------------------------------------------------------------------------
// Persisted state
// ---------------------------------------------------------------------------

/// The two persisted keys: `page` and `token`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// An unrecognised view reads as unset rather than failing the file.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_page"
    )]
    pub page: Option<ViewName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<Token>,
}

fn lenient_page<'de, D>(deserializer: D) -> Result<Option<ViewName>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(None);
    };
    let page = raw.as_str().and_then(|s| s.parse::<ViewName>().ok());
    if page.is_none() {
        tracing::warn!(page = %raw, "ignoring unknown view in session");
    }
    Ok(page)
}

/// Backend that persists [`SessionState`] between reloads.
pub trait SessionStorage {
    /// Load persisted state. A missing store reads as the default state.
    fn load(&self) -> Result<SessionState, SessionError>;

    /// Replace persisted state.
    fn save(&self, state: &SessionState) -> Result<(), SessionError>;

    /// Human-readable location for diagnostics.
    fn describe(&self) -> String;
}

/// JSON file backend.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Resolve `<dir>/<name>.json` from the session config.
    pub fn from_config(config: &SessionConfig) -> Result<Self, SessionError> {
        let dir = match &config.dir {
            Some(dir) => dir.clone(),
            None => default_session_dir().ok_or(SessionError::NoSessionDir)?,
        };
        Ok(Self::new(dir.join(format!("{}.json", sanitize_name(&config.name)))))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStorage for FileStorage {
    fn load(&self) -> Result<SessionState, SessionError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(SessionState::default());
            }
            Err(source) => {
                return Err(SessionError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        // A corrupt file reads as an empty session.
        match serde_json::from_str(&content) {
            Ok(state) => Ok(state),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring corrupt session file");
                Ok(SessionState::default())
            }
        }
    }

    fn save(&self, state: &SessionState) -> Result<(), SessionError> {
        let io_err = |source| SessionError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(state)?;
        write_private(&self.path, json.as_bytes()).map_err(io_err)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-process backend. Clones share the same underlying slot, so dropping
/// a [`SessionContext`] and reopening one over a clone simulates a reload.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slot: Rc<RefCell<Option<SessionState>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of what has been persisted so far.
    pub fn snapshot(&self) -> Option<SessionState> {
        self.slot.borrow().clone()
    }
}

impl SessionStorage for MemoryStorage {
    fn load(&self) -> Result<SessionState, SessionError> {
        Ok(self.slot.borrow().clone().unwrap_or_default())
    }

    fn save(&self, state: &SessionState) -> Result<(), SessionError> {
        *self.slot.borrow_mut() = Some(state.clone());
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory".to_string()
    }
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Session handle passed explicitly to the router, the views and every
/// gateway call.
pub struct SessionContext {
    state: SessionState,
    storage: Box<dyn SessionStorage>,
}

impl SessionContext {
    /// Open a context over the given storage, restoring persisted state.
    pub fn new(storage: Box<dyn SessionStorage>) -> Self {
        let state = storage.load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "starting with an empty session");
            SessionState::default()
        });
        Self { state, storage }
    }

    /// Open the file-backed session named in the config.
    pub fn open(config: &SessionConfig) -> Result<Self, SessionError> {
        let storage = FileStorage::from_config(config)?;
        tracing::debug!(path = %storage.path().display(), "opening session");
        Ok(Self::new(Box::new(storage)))
    }

    /// A fresh, unpersisted session.
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStorage::new()))
    }

    /// Last active view, defaulting to Expressions.
    pub fn get_view(&self) -> ViewName {
        self.state.page.unwrap_or_default()
    }

    pub fn set_view(&mut self, view: ViewName) -> Result<(), SessionError> {
        self.state.page = Some(view);
        self.persist()
    }

    pub fn get_token(&self) -> Option<&Token> {
        self.state.token.as_ref()
    }

    pub fn set_token(&mut self, token: Token) -> Result<(), SessionError> {
        self.state.token = Some(token);
        self.persist()
    }

    /// Drop the credential, keeping the view.
    pub fn clear_token(&mut self) -> Result<(), SessionError> {
        self.state.token = None;
        self.persist()
    }

    /// Wipe both keys.
    pub fn clear(&mut self) -> Result<(), SessionError> {
        self.state = SessionState::default();
        self.persist()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.token.is_some()
    }

    pub fn location(&self) -> String {
        self.storage.describe()
    }

    fn persist(&self) -> Result<(), SessionError> {
        self.storage.save(&self.state)
    }
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// Default session directory: `~/.daec/sessions`.
pub fn default_session_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".daec").join("sessions"))
}

/// Write a file readable only by its owner; it holds the bearer token.
#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // `mode` only applies when the file is created.
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    file.write_all(contents)
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    fs::write(path, contents)
}

/// Keep session names usable as file names.
fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "default".to_string()
    } else {
        cleaned
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
