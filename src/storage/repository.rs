//! Repository: maps workspace names to sessions.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::debug;

use super::{RepositoryConfig, Session};

struct RepositoryData {
    config: RepositoryConfig,
    sessions: IndexMap<String, Session>,
}

/// Login facade: one session per workspace, created on first use and reused
/// until `reset`.
#[derive(Clone)]
pub struct Repository(Rc<RefCell<RepositoryData>>);

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository {
    pub fn new() -> Self {
        Self::with_config(RepositoryConfig::default())
    }

    pub fn with_config(config: RepositoryConfig) -> Self {
        Repository(Rc::new(RefCell::new(RepositoryData {
            config,
            sessions: IndexMap::new(),
        })))
    }

    pub fn config(&self) -> RepositoryConfig {
        self.0.borrow().config.clone()
    }

    /// Session previously registered for `workspace`, if any.
    pub fn login(&self, workspace: &str) -> Option<Session> {
        self.0.borrow().sessions.get(workspace).cloned()
    }

    /// Associate `session` with `workspace`, replacing any previous login.
    pub fn register_login(&self, workspace: &str, session: Session) {
        self.0.borrow_mut().sessions.insert(workspace.to_owned(), session);
    }

    /// Existing session for `workspace`, or a new one with a fresh root.
    pub fn session(&self, workspace: &str) -> Session {
        if let Some(session) = self.login(workspace) {
            return session;
        }
        let session = Session::new(workspace, self.config());
        self.register_login(workspace, session.clone());
        session
    }

    /// Session of the configured default workspace.
    pub fn default_session(&self) -> Session {
        let workspace = self.0.borrow().config.default_workspace.clone();
        self.session(&workspace)
    }

    /// Workspaces logged into so far, in login order.
    pub fn workspace_names(&self) -> Vec<String> {
        self.0.borrow().sessions.keys().cloned().collect()
    }

    /// Forget every session; the next access builds everything anew.
    pub fn reset(&self) {
        let mut data = self.0.borrow_mut();
        debug!(workspaces = data.sessions.len(), "resetting repository");
        data.sessions.clear();
    }
}

impl PartialEq for Repository {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("workspaces", &self.workspace_names())
            .finish()
    }
}
