//! # Workspace Storage
//!
//! Sessions (one per named workspace) hold the path and identifier indexes;
//! a `Repository` maps workspace names to sessions; `context` keeps one
//! repository per thread for call sites that expect ambient access.
//!
//! | Type | Module | Role |
//! |------|--------|------|
//! | `Session` | `session` | Root node + path/identifier index for one workspace |
//! | `Repository` | `repository` | Workspace name → session, lazily created |
//! | `context` | `context` | Thread-scoped current repository with reset |

pub mod session;
pub mod repository;
pub mod context;

use serde::{Deserialize, Serialize};

use crate::model::DEFAULT_NODE_TYPE;
use crate::Result;

pub use session::Session;
pub(crate) use session::WeakSession;
pub use repository::Repository;

// ============================================================================
// Repository Configuration
// ============================================================================

/// Defaults applied by a repository and every session it creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RepositoryConfig {
    /// Workspace used by `mock::mock_node` and friends.
    pub default_workspace: String,
    /// Primary type of nodes created without an explicit type.
    pub default_node_type: String,
    /// Primary type of each workspace root.
    pub root_node_type: String,
    /// Name used when a blank path is requested.
    pub untitled_name: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            default_workspace: "website".into(),
            default_node_type: DEFAULT_NODE_TYPE.into(),
            root_node_type: "rep:root".into(),
            untitled_name: "untitled".into(),
        }
    }
}

impl RepositoryConfig {
    /// Parse from JSON; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
