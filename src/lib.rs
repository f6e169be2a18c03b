//! # jcr-mock: In-Memory Content Repository for Tests
//!
//! A behaviorally faithful simulation of a hierarchical content repository:
//! named workspaces, each holding a tree of typed nodes with typed properties
//! and identifiers. Application code written against a JCR-style API can be
//! exercised in tests without a real backing store.
//!
//! ## Design Principles
//!
//! 1. **Session is the index authority**: every structural mutation (create,
//!    reparent, remove, identifier change) goes through the session registry
//! 2. **Owned children, weak parents**: parents own their children; parent and
//!    session links are non-owning back-references
//! 3. **Lazy coercion errors**: a `Value` never fails on construction, only
//!    when an incompatible accessor is called
//! 4. **Thread-scoped context**: two threads never observe each other's
//!    repositories
//!
//! ## Quick Start
//!
//! ```rust
//! use jcr_mock::{context, mock::{self, stub_property}};
//!
//! # fn example() -> jcr_mock::Result<()> {
//! let page = mock::mock_node("root/section/page", &[&stub_property("title", "Hello")])?;
//! assert_eq!(page.path(), "/root/section/page");
//!
//! let session = context::session("website");
//! assert!(session.item_exists("/root/section/page/title"));
//!
//! // Between independent scenarios:
//! context::reset();
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod storage;
pub mod query;
pub mod export;
pub mod mock;

// ============================================================================
// Re-exports: Model (the tree)
// ============================================================================

pub use model::{
    Node, Property, Item, ItemVisitor, Value, PropertyType, Binary, Decimal,
};

// ============================================================================
// Re-exports: Storage
// ============================================================================

pub use storage::{Session, Repository, RepositoryConfig, context};

// ============================================================================
// Re-exports: Query results
// ============================================================================

pub use query::{QueryResult, ResultRow};

// ============================================================================
// Re-exports: Behavior configuration
// ============================================================================

pub use mock::Operation;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Value format error: cannot convert {got} to {expected}")]
    ValueFormat { expected: String, got: String },

    #[error("Illegal structure: {0}")]
    IllegalStructure(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
