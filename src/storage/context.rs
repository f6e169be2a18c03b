//! Thread-scoped current repository.
//!
//! Call sites that expect ambient "current repository" access go through
//! here. Each thread sees its own repository; nothing is shared, so no
//! locking is involved. State persists on a thread until `reset`, so test
//! harnesses reset between independent scenarios.
//!
//! ```rust
//! use jcr_mock::context;
//!
//! let a = context::session("website");
//! assert_eq!(a, context::session("website"));
//! context::reset();
//! assert_ne!(a, context::session("website"));
//! # context::reset();
//! ```

use std::cell::RefCell;

use tracing::debug;

use super::{Repository, Session};

thread_local! {
    static CURRENT: RefCell<Option<Repository>> = const { RefCell::new(None) };
}

/// The thread's repository, created on first use.
pub fn repository() -> Repository {
    CURRENT.with(|c| c.borrow_mut().get_or_insert_with(Repository::new).clone())
}

/// The thread's repository if one exists, without creating it.
pub fn try_repository() -> Option<Repository> {
    CURRENT.with(|c| c.borrow().clone())
}

/// Install a harness-managed repository, returning the previous one.
pub fn install(repository: Repository) -> Option<Repository> {
    CURRENT.with(|c| c.borrow_mut().replace(repository))
}

/// Session for `workspace` in the thread's repository, created on first use.
pub fn session(workspace: &str) -> Session {
    repository().session(workspace)
}

/// Drop every session and the thread's repository handle.
pub fn reset() {
    if let Some(repo) = CURRENT.with(|c| c.borrow_mut().take()) {
        repo.reset();
        debug!("reset thread repository");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RepositoryConfig;

    #[test]
    fn test_repository_is_lazy_and_reused() {
        reset();
        assert!(try_repository().is_none());
        let a = repository();
        assert_eq!(a, repository());
        reset();
        assert!(try_repository().is_none());
    }

    #[test]
    fn test_threads_are_isolated() {
        reset();
        session("website").get_or_create_node("only/here");
        let seen = std::thread::spawn(|| session("website").item_exists("/only/here"))
            .join()
            .unwrap();
        assert!(!seen);
        assert!(session("website").item_exists("/only/here"));
        reset();
    }

    #[test]
    fn test_install() {
        reset();
        let repo = Repository::with_config(RepositoryConfig {
            untitled_name: "blank".into(),
            ..RepositoryConfig::default()
        });
        assert!(install(repo.clone()).is_none());
        assert_eq!(session("website").get_or_create_node(" ").path(), "/blank");
        assert_eq!(repository(), repo);
        reset();
    }
}
