//! End-to-end tests for workspaces, the login facade and reset.

use jcr_mock::mock::{mock_node, mock_node_in};
use jcr_mock::{context, export, Repository, RepositoryConfig};
use pretty_assertions::assert_eq;

#[test]
fn test_same_workspace_same_session() {
    context::reset();
    let a = context::session("website");
    let b = context::session("website");
    assert_eq!(a, b);
    context::reset();
}

#[test]
fn test_reset_gives_fresh_root() {
    context::reset();
    let before = context::session("website");
    mock_node("content", &[]).unwrap();
    let old_root = before.root_node();

    context::reset();

    let after = context::session("website");
    assert_ne!(before, after);
    assert_ne!(after.root_node(), old_root);
    assert!(!after.root_node().has_nodes());
    assert!(!after.item_exists("/content"));
    context::reset();
}

#[test]
fn test_workspaces_are_isolated() {
    context::reset();
    mock_node_in("website", "shared/path", &[]).unwrap();
    mock_node_in("dam", "other", &[]).unwrap();

    assert!(context::session("website").node_exists("/shared/path"));
    assert!(!context::session("dam").node_exists("/shared/path"));
    assert_eq!(context::repository().workspace_names(), vec!["website", "dam"]);
    context::reset();
}

#[test]
fn test_explicit_repository_context() {
    context::reset();
    let repo = Repository::with_config(RepositoryConfig {
        default_workspace: "config".into(),
        ..RepositoryConfig::default()
    });
    context::install(repo.clone());

    let n = mock_node("modules/core", &[]).unwrap();
    assert_eq!(n.session().unwrap().workspace_name(), "config");
    assert!(repo.login("config").unwrap().node_exists("/modules/core"));
    context::reset();
    assert!(repo.workspace_names().is_empty());
}

#[test]
fn test_fixture_import_into_workspace() {
    context::reset();
    let session = context::session("website");
    export::import_json(
        &session.root_node(),
        r#"{"name": "home", "properties": {"title": {"type": "String", "values": ["Home"]}},
            "children": [{"name": "about"}]}"#,
    )
    .unwrap();

    assert!(session.node_exists("/home/about"));
    assert_eq!(
        session.get_property("/home/title").unwrap().get_string().as_deref(),
        Some("Home")
    );

    // Resolve-or-create picks up imported nodes instead of shadowing them.
    let about = mock_node("home/about", &[]).unwrap();
    assert_eq!(session.get_node("/home/about").unwrap(), about);
    context::reset();
}
