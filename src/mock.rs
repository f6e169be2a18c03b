//! Behavior-configuration operations and `mock_*` entry points.
//!
//! An `Operation<T>` configures one target (node, property or session).
//! Creation calls take an ordered slice of operations and apply them after
//! the item's default state exists. Closures work directly:
//!
//! ```rust
//! use jcr_mock::{mock, Node};
//!
//! # fn example() -> jcr_mock::Result<()> {
//! let page = mock::mock_node("site/page", &[
//!     &mock::stub_property("title", "Home"),
//!     &|n: &Node| n.add_mixin("mix:referenceable"),
//! ])?;
//! assert!(page.is_node_type("mix:referenceable"));
//! # Ok(())
//! # }
//! # example().unwrap();
//! # jcr_mock::context::reset();
//! ```

use crate::model::{Node, Property, Value};
use crate::query::QueryResult;
use crate::storage::{context, Session};
use crate::{Error, Result};

/// A single configuration step applied to a target.
pub trait Operation<T: ?Sized> {
    fn apply(&self, target: &T) -> Result<()>;
}

impl<T: ?Sized, F> Operation<T> for F
where
    F: Fn(&T) -> Result<()>,
{
    fn apply(&self, target: &T) -> Result<()> {
        self(target)
    }
}

fn apply_all<T: ?Sized>(target: &T, ops: &[&dyn Operation<T>]) -> Result<()> {
    for op in ops {
        op.apply(target)?;
    }
    Ok(())
}

// ============================================================================
// Entry points
// ============================================================================

/// Resolve or create `path` in the thread's default workspace, then apply
/// `ops` in order. Repeated calls return the same node and add to it.
pub fn mock_node(path: &str, ops: &[&dyn Operation<Node>]) -> Result<Node> {
    let workspace = context::repository().config().default_workspace;
    mock_node_in(&workspace, path, ops)
}

pub fn mock_node_in(workspace: &str, path: &str, ops: &[&dyn Operation<Node>]) -> Result<Node> {
    let node = context::session(workspace).get_or_create_node(path);
    apply_all(&node, ops)?;
    Ok(node)
}

/// Set property `name` on the node at `node_path` (created if missing), then
/// apply `ops` to the property.
pub fn mock_property(
    node_path: &str,
    name: &str,
    value: impl Into<Value>,
    ops: &[&dyn Operation<Property>],
) -> Result<Property> {
    let node = mock_node(node_path, &[])?;
    let prop = node.set_property(name, value)?;
    apply_all(&prop, ops)?;
    Ok(prop)
}

pub fn mock_session(workspace: &str, ops: &[&dyn Operation<Session>]) -> Result<Session> {
    let session = context::session(workspace);
    apply_all(&session, ops)?;
    Ok(session)
}

pub fn mock_value(value: impl Into<Value>) -> Value {
    value.into()
}

pub fn mock_query_result(nodes: impl IntoIterator<Item = Node>) -> QueryResult {
    QueryResult::from_nodes(nodes)
}

// ============================================================================
// Built-in node operations
// ============================================================================

pub fn stub_property(name: impl Into<String>, value: impl Into<Value>) -> impl Operation<Node> {
    let name = name.into();
    let value = value.into();
    move |node: &Node| node.set_property(&name, value.clone()).map(|_| ())
}

pub fn stub_property_values<I, V>(name: impl Into<String>, values: I) -> impl Operation<Node>
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    let name = name.into();
    let values: Vec<Value> = values.into_iter().map(Into::into).collect();
    move |node: &Node| node.set_property_values(&name, values.clone()).map(|_| ())
}

pub fn stub_type(primary_type: impl Into<String>) -> impl Operation<Node> {
    let primary_type = primary_type.into();
    move |node: &Node| node.set_primary_type(&primary_type)
}

pub fn stub_mixin(mixin: impl Into<String>) -> impl Operation<Node> {
    let mixin = mixin.into();
    move |node: &Node| node.add_mixin(&mixin)
}

pub fn stub_identifier(identifier: impl Into<String>) -> impl Operation<Node> {
    let identifier = identifier.into();
    move |node: &Node| node.set_identifier(&identifier)
}

/// Resolve or create the child at `rel_path` and configure it with `ops`.
pub fn stub_node(rel_path: impl Into<String>, ops: Vec<Box<dyn Operation<Node>>>) -> impl Operation<Node> {
    let rel_path = rel_path.into();
    move |node: &Node| -> Result<()> {
        let child = match node.get_node(&rel_path) {
            Some(c) => c,
            None => node
                .add_node(&rel_path, None)
                .ok_or_else(|| Error::InvalidArgument("child path must not be blank".into()))?,
        };
        for op in &ops {
            op.apply(&child)?;
        }
        Ok(())
    }
}
