//! Session: the per-workspace index authority.
//!
//! Holds the workspace root plus three indexes:
//! - path → node and path → property (every item reachable from the root)
//! - identifier → node
//!
//! Nodes and properties are keyed separately, so a child node and a
//! property of the same name under one parent both stay resolvable;
//! `get_item` prefers the node.
//!
//! Structural mutations on `Node` call back into `register_*` /
//! `unregister_*` here; nothing else writes the indexes.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use hashbrown::HashMap;
use tracing::{debug, warn};

use super::RepositoryConfig;
use crate::model::{path, Item, Node, Property};
use crate::{Error, Result};

pub(crate) struct SessionData {
    workspace: String,
    config: RepositoryConfig,
    root: Node,
    nodes: HashMap<String, Node>,
    properties: HashMap<String, Property>,
    identifiers: HashMap<String, Node>,
}

/// Shared handle to a workspace session. Equality is identity.
#[derive(Clone)]
pub struct Session(Rc<RefCell<SessionData>>);

/// Non-owning session link held by nodes.
#[derive(Clone)]
pub(crate) struct WeakSession(Weak<RefCell<SessionData>>);

impl WeakSession {
    pub(crate) fn upgrade(&self) -> Option<Session> {
        self.0.upgrade().map(Session)
    }
}

/// Canonical index key for any user-supplied absolute path.
fn key(p: &str) -> String {
    path::from_segments(&path::segments(p))
}

impl Session {
    /// Fresh session with a new root (`""` at `/`) and empty indexes.
    pub fn new(workspace: &str, config: RepositoryConfig) -> Self {
        let root = Node::with_type("", config.root_node_type.clone());
        let session = Session(Rc::new(RefCell::new(SessionData {
            workspace: workspace.to_owned(),
            config,
            root: root.clone(),
            nodes: HashMap::new(),
            properties: HashMap::new(),
            identifiers: HashMap::new(),
        })));
        session.register_subtree(&root);
        debug!(workspace, root = %root.identifier(), "created session");
        session
    }

    pub(crate) fn downgrade(&self) -> WeakSession {
        WeakSession(Rc::downgrade(&self.0))
    }

    pub fn workspace_name(&self) -> String {
        self.0.borrow().workspace.clone()
    }

    pub fn config(&self) -> RepositoryConfig {
        self.0.borrow().config.clone()
    }

    pub fn root_node(&self) -> Node {
        self.0.borrow().root.clone()
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    pub fn get_item(&self, path: &str) -> Option<Item> {
        let key = key(path);
        let data = self.0.borrow();
        data.nodes
            .get(&key)
            .cloned()
            .map(Item::Node)
            .or_else(|| data.properties.get(&key).cloned().map(Item::Property))
    }

    pub fn get_node(&self, path: &str) -> Option<Node> {
        self.0.borrow().nodes.get(&key(path)).cloned()
    }

    pub fn get_property(&self, path: &str) -> Option<Property> {
        self.0.borrow().properties.get(&key(path)).cloned()
    }

    pub fn get_node_by_identifier(&self, identifier: &str) -> Option<Node> {
        self.0.borrow().identifiers.get(identifier).cloned()
    }

    pub fn item_exists(&self, path: &str) -> bool {
        self.node_exists(path) || self.property_exists(path)
    }

    pub fn node_exists(&self, path: &str) -> bool {
        self.0.borrow().nodes.contains_key(&key(path))
    }

    pub fn property_exists(&self, path: &str) -> bool {
        self.0.borrow().properties.contains_key(&key(path))
    }

    /// Number of indexed items (nodes and properties).
    pub fn item_count(&self) -> usize {
        let data = self.0.borrow();
        data.nodes.len() + data.properties.len()
    }

    // ========================================================================
    // Resolve-or-create
    // ========================================================================

    /// Node at `path`, creating every missing segment with the default type.
    /// Blank paths resolve to `/<untitled>`. Calling again with the same
    /// normalized path returns the same node.
    pub fn get_or_create_node(&self, path: &str) -> Node {
        let untitled = self.0.borrow().config.untitled_name.clone();
        let normalized = path::normalize(Some(path), &untitled);
        if let Some(node) = self.get_node(&normalized) {
            return node;
        }
        let mut current = self.root_node();
        for seg in path::segments(&normalized) {
            current = match current.child(seg) {
                Some(c) => c,
                None => current.create_child(seg, None),
            };
        }
        current
    }

    // ========================================================================
    // Mutation by path
    // ========================================================================

    /// Remove the node or property at `path`.
    pub fn remove_item(&self, path: &str) -> Result<()> {
        match self.get_item(path) {
            Some(Item::Node(n)) => n.remove(),
            Some(Item::Property(p)) => {
                p.remove();
                Ok(())
            }
            None => Err(Error::NotFound(format!("{path} in workspace {}", self.workspace_name()))),
        }
    }

    /// Move (and possibly rename) the node at `src` to `dest`. The parent of
    /// `dest` must exist and no node may already sit at `dest`.
    pub fn move_item(&self, src: &str, dest: &str) -> Result<()> {
        if path::is_blank(src) || path::is_blank(dest) {
            return Err(Error::InvalidArgument("move paths must not be blank".into()));
        }
        let node = self
            .get_node(src)
            .ok_or_else(|| Error::NotFound(format!("{src} in workspace {}", self.workspace_name())))?;
        let src = node.path();
        let dest = key(dest);
        if node.is_root() {
            return Err(Error::IllegalStructure("the root node cannot be moved".into()));
        }
        if dest == src || dest.starts_with(&format!("{src}/")) {
            return Err(Error::IllegalStructure(format!("cannot move {src} to {dest}")));
        }
        if self.node_exists(&dest) {
            return Err(Error::IllegalStructure(format!("{dest} already exists")));
        }
        let (parent_path, name) = path::split_last(&dest)
            .ok_or_else(|| Error::IllegalStructure("cannot move onto the root".into()))?;
        let parent = self
            .get_node(parent_path)
            .ok_or_else(|| Error::NotFound(format!("destination parent {parent_path}")))?;

        node.move_to(&parent, name)
    }

    // ========================================================================
    // Registry
    // ========================================================================

    /// Index `item` under its current path; nodes are also indexed by
    /// identifier and bound to this session. A new identifier claim wins
    /// over an existing one.
    pub fn register_item(&self, item: &Item) {
        let path = item.path();
        match item {
            Item::Node(node) => {
                node.set_session(Some(self.downgrade()));
                let id = node.identifier();
                let mut data = self.0.borrow_mut();
                if data.identifiers.get(&id).is_some_and(|prev| prev != node) {
                    warn!(workspace = %data.workspace, identifier = %id, %path, "identifier already indexed, overwriting");
                }
                data.identifiers.insert(id, node.clone());
                data.nodes.insert(path, node.clone());
            }
            Item::Property(prop) => {
                self.0.borrow_mut().properties.insert(path, prop.clone());
            }
        }
    }

    /// Drop `item` from the indexes. For a node this covers the whole
    /// subtree: descendants first, then properties, then the node.
    pub fn unregister_item(&self, item: &Item) {
        match item {
            Item::Node(node) => self.unregister_subtree(node),
            Item::Property(_) => self.remove_entry(item),
        }
    }

    pub(crate) fn register_subtree(&self, node: &Node) {
        self.register_item(&Item::Node(node.clone()));
        for prop in node.properties() {
            self.register_item(&Item::Property(prop));
        }
        for child in node.nodes() {
            self.register_subtree(&child);
        }
    }

    pub(crate) fn unregister_subtree(&self, node: &Node) {
        for child in node.nodes() {
            self.unregister_subtree(&child);
        }
        for prop in node.properties() {
            self.remove_entry(&Item::Property(prop));
        }
        self.remove_entry(&Item::Node(node.clone()));
    }

    fn remove_entry(&self, item: &Item) {
        let path = item.path();
        match item {
            Item::Node(node) => {
                let id = node.identifier();
                {
                    let mut data = self.0.borrow_mut();
                    if data.nodes.get(&path).is_some_and(|n| n == node) {
                        data.nodes.remove(&path);
                    }
                    if data.identifiers.get(&id).is_some_and(|n| n == node) {
                        data.identifiers.remove(&id);
                    }
                }
                node.set_session(None);
            }
            Item::Property(prop) => {
                let mut data = self.0.borrow_mut();
                if data.properties.get(&path).is_some_and(|p| p == prop) {
                    data.properties.remove(&path);
                }
            }
        }
    }

    /// Move `node`'s identifier entry from `old` to its current identifier.
    pub(crate) fn reindex_identifier(&self, node: &Node, old: &str) {
        let new = node.identifier();
        let mut data = self.0.borrow_mut();
        if data.identifiers.get(old).is_some_and(|n| n == node) {
            data.identifiers.remove(old);
        }
        if data.identifiers.get(&new).is_some_and(|prev| prev != node) {
            warn!(workspace = %data.workspace, identifier = %new, "identifier already indexed, overwriting");
        }
        debug!(workspace = %data.workspace, from = old, to = %new, "changed identifier");
        data.identifiers.insert(new, node.clone());
    }
}

impl PartialEq for Session {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0.borrow();
        f.debug_struct("Session")
            .field("workspace", &data.workspace)
            .field("nodes", &data.nodes.len())
            .field("properties", &data.properties.len())
            .field("identifiers", &data.identifiers.len())
            .finish()
    }
}
