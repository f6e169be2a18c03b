//! Node in the content tree.
//!
//! A parent owns its children and properties (`IndexMap`, insertion order
//! preserved). Parent and session links are `Weak` back-references and never
//! keep anything alive.
//!
//! Every structural mutation here (child creation, reparenting, removal,
//! identifier change, property replacement) keeps the owning session's
//! path/identifier index in step; nothing else touches those indexes.
//!
//! Same-name siblings are not supported: a child name is a key. A child
//! node and a property may share a name; the session indexes them apart.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use smallvec::SmallVec;
use tracing::{debug, warn};

use super::property::Values;
use super::{path, Item, ItemVisitor, Property, Value};
use crate::storage::{Session, WeakSession};
use crate::{Error, Result};

/// Base type stamped on nodes created without an explicit type.
pub const DEFAULT_NODE_TYPE: &str = "nt:base";
/// Property mirroring the primary type.
pub const PRIMARY_TYPE: &str = "jcr:primaryType";
/// Multi-valued property mirroring the mixin list.
pub const MIXIN_TYPES: &str = "jcr:mixinTypes";

pub(crate) struct NodeData {
    pub(crate) name: String,
    pub(crate) identifier: String,
    pub(crate) primary_type: String,
    pub(crate) mixins: SmallVec<[String; 2]>,
    pub(crate) parent: Option<Weak<RefCell<NodeData>>>,
    pub(crate) children: IndexMap<String, Node>,
    pub(crate) properties: IndexMap<String, Property>,
    pub(crate) session: Option<WeakSession>,
}

/// Shared handle to a node. Clones refer to the same node; equality is
/// identity, so a path looked up twice compares equal to itself.
#[derive(Clone)]
pub struct Node(pub(crate) Rc<RefCell<NodeData>>);

impl Node {
    /// A detached node with the default base type and a fresh identifier.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_type(name, DEFAULT_NODE_TYPE)
    }

    /// A detached node of the given primary type.
    pub fn with_type(name: impl Into<String>, primary_type: impl Into<String>) -> Self {
        let primary_type = primary_type.into();
        let node = Node(Rc::new(RefCell::new(NodeData {
            name: name.into(),
            identifier: uuid::Uuid::new_v4().to_string(),
            primary_type: primary_type.clone(),
            mixins: SmallVec::new(),
            parent: None,
            children: IndexMap::new(),
            properties: IndexMap::new(),
            session: None,
        })));
        let prop = Property::new(&node, PRIMARY_TYPE, smallvec::smallvec![Value::string(primary_type)]);
        node.0.borrow_mut().properties.insert(PRIMARY_TYPE.to_owned(), prop);
        node
    }

    // ========================================================================
    // Identity and position
    // ========================================================================

    pub fn name(&self) -> String {
        self.0.borrow().name.clone()
    }

    pub fn identifier(&self) -> String {
        self.0.borrow().identifier.clone()
    }

    pub fn session(&self) -> Option<Session> {
        self.0.borrow().session.as_ref().and_then(WeakSession::upgrade)
    }

    fn parent_node(&self) -> Option<Node> {
        self.0.borrow().parent.as_ref().and_then(Weak::upgrade).map(Node)
    }

    /// Parent node; the root has none.
    pub fn parent(&self) -> Result<Node> {
        self.parent_node()
            .ok_or_else(|| Error::NotFound(format!("{} has no parent", self.path())))
    }

    /// Absolute path, derived from the parent chain. A node without a parent
    /// sits at `/`.
    pub fn path(&self) -> String {
        let mut names = Vec::new();
        let mut current = self.clone();
        while let Some(parent) = current.parent_node() {
            names.push(current.name());
            current = parent;
        }
        names.reverse();
        let segs: Vec<&str> = names.iter().map(String::as_str).collect();
        path::from_segments(&segs)
    }

    /// Number of ancestors; the root has depth 0.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.clone();
        while let Some(parent) = current.parent_node() {
            depth += 1;
            current = parent;
        }
        depth
    }

    /// Ancestor at an absolute depth: 0 is the root, `self.depth()` is self.
    pub fn ancestor(&self, depth: i64) -> Result<Node> {
        let own = self.depth() as i64;
        if depth < 0 || depth > own {
            return Err(Error::NotFound(format!(
                "no ancestor at depth {depth} for {} (depth {own})",
                self.path()
            )));
        }
        let mut current = self.clone();
        for _ in depth..own {
            current = current.parent()?;
        }
        Ok(current)
    }

    /// True for a node that is the root of its session.
    pub fn is_root(&self) -> bool {
        self.session().is_some_and(|s| s.root_node() == *self)
    }

    // ========================================================================
    // Type metadata
    // ========================================================================

    pub fn primary_type(&self) -> String {
        self.0.borrow().primary_type.clone()
    }

    /// Change the primary type; the `jcr:primaryType` property follows.
    pub fn set_primary_type(&self, primary_type: &str) -> Result<()> {
        if path::is_blank(primary_type) {
            return Err(Error::InvalidArgument("primary type must not be blank".into()));
        }
        self.0.borrow_mut().primary_type = primary_type.to_owned();
        self.set_property(PRIMARY_TYPE, primary_type)?;
        Ok(())
    }

    pub fn mixin_types(&self) -> Vec<String> {
        self.0.borrow().mixins.to_vec()
    }

    /// Add a mixin (idempotent); the `jcr:mixinTypes` property follows.
    pub fn add_mixin(&self, mixin: &str) -> Result<()> {
        if path::is_blank(mixin) {
            return Err(Error::InvalidArgument("mixin name must not be blank".into()));
        }
        {
            let mut data = self.0.borrow_mut();
            if data.mixins.iter().any(|m| m == mixin) {
                return Ok(());
            }
            data.mixins.push(mixin.to_owned());
        }
        self.sync_mixin_property()
    }

    pub fn remove_mixin(&self, mixin: &str) -> Result<bool> {
        let removed = {
            let mut data = self.0.borrow_mut();
            let before = data.mixins.len();
            data.mixins.retain(|m| m.as_str() != mixin);
            data.mixins.len() != before
        };
        if removed {
            self.sync_mixin_property()?;
        }
        Ok(removed)
    }

    fn sync_mixin_property(&self) -> Result<()> {
        let mixins = self.mixin_types();
        if mixins.is_empty() {
            self.remove_property(MIXIN_TYPES);
        } else {
            self.set_property_values(MIXIN_TYPES, mixins)?;
        }
        Ok(())
    }

    /// Every node is an `nt:base`; otherwise the primary type or a mixin
    /// must match.
    pub fn is_node_type(&self, name: &str) -> bool {
        let data = self.0.borrow();
        name == DEFAULT_NODE_TYPE || data.primary_type == name || data.mixins.iter().any(|m| m == name)
    }

    // ========================================================================
    // Identifier
    // ========================================================================

    /// Assign a new identifier and re-index it. A previous claimant of the
    /// same identifier loses its index entry.
    pub fn set_identifier(&self, identifier: &str) -> Result<()> {
        if path::is_blank(identifier) {
            return Err(Error::InvalidArgument("identifier must not be blank".into()));
        }
        let old = std::mem::replace(&mut self.0.borrow_mut().identifier, identifier.to_owned());
        if let Some(session) = self.session() {
            session.reindex_identifier(self, &old);
        }
        Ok(())
    }

    // ========================================================================
    // Children
    // ========================================================================

    /// Direct child by name.
    pub(crate) fn child(&self, name: &str) -> Option<Node> {
        self.0.borrow().children.get(name).cloned()
    }

    /// Create a child named `name`, replacing any existing child of that
    /// name, and register it with this node's session.
    pub(crate) fn create_child(&self, name: &str, primary_type: Option<&str>) -> Node {
        if let Some(existing) = self.child(name) {
            if let Err(e) = existing.remove() {
                warn!(path = %existing.path(), error = %e, "could not replace child");
            }
        }
        let session = self.session();
        let primary_type = match primary_type {
            Some(t) => t.to_owned(),
            None => session
                .as_ref()
                .map(|s| s.config().default_node_type)
                .unwrap_or_else(|| DEFAULT_NODE_TYPE.to_owned()),
        };
        let child = Node::with_type(name, primary_type);
        self.attach(&child);
        if let Some(session) = session {
            session.register_subtree(&child);
        }
        debug!(path = %child.path(), primary_type = %child.primary_type(), "created node");
        child
    }

    fn attach(&self, child: &Node) {
        child.0.borrow_mut().parent = Some(Rc::downgrade(&self.0));
        let name = child.name();
        self.0.borrow_mut().children.insert(name, child.clone());
    }

    /// Add a node at `rel_path` below this one, creating missing
    /// intermediate segments with the default type. The terminal node is
    /// always new; a non-blank `primary_type` is stamped on it.
    ///
    /// Returns `None` (and changes nothing) for a blank path.
    pub fn add_node(&self, rel_path: &str, primary_type: Option<&str>) -> Option<Node> {
        if path::is_blank(rel_path) {
            return None;
        }
        let segs = path::segments(rel_path);
        let (last, intermediate) = segs.split_last()?;
        let mut current = self.clone();
        for seg in intermediate {
            current = match current.child(seg) {
                Some(c) => c,
                None => current.create_child(seg, None),
            };
        }
        let primary_type = primary_type.filter(|t| !path::is_blank(t));
        Some(current.create_child(last, primary_type))
    }

    /// Walk a relative path (`.` and `..` allowed). A leading `/` walks from
    /// the top of this node's tree.
    pub fn get_node(&self, rel_path: &str) -> Option<Node> {
        let trimmed = rel_path.trim();
        let mut current = if trimmed.starts_with(['/', '\\']) {
            self.ancestor(0).ok()?
        } else {
            self.clone()
        };
        for seg in trimmed.split(['/', '\\']).map(str::trim) {
            current = match seg {
                "" | "." => current,
                ".." => current.parent_node()?,
                name => current.child(name)?,
            };
        }
        Some(current)
    }

    pub fn has_node(&self, rel_path: &str) -> bool {
        self.get_node(rel_path).is_some()
    }

    /// Children in insertion order.
    pub fn nodes(&self) -> Vec<Node> {
        self.0.borrow().children.values().cloned().collect()
    }

    pub fn has_nodes(&self) -> bool {
        !self.0.borrow().children.is_empty()
    }

    // ========================================================================
    // Properties
    // ========================================================================

    pub(crate) fn get_own_property(&self, name: &str) -> Option<Property> {
        self.0.borrow().properties.get(name).cloned()
    }

    /// Property at a relative path; the last segment names the property.
    pub fn get_property(&self, rel_path: &str) -> Option<Property> {
        let trimmed = rel_path.trim().trim_end_matches(['/', '\\']);
        match trimmed.rfind(['/', '\\']) {
            Some(idx) => {
                let owner = if idx == 0 { self.ancestor(0).ok()? } else { self.get_node(&trimmed[..idx])? };
                owner.get_own_property(trimmed[idx + 1..].trim())
            }
            None => self.get_own_property(trimmed),
        }
    }

    pub fn has_property(&self, rel_path: &str) -> bool {
        self.get_property(rel_path).is_some()
    }

    /// Properties in insertion order.
    pub fn properties(&self) -> Vec<Property> {
        self.0.borrow().properties.values().cloned().collect()
    }

    pub fn has_properties(&self) -> bool {
        !self.0.borrow().properties.is_empty()
    }

    /// Set a single-valued property, replacing any property of that name.
    pub fn set_property(&self, name: &str, value: impl Into<Value>) -> Result<Property> {
        self.put_property(name, smallvec::smallvec![value.into()])
    }

    /// Set a property from an ordered list of values, replacing any
    /// property of that name.
    pub fn set_property_values<I, V>(&self, name: &str, values: I) -> Result<Property>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.put_property(name, values.into_iter().map(Into::into).collect())
    }

    fn put_property(&self, name: &str, values: Values) -> Result<Property> {
        if path::is_blank(name) {
            return Err(Error::InvalidArgument("property name must not be blank".into()));
        }
        let name = name.trim();
        self.remove_property(name);
        let prop = Property::new(self, name, values);
        self.0.borrow_mut().properties.insert(name.to_owned(), prop.clone());
        if let Some(session) = self.session() {
            session.register_item(&Item::Property(prop.clone()));
        }
        Ok(prop)
    }

    /// Remove a property by name. Returns whether one was removed; a missing
    /// property is not an error.
    pub fn remove_property(&self, name: &str) -> bool {
        let Some(prop) = self.get_own_property(name) else {
            return false;
        };
        if let Some(session) = self.session() {
            session.unregister_item(&Item::Property(prop.clone()));
        }
        self.0.borrow_mut().properties.shift_remove(name);
        prop.0.borrow_mut().parent = Weak::<RefCell<NodeData>>::new();
        true
    }

    // ========================================================================
    // Structural mutation
    // ========================================================================

    /// Move this node (with its subtree) under `new_parent`.
    ///
    /// The old paths are dropped from the old session's index before the
    /// move; the subtree is re-registered under its new paths in the
    /// session reachable from `new_parent` afterwards.
    pub fn set_parent(&self, new_parent: &Node) -> Result<()> {
        self.move_to(new_parent, &self.name())
    }

    /// Move under `new_parent` as `new_name`. An existing child of that name
    /// in `new_parent` is removed; siblings in the old parent are untouched.
    pub(crate) fn move_to(&self, new_parent: &Node, new_name: &str) -> Result<()> {
        if path::is_blank(new_name) {
            return Err(Error::InvalidArgument("node name must not be blank".into()));
        }
        if new_parent == self {
            return Err(Error::IllegalStructure(format!("{} cannot be its own parent", self.path())));
        }
        let mut cursor = new_parent.parent_node();
        while let Some(n) = cursor {
            if n == *self {
                return Err(Error::IllegalStructure(format!(
                    "{} cannot be moved below its descendant {}",
                    self.path(),
                    new_parent.path()
                )));
            }
            cursor = n.parent_node();
        }
        if self.is_root() {
            return Err(Error::IllegalStructure("the root node cannot be moved".into()));
        }

        let old_path = self.path();
        if let Some(session) = self.session() {
            session.unregister_subtree(self);
        }
        self.detach();
        self.0.borrow_mut().name = new_name.to_owned();

        if let Some(existing) = new_parent.child(new_name) {
            existing.remove()?;
        }
        new_parent.attach(self);
        match new_parent.session() {
            Some(session) => session.register_subtree(self),
            None => self.clear_session(),
        }
        debug!(from = %old_path, to = %self.path(), "moved node");
        Ok(())
    }

    /// Remove this node and everything below it. Path and identifier lookups
    /// for the subtree report "not found" afterwards.
    pub fn remove(&self) -> Result<()> {
        if self.is_root() {
            return Err(Error::IllegalStructure("the root node cannot be removed".into()));
        }
        let path = self.path();
        match self.session() {
            Some(session) => session.unregister_subtree(self),
            None => self.clear_session(),
        }
        self.detach();
        debug!(%path, "removed node");
        Ok(())
    }

    fn detach(&self) {
        if let Some(parent) = self.parent_node() {
            let name = self.name();
            let mut data = parent.0.borrow_mut();
            if data.children.get(&name).is_some_and(|c| c == self) {
                data.children.shift_remove(&name);
            }
        }
        self.0.borrow_mut().parent = None;
    }

    pub(crate) fn set_session(&self, session: Option<WeakSession>) {
        self.0.borrow_mut().session = session;
    }

    fn clear_session(&self) {
        self.set_session(None);
        for child in self.nodes() {
            child.clear_session();
        }
    }

    // ========================================================================
    // Visiting
    // ========================================================================

    pub fn accept(&self, visitor: &mut dyn ItemVisitor) -> Result<()> {
        visitor.visit_node(self)
    }

    /// Depth-first walk: the node, then its properties, then each child.
    pub fn traverse(&self, visitor: &mut dyn ItemVisitor) -> Result<()> {
        self.accept(visitor)?;
        for prop in self.properties() {
            prop.accept(visitor)?;
        }
        for child in self.nodes() {
            child.traverse(visitor)?;
        }
        Ok(())
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("path", &self.path())
            .field("identifier", &self.0.borrow().identifier)
            .field("primary_type", &self.0.borrow().primary_type)
            .finish()
    }
}
