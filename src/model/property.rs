//! Property: a named, typed, possibly multi-valued attribute of one node.

use std::cell::RefCell;
use std::fmt;
use std::io::Cursor;
use std::rc::{Rc, Weak};

use chrono::{DateTime, FixedOffset};
use smallvec::SmallVec;

use super::node::NodeData;
use super::{path, Binary, Decimal, ItemVisitor, Node, PropertyType, Value};
use crate::storage::Session;
use crate::{Error, Result};

pub(crate) type Values = SmallVec<[Value; 1]>;

pub(crate) struct PropertyData {
    pub(crate) name: String,
    pub(crate) kind: PropertyType,
    pub(crate) values: Values,
    /// Owning node. Empty once the property is replaced or its node dropped.
    pub(crate) parent: Weak<RefCell<NodeData>>,
}

/// Shared handle to a property. Clones refer to the same property;
/// equality is identity.
#[derive(Clone)]
pub struct Property(pub(crate) Rc<RefCell<PropertyData>>);

impl Property {
    pub(crate) fn new(parent: &Node, name: &str, values: Values) -> Self {
        let kind = values.first().map(Value::property_type).unwrap_or_default();
        Property(Rc::new(RefCell::new(PropertyData {
            name: name.to_owned(),
            kind,
            values,
            parent: Rc::downgrade(&parent.0),
        })))
    }

    pub fn name(&self) -> String {
        self.0.borrow().name.clone()
    }

    pub fn parent(&self) -> Option<Node> {
        self.0.borrow().parent.upgrade().map(Node)
    }

    pub fn path(&self) -> String {
        let name = self.name();
        match self.parent() {
            Some(p) => path::join(&p.path(), &name),
            None => path::join(path::ROOT, &name),
        }
    }

    pub fn depth(&self) -> usize {
        self.parent().map_or(1, |p| p.depth() + 1)
    }

    pub fn session(&self) -> Option<Session> {
        self.parent().and_then(|p| p.session())
    }

    pub fn property_type(&self) -> PropertyType {
        self.0.borrow().kind
    }

    pub fn is_multiple(&self) -> bool {
        self.0.borrow().values.len() > 1
    }

    /// First value, or the null value when there is none.
    pub fn get_value(&self) -> Value {
        self.0.borrow().values.first().cloned().unwrap_or_else(Value::null)
    }

    /// All values in order; empty when there are none.
    pub fn get_values(&self) -> Vec<Value> {
        self.0.borrow().values.to_vec()
    }

    pub fn set_value(&self, value: impl Into<Value>) {
        self.set_values(std::iter::once(value.into()));
    }

    /// Replace the value list in place; the property keeps its identity.
    pub fn set_values<I, V>(&self, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Values = values.into_iter().map(Into::into).collect();
        let mut data = self.0.borrow_mut();
        data.kind = values.first().map(Value::property_type).unwrap_or_default();
        data.values = values;
    }

    // ========================================================================
    // First-value accessors
    // ========================================================================

    pub fn get_string(&self) -> Option<String> { self.get_value().get_string() }
    pub fn get_long(&self) -> Result<i64> { self.get_value().get_long() }
    pub fn get_double(&self) -> Result<f64> { self.get_value().get_double() }
    pub fn get_decimal(&self) -> Result<Decimal> { self.get_value().get_decimal() }
    pub fn get_boolean(&self) -> Result<bool> { self.get_value().get_boolean() }
    pub fn get_date(&self) -> Result<Option<DateTime<FixedOffset>>> { self.get_value().get_date() }
    pub fn get_binary(&self) -> Result<Option<Binary>> { self.get_value().get_binary() }
    pub fn get_stream(&self) -> Result<Option<Cursor<Vec<u8>>>> { self.get_value().get_stream() }

    /// Resolve a reference (identifier) through the owning session.
    pub fn get_node(&self) -> Result<Option<Node>> {
        let Some(id) = self.get_value().get_string() else {
            return Ok(None);
        };
        let session = self.session().ok_or_else(|| {
            Error::NotFound(format!("property {} is not attached to a session", self.path()))
        })?;
        session
            .get_node_by_identifier(&id)
            .map(Some)
            .ok_or_else(|| Error::NotFound(format!("no node with identifier {id}")))
    }

    /// Remove from the owning node. No-op for an orphaned property.
    pub fn remove(&self) {
        if let Some(parent) = self.parent() {
            let name = self.name();
            if parent.get_own_property(&name).is_some_and(|p| p == *self) {
                parent.remove_property(&name);
            }
        }
    }

    pub fn accept(&self, visitor: &mut dyn ItemVisitor) -> Result<()> {
        visitor.visit_property(self)
    }
}

impl PartialEq for Property {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0.borrow();
        f.debug_struct("Property")
            .field("name", &data.name)
            .field("type", &data.kind)
            .field("values", &data.values)
            .finish()
    }
}
