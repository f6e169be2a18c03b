//! Item: either side of the path index, plus the visitor contract.

use super::{Node, Property};
use crate::Result;

/// Anything addressable by an absolute path.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Node(Node),
    Property(Property),
}

impl Item {
    pub fn name(&self) -> String {
        match self {
            Item::Node(n) => n.name(),
            Item::Property(p) => p.name(),
        }
    }

    pub fn path(&self) -> String {
        match self {
            Item::Node(n) => n.path(),
            Item::Property(p) => p.path(),
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            Item::Node(n) => n.depth(),
            Item::Property(p) => p.depth(),
        }
    }

    pub fn is_node(&self) -> bool { matches!(self, Item::Node(_)) }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Item::Node(n) => Some(n),
            Item::Property(_) => None,
        }
    }

    pub fn as_property(&self) -> Option<&Property> {
        match self {
            Item::Property(p) => Some(p),
            Item::Node(_) => None,
        }
    }

    pub fn accept(&self, visitor: &mut dyn ItemVisitor) -> Result<()> {
        match self {
            Item::Node(n) => n.accept(visitor),
            Item::Property(p) => p.accept(visitor),
        }
    }
}

impl From<Node> for Item {
    fn from(n: Node) -> Self { Item::Node(n) }
}

impl From<Property> for Item {
    fn from(p: Property) -> Self { Item::Property(p) }
}

/// Single-dispatch visitor. `Node::accept` calls `visit_node` with the node
/// itself; `Node::traverse` walks a whole subtree.
pub trait ItemVisitor {
    fn visit_node(&mut self, node: &Node) -> Result<()>;

    fn visit_property(&mut self, _property: &Property) -> Result<()> {
        Ok(())
    }
}
