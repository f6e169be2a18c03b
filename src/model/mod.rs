//! # Content Tree Model
//!
//! Nodes, properties and values: the data side of the repository.
//! Index bookkeeping is delegated to `storage::Session`; this module owns
//! the tree shape and the value coercion rules.

pub mod node;
pub mod property;
pub mod item;
pub mod value;
pub mod decimal;
pub mod path;

pub use node::{Node, DEFAULT_NODE_TYPE, PRIMARY_TYPE, MIXIN_TYPES};
pub use property::Property;
pub use item::{Item, ItemVisitor};
pub use value::{Value, PropertyType, Binary};
pub use decimal::Decimal;
