//! Elemental DOM - host document model
//!
//! Arena-backed element tree that the QuickJS host exposes through its
//! `document` and `Element` objects.

mod node;
mod tree;
mod error;
mod query;

pub use node::{is_valid_attribute_name, Attributes, ElementData, Node, NodeId, NodeType};
pub use tree::DomTree;
pub use error::{TreeError, TreeResult};
pub use query::Queryable;
