//! Elemental HTML - host markup handling
//!
//! Lenient fragment tokenizer, tree construction and serialization backing
//! the host's `innerHTML` property.

mod tokenizer;
mod tree_builder;
mod serializer;
mod error;
mod entities;

pub use tokenizer::{Tokenizer, Token};
pub use tree_builder::HtmlParser;
pub use serializer::{escape_attribute, escape_text, serialize_children};
pub use error::{HtmlError, HtmlResult};
