//! Elemental - typed element handles
//!
//! [`Element`] wraps a host element object and exposes its text, markup,
//! attributes and children as plain Rust values. Every host interaction
//! goes through one boundary that turns host exceptions, null references and
//! conversion failures into a [`DomError`]; nothing thrown by the host
//! escapes to callers.

mod boundary;
mod element;
mod error;

pub use element::Element;
pub use error::{DomError, ErrorKind, HostFault, Operation};
