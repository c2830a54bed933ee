//! Built-in output format converters.
//!
//! One converter per emission discipline: `lingo` defers and deduplicates a
//! whole-corpus word list, `midos` streams record blocks, and `xml` wraps
//! records in a shared document envelope.

pub mod lingo;
pub mod midos;
pub mod xml;

pub use lingo::Lingo;
pub use midos::MidosOut;
pub use xml::Xml;
