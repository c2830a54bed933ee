//! Built-in input spec parsers.
//!
//! Each parser registers the target's configured fields when a record begins,
//! then broadcast-appends every source line's data under the source tag as
//! element key. Output converters narrow fields back down to the elements
//! their configuration lists.

pub mod midos;
pub mod sisis;

pub use midos::Midos;
pub use sisis::Sisis;
