//! Domain layer types and invariants.

pub mod docs;
pub mod error;
pub mod navigation;
