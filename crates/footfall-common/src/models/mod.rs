//! Persisted domain types shared across all Footfall services.
//!
//! These are the "truth" types — what the durable store persists and what
//! the gateway and REST projection serialize.

pub mod device;
pub mod pet;
pub mod submission;

pub use device::*;
pub use pet::*;
pub use submission::*;
