//! Repository layer — thin, typed CRUD wrappers around the SQL tables.
//!
//! Business rules (decay math, level thresholds, chain-mirror policy) live
//! above this layer, in `footfall-gateway` and `footfall-pet`. These
//! functions only know how to read and write rows.

pub mod devices;
pub mod pets;
pub mod submissions;
