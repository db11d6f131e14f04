//! Canonical serialization and Ed25519 verification of device payloads.
//!
//! Two responsibilities, kept deliberately narrow (spec.md §4.1–§4.2):
//!
//! - [`canonical::canonicalize`] turns the six signed fields into the exact
//!   byte sequence the device signed.
//! - [`verify::verify`] hashes that sequence with SHA-256 and checks the
//!   Ed25519 signature against the hash — not the raw bytes.

pub mod canonical;
pub mod verify;

pub use canonical::canonicalize;
pub use verify::verify;
