//! Narrow adapter over the external content-addressed transaction ledger
//! (spec.md §4.5, component E). Absence of `FOOTFALL__CHAIN__*` config
//! disables this crate entirely — callers hold `Option<ChainGateway>` and
//! the system runs in local-only mode (spec.md §6).

pub mod client;
pub mod error;
pub mod keys;
pub mod types;

pub use client::ChainGateway;
pub use error::ChainError;
