//! # footfall-common
//!
//! Shared domain model, error taxonomy, and configuration used by every
//! Footfall crate: the gateway, the durable store, the chain adapter, the
//! batch submitter, and the pet orchestrator.

pub mod any_row;
pub mod config;
pub mod error;
pub mod ids;
pub mod models;
pub mod validation;
