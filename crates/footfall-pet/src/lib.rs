//! Local-first derived-state orchestrator for per-device pet state
//! (spec.md §4.7, component G). Decay and interaction rules are pure
//! functions over `PetState`; [`orchestrator::PetOrchestrator`] is the
//! thin shell that wires them to the durable store and the chain.

pub mod decay;
pub mod orchestrator;
pub mod rules;

pub use orchestrator::PetOrchestrator;
