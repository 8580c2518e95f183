//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements outbound port traits for the block sync engine.

mod simulated_chain;

pub use simulated_chain::SimulatedChain;
