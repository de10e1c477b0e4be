//! ==============================================================================================
//! ========================== Parallel Stochastic Network Simulation =============================
//! ==============================================================================================
//!
//! Multithreaded direct-SSA (Gillespie) solver for spatially-structured
//! continuous-time Markov chains over a network of nodes: per-node
//! compartment counts evolve under state-dependent propensities, scheduled
//! intra-/inter-node events move individuals between compartments and
//! nodes, and a day-barrier-synchronized orchestrator samples the
//! trajectory into dense or sparse output matrices.
//!
//! The entry point is [`solver::Solver`]. A model supplies one
//! [`model::Propensity`] per transition and, optionally, a
//! [`model::PostStep`] callback; the host supplies initial state, the
//! sparse dependency/state-change/selection/shift matrices ([`sparse::CscView`]),
//! a sample grid, and an event stream.

pub mod error;
pub mod events;
pub mod logging;
pub mod model;
pub mod node;
pub mod orchestrator;
pub mod partition;
pub mod rng;
pub mod sampler;
pub mod solver;
pub mod sparse;
pub mod ssa;

#[cfg(test)]
mod tests;

pub use error::{SimError, SimResult};
pub use events::{Event, EventKind};
pub use model::{Model, NoPostStep, PostStep, PostStepCode, Propensity};
pub use sampler::{OutputTarget, Sampler};
pub use solver::{Solver, SolverConfig};
pub use sparse::CscView;
