//! Scenario-level tests for the simulation engine's testable properties,
//! split one file per concern.

mod common;
