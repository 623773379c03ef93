//! End-to-end test support for smv-core
//!
//! - `harness`: isolated databases for each test
//! - `mocks`: item fixtures and scripted scheduling contexts

pub mod mocks;
