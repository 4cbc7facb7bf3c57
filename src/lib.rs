//! Kindred onboarding engine
//!
//! Bootstrap (config, tracing, dependency wiring) and the command-line front
//! end over the `kd-*` workspace crates.

pub mod bootstrap;
pub mod cli;
