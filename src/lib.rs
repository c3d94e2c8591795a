//! ticksim: tick-driven trading simulator.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`], command line surface in [`cli`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
