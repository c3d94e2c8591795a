//! Core domain types and logic.

pub mod config_validation;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod features;
pub mod order;
pub mod position;
pub mod risk;
pub mod strategy;
pub mod tick;
