//! Core domain types and logic.

pub mod raw_table;
pub mod normalize;
pub mod series;
pub mod window;
pub mod estimator;
pub mod result_table;
pub mod engine;
pub mod config_validation;
pub mod error;
