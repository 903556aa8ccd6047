// src/lib.rs

pub mod chart;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod learning;
pub mod persistence;
pub mod prompt;
pub mod session;
pub use crate::core::engine::DiagnosisEngine;
pub use crate::error::{DiagnosisError, Result};
