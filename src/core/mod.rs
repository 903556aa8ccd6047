// src/core/mod.rs

pub mod engine;
pub mod scoring;
pub mod types;
