//! Data models shared across the pipeline.

pub mod bill;
pub mod config;
