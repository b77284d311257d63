//! CLI library components for the transformation engine.

pub mod commands;
pub mod logging;
pub mod summary;
