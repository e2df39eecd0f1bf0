//! CLI library components for the inspection report tool.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod summary;
