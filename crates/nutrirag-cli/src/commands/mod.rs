//! CLI command handlers

pub mod budget;
pub mod recommend;
pub mod status;
pub mod targets;
