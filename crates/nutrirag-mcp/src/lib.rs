//! NutriRAG MCP Server
//!
//! Model Context Protocol server exposing nutrition targets, budgets and
//! grounded recommendations to AI assistants.

pub mod protocol;
pub mod server;
pub mod tools;

pub use server::{start_server, McpServer};
