//! Model Context Protocol surface
//!
//! - [`server`] - `rmcp` handler exposing the tool catalogue
//! - [`transport`] - stdio line screening in front of the rmcp transport

pub mod server;
pub mod transport;

pub use server::{tools_list, McpServer};
