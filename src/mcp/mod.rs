//! MCP server exposing entity creation to AI clients.
//!
//! Each entity type is reachable through the same tools: fetch its form,
//! then create a note from it.

mod server;

pub use server::run_mcp_server;
