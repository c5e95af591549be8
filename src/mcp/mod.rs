// Model Context Protocol server over stdio

pub mod server;
pub mod tools;

pub use server::McpServer;
