/// Core Server Framework Module
///
/// - config.rs: environment-driven server configuration
/// - protocol.rs: JSON-RPC 2.0 framing and the call result envelope
/// - server.rs: request routing plus the STDIO and HTTP transports

pub mod config;
pub mod protocol;
pub mod server;
