//! Servidor MCP do gchat-mcp.
//!
//! JSON-RPC 2.0 sobre stdio (uma mensagem por linha). Métodos atendidos:
//! `initialize`, `ping`, `tools/list`, `tools/call` e `shutdown`.
//!
//! ## Ferramentas Expostas
//!
//! - `gchat_send_message`, `gchat_reply_to_thread`
//! - `gchat_list_messages`, `gchat_get_message`, `gchat_update_message`,
//!   `gchat_delete_message`
//! - `gchat_search_messages`
//! - `gchat_list_spaces`, `gchat_get_space`, `gchat_create_space`
//! - `gchat_list_members`
//!
//! ## Exemplo de Uso
//!
//! ```ignore
//! use gchat_mcp::mcp::McpServer;
//! use gchat_mcp::Config;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::load_or_default();
//!     let mut server = McpServer::stdio(&config).unwrap();
//!     server.run().await.unwrap();
//! }
//! ```

mod protocol;
mod server;
mod tools;
mod transport;

pub use protocol::{
    negotiate_protocol_version, CallToolParams, InitializeParams, InitializeResult, JsonRpcError,
    JsonRpcId, JsonRpcRequest, JsonRpcResponse, ListToolsResult, ServerCapabilities, ServerInfo,
    ToolContent, ToolDescription, ToolResult, ToolsCapability, INTERNAL_ERROR, INVALID_PARAMS,
    INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR, SUPPORTED_PROTOCOL_VERSIONS,
};

pub use server::McpServer;
pub use tools::{SearchMessagesParams, ToolHandler};
pub use transport::{Incoming, StdioTransport, Transport};
