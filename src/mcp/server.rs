//! Loop principal do servidor MCP.

use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncWrite};

use crate::types::config::Config;
use crate::GchatResult;

use super::protocol::{
    negotiate_protocol_version, CallToolParams, InitializeParams, InitializeResult, JsonRpcError,
    JsonRpcRequest, JsonRpcResponse, ListToolsResult,
};
use super::tools::ToolHandler;
use super::transport::{Incoming, StdioTransport, Transport};

/// Servidor MCP. Processa uma request por vez.
pub struct McpServer<R, W> {
    transport: Transport<R, W>,
    tools: ToolHandler,
    initialized: bool,
}

impl McpServer<tokio::io::BufReader<tokio::io::Stdin>, tokio::io::Stdout> {
    /// Servidor sobre stdin/stdout, ligado à Google Chat API.
    pub fn stdio(config: &Config) -> GchatResult<Self> {
        Ok(Self::new(StdioTransport::stdio(), ToolHandler::new(config)?))
    }
}

impl<R, W> McpServer<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(transport: Transport<R, W>, tools: ToolHandler) -> Self {
        Self {
            transport,
            tools,
            initialized: false,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Processa mensagens até EOF ou `shutdown`.
    pub async fn run(&mut self) -> GchatResult<()> {
        tracing::info!("gchat-mcp server starting");

        loop {
            let request = match self.transport.read_message().await? {
                Incoming::Request(request) => request,
                Incoming::Malformed(detail) => {
                    let response = JsonRpcResponse::error(None, JsonRpcError::parse_error(detail));
                    self.transport.write_response(&response).await?;
                    continue;
                }
                Incoming::Invalid { id, detail } => {
                    let response =
                        JsonRpcResponse::error(id, JsonRpcError::invalid_request(detail));
                    self.transport.write_response(&response).await?;
                    continue;
                }
                Incoming::Eof => {
                    tracing::info!("Client disconnected");
                    break;
                }
            };

            let is_notification = request.is_notification();
            let is_shutdown = request.method == "shutdown";

            let response = self.handle_request(request).await;

            // Notificações não recebem resposta
            if let (false, Some(response)) = (is_notification, response) {
                self.transport.write_response(&response).await?;
            }

            if is_shutdown && !is_notification {
                break;
            }
        }

        tracing::info!("gchat-mcp server stopped");
        Ok(())
    }

    /// Processa uma request. `None` para notificações, que não têm resposta.
    pub async fn handle_request(&mut self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        tracing::debug!(method = %request.method, "Handling request");

        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                request.id,
                JsonRpcError::invalid_request("jsonrpc must be \"2.0\""),
            ));
        }

        if request.is_notification() {
            self.handle_notification(&request);
            return None;
        }

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(request),
            "ping" => JsonRpcResponse::success(request.id, json!({})),
            "shutdown" => self.handle_shutdown(request),
            "tools/list" => self.handle_tools_list(request),
            "tools/call" => self.handle_tools_call(request).await,
            _ => {
                let error = JsonRpcError::method_not_found(&request.method);
                JsonRpcResponse::error(request.id, error)
            }
        };

        Some(response)
    }

    fn handle_notification(&mut self, request: &JsonRpcRequest) {
        match request.method.as_str() {
            "notifications/initialized" | "initialized" => {
                tracing::info!("Client initialization complete");
            }
            "notifications/cancelled" => {
                tracing::debug!("Ignoring cancellation, requests run to completion");
            }
            other => tracing::debug!(method = other, "Ignoring notification"),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Lifecycle
    // ═══════════════════════════════════════════════════════════════════════

    fn handle_initialize(&mut self, request: JsonRpcRequest) -> JsonRpcResponse {
        let params: InitializeParams = request
            .params
            .and_then(|p| serde_json::from_value(p).ok())
            .unwrap_or_default();

        let version = negotiate_protocol_version(params.protocol_version.as_deref());
        tracing::info!(
            client = params.client_info.as_ref().map(|c| c.name.as_str()).unwrap_or("unknown"),
            protocol_version = version,
            "Client initializing connection"
        );

        self.initialized = true;
        respond(request.id, InitializeResult::new(version))
    }

    fn handle_shutdown(&mut self, request: JsonRpcRequest) -> JsonRpcResponse {
        tracing::info!("Client requested shutdown");
        self.initialized = false;
        JsonRpcResponse::success(request.id, Value::Null)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Tools
    // ═══════════════════════════════════════════════════════════════════════

    fn handle_tools_list(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        respond(
            request.id,
            ListToolsResult {
                tools: ToolHandler::list_tools(),
            },
        )
    }

    async fn handle_tools_call(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let params: CallToolParams = match request.params.map(serde_json::from_value) {
            Some(Ok(params)) => params,
            Some(Err(e)) => {
                return JsonRpcResponse::error(
                    request.id,
                    JsonRpcError::invalid_params(format!("Invalid params: {e}")),
                );
            }
            None => {
                return JsonRpcResponse::error(
                    request.id,
                    JsonRpcError::invalid_params("Missing params"),
                );
            }
        };

        if !ToolHandler::has_tool(&params.name) {
            return JsonRpcResponse::error(
                request.id,
                JsonRpcError::invalid_params(format!("Unknown tool: {}", params.name)),
            );
        }

        let result = self
            .tools
            .handle_tool_call(&params.name, params.arguments)
            .await;

        respond(request.id, result)
    }
}

fn respond<T: serde::Serialize>(
    id: Option<super::protocol::JsonRpcId>,
    result: T,
) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(id, JsonRpcError::internal_error(e.to_string())),
    }
}
