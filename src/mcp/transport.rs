//! Transporte MCP sobre stdio.
//!
//! Cada mensagem é um objeto JSON-RPC 2.0 numa única linha terminada em
//! `\n`, sem cabeçalhos `Content-Length`:
//!
//! ```text
//! {"jsonrpc":"2.0","id":1,"method":"initialize","params":{...}}\n
//! {"jsonrpc":"2.0","id":1,"result":{...}}\n
//! ```
//!
//! O transporte é genérico sobre leitor e escritor assíncronos, então os
//! testes usam buffers em memória no lugar de stdin/stdout.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use serde_json::Value;

use super::protocol::{JsonRpcId, JsonRpcRequest, JsonRpcResponse};
use crate::GchatResult;

/// Uma linha lida do cliente.
#[derive(Debug)]
pub enum Incoming {
    Request(JsonRpcRequest),
    /// Linha que não é JSON (ou não é UTF-8).
    Malformed(String),
    /// JSON válido que não forma uma request JSON-RPC.
    Invalid {
        id: Option<JsonRpcId>,
        detail: String,
    },
    Eof,
}

/// Transporte newline-delimited JSON.
pub struct Transport<R, W> {
    reader: R,
    writer: W,
}

/// Transporte sobre o stdin/stdout do processo.
pub type StdioTransport = Transport<BufReader<tokio::io::Stdin>, tokio::io::Stdout>;

impl StdioTransport {
    pub fn stdio() -> Self {
        Transport::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> Transport<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Lê a próxima mensagem. Linhas em branco são ignoradas.
    pub async fn read_message(&mut self) -> GchatResult<Incoming> {
        let mut buf = Vec::new();

        loop {
            buf.clear();
            if self.reader.read_until(b'\n', &mut buf).await? == 0 {
                return Ok(Incoming::Eof);
            }

            let line = match std::str::from_utf8(&buf) {
                Ok(line) => line,
                Err(e) => {
                    tracing::warn!(error = %e, "Non UTF-8 input line");
                    return Ok(Incoming::Malformed(format!("invalid UTF-8: {e}")));
                }
            };

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            return Ok(Self::parse_line(trimmed));
        }
    }

    fn parse_line(line: &str) -> Incoming {
        let value = match serde_json::from_str::<Value>(line) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "Malformed JSON-RPC message");
                return Incoming::Malformed(e.to_string());
            }
        };

        // JSON válido: um id legível ainda é devolvido na resposta de erro
        let id = value
            .get("id")
            .and_then(|id| serde_json::from_value::<JsonRpcId>(id.clone()).ok());

        match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) => {
                tracing::debug!(method = %request.method, id = ?request.id, "Received request");
                Incoming::Request(request)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Invalid JSON-RPC request");
                Incoming::Invalid {
                    id,
                    detail: e.to_string(),
                }
            }
        }
    }

    /// Escreve uma resposta como JSON compacto seguido de `\n`.
    pub async fn write_response(&mut self, response: &JsonRpcResponse) -> GchatResult<()> {
        let mut body = serde_json::to_vec(response)?;
        body.push(b'\n');

        self.writer.write_all(&body).await?;
        self.writer.flush().await?;

        tracing::debug!(id = ?response.id, is_error = response.is_error(), "Sent response");
        Ok(())
    }

    /// Devolve o escritor (usado nos testes para inspecionar a saída).
    pub fn into_writer(self) -> W {
        self.writer
    }
}
