//! Acesso à Google Chat REST API.
//!
//! [`ChatApi`] é a fronteira usada pela camada de ferramentas MCP; o
//! [`GoogleChatClient`] implementa esse trait sobre HTTP. Testes usam dublês
//! do mesmo trait.

mod client;

use async_trait::async_trait;

pub use client::GoogleChatClient;

use crate::types::{
    CreateSpaceRequest, ListMessagesOptions, ListSpacesOptions, Membership, Message, Page, Space,
};
use crate::GchatResult;

/// Operações da Google Chat API expostas pelo servidor.
///
/// Nomes de espaço aceitam `spaces/{id}` ou o id puro. Nomes de mensagem
/// precisam do recurso completo `spaces/{s}/messages/{m}`.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Publica uma mensagem de texto num espaço.
    async fn send_message(&self, space: &str, text: &str) -> GchatResult<Message>;

    /// Responde numa thread existente.
    ///
    /// `thread` é o recurso da thread ou uma `threadKey` do cliente; se a
    /// thread não existir, a API abre uma nova.
    async fn reply_to_thread(&self, space: &str, thread: &str, text: &str)
        -> GchatResult<Message>;

    async fn list_messages(
        &self,
        space: &str,
        options: &ListMessagesOptions,
    ) -> GchatResult<Page<Message>>;

    async fn get_message(&self, name: &str) -> GchatResult<Message>;

    /// Substitui o texto de uma mensagem enviada pelo usuário autenticado.
    async fn update_message(&self, name: &str, text: &str) -> GchatResult<Message>;

    async fn delete_message(&self, name: &str) -> GchatResult<()>;

    async fn list_spaces(&self, options: &ListSpacesOptions) -> GchatResult<Page<Space>>;

    async fn get_space(&self, space: &str) -> GchatResult<Space>;

    async fn create_space(&self, request: &CreateSpaceRequest) -> GchatResult<Space>;

    async fn list_members(
        &self,
        space: &str,
        page_size: Option<u32>,
        page_token: Option<&str>,
    ) -> GchatResult<Page<Membership>>;
}

/// Referência a uma thread: recurso completo ou chave do cliente.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadRef {
    Name(String),
    Key(String),
}

impl ThreadRef {
    pub fn parse(thread: &str) -> GchatResult<Self> {
        let thread = thread.trim();
        crate::types::chat::require_text("thread", thread)?;

        let is_resource = thread.starts_with("spaces/") && thread.contains("/threads/");
        Ok(if is_resource {
            ThreadRef::Name(thread.to_string())
        } else {
            ThreadRef::Key(thread.to_string())
        })
    }

    /// Objeto `thread` do corpo da mensagem.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ThreadRef::Name(name) => serde_json::json!({ "name": name }),
            ThreadRef::Key(key) => serde_json::json!({ "threadKey": key }),
        }
    }
}
