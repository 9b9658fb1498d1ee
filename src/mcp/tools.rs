//! Ferramentas MCP do gchat-mcp.
//!
//! Cada ferramenta valida seus argumentos, chama a [`ChatApi`] (e o motor de
//! busca, no caso de `gchat_search_messages`) e devolve JSON. Erros viram o
//! payload `{"error": {"code", "message"}}` com `isError: true`.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::provider_from_config;
use crate::chat::{ChatApi, GoogleChatClient};
use crate::search::SearchEngine;
use crate::types::chat::{normalize_space_name, require_text, validate_message_name};
use crate::types::config::{ChatConfig, Config};
use crate::types::requests::parse_time_bound;
use crate::types::{
    CreateSpaceRequest, ListMessagesOptions, ListSpacesOptions, Message, SortOrder, SpaceType,
};
use crate::{GchatError, GchatResult};

use super::protocol::{ToolDescription, ToolResult};

/// Maior `pageSize` aceito pela API.
const MAX_PAGE_SIZE: u32 = 1000;

// ═══════════════════════════════════════════════════════════════════════════
// Parâmetros das ferramentas
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageParams {
    pub space: String,
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplyToThreadParams {
    pub space: String,
    /// Recurso da thread ou `threadKey`.
    pub thread: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListMessagesParams {
    pub space: String,
    #[serde(default)]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub page_token: Option<String>,
    /// `YYYY-MM-DD` ou RFC 3339.
    #[serde(default)]
    pub start_time: Option<String>,
    /// `YYYY-MM-DD` (inclusivo) ou RFC 3339.
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub thread: Option<String>,
    #[serde(default)]
    pub order: Option<SortOrder>,
    #[serde(default)]
    pub show_deleted: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageNameParams {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateMessageParams {
    pub name: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListSpacesParams {
    #[serde(default)]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub page_token: Option<String>,
    #[serde(default)]
    pub space_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpaceParams {
    pub space: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSpaceParams {
    pub display_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub external_user_allowed: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListMembersParams {
    pub space: String,
    #[serde(default)]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub page_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchMessagesParams {
    pub space: String,
    pub query: String,
    /// `exact`, `regex`, `hybrid` (ou `semantic`, que cai para `exact`).
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    /// Máximo de resultados devolvidos.
    #[serde(default)]
    pub limit: Option<usize>,
}

fn parse<T: DeserializeOwned>(arguments: Value) -> GchatResult<T> {
    let arguments = if arguments.is_null() {
        json!({})
    } else {
        arguments
    };
    serde_json::from_value(arguments)
        .map_err(|e| GchatError::invalid_query(format!("invalid arguments: {e}")))
}

fn time_bound(
    value: Option<&str>,
    end_of_day: bool,
) -> GchatResult<Option<chrono::DateTime<chrono::Utc>>> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| parse_time_bound(v, end_of_day))
        .transpose()
}

// ═══════════════════════════════════════════════════════════════════════════
// Handler
// ═══════════════════════════════════════════════════════════════════════════

/// Despacha chamadas `tools/call`.
pub struct ToolHandler {
    api: Arc<dyn ChatApi>,
    search: SearchEngine,
    chat: ChatConfig,
}

impl ToolHandler {
    /// Handler ligado à API real, com o provider de token da configuração.
    pub fn new(config: &Config) -> GchatResult<Self> {
        let client = GoogleChatClient::new(
            config.chat.base_url.clone(),
            Duration::from_secs(config.general.timeout_secs),
            provider_from_config(&config.auth),
        )?;
        Ok(Self::with_api(Arc::new(client), config))
    }

    /// Handler sobre qualquer implementação de [`ChatApi`].
    pub fn with_api(api: Arc<dyn ChatApi>, config: &Config) -> Self {
        Self {
            api,
            search: SearchEngine::new(config.search.clone()),
            chat: config.chat.clone(),
        }
    }

    pub fn has_tool(name: &str) -> bool {
        Self::list_tools().iter().any(|tool| tool.name == name)
    }

    /// Processa uma chamada de ferramenta.
    pub async fn handle_tool_call(&self, name: &str, arguments: Value) -> ToolResult {
        tracing::info!(tool = name, "Processing tool call");

        match self.dispatch(name, arguments).await {
            Ok(value) => ToolResult::success_json(&value),
            Err(err) => {
                tracing::warn!(tool = name, code = err.code(), error = %err, "Tool call failed");
                ToolResult::from_error(&err)
            }
        }
    }

    async fn dispatch(&self, name: &str, arguments: Value) -> GchatResult<Value> {
        match name {
            "gchat_send_message" => self.send_message(parse(arguments)?).await,
            "gchat_reply_to_thread" => self.reply_to_thread(parse(arguments)?).await,
            "gchat_list_messages" => self.list_messages(parse(arguments)?).await,
            "gchat_get_message" => self.get_message(parse(arguments)?).await,
            "gchat_update_message" => self.update_message(parse(arguments)?).await,
            "gchat_delete_message" => self.delete_message(parse(arguments)?).await,
            "gchat_list_spaces" => self.list_spaces(parse(arguments)?).await,
            "gchat_get_space" => self.get_space(parse(arguments)?).await,
            "gchat_create_space" => self.create_space(parse(arguments)?).await,
            "gchat_search_messages" => self.search_messages(parse(arguments)?).await,
            "gchat_list_members" => self.list_members(parse(arguments)?).await,
            other => Err(GchatError::invalid_query(format!("unknown tool: {other}"))),
        }
    }

    fn page_size(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.chat.default_page_size)
            .clamp(1, MAX_PAGE_SIZE)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Mensagens
    // ═══════════════════════════════════════════════════════════════════════

    async fn send_message(&self, params: SendMessageParams) -> GchatResult<Value> {
        let space = normalize_space_name(&params.space)?;
        require_text("text", &params.text)?;

        let message = self.api.send_message(&space, &params.text).await?;
        Ok(serde_json::to_value(message)?)
    }

    async fn reply_to_thread(&self, params: ReplyToThreadParams) -> GchatResult<Value> {
        let space = normalize_space_name(&params.space)?;
        require_text("thread", &params.thread)?;
        require_text("text", &params.text)?;

        let message = self
            .api
            .reply_to_thread(&space, params.thread.trim(), &params.text)
            .await?;
        Ok(serde_json::to_value(message)?)
    }

    async fn list_messages(&self, params: ListMessagesParams) -> GchatResult<Value> {
        let space = normalize_space_name(&params.space)?;

        let options = ListMessagesOptions {
            page_size: Some(self.page_size(params.page_size)),
            page_token: params.page_token,
            start_time: time_bound(params.start_time.as_deref(), false)?,
            end_time: time_bound(params.end_time.as_deref(), true)?,
            thread: params.thread.filter(|t| !t.trim().is_empty()),
            order: params.order.unwrap_or_default(),
            show_deleted: params.show_deleted,
        };
        options.validate()?;

        let page = self.api.list_messages(&space, &options).await?;
        Ok(json!({
            "space": space,
            "messages": page.items,
            "next_page_token": page.next_page_token,
        }))
    }

    async fn get_message(&self, params: MessageNameParams) -> GchatResult<Value> {
        let name = validate_message_name(&params.name)?;
        Ok(serde_json::to_value(self.api.get_message(&name).await?)?)
    }

    async fn update_message(&self, params: UpdateMessageParams) -> GchatResult<Value> {
        let name = validate_message_name(&params.name)?;
        require_text("text", &params.text)?;

        let message = self.api.update_message(&name, &params.text).await?;
        Ok(serde_json::to_value(message)?)
    }

    async fn delete_message(&self, params: MessageNameParams) -> GchatResult<Value> {
        let name = validate_message_name(&params.name)?;
        self.api.delete_message(&name).await?;
        Ok(json!({ "deleted": true, "name": name }))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Espaços e membros
    // ═══════════════════════════════════════════════════════════════════════

    async fn list_spaces(&self, params: ListSpacesParams) -> GchatResult<Value> {
        let space_type = params
            .space_type
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(str::parse::<SpaceType>)
            .transpose()?;

        let options = ListSpacesOptions {
            page_size: Some(self.page_size(params.page_size)),
            page_token: params.page_token,
            space_type,
        };

        let page = self.api.list_spaces(&options).await?;
        Ok(json!({
            "spaces": page.items,
            "next_page_token": page.next_page_token,
        }))
    }

    async fn get_space(&self, params: SpaceParams) -> GchatResult<Value> {
        let space = normalize_space_name(&params.space)?;
        Ok(serde_json::to_value(self.api.get_space(&space).await?)?)
    }

    async fn create_space(&self, params: CreateSpaceParams) -> GchatResult<Value> {
        require_text("display_name", &params.display_name)?;

        let mut request = CreateSpaceRequest::new(params.display_name.trim());
        if let Some(description) = params.description.filter(|d| !d.trim().is_empty()) {
            request = request.with_description(description);
        }
        request.external_user_allowed = params.external_user_allowed;

        Ok(serde_json::to_value(self.api.create_space(&request).await?)?)
    }

    async fn list_members(&self, params: ListMembersParams) -> GchatResult<Value> {
        let space = normalize_space_name(&params.space)?;
        let page = self
            .api
            .list_members(
                &space,
                Some(self.page_size(params.page_size)),
                params.page_token.as_deref(),
            )
            .await?;

        Ok(json!({
            "space": space,
            "members": page.items,
            "next_page_token": page.next_page_token,
        }))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Busca
    // ═══════════════════════════════════════════════════════════════════════

    /// Busca mensagens de um espaço.
    ///
    /// Carrega até `max_search_pages` páginas, das mais recentes para as mais
    /// antigas, e busca sobre elas em ordem cronológica. `truncated` indica
    /// que havia mais páginas.
    pub async fn search_messages(&self, params: SearchMessagesParams) -> GchatResult<Value> {
        let space = normalize_space_name(&params.space)?;
        require_text("query", &params.query)?;
        if params.limit == Some(0) {
            return Err(GchatError::invalid_query("limit must be at least 1"));
        }

        let mut options = ListMessagesOptions {
            page_size: Some(self.chat.search_page_size.clamp(1, MAX_PAGE_SIZE)),
            start_time: time_bound(params.start_time.as_deref(), false)?,
            end_time: time_bound(params.end_time.as_deref(), true)?,
            order: SortOrder::Desc,
            ..Default::default()
        };
        options.validate()?;

        let mut messages: Vec<Message> = Vec::new();
        let mut truncated = false;

        for page_number in 0..self.chat.max_search_pages {
            let page = self.api.list_messages(&space, &options).await?;
            messages.extend(page.items);

            match page.next_page_token {
                Some(token) if page_number + 1 < self.chat.max_search_pages => {
                    options.page_token = Some(token);
                }
                Some(_) => truncated = true,
                None => break,
            }
        }
        messages.reverse();

        tracing::debug!(
            space = %space,
            scanned = messages.len(),
            truncated,
            "Loaded messages for search"
        );

        let outcome = self
            .search
            .search(&params.query, &messages, params.mode.as_deref())?;

        let mut hits: Vec<Value> = outcome
            .hits
            .iter()
            .map(|hit| {
                json!({
                    "score": hit.score,
                    "matched_by": hit.matched_by,
                    "message": hit.message,
                })
            })
            .collect();
        let total_matches = hits.len();
        if let Some(limit) = params.limit {
            hits.truncate(limit);
        }

        Ok(json!({
            "space": space,
            "query": params.query,
            "mode": outcome.mode,
            "fallback": outcome.fallback,
            "total_scanned": messages.len(),
            "total_matches": total_matches,
            "truncated": truncated,
            "matches": hits,
        }))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Descrições
    // ═══════════════════════════════════════════════════════════════════════

    /// Lista todas as ferramentas disponíveis.
    pub fn list_tools() -> Vec<ToolDescription> {
        let space = json!({
            "type": "string",
            "description": "Space resource name (spaces/AAAA) or bare space id"
        });
        let message_name = json!({
            "type": "string",
            "description": "Message resource name (spaces/{space}/messages/{message})"
        });
        let page_size = json!({
            "type": "integer",
            "minimum": 1,
            "maximum": MAX_PAGE_SIZE,
            "description": "Maximum number of items to return"
        });
        let page_token = json!({
            "type": "string",
            "description": "next_page_token from a previous call"
        });
        let start_time = json!({
            "type": "string",
            "description": "Only messages created after this date (YYYY-MM-DD) or instant (RFC 3339)"
        });
        let end_time = json!({
            "type": "string",
            "description": "Only messages created up to this date (YYYY-MM-DD, inclusive) or before this instant (RFC 3339)"
        });

        vec![
            ToolDescription::new(
                "gchat_send_message",
                "Send a text message to a Google Chat space.",
                json!({
                    "type": "object",
                    "properties": {
                        "space": space,
                        "text": { "type": "string", "description": "Message text" }
                    },
                    "required": ["space", "text"]
                }),
            ),
            ToolDescription::new(
                "gchat_reply_to_thread",
                "Reply inside an existing thread. Starts a new thread if it does not exist.",
                json!({
                    "type": "object",
                    "properties": {
                        "space": space,
                        "thread": {
                            "type": "string",
                            "description": "Thread resource name (spaces/{s}/threads/{t}) or client thread key"
                        },
                        "text": { "type": "string", "description": "Reply text" }
                    },
                    "required": ["space", "thread", "text"]
                }),
            ),
            ToolDescription::new(
                "gchat_list_messages",
                "List messages of a space, optionally filtered by time range or thread.",
                json!({
                    "type": "object",
                    "properties": {
                        "space": space,
                        "page_size": page_size,
                        "page_token": page_token,
                        "start_time": start_time,
                        "end_time": end_time,
                        "thread": { "type": "string", "description": "Thread resource name" },
                        "order": { "type": "string", "enum": ["asc", "desc"], "default": "asc" },
                        "show_deleted": { "type": "boolean", "default": false }
                    },
                    "required": ["space"]
                }),
            ),
            ToolDescription::new(
                "gchat_get_message",
                "Fetch a single message by resource name.",
                json!({
                    "type": "object",
                    "properties": { "name": message_name },
                    "required": ["name"]
                }),
            ),
            ToolDescription::new(
                "gchat_update_message",
                "Replace the text of a message sent by the authenticated user.",
                json!({
                    "type": "object",
                    "properties": {
                        "name": message_name,
                        "text": { "type": "string", "description": "New message text" }
                    },
                    "required": ["name", "text"]
                }),
            ),
            ToolDescription::new(
                "gchat_delete_message",
                "Delete a message by resource name.",
                json!({
                    "type": "object",
                    "properties": { "name": message_name },
                    "required": ["name"]
                }),
            ),
            ToolDescription::new(
                "gchat_list_spaces",
                "List the spaces the authenticated user belongs to.",
                json!({
                    "type": "object",
                    "properties": {
                        "page_size": page_size,
                        "page_token": page_token,
                        "space_type": {
                            "type": "string",
                            "enum": ["SPACE", "GROUP_CHAT", "DIRECT_MESSAGE"]
                        }
                    }
                }),
            ),
            ToolDescription::new(
                "gchat_get_space",
                "Fetch details of a space.",
                json!({
                    "type": "object",
                    "properties": { "space": space },
                    "required": ["space"]
                }),
            ),
            ToolDescription::new(
                "gchat_create_space",
                "Create a named space.",
                json!({
                    "type": "object",
                    "properties": {
                        "display_name": { "type": "string", "description": "Space name" },
                        "description": { "type": "string", "description": "Optional description" },
                        "external_user_allowed": { "type": "boolean", "default": false }
                    },
                    "required": ["display_name"]
                }),
            ),
            ToolDescription::new(
                "gchat_search_messages",
                "Search recent messages of a space. Modes: exact (case-insensitive substring, \
                 contraction-aware: \"dont\" finds \"don't\" and \"do not\"), regex, or hybrid \
                 (ranked union of both). \"semantic\" is not available and runs as exact.",
                json!({
                    "type": "object",
                    "properties": {
                        "space": space,
                        "query": { "type": "string", "description": "Text or regular expression" },
                        "mode": {
                            "type": "string",
                            "enum": ["exact", "regex", "hybrid", "semantic"],
                            "description": "Search mode (defaults to the configured mode)"
                        },
                        "start_time": start_time,
                        "end_time": end_time,
                        "limit": {
                            "type": "integer",
                            "minimum": 1,
                            "description": "Maximum matches returned"
                        }
                    },
                    "required": ["space", "query"]
                }),
            ),
            ToolDescription::new(
                "gchat_list_members",
                "List the members of a space.",
                json!({
                    "type": "object",
                    "properties": {
                        "space": space,
                        "page_size": page_size,
                        "page_token": page_token
                    },
                    "required": ["space"]
                }),
            ),
        ]
    }
}
