//! Recursos da API do Google Chat.
//!
//! Espelham o formato JSON (camelCase) retornado por `chat.googleapis.com`.
//! Campos desconhecidos são ignorados.

use serde::{Deserialize, Serialize};

use crate::{GchatError, GchatResult};

/// Usuário ou bot que enviou uma mensagem ou participa de um espaço.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Recurso do usuário (`users/{id}`).
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// `HUMAN` ou `BOT`.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub user_type: Option<String>,
}

/// Thread de respostas ancorada numa mensagem.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    /// Recurso da thread (`spaces/{s}/threads/{t}`).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Chave definida pelo cliente ao criar a thread.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_key: Option<String>,
}

/// Mensagem do Google Chat.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Recurso da mensagem (`spaces/{s}/messages/{m}`).
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<User>,

    /// Corpo em texto puro. Mensagens só com cards vêm sem texto.
    #[serde(default)]
    pub text: String,

    /// Timestamp RFC 3339.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread: Option<Thread>,
}

impl Message {
    /// Cria uma mensagem apenas com nome e texto.
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            ..Default::default()
        }
    }

    /// Espaço ao qual a mensagem pertence (`spaces/{s}`).
    pub fn space(&self) -> Option<&str> {
        let mut parts = self.name.splitn(3, '/');
        match (parts.next(), parts.next()) {
            (Some("spaces"), Some(id)) if !id.is_empty() => {
                Some(&self.name[..("spaces/".len() + id.len())])
            }
            _ => None,
        }
    }
}

/// Tipo de espaço.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpaceType {
    /// Sala nomeada.
    Space,
    /// Conversa em grupo sem nome.
    GroupChat,
    /// Mensagem direta entre duas pessoas (ou pessoa e bot).
    DirectMessage,
    #[serde(other)]
    Unspecified,
}

impl std::fmt::Display for SpaceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpaceType::Space => write!(f, "SPACE"),
            SpaceType::GroupChat => write!(f, "GROUP_CHAT"),
            SpaceType::DirectMessage => write!(f, "DIRECT_MESSAGE"),
            SpaceType::Unspecified => write!(f, "SPACE_TYPE_UNSPECIFIED"),
        }
    }
}

impl std::str::FromStr for SpaceType {
    type Err = GchatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "SPACE" => Ok(SpaceType::Space),
            "GROUP_CHAT" => Ok(SpaceType::GroupChat),
            "DIRECT_MESSAGE" | "DM" => Ok(SpaceType::DirectMessage),
            other => Err(GchatError::invalid_query(format!(
                "unknown space type '{other}' (expected SPACE, GROUP_CHAT or DIRECT_MESSAGE)"
            ))),
        }
    }
}

/// Detalhes opcionais de um espaço.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guidelines: Option<String>,
}

/// Espaço do Google Chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Space {
    /// Recurso do espaço (`spaces/{id}`).
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default = "default_space_type")]
    pub space_type: SpaceType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_details: Option<SpaceDetails>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
}

fn default_space_type() -> SpaceType {
    SpaceType::Unspecified
}

impl Space {
    /// Verdadeiro para DMs (a API não retorna `displayName` nelas).
    pub fn is_direct_message(&self) -> bool {
        self.space_type == SpaceType::DirectMessage
    }
}

/// Participação de um usuário num espaço.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    /// Recurso (`spaces/{s}/members/{m}`).
    #[serde(default)]
    pub name: String,

    /// `JOINED`, `INVITED` ou `NOT_A_MEMBER`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// `ROLE_MEMBER` ou `ROLE_MANAGER`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member: Option<User>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
}

/// Uma página de resultados de uma operação de listagem.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,

    /// Token para buscar a próxima página, se houver.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

impl<T> Page<T> {
    /// Página única, sem continuação.
    pub fn single(items: Vec<T>) -> Self {
        Self {
            items,
            next_page_token: None,
        }
    }

    pub fn has_more(&self) -> bool {
        self.next_page_token.is_some()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Validação de nomes de recursos
// ═══════════════════════════════════════════════════════════════════════════

/// Normaliza o identificador de um espaço para `spaces/{id}`.
///
/// Aceita tanto `spaces/AAAA` quanto o id puro `AAAA`.
pub fn normalize_space_name(space: &str) -> GchatResult<String> {
    let space = space.trim();
    if space.is_empty() {
        return Err(GchatError::invalid_query("space must not be empty"));
    }

    let id = space.strip_prefix("spaces/").unwrap_or(space);
    if id.is_empty() || id.contains('/') {
        return Err(GchatError::invalid_query(format!(
            "invalid space name '{space}' (expected spaces/{{id}})"
        )));
    }

    Ok(format!("spaces/{id}"))
}

/// Valida o nome completo de uma mensagem (`spaces/{s}/messages/{m}`).
pub fn validate_message_name(name: &str) -> GchatResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(GchatError::invalid_query("message name must not be empty"));
    }

    let parts: Vec<&str> = name.split('/').collect();
    match parts.as_slice() {
        ["spaces", space, "messages", message] if !space.is_empty() && !message.is_empty() => {
            Ok(name.to_string())
        }
        _ => Err(GchatError::invalid_query(format!(
            "invalid message name '{name}' (expected spaces/{{space}}/messages/{{message}})"
        ))),
    }
}

/// Garante que um texto obrigatório não está vazio.
pub fn require_text(field: &str, value: &str) -> GchatResult<()> {
    if value.trim().is_empty() {
        return Err(GchatError::invalid_query(format!("{field} must not be empty")));
    }
    Ok(())
}
