//! Parâmetros das operações de listagem e criação.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::chat::SpaceType;
use crate::{GchatError, GchatResult};

/// Ordem cronológica de listagem.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Mais antigas primeiro (padrão da API).
    #[default]
    Asc,
    /// Mais recentes primeiro.
    Desc,
}

impl SortOrder {
    /// Valor do parâmetro `orderBy`.
    pub fn order_by(&self) -> &'static str {
        match self {
            SortOrder::Asc => "createTime asc",
            SortOrder::Desc => "createTime desc",
        }
    }
}

/// Filtros para `list_messages`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListMessagesOptions {
    pub page_size: Option<u32>,
    pub page_token: Option<String>,

    /// Apenas mensagens criadas depois deste instante.
    pub start_time: Option<DateTime<Utc>>,

    /// Apenas mensagens criadas antes deste instante.
    pub end_time: Option<DateTime<Utc>>,

    /// Restringe a uma thread (`spaces/{s}/threads/{t}`).
    pub thread: Option<String>,

    pub order: SortOrder,

    pub show_deleted: bool,
}

impl ListMessagesOptions {
    /// Monta a expressão `filter` da API, se algum filtro estiver definido.
    pub fn filter(&self) -> Option<String> {
        let mut clauses = Vec::new();

        if let Some(start) = self.start_time {
            clauses.push(format!("createTime > \"{}\"", start.to_rfc3339()));
        }
        if let Some(end) = self.end_time {
            clauses.push(format!("createTime < \"{}\"", end.to_rfc3339()));
        }
        if let Some(thread) = &self.thread {
            clauses.push(format!("thread.name = {thread}"));
        }

        if clauses.is_empty() {
            None
        } else {
            Some(clauses.join(" AND "))
        }
    }

    /// Rejeita intervalos vazios antes de ir à rede.
    pub fn validate(&self) -> GchatResult<()> {
        if let (Some(start), Some(end)) = (self.start_time, self.end_time) {
            if start >= end {
                return Err(GchatError::invalid_query(format!(
                    "start time {start} must be before end time {end}"
                )));
            }
        }
        Ok(())
    }
}

/// Filtros para `list_spaces`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListSpacesOptions {
    pub page_size: Option<u32>,
    pub page_token: Option<String>,
    pub space_type: Option<SpaceType>,
}

impl ListSpacesOptions {
    /// Monta a expressão `filter` da API.
    pub fn filter(&self) -> Option<String> {
        self.space_type
            .map(|space_type| format!("spaceType = \"{space_type}\""))
    }
}

/// Configuração de um novo espaço nomeado.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSpaceRequest {
    pub display_name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Permite membros fora do domínio do Workspace.
    #[serde(default)]
    pub external_user_allowed: bool,
}

impl CreateSpaceRequest {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            description: None,
            external_user_allowed: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Corpo JSON do `spaces.create`.
    pub fn to_body(&self) -> Value {
        let mut body = json!({
            "displayName": self.display_name,
            "spaceType": "SPACE",
            "externalUserAllowed": self.external_user_allowed,
        });
        if let Some(description) = &self.description {
            body["spaceDetails"] = json!({ "description": description });
        }
        body
    }
}

/// Interpreta um limite de tempo vindo de uma ferramenta.
///
/// Aceita RFC 3339 ou `YYYY-MM-DD`. Datas puras viram meia-noite UTC; quando
/// `end_of_day` é verdadeiro, a data é inclusiva (meia-noite do dia seguinte).
pub fn parse_time_bound(value: &str, end_of_day: bool) -> GchatResult<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Ok(instant.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        GchatError::invalid_query(format!(
            "invalid date '{value}' (expected YYYY-MM-DD or RFC 3339)"
        ))
    })?;

    let date = if end_of_day {
        date.succ_opt()
            .ok_or_else(|| GchatError::invalid_query(format!("date out of range: {value}")))?
    } else {
        date
    };

    date.and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .ok_or_else(|| GchatError::invalid_query(format!("date out of range: {value}")))
}
