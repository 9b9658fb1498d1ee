//! Tipos de erro do gchat-mcp.

use thiserror::Error;

/// Tipo de resultado padrão do gchat-mcp.
pub type GchatResult<T> = Result<T, GchatError>;

/// Erros possíveis no gchat-mcp.
#[derive(Error, Debug)]
pub enum GchatError {
    /// Falha ao obter ou renovar o token, ou a API recusou as credenciais (401/403).
    #[error("Erro de autenticação: {0}")]
    Auth(String),

    /// Recurso remoto inexistente (HTTP 404).
    #[error("Recurso não encontrado: {0}")]
    NotFound(String),

    /// A API respondeu HTTP 429. Nenhum retry é feito internamente.
    #[error("Limite de requisições atingido: {message}")]
    RateLimited {
        message: String,
        /// Valor do header `Retry-After`, quando presente.
        retry_after_secs: Option<u64>,
    },

    /// Entrada inválida: regex malformada ou campo obrigatório vazio.
    #[error("Consulta inválida: {0}")]
    InvalidQuery(String),

    /// Qualquer outra falha da API ou do transporte HTTP.
    #[error("Erro remoto{}: {message}", status_suffix(.status))]
    Remote { status: Option<u16>, message: String },

    #[error("Erro de configuração: {0}")]
    Config(String),

    #[error("Erro de IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("Erro ao parsear TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Erro ao serializar TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Erro de JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Erro no servidor MCP: {0}")]
    McpServer(String),

    #[error("{0}")]
    Other(String),
}

impl GchatError {
    /// Cria um erro genérico.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }

    /// Cria um erro de configuração.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Cria um erro de autenticação.
    pub fn auth<S: Into<String>>(msg: S) -> Self {
        Self::Auth(msg.into())
    }

    /// Cria um erro de entrada inválida.
    pub fn invalid_query<S: Into<String>>(msg: S) -> Self {
        Self::InvalidQuery(msg.into())
    }

    /// Cria um erro remoto.
    pub fn remote<S: Into<String>>(status: Option<u16>, msg: S) -> Self {
        Self::Remote {
            status,
            message: msg.into(),
        }
    }

    /// Código estável exposto aos clientes MCP.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Auth(_) => "AUTH_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::InvalidQuery(_) => "INVALID_QUERY",
            Self::Remote { .. } => "REMOTE_ERROR",
            _ => "INTERNAL_ERROR",
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl From<reqwest::Error> for GchatError {
    fn from(err: reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16());
        let message = if err.is_timeout() {
            format!("timeout: {err}")
        } else {
            err.to_string()
        };
        Self::Remote { status, message }
    }
}
