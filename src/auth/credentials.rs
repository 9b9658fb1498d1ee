//! Descritor do cliente OAuth baixado do Google Cloud Console.

use std::path::Path;

use serde::Deserialize;

use crate::{GchatError, GchatResult};

/// Credenciais de um cliente OAuth ("Desktop app" ou "Web application").
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientCredentials {
    pub client_id: String,

    pub client_secret: String,

    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,

    #[serde(default = "default_token_uri")]
    pub token_uri: String,

    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

fn default_auth_uri() -> String {
    "https://accounts.google.com/o/oauth2/auth".to_string()
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// O arquivo embrulha as credenciais em `installed` ou `web`.
#[derive(Debug, Deserialize)]
struct CredentialsFile {
    installed: Option<ClientCredentials>,
    web: Option<ClientCredentials>,
}

impl ClientCredentials {
    /// Lê o descritor JSON.
    pub fn load<P: AsRef<Path>>(path: P) -> GchatResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(GchatError::auth(format!(
                "OAuth credentials file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> GchatResult<Self> {
        let file: CredentialsFile = serde_json::from_str(content)
            .map_err(|e| GchatError::auth(format!("invalid OAuth credentials file: {e}")))?;

        file.installed.or(file.web).ok_or_else(|| {
            GchatError::auth("OAuth credentials file has neither 'installed' nor 'web' client")
        })
    }

    /// URI de redirecionamento usada no fluxo de autorização.
    pub fn redirect_uri(&self) -> &str {
        self.redirect_uris
            .first()
            .map(String::as_str)
            .unwrap_or("http://localhost")
    }
}
