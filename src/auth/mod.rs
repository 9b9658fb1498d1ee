//! Autenticação com a Google Chat API.
//!
//! O cliente HTTP depende apenas do trait [`TokenProvider`]. Em produção o
//! provider é o [`OAuthTokenProvider`], que lê o token gravado pelo comando
//! `gchat-mcp auth`. Com a variável `GCHAT_ACCESS_TOKEN` definida, um
//! [`StaticTokenProvider`] é usado no lugar.

mod credentials;
mod oauth;
mod token_store;

use std::sync::Arc;

use async_trait::async_trait;

use crate::types::config::AuthConfig;
use crate::GchatResult;

pub use credentials::ClientCredentials;
pub use oauth::{AuthorizationFlow, OAuthTokenProvider};
pub use token_store::{StoredToken, TokenStore};

/// Variável de ambiente com um access token pronto.
pub const ACCESS_TOKEN_ENV: &str = "GCHAT_ACCESS_TOKEN";

/// Fonte de access tokens para as chamadas à API.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Retorna um access token válido, renovando se necessário.
    async fn access_token(&self) -> GchatResult<String>;

    /// Chamado quando a API rejeita o token (HTTP 401).
    async fn invalidate(&self) {}
}

/// Token fixo, sem renovação.
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> GchatResult<String> {
        Ok(self.token.clone())
    }
}

/// Escolhe o provider a partir do ambiente e da configuração.
pub fn provider_from_config(config: &AuthConfig) -> Arc<dyn TokenProvider> {
    match std::env::var(ACCESS_TOKEN_ENV) {
        Ok(token) if !token.trim().is_empty() => {
            tracing::info!("Using access token from {}", ACCESS_TOKEN_ENV);
            Arc::new(StaticTokenProvider::new(token.trim()))
        }
        _ => Arc::new(OAuthTokenProvider::new(
            config.credentials_path.clone(),
            TokenStore::new(config.token_path.clone()),
        )),
    }
}
