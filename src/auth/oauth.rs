//! Fluxo OAuth2 do Google via crate `oauth2`.
//!
//! - [`OAuthTokenProvider`] lê o token persistido e o renova com o refresh
//!   token quando vence.
//! - [`AuthorizationFlow`] executa o fluxo authorization code com PKCE usado
//!   pelo comando `gchat-mcp auth`.

use std::path::PathBuf;

use async_trait::async_trait;
use oauth2::basic::{BasicClient, BasicTokenResponse};
use oauth2::url::Url;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, RefreshToken, Scope, TokenResponse, TokenUrl,
};
use tokio::sync::Mutex;

use super::credentials::ClientCredentials;
use super::token_store::{StoredToken, TokenStore};
use super::TokenProvider;
use crate::{GchatError, GchatResult};

type GoogleClient =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

fn build_client(credentials: &ClientCredentials) -> GchatResult<GoogleClient> {
    let auth_url = AuthUrl::new(credentials.auth_uri.clone())
        .map_err(|e| GchatError::auth(format!("invalid auth_uri: {e}")))?;
    let token_url = TokenUrl::new(credentials.token_uri.clone())
        .map_err(|e| GchatError::auth(format!("invalid token_uri: {e}")))?;
    let redirect_url = RedirectUrl::new(credentials.redirect_uri().to_string())
        .map_err(|e| GchatError::auth(format!("invalid redirect uri: {e}")))?;

    Ok(BasicClient::new(ClientId::new(credentials.client_id.clone()))
        .set_client_secret(ClientSecret::new(credentials.client_secret.clone()))
        .set_auth_uri(auth_url)
        .set_token_uri(token_url)
        .set_redirect_uri(redirect_url))
}

/// Cliente HTTP para o endpoint de token. Redirects desligados, como
/// recomendado pelo `oauth2`.
fn token_http_client() -> GchatResult<reqwest::Client> {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .map_err(|e| GchatError::auth(format!("failed to build HTTP client: {e}")))
}

/// Converte a resposta do endpoint de token.
///
/// O Google só devolve `refresh_token` na primeira autorização; numa
/// renovação, o refresh token anterior é mantido.
fn to_stored(
    response: &BasicTokenResponse,
    previous_refresh: Option<String>,
    requested_scopes: &[String],
) -> StoredToken {
    let now = chrono::Utc::now().timestamp();

    StoredToken {
        access_token: response.access_token().secret().clone(),
        refresh_token: response
            .refresh_token()
            .map(|t| t.secret().clone())
            .or(previous_refresh),
        token_type: "Bearer".to_string(),
        expires_at: response
            .expires_in()
            .and_then(|d| i64::try_from(d.as_secs()).ok())
            .map(|secs| now.saturating_add(secs)),
        scopes: response
            .scopes()
            .map(|scopes| scopes.iter().map(|s| s.to_string()).collect())
            .unwrap_or_else(|| requested_scopes.to_vec()),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Provider com renovação automática
// ═══════════════════════════════════════════════════════════════════════════

/// Provider baseado no token persistido pelo comando `auth`.
///
/// As credenciais do cliente só são lidas quando uma renovação é necessária.
pub struct OAuthTokenProvider {
    credentials_path: PathBuf,
    store: TokenStore,
    cached: Mutex<Option<StoredToken>>,
}

impl OAuthTokenProvider {
    pub fn new(credentials_path: impl Into<PathBuf>, store: TokenStore) -> Self {
        Self {
            credentials_path: credentials_path.into(),
            store,
            cached: Mutex::new(None),
        }
    }

    async fn refresh(&self, current: &StoredToken) -> GchatResult<StoredToken> {
        let refresh_token = current.refresh_token.clone().ok_or_else(|| {
            GchatError::auth(
                "access token expired and no refresh token is stored; run `gchat-mcp auth`",
            )
        })?;

        let credentials = ClientCredentials::load(&self.credentials_path)?;
        let client = build_client(&credentials)?;
        let http = token_http_client()?;

        tracing::info!("Refreshing OAuth access token");

        let response = client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.clone()))
            .request_async(&http)
            .await
            .map_err(|e| GchatError::auth(format!("token refresh failed: {e}")))?;

        let token = to_stored(&response, Some(refresh_token), &current.scopes);

        // O token renovado vale mesmo que não possa ser persistido
        if let Err(e) = self.store.save(&token) {
            tracing::warn!(
                path = %self.store.path().display(),
                error = %e,
                "Failed to persist refreshed token"
            );
        }
        Ok(token)
    }
}

#[async_trait]
impl TokenProvider for OAuthTokenProvider {
    async fn access_token(&self) -> GchatResult<String> {
        let mut cached = self.cached.lock().await;

        if cached.is_none() {
            *cached = self.store.load()?;
        }

        let current = cached.as_ref().ok_or_else(|| {
            GchatError::auth(format!(
                "no stored token at {}; run `gchat-mcp auth`",
                self.store.path().display()
            ))
        })?;

        if !current.is_expired() {
            return Ok(current.access_token.clone());
        }

        let refreshed = self.refresh(current).await?;
        let access_token = refreshed.access_token.clone();
        *cached = Some(refreshed);
        Ok(access_token)
    }

    async fn invalidate(&self) {
        if let Some(token) = self.cached.lock().await.as_mut() {
            tracing::debug!("Access token rejected, forcing refresh on next call");
            token.expire();
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Fluxo de autorização
// ═══════════════════════════════════════════════════════════════════════════

/// Uma autorização em andamento: URL a abrir e segredos para a troca do código.
pub struct AuthorizationFlow {
    client: GoogleClient,
    scopes: Vec<String>,
    authorize_url: Url,
    csrf_state: CsrfToken,
    pkce_verifier: PkceCodeVerifier,
}

impl AuthorizationFlow {
    /// Prepara a URL de consentimento (acesso offline, PKCE S256).
    pub fn start(credentials: &ClientCredentials, scopes: &[String]) -> GchatResult<Self> {
        let client = build_client(credentials)?;
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let (authorize_url, csrf_state) = client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(scopes.iter().cloned().map(Scope::new))
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent")
            .set_pkce_challenge(pkce_challenge)
            .url();

        Ok(Self {
            client,
            scopes: scopes.to_vec(),
            authorize_url,
            csrf_state,
            pkce_verifier,
        })
    }

    pub fn authorize_url(&self) -> &Url {
        &self.authorize_url
    }

    /// Troca o código pelo token.
    ///
    /// `input` pode ser o código puro ou a URL completa do redirecionamento;
    /// no segundo caso o `state` é conferido.
    pub async fn finish(self, input: &str) -> GchatResult<StoredToken> {
        let code = extract_code(input, self.csrf_state.secret())?;
        let http = token_http_client()?;

        let response = self
            .client
            .exchange_code(AuthorizationCode::new(code))
            .set_pkce_verifier(self.pkce_verifier)
            .request_async(&http)
            .await
            .map_err(|e| GchatError::auth(format!("authorization code exchange failed: {e}")))?;

        Ok(to_stored(&response, None, &self.scopes))
    }
}

/// Extrai o código de autorização do texto colado pelo usuário.
fn extract_code(input: &str, expected_state: &str) -> GchatResult<String> {
    let input = input.trim();
    if input.is_empty() {
        return Err(GchatError::auth("authorization code must not be empty"));
    }

    if !input.starts_with("http://") && !input.starts_with("https://") {
        return Ok(input.to_string());
    }

    let url =
        Url::parse(input).map_err(|e| GchatError::auth(format!("invalid redirect URL: {e}")))?;

    let mut code = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => {
                return Err(GchatError::auth(format!("authorization denied: {value}")));
            }
            _ => {}
        }
    }

    if state.as_deref() != Some(expected_state) {
        return Err(GchatError::auth("state mismatch in redirect URL"));
    }

    code.ok_or_else(|| GchatError::auth("redirect URL has no 'code' parameter"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> ClientCredentials {
        ClientCredentials::from_json(
            r#"{"installed": {"client_id": "id", "client_secret": "secret",
                "redirect_uris": ["http://localhost:8085"]}}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_authorize_url_parameters() {
        let scopes = vec!["https://www.googleapis.com/auth/chat.messages".to_string()];
        let flow = AuthorizationFlow::start(&credentials(), &scopes).unwrap();

        let pairs: Vec<(String, String)> = flow
            .authorize_url()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        let get = |key: &str| pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str());

        assert_eq!(get("client_id"), Some("id"));
        assert_eq!(get("access_type"), Some("offline"));
        assert_eq!(get("code_challenge_method"), Some("S256"));
        assert_eq!(get("redirect_uri"), Some("http://localhost:8085"));
        assert_eq!(get("scope"), Some(scopes[0].as_str()));
    }

    #[test]
    fn test_extract_code_plain() {
        assert_eq!(extract_code("  4/abc  ", "state").unwrap(), "4/abc");
        assert!(extract_code("", "state").is_err());
    }

    #[test]
    fn test_extract_code_from_redirect() {
        let url = "http://localhost:8085/?state=xyz&code=4%2Fabc&scope=chat";
        assert_eq!(extract_code(url, "xyz").unwrap(), "4/abc");
        assert!(extract_code(url, "other").is_err());
        assert!(extract_code("http://localhost:8085/?error=access_denied", "xyz").is_err());
    }

    #[tokio::test]
    async fn test_provider_without_token_is_auth_error() {
        let dir = tempfile::tempdir().unwrap();
        let provider = OAuthTokenProvider::new(
            dir.path().join("credentials.json"),
            TokenStore::new(dir.path().join("token.json")),
        );

        let err = provider.access_token().await.unwrap_err();
        assert!(matches!(err, GchatError::Auth(_)));
    }

    #[tokio::test]
    async fn test_provider_returns_valid_stored_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        store
            .save(&StoredToken {
                access_token: "ya29.valid".to_string(),
                refresh_token: None,
                token_type: "Bearer".to_string(),
                expires_at: Some(chrono::Utc::now().timestamp() + 3600),
                scopes: vec![],
            })
            .unwrap();

        let provider = OAuthTokenProvider::new(dir.path().join("credentials.json"), store);
        assert_eq!(provider.access_token().await.unwrap(), "ya29.valid");

        // Sem refresh token, a invalidação vira erro de autenticação
        provider.invalidate().await;
        assert!(matches!(
            provider.access_token().await,
            Err(GchatError::Auth(_))
        ));
    }

    #[tokio::test]
    async fn test_refresh_survives_store_failure() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "ya29.fresh",
                "token_type": "Bearer",
                "expires_in": 3599
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let credentials_path = dir.path().join("credentials.json");
        let credentials = serde_json::json!({
            "installed": {
                "client_id": "id",
                "client_secret": "secret",
                "token_uri": format!("{}/token", server.uri()),
                "redirect_uris": ["http://localhost:8085"]
            }
        });
        std::fs::write(&credentials_path, credentials.to_string()).unwrap();

        let token_path = dir.path().join("token.json");
        let store = TokenStore::new(token_path.clone());
        store
            .save(&StoredToken {
                access_token: "ya29.stale".to_string(),
                refresh_token: Some("1//refresh".to_string()),
                token_type: "Bearer".to_string(),
                expires_at: Some(chrono::Utc::now().timestamp() - 10),
                scopes: vec![],
            })
            .unwrap();

        // Um diretório no lugar do arquivo temporário faz a gravação falhar
        std::fs::create_dir(token_path.with_extension("json.tmp")).unwrap();

        let provider = OAuthTokenProvider::new(credentials_path, store);
        assert_eq!(provider.access_token().await.unwrap(), "ya29.fresh");
        assert_eq!(provider.access_token().await.unwrap(), "ya29.fresh");
    }
}
