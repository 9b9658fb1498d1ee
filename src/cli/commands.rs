//! Implementação dos comandos CLI do gchat-mcp.

use std::path::{Path, PathBuf};

use crate::auth::{AuthorizationFlow, ClientCredentials, TokenStore, ACCESS_TOKEN_ENV};
use crate::mcp::{McpServer, SearchMessagesParams, ToolHandler};
use crate::types::config::Config;
use crate::GchatResult;

/// Creates a default gchat.toml in the target directory.
pub async fn init(path: Option<PathBuf>, force: bool) -> GchatResult<()> {
    let target_dir = path.unwrap_or_else(|| PathBuf::from("."));

    if !target_dir.exists() {
        std::fs::create_dir_all(&target_dir)?;
        tracing::info!("Directory created: {}", target_dir.display());
    }

    let config_path = target_dir.join("gchat.toml");

    if config_path.exists() && !force {
        println!("Configuration already exists at: {}", config_path.display());
        println!("Use --force to overwrite it.");
        return Ok(());
    }

    let config = Config::default_config();
    config.save(&config_path)?;

    println!("Configuration created at: {}", config_path.display());
    println!();
    println!("Next steps:");
    println!("  1. Download an OAuth client (Desktop app) from the Google Cloud Console");
    println!(
        "     and save it as {}",
        config.auth.credentials_path.display()
    );
    println!("  2. Authorize access: gchat-mcp auth");
    println!("  3. Add to your MCP client: gchat-mcp serve");

    Ok(())
}

/// Runs the OAuth authorization-code flow and stores the token.
pub async fn auth(config: &Config, logout: bool) -> GchatResult<()> {
    use super::interactive::{confirm_replace_token, prompt_authorization_code};

    let store = TokenStore::new(config.auth.token_path.clone());

    if logout {
        if store.delete()? {
            println!("Token removed: {}", store.path().display());
        } else {
            println!("No token stored at {}", store.path().display());
        }
        return Ok(());
    }

    let credentials = ClientCredentials::load(&config.auth.credentials_path)?;

    if store.exists() && !confirm_replace_token()? {
        println!("Keeping the existing token.");
        return Ok(());
    }

    let flow = AuthorizationFlow::start(&credentials, &config.auth.scopes)?;

    println!("Open this URL in your browser and grant access:");
    println!();
    println!("  {}", flow.authorize_url());
    println!();
    println!("After approving, the browser is redirected to {}.", credentials.redirect_uri());
    println!("The page may fail to load; copy its URL (or the `code` parameter).");
    println!();

    let input = prompt_authorization_code()?;
    let token = flow.finish(&input).await?;
    store.save(&token)?;

    tracing::info!(path = %store.path().display(), "Authorization complete");
    println!("✓ Token stored at {}", store.path().display());
    if token.refresh_token.is_none() {
        println!("⚠ Google returned no refresh token; run `gchat-mcp auth` again when it expires.");
    }

    Ok(())
}

/// Starts the MCP server on stdio.
pub async fn serve(config: &Config) -> GchatResult<()> {
    tracing::debug!(
        base_url = %config.chat.base_url,
        timeout_secs = config.general.timeout_secs,
        default_mode = %config.search.default_mode,
        "Configuration loaded"
    );

    tracing::info!("Starting gchat-mcp MCP server on stdio");
    let mut server = McpServer::stdio(config)?;
    server.run().await
}

/// Shows credential and token state.
pub async fn status(config: &Config, config_path: &Path) -> GchatResult<()> {
    println!("gchat-mcp status\n");

    if config_path.exists() {
        println!("  ✓ config: {}", config_path.display());
    } else {
        println!("  ○ config: {} (not found, using defaults)", config_path.display());
    }

    let env_token = std::env::var(ACCESS_TOKEN_ENV)
        .map(|t| !t.trim().is_empty())
        .unwrap_or(false);
    if env_token {
        println!("  ✓ {ACCESS_TOKEN_ENV} is set (static token, no refresh)");
    }

    match ClientCredentials::load(&config.auth.credentials_path) {
        Ok(credentials) => println!(
            "  ✓ credentials: {} (client {})",
            config.auth.credentials_path.display(),
            credentials.client_id
        ),
        Err(e) => println!("  ✗ credentials: {e}"),
    }

    let store = TokenStore::new(config.auth.token_path.clone());
    match store.load() {
        Ok(Some(token)) => {
            let state = if !token.is_expired() {
                "valid"
            } else if token.refresh_token.is_some() {
                "expired, will refresh"
            } else {
                "expired, run `gchat-mcp auth`"
            };
            println!("  ✓ token: {} ({state})", store.path().display());
        }
        Ok(None) => println!(
            "  ✗ token: none at {} (run `gchat-mcp auth`)",
            store.path().display()
        ),
        Err(e) => println!("  ✗ token: {e}"),
    }

    println!();
    println!("  API: {}", config.chat.base_url);
    println!("  default search mode: {}", config.search.default_mode);

    Ok(())
}

/// One-off search against a space, printed as JSON.
pub async fn search(
    config: &Config,
    space: String,
    query: String,
    mode: Option<String>,
    limit: Option<usize>,
) -> GchatResult<()> {
    let handler = ToolHandler::new(config)?;
    let result = handler
        .search_messages(SearchMessagesParams {
            space,
            query,
            mode,
            limit,
            ..Default::default()
        })
        .await?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Shows version.
pub fn version() {
    println!("gchat-mcp {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("MCP server for Google Chat");
}
