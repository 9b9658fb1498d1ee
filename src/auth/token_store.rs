//! Persistência do token OAuth.
//!
//! O token fica num único arquivo JSON com permissão 0600. A escrita passa
//! por um arquivo temporário e `rename`, então um crash nunca deixa o token
//! pela metade.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{GchatError, GchatResult};

/// Margem antes da expiração real em que o token já é tratado como vencido.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Token OAuth persistido.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,

    #[serde(default)]
    pub refresh_token: Option<String>,

    #[serde(default = "default_token_type")]
    pub token_type: String,

    /// Expiração em segundos Unix.
    #[serde(default)]
    pub expires_at: Option<i64>,

    #[serde(default)]
    pub scopes: Vec<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl StoredToken {
    /// Verdadeiro se o token vence em menos de um minuto.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(chrono::Utc::now().timestamp())
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => now >= expires_at - EXPIRY_MARGIN_SECS,
            None => false,
        }
    }

    /// Força a renovação na próxima leitura.
    pub fn expire(&mut self) {
        self.expires_at = Some(0);
    }
}

/// Arquivo do token.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Lê o token, se existir.
    pub fn load(&self) -> GchatResult<Option<StoredToken>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&self.path)?;
        let token: StoredToken = serde_json::from_str(&json).map_err(|e| {
            GchatError::auth(format!(
                "token file {} is corrupt: {e}",
                self.path.display()
            ))
        })?;

        tracing::debug!(path = %self.path.display(), "Loaded token");
        Ok(Some(token))
    }

    /// Grava o token com permissão 0600.
    pub fn save(&self, token: &StoredToken) -> GchatResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
                set_permissions(parent, 0o700)?;
            }
        }

        let json = serde_json::to_string_pretty(token)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json)?;
        set_permissions(&tmp_path, 0o600)?;
        fs::rename(&tmp_path, &self.path)?;

        tracing::debug!(path = %self.path.display(), "Stored token");
        Ok(())
    }

    /// Remove o token. Retorna `false` se não havia arquivo.
    pub fn delete(&self) -> GchatResult<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path)?;
        Ok(true)
    }
}

fn set_permissions(path: &Path, mode: u32) -> GchatResult<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    }

    #[cfg(not(unix))]
    {
        let _ = (path, mode);
    }

    Ok(())
}
