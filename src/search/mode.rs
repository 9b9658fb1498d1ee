//! Modos de busca e normalização do modo pedido.

use serde::{Deserialize, Serialize};

use crate::types::config::SearchModesConfig;

/// Modos de busca suportados.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Substring sem distinção de caixa, com expansão de contrações.
    Exact,
    /// Expressão regular sem distinção de caixa.
    Regex,
    /// União ponderada de exact e regex.
    Hybrid,
}

impl SearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::Exact => "exact",
            SearchMode::Regex => "regex",
            SearchMode::Hybrid => "hybrid",
        }
    }
}

impl std::fmt::Display for SearchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resultado do parse de uma string de modo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ModeTag {
    Known(SearchMode),
    /// Modo semântico: reconhecido, mas não implementado.
    Semantic,
    Unknown,
}

impl ModeTag {
    pub(crate) fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "exact" => ModeTag::Known(SearchMode::Exact),
            "regex" => ModeTag::Known(SearchMode::Regex),
            "hybrid" => ModeTag::Known(SearchMode::Hybrid),
            "semantic" => ModeTag::Semantic,
            _ => ModeTag::Unknown,
        }
    }
}

/// Por que o modo pedido não foi usado.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// Modo reconhecido mas sem implementação (semantic).
    Unsupported,
    /// String de modo desconhecida.
    Unknown,
    /// Modo desabilitado na configuração.
    Disabled,
}

/// Indicador explícito de que a busca rodou num modo diferente do pedido.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModeFallback {
    /// Modo pedido, como recebido.
    pub requested: String,
    pub reason: FallbackReason,
}

/// Verdadeiro se o modo pode rodar com esta configuração.
pub(crate) fn is_enabled(mode: SearchMode, modes: &SearchModesConfig) -> bool {
    match mode {
        SearchMode::Exact => modes.exact.enabled,
        SearchMode::Regex => modes.regex.enabled,
        SearchMode::Hybrid => modes.hybrid.enabled && (modes.exact.enabled || modes.regex.enabled),
    }
}

/// Resolve o modo padrão configurado para um modo executável.
///
/// `semantic` e valores desconhecidos viram `Exact`; um padrão desabilitado
/// cai para o primeiro modo base habilitado.
pub(crate) fn resolve_default(configured: &str, modes: &SearchModesConfig) -> SearchMode {
    let mode = match ModeTag::parse(configured) {
        ModeTag::Known(mode) => mode,
        ModeTag::Semantic => {
            tracing::warn!("Semantic default mode is not supported, using exact");
            SearchMode::Exact
        }
        ModeTag::Unknown => {
            tracing::warn!(default_mode = configured, "Unknown default mode, using exact");
            SearchMode::Exact
        }
    };

    if is_enabled(mode, modes) {
        mode
    } else if modes.exact.enabled {
        SearchMode::Exact
    } else {
        SearchMode::Regex
    }
}

/// Mapeia o modo pedido para um modo executável.
///
/// Nunca falha: qualquer desvio do pedido é devolvido como [`ModeFallback`].
pub(crate) fn normalize(
    requested: Option<&str>,
    default: SearchMode,
    modes: &SearchModesConfig,
) -> (SearchMode, Option<ModeFallback>) {
    let raw = match requested.map(str::trim) {
        Some(raw) if !raw.is_empty() => raw,
        _ => return (default, None),
    };

    let fallback = |reason| {
        Some(ModeFallback {
            requested: raw.to_string(),
            reason,
        })
    };

    match ModeTag::parse(raw) {
        ModeTag::Known(mode) if is_enabled(mode, modes) => (mode, None),
        ModeTag::Known(_) => (default, fallback(FallbackReason::Disabled)),
        ModeTag::Semantic if modes.exact.enabled => {
            (SearchMode::Exact, fallback(FallbackReason::Unsupported))
        }
        ModeTag::Semantic => (default, fallback(FallbackReason::Unsupported)),
        ModeTag::Unknown => (default, fallback(FallbackReason::Unknown)),
    }
}
