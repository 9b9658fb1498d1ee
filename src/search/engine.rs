//! Motor de busca sobre mensagens já carregadas.

use std::collections::BTreeMap;

use regex::{Regex, RegexBuilder};
use serde::Serialize;

use super::contractions::{normalize_text, ContractionTable};
use super::mode::{self, ModeFallback, SearchMode};
use crate::types::chat::Message;
use crate::types::config::SearchConfig;
use crate::{GchatError, GchatResult};

/// Uma mensagem que casou com a consulta.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit<'a> {
    /// Score ponderado (peso do modo, ou soma dos pesos no modo hybrid).
    pub score: f64,

    /// Posição da mensagem na entrada.
    pub index: usize,

    /// Quais estratégias casaram.
    pub matched_by: Vec<SearchMode>,

    pub message: &'a Message,
}

/// Resultado de uma busca.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome<'a> {
    /// Modo efetivamente usado.
    pub mode: SearchMode,

    /// Preenchido quando o modo pedido não pôde ser usado.
    pub fallback: Option<ModeFallback>,

    pub hits: Vec<SearchHit<'a>>,
}

impl SearchOutcome<'_> {
    pub fn fell_back(&self) -> bool {
        self.fallback.is_some()
    }

    /// Mensagens encontradas, na ordem do resultado.
    pub fn messages(&self) -> Vec<&Message> {
        self.hits.iter().map(|hit| hit.message).collect()
    }
}

/// Motor de busca configurado uma única vez na inicialização.
#[derive(Debug, Clone)]
pub struct SearchEngine {
    config: SearchConfig,
    default_mode: SearchMode,
    contractions: ContractionTable,
}

impl SearchEngine {
    /// Cria o motor a partir da configuração de busca.
    pub fn new(config: SearchConfig) -> Self {
        let default_mode = mode::resolve_default(&config.default_mode, &config.modes);
        let contractions = ContractionTable::new(&config.contractions);

        tracing::debug!(
            default_mode = %default_mode,
            contractions = contractions.len(),
            "Search engine initialized"
        );

        Self {
            config,
            default_mode,
            contractions,
        }
    }

    /// Modo usado quando a chamada não escolhe um.
    pub fn default_mode(&self) -> SearchMode {
        self.default_mode
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Normaliza o modo pedido, registrando qualquer fallback.
    pub fn resolve_mode(&self, requested: Option<&str>) -> (SearchMode, Option<ModeFallback>) {
        let (mode, fallback) = mode::normalize(requested, self.default_mode, &self.config.modes);

        if let Some(fallback) = &fallback {
            tracing::warn!(
                requested = %fallback.requested,
                reason = ?fallback.reason,
                using = %mode,
                "Search mode fallback"
            );
        }

        (mode, fallback)
    }

    /// Busca `query` em `messages` usando o modo pedido (ou o padrão).
    ///
    /// Só falha com [`GchatError::InvalidQuery`] quando o modo usado compila
    /// a consulta como regex e ela é inválida.
    pub fn search<'a>(
        &self,
        query: &str,
        messages: &'a [Message],
        mode: Option<&str>,
    ) -> GchatResult<SearchOutcome<'a>> {
        let (mode, fallback) = self.resolve_mode(mode);

        tracing::info!(
            query = query,
            mode = %mode,
            messages = messages.len(),
            "Starting search"
        );

        let hits = if query.trim().is_empty() || messages.is_empty() {
            Vec::new()
        } else {
            match mode {
                SearchMode::Exact => self.single_mode_hits(
                    messages,
                    SearchMode::Exact,
                    self.exact_matches(query, messages),
                ),
                SearchMode::Regex => self.single_mode_hits(
                    messages,
                    SearchMode::Regex,
                    self.regex_matches(query, messages)?,
                ),
                SearchMode::Hybrid => self.hybrid_hits(query, messages)?,
            }
        };

        tracing::info!(mode = %mode, matches = hits.len(), "Search finished");

        Ok(SearchOutcome {
            mode,
            fallback,
            hits,
        })
    }

    /// Índices das mensagens que contêm a consulta (ou uma forma alternativa).
    pub fn exact_matches(&self, query: &str, messages: &[Message]) -> Vec<usize> {
        let normalized = normalize_text(query.trim());
        if normalized.is_empty() {
            return Vec::new();
        }

        let alternatives = self.contractions.alternatives(&normalized);
        tracing::debug!(?alternatives, "Exact search alternatives");

        messages
            .iter()
            .enumerate()
            .filter(|(_, message)| {
                let text = normalize_text(&message.text);
                alternatives.iter().any(|alt| text.contains(alt.as_str()))
            })
            .map(|(index, _)| index)
            .collect()
    }

    /// Índices das mensagens em que o padrão encontra ao menos uma ocorrência.
    pub fn regex_matches(&self, query: &str, messages: &[Message]) -> GchatResult<Vec<usize>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let pattern = self.compile(query)?;

        Ok(messages
            .iter()
            .enumerate()
            .filter(|(_, message)| pattern.is_match(&message.text))
            .map(|(index, _)| index)
            .collect())
    }

    fn compile(&self, query: &str) -> GchatResult<Regex> {
        let options = &self.config.modes.regex;

        let length = query.chars().count();
        if length > options.max_pattern_length {
            return Err(GchatError::invalid_query(format!(
                "regex pattern is {length} characters long (limit {})",
                options.max_pattern_length
            )));
        }

        RegexBuilder::new(query)
            .case_insensitive(options.ignore_case)
            .dot_matches_new_line(options.dot_all)
            .build()
            .map_err(|e| {
                tracing::warn!(pattern = query, error = %e, "Invalid regex pattern");
                GchatError::invalid_query(format!("invalid regex '{query}': {e}"))
            })
    }

    fn single_mode_hits<'a>(
        &self,
        messages: &'a [Message],
        mode: SearchMode,
        indices: Vec<usize>,
    ) -> Vec<SearchHit<'a>> {
        let score = self.weight(mode);
        indices
            .into_iter()
            .map(|index| SearchHit {
                score,
                index,
                matched_by: vec![mode],
                message: &messages[index],
            })
            .collect()
    }

    /// União das estratégias habilitadas, ordenada por score e depois pela
    /// ordem original.
    fn hybrid_hits<'a>(
        &self,
        query: &str,
        messages: &'a [Message],
    ) -> GchatResult<Vec<SearchHit<'a>>> {
        let modes = &self.config.modes;
        let mut scored: BTreeMap<usize, (f64, Vec<SearchMode>)> = BTreeMap::new();

        if modes.exact.enabled {
            let exact = self.exact_matches(query, messages);
            tracing::debug!(matches = exact.len(), "Hybrid: exact component");
            for index in exact {
                let entry = scored.entry(index).or_insert((0.0, Vec::new()));
                entry.0 += modes.exact.weight;
                entry.1.push(SearchMode::Exact);
            }
        }

        if modes.regex.enabled {
            let regex = self.regex_matches(query, messages)?;
            tracing::debug!(matches = regex.len(), "Hybrid: regex component");
            for index in regex {
                let entry = scored.entry(index).or_insert((0.0, Vec::new()));
                entry.0 += modes.regex.weight;
                entry.1.push(SearchMode::Regex);
            }
        }

        let mut hits: Vec<SearchHit<'a>> = scored
            .into_iter()
            .map(|(index, (score, matched_by))| SearchHit {
                score,
                index,
                matched_by,
                message: &messages[index],
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.index.cmp(&b.index)));
        Ok(hits)
    }

    fn weight(&self, mode: SearchMode) -> f64 {
        match mode {
            SearchMode::Exact => self.config.modes.exact.weight,
            SearchMode::Regex => self.config.modes.regex.weight,
            SearchMode::Hybrid => self.config.modes.exact.weight + self.config.modes.regex.weight,
        }
    }
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new(SearchConfig::default())
    }
}
