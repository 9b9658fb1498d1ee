//! Expansão de contrações para a busca exata.
//!
//! Cada entrada da tabela liga uma contração ("don't") às suas formas
//! equivalentes ("do not", ...). A forma sem apóstrofo ("dont") é derivada
//! automaticamente, e as formas expandidas apontam de volta para a contração.

use std::collections::BTreeMap;

/// Apóstrofos tipográficos aceitos como `'`.
const APOSTROPHES: [char; 3] = ['\u{2018}', '\u{2019}', '\u{02BC}'];

/// Normaliza texto para comparação: apóstrofos ASCII e minúsculas.
pub fn normalize_text(text: &str) -> String {
    text.chars()
        .map(|c| if APOSTROPHES.contains(&c) { '\'' } else { c })
        .collect::<String>()
        .to_lowercase()
}

/// Tabela de aliases já normalizada.
#[derive(Debug, Clone, Default)]
pub struct ContractionTable {
    aliases: BTreeMap<String, Vec<String>>,
}

impl ContractionTable {
    /// Constrói a tabela a partir do mapeamento configurado.
    pub fn new(table: &BTreeMap<String, Vec<String>>) -> Self {
        let mut aliases: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for (contraction, variants) in table {
            let contraction = normalize_text(contraction.trim());
            if contraction.is_empty() {
                continue;
            }
            let bare = contraction.replace('\'', "");

            let mut forms = vec![contraction.clone()];
            if bare != contraction {
                forms.push(bare.clone());
            }
            for variant in variants {
                let variant = normalize_text(variant.trim());
                if !variant.is_empty() && !forms.contains(&variant) {
                    forms.push(variant);
                }
            }

            for form in [&contraction, &bare] {
                let targets = forms.iter().filter(|f| *f != form).cloned();
                push_unique(aliases.entry(form.clone()).or_default(), targets);
            }

            // Formas expandidas ("do not", "cannot") voltam para a contração
            for expanded in forms.iter().skip(1).filter(|f| !f.contains('\'') && **f != bare) {
                let back = [contraction.clone(), bare.clone()];
                push_unique(
                    aliases.entry(expanded.clone()).or_default(),
                    back.into_iter().filter(|b| b != expanded),
                );
            }
        }

        Self { aliases }
    }

    /// Número de formas reconhecidas.
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Formas alternativas de uma consulta já normalizada.
    ///
    /// O primeiro elemento é sempre a própria consulta. Cada alternativa troca
    /// uma forma reconhecida (como palavra inteira) por um dos seus aliases.
    pub fn alternatives(&self, query: &str) -> Vec<String> {
        let mut alternatives = vec![query.to_string()];

        for (form, targets) in &self.aliases {
            if !contains_word(query, form) {
                continue;
            }
            for target in targets {
                let alternative = replace_word(query, form, target);
                if !alternatives.contains(&alternative) {
                    alternatives.push(alternative);
                }
            }
        }

        alternatives
    }
}

fn push_unique(list: &mut Vec<String>, items: impl IntoIterator<Item = String>) {
    for item in items {
        if !list.contains(&item) {
            list.push(item);
        }
    }
}

/// Posições onde `needle` aparece como palavra inteira em `haystack`.
fn word_matches<'a>(haystack: &'a str, needle: &'a str) -> impl Iterator<Item = usize> + 'a {
    haystack.match_indices(needle).filter_map(move |(start, _)| {
        let end = start + needle.len();
        let before = haystack[..start].chars().next_back();
        let after = haystack[end..].chars().next();
        let bounded = |c: Option<char>| c.map_or(true, |c| !c.is_alphanumeric());
        (bounded(before) && bounded(after)).then_some(start)
    })
}

fn contains_word(haystack: &str, needle: &str) -> bool {
    word_matches(haystack, needle).next().is_some()
}

fn replace_word(haystack: &str, needle: &str, replacement: &str) -> String {
    let mut result = String::with_capacity(haystack.len());
    let mut last = 0;
    for start in word_matches(haystack, needle) {
        result.push_str(&haystack[last..start]);
        result.push_str(replacement);
        last = start + needle.len();
    }
    result.push_str(&haystack[last..]);
    result
}
