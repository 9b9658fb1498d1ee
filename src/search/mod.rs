//! Busca textual sobre mensagens do Google Chat.
//!
//! Três modos:
//!
//! - `exact` - substring sem distinção de caixa, com expansão de contrações
//!   ("don't" ↔ "dont" ↔ "do not")
//! - `regex` - expressão regular sem distinção de caixa
//! - `hybrid` - união ponderada dos dois, ordenada por score
//!
//! O modo `semantic` não existe nesta implementação: pedidos por ele rodam
//! como `exact` e o resultado traz um [`ModeFallback`] explícito.
//!
//! ## Exemplo
//!
//! ```
//! use gchat_mcp::search::{SearchEngine, SearchMode};
//! use gchat_mcp::types::Message;
//!
//! let engine = SearchEngine::default();
//! let messages = vec![Message::new("spaces/A/messages/1", "I don't like Mondays")];
//!
//! let outcome = engine.search("do not like", &messages, Some("exact")).unwrap();
//! assert_eq!(outcome.mode, SearchMode::Exact);
//! assert_eq!(outcome.hits.len(), 1);
//! ```

mod contractions;
mod engine;
mod mode;

pub use contractions::{normalize_text, ContractionTable};
pub use engine::{SearchEngine, SearchHit, SearchOutcome};
pub use mode::{FallbackReason, ModeFallback, SearchMode};
