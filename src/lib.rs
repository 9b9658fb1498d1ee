//! # gchat-mcp
//!
//! Servidor MCP (Model Context Protocol) para o Google Chat.
//!
//! Expõe a Google Chat REST API como ferramentas MCP: enviar, responder,
//! listar, editar, apagar e buscar mensagens, além de gerenciar espaços e
//! listar membros.
//!
//! ## Módulos
//!
//! - [`cli`] - Interface de linha de comando
//! - [`mcp`] - Servidor MCP e ferramentas `gchat_*`
//! - [`chat`] - Cliente da Google Chat API
//! - [`auth`] - OAuth2 e persistência do token
//! - [`search`] - Busca exact / regex / hybrid sobre mensagens
//! - [`types`] - Tipos compartilhados

pub mod auth;
pub mod chat;
#[cfg(feature = "cli")]
pub mod cli;
pub mod mcp;
pub mod search;
pub mod types;

pub use types::config::Config;
pub use types::errors::{GchatError, GchatResult};
