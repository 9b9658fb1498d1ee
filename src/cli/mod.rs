//! Interface de linha de comando do gchat-mcp.

pub mod commands;
pub mod interactive;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// gchat-mcp - servidor MCP para o Google Chat.
#[derive(Parser, Debug)]
#[command(name = "gchat-mcp")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Arquivo de configuração.
    #[arg(short, long, default_value = "gchat.toml")]
    pub config: PathBuf,

    /// Modo verbose.
    #[arg(short, long)]
    pub verbose: bool,

    /// Modo silencioso.
    #[arg(short, long)]
    pub quiet: bool,

    /// Comando a executar.
    #[command(subcommand)]
    pub command: Commands,
}

/// Comandos disponíveis.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Cria um gchat.toml com os valores padrão.
    Init {
        /// Diretório de destino (padrão: diretório atual).
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// Sobrescreve uma configuração existente.
        #[arg(long)]
        force: bool,
    },

    /// Autoriza o acesso à conta Google (OAuth).
    Auth {
        /// Remove o token salvo em vez de autorizar.
        #[arg(long)]
        logout: bool,
    },

    /// Inicia o servidor MCP via stdio.
    Serve,

    /// Mostra o estado das credenciais e do token.
    Status,

    /// Busca mensagens de um espaço e imprime o resultado em JSON.
    Search {
        /// Espaço (spaces/AAAA ou o id puro).
        #[arg(short, long)]
        space: String,

        /// Consulta.
        query: String,

        /// Modo de busca (exact, regex, hybrid).
        #[arg(short, long)]
        mode: Option<String>,

        /// Máximo de resultados.
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Mostra versão.
    Version,
}
