use clap::Parser;
use gchat_mcp::cli::{commands, Cli, Commands};
use gchat_mcp::types::config::Config;
use gchat_mcp::{GchatError, GchatResult};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> GchatResult<()> {
    let cli = Cli::parse();

    // Load configuration first (no logging yet)
    let config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        Config::default_config()
    };

    // CLI flags take precedence over config
    let log_level = if cli.quiet {
        "error".to_string()
    } else if cli.verbose {
        "debug".to_string()
    } else {
        config.general.log_level.clone()
    };

    // RUST_LOG can add directives for other crates; the gchat_mcp level
    // always comes from the flags or the config
    let directive = format!("gchat_mcp={log_level}")
        .parse()
        .map_err(|e| GchatError::config(format!("invalid log level '{log_level}': {e}")))?;
    let filter = EnvFilter::from_default_env().add_directive(directive);

    // stdout carries MCP frames, so logs always go to stderr
    let registry = tracing_subscriber::registry().with(filter);

    if config.general.log_format == "json" {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    tracing::debug!("Configuration loaded from: {}", cli.config.display());

    match cli.command {
        Commands::Init { path, force } => commands::init(path, force).await?,
        Commands::Auth { logout } => commands::auth(&config, logout).await?,
        Commands::Serve => commands::serve(&config).await?,
        Commands::Status => commands::status(&config, &cli.config).await?,
        Commands::Search {
            space,
            query,
            mode,
            limit,
        } => commands::search(&config, space, query, mode, limit).await?,
        Commands::Version => commands::version(),
    }

    Ok(())
}
