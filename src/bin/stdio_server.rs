use rmcp::{transport::stdio, ServiceExt};
use std::env;
use tracing::{error, info};
use yt_comments_mcp_server::{CommentServer, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .with_writer(std::io::stderr)
        .init();

    info!("Starting YouTube comments MCP server (STDIO)...");

    let config = load_config().unwrap_or_else(|e| {
        error!("Failed to load config, using defaults: {}", e);
        ServerConfig::default()
    });

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    info!("Configuration loaded and validated");
    info!("Hard comment ceiling: {}", config.limits.max_comments);
    info!("Memory ceiling: {} MB", config.limits.memory_ceiling_mb);
    info!("Fetch timeout: {}s", config.limits.fetch_timeout_secs);

    let server = match CommentServer::new(config) {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to create server: {}", e);
            std::process::exit(1);
        }
    };

    let service = server.serve(stdio()).await.inspect_err(|e| {
        error!("Error starting server: {}", e);
    })?;

    info!("YouTube comments MCP server started on STDIO transport");
    info!("Available tools:");
    info!("  - download: full comment records with capacity flags");
    info!("  - get_stats: compact engagement summary with a 5-comment sample");
    info!("  - search_comments: case-insensitive substring search over comment text");
    info!("  - get_top_comments_by_likes: comments ranked by actual like count");

    let result = service.waiting().await;

    match result {
        Ok(_) => info!("Server shut down gracefully"),
        Err(e) => error!("Server error: {}", e),
    }

    Ok(())
}

/// Load configuration from file or environment.
fn load_config() -> Result<ServerConfig, Box<dyn std::error::Error>> {
    if let Ok(config_path) = env::var("YTC_CONFIG") {
        info!("Loading config from: {}", config_path);
        return Ok(ServerConfig::from_file(&config_path)?);
    }

    let default_config_path = "ytc-config.json";
    if std::path::Path::new(default_config_path).exists() {
        info!("Loading config from: {}", default_config_path);
        return Ok(ServerConfig::from_file(default_config_path)?);
    }

    let mut config = ServerConfig::default();

    if let Ok(max) = env::var("YTC_MAX_COMMENTS") {
        if let Ok(val) = max.parse::<usize>() {
            config.limits.max_comments = val;
        }
    }

    if let Ok(ceiling) = env::var("YTC_MEMORY_CEILING_MB") {
        if let Ok(val) = ceiling.parse::<usize>() {
            config.limits.memory_ceiling_mb = val;
        }
    }

    if let Ok(timeout) = env::var("YTC_FETCH_TIMEOUT_SECS") {
        if let Ok(val) = timeout.parse::<u64>() {
            config.limits.fetch_timeout_secs = val;
        }
    }

    if let Ok(program) = env::var("YTC_DOWNLOADER_BIN") {
        config.downloader.program = program;
        config.downloader.args.clear();
    }

    info!("Using default configuration with environment overrides");
    Ok(config)
}
