use rmcp::transport::streamable_http_server::{StreamableHttpServerConfig, StreamableHttpService};
use std::{env, net::SocketAddr, sync::Arc};
use tracing::{error, info, warn};
use yt_comments_mcp_server::{CommentServer, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();

    info!("Starting YouTube comments MCP server (HTTP)...");

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

    let addr = parse_server_address();
    info!("Server will bind to: {}", addr);

    // Tool calls are single-shot; no session continuation is needed.
    let http_config = StreamableHttpServerConfig {
        stateful_mode: false,
        ..Default::default()
    };

    let service_factory = CommentServer::service_factory(config);

    let session_manager = Arc::new(
        rmcp::transport::streamable_http_server::session::local::LocalSessionManager::default(),
    );

    let http_service = StreamableHttpService::new(service_factory, session_manager, http_config);

    info!("HTTP service created successfully");
    info!("Available endpoints:");
    info!("  - GET  /health - Health check");
    info!("  - GET  /status - Server status and capacity limits");
    info!("  - POST /mcp    - MCP JSON-RPC requests");

    info!("Available tools:");
    info!("  - download: full comment records with capacity flags");
    info!("  - get_stats: compact engagement summary with a 5-comment sample");
    info!("  - search_comments: case-insensitive substring search over comment text");
    info!("  - get_top_comments_by_likes: comments ranked by actual like count");

    let app = axum::Router::new()
        .route("/", axum::routing::get(health_check))
        .route("/health", axum::routing::get(health_check))
        .route("/status", axum::routing::get(server_status))
        .fallback_service(tower::service_fn(move |req| {
            let service = http_service.clone();
            async move { Ok::<_, std::convert::Infallible>(service.handle(req).await) }
        }));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("YouTube comments MCP server listening on http://{}", addr);
    info!("Try: curl http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "healthy",
        "service": "yt-comments-mcp-server",
        "version": env!("CARGO_PKG_VERSION"),
        "transport": "http",
        "endpoints": {
            "mcp": "/mcp",
            "health": "/health",
            "status": "/status"
        },
        "capabilities": {
            "tools": true,
            "resources": false,
            "prompts": false,
            "stateful": false
        }
    }))
}

/// Server status endpoint
async fn server_status() -> axum::Json<serde_json::Value> {
    let defaults = ServerConfig::default();

    axum::Json(serde_json::json!({
        "service": "yt-comments-mcp-server",
        "version": env!("CARGO_PKG_VERSION"),
        "tools": {
            "download": true,
            "get_stats": true,
            "search_comments": true,
            "get_top_comments_by_likes": true
        },
        "limits": {
            "max_comments": defaults.limits.max_comments,
            "memory_ceiling_mb": defaults.limits.memory_ceiling_mb,
            "fetch_timeout_secs": defaults.limits.fetch_timeout_secs
        }
    }))
}

/// Parse server address from environment or use default
fn parse_server_address() -> SocketAddr {
    let host = env::var("YTC_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("YTC_PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse::<u16>()
        .unwrap_or_else(|_| {
            warn!("Invalid port specified, using default 8080");
            8080
        });

    format!("{}:{}", host, port).parse().unwrap_or_else(|_| {
        warn!("Invalid address format, using 127.0.0.1:8080");
        "127.0.0.1:8080".parse().unwrap()
    })
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
