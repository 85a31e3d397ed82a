use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler,
};
use schemars::JsonSchema;
use serde::Deserialize;
use std::future::Future;

pub mod config;
pub mod error;
pub mod fetch;
pub mod guard;
pub mod model;
pub mod stats;
pub mod tools;


pub use config::*;
pub use error::*;
pub use fetch::{CommentSource, CommentStream, DownloaderSource};
pub use model::*;
pub use tools::*;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DownloadRequest {
    /// YouTube video ID (e.g. 'dQw4w9WgXcQ')
    video_id: String,
    /// Maximum number of comments to download (1-10000)
    #[serde(default = "default_download_limit")]
    limit: usize,
    /// Fetch order: "recency" or "site-popularity" (the site's own blend, not a like-count ranking)
    #[serde(default)]
    sort: SortOrder,
}

fn default_download_limit() -> usize {
    tools::DEFAULT_DOWNLOAD_LIMIT
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct StatsRequest {
    /// YouTube video ID (e.g. 'dQw4w9WgXcQ')
    video_id: String,
    /// Maximum number of comments to analyze (1-10000)
    #[serde(default = "default_stats_limit")]
    limit: usize,
    /// Fetch order: "recency" or "site-popularity"
    #[serde(default)]
    sort: SortOrder,
}

fn default_stats_limit() -> usize {
    tools::DEFAULT_STATS_LIMIT
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchRequest {
    /// YouTube video ID (e.g. 'dQw4w9WgXcQ')
    video_id: String,
    /// Term to look for in comment text (case-insensitive substring match)
    search_term: String,
    /// Maximum number of comments to scan (1-10000)
    #[serde(default = "default_search_limit")]
    limit: usize,
    /// Fetch order: "recency" or "site-popularity"
    #[serde(default)]
    sort: SortOrder,
}

fn default_search_limit() -> usize {
    tools::DEFAULT_SEARCH_LIMIT
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct TopByLikesRequest {
    /// YouTube video ID (e.g. 'dQw4w9WgXcQ')
    video_id: String,
    /// Number of top comments to return (1-100)
    #[serde(default = "default_top_count")]
    top_count: usize,
    /// How many comments to sample before ranking (100-2000)
    #[serde(default = "default_sample_size")]
    sample_size: usize,
}

fn default_top_count() -> usize {
    tools::DEFAULT_TOP_COUNT
}

fn default_sample_size() -> usize {
    tools::DEFAULT_SAMPLE_SIZE
}

/// MCP server exposing bounded YouTube comment tools.
#[derive(Clone)]
pub struct CommentServer {
    /// Server configuration
    config: ServerConfig,
    /// Pipeline backend shared by the tools
    tools: CommentTools,
    /// Tool router for handling tool calls
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl CommentServer {
    pub fn new(config: ServerConfig) -> Result<Self> {
        let tools = CommentTools::new(config.clone())?;
        Ok(Self {
            config,
            tools,
            tool_router: Self::tool_router(),
        })
    }

    /// Build against an alternative comment source (tests, embedding).
    pub fn with_source(
        config: ServerConfig,
        source: std::sync::Arc<dyn CommentSource>,
    ) -> Result<Self> {
        let tools = CommentTools::with_source(config.clone(), source)?;
        Ok(Self {
            config,
            tools,
            tool_router: Self::tool_router(),
        })
    }

    #[tool(
        description = "Download raw YouTube comments with full record fields. Returns the comment list plus count, truncated, and timed_out flags. Required: video_id. Optional: limit (default 100), sort (default recency)."
    )]
    async fn download(
        &self,
        params: Parameters<DownloadRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        let view = self.tools.download(&req.video_id, req.limit, req.sort).await?;
        json_result(&view)
    }

    #[tool(
        description = "Engagement statistics without the full comment list (context-efficient): totals, averages, hearted/reply counts, and a 5-comment sample. Required: video_id. Optional: limit (default 1000), sort."
    )]
    async fn get_stats(&self, params: Parameters<StatsRequest>) -> Result<CallToolResult, McpError> {
        let req = params.0;
        let view = self.tools.stats(&req.video_id, req.limit, req.sort).await?;
        json_result(&view)
    }

    #[tool(
        description = "Download comments and return those whose text contains the search term (case-insensitive substring). Required: video_id, search_term. Optional: limit (default 500), sort."
    )]
    async fn search_comments(
        &self,
        params: Parameters<SearchRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        let view = self
            .tools
            .search(&req.video_id, &req.search_term, req.limit, req.sort)
            .await?;
        json_result(&view)
    }

    #[tool(
        description = "Most-liked comments ranked by ACTUAL like count, not the site's 'popular' ordering. Samples sample_size comments, ranks them, returns the top top_count plus stats over the whole sample. Required: video_id. Optional: top_count (default 20), sample_size (default 500)."
    )]
    async fn get_top_comments_by_likes(
        &self,
        params: Parameters<TopByLikesRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        let view = self
            .tools
            .top_by_likes(&req.video_id, req.top_count, req.sample_size)
            .await?;
        json_result(&view)
    }
}

#[tool_handler]
impl ServerHandler for CommentServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "YouTube comments MCP server. Use download for full comment data, get_stats for \
                 a compact engagement summary, search_comments to find terms in comment text, and \
                 get_top_comments_by_likes for comments ranked by actual like count. All tools \
                 bound memory and time; partial results carry truncated/timed_out flags."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

impl CommentServer {
    /// Create a service factory for the streamable-HTTP transport.
    pub fn service_factory(
        config: ServerConfig,
    ) -> impl Fn() -> std::result::Result<Self, std::io::Error> + Send + Sync + 'static {
        move || {
            Self::new(config.clone()).map_err(|e| {
                std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("Failed to create server: {e}"),
                )
            })
        }
    }
}

fn json_result<T: serde::Serialize>(view: &T) -> Result<CallToolResult, McpError> {
    let payload = serde_json::to_string(view)
        .map_err(|e| McpError::internal_error(format!("Failed to encode response: {e}"), None))?;
    Ok(CallToolResult::success(vec![Content::text(payload)]))
}
