use serde::{Deserialize, Serialize};

/// Configuration for the comments MCP server, constructed once at process
/// start and passed into every component that needs it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Capacity ceilings applied to every fetch.
    #[serde(default)]
    pub limits: LimitConfig,

    /// External downloader invocation.
    #[serde(default)]
    pub downloader: DownloaderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitConfig {
    /// Hard ceiling on comments per request, regardless of what was asked.
    pub max_comments: usize,

    /// Approximate-memory ceiling for a single collected batch.
    pub memory_ceiling_mb: usize,

    /// Per-comment memory estimate used against the ceiling.
    pub bytes_per_comment: usize,

    /// Wall-clock budget for a fetch, measured from fetch start.
    pub fetch_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloaderConfig {
    /// Program to execute.
    pub program: String,

    /// Leading arguments before the per-request flags.
    pub args: Vec<String>,
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            max_comments: 10_000,
            memory_ceiling_mb: 50,
            bytes_per_comment: 1800,
            fetch_timeout_secs: 90,
        }
    }
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            program: "python3".to_string(),
            args: vec!["-m".to_string(), "youtube_comment_downloader".to_string()],
        }
    }
}

impl ServerConfig {
    /// Load configuration from a JSON file.
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> crate::Result<()> {
        if self.limits.max_comments == 0 {
            return Err(crate::CommentError::config(
                "max_comments must be greater than 0",
            ));
        }

        if self.limits.memory_ceiling_mb == 0 {
            return Err(crate::CommentError::config(
                "memory_ceiling_mb must be greater than 0",
            ));
        }

        if self.limits.bytes_per_comment == 0 {
            return Err(crate::CommentError::config(
                "bytes_per_comment must be greater than 0",
            ));
        }

        if self.limits.fetch_timeout_secs == 0 {
            return Err(crate::CommentError::config(
                "fetch_timeout_secs must be greater than 0",
            ));
        }

        if self.downloader.program.is_empty() {
            return Err(crate::CommentError::config(
                "downloader program must not be empty",
            ));
        }

        Ok(())
    }
}
