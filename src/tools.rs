use crate::config::ServerConfig;
use crate::error::{CommentError, Result};
use crate::fetch::{CommentSource, DownloaderSource};
use crate::guard::{self, Collected};
use crate::model::{Comment, SortOrder};
use crate::stats::{self, CommentStats, LikeRange, SearchView};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

pub const DEFAULT_DOWNLOAD_LIMIT: usize = 100;
pub const DEFAULT_STATS_LIMIT: usize = 1000;
pub const DEFAULT_SEARCH_LIMIT: usize = 500;
pub const DEFAULT_TOP_COUNT: usize = 20;
pub const DEFAULT_SAMPLE_SIZE: usize = 500;

/// The recency retry in `top_by_likes` fetches at most this many comments.
pub const FALLBACK_SAMPLE_CAP: usize = 300;

/// Pipeline backend shared by the four tools: validate, fetch under the
/// capacity guard, aggregate. Stateless across calls; cloned freely.
#[derive(Clone)]
pub struct CommentTools {
    config: ServerConfig,
    source: Arc<dyn CommentSource>,
}

#[derive(Debug, Serialize)]
pub struct DownloadView {
    pub video_id: String,
    pub comments: Vec<Comment>,
    pub count: usize,
    pub truncated: bool,
    pub timed_out: bool,
    pub estimated_memory_mb: f64,
}

#[derive(Debug, Serialize)]
pub struct StatsEnvelope {
    pub video_id: String,
    #[serde(flatten)]
    pub stats: CommentStats,
    pub truncated: bool,
    pub timed_out: bool,
}

#[derive(Debug, Serialize)]
pub struct SearchEnvelope {
    pub video_id: String,
    pub search_term: String,
    #[serde(flatten)]
    pub view: SearchView,
    pub truncated: bool,
    pub timed_out: bool,
}

#[derive(Debug, Serialize)]
pub struct TopView {
    pub video_id: String,
    pub top_count_requested: usize,
    /// How many comments were actually sampled before ranking.
    pub sample_size: usize,
    pub top: Vec<Comment>,
    pub like_range: LikeRange,
    /// Stats over the whole sample, not just the top subset.
    pub stats: CommentStats,
    pub truncated: bool,
    pub timed_out: bool,
}

impl CommentTools {
    pub fn new(config: ServerConfig) -> Result<Self> {
        config.validate()?;
        let source = Arc::new(DownloaderSource::new(config.downloader.clone()));
        Ok(Self { config, source })
    }

    /// Build against an alternative source, e.g. an in-memory one for tests
    /// or embedding.
    pub fn with_source(config: ServerConfig, source: Arc<dyn CommentSource>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, source })
    }

    pub async fn download(
        &self,
        video_id: &str,
        limit: usize,
        sort: SortOrder,
    ) -> Result<DownloadView> {
        validate_video_id(video_id)?;
        validate_range("limit", limit, 1, self.config.limits.max_comments)?;

        let collected = self.fetch_bounded(video_id, sort, limit).await?;
        let count = collected.comments.len();
        let estimated_memory_mb =
            (count * self.config.limits.bytes_per_comment) as f64 / (1024.0 * 1024.0);

        info!(video_id, count, truncated = collected.truncated, "download complete");
        Ok(DownloadView {
            video_id: video_id.to_string(),
            count,
            truncated: collected.truncated,
            timed_out: collected.timed_out,
            estimated_memory_mb,
            comments: collected.comments,
        })
    }

    pub async fn stats(
        &self,
        video_id: &str,
        limit: usize,
        sort: SortOrder,
    ) -> Result<StatsEnvelope> {
        validate_video_id(video_id)?;
        validate_range("limit", limit, 1, self.config.limits.max_comments)?;

        let collected = self.fetch_bounded(video_id, sort, limit).await?;
        let stats = stats::stats_view(&collected.comments, self.config.limits.bytes_per_comment);

        Ok(StatsEnvelope {
            video_id: video_id.to_string(),
            stats,
            truncated: collected.truncated,
            timed_out: collected.timed_out,
        })
    }

    pub async fn search(
        &self,
        video_id: &str,
        search_term: &str,
        limit: usize,
        sort: SortOrder,
    ) -> Result<SearchEnvelope> {
        validate_video_id(video_id)?;
        if search_term.trim().is_empty() {
            return Err(CommentError::invalid_input("search_term must not be empty"));
        }
        validate_range("limit", limit, 1, self.config.limits.max_comments)?;

        let collected = self.fetch_bounded(video_id, sort, limit).await?;
        let view = stats::search_view(&collected.comments, search_term);

        Ok(SearchEnvelope {
            video_id: video_id.to_string(),
            search_term: search_term.to_string(),
            view,
            truncated: collected.truncated,
            timed_out: collected.timed_out,
        })
    }

    pub async fn top_by_likes(
        &self,
        video_id: &str,
        top_count: usize,
        sample_size: usize,
    ) -> Result<TopView> {
        validate_video_id(video_id)?;
        validate_range("top_count", top_count, 1, 100)?;
        validate_range("sample_size", sample_size, 100, 2000)?;

        // Site popularity surfaces better candidates, but occasionally hangs
        // or errors for unpopular videos. Recency is a reliable substitute
        // sample, so retry once with it before surfacing the failure.
        let collected = match self
            .fetch_bounded(video_id, SortOrder::SitePopularity, sample_size)
            .await
        {
            Ok(collected) => collected,
            Err(e) if e.is_retryable() => {
                warn!(video_id, error = %e, "site-popularity fetch failed, retrying with recency");
                self.fetch_bounded(
                    video_id,
                    SortOrder::Recency,
                    sample_size.min(FALLBACK_SAMPLE_CAP),
                )
                .await?
            }
            Err(e) => return Err(e),
        };

        let stats = stats::stats_view(&collected.comments, self.config.limits.bytes_per_comment);
        let (top, like_range) = stats::top_by_likes(&collected.comments, top_count);

        Ok(TopView {
            video_id: video_id.to_string(),
            top_count_requested: top_count,
            sample_size: collected.comments.len(),
            top,
            like_range,
            stats,
            truncated: collected.truncated,
            timed_out: collected.timed_out,
        })
    }

    async fn fetch_bounded(
        &self,
        video_id: &str,
        sort: SortOrder,
        limit: usize,
    ) -> Result<Collected> {
        let limit = guard::effective_limit(limit, self.config.limits.max_comments);
        let stream = self.source.fetch(video_id, sort, limit).await?;
        guard::collect_bounded(stream, limit, &self.config.limits).await
    }
}

fn validate_video_id(video_id: &str) -> Result<()> {
    let well_formed = (11..=20).contains(&video_id.len())
        && video_id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if well_formed {
        Ok(())
    } else {
        Err(CommentError::invalid_input(format!(
            "'{video_id}' is not a valid video ID"
        )))
    }
}

fn validate_range(name: &str, value: usize, min: usize, max: usize) -> Result<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(CommentError::invalid_input(format!(
            "{name} must be between {min} and {max}, got {value}"
        )))
    }
}
