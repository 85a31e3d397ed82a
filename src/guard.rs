use crate::config::LimitConfig;
use crate::error::{CommentError, Result};
use crate::model::Comment;
use futures::{Stream, StreamExt};
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};

/// Outcome of consuming a fetch stream under the capacity ceilings. Partial
/// collections are successes; the flags tell the caller why collection
/// stopped early.
#[derive(Debug, Clone, Default)]
pub struct Collected {
    pub comments: Vec<Comment>,
    pub truncated: bool,
    pub timed_out: bool,
}

/// Clamp a requested limit to the configured hard maximum.
pub fn effective_limit(requested: usize, max_comments: usize) -> usize {
    requested.min(max_comments)
}

/// Consume at most `limit` comments from `stream`, stopping early when the
/// approximate-memory ceiling or the wall-clock deadline is reached.
///
/// A deadline hit with at least one comment collected is a flagged success;
/// with zero comments it is a timeout error. A fetch error from the stream
/// propagates as-is. The stream is dropped on return, which also tears down
/// the producing subprocess.
pub async fn collect_bounded<S>(mut stream: S, limit: usize, limits: &LimitConfig) -> Result<Collected>
where
    S: Stream<Item = Result<Comment>> + Unpin,
{
    let deadline = Instant::now() + Duration::from_secs(limits.fetch_timeout_secs);
    let ceiling_bytes = limits.memory_ceiling_mb * 1024 * 1024;

    let mut out = Collected::default();

    while out.comments.len() < limit {
        let next_bytes = (out.comments.len() + 1) * limits.bytes_per_comment;
        if next_bytes > ceiling_bytes {
            warn!(
                collected = out.comments.len(),
                ceiling_mb = limits.memory_ceiling_mb,
                "memory ceiling reached, truncating"
            );
            out.truncated = true;
            break;
        }

        match timeout_at(deadline, stream.next()).await {
            Ok(Some(Ok(comment))) => out.comments.push(comment),
            Ok(Some(Err(e))) => return Err(e),
            Ok(None) => break,
            Err(_) => {
                if out.comments.is_empty() {
                    return Err(CommentError::Timeout(limits.fetch_timeout_secs));
                }
                warn!(
                    collected = out.comments.len(),
                    timeout_secs = limits.fetch_timeout_secs,
                    "fetch deadline reached, returning partial results"
                );
                out.timed_out = true;
                out.truncated = true;
                break;
            }
        }
    }

    debug!(
        collected = out.comments.len(),
        truncated = out.truncated,
        timed_out = out.timed_out,
        "fetch collection finished"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn comment(id: usize) -> Comment {
        Comment {
            id: id.to_string(),
            text: format!("comment {id}"),
            display_time: "1 day ago".into(),
            parsed_time: 0.0,
            author: "@a".into(),
            channel_id: "UC".into(),
            like_count_raw: "0".into(),
            reply_count_raw: "0".into(),
            author_photo_url: String::new(),
            hearted: false,
            is_reply: false,
        }
    }

    fn ok_comments(n: usize) -> Vec<crate::Result<Comment>> {
        (0..n).map(|i| Ok(comment(i))).collect()
    }

    #[tokio::test]
    async fn stops_at_limit_without_flags() {
        let limits = LimitConfig::default();
        let s = stream::iter(ok_comments(500));
        let got = collect_bounded(s, 100, &limits).await.unwrap();
        assert_eq!(got.comments.len(), 100);
        assert!(!got.truncated);
        assert!(!got.timed_out);
    }

    #[tokio::test]
    async fn exhausted_stream_is_complete() {
        let limits = LimitConfig::default();
        let s = stream::iter(ok_comments(7));
        let got = collect_bounded(s, 100, &limits).await.unwrap();
        assert_eq!(got.comments.len(), 7);
        assert!(!got.truncated);
        assert!(!got.timed_out);
    }

    #[tokio::test]
    async fn memory_ceiling_truncates_instead_of_failing() {
        let limits = LimitConfig {
            memory_ceiling_mb: 1,
            bytes_per_comment: 128 * 1024, // ceiling after 8 comments
            ..LimitConfig::default()
        };
        let s = stream::iter(ok_comments(100));
        let got = collect_bounded(s, 100, &limits).await.unwrap();
        assert_eq!(got.comments.len(), 8);
        assert!(got.truncated);
        assert!(!got.timed_out);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_with_partial_results_is_flagged_success() {
        let limits = LimitConfig {
            fetch_timeout_secs: 5,
            ..LimitConfig::default()
        };
        // 37 comments arrive, then the source stalls forever.
        let s = stream::iter(ok_comments(37)).chain(stream::pending());
        let got = collect_bounded(s, 1000, &limits).await.unwrap();
        assert_eq!(got.comments.len(), 37);
        assert!(got.timed_out);
        assert!(got.truncated);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_with_nothing_collected_is_an_error() {
        let limits = LimitConfig {
            fetch_timeout_secs: 5,
            ..LimitConfig::default()
        };
        let s = stream::pending::<crate::Result<Comment>>();
        let err = collect_bounded(s, 1000, &limits).await.unwrap_err();
        assert!(matches!(err, CommentError::Timeout(5)));
    }

    #[tokio::test]
    async fn mid_stream_fetch_error_propagates() {
        let limits = LimitConfig::default();
        let items: Vec<crate::Result<Comment>> = vec![
            Ok(comment(1)),
            Err(CommentError::fetch("connection reset")),
        ];
        let err = collect_bounded(stream::iter(items), 100, &limits)
            .await
            .unwrap_err();
        assert!(matches!(err, CommentError::Fetch(_)));
    }

    #[test]
    fn effective_limit_clamps_to_hard_max() {
        assert_eq!(effective_limit(100, 10_000), 100);
        assert_eq!(effective_limit(50_000, 10_000), 10_000);
        assert_eq!(effective_limit(10_000, 10_000), 10_000);
    }
}
