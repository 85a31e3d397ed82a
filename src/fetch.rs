use crate::config::DownloaderConfig;
use crate::error::{CommentError, Result};
use crate::model::{Comment, SortOrder};
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tracing::{debug, warn};

/// Lazy, finite, non-restartable sequence of comments in source order.
pub type CommentStream = BoxStream<'static, Result<Comment>>;

/// The external comment source. Implementations must be lazy: no more than
/// `limit` comments are ever pulled, and dropping the returned stream must
/// release whatever is producing it.
#[async_trait]
pub trait CommentSource: Send + Sync {
    async fn fetch(&self, video_id: &str, sort: SortOrder, limit: usize) -> Result<CommentStream>;
}

/// Production source: spawns the youtube-comment-downloader CLI and streams
/// its line-delimited JSON output as it arrives.
pub struct DownloaderSource {
    config: DownloaderConfig,
}

struct StreamState {
    lines: Lines<BufReader<ChildStdout>>,
    stderr: Option<ChildStderr>,
    child: Child,
}

impl DownloaderSource {
    pub fn new(config: DownloaderConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl CommentSource for DownloaderSource {
    async fn fetch(&self, video_id: &str, sort: SortOrder, limit: usize) -> Result<CommentStream> {
        let mut cmd = Command::new(&self.config.program);
        cmd.args(&self.config.args)
            .arg("--youtubeid")
            .arg(video_id)
            .arg("--sort")
            .arg(sort.downloader_flag())
            .arg("--limit")
            .arg(limit.to_string())
            .arg("--output")
            .arg("/dev/stdout")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Dropping the stream mid-fetch tears the scraper down with it.
            .kill_on_drop(true);

        debug!(video_id, ?sort, limit, "spawning comment downloader");

        let mut child = cmd
            .spawn()
            .map_err(|e| CommentError::spawn(format!("{}: {e}", self.config.program)))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| CommentError::spawn("downloader stdout not captured"))?;
        let stderr = child.stderr.take();

        let state = StreamState {
            lines: BufReader::new(stdout).lines(),
            stderr,
            child,
        };

        Ok(futures::stream::try_unfold(state, |mut st| async move {
            loop {
                match st.lines.next_line().await? {
                    Some(line) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        match serde_json::from_str::<Comment>(line) {
                            Ok(comment) => return Ok(Some((comment, st))),
                            Err(e) => {
                                // Individual malformed lines are skipped, never fatal.
                                warn!(error = %e, "skipping malformed comment line");
                            }
                        }
                    }
                    None => return finish(st).await,
                }
            }
        })
        .boxed())
    }
}

/// Map the downloader's exit into the tail of the stream. "Not found" and
/// "comments disabled" conditions end the stream cleanly (possibly empty);
/// anything else becomes a fetch error.
async fn finish(mut st: StreamState) -> Result<Option<(Comment, StreamState)>> {
    let status = st.child.wait().await?;
    if status.success() {
        return Ok(None);
    }

    let mut detail = String::new();
    if let Some(mut stderr) = st.stderr.take() {
        let _ = stderr.read_to_string(&mut detail).await;
    }

    if is_empty_result(&detail) {
        debug!(detail = detail.trim(), "downloader reported an empty result");
        return Ok(None);
    }

    let msg = if detail.trim().is_empty() {
        format!("downloader exited with {status}")
    } else {
        detail.trim().to_string()
    };
    Err(CommentError::fetch(msg))
}

/// Upstream convention: unavailable or comment-disabled videos are an empty
/// sequence, not an error.
fn is_empty_result(stderr: &str) -> bool {
    let s = stderr.to_ascii_lowercase();
    s.contains("video unavailable")
        || s.contains("private video")
        || s.contains("comments are turned off")
        || s.contains("no comments")
}
