use crate::model::Comment;
use serde::Serialize;

/// How many raw records a stats view attaches for human inspection.
pub const SAMPLE_SIZE: usize = 5;

/// Sample comment text is clipped to this many characters.
pub const SAMPLE_TEXT_LIMIT: usize = 100;

/// Derived statistics over one collected batch. Recomputed per request,
/// never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct CommentStats {
    pub total_count: usize,
    pub total_likes: i64,
    pub avg_likes: f64,
    pub total_replies: i64,
    pub avg_replies: f64,
    pub hearted_count: usize,
    pub reply_count: usize,
    pub avg_text_len: f64,
    pub max_text_len: usize,
    pub min_text_len: usize,
    pub estimated_memory_mb: f64,
    pub sample: Vec<SampleComment>,
}

/// Compact record used in the stats sample to keep responses small.
#[derive(Debug, Clone, Serialize)]
pub struct SampleComment {
    pub author: String,
    pub text: String,
    pub likes: i64,
    pub is_reply: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchView {
    pub matches: Vec<Comment>,
    pub match_count: usize,
    pub scanned_count: usize,
    pub match_percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LikeRange {
    pub highest: i64,
    pub lowest: i64,
}

/// Compute the stats view over a batch. Never fails: unparseable counts are
/// zero, and an empty batch yields all-zero stats.
pub fn stats_view(comments: &[Comment], bytes_per_comment: usize) -> CommentStats {
    let total = comments.len();
    let estimated_memory_mb = (total * bytes_per_comment) as f64 / (1024.0 * 1024.0);

    if total == 0 {
        return CommentStats {
            total_count: 0,
            total_likes: 0,
            avg_likes: 0.0,
            total_replies: 0,
            avg_replies: 0.0,
            hearted_count: 0,
            reply_count: 0,
            avg_text_len: 0.0,
            max_text_len: 0,
            min_text_len: 0,
            estimated_memory_mb,
            sample: Vec::new(),
        };
    }

    let total_likes: i64 = comments.iter().map(Comment::likes).sum();
    let total_replies: i64 = comments.iter().map(Comment::replies).sum();
    let text_lens: Vec<usize> = comments.iter().map(|c| c.text.chars().count()).collect();

    CommentStats {
        total_count: total,
        total_likes,
        avg_likes: total_likes as f64 / total as f64,
        total_replies,
        avg_replies: total_replies as f64 / total as f64,
        hearted_count: comments.iter().filter(|c| c.hearted).count(),
        reply_count: comments.iter().filter(|c| c.is_reply).count(),
        avg_text_len: text_lens.iter().sum::<usize>() as f64 / total as f64,
        max_text_len: text_lens.iter().copied().max().unwrap_or(0),
        min_text_len: text_lens.iter().copied().min().unwrap_or(0),
        estimated_memory_mb,
        sample: comments
            .iter()
            .take(SAMPLE_SIZE)
            .map(|c| SampleComment {
                author: c.author.clone(),
                text: clip(&c.text, SAMPLE_TEXT_LIMIT),
                likes: c.likes(),
                is_reply: c.is_reply,
            })
            .collect(),
    }
}

/// Case-insensitive pure substring search over comment text, matches in
/// original fetch order.
pub fn search_view(comments: &[Comment], term: &str) -> SearchView {
    let needle = term.to_lowercase();
    let matches: Vec<Comment> = comments
        .iter()
        .filter(|c| c.text.to_lowercase().contains(&needle))
        .cloned()
        .collect();

    let scanned = comments.len();
    let match_percentage = if scanned > 0 {
        round2(matches.len() as f64 / scanned as f64 * 100.0)
    } else {
        0.0
    };

    SearchView {
        match_count: matches.len(),
        scanned_count: scanned,
        match_percentage,
        matches,
    }
}

/// Rank comments by parsed like count, descending. The sort is stable, so
/// comments with equal like counts keep their fetch order.
pub fn top_by_likes(comments: &[Comment], top_count: usize) -> (Vec<Comment>, LikeRange) {
    let mut ranked: Vec<Comment> = comments.to_vec();
    ranked.sort_by_key(|c| std::cmp::Reverse(c.likes()));
    ranked.truncate(top_count);

    let range = LikeRange {
        highest: ranked.first().map(Comment::likes).unwrap_or(0),
        lowest: ranked.last().map(Comment::likes).unwrap_or(0),
    };
    (ranked, range)
}

fn clip(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let mut s: String = text.chars().take(max_chars).collect();
        s.push_str("...");
        s
    } else {
        text.to_string()
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
