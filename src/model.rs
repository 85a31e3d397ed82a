use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A single scraped comment. The upstream downloader emits these fields under
/// its own key names (`cid`, `time`, `votes`, ...); responses always use the
/// canonical names below.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    #[serde(alias = "cid")]
    pub id: String,

    pub text: String,

    /// Human-readable time, e.g. "2 days ago".
    #[serde(alias = "time")]
    pub display_time: String,

    /// Unix timestamp derived upstream from the display time.
    #[serde(alias = "time_parsed", default)]
    pub parsed_time: f64,

    pub author: String,

    #[serde(alias = "channel")]
    pub channel_id: String,

    /// Like count as the site renders it ("1432", "1.2K", sometimes empty).
    #[serde(alias = "votes", default)]
    pub like_count_raw: String,

    #[serde(alias = "replies", default)]
    pub reply_count_raw: String,

    #[serde(alias = "photo", default)]
    pub author_photo_url: String,

    /// Hearted by the video creator.
    #[serde(alias = "heart", default)]
    pub hearted: bool,

    #[serde(alias = "reply", default)]
    pub is_reply: bool,
}

impl Comment {
    /// Parsed like count; non-numeric renderings count as zero.
    pub fn likes(&self) -> i64 {
        self.like_count_raw.trim().parse().unwrap_or(0)
    }

    /// Parsed reply count; non-numeric renderings count as zero.
    pub fn replies(&self) -> i64 {
        self.reply_count_raw.trim().parse().unwrap_or(0)
    }
}

/// Requested ordering for the external fetch. Site popularity is the site's
/// own blend of likes, recency, and replies, NOT a pure like-count ranking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    #[default]
    Recency,
    SitePopularity,
}

impl SortOrder {
    /// CLI flag value understood by youtube-comment-downloader.
    pub fn downloader_flag(self) -> &'static str {
        match self {
            SortOrder::SitePopularity => "0",
            SortOrder::Recency => "1",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_upstream_key_names() {
        let line = r#"{"cid":"abc.123","text":"first","time":"2 days ago",
            "time_parsed":1719822000.0,"author":"@someone","channel":"UCxyz",
            "votes":"42","replies":"3","photo":"https://example.com/a.jpg",
            "heart":true,"reply":false}"#;
        let c: Comment = serde_json::from_str(line).unwrap();
        assert_eq!(c.id, "abc.123");
        assert_eq!(c.display_time, "2 days ago");
        assert_eq!(c.channel_id, "UCxyz");
        assert_eq!(c.likes(), 42);
        assert_eq!(c.replies(), 3);
        assert!(c.hearted);
        assert!(!c.is_reply);
    }

    #[test]
    fn serializes_canonical_key_names() {
        let c = Comment {
            id: "x".into(),
            text: "t".into(),
            display_time: "now".into(),
            parsed_time: 0.0,
            author: "a".into(),
            channel_id: "c".into(),
            like_count_raw: "1".into(),
            reply_count_raw: "0".into(),
            author_photo_url: String::new(),
            hearted: false,
            is_reply: false,
        };
        let json = serde_json::to_value(&c).unwrap();
        for key in [
            "id",
            "text",
            "display_time",
            "parsed_time",
            "author",
            "channel_id",
            "like_count_raw",
            "reply_count_raw",
            "author_photo_url",
            "hearted",
            "is_reply",
        ] {
            assert!(json.get(key).is_some(), "missing field {key}");
        }
    }

    #[test]
    fn non_numeric_counts_parse_as_zero() {
        let mut c: Comment = serde_json::from_str(
            r#"{"cid":"1","text":"","time":"","author":"","channel":""}"#,
        )
        .unwrap();
        assert_eq!(c.likes(), 0);
        c.like_count_raw = "1.2K".into();
        assert_eq!(c.likes(), 0);
        c.like_count_raw = "N/A".into();
        assert_eq!(c.likes(), 0);
        c.like_count_raw = " 512 ".into();
        assert_eq!(c.likes(), 512);
    }

    #[test]
    fn sort_order_wire_names() {
        assert_eq!(
            serde_json::from_value::<SortOrder>(serde_json::json!("recency")).unwrap(),
            SortOrder::Recency
        );
        assert_eq!(
            serde_json::from_value::<SortOrder>(serde_json::json!("site-popularity")).unwrap(),
            SortOrder::SitePopularity
        );
        assert_eq!(SortOrder::SitePopularity.downloader_flag(), "0");
        assert_eq!(SortOrder::Recency.downloader_flag(), "1");
    }
}
