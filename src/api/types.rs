use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Wire Types
// ============================================================================

/// Score value the backend uses for articles that have not been scored yet.
pub const UNSCORED: i64 = -1;

/// Article as returned by the collection service.
///
/// Owned by the backend: the client never edits one, it only reorders and
/// filters copies. `authors` and `summary` are explicitly optional and
/// serialize as `null` when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// Stable unique key.
    pub id: i64,
    pub site_name: String,
    pub url: String,
    pub title: String,
    pub text: String,
    #[serde(default)]
    pub authors: Option<String>,
    #[serde(with = "timestamp")]
    pub publish_date: DateTime<Utc>,
    /// Relevance score; [`UNSCORED`] until the backend has scored it.
    pub score: i64,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Article {
    /// Whether the backend has scored this article yet.
    pub fn is_scored(&self) -> bool {
        self.score != UNSCORED
    }
}

/// One page of a category listing.
///
/// `total` counts every article matching the filter on the server, not just
/// the ones in `articles`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResult {
    pub articles: Vec<Article>,
    pub total: u64,
}

/// Timestamp (de)serialization for backend datetimes.
///
/// The backend emits either RFC 3339 strings or naive ISO 8601 datetimes
/// (no offset). Naive values are interpreted in local time. Output is always
/// RFC 3339 in UTC.
pub(crate) mod timestamp {
    use chrono::{DateTime, Local, LocalResult, NaiveDateTime, TimeZone, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp: {raw:?}")))
    }

    pub(crate) fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }

        let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()?;

        match Local.from_local_datetime(&naive) {
            LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => Some(dt.with_timezone(&Utc)),
            // Skipped by a DST transition: the wall-clock time never existed locally
            LocalResult::None => Some(Utc.from_utc_datetime(&naive)),
        }
    }
}
