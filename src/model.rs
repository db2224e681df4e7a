// Wire and domain types shared by the API client, the cache and the front ends.
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Server-assigned entry identifier. Backends have used both integers and strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryId {
    Number(i64),
    Text(String),
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryId::Number(n) => write!(f, "{}", n),
            EntryId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl FromStr for EntryId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.parse::<i64>() {
            Ok(n) => EntryId::Number(n),
            Err(_) => EntryId::Text(s.to_string()),
        })
    }
}

impl From<i64> for EntryId {
    fn from(n: i64) -> Self {
        EntryId::Number(n)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: EntryId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    /// ISO-8601 creation time as sent by the server.
    #[serde(default, alias = "createdAt")]
    pub created_at: String,
}

impl JournalEntry {
    pub fn new(id: impl Into<EntryId>, title: &str, content: &str, created_at: &str) -> Self {
        Self {
            id: id.into(),
            title: title.to_string(),
            content: content.to_string(),
            created_at: created_at.to_string(),
        }
    }

    /// Parses `created_at`. Accepts RFC 3339 and offset-less timestamps (read as UTC).
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        let raw = self.created_at.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
                return Some(naive.and_utc());
            }
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|n| n.and_utc())
    }

    /// Calendar day of creation as seen in `tz`.
    pub fn date_in<Tz: TimeZone>(&self, tz: &Tz) -> Option<NaiveDate> {
        self.created_at_utc()
            .map(|dt| dt.with_timezone(tz).date_naive())
    }
}

/// Body of `POST /journal/create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEntry {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, alias = "username")]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserEnvelope {
    pub user: UserProfile,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub token: String,
}

/// Create responses vary between backend revisions.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum CreatedEntry {
    Bare(JournalEntry),
    Wrapped {
        #[serde(alias = "entry")]
        journal: JournalEntry,
    },
}

impl CreatedEntry {
    pub fn into_entry(self) -> JournalEntry {
        match self {
            CreatedEntry::Bare(e) => e,
            CreatedEntry::Wrapped { journal } => journal,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(alias = "message")]
    pub error: Option<String>,
}
