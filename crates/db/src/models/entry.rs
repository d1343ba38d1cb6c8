//! Entry rows and DTOs.
//!
//! Entries are stored as flat records. The derived `summary` and
//! `video_path` columns stay NULL until the pipeline has produced them.

use newsreel_core::entry::Entry;
use newsreel_core::error::CoreError;
use newsreel_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `entries` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EntryRecord {
    pub id: DbId,
    pub feed_title: Option<String>,
    pub title: String,
    pub text: String,
    pub image: Option<String>,
    pub url: Option<String>,
    pub summary: Option<String>,
    pub video_path: Option<String>,
    pub created_at: Timestamp,
}

/// Row counts reported by the health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow, Serialize)]
pub struct EntryStats {
    pub total: i64,
    /// Entries with a rendered video.
    pub rendered: i64,
}

impl EntryRecord {
    /// Rebuild the domain entry from this snapshot.
    pub fn into_entry(self) -> Result<Entry, CoreError> {
        Entry::restore(
            self.id,
            self.title,
            self.text,
            self.image,
            self.url,
            self.summary,
            self.video_path,
        )
    }
}

/// DTO for inserting a new entry.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEntry {
    pub feed_title: Option<String>,
    pub title: String,
    pub text: String,
    pub image: Option<String>,
    pub url: Option<String>,
    pub summary: Option<String>,
    pub video_path: Option<String>,
}

impl CreateEntry {
    /// Snapshot a domain entry, including whatever derived fields it has.
    pub fn from_entry(feed_title: Option<&str>, entry: &Entry) -> Self {
        Self {
            feed_title: feed_title.map(str::to_string),
            title: entry.title.clone(),
            text: entry.text.clone(),
            image: entry.image.clone(),
            url: entry.url.clone(),
            summary: entry.summary().map(str::to_string),
            video_path: entry.video().map(|p| p.to_string_lossy().into_owned()),
        }
    }
}
