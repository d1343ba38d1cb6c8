use newsreel_core::entry::{Entry, Feed};
use serde::{Deserialize, Serialize};

/// Number of items turned into entries when no limit is configured.
pub const DEFAULT_ENTRY_LIMIT: usize = 5;

/// One `<item>` as published by the feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawItem {
    pub title: String,
    pub summary_text: String,
    pub image_url: Option<String>,
    pub link: Option<String>,
}

/// Channel title plus its items in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFeed {
    pub title: String,
    pub items: Vec<RawItem>,
}

impl RawFeed {
    /// Build a core feed from the first `limit` items.
    pub fn into_feed(self, limit: usize) -> Feed {
        let entries = self
            .items
            .into_iter()
            .take(limit)
            .map(|item| Entry::new(item.title, item.summary_text, item.image_url, item.link))
            .collect();
        Feed::with_entries(self.title, entries)
    }
}
