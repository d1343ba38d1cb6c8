//! Feed entries and the feeds that own them.
//!
//! An [`Entry`] starts with only the fields supplied by the feed. Its
//! narration script and rendered video are filled in later, each exactly
//! once, and always in that order. The private [`Stage`] enum makes a video
//! without a summary unrepresentable, and the setters reject a second write.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::CoreError;
use crate::types::DbId;

/// Lifecycle of the derived fields of an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Stage {
    New,
    Summarized { summary: String },
    Rendered { summary: String, video: PathBuf },
}

/// One feed item plus its derived narration script and video artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Storage id, set once the entry has been persisted.
    pub id: Option<DbId>,
    pub title: String,
    pub text: String,
    /// URL of the lead image. Required to render a video.
    pub image: Option<String>,
    /// Link back to the original article.
    pub url: Option<String>,
    stage: Stage,
}

impl Entry {
    /// Create a fresh entry with no summary and no video.
    pub fn new(
        title: impl Into<String>,
        text: impl Into<String>,
        image: Option<String>,
        url: Option<String>,
    ) -> Self {
        Self {
            id: None,
            title: title.into(),
            text: text.into(),
            image,
            url,
            stage: Stage::New,
        }
    }

    /// Rebuild an entry from a stored snapshot.
    ///
    /// Fails if the snapshot has a video but no summary, which no valid
    /// sequence of transitions can produce.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: DbId,
        title: String,
        text: String,
        image: Option<String>,
        url: Option<String>,
        summary: Option<String>,
        video: Option<String>,
    ) -> Result<Self, CoreError> {
        let stage = match (summary, video) {
            (None, None) => Stage::New,
            (Some(summary), None) => Stage::Summarized { summary },
            (Some(summary), Some(video)) => Stage::Rendered {
                summary,
                video: PathBuf::from(video),
            },
            (None, Some(_)) => {
                return Err(CoreError::Validation(format!(
                    "Entry {id} has a video but no summary"
                )))
            }
        };
        Ok(Self {
            id: Some(id),
            title,
            text,
            image,
            url,
            stage,
        })
    }

    /// The narration script, once computed.
    pub fn summary(&self) -> Option<&str> {
        match &self.stage {
            Stage::New => None,
            Stage::Summarized { summary } | Stage::Rendered { summary, .. } => Some(summary),
        }
    }

    /// Location of the rendered video, once written.
    pub fn video(&self) -> Option<&Path> {
        match &self.stage {
            Stage::Rendered { video, .. } => Some(video),
            _ => None,
        }
    }

    /// Whether either the title or the body carries non-blank text.
    pub fn has_content(&self) -> bool {
        !self.title.trim().is_empty() || !self.text.trim().is_empty()
    }

    /// Record the narration script. Allowed exactly once.
    pub fn set_summary(&mut self, summary: String) -> Result<&str, CoreError> {
        if summary.trim().is_empty() {
            return Err(CoreError::Validation(
                "Summary must not be empty".to_string(),
            ));
        }
        match self.stage {
            Stage::New => {
                self.stage = Stage::Summarized { summary };
                Ok(self.summary().unwrap_or_default())
            }
            _ => Err(CoreError::Conflict(format!(
                "Entry '{}' already has a summary",
                self.title
            ))),
        }
    }

    /// Record the rendered video. Requires a summary and is allowed once.
    pub fn set_video(&mut self, video: PathBuf) -> Result<&Path, CoreError> {
        let stage = std::mem::replace(&mut self.stage, Stage::New);
        match stage {
            Stage::Summarized { summary } => {
                self.stage = Stage::Rendered { summary, video };
                Ok(self.video().unwrap_or(Path::new("")))
            }
            Stage::New => Err(CoreError::Validation(format!(
                "Entry '{}' must be summarized before its video is recorded",
                self.title
            ))),
            rendered @ Stage::Rendered { .. } => {
                self.stage = rendered;
                Err(CoreError::Conflict(format!(
                    "Entry '{}' already has a video",
                    self.title
                )))
            }
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.title, self.text)
    }
}

/// A feed title plus its entries in feed order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Feed {
    pub title: String,
    pub entries: Vec<Entry>,
}

impl Feed {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            entries: Vec::new(),
        }
    }

    pub fn with_entries(title: impl Into<String>, entries: Vec<Entry>) -> Self {
        Self {
            title: title.into(),
            entries,
        }
    }

    pub fn add_entry(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Feed: {} with {} entries", self.title, self.entries.len())?;
        for entry in &self.entries {
            writeln!(f)?;
            write!(f, "{entry}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn entry() -> Entry {
        Entry::new(
            "Storm hits coast",
            "Thousands without power.",
            Some("https://example.com/a.jpg".into()),
            None,
        )
    }

    #[test]
    fn new_entry_has_no_derived_fields() {
        let e = entry();
        assert_eq!(e.summary(), None);
        assert_eq!(e.video(), None);
        assert_eq!(e.id, None);
    }

    #[test]
    fn summary_is_set_once() {
        let mut e = entry();
        e.set_summary("first".into()).unwrap();
        assert_matches!(e.set_summary("second".into()), Err(CoreError::Conflict(_)));
        assert_eq!(e.summary(), Some("first"));
    }

    #[test]
    fn empty_summary_is_rejected() {
        let mut e = entry();
        assert_matches!(e.set_summary("   ".into()), Err(CoreError::Validation(_)));
        assert_eq!(e.summary(), None);
    }

    #[test]
    fn video_requires_summary() {
        let mut e = entry();
        assert_matches!(
            e.set_video(PathBuf::from("out.mp4")),
            Err(CoreError::Validation(_))
        );
        assert_eq!(e.video(), None);
        assert_eq!(e.summary(), None);
    }

    #[test]
    fn video_is_set_once_and_keeps_summary() {
        let mut e = entry();
        e.set_summary("script".into()).unwrap();
        e.set_video(PathBuf::from("a.mp4")).unwrap();
        assert_matches!(
            e.set_video(PathBuf::from("b.mp4")),
            Err(CoreError::Conflict(_))
        );
        assert_eq!(e.video(), Some(Path::new("a.mp4")));
        assert_eq!(e.summary(), Some("script"));
    }

    #[test]
    fn restore_rejects_video_without_summary() {
        let result = Entry::restore(
            7,
            "t".into(),
            "b".into(),
            None,
            None,
            None,
            Some("v.mp4".into()),
        );
        assert_matches!(result, Err(CoreError::Validation(_)));
    }

    #[test]
    fn restore_keeps_both_fields() {
        let e = Entry::restore(
            3,
            "t".into(),
            "b".into(),
            None,
            None,
            Some("s".into()),
            Some("v.mp4".into()),
        )
        .unwrap();
        assert_eq!(e.id, Some(3));
        assert_eq!(e.summary(), Some("s"));
        assert_eq!(e.video(), Some(Path::new("v.mp4")));
    }

    #[test]
    fn has_content_ignores_whitespace() {
        assert!(!Entry::new(" ", "\n", None, None).has_content());
        assert!(Entry::new("", "body", None, None).has_content());
    }

    #[test]
    fn feed_keeps_insertion_order() {
        let mut feed = Feed::new("News");
        feed.add_entry(Entry::new("one", "", None, None));
        feed.add_entry(Entry::new("two", "", None, None));
        let titles: Vec<_> = feed.entries.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["one", "two"]);
        assert!(feed.to_string().starts_with("Feed: News with 2 entries"));
    }
}
