//! Narration scripts from an entry's headline and body.

use std::sync::Arc;

use async_trait::async_trait;

use crate::openai::{ChatMessage, OpenAiClient, OpenAiError};

pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
const CHAT_MAX_TOKENS: u32 = 256;
const NEWSCASTER_PROMPT: &str = "You are a newscaster. Given a headline and an article \
description, reply with an extractive summary of exactly one sentence.";

#[derive(Debug, thiserror::Error)]
pub enum SummaryError {
    /// Both the title and the body are blank.
    #[error("nothing to summarize")]
    MissingContent,

    #[error("summary request failed: {0}")]
    Api(#[from] OpenAiError),

    #[error("summary model returned an empty reply")]
    EmptyReply,
}

/// A strategy turning (title, body) into a narration script.
///
/// Implementations never return blank text.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, title: &str, body: &str) -> Result<String, SummaryError>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

// ---------------------------------------------------------------------------
// Naive
// ---------------------------------------------------------------------------

/// Title and body joined by a newline. No external calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct NaiveSummarizer;

impl NaiveSummarizer {
    pub fn join(title: &str, body: &str) -> Result<String, SummaryError> {
        match (title.trim(), body.trim()) {
            ("", "") => Err(SummaryError::MissingContent),
            (title, "") => Ok(title.to_string()),
            ("", body) => Ok(body.to_string()),
            (title, body) => Ok(format!("{title}\n{body}")),
        }
    }
}

#[async_trait]
impl Summarizer for NaiveSummarizer {
    async fn summarize(&self, title: &str, body: &str) -> Result<String, SummaryError> {
        Self::join(title, body)
    }

    fn name(&self) -> &'static str {
        "naive"
    }
}

// ---------------------------------------------------------------------------
// Chat completion
// ---------------------------------------------------------------------------

/// One chat-completion call per entry; the reply is cut to its first sentence.
pub struct ChatSummarizer {
    api: OpenAiClient,
    model: String,
}

impl ChatSummarizer {
    pub fn new(api: OpenAiClient) -> Self {
        Self::with_model(api, DEFAULT_CHAT_MODEL)
    }

    pub fn with_model(api: OpenAiClient, model: impl Into<String>) -> Self {
        Self {
            api,
            model: model.into(),
        }
    }
}

#[async_trait]
impl Summarizer for ChatSummarizer {
    async fn summarize(&self, title: &str, body: &str) -> Result<String, SummaryError> {
        if title.trim().is_empty() && body.trim().is_empty() {
            return Err(SummaryError::MissingContent);
        }

        let prompt = format!("Headline: {}\nDescription: {}", title.trim(), body.trim());
        let messages = [
            ChatMessage {
                role: "system",
                content: NEWSCASTER_PROMPT,
            },
            ChatMessage {
                role: "user",
                content: &prompt,
            },
        ];

        let reply = self
            .api
            .chat_completion(&self.model, &messages, CHAT_MAX_TOKENS)
            .await?
            .unwrap_or_default();

        let summary = first_sentence(&reply);
        if summary.is_empty() {
            return Err(SummaryError::EmptyReply);
        }
        Ok(summary.to_string())
    }

    fn name(&self) -> &'static str {
        "chat"
    }
}

/// Leading sentence of `text`, trimmed. The whole text when it has no terminator.
pub fn first_sentence(text: &str) -> &str {
    let text = text.trim();
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            match chars.peek() {
                None => return text,
                Some((_, next)) if next.is_whitespace() => return &text[..i + c.len_utf8()],
                _ => {}
            }
        }
    }
    text
}

// ---------------------------------------------------------------------------
// Fallback
// ---------------------------------------------------------------------------

/// Tries `primary`, then `fallback` when the primary fails for any reason
/// other than missing content.
pub struct FallbackSummarizer {
    primary: Arc<dyn Summarizer>,
    fallback: Arc<dyn Summarizer>,
}

impl FallbackSummarizer {
    pub fn new(primary: Arc<dyn Summarizer>, fallback: Arc<dyn Summarizer>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl Summarizer for FallbackSummarizer {
    async fn summarize(&self, title: &str, body: &str) -> Result<String, SummaryError> {
        match self.primary.summarize(title, body).await {
            Ok(summary) => Ok(summary),
            Err(SummaryError::MissingContent) => Err(SummaryError::MissingContent),
            Err(e) => {
                tracing::warn!(
                    primary = self.primary.name(),
                    fallback = self.fallback.name(),
                    error = %e,
                    "Summarizer failed, using fallback",
                );
                self.fallback.summarize(title, body).await
            }
        }
    }

    fn name(&self) -> &'static str {
        "fallback"
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    struct Failing;

    #[async_trait]
    impl Summarizer for Failing {
        async fn summarize(&self, _: &str, _: &str) -> Result<String, SummaryError> {
            Err(SummaryError::EmptyReply)
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    #[tokio::test]
    async fn naive_joins_title_and_body() {
        let summary = NaiveSummarizer
            .summarize("Storm hits coast", "Thousands without power.")
            .await
            .unwrap();
        assert_eq!(summary, "Storm hits coast\nThousands without power.");
    }

    #[tokio::test]
    async fn naive_uses_the_non_blank_input() {
        assert_eq!(NaiveSummarizer.summarize("  ", "Body").await.unwrap(), "Body");
        assert_eq!(NaiveSummarizer.summarize("Title", "\n").await.unwrap(), "Title");
    }

    #[tokio::test]
    async fn naive_rejects_blank_inputs() {
        assert_matches!(
            NaiveSummarizer.summarize(" ", "").await,
            Err(SummaryError::MissingContent)
        );
    }

    #[test]
    fn first_sentence_cuts_at_terminator() {
        assert_eq!(first_sentence(" Rain falls. Then sun. "), "Rain falls.");
        assert_eq!(first_sentence("Is it over? Maybe."), "Is it over?");
        assert_eq!(first_sentence("Version 2.5 ships today"), "Version 2.5 ships today");
        assert_eq!(first_sentence("Done."), "Done.");
        assert_eq!(first_sentence("   "), "");
    }

    #[tokio::test]
    async fn fallback_is_used_when_primary_fails() {
        let summarizer = FallbackSummarizer::new(Arc::new(Failing), Arc::new(NaiveSummarizer));
        let summary = summarizer.summarize("Title", "Body").await.unwrap();
        assert_eq!(summary, "Title\nBody");
    }

    #[tokio::test]
    async fn fallback_does_not_mask_missing_content() {
        let summarizer =
            FallbackSummarizer::new(Arc::new(NaiveSummarizer), Arc::new(NaiveSummarizer));
        assert_matches!(
            summarizer.summarize("", "").await,
            Err(SummaryError::MissingContent)
        );
    }
}
