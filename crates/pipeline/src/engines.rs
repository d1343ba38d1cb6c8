//! Construction of the configured engines.

use std::sync::Arc;

use crate::composer::EntryComposer;
use crate::config::{ComposerConfig, EngineConfig, NarratorKind, SummarizerKind};
use crate::encoder::FfmpegEncoder;
use crate::image_fetch::HttpImageFetcher;
use crate::narration::{EspeakNarrator, Narrator, OpenAiNarrator};
use crate::openai::OpenAiClient;
use crate::summary::{ChatSummarizer, FallbackSummarizer, NaiveSummarizer, Summarizer};

#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("{0} requires OPENAI_API_KEY to be set")]
    MissingApiKey(&'static str),
}

fn openai_client(engines: &EngineConfig, client: &reqwest::Client) -> Option<OpenAiClient> {
    engines
        .openai_api_key
        .as_ref()
        .map(|key| {
            OpenAiClient::new(client.clone(), engines.openai_base_url.clone(), key.clone())
        })
}

/// The configured summarizer. Chat summaries fall back to the naive strategy.
pub fn build_summarizer(engines: &EngineConfig, client: &reqwest::Client) -> Arc<dyn Summarizer> {
    match engines.summarizer {
        SummarizerKind::Naive => Arc::new(NaiveSummarizer),
        SummarizerKind::OpenAi => match openai_client(engines, client) {
            Some(api) => Arc::new(FallbackSummarizer::new(
                Arc::new(ChatSummarizer::new(api)),
                Arc::new(NaiveSummarizer),
            )),
            None => {
                tracing::warn!("SUMMARIZER=openai without OPENAI_API_KEY, using naive summaries");
                Arc::new(NaiveSummarizer)
            }
        },
    }
}

/// The configured speech engine.
pub fn build_narrator(
    engines: &EngineConfig,
    config: &ComposerConfig,
    client: &reqwest::Client,
) -> Result<Arc<dyn Narrator>, SetupError> {
    match engines.narrator {
        NarratorKind::OpenAi => {
            let api = openai_client(engines, client)
                .ok_or(SetupError::MissingApiKey("NARRATOR=openai"))?;
            Ok(Arc::new(OpenAiNarrator::new(api, config.ffmpeg_timeout)))
        }
        NarratorKind::Espeak => Ok(Arc::new(EspeakNarrator::new(config.ffmpeg_timeout))),
    }
}

/// A composer wired with the configured engines, HTTP image downloads and
/// the ffmpeg encoder.
pub fn build_composer(
    config: ComposerConfig,
    engines: &EngineConfig,
    client: &reqwest::Client,
) -> Result<EntryComposer, SetupError> {
    let summarizer = build_summarizer(engines, client);
    let narrator = build_narrator(engines, &config, client)?;
    tracing::info!(
        summarizer = summarizer.name(),
        narrator = narrator.name(),
        output_dir = %config.output_dir.display(),
        "Composer configured",
    );

    Ok(EntryComposer::new(
        summarizer,
        narrator,
        Arc::new(HttpImageFetcher::new(client.clone())),
        Arc::new(FfmpegEncoder::from_config(&config)),
        config,
    ))
}
