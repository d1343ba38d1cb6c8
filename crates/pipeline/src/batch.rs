//! Concurrent rendering of every entry in a feed.

use std::any::Any;
use std::num::NonZeroUsize;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;

use futures::FutureExt;
use newsreel_core::entry::{Entry, Feed};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::composer::{ComposeError, EntryComposer};

/// Result of rendering one entry.
#[derive(Debug)]
pub struct EntryOutcome {
    /// Position of the entry in its feed.
    pub index: usize,
    pub title: String,
    pub result: Result<PathBuf, ComposeError>,
}

impl EntryOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Runs an [`EntryComposer`] over a feed with bounded parallelism.
#[derive(Clone)]
pub struct BatchRunner {
    composer: EntryComposer,
    workers: usize,
}

impl BatchRunner {
    /// A runner with one worker per available CPU.
    pub fn new(composer: EntryComposer) -> Self {
        Self::with_workers(composer, default_workers())
    }

    pub fn with_workers(composer: EntryComposer, workers: usize) -> Self {
        Self {
            composer,
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Render every entry of `feed`, returning one outcome per entry in feed order.
    ///
    /// A failing entry never stops the others. Entries keep whatever summary
    /// and video they gained; an entry whose task panicked is left exactly as
    /// it was before the batch.
    pub async fn render_all(&self, feed: &mut Feed) -> Vec<EntryOutcome> {
        let entries = std::mem::take(&mut feed.entries);
        let total = entries.len();
        if total == 0 {
            return Vec::new();
        }

        let scratch = match tempfile::Builder::new().prefix("newsreel-").tempdir() {
            Ok(dir) => dir,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create batch scratch directory");
                let reason = e.to_string();
                let outcomes = entries
                    .iter()
                    .enumerate()
                    .map(|(index, entry)| EntryOutcome {
                        index,
                        title: entry.title.clone(),
                        result: Err(ComposeError::Workspace {
                            title: entry.title.clone(),
                            source: std::io::Error::new(e.kind(), reason.clone()),
                        }),
                    })
                    .collect();
                feed.entries = entries;
                return outcomes;
            }
        };
        let work_dir = scratch.path().to_path_buf();

        tracing::info!(
            feed = %feed.title,
            entries = total,
            workers = self.workers,
            "Rendering feed",
        );

        // Untouched copies, restored for entries whose task never reports back.
        let originals = entries.clone();
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();

        for (index, mut entry) in entries.into_iter().enumerate() {
            let composer = self.composer.clone();
            let semaphore = Arc::clone(&semaphore);
            let work_dir = work_dir.clone();

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let title = entry.title.clone();
                let rendered = AssertUnwindSafe(composer.get_video(&mut entry, &work_dir))
                    .catch_unwind()
                    .await;
                match rendered {
                    Ok(result) => (index, Some(entry), result),
                    Err(panic) => {
                        let reason = format!("render task panicked: {}", panic_message(&*panic));
                        (index, None, Err(ComposeError::Encoding { title, reason }))
                    }
                }
            });
        }

        let mut slots: Vec<Option<(Option<Entry>, Result<PathBuf, ComposeError>)>> =
            (0..total).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, entry, result)) => {
                    log_outcome(index, &originals[index].title, &result);
                    slots[index] = Some((entry, result));
                }
                Err(e) => tracing::error!(error = %e, "Render task did not complete"),
            }
        }
        drop(scratch);

        let mut outcomes = Vec::with_capacity(total);
        for (index, (slot, original)) in slots.into_iter().zip(originals).enumerate() {
            let title = original.title.clone();
            let (entry, result) = match slot {
                Some((Some(entry), result)) => (entry, result),
                Some((None, result)) => (original, result),
                None => (
                    original,
                    Err(ComposeError::Encoding {
                        title: title.clone(),
                        reason: "render task was cancelled".into(),
                    }),
                ),
            };
            feed.entries.push(entry);
            outcomes.push(EntryOutcome {
                index,
                title,
                result,
            });
        }

        let rendered = outcomes.iter().filter(|o| o.is_success()).count();
        tracing::info!(
            feed = %feed.title,
            rendered,
            failed = total - rendered,
            "Feed rendering finished",
        );
        outcomes
    }
}

/// One worker per available CPU, or one if that cannot be determined.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

fn log_outcome(index: usize, title: &str, result: &Result<PathBuf, ComposeError>) {
    match result {
        Ok(path) => tracing::info!(index, %title, video = %path.display(), "Entry rendered"),
        Err(e) => tracing::warn!(index, %title, kind = e.kind(), error = %e, "Entry failed"),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
