//! Entry-to-video pipeline.
//!
//! [`EntryComposer`] turns one feed entry into a narrated, panning video;
//! [`BatchRunner`] does so for a whole feed with bounded parallelism. The
//! summary, speech, image and encoding steps sit behind traits so each can
//! be swapped or stubbed.

pub mod batch;
pub mod composer;
pub mod config;
pub mod encoder;
pub mod engines;
pub mod image_fetch;
pub mod narration;
pub mod openai;
pub mod summary;

pub use batch::{BatchRunner, EntryOutcome};
pub use composer::{ComposeError, CompositionStage, EntryComposer};
pub use config::{ComposerConfig, EngineConfig};
