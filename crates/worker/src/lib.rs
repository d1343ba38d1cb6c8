//! Feed ingest: fetch an RSS feed, render its entries and store the results.

pub mod config;
pub mod ingest;

pub use config::WorkerConfig;
pub use ingest::{ingest, run, stored_videos, IngestError, IngestReport};
