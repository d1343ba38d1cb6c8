//! Domain types and media primitives shared by every Newsreel crate.
//!
//! Kept free of database and HTTP dependencies so the pipeline, storage and
//! API layers can all depend on it.

pub mod entry;
pub mod error;
pub mod ffmpeg;
pub mod pan;
pub mod types;
