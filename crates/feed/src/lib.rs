//! RSS retrieval and parsing.
//!
//! Produces [`RawFeed`]s of plain item tuples and converts them into the
//! core [`Feed`](newsreel_core::entry::Feed) model.

mod client;
mod error;
pub mod models;
mod parser;

pub use client::RssClient;
pub use error::FeedError;
pub use models::{RawFeed, RawItem, DEFAULT_ENTRY_LIMIT};
pub use parser::parse_feed;

pub type Result<T> = std::result::Result<T, FeedError>;
