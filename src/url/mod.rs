//! URL handling for the crawl pipeline
//!
//! Discovered item links arrive as relative hrefs, protocol-relative
//! strings, or full URLs with tracking junk attached. Everything passing
//! the dedup boundary goes through [`normalize_url`] first so the same
//! product can never be queued twice under two spellings.

mod normalize;

pub use normalize::normalize_url;
