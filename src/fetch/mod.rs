//! Rate-limited HTTP fetching
//!
//! All outbound requests — listing pages, detail pages, and enrichment
//! calls — go through one [`RateLimiter`] so the whole pipeline shares a
//! single politeness budget: at most `concurrency-limit` requests in flight
//! and at least `request-delay-seconds` between the start of successive
//! requests, measured globally.
//!
//! Transport failures surface as typed [`FetchError`]s; retry decisions
//! belong to [`fetch_with_retry`] and its callers, never to the client.

mod client;
mod limiter;
mod retry;

pub use client::{build_http_client, fetch, FetchError};
pub use limiter::RateLimiter;
pub use retry::{fetch_with_retry, RetryPolicy};
