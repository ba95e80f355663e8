//! Listing walker: sequential pagination driver
//!
//! Pagination is inherently sequential — each page's URL comes from the
//! previous page — so the walker is a single task stepping through a small
//! state machine: Fetching → Emitting → Paginating → Fetching …, ending in
//! Done (no next-page link) or Aborted (fetch failure after retries). The
//! walker is the sole writer of [`CrawlState`] and checkpoints it after
//! every page.

use crate::extract::{self, selectors, Document};
use crate::fetch::{fetch_with_retry, RateLimiter, RetryPolicy};
use crate::robots::RobotsRules;
use crate::state::CrawlState;
use crate::url::normalize_url;
use crate::CatwalkError;
use reqwest::Client;
use std::path::PathBuf;
use tokio::sync::{mpsc, watch};
use url::Url;

/// One fetched and parsed listing page; immutable once constructed
#[derive(Debug, Clone)]
pub struct ListingPage {
    pub url: Url,
    /// Absolute item URLs in page order
    pub item_links: Vec<Url>,
    pub next_page_link: Option<Url>,
}

/// The walker's state machine phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WalkPhase {
    Fetching,
    Emitting,
    Paginating,
    Done,
    Aborted,
}

/// How the walk ended
#[derive(Debug)]
pub enum WalkTerminal {
    /// Pagination chain exhausted; every discovered URL was emitted
    Done,
    /// Listing fetch failed after retries (or robots.txt forbade the walk);
    /// progress up to this point is checkpointed
    Aborted { url: String, reason: String },
    /// Operator shutdown between pages; frontier checkpointed
    Interrupted,
}

/// Result of a listing walk
#[derive(Debug)]
pub struct WalkReport {
    pub terminal: WalkTerminal,
    pub pages_visited: usize,
    pub urls_emitted: usize,
    pub urls_discovered_total: usize,
}

/// Parses a listing page body into its links
///
/// Pure function of the body and page URL. Relative hrefs are resolved
/// against the page; unresolvable ones are dropped.
pub fn parse_listing(body: &str, page_url: &Url) -> ListingPage {
    let doc = Document::parse(body, page_url.clone());

    let item_links = extract::extract_all(&doc, &selectors::LISTING_ITEM_LINKS)
        .iter()
        .filter_map(|href| doc.resolve(href))
        .collect();

    let next_page_link = extract::extract(&doc, &selectors::LISTING_NEXT_PAGE)
        .into_option()
        .and_then(|href| doc.resolve(&href));

    ListingPage {
        url: page_url.clone(),
        item_links,
        next_page_link,
    }
}

/// Sequential driver for listing pagination
pub struct ListingWalker {
    client: Client,
    limiter: RateLimiter,
    retry: RetryPolicy,
    robots: RobotsRules,
    user_agent: String,
    checkpoint_path: PathBuf,
    state: CrawlState,
}

impl ListingWalker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        client: Client,
        limiter: RateLimiter,
        retry: RetryPolicy,
        robots: RobotsRules,
        user_agent: String,
        checkpoint_path: PathBuf,
        state: CrawlState,
    ) -> Self {
        Self {
            client,
            limiter,
            retry,
            robots,
            user_agent,
            checkpoint_path,
            state,
        }
    }

    /// Walks the pagination chain, emitting newly discovered item URLs
    ///
    /// Every emitted URL is normalized and guaranteed unique for the whole
    /// run, including across resumes — the dedup set lives in the
    /// checkpointed [`CrawlState`].
    pub async fn run(
        mut self,
        tx: mpsc::Sender<String>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<WalkReport, CatwalkError> {
        let mut phase;
        let mut pages_visited = 0usize;
        let mut urls_emitted = 0usize;

        let terminal = loop {
            if *shutdown.borrow() {
                tracing::info!("shutdown requested, checkpointing listing frontier");
                self.state.save(&self.checkpoint_path)?;
                break WalkTerminal::Interrupted;
            }

            let page_url = match self.state.next_pending() {
                Some(url) => url,
                None => {
                    phase = WalkPhase::Done;
                    tracing::debug!("walker phase: {:?}", phase);
                    self.state.save(&self.checkpoint_path)?;
                    break WalkTerminal::Done;
                }
            };

            phase = WalkPhase::Fetching;
            tracing::debug!("walker phase: {:?} ({})", phase, page_url);

            if !self.robots.is_allowed(&page_url, &self.user_agent) {
                tracing::error!("listing page {} disallowed by robots.txt", page_url);
                self.state.save(&self.checkpoint_path)?;
                phase = WalkPhase::Aborted;
                tracing::debug!("walker phase: {:?}", phase);
                break WalkTerminal::Aborted {
                    url: page_url,
                    reason: "disallowed by robots.txt".to_string(),
                };
            }

            let body =
                match fetch_with_retry(&self.client, &self.limiter, &self.retry, &page_url).await {
                    Ok(body) => body,
                    Err(e) => {
                        tracing::error!(
                            "listing fetch for {} failed after retries: {}",
                            page_url,
                            e
                        );
                        self.state.save(&self.checkpoint_path)?;
                        phase = WalkPhase::Aborted;
                        tracing::debug!("walker phase: {:?}", phase);
                        break WalkTerminal::Aborted {
                            url: page_url,
                            reason: e.to_string(),
                        };
                    }
                };

            let parsed_url = Url::parse(&page_url)?;
            let listing = parse_listing(&body, &parsed_url);

            phase = WalkPhase::Emitting;
            tracing::debug!(
                "walker phase: {:?} ({} links)",
                phase,
                listing.item_links.len()
            );

            if listing.item_links.is_empty() && listing.next_page_link.is_some() {
                // Empty pages are not an error; pagination continues.
                tracing::warn!("listing page {} yielded zero item links", page_url);
            }

            let mut receiver_gone = false;
            for link in &listing.item_links {
                let normalized = match normalize_url(link.as_str()) {
                    Ok(n) => n,
                    Err(e) => {
                        tracing::debug!("skipping unnormalizable link {}: {}", link, e);
                        continue;
                    }
                };

                if self.state.note_discovered(normalized.as_str()) {
                    if tx.send(normalized.to_string()).await.is_err() {
                        // Never handed downstream, so it must stay out of
                        // the dedup set to be re-emitted on resume.
                        self.state.retract_discovered(normalized.as_str());
                        receiver_gone = true;
                        break;
                    }
                    urls_emitted += 1;
                }
            }

            if receiver_gone {
                // The page stays in the frontier: a resumed walk refetches
                // it and emits only the links that were never sent.
                tracing::info!("downstream closed, checkpointing and stopping walk");
                self.state.save(&self.checkpoint_path)?;
                break WalkTerminal::Interrupted;
            }

            self.state.mark_visited(&page_url);

            if let Some(next) = &listing.next_page_link {
                phase = WalkPhase::Paginating;
                tracing::debug!("walker phase: {:?} ({})", phase, next);
                match normalize_url(next.as_str()) {
                    Ok(n) => self.state.push_frontier(n.as_str()),
                    Err(e) => tracing::warn!("skipping unnormalizable next-page link: {}", e),
                }
            }

            self.state.save(&self.checkpoint_path)?;
            pages_visited += 1;

            tracing::info!(
                "listing page {} done: {} items discovered so far, {} pages pending",
                page_url,
                self.state.discovered_item_urls.len(),
                self.state.frontier.len()
            );
        };

        Ok(WalkReport {
            terminal,
            pages_visited,
            urls_emitted,
            urls_discovered_total: self.state.discovered_item_urls.len(),
        })
    }
}
