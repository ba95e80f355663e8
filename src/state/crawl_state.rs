use crate::CatwalkError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::path::Path;

/// Discovery-side crawl progress
///
/// Mutated only by the listing walker (single writer) and persisted to a
/// JSON checkpoint file after every listing page, so an interrupted walk
/// resumes from the last successful page instead of the start URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlState {
    /// Hash of the config that started this run; mismatches on resume are
    /// reported but not fatal
    pub config_hash: String,

    /// Listing pages already fetched and emitted
    pub visited_listing_pages: HashSet<String>,

    /// Dedup set of discovered item URLs (normalized absolute form)
    pub discovered_item_urls: HashSet<String>,

    /// Discovered URLs in first-seen order, for deterministic emission
    pub discovered_order: Vec<String>,

    /// Listing pages still to fetch
    pub frontier: VecDeque<String>,

    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CrawlState {
    /// Creates fresh state seeded with the start URL
    pub fn new(config_hash: &str, start_url: &str) -> Self {
        let now = Utc::now();
        let mut frontier = VecDeque::new();
        frontier.push_back(start_url.to_string());

        Self {
            config_hash: config_hash.to_string(),
            visited_listing_pages: HashSet::new(),
            discovered_item_urls: HashSet::new(),
            discovered_order: Vec::new(),
            frontier,
            started_at: now,
            updated_at: now,
        }
    }

    /// Records a discovered item URL; returns true if it was new
    ///
    /// This is the dedup boundary: the same href seen on two listing pages
    /// is added (and emitted downstream) exactly once.
    pub fn note_discovered(&mut self, normalized_url: &str) -> bool {
        if self.discovered_item_urls.insert(normalized_url.to_string()) {
            self.discovered_order.push(normalized_url.to_string());
            true
        } else {
            false
        }
    }

    /// Removes a URL from the discovered set
    ///
    /// For a discovered URL that could not be handed downstream: it must
    /// not sit in the checkpointed dedup set where a resumed walk would
    /// skip it without it ever reaching the seed file or the output.
    pub fn retract_discovered(&mut self, normalized_url: &str) {
        if self.discovered_item_urls.remove(normalized_url) {
            self.discovered_order.retain(|u| u != normalized_url);
        }
    }

    /// Marks a listing page visited and removes it from the frontier
    pub fn mark_visited(&mut self, page_url: &str) {
        self.visited_listing_pages.insert(page_url.to_string());
        self.frontier.retain(|u| u != page_url);
        self.updated_at = Utc::now();
    }

    /// Queues the next listing page unless it was already visited
    pub fn push_frontier(&mut self, page_url: &str) {
        if !self.visited_listing_pages.contains(page_url)
            && !self.frontier.iter().any(|u| u == page_url)
        {
            self.frontier.push_back(page_url.to_string());
        }
    }

    /// Next pending listing page, if any
    pub fn next_pending(&self) -> Option<String> {
        self.frontier.front().cloned()
    }

    /// Writes the checkpoint to disk
    ///
    /// Written to a sibling temp file first and renamed into place so a
    /// crash mid-write cannot corrupt the previous checkpoint.
    pub fn save(&self, path: &Path) -> Result<(), CatwalkError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        tracing::debug!(
            "checkpoint written: {} visited, {} discovered, {} pending",
            self.visited_listing_pages.len(),
            self.discovered_item_urls.len(),
            self.frontier.len()
        );
        Ok(())
    }

    /// Loads a checkpoint from disk, if one exists
    pub fn load(path: &Path) -> Result<Option<Self>, CatwalkError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)?;
        let state: Self = serde_json::from_str(&content)
            .map_err(|e| CatwalkError::Checkpoint(format!("corrupt checkpoint file: {}", e)))?;
        Ok(Some(state))
    }

    /// Restores state from a checkpoint or starts fresh
    ///
    /// A checkpoint written under a different config hash is still used,
    /// with a warning; `--fresh` at the CLI level deletes it instead.
    pub fn restore_or_new(
        path: &Path,
        config_hash: &str,
        start_url: &str,
    ) -> Result<Self, CatwalkError> {
        match Self::load(path)? {
            Some(state) => {
                if state.config_hash != config_hash {
                    tracing::warn!(
                        "checkpoint was written with a different config (hash {} vs {}); \
                         resuming anyway",
                        state.config_hash,
                        config_hash
                    );
                }
                tracing::info!(
                    "resuming from checkpoint: {} pages visited, {} items discovered, \
                     {} pages pending",
                    state.visited_listing_pages.len(),
                    state.discovered_item_urls.len(),
                    state.frontier.len()
                );
                Ok(state)
            }
            None => Ok(Self::new(config_hash, start_url)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn dedup_boundary_rejects_repeats() {
        let mut state = CrawlState::new("hash", "https://example.com/tops?page=1");

        assert!(state.note_discovered("https://example.com/products/a"));
        assert!(state.note_discovered("https://example.com/products/b"));
        assert!(!state.note_discovered("https://example.com/products/a"));

        assert_eq!(state.discovered_item_urls.len(), 2);
        assert_eq!(
            state.discovered_order,
            vec![
                "https://example.com/products/a".to_string(),
                "https://example.com/products/b".to_string()
            ]
        );
    }

    #[test]
    fn retracted_urls_can_be_rediscovered() {
        let mut state = CrawlState::new("hash", "https://example.com/tops?page=1");

        assert!(state.note_discovered("https://example.com/products/a"));
        state.retract_discovered("https://example.com/products/a");

        assert!(state.discovered_item_urls.is_empty());
        assert!(state.discovered_order.is_empty());
        assert!(state.note_discovered("https://example.com/products/a"));
    }

    #[test]
    fn visiting_removes_from_frontier() {
        let mut state = CrawlState::new("hash", "https://example.com/tops?page=1");
        state.push_frontier("https://example.com/tops?page=2");

        state.mark_visited("https://example.com/tops?page=1");
        assert_eq!(
            state.next_pending(),
            Some("https://example.com/tops?page=2".to_string())
        );

        state.mark_visited("https://example.com/tops?page=2");
        assert_eq!(state.next_pending(), None);
    }

    #[test]
    fn visited_pages_are_not_requeued() {
        let mut state = CrawlState::new("hash", "https://example.com/tops?page=1");
        state.mark_visited("https://example.com/tops?page=1");
        state.push_frontier("https://example.com/tops?page=1");
        assert_eq!(state.next_pending(), None);
    }

    #[test]
    fn checkpoint_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("checkpoint.json");

        let mut state = CrawlState::new("hash", "https://example.com/tops?page=1");
        state.note_discovered("https://example.com/products/a");
        state.mark_visited("https://example.com/tops?page=1");
        state.push_frontier("https://example.com/tops?page=2");
        state.save(&path).unwrap();

        let restored = CrawlState::load(&path).unwrap().unwrap();
        assert_eq!(restored.config_hash, "hash");
        assert!(restored
            .visited_listing_pages
            .contains("https://example.com/tops?page=1"));
        assert!(restored
            .discovered_item_urls
            .contains("https://example.com/products/a"));
        assert_eq!(
            restored.next_pending(),
            Some("https://example.com/tops?page=2".to_string())
        );
    }

    #[test]
    fn load_missing_checkpoint_is_none() {
        let dir = TempDir::new().unwrap();
        let result = CrawlState::load(&dir.path().join("missing.json")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn corrupt_checkpoint_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("checkpoint.json");
        std::fs::write(&path, "{ not json").unwrap();

        let result = CrawlState::load(&path);
        assert!(matches!(result, Err(CatwalkError::Checkpoint(_))));
    }

    #[test]
    fn restore_or_new_starts_fresh_without_checkpoint() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("checkpoint.json");
        let state =
            CrawlState::restore_or_new(&path, "hash", "https://example.com/tops?page=1").unwrap();
        assert_eq!(
            state.next_pending(),
            Some("https://example.com/tops?page=1".to_string())
        );
    }
}
