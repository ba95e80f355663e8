//! Pipeline coordinator
//!
//! Wires the three stages together: a single walker task drives listing
//! pagination, a bounded pool of worker tasks turns discovered URLs into
//! records (detail fetch, then enrichment), and one sink collects the
//! results. Discovered URLs are also appended to the seed file, the jsonl
//! handoff that lets the detail stage run on its own later.

use crate::config::Config;
use crate::fetch::{build_http_client, RateLimiter, RetryPolicy};
use crate::output::{MultiFormatSink, RecordSink};
use crate::pipeline::detail::DetailProcessor;
use crate::pipeline::enrich::Enricher;
use crate::pipeline::walker::{ListingWalker, WalkTerminal};
use crate::robots::fetch_robots;
use crate::state::CrawlState;
use crate::url::normalize_url;
use crate::CatwalkError;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};
use url::Url;

/// Which part of the pipeline to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Discovery, detail, and enrichment in one streaming run
    Full,
    /// Listing walk only; discovered URLs go to the seed file
    Discover,
    /// Detail and enrichment for URLs already in the seed file
    Details,
}

impl std::str::FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(Self::Full),
            "discover" => Ok(Self::Discover),
            "details" => Ok(Self::Details),
            other => Err(format!(
                "unknown stage '{}' (expected full, discover, or details)",
                other
            )),
        }
    }
}

/// What a finished run did
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub pages_visited: usize,
    pub urls_discovered: usize,
    pub records_complete: usize,
    pub records_failed: usize,
    /// Operator shutdown cut the run short; progress is checkpointed
    pub interrupted: bool,
    /// The listing walk ended on a fetch failure or robots denial
    pub walk_aborted: bool,
}

impl RunSummary {
    /// False only when the walk aborted before visiting a single page —
    /// the one outcome that produced nothing and left nothing to resume
    /// beyond the start URL.
    pub fn succeeded(&self) -> bool {
        !(self.walk_aborted && self.pages_visited == 0)
    }
}

/// Runs one pipeline stage to completion
pub async fn run_pipeline(
    config: Config,
    config_hash: String,
    stage: Stage,
    fresh: bool,
    shutdown: watch::Receiver<bool>,
) -> crate::Result<RunSummary> {
    Coordinator::new(config, config_hash)
        .run(stage, fresh, shutdown)
        .await
}

/// Owns the shared infrastructure of a run and orchestrates its tasks
pub struct Coordinator {
    config: Config,
    config_hash: String,
}

impl Coordinator {
    pub fn new(config: Config, config_hash: String) -> Self {
        Self {
            config,
            config_hash,
        }
    }

    pub async fn run(
        &self,
        stage: Stage,
        fresh: bool,
        shutdown: watch::Receiver<bool>,
    ) -> crate::Result<RunSummary> {
        let started = std::time::Instant::now();
        let config = &self.config;
        let user_agent = config.user_agent.header_value();
        let client = build_http_client(&config.user_agent)?;
        let limiter = RateLimiter::new(
            config.crawler.concurrency_limit,
            Duration::from_secs_f64(config.crawler.request_delay_seconds),
        );
        let retry = RetryPolicy::new(config.crawler.retry_budget);

        let checkpoint_path = PathBuf::from(&config.output.checkpoint_path);
        let seed_path = PathBuf::from(&config.output.seed_file);

        if fresh {
            for path in [&checkpoint_path, &seed_path] {
                if path.exists() {
                    std::fs::remove_file(path)?;
                    tracing::info!("removed {} for a fresh run", path.display());
                }
            }
        }

        let start_url = Url::parse(&config.site.start_url)?;
        let robots = fetch_robots(&client, &start_url, config.crawler.robots_policy).await;

        let sink = Arc::new(MultiFormatSink::new(
            &config.output.directory,
            config.output.formats.clone(),
        ));

        let summary = match stage {
            Stage::Discover | Stage::Full => {
                let resumed = checkpoint_path.exists();

                // On a resumed full run the seed file holds URLs from the
                // interrupted run whose records were lost with that
                // process; re-queue them so this run's output is complete.
                let backlog = if stage == Stage::Full && resumed {
                    match read_seed_file(&seed_path) {
                        Ok(urls) => urls,
                        Err(CatwalkError::SeedFileMissing { .. }) => Vec::new(),
                        Err(e) => return Err(e),
                    }
                } else {
                    Vec::new()
                };

                let normalized_start = normalize_url(config.site.start_url.as_str())?;
                let state = CrawlState::restore_or_new(
                    &checkpoint_path,
                    &self.config_hash,
                    normalized_start.as_str(),
                )?;

                let walker = ListingWalker::new(
                    client.clone(),
                    limiter.clone(),
                    retry,
                    robots.clone(),
                    user_agent.clone(),
                    checkpoint_path.clone(),
                    state,
                );

                let (walk_tx, mut walk_rx) = mpsc::channel::<String>(64);
                let mut seed_file = open_seed_file(&seed_path, resumed)?;
                let walker_task = tokio::spawn(walker.run(walk_tx, shutdown.clone()));

                if stage == Stage::Discover {
                    while let Some(url) = walk_rx.recv().await {
                        write_seed_line(&mut seed_file, &url)?;
                    }
                    seed_file.flush()?;

                    let report = walker_task.await.map_err(join_error)??;
                    let (interrupted, walk_aborted) = classify_terminal(&report.terminal);

                    RunSummary {
                        pages_visited: report.pages_visited,
                        urls_discovered: report.urls_discovered_total,
                        records_complete: 0,
                        records_failed: 0,
                        interrupted: interrupted || *shutdown.borrow(),
                        walk_aborted,
                    }
                } else {
                    let (work_tx, work_rx) = mpsc::channel::<String>(64);
                    let workers = self.spawn_workers(
                        Arc::new(Mutex::new(work_rx)),
                        &client,
                        &limiter,
                        retry,
                        robots.clone(),
                        &user_agent,
                        sink.clone(),
                        shutdown.clone(),
                    );

                    let feeder = tokio::spawn(async move {
                        let mut work_tx = Some(work_tx);
                        for url in backlog {
                            // Backlog URLs are already in the seed file;
                            // once the workers are gone there is nothing
                            // left to do with them this run.
                            let Some(tx) = work_tx.as_ref() else { break };
                            if tx.send(url).await.is_err() {
                                work_tx = None;
                            }
                        }
                        // Seed-file writes outlive the workers: every URL
                        // the walker emits is persisted even when no one
                        // will process it this run, so a resume can
                        // re-queue it from the file.
                        while let Some(url) = walk_rx.recv().await {
                            if let Err(e) = write_seed_line(&mut seed_file, &url) {
                                tracing::error!("failed to append to seed file: {}", e);
                            }
                            if let Some(tx) = work_tx.as_ref() {
                                if tx.send(url).await.is_err() {
                                    work_tx = None;
                                }
                            }
                        }
                        if let Err(e) = seed_file.flush() {
                            tracing::error!("failed to flush seed file: {}", e);
                        }
                    });

                    let walk_result = walker_task.await.map_err(join_error)?;
                    feeder.await.map_err(join_error)?;
                    for worker in workers {
                        worker.await.map_err(join_error)?;
                    }

                    // Flush whatever was collected before surfacing a
                    // walker error; partial output beats none.
                    sink.flush()?;

                    let report = walk_result?;
                    let (interrupted, walk_aborted) = classify_terminal(&report.terminal);
                    let (records_complete, records_failed) = sink.status_counts();

                    RunSummary {
                        pages_visited: report.pages_visited,
                        urls_discovered: report.urls_discovered_total,
                        records_complete,
                        records_failed,
                        interrupted: interrupted || *shutdown.borrow(),
                        walk_aborted,
                    }
                }
            }

            Stage::Details => {
                let urls = read_seed_file(&seed_path)?;
                tracing::info!(
                    "detail stage: {} item urls from {}",
                    urls.len(),
                    seed_path.display()
                );

                let (work_tx, work_rx) = mpsc::channel::<String>(64);
                let workers = self.spawn_workers(
                    Arc::new(Mutex::new(work_rx)),
                    &client,
                    &limiter,
                    retry,
                    robots,
                    &user_agent,
                    sink.clone(),
                    shutdown.clone(),
                );

                let url_count = urls.len();
                for url in urls {
                    if work_tx.send(url).await.is_err() {
                        break;
                    }
                }
                drop(work_tx);

                for worker in workers {
                    worker.await.map_err(join_error)?;
                }
                sink.flush()?;

                let (records_complete, records_failed) = sink.status_counts();
                RunSummary {
                    pages_visited: 0,
                    urls_discovered: url_count,
                    records_complete,
                    records_failed,
                    interrupted: *shutdown.borrow(),
                    walk_aborted: false,
                }
            }
        };

        tracing::info!(
            "run finished in {:.1?}: {} listing pages, {} urls discovered, \
             {} records complete, {} failed",
            started.elapsed(),
            summary.pages_visited,
            summary.urls_discovered,
            summary.records_complete,
            summary.records_failed
        );

        Ok(summary)
    }

    #[allow(clippy::too_many_arguments)]
    fn spawn_workers(
        &self,
        work_rx: Arc<Mutex<mpsc::Receiver<String>>>,
        client: &reqwest::Client,
        limiter: &RateLimiter,
        retry: RetryPolicy,
        robots: crate::robots::RobotsRules,
        user_agent: &str,
        sink: Arc<MultiFormatSink>,
        shutdown: watch::Receiver<bool>,
    ) -> Vec<tokio::task::JoinHandle<()>> {
        let detail = Arc::new(DetailProcessor::new(
            client.clone(),
            limiter.clone(),
            retry,
            robots,
            user_agent.to_string(),
        ));
        let enricher = Arc::new(Enricher::new(
            client.clone(),
            limiter.clone(),
            retry,
            self.config.site.reviews_endpoint.clone(),
            self.config.site.store_id.clone(),
        ));

        (0..self.config.crawler.concurrency_limit.max(1))
            .map(|worker_id| {
                let work_rx = work_rx.clone();
                let detail = detail.clone();
                let enricher = enricher.clone();
                let sink = sink.clone();
                let shutdown = shutdown.clone();

                tokio::spawn(async move {
                    loop {
                        if *shutdown.borrow() {
                            tracing::debug!("worker {} stopping on shutdown", worker_id);
                            break;
                        }

                        let next = work_rx.lock().await.recv().await;
                        let Some(url) = next else { break };

                        let record = detail.process(&url).await;
                        let record = enricher.enrich(record).await;
                        if let Err(e) = sink.accept(record) {
                            tracing::error!("dropping record for {}: {}", url, e);
                        }
                    }
                    tracing::debug!("worker {} finished", worker_id);
                })
            })
            .collect()
    }
}

fn classify_terminal(terminal: &WalkTerminal) -> (bool, bool) {
    match terminal {
        WalkTerminal::Done => (false, false),
        WalkTerminal::Interrupted => (true, false),
        WalkTerminal::Aborted { url, reason } => {
            tracing::error!("listing walk aborted at {}: {}", url, reason);
            (false, true)
        }
    }
}

fn join_error(e: tokio::task::JoinError) -> CatwalkError {
    CatwalkError::Io(std::io::Error::new(
        std::io::ErrorKind::Other,
        format!("pipeline task failed: {}", e),
    ))
}

fn open_seed_file(path: &Path, resumed: bool) -> std::io::Result<std::fs::File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    if resumed {
        std::fs::OpenOptions::new().create(true).append(true).open(path)
    } else {
        std::fs::File::create(path)
    }
}

fn write_seed_line(file: &mut std::fs::File, url: &str) -> std::io::Result<()> {
    writeln!(file, "{}", serde_json::json!({ "source_url": url }))
}

/// Reads the discovered-URL handoff file
///
/// One JSON object per line with a `source_url` key. A missing file means
/// discovery has not run; a malformed line is reported with its number
/// rather than silently skipped.
fn read_seed_file(path: &Path) -> crate::Result<Vec<String>> {
    if !path.exists() {
        return Err(CatwalkError::SeedFileMissing {
            path: path.display().to_string(),
        });
    }

    let content = std::fs::read_to_string(path)?;
    let mut urls = Vec::new();

    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let value: serde_json::Value =
            serde_json::from_str(line).map_err(|e| CatwalkError::SeedFileMalformed {
                line: index + 1,
                message: e.to_string(),
            })?;

        match value.get("source_url").and_then(|v| v.as_str()) {
            Some(url) => urls.push(url.to_string()),
            None => {
                return Err(CatwalkError::SeedFileMalformed {
                    line: index + 1,
                    message: "missing 'source_url' key".to_string(),
                })
            }
        }
    }

    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn stage_parses_from_cli_names() {
        assert_eq!("full".parse::<Stage>().unwrap(), Stage::Full);
        assert_eq!("discover".parse::<Stage>().unwrap(), Stage::Discover);
        assert_eq!("details".parse::<Stage>().unwrap(), Stage::Details);
        assert!("everything".parse::<Stage>().is_err());
    }

    #[test]
    fn summary_fails_only_on_fruitless_abort() {
        let mut summary = RunSummary {
            pages_visited: 0,
            urls_discovered: 0,
            records_complete: 0,
            records_failed: 0,
            interrupted: false,
            walk_aborted: true,
        };
        assert!(!summary.succeeded());

        summary.pages_visited = 3;
        assert!(summary.succeeded(), "partial progress counts as success");

        summary.walk_aborted = false;
        summary.pages_visited = 0;
        assert!(summary.succeeded());
    }

    #[test]
    fn seed_file_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("item_urls.jl");

        let mut file = open_seed_file(&path, false).unwrap();
        write_seed_line(&mut file, "https://example.com/products/a").unwrap();
        write_seed_line(&mut file, "https://example.com/products/b").unwrap();
        drop(file);

        let urls = read_seed_file(&path).unwrap();
        assert_eq!(
            urls,
            vec![
                "https://example.com/products/a".to_string(),
                "https://example.com/products/b".to_string()
            ]
        );
    }

    #[test]
    fn missing_seed_file_is_a_distinct_error() {
        let dir = TempDir::new().unwrap();
        let result = read_seed_file(&dir.path().join("item_urls.jl"));
        assert!(matches!(result, Err(CatwalkError::SeedFileMissing { .. })));
    }

    #[test]
    fn malformed_seed_line_reports_its_number() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("item_urls.jl");
        std::fs::write(
            &path,
            "{\"source_url\": \"https://example.com/products/a\"}\nnot json\n",
        )
        .unwrap();

        match read_seed_file(&path) {
            Err(CatwalkError::SeedFileMalformed { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected malformed error, got {:?}", other.map(|v| v.len())),
        }
    }

    #[test]
    fn seed_line_without_url_key_is_malformed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("item_urls.jl");
        std::fs::write(&path, "{\"url\": \"https://example.com/products/a\"}\n").unwrap();

        assert!(matches!(
            read_seed_file(&path),
            Err(CatwalkError::SeedFileMalformed { line: 1, .. })
        ));
    }

    #[test]
    fn reopening_resumed_appends_instead_of_truncating() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("item_urls.jl");

        let mut file = open_seed_file(&path, false).unwrap();
        write_seed_line(&mut file, "https://example.com/products/a").unwrap();
        drop(file);

        let mut file = open_seed_file(&path, true).unwrap();
        write_seed_line(&mut file, "https://example.com/products/b").unwrap();
        drop(file);

        assert_eq!(read_seed_file(&path).unwrap().len(), 2);

        let mut file = open_seed_file(&path, false).unwrap();
        write_seed_line(&mut file, "https://example.com/products/c").unwrap();
        drop(file);

        assert_eq!(read_seed_file(&path).unwrap().len(), 1);
    }
}
