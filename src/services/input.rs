//! Keystroke damping for live search.
//!
//! Raw input flows through two stages before the query engine runs:
//!
//! 1. **Debounce**: the settled value only changes once no keystroke has
//!    arrived for the configured delay. Each keystroke restarts the timer.
//! 2. **Commit**: recomputation of the settled value is deferred behind
//!    other ready work, and skipped if a newer value lands in the meantime.
//!
//! Both stages publish their latest value on `watch` channels, so a committed
//! result always belongs to the most recently settled input.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use crate::models::Movie;
use crate::services::query::{QueryOptions, run_query};

/// Timer state for a single debounced value.
#[derive(Debug, Clone)]
pub struct Debounce<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
    settled: T,
}

impl<T: Clone + PartialEq> Debounce<T> {
    pub const fn new(initial: T, delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
            settled: initial,
        }
    }

    /// Records a keystroke at `now`, replacing any pending value and timer.
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.delay));
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at)
    }

    /// Settles the pending value once its deadline has passed.
    ///
    /// Returns the new settled value only when it differs from the previous one.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match self.pending.take() {
            Some((value, at)) if at <= now => {
                if value == self.settled {
                    return None;
                }
                self.settled = value.clone();
                Some(value)
            }
            pending => {
                self.pending = pending;
                None
            }
        }
    }

    #[must_use]
    pub const fn settled(&self) -> &T {
        &self.settled
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Result list produced for one settled search.
#[derive(Debug, Clone, Default)]
pub struct Committed {
    /// Increments on every recomputation.
    pub revision: u64,
    pub search: String,
    pub options: QueryOptions,
    pub results: Arc<Vec<Movie>>,
}

/// Running debounce and commit stages over a fixed movie set.
///
/// Dropping the pipeline stops both stages.
pub struct SearchPipeline {
    raw_tx: watch::Sender<String>,
    options_tx: watch::Sender<QueryOptions>,
    settled_rx: watch::Receiver<String>,
    committed_rx: watch::Receiver<Committed>,
    tasks: Vec<JoinHandle<()>>,
}

impl SearchPipeline {
    /// Starts both stages on the current tokio runtime.
    #[must_use]
    pub fn spawn(movies: Arc<Vec<Movie>>, options: QueryOptions, delay: Duration) -> Self {
        let (raw_tx, raw_rx) = watch::channel(String::new());
        let (settled_tx, settled_rx) = watch::channel(String::new());
        let (options_tx, options_rx) = watch::channel(options);
        let (committed_tx, committed_rx) = watch::channel(Committed {
            options,
            ..Committed::default()
        });

        let tasks = vec![
            tokio::spawn(debounce_stage(raw_rx, settled_tx, delay)),
            tokio::spawn(commit_stage(
                settled_rx.clone(),
                options_rx,
                committed_tx,
                movies,
            )),
        ];

        Self {
            raw_tx,
            options_tx,
            settled_rx,
            committed_rx,
            tasks,
        }
    }

    /// Replaces the raw search text (the whole input box, not a delta).
    pub fn input(&self, text: impl Into<String>) {
        self.raw_tx.send_replace(text.into());
    }

    /// Sort changes skip the debounce and trigger a recomputation directly.
    pub fn set_options(&self, options: QueryOptions) {
        self.options_tx.send_if_modified(|current| {
            if *current == options {
                false
            } else {
                *current = options;
                true
            }
        });
    }

    #[must_use]
    pub fn raw(&self) -> String {
        self.raw_tx.borrow().clone()
    }

    #[must_use]
    pub fn settled(&self) -> String {
        self.settled_rx.borrow().clone()
    }

    #[must_use]
    pub fn committed(&self) -> Committed {
        self.committed_rx.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Committed> {
        self.committed_rx.clone()
    }

    #[must_use]
    pub fn subscribe_settled(&self) -> watch::Receiver<String> {
        self.settled_rx.clone()
    }
}

impl Drop for SearchPipeline {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

async fn debounce_stage(
    mut raw_rx: watch::Receiver<String>,
    settled_tx: watch::Sender<String>,
    delay: Duration,
) {
    let mut debounce = Debounce::new(String::new(), delay);

    loop {
        if let Some(deadline) = debounce.deadline() {
            tokio::select! {
                changed = raw_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let value = raw_rx.borrow_and_update().clone();
                    debounce.push(value, Instant::now());
                }
                () = tokio::time::sleep_until(deadline) => {
                    if let Some(value) = debounce.poll(Instant::now()) {
                        debug!(search = %value, "Search input settled");
                        settled_tx.send_replace(value);
                    }
                }
            }
        } else {
            if raw_rx.changed().await.is_err() {
                break;
            }
            let value = raw_rx.borrow_and_update().clone();
            debounce.push(value, Instant::now());
        }
    }
}

async fn commit_stage(
    mut settled_rx: watch::Receiver<String>,
    mut options_rx: watch::Receiver<QueryOptions>,
    committed_tx: watch::Sender<Committed>,
    movies: Arc<Vec<Movie>>,
) {
    loop {
        tokio::select! {
            changed = settled_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            changed = options_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }

        let search = settled_rx.borrow_and_update().clone();
        let options = *options_rx.borrow_and_update();

        // Let already-queued work run first; a newer value supersedes this pass.
        tokio::task::yield_now().await;
        let superseded = settled_rx.has_changed().unwrap_or(false)
            || options_rx.has_changed().unwrap_or(false);
        if superseded {
            debug!(search = %search, "Skipping superseded search");
            continue;
        }

        let results = Arc::new(run_query(&movies, &search, options));
        debug!(search = %search, count = results.len(), "Search committed");

        committed_tx.send_modify(|committed| {
            committed.revision += 1;
            committed.search = search;
            committed.options = options;
            committed.results = results;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SortKey, SortOrder};

    const DELAY: Duration = Duration::from_millis(200);

    #[test]
    fn debounce_waits_for_quiet_period() {
        let t0 = Instant::now();
        let mut debounce = Debounce::new(String::new(), DELAY);

        debounce.push("a".to_string(), t0);
        assert_eq!(debounce.poll(t0 + Duration::from_millis(199)), None);
        assert!(debounce.is_pending());
        assert_eq!(debounce.poll(t0 + DELAY), Some("a".to_string()));
        assert_eq!(debounce.settled(), "a");
        assert!(!debounce.is_pending());
    }

    #[test]
    fn keystroke_restarts_timer() {
        let t0 = Instant::now();
        let mut debounce = Debounce::new(String::new(), DELAY);

        debounce.push("a".to_string(), t0);
        debounce.push("am".to_string(), t0 + Duration::from_millis(150));

        assert_eq!(debounce.poll(t0 + Duration::from_millis(210)), None);
        assert_eq!(debounce.settled(), "");
        assert_eq!(
            debounce.poll(t0 + Duration::from_millis(350)),
            Some("am".to_string())
        );
    }

    #[test]
    fn unchanged_value_does_not_resettle() {
        let t0 = Instant::now();
        let mut debounce = Debounce::new("heat".to_string(), DELAY);

        debounce.push("heat".to_string(), t0);
        assert_eq!(debounce.poll(t0 + DELAY), None);
        assert!(!debounce.is_pending());
    }

    fn catalogue() -> Arc<Vec<Movie>> {
        let movies = ["Fast Five", "Breakfast", "Heat", "The Last Fast"]
            .iter()
            .enumerate()
            .map(|(i, title)| {
                serde_json::from_value(serde_json::json!({
                    "id": i,
                    "title": title,
                    "vote_average": i as f64,
                }))
                .unwrap()
            })
            .collect();
        Arc::new(movies)
    }

    fn titles(committed: &Committed) -> Vec<String> {
        committed.results.iter().map(|m| m.title.clone()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn burst_of_keystrokes_commits_once() {
        let pipeline = SearchPipeline::spawn(catalogue(), QueryOptions::default(), DELAY);
        let mut committed = pipeline.subscribe();
        let start = Instant::now();

        for text in ["f", "fa", "fas", "fast"] {
            pipeline.input(text);
        }
        assert_eq!(pipeline.raw(), "fast");

        let result = committed
            .wait_for(|c| c.search == "fast")
            .await
            .unwrap()
            .clone();

        assert!(start.elapsed() >= DELAY);
        assert_eq!(result.revision, 1);
        assert_eq!(pipeline.settled(), "fast");
        assert_eq!(titles(&result), vec!["Fast Five", "The Last Fast", "Breakfast"]);
    }

    #[tokio::test(start_paused = true)]
    async fn newer_search_replaces_older_one() {
        let pipeline = SearchPipeline::spawn(catalogue(), QueryOptions::default(), DELAY);
        let mut committed = pipeline.subscribe();

        pipeline.input("fast");
        committed.wait_for(|c| c.search == "fast").await.unwrap();

        pipeline.input("heat");
        let result = committed
            .wait_for(|c| c.search == "heat")
            .await
            .unwrap()
            .clone();

        assert_eq!(titles(&result), vec!["Heat"]);
        assert_eq!(pipeline.committed().search, "heat");
    }

    #[tokio::test(start_paused = true)]
    async fn sort_change_recomputes_settled_search() {
        let pipeline = SearchPipeline::spawn(catalogue(), QueryOptions::default(), DELAY);
        let mut committed = pipeline.subscribe();

        pipeline.input("fast");
        committed.wait_for(|c| c.search == "fast").await.unwrap();

        let by_rank = QueryOptions::new(SortKey::Rank, SortOrder::Descending);
        pipeline.set_options(by_rank);
        let result = committed
            .wait_for(|c| c.options == by_rank)
            .await
            .unwrap()
            .clone();

        assert_eq!(result.search, "fast");
        assert_eq!(titles(&result), vec!["The Last Fast", "Breakfast", "Fast Five"]);
    }

    #[tokio::test(start_paused = true)]
    async fn sort_change_during_deferred_pass_skips_stale_commit() {
        let pipeline = SearchPipeline::spawn(catalogue(), QueryOptions::default(), DELAY);
        let mut settled = pipeline.subscribe_settled();
        let mut committed = pipeline.subscribe();

        pipeline.input("fast");
        settled.changed().await.unwrap();
        assert_eq!(*settled.borrow_and_update(), "fast");

        let by_rank = QueryOptions::new(SortKey::Rank, SortOrder::Descending);
        pipeline.set_options(by_rank);

        let first = committed
            .wait_for(|c| c.revision >= 1)
            .await
            .unwrap()
            .clone();
        assert_eq!(first.revision, 1);
        assert_eq!(first.search, "fast");
        assert_eq!(first.options, by_rank);
        assert_eq!(titles(&first), vec!["The Last Fast", "Breakfast", "Fast Five"]);
    }

    #[tokio::test(start_paused = true)]
    async fn clearing_search_commits_empty_results() {
        let pipeline = SearchPipeline::spawn(catalogue(), QueryOptions::default(), DELAY);
        let mut committed = pipeline.subscribe();

        pipeline.input("heat");
        committed.wait_for(|c| c.search == "heat").await.unwrap();

        pipeline.input("");
        let result = committed
            .wait_for(|c| c.search.is_empty() && c.revision > 1)
            .await
            .unwrap()
            .clone();
        assert!(result.results.is_empty());
    }
}
