//! Live monitoring functionality for salespivot
//!
//! Watches the record files for changes and redraws the pivot table at the
//! configured interval. Every change reloads the full record set and
//! rebuilds the table; expansion state carries over because node ids only
//! depend on labels. Endpoint sources have nothing to watch and are polled
//! on every tick instead.

use crate::{
    error::{PivotError, Result},
    report::{ReportOptions, render_pivot},
    session::PivotSession,
    source::{RecordQuery, RecordSource},
};
use chrono::Local;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::{
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tokio::{
    sync::mpsc,
    time::{MissedTickBehavior, interval},
};
use tracing::{debug, warn};

// Constants for watcher thread management
const WATCHER_POLL_INTERVAL: Duration = Duration::from_millis(100);
const WATCHER_SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(200); // 2x poll interval
const WRITE_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Live monitoring state
pub struct LiveMonitor {
    source: Arc<dyn RecordSource>,
    watch_paths: Vec<PathBuf>,
    query: RecordQuery,
    session: PivotSession,
    options: ReportOptions,
    interval_secs: u64,
}

fn is_record_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("json") | Some("jsonl")
    )
}

impl LiveMonitor {
    /// Create a monitor
    ///
    /// `watch_paths` are the files or directories to watch; pass none to
    /// poll the source on every tick.
    pub fn new(
        source: Arc<dyn RecordSource>,
        watch_paths: Vec<PathBuf>,
        query: RecordQuery,
        session: PivotSession,
        options: ReportOptions,
        interval_secs: u64,
    ) -> Self {
        Self {
            source,
            watch_paths,
            query,
            session,
            options,
            interval_secs: interval_secs.max(1),
        }
    }

    /// Current session
    pub fn session(&self) -> &PivotSession {
        &self.session
    }

    /// Reload the full record set from the source
    ///
    /// On error the previous record set stays in place.
    pub async fn reload(&mut self) -> Result<usize> {
        let records = self.source.load_all(&self.query).await?;
        let count = records.len();
        self.session.replace_data(records);
        Ok(count)
    }

    /// Render the table for the current record set
    pub fn render(&mut self) -> String {
        render_pivot(&mut self.session, self.options)
    }

    /// Start the live monitoring loop
    pub async fn run(mut self) -> Result<()> {
        // Track if we need to refresh
        let should_refresh = Arc::new(AtomicBool::new(true));
        let should_refresh_watcher = should_refresh.clone();

        // Track if we should stop
        let should_stop = Arc::new(AtomicBool::new(false));
        let should_stop_watcher = should_stop.clone();

        let poll_every_tick = self.watch_paths.is_empty();

        // Set up file watching
        let (tx, mut rx) = mpsc::channel(10);
        let watched = self.watch_paths.clone();

        let mut watcher_handle = tokio::task::spawn_blocking(move || -> Result<()> {
            if watched.is_empty() {
                return Ok(());
            }

            let mut watcher = RecommendedWatcher::new(
                move |result: notify::Result<Event>| {
                    if let Ok(event) = result
                        && matches!(
                            event.kind,
                            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                        )
                        && event.paths.iter().any(|path| is_record_file(path))
                    {
                        should_refresh_watcher.store(true, Ordering::Release);
                        let _ = tx.blocking_send(());
                    }
                },
                Config::default(),
            )
            .map_err(|e| PivotError::Config(format!("Failed to create file watcher: {e}")))?;

            for path in watched {
                if path.exists() {
                    watcher
                        .watch(&path, RecursiveMode::NonRecursive)
                        .map_err(|e| {
                            PivotError::Config(format!(
                                "Failed to watch {}: {e}",
                                path.display()
                            ))
                        })?;
                }
            }

            // Keep the watcher alive until we're told to stop
            while !should_stop_watcher.load(Ordering::Acquire) {
                std::thread::sleep(WATCHER_POLL_INTERVAL);
            }

            drop(watcher);
            Ok(())
        });

        // Set up interval timer
        let mut interval = interval(Duration::from_secs(self.interval_secs));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // Main monitoring loop
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if poll_every_tick || should_refresh.swap(false, Ordering::AcqRel) {
                        self.refresh_display().await;
                    }
                }
                Some(()) = rx.recv() => {
                    // File change detected, wait a bit for writes to complete
                    tokio::time::sleep(WRITE_SETTLE_DELAY).await;
                    should_refresh.store(false, Ordering::Release);
                    self.refresh_display().await;
                }
                _ = tokio::signal::ctrl_c() => {
                    // Graceful shutdown
                    println!("\nExiting live monitoring mode...");
                    break;
                }
            }
        }

        // Signal the watcher thread to stop
        should_stop.store(true, Ordering::Release);

        // Wait for the watcher to finish with a timeout
        tokio::select! {
            res = &mut watcher_handle => {
                match res {
                    Ok(Ok(())) => debug!("Watcher task exited gracefully"),
                    Ok(Err(e)) => warn!("Watcher task exited with an error: {}", e),
                    Err(e) => warn!("Watcher task failed: {}", e),
                }
            }
            _ = tokio::time::sleep(WATCHER_SHUTDOWN_TIMEOUT) => {
                watcher_handle.abort();
                let _ = watcher_handle.await;
                warn!("Watcher task was aborted because it did not shut down gracefully in time");
            }
        }

        Ok(())
    }

    /// Reload and redraw; load errors keep the last table on screen
    async fn refresh_display(&mut self) {
        if let Err(e) = self.reload().await {
            warn!(
                "Failed to reload records from {}: {}",
                self.source.describe(),
                e
            );
        }

        if !self.options.json {
            print!("\x1B[2J\x1B[1;1H"); // Clear screen and move cursor to top-left
            println!(
                "Live Monitoring - Last updated: {}",
                Local::now().format("%Y-%m-%d %H:%M:%S")
            );
            println!(
                "Source: {} | Refresh interval: {}s | Press Ctrl+C to exit",
                self.source.describe(),
                self.interval_secs
            );
            println!("{}", "-".repeat(80));
        }

        println!("{}", self.render());
    }
}
