//! One inventory run: walk the root and stream every record into the sinks.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use dirlisthash_core::{RunConfig, RunSummary, WalkError};
use dirlisthash_scan::{Walk, WalkProgress, Walker};
use dirlisthash_sink::{CompositeSink, RecordSink, SinkError};

/// Fatal run errors.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Walk(#[from] WalkError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("No output destinations configured")]
    NoOutputs,
}

/// Result of a run that reached the end of traversal.
#[derive(Debug)]
pub struct RunOutcome {
    pub summary: RunSummary,
    /// Sinks that failed to open or close. The others hold the full stream.
    pub sink_failures: Vec<SinkError>,
}

impl RunOutcome {
    /// A run succeeds when every sink closed cleanly and it was not
    /// interrupted. Entry warnings do not count against it.
    pub fn is_success(&self) -> bool {
        self.sink_failures.is_empty() && !self.summary.interrupted
    }
}

/// Wires a [`Walker`] to the configured sinks.
pub struct Inventory {
    config: RunConfig,
    walker: Walker,
}

impl Inventory {
    pub fn new(config: RunConfig) -> Result<Self, RunError> {
        if config.outputs.is_empty() {
            return Err(RunError::NoOutputs);
        }
        let walker = Walker::new(&config)?;
        Ok(Self { config, walker })
    }

    /// Stop the run early once `flag` is set.
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.walker = self.walker.with_interrupt(flag);
        self
    }

    /// Subscribe to per-record progress.
    pub fn subscribe(&self) -> broadcast::Receiver<WalkProgress> {
        self.walker.subscribe()
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Run the inventory.
    ///
    /// The root is validated before any output is opened. A write failure
    /// aborts traversal; sinks are still closed.
    pub fn run(&self) -> Result<RunOutcome, RunError> {
        let walk = self.walker.walk()?;
        let sink = CompositeSink::open(&self.config.outputs, &self.config)?;
        drain(walk, sink)
    }
}

/// Stream every record of `walk` into `sink`, then close it.
fn drain(mut walk: Walk<'_>, mut sink: CompositeSink) -> Result<RunOutcome, RunError> {
    let mut sink_failures = sink.take_open_failures();

    debug!(root = %walk.root().display(), outputs = sink.len(), "run started");

    let mut write_error = None;
    for record in walk.by_ref() {
        if let Err(e) = sink.write(&record) {
            write_error = Some(e);
            break;
        }
    }

    let summary = walk.finish();
    let closed = sink.close();

    if let Some(e) = write_error {
        if let Err(close_error) = closed {
            warn!("{close_error}");
        }
        return Err(RunError::Sink(e));
    }

    if let Err(e) = closed {
        sink_failures.extend(e.into_failures());
    }

    Ok(RunOutcome {
        summary,
        sink_failures,
    })
}
