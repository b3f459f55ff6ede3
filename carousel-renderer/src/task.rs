//! Background export tasks.
//!
//! An export runs on the Tokio runtime against a snapshot taken when it was
//! started, so edits made while it is in flight never leak into the
//! output. Starting a new export through the same [`ExportRunner`] aborts
//! the previous one.

use carousel_core::SlideDeck;
use tokio::task::{JoinError, JoinHandle};

use crate::error::{RenderError, RenderResult};
use crate::export::{DeckExporter, ExportDocument};

/// Handle to an in-flight export.
#[derive(Debug)]
pub struct ExportTask {
    handle: JoinHandle<RenderResult<ExportDocument>>,
}

impl ExportTask {
    /// Wait for the export to finish.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Cancelled`] if the task was aborted, or the
    /// export's own error.
    pub async fn wait(self) -> RenderResult<ExportDocument> {
        self.handle.await.map_err(join_error)?
    }

    /// Abort the export. Awaiting it afterwards yields
    /// [`RenderError::Cancelled`].
    pub fn cancel(&self) {
        self.handle.abort();
    }

    /// Whether the task has completed, successfully or not.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    fn abort_handle(&self) -> tokio::task::AbortHandle {
        self.handle.abort_handle()
    }
}

/// Starts exports, keeping at most one running at a time.
#[derive(Debug, Default)]
pub struct ExportRunner {
    exporter: DeckExporter,
    running: Option<tokio::task::AbortHandle>,
}

impl ExportRunner {
    /// Create a runner around an exporter.
    #[must_use]
    pub fn new(exporter: DeckExporter) -> Self {
        Self {
            exporter,
            running: None,
        }
    }

    /// The exporter used for new tasks.
    #[must_use]
    pub fn exporter(&self) -> &DeckExporter {
        &self.exporter
    }

    /// Snapshot `deck` and export it in the background.
    ///
    /// Any export previously started by this runner is aborted.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&mut self, deck: &SlideDeck) -> ExportTask {
        self.cancel();

        let snapshot = deck.snapshot();
        let exporter = self.exporter.clone();
        let handle = tokio::spawn(async move { exporter.export_snapshot(snapshot).await });
        let task = ExportTask { handle };
        self.running = Some(task.abort_handle());
        tracing::debug!("Started background export");
        task
    }

    /// Abort the running export, if any.
    pub fn cancel(&mut self) {
        if let Some(running) = self.running.take() {
            if !running.is_finished() {
                tracing::info!("Cancelling superseded export");
                running.abort();
            }
        }
    }
}

fn join_error(err: JoinError) -> RenderError {
    if err.is_cancelled() {
        RenderError::Cancelled
    } else {
        RenderError::Export(format!("export task panicked: {err}"))
    }
}
