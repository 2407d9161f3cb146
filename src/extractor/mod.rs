//! Extraction orchestration split into focused submodules.
//!
//! The `Extractor` struct and its methods are organized by concern:
//! - [`count`] - Count-only queries used for verification
//! - [`pagination`] - Offset-based page loop for one layer
//! - [`verified`] - Count-verified fetch of one data set
//! - [`contours`] - Depth-contour group with interval tagging and merge

mod contours;
mod count;
mod pagination;
mod verified;

pub use contours::ContourReport;

use crate::config::Config;
use crate::error::Result;
use crate::transport::Transport;
use crate::types::{Event, RunSummary};
use chrono::Utc;
use std::sync::Arc;

/// Runs an extraction plan against the remote feature service
///
/// The extractor owns the authenticated [`Transport`] and hands it to every
/// request; all work is strictly sequential.
#[derive(Clone)]
pub struct Extractor {
    /// Configuration (validated at construction)
    pub(crate) config: Arc<Config>,
    /// Shared HTTP client with the subscription key installed
    pub(crate) transport: Transport,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
}

impl Extractor {
    /// Validate the configuration, resolve the API key and build the transport
    ///
    /// Fails fast with a configuration error when no API key is available.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let api_key = config.resolve_api_key()?;
        let transport = Transport::new(api_key, config.paging.request_timeout)?;
        Ok(Self::with_transport(config, transport))
    }

    /// Build an extractor around an existing transport
    ///
    /// The configuration is used as given; call [`Config::validate`] first.
    pub fn with_transport(config: Config, transport: Transport) -> Self {
        let (event_tx, _) = tokio::sync::broadcast::channel(config.event_channel_capacity.max(1));
        Self {
            config: Arc::new(config),
            transport,
            event_tx,
        }
    }

    /// Subscribe to progress events
    ///
    /// Events emitted before subscribing are not replayed, so subscribe before
    /// calling [`run`](Self::run).
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// The active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Emit an event to all subscribers; dropped silently when nobody listens
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }

    /// Run the whole plan: every data set in order, then the contour group
    ///
    /// The first unrecovered error aborts the run; outputs already written stay
    /// on disk. Count mismatches are reported, never raised.
    pub async fn run(&self) -> Result<RunSummary> {
        let started_at = Utc::now();
        let plan = &self.config.plan;

        tracing::info!(
            datasets = plan.datasets.len(),
            contour_layers = plan.contours.as_ref().map_or(0, |g| g.layers.len()),
            output_dir = %self.config.output_dir.display(),
            "Starting extraction run"
        );

        let mut datasets = Vec::new();
        for dataset in &plan.datasets {
            let (_, report) = self.fetch_and_verify(dataset).await?;
            datasets.push(report);
        }

        let merged = match &plan.contours {
            Some(group) => {
                let report = self.fetch_contours(group).await?;
                datasets.extend(report.datasets);
                Some(report.merged)
            }
            None => None,
        };

        let summary = RunSummary {
            started_at,
            finished_at: Utc::now(),
            datasets,
            merged,
        };

        let mismatches = summary.mismatches().count();
        self.emit_event(Event::RunComplete {
            datasets: summary.datasets.len(),
            mismatches,
        });
        tracing::info!(
            datasets = summary.datasets.len(),
            mismatches,
            elapsed_secs = (summary.finished_at - summary.started_at).num_seconds(),
            "Extraction run finished"
        );

        Ok(summary)
    }
}
