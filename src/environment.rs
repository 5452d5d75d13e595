use std::sync::Arc;

use log::{info, Logger};

use crate::config::Config;
use crate::roster::Roster;
use crate::source::{self, Source};

/// Bundles what a UI shell needs to stand up the engine: a logger, the
/// configuration, and the external record source.
#[derive(Clone)]
pub struct Environment {
    pub logger: Arc<Logger>,
    pub config: Config,
    pub source: Arc<dyn Source + Send + Sync>,
}

impl Environment {
    /// Creates a new instance.
    pub fn new(logger: Arc<Logger>, config: Config, source: Arc<dyn Source + Send + Sync>) -> Self {
        Self {
            logger,
            config,
            source,
        }
    }

    /// Performs the one-shot initial load and returns a seeded roster.
    /// The load is fire-and-forget: no retry, no cancellation beyond
    /// dropping this future, which discards whatever the source would
    /// have returned.
    pub async fn seed(&self) -> Roster {
        let members = source::load_or_fallback(&self.logger, self.source.as_ref()).await;

        info!(self.logger, "Seeded roster"; "count" => members.len());

        Roster::seeded(members, self.config.clone())
    }
}
