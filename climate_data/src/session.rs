//! Per-session dataset cache

use crate::analysis::{add_rolling_average, yearly_mean};
use crate::clean::clean;
use crate::config::DashboardConfig;
use crate::error::Result;
use crate::loader::RawSource;
use crate::tables::{ObservationTable, YearlySeries};
use std::cell::OnceCell;
use tracing::info;

/// One viewer's session: a data source, its configuration and the
/// observation table once it has been loaded.
pub struct Session {
    source: Box<dyn RawSource>,
    config: DashboardConfig,
    observations: OnceCell<ObservationTable>,
}

impl Session {
    pub fn new(source: Box<dyn RawSource>, config: DashboardConfig) -> Self {
        Self {
            source,
            config,
            observations: OnceCell::new(),
        }
    }

    /// Session reading from the source named in `config`
    pub fn from_config(config: DashboardConfig) -> Self {
        let source = config.source.data_source();
        Self::new(Box::new(source), config)
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn source_description(&self) -> String {
        self.source.describe()
    }

    /// Whether the observation table has been loaded
    pub fn is_loaded(&self) -> bool {
        self.observations.get().is_some()
    }

    /// The observation table, fetched and cleaned on first use.
    ///
    /// A failed load leaves the session empty so a later call tries again.
    pub fn observations(&self) -> Result<&ObservationTable> {
        if let Some(table) = self.observations.get() {
            return Ok(table);
        }

        let raw = self.source.fetch()?;
        let table = clean(&raw)?;
        info!(source = %self.source.describe(), rows = table.len(), "session data loaded");
        Ok(self.observations.get_or_init(|| table))
    }

    /// Yearly means of the session data
    pub fn yearly(&self) -> Result<YearlySeries> {
        Ok(yearly_mean(self.observations()?))
    }

    /// Yearly means with the configured rolling window attached
    pub fn smoothed_yearly(&self) -> Result<YearlySeries> {
        add_rolling_average(&self.yearly()?, self.config.analysis.rolling_window)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("source", &self.source.describe())
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
