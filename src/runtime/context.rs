use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{self, BridgeConfig};
use crate::headless::HeadlessLauncher;
use crate::model::{PositionIndex, Table};
use crate::selection::HostSelection;
use crate::sync::SyncController;

use super::Result;

/// Loaded configuration plus the entry points built from it.
#[derive(Debug, Clone, Default)]
pub struct AppContext {
    config: BridgeConfig,
}

impl AppContext {
    pub fn new(config: BridgeConfig) -> Self {
        Self { config }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(config::load_config(path)?))
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn load_table(&self, path: impl AsRef<Path>) -> Result<Table> {
        Ok(config::load_table(path)?)
    }

    pub fn build_index(&self, table: &Table) -> Result<PositionIndex> {
        self.config.columns.ensure_configured()?;
        Ok(PositionIndex::build(table, &self.config.columns)?)
    }

    pub fn open_session<H: HostSelection>(
        &self,
        table: &Table,
        host: Arc<H>,
    ) -> Result<SyncController<H>> {
        Ok(SyncController::open(
            table,
            &self.config.columns,
            &self.config.hilite,
            host,
        )?)
    }

    /// Headless launcher from the configuration; `project` overrides the configured one.
    pub fn launcher(&self, project: Option<PathBuf>) -> Result<HeadlessLauncher> {
        let mut settings = self.config.headless.clone();
        if project.is_some() {
            settings.project = project;
        }
        Ok(HeadlessLauncher::from_settings(&settings)?)
    }
}
