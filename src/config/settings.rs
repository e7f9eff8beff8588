use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::model::PositionColumns;

use super::{ConfigError, Result};

pub const DEFAULT_CLIENT_PORT: u16 = 9998;
pub const DEFAULT_SERVER_PORT: u16 = 9997;
pub const DEFAULT_MAX_RAM_MB: i64 = 4096;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub hilite: HiliteSettings,
    pub columns: PositionColumns,
    pub headless: HeadlessSettings,
}

/// Ports and forwarding switches of one hilite session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HiliteSettings {
    /// Port ilastik listens on; the bridge connects here.
    pub client_port: u16,
    /// Port the bridge listens on for ilastik's commands. 0 picks a free port.
    pub server_port: u16,
    /// Keep other objects' markers when centering the viewer.
    pub keep_others: bool,
    pub forward_hilites: bool,
}

impl Default for HiliteSettings {
    fn default() -> Self {
        Self {
            client_port: DEFAULT_CLIENT_PORT,
            server_port: DEFAULT_SERVER_PORT,
            keep_others: true,
            forward_hilites: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadlessSettings {
    pub executable: Option<PathBuf>,
    pub project: Option<PathBuf>,
    /// Worker threads; zero or negative means no restriction.
    pub threads: i32,
    /// RAM limit in megabytes; zero or negative leaves it to ilastik.
    pub max_ram_mb: i64,
}

impl Default for HeadlessSettings {
    fn default() -> Self {
        Self {
            executable: None,
            project: None,
            threads: -1,
            max_ram_mb: DEFAULT_MAX_RAM_MB,
        }
    }
}

impl BridgeConfig {
    pub fn validate(&self) -> Result<()> {
        let hilite = &self.hilite;
        if hilite.client_port == 0 {
            return Err(ConfigError::Invalid(
                "client port must be a fixed, non-zero port".to_string(),
            ));
        }
        if hilite.client_port == hilite.server_port {
            return Err(ConfigError::Invalid(format!(
                "client and server cannot share port {}",
                hilite.client_port
            )));
        }
        Ok(())
    }
}
