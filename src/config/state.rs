// Application state module
// Holds the loaded configuration and the catalog handle shared by all connections

use super::types::Config;
use crate::catalog::{Catalog, FileBackend};

/// Application state
pub struct AppState {
    pub config: Config,
    pub catalog: Catalog<FileBackend>,
}

impl AppState {
    pub fn new(config: &Config, catalog: Catalog<FileBackend>) -> Self {
        Self {
            config: config.clone(),
            catalog,
        }
    }
}
