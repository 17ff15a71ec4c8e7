// Application state module
// Read-only state shared by every connection

use std::sync::Arc;

use super::types::{ColorFallback, Config};
use crate::source::{self, AssetError, AssetSource};

/// Application state
pub struct AppState {
    pub config: Config,
    pub source: Arc<dyn AssetSource>,
    /// Resolved once at startup from `source.color_fallback`
    pub color_fallback: ColorFallback,
}

impl AppState {
    /// Create `AppState`, building the asset source named by the configuration
    pub fn new(config: &Config) -> Result<Self, AssetError> {
        let source = source::from_config(&config.source)?;
        Ok(Self::with_source(config, source))
    }

    /// Create `AppState` around an already constructed source
    pub fn with_source(config: &Config, source: Arc<dyn AssetSource>) -> Self {
        Self {
            config: config.clone(),
            source,
            color_fallback: config.source.effective_color_fallback(),
        }
    }
}
