//! Sticky pane configuration
//!
//! ```toml
//! scroll_throttle_ms = 50
//! viewport_width = 1024.0
//! viewport_height = 768.0
//! observe_mutations = true
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration for a `StickyPane`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StickyPaneConfig {
    /// Minimum interval between scroll-driven broadcasts, in milliseconds
    pub scroll_throttle_ms: u64,
    /// Initial viewport width
    pub viewport_width: f32,
    /// Initial viewport height
    pub viewport_height: f32,
    /// Record tree mutations for the mutation watcher
    pub observe_mutations: bool,
}

impl Default for StickyPaneConfig {
    fn default() -> Self {
        Self {
            scroll_throttle_ms: 50,
            viewport_width: 800.0,
            viewport_height: 600.0,
            observe_mutations: true,
        }
    }
}

impl StickyPaneConfig {
    /// Parse a config from TOML. Missing keys fall back to defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.viewport_width.is_finite() && self.viewport_width >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "viewport_width must be a non-negative number, got {}",
                self.viewport_width
            )));
        }
        if !(self.viewport_height.is_finite() && self.viewport_height >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "viewport_height must be a non-negative number, got {}",
                self.viewport_height
            )));
        }
        Ok(())
    }

    pub fn scroll_throttle(&self) -> Duration {
        Duration::from_millis(self.scroll_throttle_ms)
    }

    /// Set the initial viewport size
    pub fn viewport(mut self, width: f32, height: f32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set the scroll throttle interval
    pub fn scroll_throttle_ms(mut self, ms: u64) -> Self {
        self.scroll_throttle_ms = ms;
        self
    }

    /// Enable or disable mutation observation
    pub fn observe_mutations(mut self, enabled: bool) -> Self {
        self.observe_mutations = enabled;
        self
    }
}
