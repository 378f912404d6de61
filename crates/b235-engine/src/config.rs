//! Engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Engine configuration.
///
/// Every field has a default, so a JSON document only needs the fields it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Class that marks an element as a container.
    pub marker_class: String,
    /// Stylesheet moved to the front of the cascade before computing.
    pub stylesheet_href: Option<String>,
    /// Wait for the host's font readiness signal, where it has one.
    pub wait_for_fonts: bool,
    /// Compute anyway once this much time has passed since start.
    pub readiness_timeout_ms: Option<u64>,
    /// Quiet period before the watchdog acts on resize notifications.
    pub watchdog_settle_ms: u64,
    /// Delay of the unconditional watchdog pass after computation.
    pub initial_watchdog_delay_ms: u64,
    /// Extra pixels added to every collision width before normalizing.
    pub epsilon_px: f64,
    /// Root font size used when the document's is unreadable.
    pub fallback_root_font_size: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            marker_class: "b235-container".to_string(),
            stylesheet_href: None,
            wait_for_fonts: true,
            readiness_timeout_ms: Some(3000),
            watchdog_settle_ms: 250,
            initial_watchdog_delay_ms: 0,
            epsilon_px: 0.0,
            fallback_root_font_size: 16.0,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.marker_class.trim().is_empty() {
            return Err(EngineError::InvalidConfig(
                "marker_class must not be empty".to_string(),
            ));
        }
        if !self.epsilon_px.is_finite() || self.epsilon_px < 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "epsilon_px must be a finite, non-negative number (got {})",
                self.epsilon_px
            )));
        }
        if !self.fallback_root_font_size.is_finite() || self.fallback_root_font_size <= 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "fallback_root_font_size must be positive (got {})",
                self.fallback_root_font_size
            )));
        }
        Ok(())
    }

    pub fn readiness_timeout(&self) -> Option<Duration> {
        self.readiness_timeout_ms.map(Duration::from_millis)
    }

    pub fn watchdog_settle(&self) -> Duration {
        Duration::from_millis(self.watchdog_settle_ms)
    }

    pub fn initial_watchdog_delay(&self) -> Duration {
        Duration::from_millis(self.initial_watchdog_delay_ms)
    }
}
