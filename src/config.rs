//! User settings that shape guidance output.
//!
//! Settings arrive from the host as JSON; unknown fields are ignored and
//! missing ones take their defaults.

use serde::{Deserialize, Serialize};

use crate::alerts::AlertFrequency;
use crate::error::NavError;

/// User-facing navigation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    pub voice_enabled: bool,
    pub alert_frequency: AlertFrequency,
    /// Passed through to the map layer, no effect on guidance.
    pub three_d_mode: bool,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            voice_enabled: true,
            alert_frequency: AlertFrequency::Medium,
            three_d_mode: false,
        }
    }
}

impl NavConfig {
    /// Parse settings from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, NavError> {
        Ok(serde_json::from_str(json)?)
    }
}
