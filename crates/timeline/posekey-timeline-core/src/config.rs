//! Timeline configuration.

use serde::{Deserialize, Serialize};

use crate::channel::{default_channels, ChannelSpec, ChannelTable};
use crate::error::TimelineError;

fn default_frame_count() -> u32 {
    300
}

fn default_max_events() -> usize {
    1024
}

/// Fixed parameters of a timeline; set once when the engine is built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimelineConfig {
    /// Last frame index; the table covers `0..=frame_count`.
    #[serde(default = "default_frame_count")]
    pub frame_count: u32,
    #[serde(default = "default_channels")]
    pub channels: Vec<ChannelSpec>,
    /// Maximum diagnostic events retained between drains; oldest are dropped.
    #[serde(default = "default_max_events")]
    pub max_events: usize,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            frame_count: default_frame_count(),
            channels: default_channels(),
            max_events: default_max_events(),
        }
    }
}

impl TimelineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, TimelineError> {
        let cfg: Self = serde_json::from_str(json)?;
        Ok(cfg)
    }

    /// Check the config and build its channel table.
    pub fn validate(&self) -> Result<ChannelTable, TimelineError> {
        if self.frame_count == 0 {
            return Err(TimelineError::InvalidConfig {
                reason: "frame_count must be > 0".to_string(),
            });
        }
        if self.frame_count == u32::MAX {
            return Err(TimelineError::InvalidConfig {
                reason: format!("frame_count must be < {}", u32::MAX),
            });
        }
        ChannelTable::new(self.channels.clone())
    }
}
