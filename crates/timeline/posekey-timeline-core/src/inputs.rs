//! Input contracts for the timeline engine.
//!
//! Commands mirror the engine's inbound operations so a host (UI adapter,
//! script, test fixture) can drive a timeline from JSON.

use serde::{Deserialize, Serialize};

use crate::channel::MorphLane;
use crate::data::Vec2;

/// One channel value to write at the cursor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChannelEdit {
    Morph {
        channel: String,
        lane: MorphLane,
        preset_index: u32,
        value: i32,
    },
    Simple {
        channel: String,
        value: i32,
    },
}

impl ChannelEdit {
    #[inline]
    pub fn channel(&self) -> &str {
        match self {
            ChannelEdit::Morph { channel, .. } | ChannelEdit::Simple { channel, .. } => channel,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TimelineCommand {
    SetCursor {
        frame: i64,
    },
    SetMorphValue {
        channel: String,
        lane: MorphLane,
        preset_index: u32,
        value: i32,
    },
    SetSimpleValue {
        channel: String,
        value: i32,
    },
    /// Write several channels at the cursor as one keyframe.
    KeyPose {
        edits: Vec<ChannelEdit>,
    },
    DeleteAtCursor,
    ClearAll,
    SetTangents {
        /// Lane path, e.g. `"head_x"` or `"eye.first"`.
        lane: String,
        frame: u32,
        #[serde(default)]
        start: Vec2,
        #[serde(default)]
        end: Vec2,
    },
    FullRebake,
}
