//! Error types for the timeline core

use serde::{Deserialize, Serialize};

/// Errors returned by timeline operations.
///
/// Every public operation validates its input before touching the keyframe
/// store or the baked table, so an `Err` always means "nothing changed".
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum TimelineError {
    /// Cursor outside `0..=frame_count`
    #[error("Invalid cursor: {frame} (valid range 0..={frame_count})")]
    InvalidCursor { frame: i64, frame_count: u32 },

    /// Query frame outside `0..=frame_count`
    #[error("Frame {frame} is out of range [0, {frame_count}]")]
    FrameOutOfRange { frame: u32, frame_count: u32 },

    /// Channel name not present in the channel table
    #[error("Channel not found: {name}")]
    ChannelNotFound { name: String },

    /// Lane path could not be parsed
    #[error("Invalid lane path '{path}': {reason}")]
    InvalidLanePath { path: String, reason: String },

    /// Lane or operation does not match the channel kind
    #[error("Channel kind mismatch for '{channel}': expected {expected}")]
    ChannelKindMismatch { channel: String, expected: String },

    /// Morph preset index past the end of the preset list
    #[error("Preset index {index} out of range for '{channel}' ({count} presets)")]
    PresetOutOfRange {
        channel: String,
        index: u32,
        count: usize,
    },

    /// Value outside the channel's slider range
    #[error("Value {value} out of range [{min}, {max}] for '{channel}'")]
    ValueOutOfRange {
        channel: String,
        value: i32,
        min: i32,
        max: i32,
    },

    /// Bezier handle with a NaN or infinite component
    #[error("Non-finite tangent for '{lane}' at frame {frame}")]
    NonFiniteTangent { lane: String, frame: u32 },

    /// No authored key for the lane at the frame
    #[error("Keyframe not found: '{lane}' at frame {frame}")]
    KeyframeNotFound { lane: String, frame: u32 },

    /// Timeline configuration rejected
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Serialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },
}

impl TimelineError {
    /// Whether the caller can retry with corrected input against the same engine.
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::InvalidConfig { .. } | Self::SerializationError { .. }
        )
    }

    /// Get error category for logging/diagnostics
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidCursor { .. } | Self::FrameOutOfRange { .. } => "frame",
            Self::ChannelNotFound { .. }
            | Self::InvalidLanePath { .. }
            | Self::ChannelKindMismatch { .. } => "channel",
            Self::PresetOutOfRange { .. }
            | Self::ValueOutOfRange { .. }
            | Self::NonFiniteTangent { .. } => "validation",
            Self::KeyframeNotFound { .. } => "data",
            Self::InvalidConfig { .. } => "config",
            Self::SerializationError { .. } => "serialization",
        }
    }
}

impl From<serde_json::Error> for TimelineError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError {
            reason: err.to_string(),
        }
    }
}
