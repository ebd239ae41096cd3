//! Authored keyframe data model.
//!
//! A keyframe is sparse: a frame holds entries only for channels the user
//! actually keyed, and a morph entry holds only the lanes that were keyed.
//! Presence is the only "authored" signal; there are no sentinel values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::channel::{ChannelId, MorphLane};

/// 2D offset in (frames, slider units).
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Bezier handle offsets of a key, relative to the key itself.
///
/// `start` shapes the segment leaving this key, `end` the segment arriving at it.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Tangents {
    #[serde(default)]
    pub start: Vec2,
    #[serde(default)]
    pub end: Vec2,
}

/// One authored scalar value plus its handles.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct LaneKey {
    pub value: i32,
    #[serde(default)]
    pub tangents: Tangents,
}

impl LaneKey {
    #[inline]
    pub fn new(value: i32) -> Self {
        Self {
            value,
            tangents: Tangents::default(),
        }
    }
}

/// Authored data of a morph channel at one frame; either lane may be absent.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct MorphEntry {
    pub preset_index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first: Option<LaneKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second: Option<LaneKey>,
}

impl MorphEntry {
    #[inline]
    pub fn lane(&self, lane: MorphLane) -> Option<&LaneKey> {
        match lane {
            MorphLane::First => self.first.as_ref(),
            MorphLane::Second => self.second.as_ref(),
        }
    }

    #[inline]
    pub fn lane_mut(&mut self, lane: MorphLane) -> &mut Option<LaneKey> {
        match lane {
            MorphLane::First => &mut self.first,
            MorphLane::Second => &mut self.second,
        }
    }
}

/// Authored data of one channel at one frame.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChannelEntry {
    Morph(MorphEntry),
    Simple(LaneKey),
}

impl ChannelEntry {
    /// Key for a lane selector (`None` addresses a simple channel).
    pub fn lane_key(&self, lane: Option<MorphLane>) -> Option<&LaneKey> {
        match (self, lane) {
            (ChannelEntry::Morph(m), Some(l)) => m.lane(l),
            (ChannelEntry::Simple(k), None) => Some(k),
            _ => None,
        }
    }

    pub fn lane_key_mut(&mut self, lane: Option<MorphLane>) -> Option<&mut LaneKey> {
        match (self, lane) {
            (ChannelEntry::Morph(m), Some(l)) => m.lane_mut(l).as_mut(),
            (ChannelEntry::Simple(k), None) => Some(k),
            _ => None,
        }
    }

    #[inline]
    pub fn preset_index(&self) -> Option<u32> {
        match self {
            ChannelEntry::Morph(m) => Some(m.preset_index),
            ChannelEntry::Simple(_) => None,
        }
    }

    /// Lane selectors that carry data, in lane order.
    pub fn lanes(&self) -> Vec<Option<MorphLane>> {
        match self {
            ChannelEntry::Morph(m) => MorphLane::ALL
                .iter()
                .filter(|l| m.lane(**l).is_some())
                .map(|l| Some(*l))
                .collect(),
            ChannelEntry::Simple(_) => vec![None],
        }
    }
}

/// All authored channels at one frame.
pub type FrameEntry = BTreeMap<ChannelId, ChannelEntry>;

/// A Bezier end point in timeline space: the key position plus the handle
/// offset that applies on this side of the segment.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct KeyPoint {
    pub frame: u32,
    pub value: i32,
    pub ctrl: Vec2,
}

impl KeyPoint {
    #[inline]
    pub fn new(frame: u32, value: i32, ctrl: Vec2) -> Self {
        Self { frame, value, ctrl }
    }

    /// Key point with a zero-length handle.
    #[inline]
    pub fn flat(frame: u32, value: i32) -> Self {
        Self::new(frame, value, Vec2::ZERO)
    }
}
