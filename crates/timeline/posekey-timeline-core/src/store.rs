//! Keyframe store: `frame -> channel -> entry`, two ordered levels.
//!
//! Invariant: a frame is a key of the outer map only while at least one
//! channel holds data for it. Upserts always write a value, so no empty
//! entry is ever created, and removal takes whole frames out.

use std::collections::BTreeMap;
use std::ops::Bound;

use serde::{Deserialize, Serialize};

use crate::channel::{ChannelId, LaneId, MorphLane};
use crate::data::{ChannelEntry, FrameEntry, LaneKey, MorphEntry, Tangents};

/// Everything that was authored at a frame before it was deleted.
///
/// Produced by [`KeyframeStore::remove`] and consumed by
/// [`crate::neighbors::reconnect`] to bridge the gap the deletion left.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RemovedEntry {
    pub frame: u32,
    pub channels: FrameEntry,
}

impl RemovedEntry {
    /// Lanes that carried data in the removed frame.
    pub fn lanes(&self) -> Vec<LaneId> {
        lanes_of(&self.channels)
    }

    #[inline]
    pub fn lane_key(&self, lane: LaneId) -> Option<&LaneKey> {
        self.channels
            .get(&lane.channel)
            .and_then(|entry| entry.lane_key(lane.lane))
    }

    #[inline]
    pub fn preset_index(&self, channel: ChannelId) -> Option<u32> {
        self.channels
            .get(&channel)
            .and_then(ChannelEntry::preset_index)
    }
}

/// Lanes with data in a frame entry, channel order then lane order.
pub(crate) fn lanes_of(entry: &FrameEntry) -> Vec<LaneId> {
    entry
        .iter()
        .flat_map(|(channel, e)| {
            e.lanes().into_iter().map(move |lane| LaneId {
                channel: *channel,
                lane,
            })
        })
        .collect()
}

/// Sparse authoring structure.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct KeyframeStore {
    frames: BTreeMap<u32, FrameEntry>,
}

impl KeyframeStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Number of authored frames.
    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn contains(&self, frame: u32) -> bool {
        self.frames.contains_key(&frame)
    }

    #[inline]
    pub fn get(&self, frame: u32) -> Option<&FrameEntry> {
        self.frames.get(&frame)
    }

    #[inline]
    pub fn entry(&self, frame: u32, channel: ChannelId) -> Option<&ChannelEntry> {
        self.frames.get(&frame).and_then(|e| e.get(&channel))
    }

    #[inline]
    pub fn lane_key(&self, frame: u32, lane: LaneId) -> Option<&LaneKey> {
        self.entry(frame, lane.channel)
            .and_then(|e| e.lane_key(lane.lane))
    }

    /// Authored frames in ascending order.
    pub fn frames(&self) -> impl Iterator<Item = u32> + '_ {
        self.frames.keys().copied()
    }

    /// Authored frames that carry data for `lane`, ascending.
    pub fn lane_frames(&self, lane: LaneId) -> Vec<u32> {
        self.frames
            .iter()
            .filter(|(_, entry)| has_lane(entry, lane))
            .map(|(frame, _)| *frame)
            .collect()
    }

    /// Lanes with data at `frame`.
    pub fn lanes_at(&self, frame: u32) -> Vec<LaneId> {
        self.frames.get(&frame).map(lanes_of).unwrap_or_default()
    }

    /// Nearest frame strictly after `frame` with data for `lane`.
    pub fn next_with_lane(&self, frame: u32, lane: LaneId) -> Option<(u32, &ChannelEntry)> {
        self.frames
            .range((Bound::Excluded(frame), Bound::Unbounded))
            .find(|(_, entry)| has_lane(entry, lane))
            .and_then(|(f, entry)| entry.get(&lane.channel).map(|e| (*f, e)))
    }

    /// Nearest frame strictly before `frame` with data for `lane`.
    pub fn prev_with_lane(&self, frame: u32, lane: LaneId) -> Option<(u32, &ChannelEntry)> {
        self.frames
            .range(..frame)
            .rev()
            .find(|(_, entry)| has_lane(entry, lane))
            .and_then(|(f, entry)| entry.get(&lane.channel).map(|e| (*f, e)))
    }

    /// Set a simple channel's value at `frame`, keeping existing handles.
    pub fn upsert_simple(&mut self, frame: u32, channel: ChannelId, value: i32) {
        let slot = self
            .frames
            .entry(frame)
            .or_default()
            .entry(channel)
            .or_insert_with(|| ChannelEntry::Simple(LaneKey::new(value)));
        match slot {
            ChannelEntry::Simple(key) => key.value = value,
            other => *other = ChannelEntry::Simple(LaneKey::new(value)),
        }
    }

    /// Set one morph lane's value and the channel's preset at `frame`,
    /// keeping existing handles of that lane.
    pub fn upsert_morph(
        &mut self,
        frame: u32,
        channel: ChannelId,
        lane: MorphLane,
        preset_index: u32,
        value: i32,
    ) {
        let slot = self
            .frames
            .entry(frame)
            .or_default()
            .entry(channel)
            .or_insert_with(|| ChannelEntry::Morph(MorphEntry::default()));
        if !matches!(slot, ChannelEntry::Morph(_)) {
            *slot = ChannelEntry::Morph(MorphEntry::default());
        }
        if let ChannelEntry::Morph(entry) = slot {
            entry.preset_index = preset_index;
            match entry.lane_mut(lane) {
                Some(key) => key.value = value,
                empty => *empty = Some(LaneKey::new(value)),
            }
        }
    }

    /// Replace the handles of an existing lane key. Returns false when the
    /// lane has no key at `frame`.
    pub fn set_tangents(&mut self, frame: u32, lane: LaneId, tangents: Tangents) -> bool {
        match self
            .frames
            .get_mut(&frame)
            .and_then(|e| e.get_mut(&lane.channel))
            .and_then(|e| e.lane_key_mut(lane.lane))
        {
            Some(key) => {
                key.tangents = tangents;
                true
            }
            None => false,
        }
    }

    /// Take everything authored at `frame` out of the store.
    pub fn remove(&mut self, frame: u32) -> Option<RemovedEntry> {
        self.frames
            .remove(&frame)
            .map(|channels| RemovedEntry { frame, channels })
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Every key of `lane` in frame order, with the channel preset at that key.
    pub fn lane_keys(&self, lane: LaneId) -> Vec<(u32, LaneKey, Option<u32>)> {
        self.frames
            .iter()
            .filter_map(|(frame, entry)| {
                let e = entry.get(&lane.channel)?;
                e.lane_key(lane.lane)
                    .map(|key| (*frame, *key, e.preset_index()))
            })
            .collect()
    }

    /// `(frame, preset)` for every frame carrying a morph entry of `channel`,
    /// whichever lanes it keys.
    pub fn preset_keys(&self, channel: ChannelId) -> Vec<(u32, u32)> {
        self.frames
            .iter()
            .filter_map(|(frame, entry)| {
                entry
                    .get(&channel)
                    .and_then(ChannelEntry::preset_index)
                    .map(|preset| (*frame, preset))
            })
            .collect()
    }
}

#[inline]
fn has_lane(entry: &FrameEntry, lane: LaneId) -> bool {
    entry
        .get(&lane.channel)
        .and_then(|e| e.lane_key(lane.lane))
        .is_some()
}
