//! Neighbor resolution: which segments of a lane an edit touches.
//!
//! A [`Segment`] is one Bezier span of a lane, baked over
//! `before.frame..after.frame`. Three producers exist:
//! - [`spans_around`] for a frame that holds a key (the two spans meeting at it),
//! - [`reconnect`] for a frame whose key was just removed (one bridging span),
//! - [`chain`] for a whole lane (full rebake).
//!
//! Boundary handling differs between the authored and bridging cases. Spans
//! that start or end at an authored key with nothing beyond it extend that
//! key's value flat to the timeline edge. A bridge with a missing side falls
//! back to the lane's neutral value at the edge instead.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::channel::LaneId;
use crate::data::{ChannelEntry, KeyPoint, LaneKey};
use crate::store::{KeyframeStore, RemovedEntry};

/// Edge parameters for one lane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LaneBounds {
    pub frame_count: u32,
    /// Value used where no key exists on a side of a bridge.
    pub neutral: i32,
}

impl LaneBounds {
    /// First frame past the end of the table; segments may end here.
    #[inline]
    pub fn end_frame(&self) -> u32 {
        self.frame_count.saturating_add(1)
    }
}

/// An authored key adjacent to some frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    pub frame: u32,
    pub key: LaneKey,
    /// Channel preset at that key (morph channels only).
    pub preset_index: Option<u32>,
}

impl Neighbor {
    fn from_entry(frame: u32, entry: &ChannelEntry, lane: LaneId) -> Option<Self> {
        entry.lane_key(lane.lane).map(|key| Self {
            frame,
            key: *key,
            preset_index: entry.preset_index(),
        })
    }
}

/// Nearest keys strictly before and strictly after a frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Neighbors {
    pub before: Option<Neighbor>,
    pub after: Option<Neighbor>,
}

/// One Bezier span of a lane.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub lane: LaneId,
    /// Start point; `ctrl` is its outgoing handle.
    pub before: KeyPoint,
    /// End point; `ctrl` is its incoming handle.
    pub after: KeyPoint,
    /// Preset written alongside the values (morph lanes only).
    pub preset_index: Option<u32>,
}

impl Segment {
    /// Frames this segment writes, end exclusive.
    #[inline]
    pub fn frames(&self) -> Range<u32> {
        self.before.frame..self.after.frame
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.before.frame >= self.after.frame
    }
}

/// Nearest authored keys of `lane` on either side of `frame`.
///
/// Only frames where this exact lane has data count; a morph frame that keyed
/// the other lane is skipped.
pub fn find_neighbors(store: &KeyframeStore, lane: LaneId, frame: u32) -> Neighbors {
    Neighbors {
        before: store
            .prev_with_lane(frame, lane)
            .and_then(|(f, entry)| Neighbor::from_entry(f, entry, lane)),
        after: store
            .next_with_lane(frame, lane)
            .and_then(|(f, entry)| Neighbor::from_entry(f, entry, lane)),
    }
}

/// Span leaving the key at `frame`: to the next key, or flat to the end.
fn span_after(
    lane: LaneId,
    at: Neighbor,
    next: Option<Neighbor>,
    bounds: &LaneBounds,
) -> Segment {
    let (before, after) = match next {
        Some(n) => (
            KeyPoint::new(at.frame, at.key.value, at.key.tangents.start),
            KeyPoint::new(n.frame, n.key.value, n.key.tangents.end),
        ),
        None => (
            KeyPoint::flat(at.frame, at.key.value),
            KeyPoint::flat(bounds.end_frame(), at.key.value),
        ),
    };
    Segment {
        lane,
        before,
        after,
        preset_index: at.preset_index,
    }
}

/// Span arriving at the key at `frame`: from the previous key, or flat from 0.
fn span_before(lane: LaneId, at: Neighbor, prev: Option<Neighbor>) -> Segment {
    match prev {
        Some(p) => Segment {
            lane,
            before: KeyPoint::new(p.frame, p.key.value, p.key.tangents.start),
            after: KeyPoint::new(at.frame, at.key.value, at.key.tangents.end),
            preset_index: p.preset_index,
        },
        None => Segment {
            lane,
            before: KeyPoint::flat(0, at.key.value),
            after: KeyPoint::flat(at.frame, at.key.value),
            preset_index: at.preset_index,
        },
    }
}

/// The two spans meeting at an authored key: `[after_span, before_span]`.
///
/// Returns `None` when `lane` has no key at `frame`.
pub fn spans_around(
    store: &KeyframeStore,
    lane: LaneId,
    frame: u32,
    bounds: &LaneBounds,
) -> Option<[Segment; 2]> {
    let at = store
        .entry(frame, lane.channel)
        .and_then(|entry| Neighbor::from_entry(frame, entry, lane))?;
    let near = find_neighbors(store, lane, frame);
    Some([
        span_after(lane, at, near.after, bounds),
        span_before(lane, at, near.before),
    ])
}

/// Bridging span over the gap a removed key left in `lane`.
///
/// The live neighbors on either side become the end points and keep their
/// handles. A missing side is replaced by the neutral value at the timeline
/// edge with a zero handle. The preset follows the earlier key, or the
/// removed entry when there is none. Returns `None` when the removed frame
/// held no data for `lane`.
pub fn reconnect(
    store: &KeyframeStore,
    removed: &RemovedEntry,
    lane: LaneId,
    bounds: &LaneBounds,
) -> Option<Segment> {
    removed.lane_key(lane)?;
    let near = find_neighbors(store, lane, removed.frame);
    let before = match near.before {
        Some(p) => KeyPoint::new(p.frame, p.key.value, p.key.tangents.start),
        None => KeyPoint::flat(0, bounds.neutral),
    };
    let after = match near.after {
        Some(n) => KeyPoint::new(n.frame, n.key.value, n.key.tangents.end),
        None => KeyPoint::flat(bounds.end_frame(), bounds.neutral),
    };
    let preset_index = near
        .before
        .and_then(|p| p.preset_index)
        .or_else(|| removed.preset_index(lane.channel));
    Some(Segment {
        lane,
        before,
        after,
        preset_index,
    })
}

/// Every span of `lane` in frame order, covering `0..=frame_count`.
///
/// A lane without keys is one neutral span that leaves the channel preset
/// alone. Otherwise the spans are built exactly as [`spans_around`] builds
/// them for each key.
pub fn chain(store: &KeyframeStore, lane: LaneId, bounds: &LaneBounds) -> Vec<Segment> {
    let keys: Vec<Neighbor> = store
        .lane_keys(lane)
        .into_iter()
        .map(|(frame, key, preset_index)| Neighbor {
            frame,
            key,
            preset_index,
        })
        .collect();

    let Some(last) = keys.last().copied() else {
        return vec![Segment {
            lane,
            before: KeyPoint::flat(0, bounds.neutral),
            after: KeyPoint::flat(bounds.end_frame(), bounds.neutral),
            preset_index: None,
        }];
    };

    let mut out = Vec::with_capacity(keys.len() + 1);
    let mut prev = None;
    for at in &keys {
        out.push(span_before(lane, *at, prev));
        prev = Some(*at);
    }
    out.push(span_after(lane, last, None, bounds));
    out.retain(|s| !s.is_empty());
    out
}
