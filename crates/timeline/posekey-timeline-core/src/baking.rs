//! Dense per-frame table and the segment baker that fills it.

use std::collections::BTreeMap;
use std::ops::Range;

use crate::channel::{ChannelId, ChannelTable, LaneId, MorphLane};
use crate::interp::solve;
use crate::neighbors::Segment;

/// Resolved value of every lane at every frame `0..=frame_count`, plus the
/// preset of every morph channel.
///
/// Starts at each lane's neutral value and preset 0; only [`bake_segment`]
/// and [`bake_presets`] write to it afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct BakedTable {
    frame_count: u32,
    values: BTreeMap<LaneId, Vec<i32>>,
    presets: BTreeMap<ChannelId, Vec<u32>>,
}

impl BakedTable {
    pub fn new(channels: &ChannelTable, frame_count: u32) -> Self {
        let len = frame_count as usize + 1;
        let mut values = BTreeMap::new();
        let mut presets = BTreeMap::new();
        for (id, spec) in channels.iter() {
            let neutral = spec.neutral();
            if spec.is_morph() {
                for lane in MorphLane::ALL {
                    values.insert(LaneId::morph(id, lane), vec![neutral; len]);
                }
                presets.insert(id, vec![0; len]);
            } else {
                values.insert(LaneId::simple(id), vec![neutral; len]);
            }
        }
        Self {
            frame_count,
            values,
            presets,
        }
    }

    #[inline]
    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    #[inline]
    pub fn value(&self, lane: LaneId, frame: u32) -> Option<i32> {
        self.values
            .get(&lane)
            .and_then(|v| v.get(frame as usize))
            .copied()
    }

    #[inline]
    pub fn preset_index(&self, channel: ChannelId, frame: u32) -> Option<u32> {
        self.presets
            .get(&channel)
            .and_then(|v| v.get(frame as usize))
            .copied()
    }

    /// Whole value column of a lane.
    pub fn lane_values(&self, lane: LaneId) -> Option<&[i32]> {
        self.values.get(&lane).map(Vec::as_slice)
    }

    /// Whole preset column of a morph channel.
    pub fn presets(&self, channel: ChannelId) -> Option<&[u32]> {
        self.presets.get(&channel).map(Vec::as_slice)
    }
}

/// What one call to [`bake_segment`] did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BakeReport {
    /// Frames visited, clamped to the table.
    pub frames: Range<u32>,
    /// Frames where the solver found no parameter; their values were left as they were.
    pub failed: Vec<u32>,
}

impl BakeReport {
    #[inline]
    pub fn written(&self) -> u32 {
        self.frames.len() as u32 - self.failed.len() as u32
    }
}

/// Solve `segment` at every frame it covers and write the floored values.
///
/// The segment preset, if any, is written to every covered frame. Solver
/// failures are per frame: the stale value stays, a warning is logged and the
/// frame is listed in the report.
pub fn bake_segment(table: &mut BakedTable, segment: &Segment) -> BakeReport {
    let table_end = table.frame_count.saturating_add(1);
    let frames = segment.before.frame.min(table_end)..segment.after.frame.min(table_end);
    let mut report = BakeReport {
        frames: frames.clone(),
        failed: Vec::new(),
    };

    let Some(column) = table.values.get_mut(&segment.lane) else {
        log::warn!("bake skipped: lane {:?} is not part of the table", segment.lane);
        report.frames = frames.start..frames.start;
        return report;
    };
    for frame in frames.clone() {
        match solve(frame, &segment.before, &segment.after) {
            Ok(v) => column[frame as usize] = v,
            Err(err) => {
                log::warn!("lane {:?} frame {frame}: {err}", segment.lane);
                report.failed.push(frame);
            }
        }
    }

    if let (Some(_), Some(preset)) = (segment.lane.lane, segment.preset_index) {
        if let Some(column) = table.presets.get_mut(&segment.lane.channel) {
            for frame in frames.clone() {
                column[frame as usize] = preset;
            }
        }
    }

    log::debug!(
        "baked lane {:?} over {}..{} ({} failed)",
        segment.lane,
        frames.start,
        frames.end,
        report.failed.len()
    );
    report
}

/// Rewrite the preset column of `channel` from its authored entries.
///
/// `keys` are `(frame, preset)` in ascending frame order. Each preset holds
/// from its frame up to the next key; frames before the first key take the
/// first key's preset. With no keys the column is left alone.
pub fn bake_presets(table: &mut BakedTable, channel: ChannelId, keys: &[(u32, u32)]) {
    let Some(column) = table.presets.get_mut(&channel) else {
        log::warn!("preset bake skipped: channel {channel:?} has no preset column");
        return;
    };
    let Some(&(_, first)) = keys.first() else {
        return;
    };
    let len = column.len();
    let mut current = first;
    let mut next = keys.iter().peekable();
    for (frame, slot) in column.iter_mut().enumerate() {
        while let Some(&&(key_frame, preset)) = next.peek() {
            if key_frame as usize > frame {
                break;
            }
            current = preset;
            next.next();
        }
        *slot = current;
    }
    log::debug!(
        "baked presets of {channel:?} over 0..{len} from {} keys",
        keys.len()
    );
}
