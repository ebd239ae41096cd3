//! Timeline engine: owns the keyframe store, the baked table and the cursor.
//!
//! Every edit runs to completion before returning: it validates its input,
//! mutates the store, then rebakes only the segments touching the edited
//! frame. A rejected call leaves all state untouched.

use crate::baking::{bake_presets, bake_segment, BakeReport, BakedTable};
use crate::channel::{ChannelId, ChannelTable, LaneId, MorphLane};
use crate::config::TimelineConfig;
use crate::data::{FrameEntry, Tangents, Vec2};
use crate::error::TimelineError;
use crate::inputs::{ChannelEdit, TimelineCommand};
use crate::neighbors::{chain, reconnect, spans_around, LaneBounds, Segment};
use crate::outputs::{ChannelSample, FramePose, Outputs, TimelineEvent};
use crate::store::{KeyframeStore, RemovedEntry};

/// A channel edit after name resolution and range checks.
#[derive(Clone, Copy, Debug)]
enum ResolvedEdit {
    Morph {
        id: ChannelId,
        lane: MorphLane,
        preset_index: u32,
        value: i32,
    },
    Simple {
        id: ChannelId,
        value: i32,
    },
}

#[derive(Debug)]
pub struct Timeline {
    cfg: TimelineConfig,
    channels: ChannelTable,
    store: KeyframeStore,
    baked: BakedTable,
    cursor: u32,
    outputs: Outputs,
}

impl Timeline {
    pub fn new(cfg: TimelineConfig) -> Result<Self, TimelineError> {
        let channels = cfg.validate()?;
        let baked = BakedTable::new(&channels, cfg.frame_count);
        let outputs = Outputs::with_capacity(cfg.max_events);
        Ok(Self {
            cfg,
            channels,
            store: KeyframeStore::new(),
            baked,
            cursor: 0,
            outputs,
        })
    }

    #[inline]
    pub fn config(&self) -> &TimelineConfig {
        &self.cfg
    }

    #[inline]
    pub fn frame_count(&self) -> u32 {
        self.cfg.frame_count
    }

    #[inline]
    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    /// Move the cursor. Frames outside `0..=frame_count` are rejected.
    pub fn set_cursor(&mut self, frame: i64) -> Result<(), TimelineError> {
        let frame_count = self.frame_count();
        if !(0..=i64::from(frame_count)).contains(&frame) {
            return Err(TimelineError::InvalidCursor { frame, frame_count });
        }
        self.cursor = frame as u32;
        Ok(())
    }

    #[inline]
    pub fn channels(&self) -> &ChannelTable {
        &self.channels
    }

    #[inline]
    pub fn store(&self) -> &KeyframeStore {
        &self.store
    }

    #[inline]
    pub fn baked(&self) -> &BakedTable {
        &self.baked
    }

    /// Resolve a lane path such as `"head_x"` or `"eye.first"`.
    #[inline]
    pub fn lane(&self, path: &str) -> Result<LaneId, TimelineError> {
        self.channels.resolve(path)
    }

    // ----- edits -----

    /// Key one morph lane (and the channel preset) at the cursor.
    pub fn set_morph_value(
        &mut self,
        channel: &str,
        lane: MorphLane,
        preset_index: u32,
        value: i32,
    ) -> Result<(), TimelineError> {
        let edit = self.resolve_edit(&ChannelEdit::Morph {
            channel: channel.to_string(),
            lane,
            preset_index,
            value,
        })?;
        self.write_edit(edit);
        self.update_after_edit(self.cursor);
        Ok(())
    }

    /// Key a simple channel at the cursor.
    pub fn set_simple_value(&mut self, channel: &str, value: i32) -> Result<(), TimelineError> {
        let edit = self.resolve_edit(&ChannelEdit::Simple {
            channel: channel.to_string(),
            value,
        })?;
        self.write_edit(edit);
        self.update_after_edit(self.cursor);
        Ok(())
    }

    /// Key several channels at the cursor with a single rebake.
    ///
    /// The whole batch is validated first; one bad edit rejects all of them.
    pub fn key_pose(&mut self, edits: &[ChannelEdit]) -> Result<(), TimelineError> {
        let resolved = edits
            .iter()
            .map(|e| self.resolve_edit(e))
            .collect::<Result<Vec<_>, _>>()?;
        if resolved.is_empty() {
            return Ok(());
        }
        for edit in resolved {
            self.write_edit(edit);
        }
        self.update_after_edit(self.cursor);
        Ok(())
    }

    /// Delete everything authored at the cursor and bridge the gap.
    ///
    /// Returns the removed data; `None` (a no-op) when the cursor frame holds
    /// no keys.
    pub fn delete_at_cursor(&mut self) -> Option<RemovedEntry> {
        let removed = self.store.remove(self.cursor)?;
        log::debug!(
            "removed frame {} ({} lanes)",
            removed.frame,
            removed.lanes().len()
        );
        self.outputs.push_event(TimelineEvent::KeyframeRemoved {
            frame: removed.frame,
        });
        self.bridge(&removed);
        Some(removed)
    }

    /// Delete at an explicit frame: moves the cursor there, then deletes.
    pub fn delete_at(&mut self, frame: u32) -> Result<Option<RemovedEntry>, TimelineError> {
        self.set_cursor(i64::from(frame))?;
        Ok(self.delete_at_cursor())
    }

    /// Drop every key. The baked table keeps its contents until the next
    /// edit or [`Timeline::full_rebake`].
    pub fn clear_all(&mut self) {
        self.store.clear();
        log::debug!("keyframe store cleared");
        self.outputs.push_event(TimelineEvent::StoreCleared);
    }

    /// Replace the Bezier handles of an existing key and rebake around it.
    pub fn set_tangents(
        &mut self,
        path: &str,
        frame: u32,
        start: Vec2,
        end: Vec2,
    ) -> Result<(), TimelineError> {
        let lane = self.lane(path)?;
        self.check_frame(frame)?;
        if ![start.x, start.y, end.x, end.y].iter().all(|v| v.is_finite()) {
            return Err(TimelineError::NonFiniteTangent {
                lane: path.to_string(),
                frame,
            });
        }
        if !self.store.set_tangents(frame, lane, Tangents { start, end }) {
            return Err(TimelineError::KeyframeNotFound {
                lane: path.to_string(),
                frame,
            });
        }
        self.rebake_around(frame, &[lane]);
        Ok(())
    }

    // ----- baking -----

    /// Rebake both spans adjacent to every lane keyed at `frame`.
    ///
    /// A frame with no keys does nothing.
    pub fn update_after_edit(&mut self, frame: u32) {
        let lanes = self.store.lanes_at(frame);
        self.rebake_around(frame, &lanes);
    }

    /// Rebake the gap a deletion left: each lane the removed entry carried
    /// gets one span between its live neighbors, or toward neutral at the
    /// timeline edge when a side has none.
    pub fn bridge(&mut self, removed: &RemovedEntry) {
        for lane in removed.lanes() {
            let bounds = self.bounds(lane);
            if let Some(segment) = reconnect(&self.store, removed, lane, &bounds) {
                self.rebake(&segment);
            }
        }
    }

    /// Bake one segment into the table and record what happened.
    pub fn rebake(&mut self, segment: &Segment) -> BakeReport {
        let report = bake_segment(&mut self.baked, segment);
        let lane = self.channels.lane_path(segment.lane);
        for frame in &report.failed {
            self.outputs.push_event(TimelineEvent::SolverFailed {
                lane: lane.clone(),
                frame: *frame,
            });
        }
        if !report.frames.is_empty() {
            self.outputs.push_event(TimelineEvent::SegmentBaked {
                lane,
                start: report.frames.start,
                end: report.frames.end,
            });
        }
        report
    }

    /// Rebuild the whole table from the store.
    ///
    /// Lanes without keys return to neutral. Keyed lanes are flat before
    /// their first and after their last key. Each morph channel's preset
    /// follows its authored entries in frame order, regardless of which lane
    /// they key: a preset holds from its entry to the next one, and frames
    /// before the first entry take the first entry's preset.
    pub fn full_rebake(&mut self) {
        self.baked = BakedTable::new(&self.channels, self.frame_count());
        for lane in self.channels.lanes() {
            let bounds = self.bounds(lane);
            for segment in chain(&self.store, lane, &bounds) {
                self.rebake(&segment);
            }
        }
        let morphs: Vec<ChannelId> = self
            .channels
            .iter()
            .filter(|(_, spec)| spec.is_morph())
            .map(|(id, _)| id)
            .collect();
        for id in morphs {
            bake_presets(&mut self.baked, id, &self.store.preset_keys(id));
        }
        log::debug!("full rebake of {} lanes", self.channels.lanes().len());
    }

    // ----- queries -----

    pub fn get_value(&self, path: &str, frame: u32) -> Result<i32, TimelineError> {
        let lane = self.lane(path)?;
        self.check_frame(frame)?;
        Ok(self.value_or_neutral(lane, frame))
    }

    pub fn get_preset_index(&self, channel: &str, frame: u32) -> Result<u32, TimelineError> {
        let id = self.channels.morph_id(channel)?;
        self.check_frame(frame)?;
        Ok(self.baked.preset_index(id, frame).unwrap_or(0))
    }

    /// Baked values of every channel at `frame`.
    pub fn pose_at(&self, frame: u32) -> Result<FramePose, TimelineError> {
        self.check_frame(frame)?;
        let channels = self
            .channels
            .iter()
            .map(|(id, spec)| {
                if spec.is_morph() {
                    ChannelSample::Morph {
                        channel: spec.name.clone(),
                        preset_index: self.baked.preset_index(id, frame).unwrap_or(0),
                        first: self.value_or_neutral(LaneId::morph(id, MorphLane::First), frame),
                        second: self.value_or_neutral(LaneId::morph(id, MorphLane::Second), frame),
                    }
                } else {
                    ChannelSample::Simple {
                        channel: spec.name.clone(),
                        value: self.value_or_neutral(LaneId::simple(id), frame),
                    }
                }
            })
            .collect();
        Ok(FramePose { frame, channels })
    }

    /// Frames holding a key for the lane at `path`, ascending.
    pub fn keyframes(&self, path: &str) -> Result<Vec<u32>, TimelineError> {
        let lane = self.lane(path)?;
        Ok(self.store.lane_frames(lane))
    }

    /// Frames holding any key, ascending.
    pub fn authored_frames(&self) -> Vec<u32> {
        self.store.frames().collect()
    }

    #[inline]
    pub fn entry_at(&self, frame: u32) -> Option<&FrameEntry> {
        self.store.get(frame)
    }

    // ----- commands & events -----

    pub fn apply(&mut self, cmd: TimelineCommand) -> Result<(), TimelineError> {
        match cmd {
            TimelineCommand::SetCursor { frame } => self.set_cursor(frame),
            TimelineCommand::SetMorphValue {
                channel,
                lane,
                preset_index,
                value,
            } => self.set_morph_value(&channel, lane, preset_index, value),
            TimelineCommand::SetSimpleValue { channel, value } => {
                self.set_simple_value(&channel, value)
            }
            TimelineCommand::KeyPose { edits } => self.key_pose(&edits),
            TimelineCommand::DeleteAtCursor => {
                self.delete_at_cursor();
                Ok(())
            }
            TimelineCommand::ClearAll => {
                self.clear_all();
                Ok(())
            }
            TimelineCommand::SetTangents {
                lane,
                frame,
                start,
                end,
            } => self.set_tangents(&lane, frame, start, end),
            TimelineCommand::FullRebake => {
                self.full_rebake();
                Ok(())
            }
        }
    }

    /// Apply commands in order, stopping at the first error.
    pub fn apply_all<I>(&mut self, cmds: I) -> Result<(), TimelineError>
    where
        I: IntoIterator<Item = TimelineCommand>,
    {
        for cmd in cmds {
            self.apply(cmd)?;
        }
        Ok(())
    }

    /// Take all buffered diagnostic events.
    pub fn drain_events(&mut self) -> Vec<TimelineEvent> {
        self.outputs.drain()
    }

    /// Events discarded because the buffer was full.
    pub fn dropped_events(&self) -> u64 {
        self.outputs.dropped()
    }

    // ----- internals -----

    fn bounds(&self, lane: LaneId) -> LaneBounds {
        LaneBounds {
            frame_count: self.frame_count(),
            neutral: self
                .channels
                .get(lane.channel)
                .map_or(0, |spec| spec.neutral()),
        }
    }

    fn check_frame(&self, frame: u32) -> Result<(), TimelineError> {
        let frame_count = self.frame_count();
        if frame > frame_count {
            return Err(TimelineError::FrameOutOfRange { frame, frame_count });
        }
        Ok(())
    }

    fn value_or_neutral(&self, lane: LaneId, frame: u32) -> i32 {
        self.baked
            .value(lane, frame)
            .unwrap_or_else(|| self.channels.spec(lane.channel).neutral())
    }

    fn check_value(&self, id: ChannelId, value: i32) -> Result<(), TimelineError> {
        let spec = self.channels.spec(id);
        if !spec.contains(value) {
            return Err(TimelineError::ValueOutOfRange {
                channel: spec.name.clone(),
                value,
                min: spec.min,
                max: spec.max,
            });
        }
        Ok(())
    }

    fn resolve_edit(&self, edit: &ChannelEdit) -> Result<ResolvedEdit, TimelineError> {
        match edit {
            ChannelEdit::Morph {
                channel,
                lane,
                preset_index,
                value,
            } => {
                let id = self.channels.morph_id(channel)?;
                let count = self.channels.spec(id).preset_count();
                if *preset_index as usize >= count {
                    return Err(TimelineError::PresetOutOfRange {
                        channel: channel.clone(),
                        index: *preset_index,
                        count,
                    });
                }
                self.check_value(id, *value)?;
                Ok(ResolvedEdit::Morph {
                    id,
                    lane: *lane,
                    preset_index: *preset_index,
                    value: *value,
                })
            }
            ChannelEdit::Simple { channel, value } => {
                let id = self.channels.simple_id(channel)?;
                self.check_value(id, *value)?;
                Ok(ResolvedEdit::Simple { id, value: *value })
            }
        }
    }

    fn write_edit(&mut self, edit: ResolvedEdit) {
        let frame = self.cursor;
        match edit {
            ResolvedEdit::Morph {
                id,
                lane,
                preset_index,
                value,
            } => {
                self.store.upsert_morph(frame, id, lane, preset_index, value);
                log::debug!(
                    "keyed {} = {value} (preset {preset_index}) at frame {frame}",
                    self.channels.lane_path(LaneId::morph(id, lane))
                );
            }
            ResolvedEdit::Simple { id, value } => {
                self.store.upsert_simple(frame, id, value);
                log::debug!(
                    "keyed {} = {value} at frame {frame}",
                    self.channels.spec(id).name
                );
            }
        }
    }

    /// Rebake both spans adjacent to the keys of `lanes` at `frame`: all
    /// outgoing spans first, then all incoming ones.
    fn rebake_around(&mut self, frame: u32, lanes: &[LaneId]) {
        let mut outgoing = Vec::with_capacity(lanes.len());
        let mut incoming = Vec::with_capacity(lanes.len());
        for lane in lanes {
            let bounds = self.bounds(*lane);
            if let Some([after, before]) = spans_around(&self.store, *lane, frame, &bounds) {
                outgoing.push(after);
                incoming.push(before);
            }
        }
        for segment in outgoing.iter().chain(incoming.iter()) {
            self.rebake(segment);
        }
    }
}
