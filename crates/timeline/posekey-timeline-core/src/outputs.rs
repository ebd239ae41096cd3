//! Output contracts from the timeline engine.
//!
//! Hosts read baked values directly from the engine; this module carries the
//! per-frame pose snapshot they use to position sliders and the diagnostic
//! events produced while editing.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Discrete diagnostic signals emitted while editing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum TimelineEvent {
    /// A segment was solved and written; `end` is exclusive.
    SegmentBaked { lane: String, start: u32, end: u32 },
    /// The solver found no parameter for this frame; its value was left stale.
    SolverFailed { lane: String, frame: u32 },
    /// All keys at `frame` were deleted.
    KeyframeRemoved { frame: u32 },
    StoreCleared,
}

/// Bounded event buffer; pushing past capacity drops the oldest event.
#[derive(Clone, Debug, Default)]
pub struct Outputs {
    events: VecDeque<TimelineEvent>,
    max_events: usize,
    dropped: u64,
}

impl Outputs {
    pub fn with_capacity(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events.min(1024)),
            max_events,
            dropped: 0,
        }
    }

    #[inline]
    pub fn push_event(&mut self, event: TimelineEvent) {
        if self.max_events == 0 {
            self.dropped += 1;
            return;
        }
        if self.events.len() == self.max_events {
            self.events.pop_front();
            self.dropped += 1;
        }
        self.events.push_back(event);
    }

    #[inline]
    pub fn drain(&mut self) -> Vec<TimelineEvent> {
        self.events.drain(..).collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events discarded because the buffer was full.
    #[inline]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

/// Baked value(s) of one channel at one frame.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChannelSample {
    Morph {
        channel: String,
        preset_index: u32,
        first: i32,
        second: i32,
    },
    Simple {
        channel: String,
        value: i32,
    },
}

/// Every channel of the table at one frame, in table order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FramePose {
    pub frame: u32,
    pub channels: Vec<ChannelSample>,
}

impl FramePose {
    pub fn get(&self, channel: &str) -> Option<&ChannelSample> {
        self.channels.iter().find(|s| match s {
            ChannelSample::Morph { channel: c, .. } | ChannelSample::Simple { channel: c, .. } => {
                c == channel
            }
        })
    }
}
