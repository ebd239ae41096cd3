//! Posekey timeline core (host-agnostic)
//!
//! Sparse keyframes go in, a dense per-frame value table comes out. Edits
//! rebake only the Bezier segments around the edited frame; hosts read the
//! table back through [`Timeline::get_value`] and [`Timeline::pose_at`].

pub mod baking;
pub mod channel;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod inputs;
pub mod interp;
pub mod neighbors;
pub mod outputs;
pub mod store;

// Re-exports for consumers (adapters)
pub use baking::{bake_presets, bake_segment, BakeReport, BakedTable};
pub use channel::{
    default_channels, ChannelId, ChannelKind, ChannelSpec, ChannelTable, LaneId, LanePath,
    MorphLane, MORPH_MAX, MORPH_MIN,
};
pub use config::TimelineConfig;
pub use data::{ChannelEntry, FrameEntry, KeyPoint, LaneKey, MorphEntry, Tangents, Vec2};
pub use engine::Timeline;
pub use error::TimelineError;
pub use inputs::{ChannelEdit, TimelineCommand};
pub use interp::{solve, SolveError};
pub use neighbors::{
    chain, find_neighbors, reconnect, spans_around, LaneBounds, Neighbor, Neighbors, Segment,
};
pub use outputs::{ChannelSample, FramePose, Outputs, TimelineEvent};
pub use store::{KeyframeStore, RemovedEntry};
