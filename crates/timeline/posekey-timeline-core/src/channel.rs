//! Channel model: the fixed set of animatable channels and the lanes they expose.
//!
//! Two kinds exist:
//! - Morph channels carry a selectable preset plus two scalar lanes
//!   (`first`, `second`), each in slider units `[-1000, 1000]`.
//! - Simple channels carry a single scalar lane.
//!
//! Lanes are addressed in text as `"<channel>"` (Simple) or
//! `"<channel>.first"` / `"<channel>.second"` (Morph), e.g. `"head_x"` or
//! `"eye.first"`. Names are resolved once into dense [`ChannelId`]s when the
//! [`ChannelTable`] is built; everything downstream works on ids.

use std::fmt;
use std::str::FromStr;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::error::TimelineError;

/// Slider minimum for morph lanes; also their rest value.
pub const MORPH_MIN: i32 = -1000;
/// Slider maximum for morph lanes.
pub const MORPH_MAX: i32 = 1000;

/// Dense channel index into a [`ChannelTable`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelId(pub u16);

/// One of the two scalar lanes of a morph channel.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MorphLane {
    First,
    Second,
}

impl MorphLane {
    pub const ALL: [MorphLane; 2] = [MorphLane::First, MorphLane::Second];

    pub fn as_str(self) -> &'static str {
        match self {
            MorphLane::First => "first",
            MorphLane::Second => "second",
        }
    }
}

impl fmt::Display for MorphLane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MorphLane {
    type Err = TimelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first" => Ok(MorphLane::First),
            "second" => Ok(MorphLane::Second),
            other => Err(TimelineError::InvalidLanePath {
                path: other.to_string(),
                reason: "morph lane must be 'first' or 'second'".to_string(),
            }),
        }
    }
}

/// Kind-specific channel data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChannelKind {
    /// Discrete preset selection plus two scalar lanes.
    Morph { presets: Vec<String> },
    /// Single scalar lane.
    Simple,
}

/// Static description of one channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelSpec {
    pub name: String,
    #[serde(flatten)]
    pub kind: ChannelKind,
    /// Slider minimum (inclusive).
    pub min: i32,
    /// Slider maximum (inclusive).
    pub max: i32,
}

impl ChannelSpec {
    pub fn morph<S: Into<String>>(
        name: impl Into<String>,
        presets: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: ChannelKind::Morph {
                presets: presets.into_iter().map(Into::into).collect(),
            },
            min: MORPH_MIN,
            max: MORPH_MAX,
        }
    }

    pub fn simple(name: impl Into<String>, min: i32, max: i32) -> Self {
        Self {
            name: name.into(),
            kind: ChannelKind::Simple,
            min,
            max,
        }
    }

    #[inline]
    pub fn is_morph(&self) -> bool {
        matches!(self.kind, ChannelKind::Morph { .. })
    }

    /// Number of selectable presets (0 for simple channels).
    #[inline]
    pub fn preset_count(&self) -> usize {
        match &self.kind {
            ChannelKind::Morph { presets } => presets.len(),
            ChannelKind::Simple => 0,
        }
    }

    /// Rest value used where no keyframe applies: the slider minimum for morph
    /// lanes, zero (clamped into range) for simple channels.
    #[inline]
    pub fn neutral(&self) -> i32 {
        match self.kind {
            ChannelKind::Morph { .. } => self.min,
            ChannelKind::Simple => 0_i32.clamp(self.min, self.max),
        }
    }

    #[inline]
    pub fn contains(&self, value: i32) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Reference channel table of the pose editor.
pub fn default_channels() -> Vec<ChannelSpec> {
    vec![
        ChannelSpec::morph(
            "eyebrow",
            ["troubled", "angry", "lowered", "raised", "happy", "serious"],
        ),
        ChannelSpec::morph(
            "eye",
            [
                "wink",
                "happy_wink",
                "surprised",
                "relaxed",
                "unimpressed",
                "raised_lower_eyelid",
            ],
        ),
        ChannelSpec::morph(
            "mouth",
            [
                "aaa",
                "iii",
                "uuu",
                "eee",
                "ooo",
                "delta",
                "lowered_corner",
                "raised_corner",
                "smirk",
            ],
        ),
        ChannelSpec::morph("iris_morphs", ["iris_small"]),
        ChannelSpec::simple("iris_rotation_x", -1000, 1000),
        ChannelSpec::simple("iris_rotation_y", -1000, 1000),
        ChannelSpec::simple("head_x", -1000, 1000),
        ChannelSpec::simple("head_y", -1000, 1000),
        ChannelSpec::simple("neck_z", -1000, 1000),
        ChannelSpec::simple("body_y", -1000, 1000),
        ChannelSpec::simple("body_z", -1000, 1000),
        ChannelSpec::simple("breathing", 0, 1000),
    ]
}

/// Resolved address of one scalar lane.
///
/// `lane` is `Some` exactly when the channel is a morph channel.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LaneId {
    pub channel: ChannelId,
    pub lane: Option<MorphLane>,
}

impl LaneId {
    #[inline]
    pub fn simple(channel: ChannelId) -> Self {
        Self {
            channel,
            lane: None,
        }
    }

    #[inline]
    pub fn morph(channel: ChannelId, lane: MorphLane) -> Self {
        Self {
            channel,
            lane: Some(lane),
        }
    }
}

/// Unresolved textual lane address: `channel[.field]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LanePath {
    pub channel: String,
    pub field: Option<String>,
}

impl LanePath {
    pub fn parse(s: &str) -> Result<Self, TimelineError> {
        let invalid = |reason: &str| TimelineError::InvalidLanePath {
            path: s.to_string(),
            reason: reason.to_string(),
        };
        if s.is_empty() {
            return Err(invalid("empty path"));
        }
        if s.chars().any(char::is_whitespace) {
            return Err(invalid("path contains whitespace"));
        }
        let mut parts = s.split('.');
        let channel = parts.next().unwrap_or_default();
        if channel.is_empty() {
            return Err(invalid("empty channel name"));
        }
        let field = parts.next();
        if parts.next().is_some() {
            return Err(invalid("at most one field selector is allowed"));
        }
        if field.is_some_and(str::is_empty) {
            return Err(invalid("empty field segment"));
        }
        Ok(Self {
            channel: channel.to_string(),
            field: field.map(str::to_string),
        })
    }
}

impl fmt::Display for LanePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{}.{}", self.channel, field),
            None => f.write_str(&self.channel),
        }
    }
}

impl FromStr for LanePath {
    type Err = TimelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LanePath::parse(s)
    }
}

/// Channel table, immutable after construction.
#[derive(Clone, Debug)]
pub struct ChannelTable {
    specs: Vec<ChannelSpec>,
    by_name: HashMap<String, ChannelId>,
}

impl ChannelTable {
    /// Build and validate a table: unique names, `min < max`, non-empty preset lists.
    pub fn new(specs: Vec<ChannelSpec>) -> Result<Self, TimelineError> {
        if specs.len() > u16::MAX as usize {
            return Err(TimelineError::InvalidConfig {
                reason: format!("too many channels: {}", specs.len()),
            });
        }
        let mut by_name = HashMap::with_capacity(specs.len());
        for (idx, spec) in specs.iter().enumerate() {
            if LanePath::parse(&spec.name)?.field.is_some() {
                return Err(TimelineError::InvalidConfig {
                    reason: format!("channel name '{}' must not contain '.'", spec.name),
                });
            }
            if spec.min >= spec.max {
                return Err(TimelineError::InvalidConfig {
                    reason: format!(
                        "channel '{}' has an empty range [{}, {}]",
                        spec.name, spec.min, spec.max
                    ),
                });
            }
            if spec.is_morph() && spec.preset_count() == 0 {
                return Err(TimelineError::InvalidConfig {
                    reason: format!("morph channel '{}' has no presets", spec.name),
                });
            }
            if by_name
                .insert(spec.name.clone(), ChannelId(idx as u16))
                .is_some()
            {
                return Err(TimelineError::InvalidConfig {
                    reason: format!("duplicate channel name '{}'", spec.name),
                });
            }
        }
        Ok(Self { specs, by_name })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn id(&self, name: &str) -> Result<ChannelId, TimelineError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| TimelineError::ChannelNotFound {
                name: name.to_string(),
            })
    }

    /// Spec for an id handed out by this table.
    #[inline]
    pub fn spec(&self, id: ChannelId) -> &ChannelSpec {
        &self.specs[id.0 as usize]
    }

    #[inline]
    pub fn get(&self, id: ChannelId) -> Option<&ChannelSpec> {
        self.specs.get(id.0 as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ChannelId, &ChannelSpec)> {
        self.specs
            .iter()
            .enumerate()
            .map(|(idx, spec)| (ChannelId(idx as u16), spec))
    }

    /// Every lane of every channel, in table order.
    pub fn lanes(&self) -> Vec<LaneId> {
        let mut out = Vec::with_capacity(self.specs.len() * 2);
        for (id, spec) in self.iter() {
            if spec.is_morph() {
                out.extend(MorphLane::ALL.iter().map(|lane| LaneId::morph(id, *lane)));
            } else {
                out.push(LaneId::simple(id));
            }
        }
        out
    }

    /// Resolve a lane path such as `"head_x"` or `"eye.first"`.
    pub fn resolve(&self, path: &str) -> Result<LaneId, TimelineError> {
        let parsed = LanePath::parse(path)?;
        let id = self.id(&parsed.channel)?;
        match (self.spec(id).is_morph(), parsed.field.as_deref()) {
            (false, None) => Ok(LaneId::simple(id)),
            (true, Some(field)) => {
                let lane = field
                    .parse::<MorphLane>()
                    .map_err(|_| TimelineError::InvalidLanePath {
                        path: path.to_string(),
                        reason: "morph lane must be 'first' or 'second'".to_string(),
                    })?;
                Ok(LaneId::morph(id, lane))
            }
            (true, None) => Err(TimelineError::ChannelKindMismatch {
                channel: parsed.channel,
                expected: "a morph lane ('<channel>.first' or '<channel>.second')".to_string(),
            }),
            (false, Some(_)) => Err(TimelineError::ChannelKindMismatch {
                channel: parsed.channel,
                expected: "a simple channel without a lane selector".to_string(),
            }),
        }
    }

    /// Resolve a channel name and require it to be a morph channel.
    pub fn morph_id(&self, name: &str) -> Result<ChannelId, TimelineError> {
        let id = self.id(name)?;
        if !self.spec(id).is_morph() {
            return Err(TimelineError::ChannelKindMismatch {
                channel: name.to_string(),
                expected: "a morph channel".to_string(),
            });
        }
        Ok(id)
    }

    /// Resolve a channel name and require it to be a simple channel.
    pub fn simple_id(&self, name: &str) -> Result<ChannelId, TimelineError> {
        let id = self.id(name)?;
        if self.spec(id).is_morph() {
            return Err(TimelineError::ChannelKindMismatch {
                channel: name.to_string(),
                expected: "a simple channel".to_string(),
            });
        }
        Ok(id)
    }

    /// Text form of a lane, inverse of [`ChannelTable::resolve`].
    pub fn lane_path(&self, lane: LaneId) -> String {
        let name = self
            .get(lane.channel)
            .map_or("<unknown>", |spec| spec.name.as_str());
        match lane.lane {
            Some(l) => format!("{name}.{l}"),
            None => name.to_string(),
        }
    }
}
