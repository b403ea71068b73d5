#![forbid(unsafe_code)]

use std::fmt;

/// Lifecycle of a source container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReadyState {
    #[default]
    Closed,
    Open,
    Ended,
}

/// Opaque reference a surface uses to attach a source container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SourceHandle(pub u64);

impl fmt::Display for SourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "source:{}", self.0)
    }
}

/// Playback volume, always within `[Volume::MIN, Volume::MAX]`.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Volume(f64);

impl Volume {
    pub const MIN: f64 = 0.0;
    pub const MAX: f64 = 2.0;

    /// Clamps `value` into range. NaN maps to silence.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self(Self::MIN);
        }
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn get(self) -> f64 {
        self.0
    }

    /// Volume after applying `delta`, clamped.
    #[must_use]
    pub fn adjusted(self, delta: f64) -> Self {
        Self::new(self.0 + delta)
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self(1.0)
    }
}
