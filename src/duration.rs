use crate::foundation::error::{ReelError, ReelResult};

pub const MIN_DURATION_SECS: f64 = 15.0;
pub const MAX_DURATION_SECS: f64 = 20.0;
pub const DEFAULT_DURATION_SECS: f64 = 18.0;
pub const DURATION_STEP_SECS: f64 = 0.5;

/// Requested total length of the output clip, always within
/// [`MIN_DURATION_SECS`, `MAX_DURATION_SECS`].
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct TargetDuration(f64);

impl TargetDuration {
    pub fn new(secs: f64) -> ReelResult<Self> {
        if !secs.is_finite() {
            return Err(ReelError::validation("target duration must be finite"));
        }
        if !(MIN_DURATION_SECS..=MAX_DURATION_SECS).contains(&secs) {
            return Err(ReelError::validation(format!(
                "target duration must be between {MIN_DURATION_SECS} and {MAX_DURATION_SECS} seconds (got {secs})"
            )));
        }
        Ok(Self(secs))
    }

    /// Snap `secs` into range and onto the slider grid. Non-finite input yields the default.
    pub fn clamped(secs: f64) -> Self {
        if !secs.is_finite() {
            return Self::default();
        }
        let snapped = (secs / DURATION_STEP_SECS).round() * DURATION_STEP_SECS;
        Self(snapped.clamp(MIN_DURATION_SECS, MAX_DURATION_SECS))
    }

    pub fn as_secs_f64(self) -> f64 {
        self.0
    }

    /// Whole-second label for display, e.g. `18 s`.
    pub fn label(self) -> String {
        format!("{} s", self.0.round() as u32)
    }
}

impl Default for TargetDuration {
    fn default() -> Self {
        Self(DEFAULT_DURATION_SECS)
    }
}

impl TryFrom<f64> for TargetDuration {
    type Error = ReelError;

    fn try_from(secs: f64) -> ReelResult<Self> {
        Self::new(secs)
    }
}

impl From<TargetDuration> for f64 {
    fn from(d: TargetDuration) -> f64 {
        d.0
    }
}

/// Per-scene display time, held at millisecond precision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SceneDuration {
    millis: u64,
}

impl SceneDuration {
    pub fn from_millis(millis: u64) -> Self {
        Self { millis }
    }

    pub fn as_millis(self) -> u64 {
        self.millis
    }

    pub fn as_secs_f64(self) -> f64 {
        self.millis as f64 / 1000.0
    }
}

/// Renders with exactly three decimals (`6.000`), the precision the concat manifest uses.
impl std::fmt::Display for SceneDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:03}", self.millis / 1000, self.millis % 1000)
    }
}

/// Split `total` uniformly across `scene_count` scenes, rounded to the nearest millisecond.
pub fn allocate(scene_count: usize, total: TargetDuration) -> ReelResult<SceneDuration> {
    if scene_count == 0 {
        return Err(ReelError::validation(
            "cannot allocate durations for an empty timeline",
        ));
    }
    let millis = (total.as_secs_f64() * 1000.0 / scene_count as f64).round();
    Ok(SceneDuration::from_millis(millis as u64))
}
