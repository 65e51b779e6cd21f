use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;

use crate::{
    duration::{DEFAULT_DURATION_SECS, TargetDuration},
    foundation::error::{ReelError, ReelResult},
};

pub const ENV_FFMPEG: &str = "SCENEREEL_FFMPEG";
pub const ENV_WORK_DIR: &str = "SCENEREEL_WORK_DIR";

/// Settings handed to [`TranscodeEngine::load`](crate::TranscodeEngine::load).
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Program used by [`FfmpegEngine`](crate::FfmpegEngine).
    pub ffmpeg_binary: PathBuf,
    /// Directory backing the engine's file namespace; a private temp dir when unset.
    pub work_dir: Option<PathBuf>,
    /// Value passed to `-loglevel`.
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ffmpeg_binary: PathBuf::from("ffmpeg"),
            work_dir: None,
            log_level: "error".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    pub engine: EngineConfig,
    pub default_duration_secs: f64,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            default_duration_secs: DEFAULT_DURATION_SECS,
        }
    }
}

impl StudioConfig {
    pub fn load(path: &Path) -> ReelResult<Self> {
        let f = File::open(path).with_context(|| format!("open config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_reader(BufReader::new(f))
            .map_err(|e| ReelError::serde(format!("parse config '{}': {e}", path.display())))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_str(s: &str) -> ReelResult<Self> {
        let cfg: Self =
            serde_json::from_str(s).map_err(|e| ReelError::serde(format!("parse config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply `SCENEREEL_FFMPEG` / `SCENEREEL_WORK_DIR` overrides from the environment.
    pub fn apply_env(mut self) -> Self {
        if let Some(bin) = std::env::var_os(ENV_FFMPEG).filter(|v| !v.is_empty()) {
            self.engine.ffmpeg_binary = PathBuf::from(bin);
        }
        if let Some(dir) = std::env::var_os(ENV_WORK_DIR).filter(|v| !v.is_empty()) {
            self.engine.work_dir = Some(PathBuf::from(dir));
        }
        self
    }

    pub fn validate(&self) -> ReelResult<()> {
        TargetDuration::new(self.default_duration_secs)?;
        if self.engine.ffmpeg_binary.as_os_str().is_empty() {
            return Err(ReelError::validation("engine.ffmpeg_binary must be non-empty"));
        }
        if self.engine.log_level.trim().is_empty() {
            return Err(ReelError::validation("engine.log_level must be non-empty"));
        }
        Ok(())
    }

    pub fn default_duration(&self) -> ReelResult<TargetDuration> {
        TargetDuration::new(self.default_duration_secs)
    }
}
