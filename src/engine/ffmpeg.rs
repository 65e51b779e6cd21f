use std::{
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use anyhow::Context as _;

use crate::{
    config::EngineConfig,
    engine::TranscodeEngine,
    foundation::error::{ReelError, ReelResult},
};

pub fn is_ffmpeg_on_path() -> bool {
    is_binary_runnable(Path::new("ffmpeg"))
}

pub fn is_binary_runnable(binary: &Path) -> bool {
    Command::new(binary)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn ensure_parent_dir(path: &Path) -> ReelResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

enum Workspace {
    Temp(tempfile::TempDir),
    Fixed(PathBuf),
}

impl Workspace {
    fn path(&self) -> &Path {
        match self {
            Self::Temp(t) => t.path(),
            Self::Fixed(p) => p,
        }
    }
}

/// [`TranscodeEngine`] backed by the system `ffmpeg` binary.
///
/// The engine namespace is a private working directory; commands run with it as the current
/// directory so relative names in the manifest resolve against staged files. A temp workspace is
/// removed when the engine is dropped.
pub struct FfmpegEngine {
    binary: PathBuf,
    log_level: String,
    workspace: Option<Workspace>,
}

impl FfmpegEngine {
    pub fn new() -> Self {
        let defaults = EngineConfig::default();
        Self {
            binary: defaults.ffmpeg_binary,
            log_level: defaults.log_level,
            workspace: None,
        }
    }

    /// Directory backing the namespace, once loaded.
    pub fn work_dir(&self) -> Option<&Path> {
        self.workspace.as_ref().map(Workspace::path)
    }

    fn resolve(&self, name: &str) -> ReelResult<PathBuf> {
        let Some(ws) = self.workspace.as_ref() else {
            return Err(ReelError::engine_unavailable("ffmpeg engine is not loaded"));
        };
        validate_name(name)?;
        Ok(ws.path().join(name))
    }
}

impl Default for FfmpegEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TranscodeEngine for FfmpegEngine {
    fn load(&mut self, config: &EngineConfig) -> ReelResult<()> {
        if self.workspace.is_some() {
            return Ok(());
        }

        if !is_binary_runnable(&config.ffmpeg_binary) {
            return Err(ReelError::engine_unavailable(format!(
                "'{}' is required for transcoding, but could not be run",
                config.ffmpeg_binary.display()
            )));
        }

        let workspace = match &config.work_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir).map_err(|e| {
                    ReelError::engine_unavailable(format!(
                        "failed to create work dir '{}': {e}",
                        dir.display()
                    ))
                })?;
                Workspace::Fixed(dir.clone())
            }
            None => Workspace::Temp(
                tempfile::Builder::new()
                    .prefix("scenereel-")
                    .tempdir()
                    .map_err(|e| {
                        ReelError::engine_unavailable(format!("failed to create temp dir: {e}"))
                    })?,
            ),
        };

        tracing::info!(
            binary = %config.ffmpeg_binary.display(),
            work_dir = %workspace.path().display(),
            "ffmpeg engine loaded"
        );
        self.binary = config.ffmpeg_binary.clone();
        self.log_level = config.log_level.clone();
        self.workspace = Some(workspace);
        Ok(())
    }

    fn is_loaded(&self) -> bool {
        self.workspace.is_some()
    }

    fn write_file(&mut self, name: &str, bytes: &[u8]) -> ReelResult<()> {
        let path = self.resolve(name)?;
        std::fs::write(&path, bytes).with_context(|| format!("write '{}'", path.display()))?;
        Ok(())
    }

    fn delete_file(&mut self, name: &str) -> ReelResult<()> {
        let path = self.resolve(name)?;
        std::fs::remove_file(&path).with_context(|| format!("delete '{}'", path.display()))?;
        Ok(())
    }

    fn read_file(&mut self, name: &str) -> ReelResult<Vec<u8>> {
        let path = self.resolve(name)?;
        let bytes = std::fs::read(&path).with_context(|| format!("read '{}'", path.display()))?;
        Ok(bytes)
    }

    #[tracing::instrument(skip_all, fields(argc = args.len()))]
    fn execute(&mut self, args: &[String]) -> ReelResult<()> {
        let Some(ws) = self.workspace.as_ref() else {
            return Err(ReelError::engine_unavailable("ffmpeg engine is not loaded"));
        };

        let output = Command::new(&self.binary)
            .current_dir(ws.path())
            .args(["-hide_banner", "-loglevel", self.log_level.as_str()])
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                ReelError::execution(format!(
                    "failed to spawn '{}': {e}",
                    self.binary.display()
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ReelError::execution(format!(
                "ffmpeg exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

fn validate_name(name: &str) -> ReelResult<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.contains('\0');
    if bad {
        return Err(ReelError::validation(format!(
            "invalid engine file name '{name}' (plain file names only)"
        )));
    }
    Ok(())
}
