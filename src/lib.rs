//! Scenereel turns an ordered list of still images into a short 16:9 MP4 clip.
//!
//! # Pipeline overview
//!
//! 1. **Collect**: image sources are appended to a [`SceneTimeline`]; its order is playback order.
//! 2. **Allocate**: the [`TargetDuration`] is split uniformly across scenes ([`allocate`]).
//! 3. **Describe**: scenes are named `scene_NN.<ext>` and listed in an ffconcat manifest
//!    ([`build_manifest`]).
//! 4. **Transcode**: the [`TranscodeOrchestrator`] stages files into a [`TranscodeEngine`], runs
//!    the fixed 1280x720 / 30fps command and keeps the resulting [`OutputArtifact`].
//!
//! Every preview and output resource is tracked by an [`AssetLifecycleManager`] and released
//! exactly once.
#![forbid(unsafe_code)]

mod assets;
mod config;
mod duration;
mod engine;
mod foundation;
mod manifest;
mod media_type;
mod orchestrator;
mod output;
mod session;
mod timeline;

pub use assets::lifecycle::{AssetLifecycleManager, HandleId, ResourceHandle, ResourceKind};
pub use assets::preview::{PREVIEW_MAX_EDGE, PreviewHandle, PreviewImage, decode_preview};
pub use config::{ENV_FFMPEG, ENV_WORK_DIR, EngineConfig, StudioConfig};
pub use duration::{
    DEFAULT_DURATION_SECS, DURATION_STEP_SECS, MAX_DURATION_SECS, MIN_DURATION_SECS,
    SceneDuration, TargetDuration, allocate,
};
pub use engine::ffmpeg::{FfmpegEngine, ensure_parent_dir, is_binary_runnable, is_ffmpeg_on_path};
pub use engine::{
    MANIFEST_FILE, OUTPUT_FILE, OUTPUT_FPS, OUTPUT_HEIGHT, OUTPUT_MEDIA_TYPE, OUTPUT_WIDTH,
    TranscodeEngine, transcode_args, video_filter,
};
pub use foundation::error::{FailureKind, ReelError, ReelResult};
pub use manifest::{
    MANIFEST_HEADER, ManifestEntry, build_manifest, staged_file_name, timeline_entries,
};
pub use media_type::{
    DEFAULT_IMAGE_EXTENSION, UNKNOWN_MEDIA_TYPE, extension_for_media_type, is_image_media_type,
    media_type_from_path,
};
pub use orchestrator::{EMPTY_TIMELINE_MESSAGE, Phase, TranscodeOrchestrator};
pub use output::{OutputArtifact, OutputRef};
pub use session::Studio;
pub use timeline::{MoveDirection, SceneEntry, SceneId, SceneSource, SceneTimeline};
