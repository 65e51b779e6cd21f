pub mod ffmpeg;

use crate::{config::EngineConfig, foundation::error::ReelResult};

/// Name of the concat list staged next to the scene files.
pub const MANIFEST_FILE: &str = "inputs.txt";
/// Name the transcode writes its artifact to.
pub const OUTPUT_FILE: &str = "output.mp4";

pub const OUTPUT_WIDTH: u32 = 1280;
pub const OUTPUT_HEIGHT: u32 = 720;
pub const OUTPUT_FPS: u32 = 30;
pub const OUTPUT_MEDIA_TYPE: &str = "video/mp4";

/// An external transcoding engine with its own file namespace.
///
/// File names are plain names (no directories) inside the engine's namespace. Implementations
/// are driven from one thread at a time; the orchestrator serializes access.
pub trait TranscodeEngine: Send {
    /// One-time initialization. Must be a no-op once loaded.
    fn load(&mut self, config: &EngineConfig) -> ReelResult<()>;

    fn is_loaded(&self) -> bool;

    fn write_file(&mut self, name: &str, bytes: &[u8]) -> ReelResult<()>;

    /// Delete `name`; a missing file is reported as an error.
    fn delete_file(&mut self, name: &str) -> ReelResult<()>;

    fn read_file(&mut self, name: &str) -> ReelResult<Vec<u8>>;

    /// Run one transcode command with `args` (no program name).
    fn execute(&mut self, args: &[String]) -> ReelResult<()>;
}

impl<E: TranscodeEngine + ?Sized> TranscodeEngine for Box<E> {
    fn load(&mut self, config: &EngineConfig) -> ReelResult<()> {
        (**self).load(config)
    }

    fn is_loaded(&self) -> bool {
        (**self).is_loaded()
    }

    fn write_file(&mut self, name: &str, bytes: &[u8]) -> ReelResult<()> {
        (**self).write_file(name, bytes)
    }

    fn delete_file(&mut self, name: &str) -> ReelResult<()> {
        (**self).delete_file(name)
    }

    fn read_file(&mut self, name: &str) -> ReelResult<Vec<u8>> {
        (**self).read_file(name)
    }

    fn execute(&mut self, args: &[String]) -> ReelResult<()> {
        (**self).execute(args)
    }
}

/// Scale-and-pad filter: fit inside the frame, keep aspect ratio, center on padding.
pub fn video_filter() -> String {
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,format=yuv420p",
        w = OUTPUT_WIDTH,
        h = OUTPUT_HEIGHT,
    )
}

/// The fixed transcode command: concat-demux the manifest into a 1280x720 30fps H.264 MP4.
pub fn transcode_args() -> Vec<String> {
    let filter = video_filter();
    let fps = OUTPUT_FPS.to_string();
    [
        "-y",
        "-f",
        "concat",
        "-safe",
        "0",
        "-i",
        MANIFEST_FILE,
        "-vf",
        filter.as_str(),
        "-c:v",
        "libx264",
        "-pix_fmt",
        "yuv420p",
        "-movflags",
        "faststart",
        "-r",
        fps.as_str(),
        OUTPUT_FILE,
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
