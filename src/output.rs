use std::{
    path::Path,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::Context as _;

use crate::{
    assets::lifecycle::{HandleId, ResourceHandle},
    engine::{OUTPUT_MEDIA_TYPE, ffmpeg::ensure_parent_dir},
    foundation::error::ReelResult,
};

/// A successful transcode result, owned by the orchestrator until superseded.
#[derive(Debug)]
pub struct OutputArtifact {
    handle: ResourceHandle,
    bytes: Arc<[u8]>,
    file_name: String,
}

impl OutputArtifact {
    pub(crate) fn new(handle: ResourceHandle, bytes: Vec<u8>) -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        Self {
            handle,
            bytes: Arc::from(bytes),
            file_name: format!("scene-video-{millis}.mp4"),
        }
    }

    pub fn id(&self) -> HandleId {
        self.handle.id()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Suggested download name, `scene-video-<unix-millis>.mp4`.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn media_type(&self) -> &'static str {
        OUTPUT_MEDIA_TYPE
    }

    /// Non-owning view that can outlive a borrow of the orchestrator.
    pub fn to_ref(&self) -> OutputRef {
        OutputRef {
            id: self.handle.id(),
            bytes: Arc::clone(&self.bytes),
            file_name: self.file_name.clone(),
        }
    }

    pub fn save_to(&self, path: &Path) -> ReelResult<()> {
        write_output(path, &self.bytes)
    }
}

/// Cheap reference to the current output: its handle id plus shared bytes.
///
/// Holding an `OutputRef` does not keep the handle live; check
/// [`AssetLifecycleManager::is_live`](crate::AssetLifecycleManager::is_live) if that matters.
#[derive(Clone, Debug)]
pub struct OutputRef {
    pub id: HandleId,
    pub bytes: Arc<[u8]>,
    pub file_name: String,
}

impl OutputRef {
    pub fn media_type(&self) -> &'static str {
        OUTPUT_MEDIA_TYPE
    }

    pub fn save_to(&self, path: &Path) -> ReelResult<()> {
        write_output(path, &self.bytes)
    }
}

fn write_output(path: &Path, bytes: &[u8]) -> ReelResult<()> {
    ensure_parent_dir(path)?;
    std::fs::write(path, bytes).with_context(|| format!("write video '{}'", path.display()))?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "video saved");
    Ok(())
}
