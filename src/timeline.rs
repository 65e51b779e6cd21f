use std::{path::Path, sync::Arc};

use anyhow::Context as _;

use crate::{
    assets::{
        lifecycle::{AssetLifecycleManager, ResourceKind},
        preview::PreviewHandle,
    },
    foundation::error::ReelResult,
    media_type::{is_image_media_type, media_type_from_path},
};

/// Stable identifier of a scene, unique within a session.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SceneId(String);

impl SceneId {
    fn generate(display_name: &str) -> Self {
        Self(format!("{display_name}-{}", uuid::Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SceneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One user-selected file, as handed over by the image source provider.
#[derive(Clone, Debug)]
pub struct SceneSource {
    pub bytes: Arc<[u8]>,
    pub media_type: String,
    pub display_name: String,
}

impl SceneSource {
    pub fn new(
        bytes: impl Into<Arc<[u8]>>,
        media_type: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            media_type: media_type.into(),
            display_name: display_name.into(),
        }
    }

    /// Read a file from disk, inferring its media type from the extension.
    pub fn from_path(path: &Path) -> ReelResult<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("read scene source '{}'", path.display()))?;
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "scene".to_string());
        Ok(Self::new(bytes, media_type_from_path(path), display_name))
    }
}

#[derive(Debug)]
pub struct SceneEntry {
    id: SceneId,
    display_name: String,
    source: Arc<[u8]>,
    media_type: String,
    preview: PreviewHandle,
}

impl SceneEntry {
    pub fn id(&self) -> &SceneId {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn source_bytes(&self) -> &Arc<[u8]> {
        &self.source
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn preview(&self) -> &PreviewHandle {
        &self.preview
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveDirection {
    Previous,
    Next,
}

/// Ordered list of scenes; position in the list is playback order.
#[derive(Debug)]
pub struct SceneTimeline {
    lifecycle: AssetLifecycleManager,
    entries: Vec<SceneEntry>,
}

impl SceneTimeline {
    pub fn new(lifecycle: AssetLifecycleManager) -> Self {
        Self {
            lifecycle,
            entries: Vec::new(),
        }
    }

    /// Append every image source in order; other media types are dropped silently.
    ///
    /// Returns the ids of the accepted entries. If a preview handle cannot be issued, nothing
    /// from this batch is appended.
    pub fn append(
        &mut self,
        sources: impl IntoIterator<Item = SceneSource>,
    ) -> ReelResult<Vec<SceneId>> {
        let mut staged = Vec::new();
        let mut skipped = 0usize;
        for src in sources {
            if !is_image_media_type(&src.media_type) {
                skipped += 1;
                continue;
            }
            let handle = self.lifecycle.acquire(ResourceKind::Preview)?;
            staged.push(SceneEntry {
                id: SceneId::generate(&src.display_name),
                preview: PreviewHandle::new(handle, Arc::clone(&src.bytes)),
                display_name: src.display_name,
                source: src.bytes,
                media_type: src.media_type,
            });
        }

        if skipped > 0 {
            tracing::debug!(skipped, "dropped non-image sources");
        }
        let ids = staged.iter().map(|e| e.id.clone()).collect();
        self.entries.extend(staged);
        Ok(ids)
    }

    /// Remove `id` and release its preview. Returns false if it was not present.
    pub fn remove(&mut self, id: &SceneId) -> bool {
        let Some(idx) = self.position(id) else {
            return false;
        };
        let entry = self.entries.remove(idx);
        entry.preview.release();
        true
    }

    /// Swap `id` with its neighbour in `direction`. Returns false on a no-op.
    pub fn move_scene(&mut self, id: &SceneId, direction: MoveDirection) -> bool {
        let Some(idx) = self.position(id) else {
            return false;
        };
        let target = match direction {
            MoveDirection::Previous => idx.checked_sub(1),
            MoveDirection::Next => Some(idx + 1).filter(|&t| t < self.entries.len()),
        };
        let Some(target) = target else {
            return false;
        };
        self.entries.swap(idx, target);
        true
    }

    pub fn clear(&mut self) {
        for entry in self.entries.drain(..) {
            entry.preview.release();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn position(&self, id: &SceneId) -> Option<usize> {
        self.entries.iter().position(|e| &e.id == id)
    }

    pub fn get(&self, id: &SceneId) -> Option<&SceneEntry> {
        self.entries.iter().find(|e| &e.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SceneEntry> {
        self.entries.iter()
    }

    pub fn ids(&self) -> Vec<SceneId> {
        self.entries.iter().map(|e| e.id.clone()).collect()
    }

    pub fn lifecycle(&self) -> &AssetLifecycleManager {
        &self.lifecycle
    }
}

impl<'a> IntoIterator for &'a SceneTimeline {
    type Item = &'a SceneEntry;
    type IntoIter = std::slice::Iter<'a, SceneEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
