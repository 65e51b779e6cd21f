use std::sync::Arc;

use anyhow::Context;

use crate::{
    assets::lifecycle::{HandleId, ResourceHandle},
    foundation::error::{ReelError, ReelResult},
};

/// Longest edge used by [`PreviewHandle::decode_default`].
pub const PREVIEW_MAX_EDGE: u32 = 320;

#[derive(Clone, Debug)]
pub struct PreviewImage {
    pub width: u32,
    pub height: u32,
    /// Straight-alpha RGBA8, row-major, tightly packed.
    pub rgba8: Arc<Vec<u8>>,
}

/// Display-only view of a scene source, exclusively owned by its scene entry.
///
/// The handle keeps a shared reference to the caller's bytes; decoding happens on demand so that
/// appending a scene never fails on a payload the engine might still accept.
#[derive(Debug)]
pub struct PreviewHandle {
    handle: ResourceHandle,
    source: Arc<[u8]>,
}

impl PreviewHandle {
    pub(crate) fn new(handle: ResourceHandle, source: Arc<[u8]>) -> Self {
        Self { handle, source }
    }

    pub fn id(&self) -> HandleId {
        self.handle.id()
    }

    pub fn decode(&self, max_edge: u32) -> ReelResult<PreviewImage> {
        decode_preview(&self.source, max_edge)
    }

    pub fn decode_default(&self) -> ReelResult<PreviewImage> {
        self.decode(PREVIEW_MAX_EDGE)
    }

    pub fn release(self) {
        self.handle.release();
    }
}

pub fn decode_preview(bytes: &[u8], max_edge: u32) -> ReelResult<PreviewImage> {
    if max_edge == 0 {
        return Err(ReelError::validation("preview max edge must be non-zero"));
    }
    let dyn_img = image::load_from_memory(bytes)
        .context("decode preview from memory")
        .map_err(|e| ReelError::validation(format!("{e:#}")))?;

    let dyn_img = if dyn_img.width() > max_edge || dyn_img.height() > max_edge {
        dyn_img.thumbnail(max_edge, max_edge)
    } else {
        dyn_img
    };
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(PreviewImage {
        width,
        height,
        rgba8: Arc::new(rgba.into_raw()),
    })
}
