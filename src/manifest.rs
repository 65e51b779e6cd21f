use crate::{
    duration::{SceneDuration, TargetDuration, allocate},
    foundation::error::{ReelError, ReelResult},
    media_type::extension_for_media_type,
    timeline::SceneTimeline,
};

pub const MANIFEST_HEADER: &str = "ffconcat version 1.0";

/// One segment of the concat list: a staged file and how long it is shown.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManifestEntry {
    pub file_name: String,
    pub duration: SceneDuration,
}

/// Deterministic staging name for the scene at `index`: `scene_00.png`, `scene_01.jpeg`, ...
pub fn staged_file_name(index: usize, media_type: &str) -> String {
    format!("scene_{index:02}.{}", extension_for_media_type(media_type))
}

/// One entry per scene in timeline order, each shown for an equal share of `target`.
pub fn timeline_entries(
    timeline: &SceneTimeline,
    target: TargetDuration,
) -> ReelResult<Vec<ManifestEntry>> {
    let per_scene = allocate(timeline.len(), target)?;
    Ok(timeline
        .iter()
        .enumerate()
        .map(|(index, scene)| ManifestEntry {
            file_name: staged_file_name(index, scene.media_type()),
            duration: per_scene,
        })
        .collect())
}

/// Render the ffconcat list for `entries`, in order.
///
/// Every entry gets a `file` line followed by a `duration` line, except the last, which is
/// written as a bare `file` line: its display time is bounded by the end of the stream. Lines are
/// joined by `\n` with no trailing newline.
pub fn build_manifest(entries: &[ManifestEntry]) -> ReelResult<String> {
    let Some((last, body)) = entries.split_last() else {
        return Err(ReelError::validation(
            "manifest requires at least one entry",
        ));
    };

    let mut lines = Vec::with_capacity(entries.len() * 2);
    lines.push(MANIFEST_HEADER.to_string());
    for entry in body {
        lines.push(file_line(&entry.file_name));
        lines.push(format!("duration {}", entry.duration));
    }
    lines.push(file_line(&last.file_name));

    Ok(lines.join("\n"))
}

fn file_line(name: &str) -> String {
    // ffconcat quoting: close the quote, emit an escaped quote, reopen.
    format!("file '{}'", name.replace('\'', r"'\''"))
}
