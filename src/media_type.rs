use std::path::Path;

/// Extension used when a media type carries no usable subtype.
pub const DEFAULT_IMAGE_EXTENSION: &str = "png";

/// Media type assigned to files whose format cannot be inferred.
pub const UNKNOWN_MEDIA_TYPE: &str = "application/octet-stream";

/// True when `media_type` is in the `image/` category (ASCII case-insensitive).
pub fn is_image_media_type(media_type: &str) -> bool {
    media_type
        .trim()
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image/"))
}

/// File extension for staging a source of `media_type`.
///
/// `image/jpeg` -> `jpeg`, `image/x-icon` -> `x-icon`, `image/svg+xml` -> `svg`, parameters are
/// ignored. The subtype must start alphanumeric and contain only alphanumerics, `-` or `.`;
/// anything else falls back to [`DEFAULT_IMAGE_EXTENSION`].
pub fn extension_for_media_type(media_type: &str) -> String {
    let subtype = media_type
        .split_once('/')
        .map(|(_, rest)| rest)
        .unwrap_or("");
    let subtype = subtype.split(';').next().unwrap_or("").trim();
    let subtype = subtype.split('+').next().unwrap_or("");

    let usable = subtype
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphanumeric())
        && subtype
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
    if !usable {
        return DEFAULT_IMAGE_EXTENSION.to_string();
    }
    subtype.to_ascii_lowercase()
}

/// Infer a media type from a file path's extension.
pub fn media_type_from_path(path: &Path) -> String {
    image::ImageFormat::from_path(path)
        .map(|f| f.to_mime_type().to_string())
        .unwrap_or_else(|_| UNKNOWN_MEDIA_TYPE.to_string())
}
