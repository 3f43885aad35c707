use std::path::Path;

/// How a supported file has to be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    /// Decodable by the `image` crate
    Standard,
    /// Camera RAW, decoded through `rawloader`
    Raw,
}

/// Classifies a path by its extension (case-insensitive)
pub fn classify(path: &Path) -> Option<ImageKind> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(from_extension)
}

/// Returns true if the path names a supported image file
pub fn is_supported_image(path: &Path) -> bool {
    classify(path).is_some()
}

fn from_extension(ext: &str) -> Option<ImageKind> {
    let ext_lower = ext.to_lowercase();
    match ext_lower.as_str() {
        "jpg" | "jpeg" | "png" | "gif" | "bmp" | "webp" => Some(ImageKind::Standard),
        "cr2" | "nef" | "arw" | "orf" | "rw2" | "raf" | "dng" => Some(ImageKind::Raw),
        _ => None,
    }
}
