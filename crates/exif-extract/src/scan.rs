//! Recursive media file discovery.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Extensions recognized as geotaggable media (photos and videos).
pub const MEDIA_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "tif", "tiff", "webp", "heic", "heif", "mov", "mp4", "m4v",
];

/// Walk `root` and collect every media file. Unreadable entries are skipped.
pub fn scan_media_files(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| MEDIA_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect()
}
