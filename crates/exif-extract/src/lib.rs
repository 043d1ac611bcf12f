//! Media discovery and raw metadata extraction.
//!
//! exiftool is the source of truth for every field: this crate invokes it in
//! batches, maps its JSON into `MediaRecord` values, and never interprets a
//! timestamp itself. Records without a GPS coordinate pair are dropped at
//! intake; everything downstream assumes located media.

pub mod exiftool;
pub mod hash;
pub mod scan;

pub use exiftool::{extract_batch, extract_parallel};
pub use hash::{hash_records, sha256_file, ManifestRow};
pub use scan::{scan_media_files, MEDIA_EXTENSIONS};
