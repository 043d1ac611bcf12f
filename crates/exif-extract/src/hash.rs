//! Opt-in evidence hashing.
//!
//! Hashing is expensive on large collections, so it only runs when asked
//! for. A file that cannot be read keeps an empty hash, mirroring the
//! degrade-only error policy of the analysis core; the failure is logged,
//! not raised.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;

use timeline_core::MediaRecord;

/// One evidence-manifest line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestRow {
    pub path: String,
    pub sha256: String,
    pub size_bytes: Option<u64>,
    pub mtime_iso: String,
}

/// Streaming SHA-256 of a file's content.
pub fn sha256_file(path: &Path) -> Result<String> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = reader
            .read(&mut buf)
            .with_context(|| format!("read error on {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Stamp every record with its content hash and build the manifest rows,
/// in record order.
pub fn hash_records(records: &mut [MediaRecord]) -> Vec<ManifestRow> {
    records
        .par_iter_mut()
        .map(|record| {
            let sha = match sha256_file(&record.path) {
                Ok(sha) => sha,
                Err(err) => {
                    warn!("hashing failed: {:#}", err);
                    String::new()
                }
            };
            record.sha256 = Some(sha.clone());

            let (size_bytes, mtime_iso) = match std::fs::metadata(&record.path) {
                Ok(meta) => {
                    let mtime = meta
                        .modified()
                        .ok()
                        .map(|t| DateTime::<Local>::from(t).format("%Y-%m-%dT%H:%M:%S").to_string())
                        .unwrap_or_default();
                    (Some(meta.len()), mtime)
                }
                Err(_) => (None, String::new()),
            };

            ManifestRow {
                path: record.path.display().to_string(),
                sha256: sha,
                size_bytes,
                mtime_iso,
            }
        })
        .collect()
}
