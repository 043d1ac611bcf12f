//! Batch metadata extraction through exiftool.
//!
//! One `exiftool -n -json` invocation per chunk; chunks run in parallel on
//! the rayon pool. `-n` keeps GPS values numeric. A handful of tags come back
//! as strings or numbers depending on the file, so those go through a
//! tolerant deserializer instead of a fixed type.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Deserialize;
use tracing::{debug, warn};

use timeline_core::MediaRecord;

/// Tags requested from exiftool, matching what the analysis core recognizes.
const EXIFTOOL_ARGS: &[&str] = &[
    "-n",
    "-json",
    "-q",
    "-GPSLatitude",
    "-GPSLongitude",
    "-GPSAltitude",
    "-GPSDateTime",
    "-DateTimeOriginal",
    "-CreateDate",
    "-MediaCreateDate",
    "-TrackCreateDate",
    "-OffsetTimeOriginal",
    "-OffsetTime",
    "-TimeZone",
    "-TimeZoneOffset",
    "-Make",
    "-Model",
    "-FileType",
    "-MIMEType",
    "-FileName",
    "-Directory",
];

/// Deserialize a value that could be a string or a number into Option<String>.
fn deserialize_string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de;

    struct StringOrNumber;
    impl<'de> de::Visitor<'de> for StringOrNumber {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a string or number")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error> {
            // Some tags (TimeZoneOffset) occasionally arrive as a pair;
            // drain and ignore, the offset parser cannot use them anyway.
            while seq.next_element::<serde_json::Value>()?.is_some() {}
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
            Ok(None)
        }
    }

    deserializer.deserialize_any(StringOrNumber)
}

#[derive(Deserialize)]
struct ExiftoolOutput {
    #[serde(rename = "SourceFile")]
    source_file: String,
    #[serde(rename = "GPSLatitude")]
    gps_latitude: Option<f64>,
    #[serde(rename = "GPSLongitude")]
    gps_longitude: Option<f64>,
    #[serde(rename = "GPSAltitude", deserialize_with = "deserialize_string_or_number", default)]
    gps_altitude: Option<String>,
    #[serde(rename = "GPSDateTime")]
    gps_date_time: Option<String>,
    #[serde(rename = "DateTimeOriginal")]
    date_time_original: Option<String>,
    #[serde(rename = "CreateDate")]
    create_date: Option<String>,
    #[serde(rename = "MediaCreateDate")]
    media_create_date: Option<String>,
    #[serde(rename = "TrackCreateDate")]
    track_create_date: Option<String>,
    #[serde(rename = "OffsetTimeOriginal")]
    offset_time_original: Option<String>,
    #[serde(rename = "OffsetTime")]
    offset_time: Option<String>,
    #[serde(rename = "TimeZone", deserialize_with = "deserialize_string_or_number", default)]
    time_zone: Option<String>,
    #[serde(rename = "TimeZoneOffset", deserialize_with = "deserialize_string_or_number", default)]
    time_zone_offset: Option<String>,
    #[serde(rename = "Make")]
    make: Option<String>,
    #[serde(rename = "Model")]
    model: Option<String>,
    #[serde(rename = "FileType")]
    file_type: Option<String>,
    #[serde(rename = "MIMEType")]
    mime_type: Option<String>,
    #[serde(rename = "FileName")]
    file_name: Option<String>,
    #[serde(rename = "Directory")]
    directory: Option<String>,
}

/// Map one batch of exiftool JSON into records, keeping only those with a
/// GPS coordinate pair.
fn parse_exiftool_json(json: &str) -> Result<Vec<MediaRecord>> {
    let items: Vec<ExiftoolOutput> = serde_json::from_str(json).with_context(|| {
        let preview: String = json.chars().take(200).collect();
        format!("failed to parse exiftool JSON output (starts: {})", preview)
    })?;

    let mut records = Vec::new();
    for item in items {
        let (lat, lon) = match (item.gps_latitude, item.gps_longitude) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => {
                debug!("no GPS coordinates in {}, skipping", item.source_file);
                continue;
            }
        };

        let path = match (item.directory.as_deref(), item.file_name.as_deref()) {
            (Some(dir), Some(name)) => Path::new(dir).join(name),
            _ => PathBuf::from(&item.source_file),
        };

        records.push(MediaRecord {
            path,
            lat: Some(lat),
            lon: Some(lon),
            alt: item.gps_altitude.as_deref().and_then(|v| v.parse().ok()),
            make: item.make,
            model: item.model,
            file_type: item.file_type,
            mime_type: item.mime_type,
            sha256: None,
            gps_date_time: item.gps_date_time,
            date_time_original: item.date_time_original,
            media_create_date: item.media_create_date,
            track_create_date: item.track_create_date,
            create_date: item.create_date,
            offset_time_original: item.offset_time_original,
            offset_time: item.offset_time,
            time_zone: item.time_zone,
            time_zone_offset: item.time_zone_offset,
        });
    }

    Ok(records)
}

/// Run one exiftool batch over `paths`.
pub fn extract_batch(paths: &[PathBuf]) -> Result<Vec<MediaRecord>> {
    if paths.is_empty() {
        return Ok(Vec::new());
    }

    let output = Command::new("exiftool")
        .args(EXIFTOOL_ARGS)
        .args(paths)
        .output()
        .context("failed to run exiftool; make sure it is installed and in PATH")?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    if stdout.trim().is_empty() {
        return Ok(Vec::new());
    }

    parse_exiftool_json(&stdout)
}

/// Extract a whole file list in parallel chunks. A failed chunk is logged
/// and contributes nothing; extraction never aborts the run.
pub fn extract_parallel(files: &[PathBuf], chunk_size: usize) -> Vec<MediaRecord> {
    let chunk_size = chunk_size.max(1);
    files
        .par_chunks(chunk_size)
        .flat_map(|chunk| match extract_batch(chunk) {
            Ok(records) => records,
            Err(err) => {
                warn!("exiftool batch failed: {:#}", err);
                Vec::new()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_mapping_keeps_raw_tags() {
        let json = r#"[{
            "SourceFile": "/media/trip/img1.jpg",
            "GPSLatitude": 52.52,
            "GPSLongitude": 13.405,
            "GPSAltitude": 34.5,
            "DateTimeOriginal": "2024:01:01 10:00:00",
            "OffsetTimeOriginal": "+02:00",
            "Make": "Canon",
            "Model": "EOS R5",
            "FileType": "JPEG",
            "MIMEType": "image/jpeg",
            "FileName": "img1.jpg",
            "Directory": "/media/trip"
        }]"#;
        let records = parse_exiftool_json(json).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.path, PathBuf::from("/media/trip/img1.jpg"));
        assert_eq!(record.lat, Some(52.52));
        assert_eq!(record.alt, Some(34.5));
        assert_eq!(record.date_time_original.as_deref(), Some("2024:01:01 10:00:00"));
        assert_eq!(record.offset_time_original.as_deref(), Some("+02:00"));
        assert_eq!(record.make.as_deref(), Some("Canon"));
    }

    #[test]
    fn test_records_without_gps_are_dropped() {
        let json = r#"[
            {"SourceFile": "a.jpg", "GPSLatitude": 52.52, "GPSLongitude": 13.405},
            {"SourceFile": "b.jpg", "DateTimeOriginal": "2024:01:01 10:00:00"},
            {"SourceFile": "c.jpg", "GPSLatitude": 52.52}
        ]"#;
        let records = parse_exiftool_json(json).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].path, PathBuf::from("a.jpg"));
    }

    #[test]
    fn test_numeric_and_list_timezone_tags_survive() {
        // exiftool emits TimeZoneOffset as a bare number or even a pair;
        // neither may break deserialization.
        let json = r#"[
            {"SourceFile": "a.jpg", "GPSLatitude": 1.0, "GPSLongitude": 2.0, "TimeZoneOffset": -5},
            {"SourceFile": "b.jpg", "GPSLatitude": 1.0, "GPSLongitude": 2.0, "TimeZoneOffset": [2, 2]},
            {"SourceFile": "c.jpg", "GPSLatitude": 1.0, "GPSLongitude": 2.0, "TimeZone": "+02:00"}
        ]"#;
        let records = parse_exiftool_json(json).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].time_zone_offset.as_deref(), Some("-5"));
        assert_eq!(records[1].time_zone_offset, None);
        assert_eq!(records[2].time_zone.as_deref(), Some("+02:00"));
    }

    #[test]
    fn test_malformed_json_is_an_error_with_preview() {
        let err = parse_exiftool_json("this is not json").unwrap_err();
        assert!(format!("{:#}", err).contains("this is not json"));
    }
}
