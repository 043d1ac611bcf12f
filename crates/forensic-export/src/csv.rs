//! CSV report writers.
//!
//! Values are minimally quoted: only fields containing a comma, quote, or
//! newline get wrapped. Optional numbers render as empty cells.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Datelike;

use exif_extract::ManifestRow;
use timeline_core::{capture_stamp, ClusterMember, Gap, MediaRecord, Segment, TimelinePoint};

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn open_csv(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

fn write_row<W: Write>(writer: &mut W, fields: &[String]) -> Result<()> {
    let line: Vec<String> = fields.iter().map(|field| csv_field(field)).collect();
    writeln!(writer, "{}", line.join(","))?;
    Ok(())
}

fn header<W: Write>(writer: &mut W, names: &[&str]) -> Result<()> {
    writeln!(writer, "{}", names.join(","))?;
    Ok(())
}

fn fmt_f64(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", decimals, v),
        None => String::new(),
    }
}

fn fmt_plain_f64(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn opt_str(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn record_columns(record: &MediaRecord) -> Vec<String> {
    vec![
        record.path.display().to_string(),
        fmt_plain_f64(record.lat),
        fmt_plain_f64(record.lon),
        fmt_plain_f64(record.alt),
        record.maps_url().unwrap_or_default(),
        opt_str(&record.make),
        opt_str(&record.model),
        opt_str(&record.file_type),
        opt_str(&record.mime_type),
    ]
}

const RECORD_HEADER: &[&str] = &[
    "path", "lat", "lon", "alt", "gmaps", "make", "model", "filetype", "mimetype",
];

/// The flat evidence table: one row per located record.
pub fn export_main_csv(records: &[MediaRecord], path: &Path) -> Result<()> {
    let mut writer = open_csv(path)?;
    header(&mut writer, RECORD_HEADER)?;
    for record in records {
        write_row(&mut writer, &record_columns(record))?;
    }
    Ok(())
}

/// The full timeline table, one row per point in timeline order.
pub fn export_timeline_csv(timeline: &[TimelinePoint], path: &Path) -> Result<()> {
    let mut writer = open_csv(path)?;
    header(
        &mut writer,
        &[
            "timeline_index",
            "dt_utc",
            "dt_local",
            "dt_naive_iso",
            "datetime_raw",
            "time_source",
            "time_confidence",
            "tz_info",
            "timezone_assumed",
            "lat",
            "lon",
            "alt",
            "path",
            "sha256",
            "gmaps",
            "make",
            "model",
            "filetype",
            "mimetype",
        ],
    )?;
    for point in timeline {
        write_row(
            &mut writer,
            &[
                point.timeline_index.to_string(),
                point.norm.utc_iso.clone(),
                point.norm.local_iso.clone(),
                point.norm.naive_iso.clone(),
                point.time.raw_value.clone(),
                point.time.source_field.clone(),
                point.time.confidence.as_str().to_string(),
                point.norm.tz_info.clone(),
                point.norm.tz_assumed.to_string(),
                fmt_plain_f64(point.record.lat),
                fmt_plain_f64(point.record.lon),
                fmt_plain_f64(point.record.alt),
                point.record.path.display().to_string(),
                opt_str(&point.record.sha256),
                point.record.maps_url().unwrap_or_default(),
                opt_str(&point.record.make),
                opt_str(&point.record.model),
                opt_str(&point.record.file_type),
                opt_str(&point.record.mime_type),
            ],
        )?;
    }
    Ok(())
}

/// Movement segments between adjacent timeline points.
pub fn export_movement_csv(segments: &[Segment], path: &Path) -> Result<()> {
    let mut writer = open_csv(path)?;
    header(
        &mut writer,
        &[
            "from_index",
            "to_index",
            "from_dt",
            "to_dt",
            "distance_m",
            "delta_s",
            "speed_kmh",
            "movement",
        ],
    )?;
    for segment in segments {
        write_row(
            &mut writer,
            &[
                segment.from_index.to_string(),
                segment.to_index.to_string(),
                segment.from_dt.clone(),
                segment.to_dt.clone(),
                fmt_f64(segment.distance_m, 2),
                fmt_f64(segment.delta_s, 3),
                fmt_f64(segment.speed_kmh, 3),
                segment.movement.as_str().to_string(),
            ],
        )?;
    }
    Ok(())
}

/// Recording gaps with severity tiers.
pub fn export_gaps_csv(gaps: &[Gap], path: &Path) -> Result<()> {
    let mut writer = open_csv(path)?;
    header(
        &mut writer,
        &[
            "after_index",
            "before_index",
            "from_dt",
            "to_dt",
            "gap_seconds",
            "gap_level",
        ],
    )?;
    for gap in gaps {
        write_row(
            &mut writer,
            &[
                gap.after_index.to_string(),
                gap.before_index.to_string(),
                gap.from_dt.clone(),
                gap.to_dt.clone(),
                gap.gap_seconds.to_string(),
                gap.gap_level.as_str().to_string(),
            ],
        )?;
    }
    Ok(())
}

/// Duplicate/event clusters. Nothing is written when no cluster survived.
pub fn export_clusters_csv(members: &[ClusterMember], path: &Path) -> Result<()> {
    if members.is_empty() {
        return Ok(());
    }
    let mut writer = open_csv(path)?;
    let mut names = vec!["cluster_id", "cluster_size"];
    names.extend_from_slice(RECORD_HEADER);
    header(&mut writer, &names)?;
    for member in members {
        let mut fields = vec![member.cluster_id.to_string(), member.cluster_size.to_string()];
        fields.extend(record_columns(&member.record));
        write_row(&mut writer, &fields)?;
    }
    Ok(())
}

/// Evidence manifest produced by opt-in hashing.
pub fn export_manifest_csv(rows: &[ManifestRow], path: &Path) -> Result<()> {
    let mut writer = open_csv(path)?;
    header(&mut writer, &["path", "sha256", "size_bytes", "mtime_iso"])?;
    for row in rows {
        write_row(
            &mut writer,
            &[
                row.path.clone(),
                row.sha256.clone(),
                row.size_bytes.map(|s| s.to_string()).unwrap_or_default(),
                row.mtime_iso.clone(),
            ],
        )?;
    }
    Ok(())
}

/// Per-month evidence tables under `<out_dir>/csv/YYYY/YYYY-MM.csv`, with an
/// `unknown/unknown.csv` bucket for records whose capture time does not
/// parse.
pub fn export_monthly_csv(records: &[MediaRecord], out_dir: &Path) -> Result<()> {
    let base = out_dir.join("csv");

    let mut buckets: BTreeMap<String, Vec<&MediaRecord>> = BTreeMap::new();
    for record in records {
        let key = match capture_stamp(record) {
            Some(stamp) => format!("{}/{}-{:02}.csv", stamp.year(), stamp.year(), stamp.month()),
            None => "unknown/unknown.csv".to_string(),
        };
        buckets.entry(key).or_default().push(record);
    }

    for (key, bucket) in buckets {
        let target = base.join(&key);
        let mut writer = open_csv(&target)?;
        header(&mut writer, RECORD_HEADER)?;
        for record in bucket {
            write_row(&mut writer, &record_columns(record))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use timeline_core::{
        analyze_movement, build_timeline, normalize_time, resolve_best_timestamp,
        MovementConfig, TimezoneOptions, DEFAULT_PRIORITY,
    };

    fn located_record(name: &str, taken: Option<&str>) -> MediaRecord {
        let mut record = MediaRecord::new(PathBuf::from(name));
        record.lat = Some(52.52);
        record.lon = Some(13.405);
        record.date_time_original = taken.map(String::from);
        record
    }

    fn timeline_of(records: &[MediaRecord]) -> Vec<TimelinePoint> {
        let options = TimezoneOptions::default();
        build_timeline(
            records
                .iter()
                .cloned()
                .map(|record| {
                    let time = resolve_best_timestamp(&record, DEFAULT_PRIORITY);
                    let norm = normalize_time(&time.raw_value, &record, &options);
                    (record, time, norm)
                })
                .collect(),
        )
    }

    #[test]
    fn test_csv_field_quotes_only_when_needed() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_timeline_csv_has_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timeline.csv");
        let records = vec![
            located_record("a.jpg", Some("2024:01:01 10:00:00")),
            located_record("b.jpg", Some("2024:01:01 11:00:00")),
        ];
        export_timeline_csv(&timeline_of(&records), &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("timeline_index,dt_utc,dt_local,dt_naive_iso"));
        assert!(lines[1].starts_with("1,"));
        assert!(lines[2].starts_with("2,"));
    }

    #[test]
    fn test_movement_csv_blank_cells_for_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("movement.csv");
        // Second record has no timestamp at all: segment has distance but no
        // delta/speed.
        let records = vec![
            located_record("a.jpg", Some("2024:01:01 10:00:00")),
            located_record("b.jpg", None),
        ];
        let timeline = timeline_of(&records);
        let segments = analyze_movement(&timeline, &MovementConfig::default());
        export_movement_csv(&segments, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let row = content.lines().nth(1).unwrap();
        assert!(row.contains("0.00"));
        assert!(row.ends_with(",unknown"));
        let cells: Vec<&str> = row.split(',').collect();
        assert_eq!(cells[5], "", "delta_s must be blank");
        assert_eq!(cells[6], "", "speed_kmh must be blank");
    }

    #[test]
    fn test_monthly_buckets_and_unknown_bucket() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![
            located_record("jan.jpg", Some("2024:01:05 10:00:00")),
            located_record("feb.jpg", Some("2024:02:05 10:00:00")),
            located_record("mystery.jpg", None),
        ];
        export_monthly_csv(&records, dir.path()).unwrap();

        assert!(dir.path().join("csv/2024/2024-01.csv").exists());
        assert!(dir.path().join("csv/2024/2024-02.csv").exists());
        let unknown = fs::read_to_string(dir.path().join("csv/unknown/unknown.csv")).unwrap();
        assert!(unknown.contains("mystery.jpg"));
    }

    #[test]
    fn test_clusters_csv_skipped_when_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("duplicates.csv");
        export_clusters_csv(&[], &path).unwrap();
        assert!(!path.exists());
    }
}
