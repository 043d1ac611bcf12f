//! SQLite evidence export.
//!
//! A single `evidence` table mirrors the timeline CSV so the collection can
//! be queried after the fact. Inserts run inside one transaction.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use timeline_core::TimelinePoint;

const CREATE_EVIDENCE: &str = "CREATE TABLE IF NOT EXISTS evidence (
    id INTEGER PRIMARY KEY,
    path TEXT,
    sha256 TEXT,
    dt_utc TEXT,
    dt_naive TEXT,
    datetime_raw TEXT,
    time_source TEXT,
    time_confidence TEXT,
    tz_info TEXT,
    timezone_assumed INTEGER,
    make TEXT,
    model TEXT,
    filetype TEXT,
    mimetype TEXT,
    lat REAL,
    lon REAL,
    alt TEXT,
    maps_url TEXT
)";

pub fn export_sqlite(timeline: &[TimelinePoint], db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut conn = Connection::open(db_path)
        .with_context(|| format!("cannot open {}", db_path.display()))?;
    conn.execute(CREATE_EVIDENCE, [])?;

    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO evidence (
                path, sha256, dt_utc, dt_naive, datetime_raw, time_source,
                time_confidence, tz_info, timezone_assumed, make, model,
                filetype, mimetype, lat, lon, alt, maps_url
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        )?;
        for point in timeline {
            stmt.execute(params![
                point.record.path.display().to_string(),
                point.record.sha256.clone().unwrap_or_default(),
                point.norm.utc_iso,
                point.norm.naive_iso,
                point.time.raw_value,
                point.time.source_field,
                point.time.confidence.as_str(),
                point.norm.tz_info,
                point.norm.tz_assumed as i64,
                point.record.make.clone().unwrap_or_default(),
                point.record.model.clone().unwrap_or_default(),
                point.record.file_type.clone().unwrap_or_default(),
                point.record.mime_type.clone().unwrap_or_default(),
                point.record.lat,
                point.record.lon,
                point.record.alt.map(|a| a.to_string()).unwrap_or_default(),
                point.record.maps_url().unwrap_or_default(),
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use timeline_core::{MediaRecord, NormalizedTime, TimeResolution};

    fn point(index: usize, utc: &str) -> TimelinePoint {
        let mut record = MediaRecord::new(PathBuf::from(format!("img{}.jpg", index)));
        record.lat = Some(52.5);
        record.lon = Some(13.4);
        TimelinePoint {
            record,
            time: TimeResolution::empty(),
            norm: NormalizedTime {
                naive_iso: String::new(),
                local_iso: String::new(),
                utc_iso: utc.to_string(),
                tz_info: "embedded".to_string(),
                tz_assumed: false,
            },
            timeline_index: index,
        }
    }

    #[test]
    fn test_evidence_rows_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("forensic_data.sqlite");
        let timeline = vec![
            point(1, "2024-01-01T08:00:00Z"),
            point(2, "2024-01-01T09:00:00Z"),
        ];
        export_sqlite(&timeline, &db_path).unwrap();

        let conn = Connection::open(&db_path).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM evidence", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 2);

        let dt_utc: String = conn
            .query_row(
                "SELECT dt_utc FROM evidence WHERE path = 'img1.jpg'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(dt_utc, "2024-01-01T08:00:00Z");
    }
}
