//! GeoJSON export for timeline playback.
//!
//! One point feature per located, time-bearing timeline point. The `time`
//! property carries the UTC instant when known, else the naive render, so
//! playback layers can animate either way.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{json, Value};

use timeline_core::TimelinePoint;

/// Build the FeatureCollection in memory.
pub fn timeline_feature_collection(timeline: &[TimelinePoint]) -> Value {
    let features: Vec<Value> = timeline
        .iter()
        .filter_map(|point| {
            let lat = point.record.lat?;
            let lon = point.record.lon?;
            let time = point.display_time();
            if time.is_empty() {
                return None;
            }
            let popup = point
                .record
                .path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            Some(json!({
                "type": "Feature",
                "geometry": {
                    "type": "Point",
                    "coordinates": [lon, lat],
                },
                "properties": {
                    "time": time,
                    "popup": popup,
                    "path": point.record.path.display().to_string(),
                    "sha256": point.record.sha256.clone().unwrap_or_default(),
                    "datetime_raw": point.time.raw_value,
                    "time_source": point.time.source_field,
                    "time_confidence": point.time.confidence.as_str(),
                    "tz_info": point.norm.tz_info,
                    "timezone_assumed": point.norm.tz_assumed,
                    "gmaps": point.record.maps_url().unwrap_or_default(),
                    "make": point.record.make.clone().unwrap_or_default(),
                    "model": point.record.model.clone().unwrap_or_default(),
                    "timeline_index": point.timeline_index,
                },
            }))
        })
        .collect();

    json!({ "type": "FeatureCollection", "features": features })
}

/// Write the FeatureCollection to disk, pretty-printed.
pub fn export_timeline_geojson(timeline: &[TimelinePoint], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let collection = timeline_feature_collection(timeline);
    let rendered = serde_json::to_string_pretty(&collection)?;
    fs::write(path, rendered).with_context(|| format!("cannot write {}", path.display()))?;
    Ok(())
}
