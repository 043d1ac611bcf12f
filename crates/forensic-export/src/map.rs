//! Self-contained interactive map report.
//!
//! A single Leaflet page: evidence markers, movement segments colored by
//! classification, and gap markers on the point after each discontinuity.
//! All data is embedded inline so the file works without a server.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{json, Value};

use timeline_core::{Gap, Movement, Segment, TimelinePoint};

fn movement_color(movement: Movement) -> &'static str {
    match movement {
        Movement::Move => "green",
        Movement::Stop => "blue",
        Movement::Jump => "red",
        Movement::Unknown => "gray",
    }
}

fn marker_data(timeline: &[TimelinePoint]) -> Vec<Value> {
    timeline
        .iter()
        .filter_map(|point| {
            let lat = point.record.lat?;
            let lon = point.record.lon?;
            let name = point
                .record
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            Some(json!({
                "lat": lat,
                "lon": lon,
                "name": name,
                "dt_utc": point.norm.utc_iso,
                "dt_naive": point.norm.naive_iso,
                "raw": point.time.raw_value,
                "source": point.time.source_field,
                "confidence": point.time.confidence.as_str(),
                "tz": point.norm.tz_info,
                "assumed": point.norm.tz_assumed,
                "sha256": point.record.sha256.clone().unwrap_or_default(),
                "gmaps": point.record.maps_url().unwrap_or_default(),
            }))
        })
        .collect()
}

fn segment_data(timeline: &[TimelinePoint], segments: &[Segment]) -> Vec<Value> {
    let coords: HashMap<usize, (f64, f64)> = timeline
        .iter()
        .filter_map(|point| {
            let lat = point.record.lat?;
            let lon = point.record.lon?;
            Some((point.timeline_index, (lat, lon)))
        })
        .collect();

    segments
        .iter()
        .filter_map(|segment| {
            let from = coords.get(&segment.from_index)?;
            let to = coords.get(&segment.to_index)?;
            let tooltip = format!(
                "{} | {} m | {} km/h | dt={}s",
                segment.movement.as_str(),
                segment
                    .distance_m
                    .map(|d| format!("{:.2}", d))
                    .unwrap_or_default(),
                segment
                    .speed_kmh
                    .map(|s| format!("{:.3}", s))
                    .unwrap_or_default(),
                segment
                    .delta_s
                    .map(|d| format!("{:.3}", d))
                    .unwrap_or_default(),
            );
            Some(json!({
                "from": [from.0, from.1],
                "to": [to.0, to.1],
                "color": movement_color(segment.movement),
                "tooltip": tooltip,
            }))
        })
        .collect()
}

fn gap_data(timeline: &[TimelinePoint], gaps: &[Gap]) -> Vec<Value> {
    // A gap is drawn on the point after the discontinuity.
    gaps.iter()
        .filter_map(|gap| {
            let point = timeline
                .iter()
                .find(|p| p.timeline_index == gap.before_index)?;
            let lat = point.record.lat?;
            let lon = point.record.lon?;
            Some(json!({
                "lat": lat,
                "lon": lon,
                "tooltip": format!(
                    "{} | {}s\n{} -> {}",
                    gap.gap_level.as_str(),
                    gap.gap_seconds,
                    gap.from_dt,
                    gap.to_dt
                ),
            }))
        })
        .collect()
}

pub fn export_interactive_map(
    timeline: &[TimelinePoint],
    segments: Option<&[Segment]>,
    gaps: Option<&[Gap]>,
    html_path: &Path,
) -> Result<()> {
    let markers = marker_data(timeline);
    if markers.is_empty() {
        return Ok(());
    }
    let center = (
        markers[0]["lat"].as_f64().unwrap_or(0.0),
        markers[0]["lon"].as_f64().unwrap_or(0.0),
    );
    let segment_json = segments
        .map(|s| Value::Array(segment_data(timeline, s)))
        .unwrap_or(Value::Array(Vec::new()));
    let gap_json = gaps
        .map(|g| Value::Array(gap_data(timeline, g)))
        .unwrap_or(Value::Array(Vec::new()));

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Forensic GPS Map</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<style>html, body, #map {{ height: 100%; margin: 0; }}</style>
</head>
<body>
<div id="map"></div>
<script>
var markers = {markers};
var segments = {segments};
var gaps = {gaps};

var map = L.map('map').setView([{center_lat}, {center_lon}], 4);
L.tileLayer('https://{{s}}.basemaps.cartocdn.com/light_all/{{z}}/{{x}}/{{y}}.png', {{
  attribution: '&copy; OpenStreetMap &copy; CARTO'
}}).addTo(map);

var evidenceLayer = L.layerGroup().addTo(map);
markers.forEach(function (m) {{
  var popup = '<b>' + m.name + '</b><br>' +
    'dt_utc: ' + m.dt_utc + '<br>' +
    'dt_naive: ' + m.dt_naive + '<br>' +
    'raw: ' + m.raw + '<br>' +
    'src: ' + m.source + ' / ' + m.confidence + '<br>' +
    'tz: ' + m.tz + ' (assumed=' + m.assumed + ')<br>' +
    'sha256: <code>' + m.sha256 + '</code><br>' +
    '<a href="' + m.gmaps + '" target="_blank">Google Maps</a>';
  L.marker([m.lat, m.lon]).bindPopup(popup).addTo(evidenceLayer);
}});

var segmentLayer = L.layerGroup().addTo(map);
segments.forEach(function (s) {{
  L.polyline([s.from, s.to], {{ color: s.color, weight: 4, opacity: 0.85 }})
    .bindTooltip(s.tooltip)
    .addTo(segmentLayer);
}});

var gapLayer = L.layerGroup();
gaps.forEach(function (g) {{
  L.circleMarker([g.lat, g.lon], {{ radius: 7, color: 'orange', fill: true, fillOpacity: 0.8 }})
    .bindTooltip(g.tooltip)
    .addTo(gapLayer);
}});

L.control.layers(null, {{
  'Evidence': evidenceLayer,
  'Segments': segmentLayer,
  'Gaps': gapLayer
}}).addTo(map);
</script>
</body>
</html>
"#,
        markers = Value::Array(markers),
        segments = segment_json,
        gaps = gap_json,
        center_lat = center.0,
        center_lon = center.1,
    );

    if let Some(parent) = html_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(html_path, html).with_context(|| format!("cannot write {}", html_path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use timeline_core::{
        analyze_movement, detect_gaps, GapConfig, MediaRecord, MovementConfig, NormalizedTime,
        TimeResolution,
    };

    fn point(index: usize, lat: f64, lon: f64, naive: &str) -> TimelinePoint {
        let mut record = MediaRecord::new(PathBuf::from(format!("img{}.jpg", index)));
        record.lat = Some(lat);
        record.lon = Some(lon);
        TimelinePoint {
            record,
            time: TimeResolution::empty(),
            norm: NormalizedTime {
                naive_iso: naive.to_string(),
                local_iso: String::new(),
                utc_iso: String::new(),
                tz_info: String::new(),
                tz_assumed: false,
            },
            timeline_index: index,
        }
    }

    #[test]
    fn test_map_written_with_all_layers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("interactive_map.html");
        let timeline = vec![
            point(1, 52.52, 13.405, "2024-01-01T10:00:00"),
            point(2, 52.53, 13.41, "2024-01-01T12:00:00"),
        ];
        let segments = analyze_movement(&timeline, &MovementConfig::default());
        let gaps = detect_gaps(&timeline, &GapConfig::default());
        assert_eq!(gaps.len(), 1);

        export_interactive_map(&timeline, Some(&segments), Some(&gaps), &path).unwrap();
        let html = fs::read_to_string(&path).unwrap();
        assert!(html.contains("L.map('map')"));
        assert!(html.contains("img1.jpg"));
        assert!(html.contains("\"color\":"));
        assert!(html.contains("gap"));
    }

    #[test]
    fn test_empty_timeline_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("interactive_map.html");
        export_interactive_map(&[], None, None, &path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_court_mode_omits_overlays() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("interactive_map.html");
        let timeline = vec![point(1, 52.52, 13.405, "2024-01-01T10:00:00")];
        export_interactive_map(&timeline, None, None, &path).unwrap();
        let html = fs::read_to_string(&path).unwrap();
        assert!(html.contains("var segments = []"));
        assert!(html.contains("var gaps = []"));
    }
}
