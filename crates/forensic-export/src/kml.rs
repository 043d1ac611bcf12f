//! KML export.
//!
//! One placemark per located timeline point, with the full time provenance
//! in the description so a reviewer can see exactly which value came from
//! where.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use timeline_core::TimelinePoint;

pub(crate) fn xml_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn export_kml(timeline: &[TimelinePoint], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    write!(
        writer,
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <kml xmlns=\"http://www.opengis.net/kml/2.2\"><Document><name>Forensic Export</name>"
    )?;

    for point in timeline {
        let (lat, lon) = match (point.record.lat, point.record.lon) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => continue,
        };

        let name = point
            .record
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let description = xml_escape(&format!(
            "dt_utc: {}\ndt_naive: {}\nraw: {} ({}/{})\ntz: {} assumed={}\nsha256: {}\ndevice: {} {}\nurl: {}\npath: {}",
            point.norm.utc_iso,
            point.norm.naive_iso,
            point.time.raw_value,
            point.time.source_field,
            point.time.confidence.as_str(),
            point.norm.tz_info,
            point.norm.tz_assumed,
            point.record.sha256.clone().unwrap_or_default(),
            point.record.make.clone().unwrap_or_default(),
            point.record.model.clone().unwrap_or_default(),
            point.record.maps_url().unwrap_or_default(),
            point.record.path.display(),
        ));

        write!(writer, "<Placemark><name>{}</name>", xml_escape(&name))?;
        write!(writer, "<description>{}</description>", description)?;
        write!(
            writer,
            "<Point><coordinates>{},{},0</coordinates></Point></Placemark>",
            lon, lat
        )?;
    }

    write!(writer, "</Document></kml>")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use timeline_core::{MediaRecord, NormalizedTime, TimeResolution};

    fn point(name: &str, lat: Option<f64>, lon: Option<f64>) -> TimelinePoint {
        let mut record = MediaRecord::new(PathBuf::from(name));
        record.lat = lat;
        record.lon = lon;
        TimelinePoint {
            record,
            time: TimeResolution::empty(),
            norm: NormalizedTime::unparsed(),
            timeline_index: 1,
        }
    }

    #[test]
    fn test_xml_escape_order() {
        assert_eq!(xml_escape("a < b & c > d"), "a &lt; b &amp; c &gt; d");
    }

    #[test]
    fn test_placemark_per_located_point() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locations.kml");
        let timeline = vec![
            point("a<b>.jpg", Some(52.5), Some(13.4)),
            point("nowhere.jpg", None, None),
        ];
        export_kml(&timeline, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches("<Placemark>").count(), 1);
        assert!(content.contains("a&lt;b&gt;.jpg"));
        assert!(content.contains("<coordinates>13.4,52.5,0</coordinates>"));
        assert!(content.ends_with("</Document></kml>"));
    }
}
