//! Record types shared across the timeline pipeline.
//!
//! A `MediaRecord` is the immutable output of the extraction stage: raw tag
//! values exactly as exiftool reported them. The derived types
//! (`TimeResolution`, `NormalizedTime`, `TimelinePoint`) are produced once per
//! record and never mutated afterwards; the raw fields stay available
//! alongside them.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One geotagged media file with its raw extracted metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaRecord {
    pub path: PathBuf,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub alt: Option<f64>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub file_type: Option<String>,
    pub mime_type: Option<String>,
    /// Populated only when evidence hashing is enabled.
    pub sha256: Option<String>,

    // Raw timestamp tags, never reinterpreted here.
    pub gps_date_time: Option<String>,
    pub date_time_original: Option<String>,
    pub media_create_date: Option<String>,
    pub track_create_date: Option<String>,
    pub create_date: Option<String>,

    // Raw UTC-offset tags.
    pub offset_time_original: Option<String>,
    pub offset_time: Option<String>,
    pub time_zone: Option<String>,
    pub time_zone_offset: Option<String>,
}

impl MediaRecord {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            ..Default::default()
        }
    }

    /// Look up a raw tag value by its exiftool name. Blank values count as
    /// absent so priority scans skip them.
    pub fn raw_field(&self, tag: &str) -> Option<&str> {
        let value = match tag {
            "GPSDateTime" => &self.gps_date_time,
            "DateTimeOriginal" => &self.date_time_original,
            "MediaCreateDate" => &self.media_create_date,
            "TrackCreateDate" => &self.track_create_date,
            "CreateDate" => &self.create_date,
            "OffsetTimeOriginal" => &self.offset_time_original,
            "OffsetTime" => &self.offset_time,
            "TimeZone" => &self.time_zone,
            "TimeZoneOffset" => &self.time_zone_offset,
            _ => return None,
        };
        value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn has_coordinates(&self) -> bool {
        self.lat.is_some() && self.lon.is_some()
    }

    pub fn maps_url(&self) -> Option<String> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => {
                Some(format!("https://www.google.com/maps?q={},{}", lat, lon))
            }
            _ => None,
        }
    }
}

/// How much a timestamp source can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }
}

/// The timestamp chosen for a record, with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeResolution {
    pub raw_value: String,
    pub source_field: String,
    pub confidence: Confidence,
}

impl TimeResolution {
    /// Sentinel returned when no configured tag is populated.
    pub fn empty() -> Self {
        Self {
            raw_value: String::new(),
            source_field: String::new(),
            confidence: Confidence::Low,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.raw_value.is_empty()
    }
}

/// The three renders of one timestamp after timezone normalization.
///
/// `naive_iso` is non-empty whenever the raw value parsed at all. `local_iso`
/// and `utc_iso` are populated only when an offset was actually known or
/// validly assumed; consumers must treat empty strings as first-class
/// outcomes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedTime {
    pub naive_iso: String,
    pub local_iso: String,
    pub utc_iso: String,
    /// "embedded", a normalized offset like "+0200", "assumed:<label>", or
    /// "unknown".
    pub tz_info: String,
    pub tz_assumed: bool,
}

impl NormalizedTime {
    /// Sentinel for a raw value that did not parse.
    pub fn unparsed() -> Self {
        Self {
            naive_iso: String::new(),
            local_iso: String::new(),
            utc_iso: String::new(),
            tz_info: "unknown".to_string(),
            tz_assumed: false,
        }
    }
}

/// One record joined with its derived time facts and its position on the
/// globally sorted timeline. Indices are dense, 1-based, and assigned exactly
/// once by the builder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub record: MediaRecord,
    pub time: TimeResolution,
    pub norm: NormalizedTime,
    pub timeline_index: usize,
}

impl TimelinePoint {
    /// Best display timestamp: the UTC instant when known, else the naive
    /// render, else empty.
    pub fn display_time(&self) -> &str {
        if !self.norm.utc_iso.is_empty() {
            &self.norm.utc_iso
        } else {
            &self.norm.naive_iso
        }
    }
}
