//! Timestamp source resolution.
//!
//! Media files carry several timestamp tags of very different reliability.
//! The resolver scans a confidence-ranked priority list and takes the first
//! populated tag; a record with none of them yields the empty sentinel, not
//! an error.

use crate::record::{Confidence, MediaRecord, TimeResolution};

/// Default tag priority, highest first. GPS-derived time and photo EXIF
/// outrank the QuickTime create dates; the generic CreateDate is a last
/// resort.
pub const DEFAULT_PRIORITY: &[(&str, Confidence)] = &[
    ("GPSDateTime", Confidence::High),
    ("DateTimeOriginal", Confidence::High),
    ("MediaCreateDate", Confidence::Medium),
    ("TrackCreateDate", Confidence::Medium),
    ("CreateDate", Confidence::Low),
];

/// Pick the best available raw timestamp for a record.
pub fn resolve_best_timestamp(
    record: &MediaRecord,
    priority: &[(&str, Confidence)],
) -> TimeResolution {
    for (tag, confidence) in priority {
        if let Some(value) = record.raw_field(tag) {
            return TimeResolution {
                raw_value: value.to_string(),
                source_field: (*tag).to_string(),
                confidence: *confidence,
            };
        }
    }
    TimeResolution::empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn record_with_times(
        gps: Option<&str>,
        original: Option<&str>,
        create: Option<&str>,
    ) -> MediaRecord {
        let mut record = MediaRecord::new(PathBuf::from("img.jpg"));
        record.gps_date_time = gps.map(String::from);
        record.date_time_original = original.map(String::from);
        record.create_date = create.map(String::from);
        record
    }

    #[test]
    fn test_gps_time_wins_over_exif() {
        let record = record_with_times(
            Some("2024:05:01 12:00:00Z"),
            Some("2024:05:01 14:00:00"),
            Some("2024:05:01 14:00:01"),
        );
        let resolution = resolve_best_timestamp(&record, DEFAULT_PRIORITY);
        assert_eq!(resolution.source_field, "GPSDateTime");
        assert_eq!(resolution.raw_value, "2024:05:01 12:00:00Z");
        assert_eq!(resolution.confidence, Confidence::High);
    }

    #[test]
    fn test_falls_through_to_create_date() {
        let record = record_with_times(None, None, Some("2023:12:24 18:30:00"));
        let resolution = resolve_best_timestamp(&record, DEFAULT_PRIORITY);
        assert_eq!(resolution.source_field, "CreateDate");
        assert_eq!(resolution.confidence, Confidence::Low);
    }

    #[test]
    fn test_no_timestamp_yields_sentinel_not_error() {
        let record = record_with_times(None, None, None);
        let resolution = resolve_best_timestamp(&record, DEFAULT_PRIORITY);
        assert!(resolution.is_empty());
        assert_eq!(resolution.source_field, "");
        assert_eq!(resolution.confidence, Confidence::Low);
    }

    #[test]
    fn test_custom_priority_is_respected() {
        let record = record_with_times(
            Some("2024:05:01 12:00:00Z"),
            None,
            Some("2023:12:24 18:30:00"),
        );
        let priority = &[("CreateDate", Confidence::High)];
        let resolution = resolve_best_timestamp(&record, priority);
        assert_eq!(resolution.source_field, "CreateDate");
        assert_eq!(resolution.confidence, Confidence::High);
    }
}
