//! Spatiotemporal clustering of raw records.
//!
//! Runs against the raw record set, not the normalized timeline: a simple
//! two-tag parse orders the records, then a single greedy pass chains each
//! record to its immediate predecessor when both the elapsed time and the
//! distance stay under the thresholds. Chains grow step by step, so the
//! endpoints of a long chain can be far apart even though every link is
//! tight. Records without a parseable timestamp (or without coordinates)
//! cannot participate and are excluded from clustering only.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::geo::haversine_m;
use crate::record::MediaRecord;
use crate::timezone::parse_exif_datetime;

/// Capture-time tags tried for clustering, in order. Only the first
/// populated tag is parsed.
const CAPTURE_TAGS: &[&str] = &["DateTimeOriginal", "CreateDate"];

#[derive(Debug, Clone)]
pub struct ClusterConfig {
    /// Maximum distance to the immediately preceding chain member.
    pub dup_dist_m: f64,
    /// Maximum elapsed seconds since the immediately preceding chain member.
    pub dup_time_s: i64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            dup_dist_m: 5.0,
            dup_time_s: 10,
        }
    }
}

/// A record stamped with its cluster membership.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterMember {
    pub record: MediaRecord,
    /// 1-based id in encounter order.
    pub cluster_id: usize,
    pub cluster_size: usize,
}

/// Best-effort capture time for clustering and month bucketing. Any embedded
/// offset is discarded: the chain walk only needs a total order, and the
/// local clock reading provides one even for mixed aware/naive collections.
pub fn capture_stamp(record: &MediaRecord) -> Option<NaiveDateTime> {
    let raw = CAPTURE_TAGS.iter().find_map(|tag| record.raw_field(tag))?;
    parse_exif_datetime(raw).map(|stamp| stamp.naive_local())
}

struct ChainPoint<'a> {
    stamp: NaiveDateTime,
    lat: f64,
    lon: f64,
    record: &'a MediaRecord,
}

/// Chain the raw records into duplicate/event clusters. Clusters of size 1
/// are never emitted.
pub fn detect_clusters(records: &[MediaRecord], config: &ClusterConfig) -> Vec<ClusterMember> {
    let mut ordered: Vec<ChainPoint> = records
        .iter()
        .filter_map(|record| {
            let (lat, lon) = match (record.lat, record.lon) {
                (Some(lat), Some(lon)) => (lat, lon),
                _ => return None,
            };
            let stamp = capture_stamp(record)?;
            Some(ChainPoint {
                stamp,
                lat,
                lon,
                record,
            })
        })
        .collect();
    ordered.sort_by_key(|point| point.stamp);

    let mut clusters: Vec<Vec<&MediaRecord>> = Vec::new();
    let mut current: Vec<ChainPoint> = Vec::new();

    for point in ordered {
        let extends = match current.last() {
            Some(prev) => {
                let elapsed =
                    (point.stamp - prev.stamp).num_milliseconds().abs() as f64 / 1000.0;
                let distance = haversine_m(prev.lat, prev.lon, point.lat, point.lon);
                elapsed <= config.dup_time_s as f64 && distance <= config.dup_dist_m
            }
            None => true,
        };

        if !extends {
            if current.len() >= 2 {
                clusters.push(current.iter().map(|p| p.record).collect());
            }
            current.clear();
        }
        current.push(point);
    }
    if current.len() >= 2 {
        clusters.push(current.iter().map(|p| p.record).collect());
    }

    let mut members = Vec::new();
    for (i, cluster) in clusters.iter().enumerate() {
        for record in cluster {
            members.push(ClusterMember {
                record: (*record).clone(),
                cluster_id: i + 1,
                cluster_size: cluster.len(),
            });
        }
    }
    members
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn record_at(name: &str, lat: f64, lon: f64, taken: &str) -> MediaRecord {
        let mut record = MediaRecord::new(PathBuf::from(name));
        record.lat = Some(lat);
        record.lon = Some(lon);
        record.date_time_original = Some(taken.to_string());
        record
    }

    fn member_names(members: &[ClusterMember]) -> Vec<String> {
        members
            .iter()
            .map(|m| m.record.path.display().to_string())
            .collect()
    }

    #[test]
    fn test_burst_at_one_spot_forms_a_cluster() {
        let records = vec![
            record_at("a", 52.52, 13.405, "2024:01:01 10:00:00"),
            record_at("b", 52.52, 13.405, "2024:01:01 10:00:03"),
            record_at("c", 52.52, 13.405, "2024:01:01 10:00:06"),
        ];
        let members = detect_clusters(&records, &ClusterConfig::default());
        assert_eq!(members.len(), 3);
        assert!(members.iter().all(|m| m.cluster_id == 1));
        assert!(members.iter().all(|m| m.cluster_size == 3));
    }

    #[test]
    fn test_isolated_record_never_gets_a_cluster_id() {
        let records = vec![
            record_at("a", 52.52, 13.405, "2024:01:01 10:00:00"),
            record_at("b", 52.52, 13.405, "2024:01:01 10:00:03"),
            record_at("far", 48.137, 11.575, "2024:01:01 12:00:00"),
        ];
        let members = detect_clusters(&records, &ClusterConfig::default());
        assert_eq!(member_names(&members), vec!["a", "b"]);
    }

    #[test]
    fn test_single_record_yields_nothing() {
        let records = vec![record_at("a", 52.52, 13.405, "2024:01:01 10:00:00")];
        assert!(detect_clusters(&records, &ClusterConfig::default()).is_empty());
    }

    #[test]
    fn test_cluster_ids_are_one_based_encounter_order() {
        let records = vec![
            record_at("a1", 52.52, 13.405, "2024:01:01 10:00:00"),
            record_at("a2", 52.52, 13.405, "2024:01:01 10:00:05"),
            record_at("b1", 48.137, 11.575, "2024:01:01 12:00:00"),
            record_at("b2", 48.137, 11.575, "2024:01:01 12:00:05"),
        ];
        let members = detect_clusters(&records, &ClusterConfig::default());
        let ids: Vec<usize> = members.iter().map(|m| m.cluster_id).collect();
        assert_eq!(ids, vec![1, 1, 2, 2]);
    }

    #[test]
    fn test_chain_links_to_predecessor_not_first_member() {
        // Each step is 4 m / 5 s from its predecessor; the chain endpoints
        // end up well beyond dup_dist_m. Chain growth must still link them.
        let mut records = Vec::new();
        for i in 0..5 {
            records.push(record_at(
                &format!("step{}", i),
                52.52 + 0.000036 * i as f64,
                13.405,
                &format!("2024:01:01 10:00:{:02}", i * 5),
            ));
        }
        let endpoint_distance = haversine_m(52.52, 13.405, 52.52 + 0.000036 * 4.0, 13.405);
        assert!(endpoint_distance > 5.0);

        let members = detect_clusters(&records, &ClusterConfig::default());
        assert_eq!(members.len(), 5);
        assert!(members.iter().all(|m| m.cluster_size == 5));
    }

    #[test]
    fn test_unparsable_timestamp_excluded_from_clustering_only() {
        let mut broken = record_at("broken", 52.52, 13.405, "yesterday-ish");
        broken.create_date = None;
        let records = vec![
            broken,
            record_at("a", 52.52, 13.405, "2024:01:01 10:00:00"),
            record_at("b", 52.52, 13.405, "2024:01:01 10:00:03"),
        ];
        let members = detect_clusters(&records, &ClusterConfig::default());
        assert_eq!(member_names(&members), vec!["a", "b"]);
    }

    #[test]
    fn test_create_date_fallback_when_original_missing() {
        let mut a = MediaRecord::new(PathBuf::from("a"));
        a.lat = Some(52.52);
        a.lon = Some(13.405);
        a.create_date = Some("2024:01:01 10:00:00".to_string());
        let b = record_at("b", 52.52, 13.405, "2024:01:01 10:00:04");
        let members = detect_clusters(&[a, b], &ClusterConfig::default());
        assert_eq!(members.len(), 2);
    }

    #[test]
    fn test_time_break_splits_chain() {
        let records = vec![
            record_at("a", 52.52, 13.405, "2024:01:01 10:00:00"),
            record_at("b", 52.52, 13.405, "2024:01:01 10:00:05"),
            record_at("c", 52.52, 13.405, "2024:01:01 10:01:00"),
        ];
        let members = detect_clusters(&records, &ClusterConfig::default());
        // c is 55 s after b: chain breaks, and a lone c is discarded.
        assert_eq!(member_names(&members), vec!["a", "b"]);
    }
}
