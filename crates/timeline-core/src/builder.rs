//! Timeline assembly.
//!
//! Points with a UTC instant sort first (by that instant), points with only a
//! naive render follow (by that render), and points with no parseable
//! timestamp form a stable tail in their original relative order. Indices are
//! dense, 1-based, and assigned exactly once; the input rows are consumed,
//! never mutated in place.

use crate::basis::{parse_naive_iso, parse_utc_iso};
use crate::record::{MediaRecord, NormalizedTime, TimeResolution, TimelinePoint};

/// One record with its derived time facts, ready for ordering.
pub type EnrichedRecord = (MediaRecord, TimeResolution, NormalizedTime);

/// Sort the enriched records into the global timeline.
pub fn build_timeline(rows: Vec<EnrichedRecord>) -> Vec<TimelinePoint> {
    let mut utc_ranked = Vec::new();
    let mut naive_ranked = Vec::new();
    let mut tail = Vec::new();

    for row in rows {
        if let Some(instant) = parse_utc_iso(&row.2.utc_iso) {
            utc_ranked.push((instant, row));
        } else if let Some(instant) = parse_naive_iso(&row.2.naive_iso) {
            naive_ranked.push((instant, row));
        } else {
            tail.push(row);
        }
    }

    // Stable sorts keep equal instants in input order.
    utc_ranked.sort_by_key(|(instant, _)| *instant);
    naive_ranked.sort_by_key(|(instant, _)| *instant);

    utc_ranked
        .into_iter()
        .map(|(_, row)| row)
        .chain(naive_ranked.into_iter().map(|(_, row)| row))
        .chain(tail)
        .enumerate()
        .map(|(i, (record, time, norm))| TimelinePoint {
            record,
            time,
            norm,
            timeline_index: i + 1,
        })
        .collect()
}
