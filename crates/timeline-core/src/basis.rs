//! Shared time-basis selection.
//!
//! Subtracting a zone-qualified instant from a zone-less one is meaningless.
//! Movement analysis and gap detection therefore establish a pairwise basis
//! through this one utility: UTC when both points carry a UTC instant, naive
//! when both carry only a naive render, nothing otherwise. The `BasisPair`
//! variants keep the two flavors in separate types, so mixed arithmetic
//! cannot be written at all.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::NormalizedTime;

/// Which kind of instant a pair of points shares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeBasis {
    Utc,
    Naive,
    None,
}

impl TimeBasis {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeBasis::Utc => "utc",
            TimeBasis::Naive => "naive",
            TimeBasis::None => "",
        }
    }
}

/// Two comparable instants on a common basis.
#[derive(Debug, Clone, Copy)]
pub enum BasisPair {
    Utc(DateTime<Utc>, DateTime<Utc>),
    Naive(NaiveDateTime, NaiveDateTime),
}

impl BasisPair {
    pub fn basis(&self) -> TimeBasis {
        match self {
            BasisPair::Utc(..) => TimeBasis::Utc,
            BasisPair::Naive(..) => TimeBasis::Naive,
        }
    }

    /// Signed elapsed seconds from the first instant to the second.
    pub fn delta_seconds(&self) -> f64 {
        let delta = match self {
            BasisPair::Utc(a, b) => b.signed_duration_since(*a),
            BasisPair::Naive(a, b) => b.signed_duration_since(*a),
        };
        delta.num_milliseconds() as f64 / 1000.0
    }
}

/// Parse a UTC render produced by the normalizer ("...Z").
pub fn parse_utc_iso(value: &str) -> Option<DateTime<Utc>> {
    if value.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse a naive render produced by the normalizer (no offset).
pub fn parse_naive_iso(value: &str) -> Option<NaiveDateTime> {
    if value.is_empty() {
        return None;
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S").ok()
}

/// Establish the common basis for a pair of points, if any.
pub fn shared_basis(a: &NormalizedTime, b: &NormalizedTime) -> Option<BasisPair> {
    if let (Some(a_utc), Some(b_utc)) = (parse_utc_iso(&a.utc_iso), parse_utc_iso(&b.utc_iso)) {
        return Some(BasisPair::Utc(a_utc, b_utc));
    }
    if let (Some(a_naive), Some(b_naive)) =
        (parse_naive_iso(&a.naive_iso), parse_naive_iso(&b.naive_iso))
    {
        return Some(BasisPair::Naive(a_naive, b_naive));
    }
    None
}
