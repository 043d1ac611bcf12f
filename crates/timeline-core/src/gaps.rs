//! Temporal gap detection.
//!
//! A gap is an adjacent pair whose elapsed time exceeds the base threshold,
//! graded into severity tiers by two further thresholds. Pairs without a
//! shared time basis are skipped outright: no gap claim can be made without
//! comparable time.

use serde::{Deserialize, Serialize};

use crate::basis::{shared_basis, TimeBasis};
use crate::record::TimelinePoint;

#[derive(Debug, Clone)]
pub struct GapConfig {
    /// Elapsed seconds above which a pair is a gap at all.
    pub gap_s: i64,
    /// At or above this, severity is at least major.
    pub major_gap_s: i64,
    /// At or above this, severity is critical.
    pub critical_gap_s: i64,
}

impl Default for GapConfig {
    fn default() -> Self {
        Self {
            gap_s: 30 * 60,
            major_gap_s: 6 * 60 * 60,
            critical_gap_s: 24 * 60 * 60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GapLevel {
    Gap,
    Major,
    Critical,
}

impl GapLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            GapLevel::Gap => "gap",
            GapLevel::Major => "major",
            GapLevel::Critical => "critical",
        }
    }
}

/// One recording discontinuity between adjacent timeline points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gap {
    pub after_index: usize,
    pub before_index: usize,
    pub from_dt: String,
    pub to_dt: String,
    pub gap_seconds: i64,
    pub gap_level: GapLevel,
    pub time_basis: TimeBasis,
}

/// Scan the ordered timeline for recording gaps.
pub fn detect_gaps(timeline: &[TimelinePoint], config: &GapConfig) -> Vec<Gap> {
    let mut gaps = Vec::new();

    for pair in timeline.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);

        let pair_basis = match shared_basis(&a.norm, &b.norm) {
            Some(pair_basis) => pair_basis,
            None => continue,
        };

        let elapsed = pair_basis.delta_seconds();
        if elapsed <= config.gap_s as f64 {
            continue;
        }

        let gap_level = if elapsed >= config.critical_gap_s as f64 {
            GapLevel::Critical
        } else if elapsed >= config.major_gap_s as f64 {
            GapLevel::Major
        } else {
            GapLevel::Gap
        };

        gaps.push(Gap {
            after_index: a.timeline_index,
            before_index: b.timeline_index,
            from_dt: a.display_time().to_string(),
            to_dt: b.display_time().to_string(),
            gap_seconds: elapsed as i64,
            gap_level,
            time_basis: pair_basis.basis(),
        });
    }

    gaps
}
