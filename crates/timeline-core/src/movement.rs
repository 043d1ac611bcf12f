//! Movement classification between adjacent timeline points.
//!
//! Distance is computed whenever both points carry coordinates, even when no
//! time comparison is possible. Speed and classification additionally require
//! a shared time basis and a positive elapsed time; anything less degrades to
//! `unknown` rather than failing.

use serde::{Deserialize, Serialize};

use crate::basis::{shared_basis, TimeBasis};
use crate::geo::haversine_m;
use crate::record::TimelinePoint;

#[derive(Debug, Clone)]
pub struct MovementConfig {
    /// At or below this speed a segment can be a stop.
    pub stop_speed_kmh: f64,
    /// At or above this speed a segment is a physically implausible jump.
    pub jump_speed_kmh: f64,
    /// A stop additionally requires at least this much elapsed time.
    pub min_stop_duration_s: f64,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            stop_speed_kmh: 3.0,
            jump_speed_kmh: 180.0,
            min_stop_duration_s: 180.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Movement {
    Stop,
    Move,
    Jump,
    Unknown,
}

impl Movement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Movement::Stop => "stop",
            Movement::Move => "move",
            Movement::Jump => "jump",
            Movement::Unknown => "unknown",
        }
    }
}

/// Transition between two adjacent timeline points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub from_index: usize,
    pub to_index: usize,
    pub from_dt: String,
    pub to_dt: String,
    pub distance_m: Option<f64>,
    pub delta_s: Option<f64>,
    pub speed_kmh: Option<f64>,
    pub movement: Movement,
    pub time_basis: TimeBasis,
}

/// Classify every adjacent pair of the ordered timeline.
pub fn analyze_movement(timeline: &[TimelinePoint], config: &MovementConfig) -> Vec<Segment> {
    let mut segments = Vec::new();

    for pair in timeline.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        let mut segment = Segment {
            from_index: a.timeline_index,
            to_index: b.timeline_index,
            from_dt: a.display_time().to_string(),
            to_dt: b.display_time().to_string(),
            distance_m: None,
            delta_s: None,
            speed_kmh: None,
            movement: Movement::Unknown,
            time_basis: TimeBasis::None,
        };

        let (lat1, lon1, lat2, lon2) = match (
            a.record.lat,
            a.record.lon,
            b.record.lat,
            b.record.lon,
        ) {
            (Some(lat1), Some(lon1), Some(lat2), Some(lon2)) => (lat1, lon1, lat2, lon2),
            _ => {
                segments.push(segment);
                continue;
            }
        };

        let distance_m = haversine_m(lat1, lon1, lat2, lon2);
        segment.distance_m = Some(distance_m);

        let pair_basis = match shared_basis(&a.norm, &b.norm) {
            Some(pair_basis) => pair_basis,
            None => {
                segments.push(segment);
                continue;
            }
        };
        segment.time_basis = pair_basis.basis();

        let delta_s = pair_basis.delta_seconds();
        segment.delta_s = Some(delta_s);
        if delta_s <= 0.0 {
            segments.push(segment);
            continue;
        }

        let speed_kmh = distance_m / delta_s * 3.6;
        segment.speed_kmh = Some(speed_kmh);

        // Jump outranks stop: a fast short hop is a jump no matter what the
        // elapsed time would otherwise qualify for.
        segment.movement = if speed_kmh >= config.jump_speed_kmh {
            Movement::Jump
        } else if speed_kmh <= config.stop_speed_kmh && delta_s >= config.min_stop_duration_s {
            Movement::Stop
        } else {
            Movement::Move
        };

        segments.push(segment);
    }

    segments
}
