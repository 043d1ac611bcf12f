//! Timeline reconstruction and movement analysis for geotagged media
//!
//! This crate takes raw metadata records produced by the extraction stage and
//! reconstructs a chronologically ordered movement history: which timestamp to
//! trust for each record, how to normalize it across timezones, how the records
//! order globally, and what the transitions between them mean (dwell, movement,
//! implausible jumps, temporal gaps, duplicate bursts).
//!
//! Every function here is pure and deterministic. Bad input degrades to
//! explicit sentinel values instead of errors: an unparsable timestamp, a
//! missing coordinate, or an unknown offset is a first-class, checkable
//! outcome, never a panic.

pub mod basis;
pub mod builder;
pub mod clusters;
pub mod gaps;
pub mod geo;
pub mod movement;
pub mod record;
pub mod time_sources;
pub mod timezone;

pub use basis::{shared_basis, BasisPair, TimeBasis};
pub use builder::{build_timeline, EnrichedRecord};
pub use clusters::{capture_stamp, detect_clusters, ClusterConfig, ClusterMember};
pub use gaps::{detect_gaps, Gap, GapConfig, GapLevel};
pub use geo::haversine_m;
pub use movement::{analyze_movement, Movement, MovementConfig, Segment};
pub use record::{Confidence, MediaRecord, NormalizedTime, TimeResolution, TimelinePoint};
pub use time_sources::{resolve_best_timestamp, DEFAULT_PRIORITY};
pub use timezone::{normalize_time, TimezoneOptions};
