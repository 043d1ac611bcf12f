//! Report and map exports for reconstructed timelines.
//!
//! Every writer here consumes core outputs read-only and degrades per the
//! same policy as the analysis: blank fields stay blank in the artifacts.
//! Column layouts follow the original report formats so downstream tooling
//! keeps working.

pub mod csv;
pub mod geojson;
pub mod kml;
pub mod map;
pub mod sqlite;

pub use csv::{
    export_clusters_csv, export_gaps_csv, export_main_csv, export_manifest_csv,
    export_monthly_csv, export_movement_csv, export_timeline_csv,
};
pub use geojson::{export_timeline_geojson, timeline_feature_collection};
pub use kml::export_kml;
pub use map::export_interactive_map;
pub use sqlite::export_sqlite;
