use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use tracing::{info, warn};

use exif_extract::{extract_parallel, hash_records, scan_media_files};
use timeline_core::{
    analyze_movement, build_timeline, detect_clusters, detect_gaps, normalize_time,
    resolve_best_timestamp, ClusterConfig, GapConfig, MovementConfig, TimezoneOptions,
    DEFAULT_PRIORITY,
};

#[derive(Parser)]
#[command(name = "gpstrail")]
#[command(about = "Forensic GPS timeline reconstruction from geotagged media")]
struct Cli {
    /// Directory to scan for geotagged media
    #[arg(long, short = 's')]
    scan_dir: PathBuf,

    /// Output directory; every artifact lands here
    #[arg(long, short = 'o')]
    out_dir: PathBuf,

    /// Override for the main CSV path (default: <out-dir>/evidence.csv)
    #[arg(long)]
    main_csv: Option<PathBuf>,

    /// Worker threads for extraction
    #[arg(long, default_value_t = default_threads())]
    threads: usize,

    /// Files per exiftool batch
    #[arg(long, default_value_t = 50)]
    chunk_size: usize,

    /// Cluster distance threshold in meters
    #[arg(long, default_value_t = 5.0)]
    dup_dist: f64,

    /// Cluster time threshold in seconds
    #[arg(long, default_value_t = 10)]
    dup_time: i64,

    /// Gap threshold in seconds
    #[arg(long, default_value_t = 30 * 60)]
    gap_s: i64,

    /// Major gap threshold in seconds
    #[arg(long, default_value_t = 6 * 60 * 60)]
    major_gap_s: i64,

    /// Critical gap threshold in seconds
    #[arg(long, default_value_t = 24 * 60 * 60)]
    critical_gap_s: i64,

    /// Stop classification: speed ceiling in km/h
    #[arg(long, default_value_t = 3.0)]
    stop_speed_kmh: f64,

    /// Jump classification: speed floor in km/h
    #[arg(long, default_value_t = 180.0)]
    jump_speed_kmh: f64,

    /// Stop classification: minimum duration in seconds
    #[arg(long, default_value_t = 180.0)]
    min_stop_s: f64,

    /// Default timezone label, used only when assumptions are allowed
    #[arg(long, default_value = "Europe/Berlin")]
    tz: String,

    /// Court mode: never assume a timezone, no movement/gap map overlays
    #[arg(long)]
    court: bool,

    /// Compute SHA-256 hashes and the evidence manifest (can take a while)
    #[arg(long)]
    sha256: bool,

    /// Skip the per-month CSV buckets
    #[arg(long)]
    no_monthly: bool,
}

fn default_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if !cli.scan_dir.exists() {
        bail!("scan directory {} not found", cli.scan_dir.display());
    }
    std::fs::create_dir_all(&cli.out_dir)?;

    rayon::ThreadPoolBuilder::new()
        .num_threads(cli.threads)
        .build_global()
        .ok();

    info!("scan: {}", cli.scan_dir.display());
    info!("output: {}", cli.out_dir.display());
    info!(
        "threads: {} | chunk: {} | court mode: {}",
        cli.threads, cli.chunk_size, cli.court
    );

    let files = scan_media_files(&cli.scan_dir);
    if files.is_empty() {
        warn!("no media files found under {}", cli.scan_dir.display());
        return Ok(());
    }
    info!("media files: {}", files.len());

    let mut records = extract_parallel(&files, cli.chunk_size);
    if records.is_empty() {
        warn!("no GPS data found in any file");
        return Ok(());
    }
    info!("records with GPS data: {}", records.len());

    if cli.sha256 {
        info!("computing SHA-256 evidence hashes (enabled via --sha256)");
        let manifest = hash_records(&mut records);
        forensic_export::export_manifest_csv(&manifest, &cli.out_dir.join("evidence_manifest.csv"))?;
    } else {
        info!("SHA-256/manifest skipped (enable with --sha256)");
    }

    // Timeline enrichment: resolve the best timestamp per record, then
    // normalize it. Court mode forbids timezone assumptions.
    let tz_options = TimezoneOptions {
        default_tz: cli.tz.clone(),
        assume_if_missing: !cli.court,
    };
    let enriched = records
        .iter()
        .cloned()
        .map(|record| {
            let time = resolve_best_timestamp(&record, DEFAULT_PRIORITY);
            let norm = normalize_time(&time.raw_value, &record, &tz_options);
            (record, time, norm)
        })
        .collect();

    let timeline = build_timeline(enriched);

    let segments = analyze_movement(
        &timeline,
        &MovementConfig {
            stop_speed_kmh: cli.stop_speed_kmh,
            jump_speed_kmh: cli.jump_speed_kmh,
            min_stop_duration_s: cli.min_stop_s,
        },
    );
    let gaps = detect_gaps(
        &timeline,
        &GapConfig {
            gap_s: cli.gap_s,
            major_gap_s: cli.major_gap_s,
            critical_gap_s: cli.critical_gap_s,
        },
    );
    info!(
        "timeline: {} | segments: {} | gaps: {}",
        timeline.len(),
        segments.len(),
        gaps.len()
    );

    let geojson_path = cli.out_dir.join("timeline.geojson");
    forensic_export::export_timeline_csv(&timeline, &cli.out_dir.join("timeline.csv"))?;
    forensic_export::export_movement_csv(&segments, &cli.out_dir.join("movement_report.csv"))?;
    forensic_export::export_gaps_csv(&gaps, &cli.out_dir.join("gaps_report.csv"))?;
    forensic_export::export_timeline_geojson(&timeline, &geojson_path)?;

    let main_csv = cli
        .main_csv
        .clone()
        .unwrap_or_else(|| cli.out_dir.join("evidence.csv"));
    forensic_export::export_main_csv(&records, &main_csv)?;
    forensic_export::export_sqlite(&timeline, &cli.out_dir.join("forensic_data.sqlite"))?;
    forensic_export::export_kml(&timeline, &cli.out_dir.join("locations.kml"))?;

    // Court mode keeps the map, but without interpretive overlays.
    forensic_export::export_interactive_map(
        &timeline,
        if cli.court { None } else { Some(segments.as_slice()) },
        if cli.court { None } else { Some(gaps.as_slice()) },
        &cli.out_dir.join("interactive_map.html"),
    )?;

    if !cli.no_monthly {
        forensic_export::export_monthly_csv(&records, &cli.out_dir)?;
    }

    let members = detect_clusters(
        &records,
        &ClusterConfig {
            dup_dist_m: cli.dup_dist,
            dup_time_s: cli.dup_time,
        },
    );
    if !members.is_empty() {
        let dups_path = cli.out_dir.join("duplicates_report.csv");
        forensic_export::export_clusters_csv(&members, &dups_path)?;
        info!(
            "duplicate/event rows: {} (report: {})",
            members.len(),
            dups_path.display()
        );
    }

    info!("done; outputs under {}", cli.out_dir.display());
    Ok(())
}
