//! End-to-end analysis pipeline.
//!
//! Loads both datasets from an archive, normalizes the accidents and builds
//! the three aggregate views, returning an [`AnalysisResult`] ready for
//! export.

use std::path::PathBuf;
use std::time::Instant;

use chrono::Utc;
use crash_core::error::Result;
use crash_core::models::{ConsequenceCount, DedupPrecedence, MonthlyTypeTable, SurfaceCount};
use crash_core::settings::{DEFAULT_ACCIDENTS_TOKEN, DEFAULT_CONSEQUENCES_TOKEN};
use tracing::info;

use crate::aggregator::{aggregate_by_consequence, aggregate_by_surface};
use crate::normalizer::{consequences_from_raw, normalize_with_precedence};
use crate::reader::load_with_precedence;
use crate::timeseries::aggregate_by_type_over_time;

// ── Public types ──────────────────────────────────────────────────────────────

/// Inputs of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub archive_path: PathBuf,
    pub accidents_token: String,
    pub consequences_token: String,
    pub precedence: DedupPrecedence,
    /// Log the estimated size of the normalized table.
    pub verbose: bool,
}

impl PipelineOptions {
    /// Options for `archive_path` with the default dataset tokens.
    pub fn new(archive_path: impl Into<PathBuf>) -> Self {
        Self {
            archive_path: archive_path.into(),
            accidents_token: DEFAULT_ACCIDENTS_TOKEN.to_string(),
            consequences_token: DEFAULT_CONSEQUENCES_TOKEN.to_string(),
            precedence: DedupPrecedence::default(),
            verbose: false,
        }
    }
}

/// Metadata produced alongside the analysis result.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AnalysisMetadata {
    /// RFC 3339 timestamp when this result was generated.
    pub generated_at: String,
    pub precedence: DedupPrecedence,
    /// Accident rows across all partitions, duplicates included.
    pub raw_accident_rows: usize,
    /// Accidents left after deduplication.
    pub accidents: usize,
    pub consequence_rows: usize,
    /// Wall-clock seconds spent reading and decoding the archive.
    pub load_time_seconds: f64,
    /// Wall-clock seconds spent normalizing and aggregating.
    pub transform_time_seconds: f64,
}

/// The complete output of [`analyze`].
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub surface: Vec<SurfaceCount>,
    pub consequences: Vec<ConsequenceCount>,
    pub types: MonthlyTypeTable,
    pub metadata: AnalysisMetadata,
}

// ── Public function ───────────────────────────────────────────────────────────

/// Run the full pipeline.
///
/// 1. Load the accident and consequence datasets.
/// 2. Normalize the accidents and convert the consequences.
/// 3. Build the surface, consequence and collision-type views.
///
/// Any failure aborts the run.
pub fn analyze(options: &PipelineOptions) -> Result<AnalysisResult> {
    // ── Step 1: Load ──────────────────────────────────────────────────────────
    let load_start = Instant::now();
    let raw_accidents = load_with_precedence(
        &options.archive_path,
        &options.accidents_token,
        options.precedence,
    )?;
    let raw_consequences = load_with_precedence(
        &options.archive_path,
        &options.consequences_token,
        options.precedence,
    )?;
    let load_time = load_start.elapsed().as_secs_f64();

    // ── Step 2: Normalize ─────────────────────────────────────────────────────
    let transform_start = Instant::now();
    let accidents = normalize_with_precedence(&raw_accidents, options.precedence, options.verbose)?;
    let consequences = consequences_from_raw(&raw_consequences)?;

    // ── Step 3: Aggregate ─────────────────────────────────────────────────────
    let surface = aggregate_by_surface(&accidents);
    let consequence_counts = aggregate_by_consequence(&accidents, &consequences);
    let types = aggregate_by_type_over_time(&accidents)?;
    let transform_time = transform_start.elapsed().as_secs_f64();

    let metadata = AnalysisMetadata {
        generated_at: Utc::now().to_rfc3339(),
        precedence: options.precedence,
        raw_accident_rows: raw_accidents.len(),
        accidents: accidents.len(),
        consequence_rows: consequences.len(),
        load_time_seconds: load_time,
        transform_time_seconds: transform_time,
    };

    info!(
        "Analysis finished: {} accidents, {} consequence rows in {:.2}s",
        metadata.accidents,
        metadata.consequence_rows,
        load_time + transform_time
    );

    Ok(AnalysisResult {
        surface,
        consequences: consequence_counts,
        types,
        metadata,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
