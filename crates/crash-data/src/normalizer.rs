//! Turns the concatenated raw tables into the canonical record sets.

use std::collections::HashSet;

use crash_core::codes::{parse_code, CodeTable, Region};
use crash_core::error::Result;
use crash_core::formatting::format_megabytes;
use crash_core::models::{
    AccidentRecord, AccidentTable, ConsequenceRecord, DedupPrecedence, RawRow, RawTable,
    COL_ALCOHOL, COL_COLLISION, COL_DATE, COL_ID, COL_REGION, COL_ROLE, COL_SEVERITY, COL_SURFACE,
    COL_TIME,
};
use crash_core::time_utils::parse_day_first;
use tracing::{debug, info};

// ── Public API ────────────────────────────────────────────────────────────────

/// Normalize accident rows with the default precedence (earliest year wins).
pub fn normalize(raw: &RawTable, verbose: bool) -> Result<AccidentTable> {
    normalize_with_precedence(raw, DedupPrecedence::default(), verbose)
}

/// Deduplicate, parse dates and label regions.
///
/// Rows are processed partition by partition in the order `precedence`
/// gives, keeping row order inside a partition; the first row seen for an
/// identifier wins. Malformed dates become `None` and unmapped region codes
/// become [`Coded::Unmapped`](crash_core::codes::Coded::Unmapped); neither
/// aborts the batch.
///
/// Fails only when `p1`, `p2a` or `p4a` is missing. The input is not
/// modified. With `verbose` the estimated size of the result is logged.
pub fn normalize_with_precedence(
    raw: &RawTable,
    precedence: DedupPrecedence,
    verbose: bool,
) -> Result<AccidentTable> {
    let id_idx = raw.require_column(COL_ID)?;
    let date_idx = raw.require_column(COL_DATE)?;
    let region_idx = raw.require_column(COL_REGION)?;
    let time_idx = raw.column_index(COL_TIME);
    let surface_idx = raw.column_index(COL_SURFACE);
    let collision_idx = raw.column_index(COL_COLLISION);
    let alcohol_idx = raw.column_index(COL_ALCOHOL);

    // Stable sort: rows of one partition keep their relative order.
    let mut order: Vec<usize> = (0..raw.rows.len()).collect();
    order.sort_by(|&a, &b| precedence.compare(&raw.rows[a].partition, &raw.rows[b].partition));

    let mut seen: HashSet<&str> = HashSet::with_capacity(raw.rows.len());
    let mut records = Vec::with_capacity(raw.rows.len());
    let mut duplicates = 0usize;
    let mut malformed_dates = 0usize;
    let mut unmapped_regions = 0usize;

    for idx in order {
        let row = &raw.rows[idx];
        let id = cell(row, id_idx).trim();
        if !seen.insert(id) {
            duplicates += 1;
            continue;
        }

        let date_text = cell(row, date_idx).to_string();
        let date = parse_day_first(&date_text);
        if date.is_none() {
            malformed_dates += 1;
        }

        let region = Region::classify(cell(row, region_idx));
        if !region.is_known() {
            unmapped_regions += 1;
        }

        let time = optional_cell(row, time_idx).trim();

        records.push(AccidentRecord {
            id: id.to_string(),
            partition: row.partition.clone(),
            date_text,
            date,
            time: (!time.is_empty()).then(|| time.to_string()),
            region,
            surface_code: parse_code(optional_cell(row, surface_idx)),
            collision_code: parse_code(optional_cell(row, collision_idx)),
            alcohol_code: parse_code(optional_cell(row, alcohol_idx)),
            cells: row.cells.clone(),
        });
    }

    let table = AccidentTable {
        headers: raw.headers.clone(),
        records,
    };

    debug!(
        duplicates,
        malformed_dates,
        unmapped_regions,
        "normalization details"
    );
    info!(
        "Normalized {} raw rows into {} accidents ({} duplicates dropped)",
        raw.len(),
        table.len(),
        duplicates
    );
    if verbose {
        info!("new_size = {}", format_megabytes(table.memory_usage()));
    }

    Ok(table)
}

/// Convert the consequence dataset into typed records.
///
/// Identifiers are not deduplicated: one accident has one row per involved
/// person. Fails when `p1`, `p59a` or `p59g` is missing.
pub fn consequences_from_raw(raw: &RawTable) -> Result<Vec<ConsequenceRecord>> {
    let id_idx = raw.require_column(COL_ID)?;
    let role_idx = raw.require_column(COL_ROLE)?;
    let severity_idx = raw.require_column(COL_SEVERITY)?;

    let records: Vec<ConsequenceRecord> = raw
        .rows
        .iter()
        .map(|row| ConsequenceRecord {
            id: cell(row, id_idx).trim().to_string(),
            role_code: parse_code(cell(row, role_idx)),
            severity_code: parse_code(cell(row, severity_idx)),
        })
        .collect();

    debug!("Converted {} consequence rows", records.len());
    Ok(records)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn cell(row: &RawRow, idx: usize) -> &str {
    row.cells.get(idx).map(String::as_str).unwrap_or("")
}

fn optional_cell(row: &RawRow, idx: Option<usize>) -> &str {
    idx.map_or("", |i| cell(row, i))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
