use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::codes::{CodeTable, CollisionType, Coded, Region, Role, Severity, SurfaceCondition};
use crate::error::{CrashError, Result};

// ── Column names ──────────────────────────────────────────────────────────────

/// Accident identifier, shared by the accident and consequence datasets.
pub const COL_ID: &str = "p1";
/// Accident date, `DD.MM.YYYY`.
pub const COL_DATE: &str = "p2a";
/// Accident time of day; its presence gates the alcohol view.
pub const COL_TIME: &str = "p2b";
pub const COL_REGION: &str = "p4a";
pub const COL_COLLISION: &str = "p6";
pub const COL_ALCOHOL: &str = "p11";
pub const COL_SURFACE: &str = "p16";
pub const COL_ROLE: &str = "p59a";
pub const COL_SEVERITY: &str = "p59g";

// ── RawTable ──────────────────────────────────────────────────────────────────

/// One data row of a partition table, tagged with the partition it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    /// Year partition name, e.g. `"2023"`.
    pub partition: String,
    /// One text cell per header.
    pub cells: Vec<String>,
}

/// Untyped table as read from the archive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Append a row, padding or truncating it to the header width.
    pub fn push_row(&mut self, partition: impl Into<String>, mut cells: Vec<String>) {
        cells.resize(self.headers.len(), String::new());
        self.rows.push(RawRow {
            partition: partition.into(),
            cells,
        });
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of `name` among the headers.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Like [`column_index`](Self::column_index) but fails with
    /// [`CrashError::MissingColumn`].
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| CrashError::MissingColumn {
                column: name.to_string(),
            })
    }

    /// Concatenate tables in iteration order.
    ///
    /// Columns are the union of all headers in first-seen order; a cell for a
    /// column its source table lacks is empty.
    pub fn concat(tables: impl IntoIterator<Item = RawTable>) -> RawTable {
        let tables: Vec<RawTable> = tables.into_iter().collect();

        let mut headers: Vec<String> = Vec::new();
        for table in &tables {
            for header in &table.headers {
                if !headers.contains(header) {
                    headers.push(header.clone());
                }
            }
        }

        let mut out = RawTable::new(headers);
        for table in tables {
            let positions: Vec<usize> = table
                .headers
                .iter()
                .map(|h| out.headers.iter().position(|o| o == h).unwrap_or(0))
                .collect();
            for row in table.rows {
                let mut cells = vec![String::new(); out.headers.len()];
                for (cell, &pos) in row.cells.into_iter().zip(&positions) {
                    cells[pos] = cell;
                }
                out.rows.push(RawRow {
                    partition: row.partition,
                    cells,
                });
            }
        }
        out
    }

    /// Remove placeholder columns: empty headers and `Unnamed…` headers left
    /// behind by spreadsheet exports.
    pub fn without_placeholder_columns(&self) -> RawTable {
        let keep: Vec<usize> = self
            .headers
            .iter()
            .enumerate()
            .filter(|(_, h)| !is_placeholder_header(h))
            .map(|(i, _)| i)
            .collect();

        RawTable {
            headers: keep.iter().map(|&i| self.headers[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| RawRow {
                    partition: row.partition.clone(),
                    cells: keep
                        .iter()
                        .map(|&i| row.cells.get(i).cloned().unwrap_or_default())
                        .collect(),
                })
                .collect(),
        }
    }
}

/// Returns `true` for header names that carry no column identity.
pub fn is_placeholder_header(header: &str) -> bool {
    let trimmed = header.trim();
    trimmed.is_empty() || trimmed.starts_with("Unnamed")
}

// ── DedupPrecedence ───────────────────────────────────────────────────────────

/// Which year partition is authoritative when an identifier occurs in more
/// than one year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DedupPrecedence {
    /// Partitions are processed in ascending order; the earliest copy wins.
    #[default]
    Earliest,
    /// Partitions are processed in descending order; the latest copy wins.
    Latest,
}

impl DedupPrecedence {
    /// Order two partition names in processing order.
    pub fn compare(self, a: &str, b: &str) -> std::cmp::Ordering {
        match self {
            DedupPrecedence::Earliest => a.cmp(b),
            DedupPrecedence::Latest => b.cmp(a),
        }
    }
}

impl fmt::Display for DedupPrecedence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DedupPrecedence::Earliest => f.write_str("earliest"),
            DedupPrecedence::Latest => f.write_str("latest"),
        }
    }
}

impl FromStr for DedupPrecedence {
    type Err = CrashError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "earliest" => Ok(DedupPrecedence::Earliest),
            "latest" => Ok(DedupPrecedence::Latest),
            other => Err(CrashError::Config(format!(
                "unknown dedup precedence: {other}"
            ))),
        }
    }
}

// ── AccidentRecord ────────────────────────────────────────────────────────────

/// One accident after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccidentRecord {
    /// Accident identifier (`p1`), unique within an [`AccidentTable`].
    pub id: String,
    /// Partition the record was loaded from.
    pub partition: String,
    /// Date exactly as written in `p2a`.
    pub date_text: String,
    /// Day-first parse of `p2a`; `None` when malformed.
    pub date: Option<NaiveDate>,
    /// `p2b`, `None` when the cell is empty.
    pub time: Option<String>,
    pub region: Coded<Region>,
    pub surface_code: Option<i64>,
    pub collision_code: Option<i64>,
    pub alcohol_code: Option<i64>,
    /// Every original cell, aligned with [`AccidentTable::headers`].
    pub cells: Vec<String>,
}

impl AccidentRecord {
    /// Region label, `None` for unmapped or absent region codes.
    pub fn region(&self) -> Option<Region> {
        self.region.known()
    }

    pub fn surface(&self) -> Coded<SurfaceCondition> {
        SurfaceCondition::classify_code(self.surface_code)
    }

    pub fn collision_type(&self) -> Coded<CollisionType> {
        CollisionType::classify_code(self.collision_code)
    }

    /// Approximate heap plus inline size of this record in bytes.
    pub fn memory_usage(&self) -> usize {
        let strings = self.id.capacity()
            + self.partition.capacity()
            + self.date_text.capacity()
            + self.time.as_ref().map_or(0, String::capacity);
        let cells: usize = self
            .cells
            .iter()
            .map(|c| c.capacity() + std::mem::size_of::<String>())
            .sum();
        std::mem::size_of::<Self>() + strings + cells
    }
}

// ── AccidentTable ─────────────────────────────────────────────────────────────

/// The canonical accident table consumed by every aggregator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccidentTable {
    /// Original column headers.
    pub headers: Vec<String>,
    /// Records in processing order.
    pub records: Vec<AccidentRecord>,
}

impl AccidentTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AccidentRecord> {
        self.records.iter()
    }

    /// Look a record up by identifier.
    pub fn get(&self, id: &str) -> Option<&AccidentRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Original cell `column` of `record`.
    pub fn cell<'a>(&self, record: &'a AccidentRecord, column: &str) -> Option<&'a str> {
        let idx = self.headers.iter().position(|h| h == column)?;
        record.cells.get(idx).map(String::as_str)
    }

    /// The original fields as a [`RawTable`], without derived values.
    pub fn to_raw(&self) -> RawTable {
        RawTable {
            headers: self.headers.clone(),
            rows: self
                .records
                .iter()
                .map(|r| RawRow {
                    partition: r.partition.clone(),
                    cells: r.cells.clone(),
                })
                .collect(),
        }
    }

    /// Estimated in-memory footprint in bytes.
    pub fn memory_usage(&self) -> usize {
        let headers: usize = self.headers.iter().map(|h| h.capacity()).sum();
        let records: usize = self.records.iter().map(AccidentRecord::memory_usage).sum();
        std::mem::size_of::<Self>() + headers + records
    }
}

impl<'a> IntoIterator for &'a AccidentTable {
    type Item = &'a AccidentRecord;
    type IntoIter = std::slice::Iter<'a, AccidentRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

// ── ConsequenceRecord ─────────────────────────────────────────────────────────

/// One injured or killed person, linked to an accident by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsequenceRecord {
    pub id: String,
    pub role_code: Option<i64>,
    pub severity_code: Option<i64>,
}

impl ConsequenceRecord {
    pub fn role(&self) -> Role {
        Role::from_code(self.role_code)
    }

    pub fn severity(&self) -> Coded<Severity> {
        Severity::classify_code(self.severity_code)
    }
}

// ── Aggregate rows ────────────────────────────────────────────────────────────

/// Accident count for one surface condition in one region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceCount {
    pub surface: SurfaceCondition,
    pub region: Region,
    pub count: u64,
}

/// Number of involved persons for one severity, region and role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsequenceCount {
    pub severity: Severity,
    pub region: Region,
    pub role: Role,
    pub count: u64,
}

/// Monthly accident counts per collision type for one region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyTypeRow {
    pub region: Region,
    /// Last day of the month.
    pub month: NaiveDate,
    pub counts: BTreeMap<CollisionType, u64>,
}

impl MonthlyTypeRow {
    pub fn count(&self, kind: CollisionType) -> u64 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }
}

/// Collision types over time, one row per (region, month).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyTypeTable {
    /// Collision types observed anywhere in the table.
    pub columns: Vec<CollisionType>,
    /// Rows sorted by region label, then month.
    pub rows: Vec<MonthlyTypeRow>,
}

impl MonthlyTypeTable {
    /// Regions present in the table, in row order.
    pub fn regions(&self) -> Vec<Region> {
        let mut seen = Vec::new();
        for row in &self.rows {
            if !seen.contains(&row.region) {
                seen.push(row.region);
            }
        }
        seen
    }

    pub fn rows_for(&self, region: Region) -> impl Iterator<Item = &MonthlyTypeRow> {
        self.rows.iter().filter(move |r| r.region == region)
    }

    /// Collision types with at least one accident in `region`.
    pub fn types_in_region(&self, region: Region) -> BTreeSet<CollisionType> {
        self.rows_for(region)
            .flat_map(|r| r.counts.iter())
            .filter(|(_, count)| **count > 0)
            .map(|(kind, _)| *kind)
            .collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
