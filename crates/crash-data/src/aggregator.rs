//! Categorical count tables over the normalized accident table.
//!
//! Two views live here: accidents per surface condition and region, and
//! persons hurt in alcohol-related accidents per severity, region and role.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crash_core::codes::{CodeTable, Coded, Region, Role, Severity};
use crash_core::models::{
    AccidentRecord, AccidentTable, ConsequenceCount, ConsequenceRecord, SurfaceCount,
};
use tracing::{debug, info};

/// Alcohol codes at or above this value mark an alcohol-related accident.
pub const ALCOHOL_THRESHOLD: i64 = 3;

// ── Generic counting ──────────────────────────────────────────────────────────

/// Count accidents per (label, region).
///
/// Records whose `classify` result is not [`Coded::Known`] or whose region is
/// unknown are skipped. Only observed pairs are present in the map.
pub fn count_by_label<T>(
    table: &AccidentTable,
    classify: impl Fn(&AccidentRecord) -> Coded<T>,
) -> BTreeMap<(T, Region), u64>
where
    T: CodeTable + Ord,
{
    let mut counts: BTreeMap<(T, Region), u64> = BTreeMap::new();
    for record in table {
        let (Some(label), Some(region)) = (classify(record).known(), record.region()) else {
            continue;
        };
        *counts.entry((label, region)).or_insert(0) += 1;
    }
    counts
}

// ── Surface view ──────────────────────────────────────────────────────────────

/// Accidents per surface condition and region.
///
/// Sorted by surface label, then region label. Pairs with no accidents are
/// absent.
pub fn aggregate_by_surface(table: &AccidentTable) -> Vec<SurfaceCount> {
    let mut rows: Vec<SurfaceCount> = count_by_label(table, AccidentRecord::surface)
        .into_iter()
        .map(|((surface, region), count)| SurfaceCount {
            surface,
            region,
            count,
        })
        .collect();

    rows.sort_by(|a, b| {
        a.surface
            .label()
            .cmp(b.surface.label())
            .then_with(|| a.region.label().cmp(b.region.label()))
    });

    debug!("Surface view: {} (surface, region) pairs", rows.len());
    rows
}

// ── Consequence view ──────────────────────────────────────────────────────────

/// Whether an accident counts for the alcohol view.
fn is_alcohol_related(record: &AccidentRecord) -> bool {
    record.time.is_some() && record.alcohol_code.is_some_and(|code| code >= ALCOHOL_THRESHOLD)
}

/// Persons involved in alcohol-related accidents per severity, region and role.
///
/// Accidents qualify with an alcohol code of at least [`ALCOHOL_THRESHOLD`]
/// and a recorded time. Consequence rows join on the accident identifier;
/// rows with no matching accident or an accident without a region are
/// dropped. Joined rows with an unmapped severity are not counted.
///
/// The result is dense: one row for every severity, every region that has
/// at least one joined row (counted or not), and both roles, with zero where
/// nothing was counted. Rows come in severity order, then region label, then role.
pub fn aggregate_by_consequence(
    table: &AccidentTable,
    consequences: &[ConsequenceRecord],
) -> Vec<ConsequenceCount> {
    let regions_by_id: HashMap<&str, Option<Region>> = table
        .iter()
        .filter(|record| is_alcohol_related(record))
        .map(|record| (record.id.as_str(), record.region()))
        .collect();

    let mut counts: BTreeMap<(Severity, Region, Role), u64> = BTreeMap::new();
    let mut observed: BTreeSet<Region> = BTreeSet::new();
    let mut joined = 0u64;
    let mut unmapped_severity = 0usize;
    for person in consequences {
        let Some(Some(region)) = regions_by_id.get(person.id.as_str()).copied() else {
            continue;
        };
        // A joined region stays in the product even when its severity is dropped.
        observed.insert(region);
        let Some(severity) = person.severity().known() else {
            unmapped_severity += 1;
            continue;
        };
        *counts.entry((severity, region, person.role())).or_insert(0) += 1;
        joined += 1;
    }

    let mut regions: Vec<Region> = observed.into_iter().collect();
    regions.sort_by_key(|r| r.label());

    let mut rows = Vec::with_capacity(Severity::ALL.len() * regions.len() * Role::ALL.len());
    for &severity in Severity::ALL {
        for &region in &regions {
            for &role in Role::ALL {
                rows.push(ConsequenceCount {
                    severity,
                    region,
                    role,
                    count: counts.get(&(severity, region, role)).copied().unwrap_or(0),
                });
            }
        }
    }

    debug!(unmapped_severity, "consequence rows without a severity label");
    info!(
        "Consequence view: {} alcohol-related accidents, {} joined persons, {} regions",
        regions_by_id.len(),
        joined,
        regions.len()
    );
    rows
}

// ── Tests ─────────────────────────────────────────────────────────────────────
