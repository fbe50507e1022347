//! Monthly collision-type counts for a fixed set of regions.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use crash_core::codes::{CodeTable, CollisionType, Region};
use crash_core::error::{CrashError, Result};
use crash_core::models::{AccidentTable, MonthlyTypeRow, MonthlyTypeTable};
use crash_core::time_utils::{month_end, parse_strict_dmy, DateWindow};
use tracing::{debug, info};

/// Regions shown in the collision-type view.
pub const TYPE_REGIONS: [Region; 4] = [Region::Jhm, Region::Pha, Region::Jhc, Region::Ulk];

/// Inclusive date range of the collision-type view.
pub fn default_window() -> DateWindow {
    DateWindow::new(ymd(2023, 1, 1), ymd(2024, 10, 1))
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

/// Collision types per month for [`TYPE_REGIONS`] inside [`default_window`].
pub fn aggregate_by_type_over_time(table: &AccidentTable) -> Result<MonthlyTypeTable> {
    aggregate_by_type_over_time_in(table, &TYPE_REGIONS, default_window())
}

/// Collision types per month for `regions` inside `window`.
///
/// `p2a` is re-read strictly as `DD.MM.YYYY`; a record of a selected region
/// that does not match fails the whole batch with
/// [`CrashError::MalformedDate`]. Unmapped collision codes count towards no
/// column.
///
/// Columns are every collision type seen inside the window. Every row holds
/// a value for each column, zero included. Months are labelled with their
/// last day; rows are sorted by region label, then month.
pub fn aggregate_by_type_over_time_in(
    table: &AccidentTable,
    regions: &[Region],
    window: DateWindow,
) -> Result<MonthlyTypeTable> {
    // Daily pivot: (date, region) -> type -> accidents.
    let mut daily: BTreeMap<(NaiveDate, Region), BTreeMap<CollisionType, u64>> = BTreeMap::new();
    let mut selected = 0usize;

    for record in table {
        let Some(region) = record.region().filter(|r| regions.contains(r)) else {
            continue;
        };
        selected += 1;

        let date = parse_strict_dmy(&record.date_text).ok_or_else(|| CrashError::MalformedDate {
            id: record.id.clone(),
            value: record.date_text.clone(),
        })?;

        let Some(kind) = record.collision_type().known() else {
            continue;
        };
        *daily
            .entry((date, region))
            .or_default()
            .entry(kind)
            .or_insert(0) += 1;
    }

    daily.retain(|(date, _), _| window.contains(*date));

    let columns: Vec<CollisionType> = daily
        .values()
        .flat_map(|counts| counts.keys().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    // Resample to calendar months.
    let mut monthly: BTreeMap<(Region, NaiveDate), BTreeMap<CollisionType, u64>> = BTreeMap::new();
    for ((date, region), counts) in &daily {
        let bucket = monthly.entry((*region, month_end(*date))).or_insert_with(|| {
            columns.iter().map(|kind| (*kind, 0)).collect()
        });
        for (kind, count) in counts {
            *bucket.entry(*kind).or_insert(0) += count;
        }
    }

    let mut rows: Vec<MonthlyTypeRow> = monthly
        .into_iter()
        .map(|((region, month), counts)| MonthlyTypeRow {
            region,
            month,
            counts,
        })
        .collect();
    rows.sort_by(|a, b| {
        a.region
            .label()
            .cmp(b.region.label())
            .then(a.month.cmp(&b.month))
    });

    debug!(
        selected,
        days = daily.len(),
        "collision-type pivot built"
    );
    info!(
        "Collision-type view: {} monthly rows, {} types",
        rows.len(),
        columns.len()
    );

    Ok(MonthlyTypeTable { columns, rows })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
