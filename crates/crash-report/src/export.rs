//! JSON export and console summary of the aggregate tables.

use std::path::{Path, PathBuf};

use crash_core::codes::{Role, Severity};
use crash_core::error::{CrashError, Result};
use crash_core::formatting::{format_count, percentage};
use crash_data::AnalysisResult;
use serde::Serialize;

pub const SURFACE_FILE: &str = "01_state.json";
pub const CONSEQUENCE_FILE: &str = "02_alcohol.json";
pub const TYPE_FILE: &str = "03_type.json";

/// Write the three aggregate tables into `dir` and return the written paths.
///
/// Each file is written to a temporary sibling first and renamed into place.
pub fn write_reports(dir: &Path, result: &AnalysisResult) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).map_err(|source| CrashError::FileRead {
        path: dir.to_path_buf(),
        source,
    })?;

    let paths = vec![
        write_json(&dir.join(SURFACE_FILE), &result.surface)?,
        write_json(&dir.join(CONSEQUENCE_FILE), &result.consequences)?,
        write_json(&dir.join(TYPE_FILE), &result.types)?,
    ];
    for path in &paths {
        tracing::debug!(path = %path.display(), "report written");
    }
    Ok(paths)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<PathBuf> {
    let json = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    let io_err = |source: std::io::Error| CrashError::FileRead {
        path: path.to_path_buf(),
        source,
    };
    std::fs::write(&tmp, json).map_err(io_err)?;
    std::fs::rename(&tmp, path).map_err(io_err)?;
    Ok(path.to_path_buf())
}

/// Human-readable summary lines for `--summary`.
pub fn summary_lines(result: &AnalysisResult) -> Vec<String> {
    let meta = &result.metadata;
    let surface_total: u64 = result.surface.iter().map(|r| r.count).sum();
    let persons: u64 = result.consequences.iter().map(|r| r.count).sum();
    let fatal: u64 = result
        .consequences
        .iter()
        .filter(|r| r.severity == Severity::Fatal)
        .map(|r| r.count)
        .sum();
    let drivers: u64 = result
        .consequences
        .iter()
        .filter(|r| r.role == Role::Driver)
        .map(|r| r.count)
        .sum();
    let typed: u64 = result.types.rows.iter().map(|r| r.total()).sum();

    vec![
        format!(
            "Accidents: {} loaded, {} after deduplication ({} precedence)",
            format_count(meta.raw_accident_rows as u64),
            format_count(meta.accidents as u64),
            meta.precedence
        ),
        format!(
            "Surface view: {} rows, {} accidents",
            result.surface.len(),
            format_count(surface_total)
        ),
        format!(
            "Alcohol view: {} rows, {} persons, {} fatal, {}% drivers",
            result.consequences.len(),
            format_count(persons),
            format_count(fatal),
            percentage(drivers, persons, 1)
        ),
        format!(
            "Collision-type view: {} monthly rows in {} regions, {} types, {} accidents",
            result.types.rows.len(),
            result.types.regions().len(),
            result.types.columns.len(),
            format_count(typed)
        ),
    ]
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crash_core::codes::{CodeTable, CollisionType, Region, SurfaceCondition};
    use crash_core::models::{
        ConsequenceCount, DedupPrecedence, MonthlyTypeRow, MonthlyTypeTable, SurfaceCount,
    };
    use crash_data::AnalysisMetadata;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn sample_result() -> AnalysisResult {
        let consequences = Severity::ALL
            .iter()
            .flat_map(|&severity| {
                Role::ALL.iter().map(move |&role| ConsequenceCount {
                    severity,
                    region: Region::Pha,
                    role,
                    count: u64::from(severity == Severity::Fatal && role == Role::Driver),
                })
            })
            .collect();

        AnalysisResult {
            surface: vec![SurfaceCount {
                surface: SurfaceCondition::Dry,
                region: Region::Pha,
                count: 1234,
            }],
            consequences,
            types: MonthlyTypeTable {
                columns: vec![CollisionType::Vehicle],
                rows: vec![MonthlyTypeRow {
                    region: Region::Jhm,
                    month: NaiveDate::from_ymd_opt(2023, 1, 31).unwrap(),
                    counts: BTreeMap::from([(CollisionType::Vehicle, 7)]),
                }],
            },
            metadata: AnalysisMetadata {
                generated_at: "2024-01-01T00:00:00+00:00".to_string(),
                precedence: DedupPrecedence::Earliest,
                raw_accident_rows: 1500,
                accidents: 1234,
                consequence_rows: 10,
                load_time_seconds: 0.5,
                transform_time_seconds: 0.1,
            },
        }
    }

    #[test]
    fn test_write_reports_creates_three_files() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");

        let paths = write_reports(&out, &sample_result()).unwrap();

        assert_eq!(
            paths,
            vec![
                out.join(SURFACE_FILE),
                out.join(CONSEQUENCE_FILE),
                out.join(TYPE_FILE)
            ]
        );
        assert!(paths.iter().all(|p| p.is_file()));
        assert!(!out.join("01_state.json.tmp").exists());
    }

    #[test]
    fn test_surface_json_uses_labels() {
        let tmp = TempDir::new().unwrap();
        write_reports(tmp.path(), &sample_result()).unwrap();

        let text = std::fs::read_to_string(tmp.path().join(SURFACE_FILE)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json[0]["surface"], "povrch suchý");
        assert_eq!(json[0]["region"], "PHA");
        assert_eq!(json[0]["count"], 1234);
    }

    #[test]
    fn test_consequence_json_round_trips() {
        let tmp = TempDir::new().unwrap();
        let result = sample_result();
        write_reports(tmp.path(), &result).unwrap();

        let text = std::fs::read_to_string(tmp.path().join(CONSEQUENCE_FILE)).unwrap();
        let parsed: Vec<ConsequenceCount> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, result.consequences);
        assert!(text.contains("usmrcení"));
        assert!(text.contains("řidič"));
    }

    #[test]
    fn test_type_json_has_month_end_dates() {
        let tmp = TempDir::new().unwrap();
        write_reports(tmp.path(), &sample_result()).unwrap();

        let text = std::fs::read_to_string(tmp.path().join(TYPE_FILE)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["columns"][0], "srážka");
        assert_eq!(json["rows"][0]["month"], "2023-01-31");
        assert_eq!(json["rows"][0]["counts"]["srážka"], 7);
    }

    #[test]
    fn test_write_reports_into_file_path_fails() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();

        let err = write_reports(&blocker, &sample_result()).unwrap_err();
        assert!(matches!(err, CrashError::FileRead { .. }));
    }

    #[test]
    fn test_summary_lines() {
        let lines = summary_lines(&sample_result());
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[0],
            "Accidents: 1,500 loaded, 1,234 after deduplication (earliest precedence)"
        );
        assert_eq!(lines[1], "Surface view: 1 rows, 1,234 accidents");
        assert_eq!(lines[2], "Alcohol view: 8 rows, 1 persons, 1 fatal, 100% drivers");
        assert!(lines[3].contains("1 regions"));
    }
}
