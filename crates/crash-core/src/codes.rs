//! Fixed code tables used by the police accident statistics.
//!
//! Every table is a closed enumeration. Raw spreadsheet cells are looked up
//! through [`CodeTable::classify`], which separates known codes from numeric
//! codes outside the table and from empty or non-numeric cells.

use serde::{Deserialize, Serialize};
use std::fmt;

// ── Coded ─────────────────────────────────────────────────────────────────────

/// Result of looking a raw cell up in a fixed code table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Coded<T> {
    /// The code is part of the table.
    Known(T),
    /// The cell is numeric but the code has no label.
    Unmapped(i64),
    /// The cell is empty or not a number.
    Absent,
}

impl<T: Copy> Coded<T> {
    /// The mapped value, or `None` for unmapped and absent codes.
    pub fn known(&self) -> Option<T> {
        match self {
            Coded::Known(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Coded::Known(_))
    }
}

/// Parse a spreadsheet cell holding an integer code.
///
/// Accepts `"3"`, `" 3 "` and integral floats such as `"3.0"`. Returns `None`
/// for empty cells, fractional values and text.
pub fn parse_code(cell: &str) -> Option<i64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(code) = trimmed.parse::<i64>() {
        return Some(code);
    }
    match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 => Some(f as i64),
        _ => None,
    }
}

// ── CodeTable ─────────────────────────────────────────────────────────────────

/// A closed code → label table.
pub trait CodeTable: Sized + Copy + 'static {
    /// Every label of the table, in code order.
    const ALL: &'static [Self];

    /// Look a numeric code up, `None` when the table has no entry for it.
    fn from_code(code: i64) -> Option<Self>;

    /// The human-readable label used in reports.
    fn label(self) -> &'static str;

    /// Classify a raw cell against this table.
    fn classify(cell: &str) -> Coded<Self> {
        Self::classify_code(parse_code(cell))
    }

    /// Classify an already parsed code.
    fn classify_code(code: Option<i64>) -> Coded<Self> {
        match code {
            None => Coded::Absent,
            Some(code) => match Self::from_code(code) {
                Some(value) => Coded::Known(value),
                None => Coded::Unmapped(code),
            },
        }
    }
}

macro_rules! impl_display_via_label {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.label())
                }
            }
        )*
    };
}

// ── Region ────────────────────────────────────────────────────────────────────

/// Czech self-governing regions as coded in column `p4a`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Region {
    Pha,
    Stc,
    Jhc,
    Plk,
    Ulk,
    Hkk,
    Jhm,
    Msk,
    Olk,
    Zlk,
    Vys,
    Pak,
    Lbk,
    Kvk,
}

impl CodeTable for Region {
    const ALL: &'static [Self] = &[
        Region::Pha,
        Region::Stc,
        Region::Jhc,
        Region::Plk,
        Region::Ulk,
        Region::Hkk,
        Region::Jhm,
        Region::Msk,
        Region::Olk,
        Region::Zlk,
        Region::Vys,
        Region::Pak,
        Region::Lbk,
        Region::Kvk,
    ];

    fn from_code(code: i64) -> Option<Self> {
        // 8..=13 are historical district codes without a region.
        let region = match code {
            0 => Region::Pha,
            1 => Region::Stc,
            2 => Region::Jhc,
            3 => Region::Plk,
            4 => Region::Ulk,
            5 => Region::Hkk,
            6 => Region::Jhm,
            7 => Region::Msk,
            14 => Region::Olk,
            15 => Region::Zlk,
            16 => Region::Vys,
            17 => Region::Pak,
            18 => Region::Lbk,
            19 => Region::Kvk,
            _ => return None,
        };
        Some(region)
    }

    fn label(self) -> &'static str {
        match self {
            Region::Pha => "PHA",
            Region::Stc => "STC",
            Region::Jhc => "JHC",
            Region::Plk => "PLK",
            Region::Ulk => "ULK",
            Region::Hkk => "HKK",
            Region::Jhm => "JHM",
            Region::Msk => "MSK",
            Region::Olk => "OLK",
            Region::Zlk => "ZLK",
            Region::Vys => "VYS",
            Region::Pak => "PAK",
            Region::Lbk => "LBK",
            Region::Kvk => "KVK",
        }
    }
}

impl Region {
    /// Look a region up by its three-letter label.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|r| r.label() == label)
    }
}

// ── SurfaceCondition ──────────────────────────────────────────────────────────

/// Road surface condition (`p16`). Codes 1 and 2 both mean a dry surface,
/// codes 5 and 6 both mean ice or packed snow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SurfaceCondition {
    #[serde(rename = "povrch suchý")]
    Dry,
    #[serde(rename = "povrch mokrý")]
    Wet,
    #[serde(rename = "na vozovce je bláto")]
    Mud,
    #[serde(rename = "na vozovce je náledí, ujetý sníh")]
    IcePackedSnow,
}

impl CodeTable for SurfaceCondition {
    const ALL: &'static [Self] = &[
        SurfaceCondition::Dry,
        SurfaceCondition::Wet,
        SurfaceCondition::Mud,
        SurfaceCondition::IcePackedSnow,
    ];

    fn from_code(code: i64) -> Option<Self> {
        match code {
            1 | 2 => Some(SurfaceCondition::Dry),
            3 => Some(SurfaceCondition::Wet),
            4 => Some(SurfaceCondition::Mud),
            5 | 6 => Some(SurfaceCondition::IcePackedSnow),
            _ => None,
        }
    }

    fn label(self) -> &'static str {
        match self {
            SurfaceCondition::Dry => "povrch suchý",
            SurfaceCondition::Wet => "povrch mokrý",
            SurfaceCondition::Mud => "na vozovce je bláto",
            SurfaceCondition::IcePackedSnow => "na vozovce je náledí, ujetý sníh",
        }
    }
}

// ── Severity ──────────────────────────────────────────────────────────────────

/// Consequence for one involved person (`p59g`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    #[serde(rename = "usmrcení")]
    Fatal,
    #[serde(rename = "těžké zranění")]
    Serious,
    #[serde(rename = "lehké zranění")]
    Light,
    #[serde(rename = "bez zranění")]
    Unharmed,
}

impl CodeTable for Severity {
    const ALL: &'static [Self] = &[
        Severity::Fatal,
        Severity::Serious,
        Severity::Light,
        Severity::Unharmed,
    ];

    fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Severity::Fatal),
            2 => Some(Severity::Serious),
            3 => Some(Severity::Light),
            4 => Some(Severity::Unharmed),
            _ => None,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Severity::Fatal => "usmrcení",
            Severity::Serious => "těžké zranění",
            Severity::Light => "lehké zranění",
            Severity::Unharmed => "bez zranění",
        }
    }
}

// ── Role ──────────────────────────────────────────────────────────────────────

/// Whether an involved person was driving (`p59a`).
///
/// Not a [`CodeTable`]: every code other than 1 counts as a passenger, so the
/// mapping is total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "řidič")]
    Driver,
    #[serde(rename = "pasažer")]
    Passenger,
}

impl Role {
    pub const ALL: &'static [Role] = &[Role::Driver, Role::Passenger];

    /// Code 1 is the driver; anything else, including an empty cell, is not.
    pub fn from_code(code: Option<i64>) -> Self {
        if code == Some(1) {
            Role::Driver
        } else {
            Role::Passenger
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::Driver => "řidič",
            Role::Passenger => "pasažer",
        }
    }
}

// ── CollisionType ─────────────────────────────────────────────────────────────

/// Kind of accident (`p6`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CollisionType {
    #[serde(rename = "jiný druh nehody")]
    Other,
    #[serde(rename = "srážka")]
    Vehicle,
    #[serde(rename = "srážka s vozidlem zaparkovaným")]
    ParkedVehicle,
    #[serde(rename = "srážka s pevnou překážkou")]
    FixedObstacle,
    #[serde(rename = "srážka s chodcem")]
    Pedestrian,
    #[serde(rename = "srážka s lesní zvěří")]
    Wildlife,
    #[serde(rename = "srážka s domácím zvířetem")]
    DomesticAnimal,
    #[serde(rename = "srážka s vlakem")]
    Train,
    #[serde(rename = "srážka s tramvají")]
    Tram,
    #[serde(rename = "havárie")]
    Crash,
}

impl CodeTable for CollisionType {
    const ALL: &'static [Self] = &[
        CollisionType::Other,
        CollisionType::Vehicle,
        CollisionType::ParkedVehicle,
        CollisionType::FixedObstacle,
        CollisionType::Pedestrian,
        CollisionType::Wildlife,
        CollisionType::DomesticAnimal,
        CollisionType::Train,
        CollisionType::Tram,
        CollisionType::Crash,
    ];

    fn from_code(code: i64) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| Self::ALL.get(idx))
            .copied()
    }

    fn label(self) -> &'static str {
        match self {
            CollisionType::Other => "jiný druh nehody",
            CollisionType::Vehicle => "srážka",
            CollisionType::ParkedVehicle => "srážka s vozidlem zaparkovaným",
            CollisionType::FixedObstacle => "srážka s pevnou překážkou",
            CollisionType::Pedestrian => "srážka s chodcem",
            CollisionType::Wildlife => "srážka s lesní zvěří",
            CollisionType::DomesticAnimal => "srážka s domácím zvířetem",
            CollisionType::Train => "srážka s vlakem",
            CollisionType::Tram => "srážka s tramvají",
            CollisionType::Crash => "havárie",
        }
    }
}

impl_display_via_label!(Region, SurfaceCondition, Severity, Role, CollisionType);

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── parse_code ────────────────────────────────────────────────────────────

    #[test]
    fn test_parse_code_integer() {
        assert_eq!(parse_code("3"), Some(3));
        assert_eq!(parse_code("  19 "), Some(19));
        assert_eq!(parse_code("-1"), Some(-1));
    }

    #[test]
    fn test_parse_code_integral_float() {
        assert_eq!(parse_code("5.0"), Some(5));
    }

    #[test]
    fn test_parse_code_rejects_text_and_fractions() {
        assert_eq!(parse_code(""), None);
        assert_eq!(parse_code("   "), None);
        assert_eq!(parse_code("abc"), None);
        assert_eq!(parse_code("2.5"), None);
        assert_eq!(parse_code("NaN"), None);
    }

    // ── Region ────────────────────────────────────────────────────────────────

    #[test]
    fn test_region_table_has_fourteen_entries() {
        assert_eq!(Region::ALL.len(), 14);
        let mapped = (0..=19).filter_map(Region::from_code).count();
        assert_eq!(mapped, 14);
    }

    #[test]
    fn test_region_known_codes() {
        assert_eq!(Region::from_code(0), Some(Region::Pha));
        assert_eq!(Region::from_code(7), Some(Region::Msk));
        assert_eq!(Region::from_code(14), Some(Region::Olk));
        assert_eq!(Region::from_code(19), Some(Region::Kvk));
    }

    #[test]
    fn test_region_gap_codes_are_unmapped() {
        for code in 8..=13 {
            assert_eq!(Region::classify(&code.to_string()), Coded::Unmapped(code));
        }
        assert_eq!(Region::classify("20"), Coded::Unmapped(20));
        assert_eq!(Region::classify(""), Coded::Absent);
    }

    #[test]
    fn test_region_labels_round_trip() {
        for region in Region::ALL {
            assert_eq!(Region::from_label(region.label()), Some(*region));
        }
        assert_eq!(Region::from_label("XYZ"), None);
    }

    #[test]
    fn test_region_serializes_as_label() {
        let json = serde_json::to_string(&Region::Jhm).unwrap();
        assert_eq!(json, "\"JHM\"");
    }

    // ── SurfaceCondition ──────────────────────────────────────────────────────

    #[test]
    fn test_surface_codes_merge() {
        assert_eq!(SurfaceCondition::from_code(1), Some(SurfaceCondition::Dry));
        assert_eq!(SurfaceCondition::from_code(2), Some(SurfaceCondition::Dry));
        assert_eq!(
            SurfaceCondition::from_code(5),
            SurfaceCondition::from_code(6)
        );
        assert_eq!(SurfaceCondition::from_code(0), None);
        assert_eq!(SurfaceCondition::from_code(7), None);
    }

    #[test]
    fn test_surface_serializes_as_label() {
        let json = serde_json::to_string(&SurfaceCondition::IcePackedSnow).unwrap();
        assert_eq!(json, "\"na vozovce je náledí, ujetý sníh\"");
    }

    // ── Severity / Role ───────────────────────────────────────────────────────

    #[test]
    fn test_severity_labels() {
        assert_eq!(Severity::from_code(1).unwrap().label(), "usmrcení");
        assert_eq!(Severity::from_code(4).unwrap().label(), "bez zranění");
        assert_eq!(Severity::classify("9"), Coded::Unmapped(9));
    }

    #[test]
    fn test_role_is_total() {
        assert_eq!(Role::from_code(Some(1)), Role::Driver);
        assert_eq!(Role::from_code(Some(2)), Role::Passenger);
        assert_eq!(Role::from_code(None), Role::Passenger);
        assert_eq!(Role::Driver.to_string(), "řidič");
    }

    // ── CollisionType ─────────────────────────────────────────────────────────

    #[test]
    fn test_collision_type_codes() {
        assert_eq!(CollisionType::from_code(0), Some(CollisionType::Other));
        assert_eq!(CollisionType::from_code(1), Some(CollisionType::Vehicle));
        assert_eq!(CollisionType::from_code(9), Some(CollisionType::Crash));
        assert_eq!(CollisionType::from_code(10), None);
        assert_eq!(CollisionType::from_code(-1), None);
    }

    #[test]
    fn test_collision_type_label_matches_serde_name() {
        for kind in CollisionType::ALL {
            let json = serde_json::to_string(kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.label()));
        }
    }

    #[test]
    fn test_coded_known_accessor() {
        assert_eq!(Region::classify("6").known(), Some(Region::Jhm));
        assert_eq!(Region::classify("11").known(), None);
        assert!(!Region::classify("x").is_known());
    }
}
