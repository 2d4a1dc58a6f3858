//! Domain models for inventory comparison.
//!
//! - [`ProductRecord`] - one normalized inventory line
//! - [`PriceChange`] - a part present in both snapshots with a new price or cost
//! - [`Section`] - the three result tables (new, discontinued, price changes)
//! - [`FieldValue`] / [`Tabular`] - column access used by the view and export layers

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

// =============================================================================
// Field Access
// =============================================================================

/// A single cell, typed the way the view pipeline compares it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Number(f64),
}

impl FieldValue<'_> {
    /// Native ordering: lexicographic for text, numeric for numbers.
    ///
    /// Mixed kinds and NaN compare as equal so a stable sort leaves them in
    /// place.
    pub fn compare(&self, other: &FieldValue<'_>) -> Ordering {
        match (self, other) {
            (FieldValue::Text(a), FieldValue::Text(b)) => a.cmp(b),
            (FieldValue::Number(a), FieldValue::Number(b)) => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            _ => Ordering::Equal,
        }
    }
}

impl fmt::Display for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Number(n) => f.write_str(&number_to_string(*n)),
        }
    }
}

/// Shortest round-trip text of a number, without a trailing `.0`.
///
/// `12.0` → `"12"`, `12.5` → `"12.5"`, `-0.0` → `"0"`. Magnitudes below
/// 1e-6 or from 1e21 up use exponent form: `1e-7`, `1.5e+21`.
pub fn number_to_string(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let magnitude = value.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return value.to_string();
    }

    let sci = format!("{:e}", value);
    match sci.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => format!("{}e+{}", mantissa, exponent),
        _ => sci,
    }
}

/// Records that expose named columns to the view and export layers.
pub trait Tabular {
    /// Every column, in record field order.
    fn columns() -> &'static [&'static str];

    /// Value at `column`, or `None` when the record has no such column.
    fn field(&self, column: &str) -> Option<FieldValue<'_>>;
}

// =============================================================================
// Product Record
// =============================================================================

/// One inventory line after normalization.
///
/// Never constructed with an empty `part_number` or `secondary_number`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub part_number: String,
    pub secondary_number: String,
    pub description: String,
    pub list_price: f64,
    pub unit_cost: f64,
}

impl ProductRecord {
    pub const COLUMNS: &'static [&'static str] = &[
        "PartNumber",
        "NTPProductNumber",
        "LongDescription",
        "JobberPrice",
        "Cost",
    ];
}

impl Tabular for ProductRecord {
    fn columns() -> &'static [&'static str] {
        Self::COLUMNS
    }

    fn field(&self, column: &str) -> Option<FieldValue<'_>> {
        Some(match column {
            "PartNumber" => FieldValue::Text(&self.part_number),
            "NTPProductNumber" => FieldValue::Text(&self.secondary_number),
            "LongDescription" => FieldValue::Text(&self.description),
            "JobberPrice" => FieldValue::Number(self.list_price),
            "Cost" => FieldValue::Number(self.unit_cost),
            _ => return None,
        })
    }
}

// =============================================================================
// Price Change
// =============================================================================

/// A part listed in both snapshots whose list price or unit cost moved.
///
/// Text fields come from the new snapshot. Differences are `new - old`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceChange {
    pub part_number: String,
    pub secondary_number: String,
    pub description: String,
    pub old_list_price: f64,
    pub new_list_price: f64,
    pub list_price_difference: f64,
    pub old_unit_cost: f64,
    pub new_unit_cost: f64,
    pub unit_cost_difference: f64,
}

impl PriceChange {
    pub const COLUMNS: &'static [&'static str] = &[
        "PartNumber",
        "NTPProductNumber",
        "LongDescription",
        "OldJobberPrice",
        "NewJobberPrice",
        "PriceDifference",
        "OldCost",
        "NewCost",
        "CostDifference",
    ];

    /// Pair an old and new record. Returns `None` when neither price nor
    /// cost differs.
    pub fn between(old: &ProductRecord, new: &ProductRecord) -> Option<Self> {
        if old.list_price == new.list_price && old.unit_cost == new.unit_cost {
            return None;
        }

        Some(Self {
            part_number: new.part_number.clone(),
            secondary_number: new.secondary_number.clone(),
            description: new.description.clone(),
            old_list_price: old.list_price,
            new_list_price: new.list_price,
            list_price_difference: new.list_price - old.list_price,
            old_unit_cost: old.unit_cost,
            new_unit_cost: new.unit_cost,
            unit_cost_difference: new.unit_cost - old.unit_cost,
        })
    }
}

impl Tabular for PriceChange {
    fn columns() -> &'static [&'static str] {
        Self::COLUMNS
    }

    fn field(&self, column: &str) -> Option<FieldValue<'_>> {
        Some(match column {
            "PartNumber" => FieldValue::Text(&self.part_number),
            "NTPProductNumber" => FieldValue::Text(&self.secondary_number),
            "LongDescription" => FieldValue::Text(&self.description),
            "OldJobberPrice" => FieldValue::Number(self.old_list_price),
            "NewJobberPrice" => FieldValue::Number(self.new_list_price),
            "PriceDifference" => FieldValue::Number(self.list_price_difference),
            "OldCost" => FieldValue::Number(self.old_unit_cost),
            "NewCost" => FieldValue::Number(self.new_unit_cost),
            "CostDifference" => FieldValue::Number(self.unit_cost_difference),
            _ => return None,
        })
    }
}

// =============================================================================
// Sections
// =============================================================================

/// One of the three result tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Section {
    NewProducts,
    Discontinued,
    PriceChanges,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::NewProducts, Section::Discontinued, Section::PriceChanges];

    /// Position in [`Section::ALL`].
    pub fn index(self) -> usize {
        match self {
            Section::NewProducts => 0,
            Section::Discontinued => 1,
            Section::PriceChanges => 2,
        }
    }

    /// Key used in export filenames.
    pub fn key(&self) -> &'static str {
        match self {
            Section::NewProducts => "newProducts",
            Section::Discontinued => "discontinued",
            Section::PriceChanges => "priceChanges",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Section::NewProducts => "New Products",
            Section::Discontinued => "Discontinued Products",
            Section::PriceChanges => "Price Changes",
        }
    }

    /// Columns shown in the results table.
    pub fn display_columns(&self) -> &'static [&'static str] {
        match self {
            Section::NewProducts | Section::Discontinued => ProductRecord::COLUMNS,
            Section::PriceChanges => &[
                "PartNumber",
                "NTPProductNumber",
                "OldJobberPrice",
                "NewJobberPrice",
                "PriceDifference",
            ],
        }
    }

    /// Columns written by a section export (every record field).
    pub fn export_columns(&self) -> &'static [&'static str] {
        match self {
            Section::NewProducts | Section::Discontinued => ProductRecord::COLUMNS,
            Section::PriceChanges => PriceChange::COLUMNS,
        }
    }

    /// Parse a section key (`newProducts`, `discontinued`, `priceChanges`).
    /// Kebab-case and snake_case spellings are accepted too.
    pub fn from_key(key: &str) -> Option<Self> {
        let normalized: String = key
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "newproducts" | "new" | "added" => Some(Section::NewProducts),
            "discontinued" => Some(Section::Discontinued),
            "pricechanges" | "changed" => Some(Section::PriceChanges),
            _ => None,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(part: &str, price: f64, cost: f64) -> ProductRecord {
        ProductRecord {
            part_number: part.into(),
            secondary_number: "N1".into(),
            description: "Widget".into(),
            list_price: price,
            unit_cost: cost,
        }
    }

    #[test]
    fn test_number_to_string() {
        assert_eq!(number_to_string(12.0), "12");
        assert_eq!(number_to_string(12.5), "12.5");
        assert_eq!(number_to_string(-0.0), "0");
        assert_eq!(number_to_string(0.1 + 0.2), "0.30000000000000004");
    }

    #[test]
    fn test_number_to_string_exponent_range() {
        assert_eq!(number_to_string(0.000001), "0.000001");
        assert_eq!(number_to_string(1e-7), "1e-7");
        assert_eq!(number_to_string(-2.5e-8), "-2.5e-8");
        assert_eq!(number_to_string(1e20), "100000000000000000000");
        assert_eq!(number_to_string(1e21), "1e+21");
        assert_eq!(number_to_string(1.5e21), "1.5e+21");
    }

    #[test]
    fn test_price_change_between() {
        let old = record("A1", 10.0, 4.0);
        let new = record("A1", 12.0, 4.0);

        let change = PriceChange::between(&old, &new).unwrap();
        assert_eq!(change.list_price_difference, 2.0);
        assert_eq!(change.unit_cost_difference, 0.0);

        assert!(PriceChange::between(&old, &old.clone()).is_none());
    }

    #[test]
    fn test_cost_only_change_detected() {
        let old = record("A1", 10.0, 4.0);
        let new = record("A1", 10.0, 3.5);

        let change = PriceChange::between(&old, &new).unwrap();
        assert_eq!(change.unit_cost_difference, -0.5);
    }

    #[test]
    fn test_field_lookup() {
        let r = record("A1", 10.0, 4.0);
        assert_eq!(r.field("PartNumber"), Some(FieldValue::Text("A1")));
        assert_eq!(r.field("JobberPrice"), Some(FieldValue::Number(10.0)));
        assert_eq!(r.field("Nope"), None);

        for column in ProductRecord::columns() {
            assert!(r.field(column).is_some());
        }
    }

    #[test]
    fn test_section_keys() {
        for (i, section) in Section::ALL.into_iter().enumerate() {
            assert_eq!(Section::from_key(section.key()), Some(section));
            assert_eq!(section.index(), i);
        }
        assert_eq!(Section::from_key("price-changes"), Some(Section::PriceChanges));
        assert_eq!(Section::from_key("bogus"), None);
    }

    #[test]
    fn test_record_json_is_camel_case() {
        let json = serde_json::to_value(record("A1", 1.0, 2.0)).unwrap();
        assert_eq!(json["partNumber"], "A1");
        assert_eq!(json["listPrice"], 1.0);
    }
}
