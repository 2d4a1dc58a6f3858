//! Raw row → [`ProductRecord`].
//!
//! Inventory exports often wrap identifiers as Excel formulas (`="00123"`)
//! to keep leading zeros. Those artifacts are stripped before a row is
//! accepted. Rows missing a part number or a secondary product number are
//! dropped entirely.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::ProductRecord;
use crate::parser::RawRow;

/// Every `=` and `"` in identifier and description fields.
static FORMULA_ARTIFACTS: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[="]"#).expect("valid regex"));

/// Longest numeric prefix, the way spreadsheet exports are usually read
/// (`"12.50 USD"` → 12.5).
static NUMERIC_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:Infinity|(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)").expect("valid regex")
});

/// Source column for each canonical field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnMapping {
    pub part_number: String,
    pub secondary_number: String,
    pub description: String,
    pub list_price: String,
    pub unit_cost: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            part_number: "PartNumber".to_string(),
            secondary_number: "NTPProductNumber".to_string(),
            description: "LongDescription".to_string(),
            list_price: "JobberPrice".to_string(),
            unit_cost: "Cost".to_string(),
        }
    }
}

impl ColumnMapping {
    /// Mapped columns absent from `headers`.
    pub fn missing_from<'a>(&'a self, headers: &[String]) -> Vec<&'a str> {
        [
            &self.part_number,
            &self.secondary_number,
            &self.description,
            &self.list_price,
            &self.unit_cost,
        ]
        .into_iter()
        .filter(|col| !headers.iter().any(|h| h == *col))
        .map(String::as_str)
        .collect()
    }
}

/// Strip formula artifacts, then surrounding whitespace.
pub fn clean_text(raw: &str) -> String {
    FORMULA_ARTIFACTS.replace_all(raw, "").trim().to_string()
}

/// Parse a price field. Anything without a numeric prefix is `0`.
pub fn parse_amount(raw: &str) -> f64 {
    NUMERIC_PREFIX
        .find(raw.trim_start())
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| !v.is_nan())
        .unwrap_or(0.0)
}

/// Normalize one row, or `None` when it lacks a part number or a
/// secondary number.
pub fn normalize(row: &RawRow, mapping: &ColumnMapping) -> Option<ProductRecord> {
    let text = |column: &str| row.get(column).map(clean_text).unwrap_or_default();

    let part_number = text(&mapping.part_number);
    let secondary_number = text(&mapping.secondary_number);
    if part_number.is_empty() || secondary_number.is_empty() {
        return None;
    }

    Some(ProductRecord {
        part_number,
        secondary_number,
        description: text(&mapping.description),
        list_price: row.get(&mapping.list_price).map(parse_amount).unwrap_or(0.0),
        unit_cost: row.get(&mapping.unit_cost).map(parse_amount).unwrap_or(0.0),
    })
}

/// A normalized snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    /// Accepted records, in file order.
    pub records: Vec<ProductRecord>,
    /// Rows dropped for a missing part or secondary number.
    pub rejected: usize,
}

/// Normalize every row of a snapshot.
pub fn normalize_dataset(rows: &[RawRow], mapping: &ColumnMapping) -> Dataset {
    let records: Vec<ProductRecord> = rows.iter().filter_map(|r| normalize(r, mapping)).collect();
    Dataset {
        rejected: rows.len() - records.len(),
        records,
    }
}
