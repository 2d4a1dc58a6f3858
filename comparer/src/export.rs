//! CSV export of result sections.
//!
//! Output is plain comma-joined text, one line per record. Fields are not
//! quoted or escaped, so a value containing a comma (a long description,
//! typically) shifts the columns of its line. Consumers that need strict
//! CSV should avoid such data or post-process the file.
//!
//! Numbers that carry a fractional part or exceed 1000 are written in
//! currency style without the symbol (`1,234.50`); other numbers are
//! written as-is (`500`).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ExportResult;
use crate::models::{number_to_string, FieldValue, Section, Tabular};

/// Export settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportOptions {
    /// Write the column names as the first line
    pub include_header: bool,
}

/// Two fixed decimals with thousands separators and no currency symbol.
///
/// Rounds half away from zero on the shortest decimal form of the value,
/// the way `Intl.NumberFormat` does: `1.005` becomes `1.01` and `0.125`
/// becomes `0.13`.
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return number_to_string(value);
    }

    // `{:e}` is the shortest round-trip form: `1.005e0`, `5e-1`, `1.2345e3`
    let sci = format!("{:e}", value.abs());
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    let mut digits: Vec<u8> = mantissa.bytes().filter(u8::is_ascii_digit).map(|b| b - b'0').collect();

    // Pad to at least one integer digit and three fraction digits
    let mut int_len = exponent + 1;
    if int_len < 1 {
        let zeros = (1 - int_len) as usize;
        digits.splice(0..0, std::iter::repeat(0).take(zeros));
        int_len = 1;
    }
    let int_len = int_len as usize;
    if digits.len() < int_len + 3 {
        digits.resize(int_len + 3, 0);
    }

    let round_up = digits[int_len + 2] >= 5;
    digits.truncate(int_len + 2);

    if round_up {
        let mut i = digits.len();
        loop {
            if i == 0 {
                digits.insert(0, 1);
                break;
            }
            i -= 1;
            if digits[i] == 9 {
                digits[i] = 0;
            } else {
                digits[i] += 1;
                break;
            }
        }
    }

    let split = digits.len() - 2;
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 2);
    if value < 0.0 {
        out.push('-');
    }
    for (i, d) in digits[..split].iter().enumerate() {
        if i > 0 && (split - i) % 3 == 0 {
            out.push(',');
        }
        out.push(char::from(b'0' + d));
    }
    out.push('.');
    for d in &digits[split..] {
        out.push(char::from(b'0' + d));
    }
    out
}

/// Text written for one field.
pub fn export_value(value: FieldValue<'_>) -> String {
    match value {
        FieldValue::Text(s) => s.to_string(),
        FieldValue::Number(n) => {
            let plain = number_to_string(n);
            if plain.contains('.') || n > 1000.0 {
                format_currency(n)
            } else {
                plain
            }
        }
    }
}

/// Serialize `records` with fields in `columns` order.
///
/// Columns a record does not have are written as empty fields.
pub fn export_csv<'a, T, I>(records: I, columns: &[&str], options: &ExportOptions) -> String
where
    T: Tabular + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut lines: Vec<String> = Vec::new();

    if options.include_header {
        lines.push(columns.join(","));
    }

    for record in records {
        let line: Vec<String> = columns
            .iter()
            .map(|col| record.field(col).map(export_value).unwrap_or_default())
            .collect();
        lines.push(line.join(","));
    }

    lines.join("\n")
}

/// `{sectionKey}_{YYYY-MM-DD}.csv`
pub fn export_filename(section: Section, date: NaiveDate) -> String {
    format!("{}_{}.csv", section.key(), date.format("%Y-%m-%d"))
}

/// Filename for an export made now (UTC date).
pub fn export_filename_today(section: Section) -> String {
    export_filename(section, chrono::Utc::now().date_naive())
}

/// Write an export into `dir`, returning the full path.
pub fn write_export(dir: &Path, filename: &str, content: &str) -> ExportResult<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(filename);
    std::fs::write(&path, content)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PriceChange, ProductRecord};

    fn rec(part: &str, desc: &str, price: f64, cost: f64) -> ProductRecord {
        ProductRecord {
            part_number: part.into(),
            secondary_number: "N1".into(),
            description: desc.into(),
            list_price: price,
            unit_cost: cost,
        }
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(1234.5), "1,234.50");
        assert_eq!(format_currency(0.5), "0.50");
        assert_eq!(format_currency(1_234_567.891), "1,234,567.89");
        assert_eq!(format_currency(1.005), "1.01");
        assert_eq!(format_currency(2.675), "2.68");
        assert_eq!(format_currency(1.045), "1.05");
        assert_eq!(format_currency(0.004), "0.00");
        assert_eq!(format_currency(0.005), "0.01");
        assert_eq!(format_currency(-1.005), "-1.01");
        assert_eq!(format_currency(1e21), "1,000,000,000,000,000,000,000.00");
        assert_eq!(format_currency(999.995), "1,000.00");
        assert_eq!(format_currency(999.996), "1,000.00");
        assert_eq!(format_currency(0.125), "0.13");
        assert_eq!(format_currency(-5.5), "-5.50");
        assert_eq!(format_currency(100.0), "100.00");
        assert_eq!(format_currency(0.0), "0.00");
    }

    #[test]
    fn test_export_value_rule() {
        assert_eq!(export_value(FieldValue::Number(1234.5)), "1,234.50");
        assert_eq!(export_value(FieldValue::Number(500.0)), "500");
        assert_eq!(export_value(FieldValue::Number(1000.0)), "1000");
        assert_eq!(export_value(FieldValue::Number(1001.0)), "1,001.00");
        assert_eq!(export_value(FieldValue::Number(12.5)), "12.50");
        assert_eq!(export_value(FieldValue::Number(-2.0)), "-2");
        assert_eq!(export_value(FieldValue::Number(1e-7)), "1e-7");
        assert_eq!(export_value(FieldValue::Number(1.5e-7)), "0.00");
        assert_eq!(export_value(FieldValue::Text("=A1")), "=A1");
    }

    #[test]
    fn test_export_records() {
        let records = vec![rec("A1", "Bolt", 1234.5, 500.0), rec("B2", "Nut", 3.0, 0.25)];

        let csv = export_csv(&records, ProductRecord::COLUMNS, &ExportOptions::default());
        assert_eq!(csv, "A1,N1,Bolt,1,234.50,500\nB2,N1,Nut,3,0.25");
    }

    #[test]
    fn test_export_with_header() {
        let records = vec![rec("A1", "Bolt", 2.0, 1.0)];
        let options = ExportOptions { include_header: true };

        let csv = export_csv(&records, &["PartNumber", "Cost"], &options);
        assert_eq!(csv, "PartNumber,Cost\nA1,1");
    }

    #[test]
    fn test_export_price_changes_all_fields() {
        let change = PriceChange::between(&rec("A1", "Bolt", 10.0, 4.0), &rec("A1", "Bolt", 12.0, 4.5)).unwrap();

        let csv = export_csv([&change], PriceChange::COLUMNS, &ExportOptions::default());
        assert_eq!(csv, "A1,N1,Bolt,10,12,2,4,4.50,0.50");
    }

    #[test]
    fn test_delimiters_are_not_escaped() {
        let records = vec![rec("A1", "Bolt, hex", 1.0, 1.0)];
        let csv = export_csv(&records, &["PartNumber", "LongDescription"], &ExportOptions::default());
        assert_eq!(csv, "A1,Bolt, hex");
    }

    #[test]
    fn test_empty_export() {
        let records: Vec<ProductRecord> = Vec::new();
        assert_eq!(export_csv(&records, ProductRecord::COLUMNS, &ExportOptions::default()), "");
    }

    #[test]
    fn test_export_filename() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(export_filename(Section::PriceChanges, date), "priceChanges_2024-03-09.csv");
        assert!(export_filename_today(Section::Discontinued).starts_with("discontinued_"));
    }

    #[test]
    fn test_write_export() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("exports");

        let path = write_export(&out, "newProducts_2024-01-01.csv", "A1,N1").unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "A1,N1");
    }
}
