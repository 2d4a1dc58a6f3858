//! Delimited-text reader with encoding and delimiter auto-detection.
//!
//! Turns an inventory export into [`RawRow`]s keyed by the header row.
//! No inventory-specific logic here: field cleanup and typing happen in
//! [`crate::compare::normalize`].

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::path::Path;
use std::sync::Arc;

use crate::error::{InputResult, ParseError};

/// One data row, as decoded from the file.
///
/// Values are kept exactly as the CSV reader produced them (quotes of
/// quoted fields removed, nothing trimmed). Rows shorter than the header
/// read the missing columns as empty strings.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    headers: Arc<[String]>,
    values: Vec<String>,
}

impl RawRow {
    pub fn new(headers: Arc<[String]>, mut values: Vec<String>) -> Self {
        values.resize(headers.len(), String::new());
        Self { headers, values }
    }

    /// Build a row from `(column, value)` pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let (headers, values): (Vec<String>, Vec<String>) = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .unzip();
        Self {
            headers: headers.into(),
            values,
        }
    }

    /// Value of `column`, if the file has such a column.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.headers
            .iter()
            .position(|h| h == column)
            .map(|i| self.values[i].as_str())
    }

    /// Columns in header order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .zip(self.values.iter())
            .map(|(h, v)| (h.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Serialize for RawRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (column, value) in self.iter() {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Data rows, blank lines removed
    pub rows: Vec<RawRow>,
    /// Detected or used encoding
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: char,
    /// Column headers
    pub headers: Vec<String>,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    if std::str::from_utf8(bytes).is_ok() {
        return "utf-8".to_string();
    }

    let charset = chardet::detect(bytes).0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding.
///
/// Unknown labels fall back to lossy UTF-8. A leading byte-order mark is
/// dropped.
pub fn decode_content(bytes: &[u8], encoding: &str) -> InputResult<String> {
    let decoded = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8_lossy(bytes).into_owned(),
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.into_owned()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        label => match encoding_rs::Encoding::for_label(label.as_bytes()) {
            Some(enc) => {
                let (text, _, had_errors) = enc.decode(bytes);
                if had_errors {
                    return Err(ParseError::Encoding(format!(
                        "content is not valid {}",
                        enc.name()
                    )));
                }
                text.into_owned()
            }
            None => String::from_utf8_lossy(bytes).into_owned(),
        },
    };

    Ok(match decoded.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => decoded,
    })
}

/// Detect the delimiter by counting occurrences in the first line.
///
/// Ties and header lines without any separator resolve to `,`.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse CSV text with an explicit delimiter.
///
/// The first record is the header row. Lines with no content are skipped.
pub fn parse_str(content: &str, delimiter: char) -> InputResult<Vec<RawRow>> {
    parse_with_headers(content, delimiter).map(|(_, rows)| rows)
}

fn parse_with_headers(content: &str, delimiter: char) -> InputResult<(Vec<String>, Vec<RawRow>)> {
    if content.trim().is_empty() {
        return Err(ParseError::EmptyFile);
    }

    let delim = u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or(ParseError::InvalidDelimiter(delimiter))?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delim)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(ParseError::NoHeaders);
    }

    let shared: Arc<[String]> = headers.clone().into();
    let mut rows = Vec::new();

    for record in reader.records() {
        let record = record?;

        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        let values = record
            .iter()
            .take(shared.len())
            .map(str::to_string)
            .collect();
        rows.push(RawRow::new(Arc::clone(&shared), values));
    }

    Ok((headers, rows))
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> InputResult<ParseResult> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);
    parse_string_with_metadata(&content, delimiter, encoding)
}

/// Parse CSV text with explicit delimiter and return metadata.
pub fn parse_string_with_metadata(
    content: &str,
    delimiter: char,
    encoding: String,
) -> InputResult<ParseResult> {
    let (headers, rows) = parse_with_headers(content, delimiter)?;

    Ok(ParseResult {
        rows,
        encoding,
        delimiter,
        headers,
    })
}

/// Read and parse an inventory file with auto-detection.
pub async fn parse_file_auto<P: AsRef<Path>>(path: P) -> InputResult<ParseResult> {
    let bytes = tokio::fs::read(path.as_ref()).await?;
    parse_bytes_auto(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_csv() {
        let csv = "name,age\nAlice,30\nBob,25";
        let rows = parse_str(csv, ',').unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("name"), Some("Alice"));
        assert_eq!(rows[0].get("age"), Some("30"));
        assert_eq!(rows[1].get("name"), Some("Bob"));
        assert_eq!(rows[1].get("age"), Some("25"));
    }

    #[test]
    fn test_semicolon_delimiter() {
        let csv = "a;b;c\n1;2;3";
        let rows = parse_str(csv, ';').unwrap();

        assert_eq!(rows[0].get("a"), Some("1"));
        assert_eq!(rows[0].get("b"), Some("2"));
        assert_eq!(rows[0].get("c"), Some("3"));
    }

    #[test]
    fn test_quoted_values_keep_embedded_delimiter() {
        let csv = "PartNumber,LongDescription\n\"A1\",\"Bolt, hex\"";
        let rows = parse_str(csv, ',').unwrap();

        assert_eq!(rows[0].get("PartNumber"), Some("A1"));
        assert_eq!(rows[0].get("LongDescription"), Some("Bolt, hex"));
    }

    #[test]
    fn test_excel_formula_artifacts_survive_parsing() {
        let csv = "PartNumber,NTPProductNumber\n=\"00123\",=\"N-9\"";
        let rows = parse_str(csv, ',').unwrap();

        assert_eq!(rows[0].get("PartNumber"), Some("=\"00123\""));
        assert_eq!(rows[0].get("NTPProductNumber"), Some("=\"N-9\""));
    }

    #[test]
    fn test_empty_lines_skipped() {
        let csv = "a,b\n1,2\n\n3,4\n,\n";
        let rows = parse_str(csv, ',').unwrap();

        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_missing_values() {
        let csv = "a,b,c\n1,,3\n4";
        let rows = parse_str(csv, ',').unwrap();

        assert_eq!(rows[0].get("b"), Some(""));
        assert_eq!(rows[1].get("a"), Some("4"));
        assert_eq!(rows[1].get("c"), Some(""));
    }

    #[test]
    fn test_extra_columns_ignored() {
        let csv = "a,b\n1,2,3,4";
        let rows = parse_str(csv, ',').unwrap();

        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[0].get("b"), Some("2"));
    }

    #[test]
    fn test_unknown_column() {
        let rows = parse_str("a\n1", ',').unwrap();
        assert_eq!(rows[0].get("z"), None);
    }

    #[test]
    fn test_empty_csv_error() {
        assert!(matches!(parse_str("", ','), Err(ParseError::EmptyFile)));
        assert!(matches!(parse_str(" \n\n", ','), Err(ParseError::EmptyFile)));
    }

    #[test]
    fn test_blank_header_error() {
        assert!(matches!(parse_str(",,\n1,2,3", ','), Err(ParseError::NoHeaders)));
    }

    #[test]
    fn test_non_ascii_delimiter_rejected() {
        assert!(matches!(
            parse_str("a§b\n1§2", '§'),
            Err(ParseError::InvalidDelimiter('§'))
        ));
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
        assert_eq!(detect_delimiter("a|b|c\n1|2|3"), '|');
        assert_eq!(detect_delimiter("single"), ',');
    }

    #[test]
    fn test_auto_parse() {
        let csv = "PartNumber;Cost\nA1;10\nB2;5";
        let result = parse_bytes_auto(csv.as_bytes()).unwrap();

        assert_eq!(result.delimiter, ';');
        assert_eq!(result.encoding, "utf-8");
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.headers, vec!["PartNumber", "Cost"]);
    }

    #[test]
    fn test_bom_is_stripped() {
        let bytes = b"\xEF\xBB\xBFPartNumber,Cost\nA1,10";
        let result = parse_bytes_auto(bytes).unwrap();
        assert_eq!(result.headers[0], "PartNumber");
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1").unwrap();
        assert_eq!(decoded, "Société");
    }

    #[test]
    fn test_row_serializes_in_header_order() {
        let rows = parse_str("z,a\n1,2", ',').unwrap();
        let json = serde_json::to_string(&rows[0]).unwrap();
        assert_eq!(json, r#"{"z":"1","a":"2"}"#);
    }

    #[tokio::test]
    async fn test_parse_file_auto() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.csv");
        std::fs::write(&path, "PartNumber,Cost\nA1,10\n").unwrap();

        let result = parse_file_auto(&path).await.unwrap();
        assert_eq!(result.rows.len(), 1);

        let missing = parse_file_auto(dir.path().join("nope.csv")).await;
        assert!(matches!(missing, Err(ParseError::Io(_))));
    }
}
