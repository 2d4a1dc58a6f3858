//! Filter → sort → paginate over one result section.
//!
//! All three steps are pure and work on any [`Tabular`] record. A
//! [`ViewState`] bundles the per-section settings and applies them in that
//! fixed order.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::export::format_currency;
use crate::models::{FieldValue, Tabular};

/// Rows per page.
pub const PAGE_SIZE: usize = 50;

// =============================================================================
// Filter
// =============================================================================

/// Case-insensitive substring filter on one column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterConfig {
    pub column: String,
    pub search_term: String,
}

impl FilterConfig {
    pub fn new(column: impl Into<String>, search_term: impl Into<String>) -> Self {
        Self { column: column.into(), search_term: search_term.into() }
    }

    /// Whether this filter removes anything at all.
    pub fn is_active(&self) -> bool {
        !self.search_term.is_empty() && !self.column.is_empty()
    }
}

/// Keep rows whose `column` value contains the search term, ignoring case.
///
/// An empty term, or a term with no column selected, keeps every row. A
/// column the records do not have matches nothing.
pub fn filter_rows<'a, T: Tabular>(rows: &'a [T], config: &FilterConfig) -> Vec<&'a T> {
    if !config.is_active() {
        return rows.iter().collect();
    }

    let needle = config.search_term.to_lowercase();
    rows.iter()
        .filter(|row| {
            row.field(&config.column)
                .map(|value| value.to_string().to_lowercase().contains(&needle))
                .unwrap_or(false)
        })
        .collect()
}

// =============================================================================
// Sort
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortConfig {
    pub key: String,
    pub direction: SortDirection,
}

impl SortConfig {
    pub fn new(key: impl Into<String>, direction: SortDirection) -> Self {
        Self { key: key.into(), direction }
    }
}

/// Stable sort by one column. Equal keys keep their input order.
///
/// An empty or unknown key leaves the rows untouched.
pub fn sort_rows<T: Tabular>(rows: &mut [&T], config: &SortConfig) {
    if config.key.is_empty() {
        return;
    }

    rows.sort_by(|a, b| {
        let ord = match (a.field(&config.key), b.field(&config.key)) {
            (Some(x), Some(y)) => x.compare(&y),
            _ => Ordering::Equal,
        };
        match config.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
}

// =============================================================================
// Paginate
// =============================================================================

/// Slice `[(page-1)*size, page*size)`, clamped to the data.
///
/// Page numbers start at 1. Page 0 and pages past the end are empty.
pub fn paginate<T>(data: &[T], page_size: usize, page: usize) -> &[T] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(page_size);
    if start >= data.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(data.len());
    &data[start..end]
}

/// Number of pages needed for `len` rows. Zero rows is zero pages.
pub fn page_count(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    len.div_ceil(page_size)
}

// =============================================================================
// View State
// =============================================================================

/// Filter, sort and page of one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub filter: FilterConfig,
    pub sort: SortConfig,
    pub page: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            filter: FilterConfig::default(),
            sort: SortConfig::default(),
            page: 1,
        }
    }
}

/// One rendered page of a section.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a, T> {
    pub rows: Vec<&'a T>,
    /// 1-based page number shown
    pub page: usize,
    pub page_count: usize,
    /// Rows left after filtering
    pub matched: usize,
}

impl ViewState {
    /// Filtered and sorted rows, before pagination.
    pub fn arrange<'a, T: Tabular>(&self, rows: &'a [T]) -> Vec<&'a T> {
        let mut arranged = filter_rows(rows, &self.filter);
        sort_rows(&mut arranged, &self.sort);
        arranged
    }

    pub fn apply<'a, T: Tabular>(&self, rows: &'a [T], page_size: usize) -> Page<'a, T> {
        let arranged = self.arrange(rows);
        Page {
            rows: paginate(&arranged, page_size, self.page).to_vec(),
            page: self.page,
            page_count: page_count(arranged.len(), page_size),
            matched: arranged.len(),
        }
    }

    /// Change the filter. Goes back to the first page.
    pub fn set_filter(&mut self, filter: FilterConfig) {
        self.filter = filter;
        self.page = 1;
    }

    /// Header click: ascending first, then flip while the same column is
    /// clicked again.
    pub fn toggle_sort(&mut self, column: &str) {
        let direction = if self.sort.key == column && self.sort.direction == SortDirection::Asc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        self.sort = SortConfig::new(column, direction);
    }

    /// Advance while rows remain past the current page.
    pub fn next_page(&mut self, matched: usize, page_size: usize) {
        if self.page.saturating_mul(page_size) < matched {
            self.page += 1;
        }
    }

    pub fn prev_page(&mut self) {
        self.page = self.page.saturating_sub(1).max(1);
    }

    /// Jump to a page; values below 1 are clamped to 1.
    pub fn go_to_page(&mut self, page: usize) {
        self.page = page.max(1);
    }
}

// =============================================================================
// Display
// =============================================================================

/// Text shown in a results table cell.
///
/// Columns named like a price or cost show as US currency (`$1,234.50`).
pub fn display_value(column: &str, value: FieldValue<'_>) -> String {
    let lower = column.to_lowercase();
    match value {
        FieldValue::Number(n) if lower.contains("price") || lower.contains("cost") => {
            let formatted = format_currency(n);
            match formatted.strip_prefix('-') {
                Some(abs) => format!("-${}", abs),
                None => format!("${}", formatted),
            }
        }
        other => other.to_string(),
    }
}

/// Table cells for `rows`, one `Vec` per row in `columns` order.
pub fn display_rows<T: Tabular>(rows: &[&T], columns: &[&str]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| {
            columns
                .iter()
                .map(|col| row.field(col).map(|v| display_value(col, v)).unwrap_or_default())
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PriceChange, ProductRecord};

    fn rec(part: &str, desc: &str, price: f64) -> ProductRecord {
        ProductRecord {
            part_number: part.into(),
            secondary_number: format!("N{}", part),
            description: desc.into(),
            list_price: price,
            unit_cost: 1.0,
        }
    }

    fn parts<'a>(rows: &[&'a ProductRecord]) -> Vec<&'a str> {
        rows.iter().map(|r| r.part_number.as_str()).collect()
    }

    fn sample() -> Vec<ProductRecord> {
        vec![
            rec("B2", "Oil Filter", 12.5),
            rec("A1", "Brake Pad", 100.0),
            rec("C3", "oil pan", 9.0),
            rec("D4", "Spark plug", 12.5),
        ]
    }

    #[test]
    fn test_empty_term_is_identity() {
        let data = sample();
        let all = filter_rows(&data, &FilterConfig::new("LongDescription", ""));
        assert_eq!(parts(&all), vec!["B2", "A1", "C3", "D4"]);
    }

    #[test]
    fn test_filter_case_insensitive() {
        let data = sample();
        let hits = filter_rows(&data, &FilterConfig::new("LongDescription", "OIL"));
        assert_eq!(parts(&hits), vec!["B2", "C3"]);
    }

    #[test]
    fn test_filter_numeric_column() {
        let data = sample();
        let hits = filter_rows(&data, &FilterConfig::new("JobberPrice", "12.5"));
        assert_eq!(parts(&hits), vec!["B2", "D4"]);

        let hits = filter_rows(&data, &FilterConfig::new("JobberPrice", "100"));
        assert_eq!(parts(&hits), vec!["A1"]);
    }

    #[test]
    fn test_filter_without_column_is_noop() {
        let data = sample();
        let all = filter_rows(&data, &FilterConfig::new("", "oil"));
        assert_eq!(all.len(), 4);
    }

    #[test]
    fn test_filter_unknown_column_matches_nothing() {
        let data = sample();
        assert!(filter_rows(&data, &FilterConfig::new("Warehouse", "oil")).is_empty());
    }

    #[test]
    fn test_sort_text_and_numbers() {
        let data = sample();
        let mut rows: Vec<&ProductRecord> = data.iter().collect();

        sort_rows(&mut rows, &SortConfig::new("PartNumber", SortDirection::Asc));
        assert_eq!(parts(&rows), vec!["A1", "B2", "C3", "D4"]);

        sort_rows(&mut rows, &SortConfig::new("JobberPrice", SortDirection::Desc));
        // B2 and D4 tie and keep their relative order
        assert_eq!(parts(&rows), vec!["A1", "B2", "D4", "C3"]);
    }

    #[test]
    fn test_numbers_sort_numerically() {
        let data = vec![rec("X", "", 100.0), rec("Y", "", 9.0), rec("Z", "", 25.0)];
        let mut rows: Vec<&ProductRecord> = data.iter().collect();

        sort_rows(&mut rows, &SortConfig::new("JobberPrice", SortDirection::Asc));
        assert_eq!(parts(&rows), vec!["Y", "Z", "X"]);
    }

    #[test]
    fn test_sort_is_stable_on_constant_key() {
        let data: Vec<ProductRecord> = (0..200).map(|i| rec(&format!("P{:03}", 199 - i), "", 1.0)).collect();
        let mut rows: Vec<&ProductRecord> = data.iter().collect();
        let before = parts(&rows);

        sort_rows(&mut rows, &SortConfig::new("Cost", SortDirection::Asc));
        assert_eq!(parts(&rows), before);
        sort_rows(&mut rows, &SortConfig::new("Cost", SortDirection::Desc));
        assert_eq!(parts(&rows), before);
    }

    #[test]
    fn test_empty_or_unknown_sort_key_is_identity() {
        let data = sample();
        let mut rows: Vec<&ProductRecord> = data.iter().collect();

        sort_rows(&mut rows, &SortConfig::default());
        assert_eq!(parts(&rows), vec!["B2", "A1", "C3", "D4"]);
        sort_rows(&mut rows, &SortConfig::new("Nope", SortDirection::Desc));
        assert_eq!(parts(&rows), vec!["B2", "A1", "C3", "D4"]);
    }

    #[test]
    fn test_pages_reconstruct_data() {
        for n in [0usize, 1, 49, 50, 51, 149, 150, 173] {
            let data: Vec<usize> = (0..n).collect();
            let mut rebuilt = Vec::new();
            for page in 1..=page_count(n, PAGE_SIZE) {
                rebuilt.extend_from_slice(paginate(&data, PAGE_SIZE, page));
            }
            assert_eq!(rebuilt, data, "n = {}", n);
        }
    }

    #[test]
    fn test_out_of_range_pages_are_empty() {
        let data: Vec<usize> = (0..60).collect();
        assert_eq!(paginate(&data, 50, 2).len(), 10);
        assert!(paginate(&data, 50, 3).is_empty());
        assert!(paginate(&data, 50, 0).is_empty());
        assert!(paginate(&data, 50, usize::MAX).is_empty());
    }

    #[test]
    fn test_view_state_applies_in_order() {
        let data: Vec<ProductRecord> = (0..120)
            .map(|i| rec(&format!("P{:03}", i), if i % 2 == 0 { "even" } else { "odd" }, i as f64))
            .collect();

        let mut view = ViewState::default();
        view.set_filter(FilterConfig::new("LongDescription", "even"));
        view.toggle_sort("JobberPrice");
        view.toggle_sort("JobberPrice");
        assert_eq!(view.sort.direction, SortDirection::Desc);

        let page = view.apply(&data, PAGE_SIZE);
        assert_eq!(page.matched, 60);
        assert_eq!(page.page_count, 2);
        assert_eq!(page.rows.len(), 50);
        assert_eq!(page.rows[0].part_number, "P118");

        view.next_page(page.matched, PAGE_SIZE);
        let page = view.apply(&data, PAGE_SIZE);
        assert_eq!(page.page, 2);
        assert_eq!(page.rows.len(), 10);
        assert_eq!(page.rows[9].part_number, "P000");

        // Already on the last page
        view.next_page(page.matched, PAGE_SIZE);
        assert_eq!(view.page, 2);

        view.prev_page();
        view.prev_page();
        assert_eq!(view.page, 1);
    }

    #[test]
    fn test_toggle_sort_new_column_starts_ascending() {
        let mut view = ViewState::default();
        view.toggle_sort("Cost");
        view.toggle_sort("Cost");
        view.toggle_sort("PartNumber");
        assert_eq!(view.sort, SortConfig::new("PartNumber", SortDirection::Asc));
    }

    #[test]
    fn test_filter_resets_page() {
        let mut view = ViewState::default();
        view.go_to_page(4);
        view.set_filter(FilterConfig::new("PartNumber", "a"));
        assert_eq!(view.page, 1);
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value("JobberPrice", FieldValue::Number(1234.5)), "$1,234.50");
        assert_eq!(display_value("PriceDifference", FieldValue::Number(-5.0)), "-$5.00");
        assert_eq!(display_value("Cost", FieldValue::Number(3.0)), "$3.00");
        assert_eq!(display_value("PartNumber", FieldValue::Text("A1")), "A1");
    }

    #[test]
    fn test_display_rows_for_price_changes() {
        let change = PriceChange::between(&rec("A1", "", 10.0), &rec("A1", "", 12.0)).unwrap();
        let cells = display_rows(&[&change], crate::models::Section::PriceChanges.display_columns());
        assert_eq!(cells, vec![vec!["A1", "NA1", "$10.00", "$12.00", "$2.00"]]);
    }
}
