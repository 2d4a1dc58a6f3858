//! In-memory state of one comparison session.
//!
//! A [`Session`] holds the two uploaded snapshots, the status line, the
//! latest results and, for each result section, whether it is expanded
//! and how it is filtered, sorted and paged. Every operation catches its
//! own failure and turns it into the status line; the returned `Result`
//! only tells the caller whether to react.
//!
//! ```text
//! load(Old) ─┐
//!            ├─▶ compare() ─▶ results ─▶ page(section) / export(section)
//! load(New) ─┘
//! ```

use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use crate::compare::{compare_snapshots, CompareOptions, Reconciliation};
use crate::error::{ParseError, ProcessingError, ProcessingResult};
use crate::export::{export_csv, export_filename_today};
use crate::logs::{log_error, log_info, log_success, log_warning};
use crate::models::{Section, Tabular};
use crate::parser::{parse_bytes_auto, ParseResult, RawRow};
use crate::view::{display_rows, filter_rows, page_count, paginate, FilterConfig, ViewState};

pub const PROCESSING_MESSAGE: &str = "Processing files... this may take a few moments.";

/// Which snapshot a file fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    Old,
    New,
}

impl Slot {
    pub fn label(&self) -> &'static str {
        match self {
            Slot::Old => "old",
            Slot::New => "new",
        }
    }
}

/// A parsed input file.
#[derive(Debug, Clone)]
pub struct LoadedFile {
    pub name: String,
    pub encoding: String,
    pub delimiter: char,
    pub headers: Vec<String>,
    pub rows: Arc<[RawRow]>,
}

impl LoadedFile {
    fn from_parsed(name: String, parsed: ParseResult) -> Self {
        Self {
            name,
            encoding: parsed.encoding,
            delimiter: parsed.delimiter,
            headers: parsed.headers,
            rows: parsed.rows.into(),
        }
    }
}

/// UI state of one result section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionState {
    pub expanded: bool,
    pub view: ViewState,
}

/// Rendered page of a section, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionPage {
    pub section: Section,
    pub title: &'static str,
    pub columns: &'static [&'static str],
    pub cells: Vec<Vec<String>>,
    pub page: usize,
    pub page_count: usize,
    /// Rows after filtering
    pub matched: usize,
    /// Rows in the section
    pub total: usize,
}

/// An export ready to be saved or downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub filename: String,
    pub content: String,
}

/// One comparison session.
#[derive(Debug)]
pub struct Session {
    options: CompareOptions,
    old: Option<LoadedFile>,
    new: Option<LoadedFile>,
    status: String,
    results: Option<Reconciliation>,
    sections: [SectionState; 3],
}

impl Default for Session {
    fn default() -> Self {
        Self::new(CompareOptions::default())
    }
}

impl Session {
    pub fn new(options: CompareOptions) -> Self {
        Self {
            options,
            old: None,
            new: None,
            status: String::new(),
            results: None,
            sections: Default::default(),
        }
    }

    pub fn options(&self) -> &CompareOptions {
        &self.options
    }

    /// Current status line; empty until something happens.
    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn file(&self, slot: Slot) -> Option<&LoadedFile> {
        match slot {
            Slot::Old => self.old.as_ref(),
            Slot::New => self.new.as_ref(),
        }
    }

    pub fn results(&self) -> Option<&Reconciliation> {
        self.results.as_ref()
    }

    // -------------------------------------------------------------------------
    // Loading
    // -------------------------------------------------------------------------

    /// Parse `bytes` into `slot`.
    ///
    /// On failure the status reports the parse error and the slot keeps
    /// whatever it held before. The other slot is never touched.
    pub fn load(&mut self, slot: Slot, name: impl Into<String>, bytes: &[u8]) -> Result<(), ParseError> {
        let name = name.into();
        match parse_bytes_auto(bytes) {
            Ok(parsed) => {
                self.store(slot, name, parsed);
                Ok(())
            }
            Err(e) => {
                self.fail_load(slot, &name, &e);
                Err(e)
            }
        }
    }

    /// Read a file from disk into `slot`.
    pub async fn load_path(&mut self, slot: Slot, path: &Path) -> Result<(), ParseError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        match tokio::fs::read(path).await {
            Ok(bytes) => self.load(slot, name, &bytes),
            Err(e) => {
                let err = ParseError::from(e);
                self.fail_load(slot, &name, &err);
                Err(err)
            }
        }
    }

    fn store(&mut self, slot: Slot, name: String, parsed: ParseResult) {
        let missing = self.options.columns.missing_from(&parsed.headers);
        if !missing.is_empty() {
            log_warning(format!("{}: missing columns {}", name, missing.join(", ")));
        }
        log_success(format!(
            "Loaded {} file {} ({} rows, {}, delimiter {:?})",
            slot.label(),
            name,
            parsed.rows.len(),
            parsed.encoding,
            parsed.delimiter
        ));

        let file = LoadedFile::from_parsed(name, parsed);
        match slot {
            Slot::Old => self.old = Some(file),
            Slot::New => self.new = Some(file),
        }
    }

    fn fail_load(&mut self, slot: Slot, name: &str, err: &ParseError) {
        log_error(format!("Cannot load {} file {}: {}", slot.label(), name, err));
        self.status = format!("Error parsing CSV: {}", err);
    }

    // -------------------------------------------------------------------------
    // Comparison
    // -------------------------------------------------------------------------

    /// Compare the loaded snapshots. An empty slot counts as an empty file.
    ///
    /// Results replace the previous ones; on failure they are cleared.
    pub async fn compare(&mut self) -> Result<(), ProcessingError> {
        self.status = PROCESSING_MESSAGE.to_string();
        log_info(PROCESSING_MESSAGE);

        let old_rows = self.rows(Slot::Old);
        let new_rows = self.rows(Slot::New);

        let outcome = compare_snapshots(old_rows, new_rows, &self.options).await;
        self.finish_compare(outcome)
    }

    fn finish_compare(&mut self, outcome: ProcessingResult<Reconciliation>) -> Result<(), ProcessingError> {
        match outcome {
            Ok(result) => {
                self.status = format!(
                    "Comparison complete! Found {} new products, {} discontinued products, and {} price changes.",
                    result.added.len(),
                    result.discontinued.len(),
                    result.changed.len()
                );
                self.results = Some(result);
                for state in &mut self.sections {
                    state.view.go_to_page(1);
                }
                Ok(())
            }
            Err(e) => {
                log_error(format!("Error during comparison: {}", e));
                self.status = format!("Error processing files: {}", e);
                self.results = None;
                Err(e)
            }
        }
    }

    fn rows(&self, slot: Slot) -> Arc<[RawRow]> {
        match self.file(slot) {
            Some(file) => Arc::clone(&file.rows),
            None => {
                log_warning(format!("No {} file loaded, comparing against an empty file", slot.label()));
                Arc::from(Vec::new())
            }
        }
    }

    // -------------------------------------------------------------------------
    // Sections
    // -------------------------------------------------------------------------

    /// Sections that have at least one row.
    pub fn visible_sections(&self) -> Vec<Section> {
        Section::ALL
            .into_iter()
            .filter(|s| self.section_len(*s) > 0)
            .collect()
    }

    /// Rows in a section, before filtering.
    pub fn section_len(&self, section: Section) -> usize {
        self.results.as_ref().map_or(0, |r| match section {
            Section::NewProducts => r.added.len(),
            Section::Discontinued => r.discontinued.len(),
            Section::PriceChanges => r.changed.len(),
        })
    }

    pub fn section_state(&self, section: Section) -> &SectionState {
        &self.sections[section.index()]
    }

    pub fn toggle_section(&mut self, section: Section) {
        let state = &mut self.sections[section.index()];
        state.expanded = !state.expanded;
    }

    pub fn set_filter(&mut self, section: Section, filter: FilterConfig) {
        self.sections[section.index()].view.set_filter(filter);
    }

    pub fn toggle_sort(&mut self, section: Section, column: &str) {
        self.sections[section.index()].view.toggle_sort(column);
    }

    pub fn next_page(&mut self, section: Section) {
        let matched = self.matched(section);
        let page_size = self.options.page_size;
        self.sections[section.index()].view.next_page(matched, page_size);
    }

    pub fn prev_page(&mut self, section: Section) {
        self.sections[section.index()].view.prev_page();
    }

    pub fn go_to_page(&mut self, section: Section, page: usize) {
        self.sections[section.index()].view.go_to_page(page);
    }

    /// Rows left in a section after its filter.
    pub fn matched(&self, section: Section) -> usize {
        let filter = &self.section_state(section).view.filter;
        self.results.as_ref().map_or(0, |r| match section {
            Section::NewProducts => filter_rows(&r.added, filter).len(),
            Section::Discontinued => filter_rows(&r.discontinued, filter).len(),
            Section::PriceChanges => filter_rows(&r.changed, filter).len(),
        })
    }

    /// Current page of a section, or `None` before any successful comparison.
    pub fn page_rows(&self, section: Section) -> Option<SectionPage> {
        let results = self.results.as_ref()?;
        let view = &self.section_state(section).view;
        let page_size = self.options.page_size;

        Some(match section {
            Section::NewProducts => render_page(section, &results.added, view, page_size),
            Section::Discontinued => render_page(section, &results.discontinued, view, page_size),
            Section::PriceChanges => render_page(section, &results.changed, view, page_size),
        })
    }

    /// Export a section. With `filtered`, the section's filter and sort are
    /// applied first (no pagination); otherwise every row is written in
    /// result order.
    pub fn export(&self, section: Section, filtered: bool) -> Option<ExportFile> {
        let results = self.results.as_ref()?;
        let view = &self.section_state(section).view;

        let content = match section {
            Section::NewProducts => self.export_rows(section, &results.added, view, filtered),
            Section::Discontinued => self.export_rows(section, &results.discontinued, view, filtered),
            Section::PriceChanges => self.export_rows(section, &results.changed, view, filtered),
        };

        Some(ExportFile {
            filename: export_filename_today(section),
            content,
        })
    }

    fn export_rows<T: Tabular>(&self, section: Section, rows: &[T], view: &ViewState, filtered: bool) -> String {
        let columns = section.export_columns();
        if filtered {
            export_csv(view.arrange(rows), columns, &self.options.export)
        } else {
            export_csv(rows, columns, &self.options.export)
        }
    }
}

fn render_page<T: Tabular>(section: Section, rows: &[T], view: &ViewState, page_size: usize) -> SectionPage {
    let arranged = view.arrange(rows);
    let columns = section.display_columns();

    SectionPage {
        section,
        title: section.title(),
        columns,
        cells: display_rows(paginate(&arranged, page_size, view.page), columns),
        page: view.page,
        page_count: page_count(arranged.len(), page_size),
        matched: arranged.len(),
        total: rows.len(),
    }
}
