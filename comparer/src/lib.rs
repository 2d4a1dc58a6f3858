//! # Inventory Comparer - diff two product catalog snapshots
//!
//! Loads two delimited inventory exports (an older and a newer snapshot),
//! normalizes their rows into product records and classifies every part as
//! new, discontinued or price-changed. Result sections can be filtered,
//! sorted, paged and exported back to CSV.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Old / New  │────▶│   Parser    │────▶│  Normalize  │────▶│  Reconcile  │
//! │  CSV files  │     │  (auto-enc) │     │  (records)  │     │ (3 sections)│
//! └─────────────┘     └─────────────┘     └─────────────┘     └──────┬──────┘
//!                                                                    │
//!                                  ┌─────────────┐     ┌─────────────┴─────┐
//!                                  │   Export    │◀────│  View (filter,    │
//!                                  │   (CSV)     │     │  sort, paginate)  │
//!                                  └─────────────┘     └───────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use inventory_comparer::{Section, Session, Slot};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut session = Session::default();
//!     session.load_path(Slot::Old, "march.csv".as_ref()).await.unwrap();
//!     session.load_path(Slot::New, "april.csv".as_ref()).await.unwrap();
//!     session.compare().await.unwrap();
//!     println!("{}", session.status());
//!
//!     if let Some(file) = session.export(Section::PriceChanges, false) {
//!         std::fs::write(&file.filename, file.content).unwrap();
//!     }
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models (ProductRecord, PriceChange, Section)
//! - [`parser`] - CSV parsing with auto-detection
//! - [`compare`] - Normalization, reconciliation and the deferred pipeline
//! - [`view`] - Filter, sort and pagination of result sections
//! - [`export`] - Section export to CSV text
//! - [`session`] - Comparison session state and status line
//! - [`logs`] - Progress log broadcaster

// Core modules
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Comparison
pub mod compare;

// Presentation
pub mod export;
pub mod view;

// Session
pub mod session;

// Logging
pub mod logs;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ComparerError,
    ComparerResult,
    ConfigError,
    ExportError,
    InputResult,
    ParseError,
    ProcessingError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    FieldValue,
    PriceChange,
    ProductRecord,
    Section,
    Tabular,
};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_content,
    detect_delimiter,
    detect_encoding,
    parse_bytes_auto,
    parse_file_auto,
    parse_str,
    ParseResult,
    RawRow,
};

// =============================================================================
// Re-exports - Comparison
// =============================================================================

pub use compare::{
    compare_snapshots,
    normalize,
    normalize_dataset,
    reconcile,
    ColumnMapping,
    CompareOptions,
    ComparisonSummary,
    Reconciliation,
};

// =============================================================================
// Re-exports - View & Export
// =============================================================================

pub use view::{
    filter_rows,
    paginate,
    sort_rows,
    FilterConfig,
    SortConfig,
    SortDirection,
    ViewState,
    PAGE_SIZE,
};

pub use export::{export_csv, export_filename, format_currency, write_export, ExportOptions};

// =============================================================================
// Re-exports - Session
// =============================================================================

pub use session::{ExportFile, LoadedFile, SectionPage, Session, Slot};
