//! Inventory Comparer CLI - diff two catalog snapshots
//!
//! # Main Commands
//!
//! ```bash
//! invcompare compare old.csv new.csv                  # Summary + first page of each section
//! invcompare compare old.csv new.csv --section priceChanges --sort PriceDifference --desc
//! invcompare export old.csv new.csv --section discontinued --out-dir exports/
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! invcompare parse input.csv                          # Decode a file and print raw rows as JSON
//! ```

use clap::{Args, Parser, Subcommand};
use inventory_comparer::logs::log_warning;
use inventory_comparer::{
    parse_file_auto, write_export, CompareOptions, ComparerError, ComparerResult, ExportError, FilterConfig, ParseError,
    Section, SectionPage, Session, Slot,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "invcompare")]
#[command(about = "Compare two inventory snapshots: new, discontinued and price-changed parts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a CSV file and output its rows as JSON
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compare two snapshots and print the result sections
    Compare {
        /// Older snapshot
        old: PathBuf,

        /// Newer snapshot
        new: PathBuf,

        /// Only show this section (newProducts, discontinued, priceChanges)
        #[arg(short, long, value_parser = parse_section)]
        section: Option<Section>,

        #[command(flatten)]
        view: ViewArgs,

        /// Page to show
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// Rows per page (overrides the options file)
        #[arg(long)]
        page_size: Option<usize>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,

        /// Options file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Compare two snapshots and write one section to a CSV file
    Export {
        /// Older snapshot
        old: PathBuf,

        /// Newer snapshot
        new: PathBuf,

        /// Section to export (newProducts, discontinued, priceChanges)
        #[arg(short, long, value_parser = parse_section)]
        section: Section,

        /// Output directory
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        /// Write column names as the first line
        #[arg(long)]
        header: bool,

        #[command(flatten)]
        view: ViewArgs,

        /// Options file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

/// Filter and sort flags shared by `compare` and `export`.
#[derive(Args, Debug, Default)]
struct ViewArgs {
    /// Column to filter on
    #[arg(long, requires = "search")]
    filter_column: Option<String>,

    /// Case-insensitive search term
    #[arg(long, requires = "filter_column")]
    search: Option<String>,

    /// Column to sort by
    #[arg(long)]
    sort: Option<String>,

    /// Sort descending
    #[arg(long, requires = "sort")]
    desc: bool,
}

impl ViewArgs {
    fn is_set(&self) -> bool {
        self.filter_column.is_some() || self.sort.is_some()
    }

    fn apply(&self, session: &mut Session, section: Section) {
        if let (Some(column), Some(term)) = (&self.filter_column, &self.search) {
            if !section.export_columns().contains(&column.as_str()) {
                log_warning(format!("{}: no column named {}", section, column));
            }
            session.set_filter(section, FilterConfig::new(column.as_str(), term.as_str()));
        }
        if let Some(key) = &self.sort {
            session.toggle_sort(section, key);
            if self.desc {
                session.toggle_sort(section, key);
            }
        }
    }
}

fn parse_section(value: &str) -> Result<Section, String> {
    Section::from_key(value).ok_or_else(|| {
        format!("unknown section '{}' (expected newProducts, discontinued or priceChanges)", value)
    })
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Parse { input, output } => cmd_parse(&input, output.as_deref()).await,

        Commands::Compare {
            old,
            new,
            section,
            view,
            page,
            page_size,
            json,
            config,
        } => cmd_compare(&old, &new, section, &view, page, page_size, json, config.as_deref()).await,

        Commands::Export {
            old,
            new,
            section,
            out_dir,
            header,
            view,
            config,
        } => cmd_export(&old, &new, section, &out_dir, header, &view, config.as_deref()).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn cmd_parse(input: &Path, output: Option<&Path>) -> ComparerResult<()> {
    eprintln!("📄 Parsing CSV: {}", input.display());

    let result = parse_file_auto(input).await?;

    eprintln!("   Encoding: {}", result.encoding);
    eprintln!("   Delimiter: '{}'", format_delimiter(result.delimiter));
    eprintln!("   Columns: {}", result.headers.join(", "));
    eprintln!("✅ Parsed {} rows", result.rows.len());

    let json = serde_json::to_string_pretty(&result.rows)?;
    write_output(&json, output)?;

    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn cmd_compare(
    old: &Path,
    new: &Path,
    section: Option<Section>,
    view: &ViewArgs,
    page: usize,
    page_size: Option<usize>,
    json: bool,
    config: Option<&Path>,
) -> ComparerResult<()> {
    let mut options = load_options(config)?;
    if let Some(size) = page_size {
        options.page_size = size;
    }
    options.validate()?;

    let mut session = open_session(old, new, options).await?;

    let targets: Vec<Section> = match section {
        Some(s) => vec![s],
        None => Section::ALL.to_vec(),
    };
    for &target in &targets {
        view.apply(&mut session, target);
        session.go_to_page(target, page);
    }

    let visible: Vec<Section> = session
        .visible_sections()
        .into_iter()
        .filter(|s| targets.contains(s))
        .collect();
    let pages: Vec<SectionPage> = visible.iter().filter_map(|s| session.page_rows(*s)).collect();

    if json {
        let summary = session.results().map(|r| &r.summary);
        let out = serde_json::json!({
            "status": session.status(),
            "summary": summary,
            "sections": pages,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{}", session.status());
    if pages.is_empty() {
        println!("\nNo differences found.");
    }
    for page in &pages {
        println!();
        print_section(page);
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn cmd_export(
    old: &Path,
    new: &Path,
    section: Section,
    out_dir: &Path,
    header: bool,
    view: &ViewArgs,
    config: Option<&Path>,
) -> ComparerResult<()> {
    let mut options = load_options(config)?;
    if header {
        options.export.include_header = true;
    }

    let mut session = open_session(old, new, options).await?;
    eprintln!("   {}", session.status());

    view.apply(&mut session, section);
    let filtered = view.is_set();

    let file = session
        .export(section, filtered)
        .ok_or_else(|| ComparerError::InvalidArgument("no comparison results to export".to_string()))?;

    let path = write_export(out_dir, &file.filename, &file.content)?;
    let rows = if file.content.is_empty() { 0 } else { file.content.lines().count() };
    eprintln!("💾 {} written to: {} ({} lines)", section.title(), path.display(), rows);

    Ok(())
}

fn load_options(config: Option<&Path>) -> ComparerResult<CompareOptions> {
    match config {
        Some(path) => {
            eprintln!("⚙️  Options: {}", path.display());
            Ok(CompareOptions::from_json_file(path)?)
        }
        None => Ok(CompareOptions::default()),
    }
}

/// Read both snapshots concurrently, load them and run the comparison.
async fn open_session(old: &Path, new: &Path, options: CompareOptions) -> ComparerResult<Session> {
    eprintln!("📄 Old: {}", old.display());
    eprintln!("📄 New: {}", new.display());

    let (old_bytes, new_bytes) = tokio::join!(tokio::fs::read(old), tokio::fs::read(new));

    let mut session = Session::new(options);
    let old_bytes = old_bytes.map_err(ParseError::from)?;
    let new_bytes = new_bytes.map_err(ParseError::from)?;
    session.load(Slot::Old, file_label(old), &old_bytes)?;
    session.load(Slot::New, file_label(new), &new_bytes)?;

    session.compare().await?;
    Ok(session)
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_section(page: &SectionPage) {
    if page.matched == page.total {
        println!("== {} ({}) ==", page.title, page.total);
    } else {
        println!("== {} ({} of {} matching) ==", page.title, page.matched, page.total);
    }

    if page.cells.is_empty() {
        println!("   (no rows on this page)");
    } else {
        let mut widths: Vec<usize> = page.columns.iter().map(|c| c.chars().count()).collect();
        for row in &page.cells {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.chars().count());
            }
        }

        let header: Vec<&str> = page.columns.to_vec();
        println!("{}", format_row(&header, &widths));
        println!("{}", widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("-+-"));
        for row in &page.cells {
            let cells: Vec<&str> = row.iter().map(String::as_str).collect();
            println!("{}", format_row(&cells, &widths));
        }
    }

    println!("Page {} of {}", page.page, page.page_count.max(1));
}

fn format_row(cells: &[&str], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, w)| format!("{:<width$}", cell, width = *w))
        .collect::<Vec<_>>()
        .join(" | ")
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

fn write_output(content: &str, path: Option<&Path>) -> ComparerResult<()> {
    match path {
        Some(p) => {
            fs::write(p, content).map_err(ExportError::from)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
