use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use docmap::{
    CsvOptions, DocWarning, DocmapError, DocumentAnalysis, LayoutOptions, PageQuery,
    PageTextSource, PdfPages, ResolveOptions, TocOptions, TopicIndex, extract_ranges_text,
    index_document, reconstruct_document, resolve_query, write_sheet_csv,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "docmap",
    version,
    about = "Index PDF tables of contents, resolve topic queries and rebuild page layouts"
)]
struct Cli {
    /// Log debug output unless RUST_LOG is set.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Detect the table of contents and write a topic index.
    Toc(TocArgs),
    /// Print the text of the pages a topic or page list refers to.
    Query(QueryArgs),
    /// Rebuild analyzed pages into a sheet model.
    Sheet(SheetArgs),
}

#[derive(Debug, Args)]
struct TocArgs {
    /// Input PDF path.
    #[arg(short, long)]
    input: PathBuf,

    /// Output JSON path; stdout when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Leading pages scanned for a table of contents.
    #[arg(long, default_value_t = TocOptions::default().max_scan_pages)]
    max_scan_pages: u32,

    /// Non-empty lines a page needs to be considered.
    #[arg(long, default_value_t = TocOptions::default().min_total_lines)]
    min_total_lines: usize,

    /// Entry-shaped lines a page needs to count as TOC.
    #[arg(long, default_value_t = TocOptions::default().min_entry_lines)]
    min_entry_lines: usize,

    /// Pages a TOC run must span without a heading.
    #[arg(long, default_value_t = TocOptions::default().min_toc_len)]
    min_toc_len: u32,
}

#[derive(Debug, Args)]
struct QueryArgs {
    /// Input PDF path.
    #[arg(short, long)]
    input: PathBuf,

    /// Topic index written by `docmap toc`.
    #[arg(long)]
    index: Option<PathBuf>,

    /// Topic to look up in the index.
    #[arg(long, required_unless_present = "pages")]
    topic: Option<String>,

    /// Page list like 5, 5-7 or 2,4,6-8. Wins over --topic.
    #[arg(long)]
    pages: Option<String>,

    /// Minimum similarity for a fuzzy topic match.
    #[arg(long, default_value_t = ResolveOptions::default().cutoff)]
    cutoff: f64,
}

#[derive(Debug, Args)]
struct SheetArgs {
    /// Layout analysis JSON.
    #[arg(short, long)]
    analysis: PathBuf,

    /// Output sheet JSON path.
    #[arg(short, long)]
    output: PathBuf,

    /// Also write the sheet as CSV.
    #[arg(long)]
    csv: Option<PathBuf>,

    /// CSV delimiter character.
    #[arg(long, default_value = ",")]
    delimiter: char,

    /// Name of the generated sheet.
    #[arg(long, default_value = docmap::DEFAULT_SHEET_NAME)]
    sheet_name: String,

    /// Lay pages out one at a time.
    #[arg(long)]
    sequential: bool,
}

fn log_warnings(warnings: &[DocWarning]) {
    if warnings.is_empty() {
        return;
    }

    eprintln!("warning: {} issue(s) detected", warnings.len());
    for warning in warnings {
        eprintln!(
            "  - {:?} page={:?} table={:?}: {}",
            warning.code, warning.page, warning.table, warning.message
        );
    }
}

fn create_output(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path)
        .with_context(|| format!("failed to create '{}'", path.display()))?;
    Ok(BufWriter::new(file))
}

fn run_toc(args: &TocArgs) -> Result<bool> {
    let options = TocOptions {
        max_scan_pages: args.max_scan_pages,
        min_total_lines: args.min_total_lines,
        min_entry_lines: args.min_entry_lines,
        min_toc_len: args.min_toc_len,
    };
    let pages = PdfPages::open(&args.input)
        .with_context(|| format!("failed to read '{}'", args.input.display()))?;
    let report = index_document(&pages, &options).context("failed to index table of contents")?;
    log_warnings(&report.warnings);

    match &args.output {
        Some(path) => {
            let mut writer = create_output(path)?;
            report.index.to_json_writer(&mut writer)?;
            writer
                .flush()
                .with_context(|| format!("failed to write '{}'", path.display()))?;
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            report.index.to_json_writer(&mut stdout)?;
            writeln!(stdout).context("failed to write index")?;
        }
    }

    Ok(!report.index.is_empty())
}

fn load_index(path: Option<&Path>) -> Result<TopicIndex> {
    let Some(path) = path else {
        return Ok(TopicIndex::new());
    };
    let file = File::open(path).with_context(|| format!("failed to open '{}'", path.display()))?;
    TopicIndex::from_json_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse topic index '{}'", path.display()))
}

fn run_query(args: &QueryArgs) -> Result<bool> {
    let options = ResolveOptions {
        cutoff: args.cutoff,
    };
    let index = load_index(args.index.as_deref())?;
    let pages = PdfPages::open(&args.input)
        .with_context(|| format!("failed to read '{}'", args.input.display()))?;
    let query = PageQuery {
        topic: args.topic.clone(),
        pages: args.pages.clone(),
    };

    let ranges = match resolve_query(&query, &index, pages.page_count(), &options) {
        Ok(ranges) => ranges,
        Err(error) if error.is_topic_not_found() => {
            return Err(error).context("no matching topic; try --pages instead");
        }
        Err(error @ DocmapError::InvalidPageRange { .. }) => {
            return Err(error).context("failed to parse --pages");
        }
        Err(error) => return Err(error.into()),
    };

    let text = extract_ranges_text(&pages, &ranges).context("failed to extract page text")?;
    if !text.is_empty() {
        println!("{text}");
    }
    Ok(!text.is_empty())
}

fn run_sheet(args: &SheetArgs) -> Result<bool> {
    let csv_options = CsvOptions::from_delimiter(args.delimiter)?;
    let options = LayoutOptions {
        parallel: !args.sequential,
        sheet_name: args.sheet_name.clone(),
    };

    let file = File::open(&args.analysis)
        .with_context(|| format!("failed to open '{}'", args.analysis.display()))?;
    let analysis = DocumentAnalysis::from_json_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse analysis '{}'", args.analysis.display()))?;

    let (model, report) =
        reconstruct_document(&analysis, &options).context("failed to reconstruct layout")?;
    log_warnings(&report.warnings);

    let mut writer = create_output(&args.output)?;
    model.to_json_writer(&mut writer)?;
    writer
        .flush()
        .with_context(|| format!("failed to write '{}'", args.output.display()))?;

    if let Some((path, sheet)) = args.csv.as_ref().zip(model.active()) {
        write_sheet_csv(path, sheet, &csv_options)
            .with_context(|| format!("failed to write CSV '{}'", path.display()))?;
    }

    Ok(report.row_count > 0)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "docmap=debug"
    } else {
        "docmap=warn"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let outcome = match &cli.command {
        Commands::Toc(args) => run_toc(args),
        Commands::Query(args) => run_query(args),
        Commands::Sheet(args) => run_sheet(args),
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(1)
        }
    }
}
