use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use pdf_table_engine::{
    EngineError, ExtractOptions, HeaderMode, PageSelection, PdfSource, PdfTableExtractor, Table,
    TableEngine, write_table_csv,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "pdf2table",
    version,
    about = "Find the largest table in a PDF and export it as JSON and CSV"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract the largest table from a PDF.
    Extract(ExtractArgs),
}

#[derive(Debug, Args)]
struct ExtractArgs {
    /// Input PDF path.
    #[arg(short, long)]
    input: PathBuf,

    /// Spreadsheet (CSV) output path.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write JSON records here instead of stdout.
    #[arg(long)]
    json: Option<PathBuf>,

    /// Document password. Accepted but not applied when parsing.
    #[arg(long)]
    password: Option<String>,

    /// Page selection like 1-3,5.
    #[arg(long)]
    pages: Option<String>,

    /// has-header, no-header or auto.
    #[arg(long, default_value = "has-header")]
    header_mode: String,

    /// Minimum cells required per candidate table row.
    #[arg(long, default_value_t = 2)]
    min_cols: usize,

    /// Output delimiter character.
    #[arg(long, default_value = ",")]
    delimiter: char,

    /// Log extraction details to stderr.
    #[arg(short, long)]
    verbose: bool,
}

enum RunOutcome {
    Selected(Table),
    Failed(EngineError),
}

fn parse_options(args: &ExtractArgs) -> Result<ExtractOptions> {
    let pages = args
        .pages
        .as_deref()
        .map(PageSelection::from_str)
        .transpose()
        .map_err(|error| anyhow!("invalid page selection: {error}"))
        .context("failed to parse --pages")?;

    let header_mode = HeaderMode::from_str(&args.header_mode)
        .map_err(|error| anyhow!(error))
        .context("failed to parse --header-mode")?;

    if !args.delimiter.is_ascii() {
        anyhow::bail!("delimiter must be a single ASCII character");
    }

    Ok(ExtractOptions {
        pages,
        header_mode,
        min_cols: args.min_cols,
        delimiter: args.delimiter as u8,
    })
}

fn run_extract(args: &ExtractArgs) -> Result<RunOutcome> {
    let options = parse_options(args)?;
    let delimiter = options.delimiter;
    let extractor = PdfTableExtractor::new(options).context("invalid extraction options")?;
    let bytes = std::fs::read(&args.input)
        .with_context(|| format!("failed to read '{}'", args.input.display()))?;

    let table = match TableEngine::new(extractor)
        .run(PdfSource::Bytes(&bytes), args.password.as_deref())
    {
        Ok(table) => table,
        Err(error) => return Ok(RunOutcome::Failed(error)),
    };

    let json = table.to_json_string().context("failed to encode JSON")?;
    match &args.json {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("failed to write '{}'", path.display()))?,
        None => println!("{json}"),
    }

    if let Some(path) = &args.output {
        write_table_csv(path, &table, delimiter)
            .with_context(|| format!("failed to write '{}'", path.display()))?;
    }

    Ok(RunOutcome::Selected(table))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let Commands::Extract(args) = cli.command;

    let default_filter = if args.verbose {
        "pdf_table_engine=debug"
    } else {
        "pdf_table_engine=warn"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    match run_extract(&args) {
        Ok(RunOutcome::Selected(table)) => {
            eprintln!(
                "selected table from page {}: {} rows x {} columns",
                table.page,
                table.row_count(),
                table.column_count()
            );
            ExitCode::SUCCESS
        }
        Ok(RunOutcome::Failed(error)) => {
            eprintln!("error: {error}");
            match error {
                EngineError::NoTablesFound => ExitCode::from(2),
                EngineError::EncryptedDocument => ExitCode::from(3),
            }
        }
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(1)
        }
    }
}
