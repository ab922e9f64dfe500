//! pdfoutline CLI - PDF title and heading outline extraction

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pdfoutline::batch::{self, DocumentOutcome};
use pdfoutline::{render, ErrorMode, ExtractOptions, JsonFormat, OutlineExtractor, Thresholds};

#[derive(Parser)]
#[command(name = "pdfoutline")]
#[command(version)]
#[command(about = "Extract a title and H1-H3 outline from PDF files", long_about = None)]
struct Cli {
    /// Input directory of PDF files
    #[arg(value_name = "INPUT", env = "PDFOUTLINE_INPUT")]
    input: Option<PathBuf>,

    /// Output directory for JSON files
    #[arg(value_name = "OUTPUT", env = "PDFOUTLINE_OUTPUT")]
    output: Option<PathBuf>,

    #[command(flatten)]
    engine: EngineArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Clone, Default)]
struct EngineArgs {
    /// JSON file overriding engine thresholds
    #[arg(long, value_name = "FILE", global = true)]
    thresholds: Option<PathBuf>,

    /// Fail a document on its first unreadable page
    #[arg(long, global = true)]
    strict: bool,

    /// Only read the first N pages of each document
    #[arg(long, value_name = "N", global = true)]
    max_pages: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract outlines for every PDF in a directory
    Batch {
        /// Input directory
        #[arg(short, long, value_name = "DIR", env = "PDFOUTLINE_INPUT", default_value = "input")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR", env = "PDFOUTLINE_OUTPUT", default_value = "output")]
        output: PathBuf,

        /// Process documents one at a time
        #[arg(long)]
        sequential: bool,
    },

    /// Extract the outline of a single PDF
    Extract {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Show how the outline of a PDF was derived
    Inspect {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Outline JSON
    Json,
    /// Indented outline tree
    Text,
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Batch {
            input,
            output,
            sequential,
        }) => cmd_batch(&input, &output, sequential, &cli.engine),
        Some(Commands::Extract {
            input,
            output,
            format,
            compact,
        }) => cmd_extract(&input, output.as_deref(), format, compact, &cli.engine),
        Some(Commands::Inspect { input, json }) => cmd_inspect(&input, json, &cli.engine),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: batch over input/ into output/
            let input = cli.input.unwrap_or_else(|| PathBuf::from("input"));
            let output = cli.output.unwrap_or_else(|| PathBuf::from("output"));
            cmd_batch(&input, &output, false, &cli.engine)
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn build_options(args: &EngineArgs) -> Result<ExtractOptions, Box<dyn std::error::Error>> {
    let mut options = ExtractOptions::new().with_error_mode(if args.strict {
        ErrorMode::Strict
    } else {
        ErrorMode::Lenient
    });

    if let Some(path) = &args.thresholds {
        options = options.with_thresholds(Thresholds::from_json_file(path)?);
        log::debug!("Loaded thresholds from {}", path.display());
    }
    if let Some(pages) = args.max_pages {
        options = options.with_max_pages(pages);
    }
    Ok(options)
}

fn cmd_batch(input: &Path, output: &Path, sequential: bool, args: &EngineArgs) -> CliResult {
    let options = build_options(args)?.with_parallel(!sequential);
    let total = batch::discover_pdfs(input)?.len();

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let report = batch::process_directory(input, output, &options, |outcome: &DocumentOutcome| {
        let name = outcome
            .input
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        match &outcome.result {
            Ok(_) => pb.set_message(name),
            Err(e) => pb.println(format!("{} {}: {}", "Skipped".yellow(), name, e)),
        }
        pb.inc(1);
    })?;

    pb.finish_and_clear();

    println!(
        "{} {} written, {} skipped in {:.2?}",
        "Done!".green().bold(),
        report.succeeded.len(),
        report.failed.len(),
        report.elapsed
    );
    println!("{}: {}", "Output".bold(), output.display());

    Ok(())
}

fn cmd_extract(
    input: &Path,
    output: Option<&Path>,
    format: OutputFormat,
    compact: bool,
    args: &EngineArgs,
) -> CliResult {
    let extractor = OutlineExtractor::with_options(build_options(args)?);
    let outline = extractor.extract_file(input)?;

    let content = match format {
        OutputFormat::Json => {
            let json_format = if compact {
                JsonFormat::Compact
            } else {
                JsonFormat::Pretty
            };
            render::to_json(&outline, json_format)?
        }
        OutputFormat::Text => render::to_text(&outline),
    };

    if let Some(path) = output {
        fs::write(path, &content)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", content);
    }

    Ok(())
}

fn cmd_inspect(input: &Path, json: bool, args: &EngineArgs) -> CliResult {
    let extractor = OutlineExtractor::with_options(build_options(args)?);
    let report = extractor.analyze_file(input)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", "Document".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Pages".bold(), report.page_count);
    println!("{}: {}", "Blocks".bold(), report.block_count);
    println!("{}: {}", "Type".bold(), report.document_type.to_string().yellow());
    println!(
        "{}: {} (detected: {})",
        "Language".bold(),
        report.language,
        report.detected_language.as_deref().unwrap_or("unknown")
    );

    println!();
    println!("{}", "Styles".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    match report.body_style {
        Some(body) => println!("{}: {}", "Body".bold(), body),
        None => println!("{}: {}", "Body".bold(), "none".dimmed()),
    }
    for (rank, style) in report.candidate_styles.iter().enumerate() {
        println!("  {} rank {}: {}", "├─".dimmed(), rank, style);
    }
    if report.sparse {
        println!("  {}", "(sparse document: ranked by size)".dimmed());
    }

    let signals = &report.signals;
    println!();
    println!("{}", "Signals".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {:.2}", "Short blocks".bold(), signals.short_block_ratio);
    println!("{}: {:.2}", "Field labels".bold(), signals.field_ratio);
    println!("{}: {:.2}", "Sentences".bold(), signals.sentence_ratio);
    println!("{}: {:.2}", "Candidate share".bold(), signals.candidate_ratio);
    println!(
        "{}: {} on {} pages",
        "Numbered headings".bold(),
        signals.numbered_blocks,
        signals.numbered_pages
    );
    if !signals.admin_keywords.is_empty() {
        println!("{}: {}", "Keywords".bold(), signals.admin_keywords.join(", "));
    }
    for group in &signals.stage_groups {
        println!(
            "{}: \"{}\" x{} on {} pages",
            "Stage group".bold(),
            group.prefix,
            group.blocks.len(),
            group.pages
        );
    }

    println!();
    println!("{}", "Outline".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    if report.outline.is_empty() {
        println!("{}", "(no title or headings found)".dimmed());
    } else {
        print!("{}", render::to_text(&report.outline));
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "pdfoutline".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("PDF title and heading outline extraction");
    println!();
    println!("License: MIT");
}
