//! pdfelem CLI - PDF text and image extraction tool

mod console;
mod tree;

use std::io;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pdfelem::{
    collect_range, spawn_extraction, CleanupPreset, ExtractOptions, ExtractionEvent,
    ExtractionResult, LopdfBackend, PageRequest, PdfBackend,
};

#[derive(Parser)]
#[command(name = "pdfelem")]
#[command(version)]
#[command(about = "Extract the text and images of PDF files", long_about = None)]
struct Cli {
    /// Input PDF file
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output directory
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract text chunks and images into a directory
    Extract {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output directory (defaults to <FILE stem>_output)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Number of pages per text file
        #[arg(short, long, default_value_t = 1, env = "PDFELEM_EVERY")]
        every: u32,

        /// Page range (e.g., "3-7", "5", "4-", "all")
        #[arg(long)]
        pages: Option<String>,

        /// Only extract text
        #[arg(long, conflicts_with = "images_only")]
        text_only: bool,

        /// Only extract images
        #[arg(long)]
        images_only: bool,

        /// Write images one at a time
        #[arg(long)]
        sequential: bool,

        /// Text cleanup preset
        #[arg(long, value_enum)]
        clean: Option<CleanupLevel>,

        /// Print the extraction result as JSON instead of a tree
        #[arg(long)]
        json: bool,
    },

    /// Show document information
    Info {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Prompt for the source file and destination directory
    Console,

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum CleanupLevel {
    /// Unicode normalization and trailing whitespace only
    Minimal,
    /// Also fix ligatures, hyphenation and blank lines
    Standard,
}

impl From<CleanupLevel> for CleanupPreset {
    fn from(level: CleanupLevel) -> Self {
        match level {
            CleanupLevel::Minimal => CleanupPreset::Minimal,
            CleanupLevel::Standard => CleanupPreset::Standard,
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Extract {
            input,
            output,
            every,
            pages,
            text_only,
            images_only,
            sequential,
            clean,
            json,
        }) => build_options(every, pages.as_deref(), text_only, images_only, sequential, clean)
            .and_then(|options| cmd_extract(&input, output.as_deref(), options, json)),
        Some(Commands::Info { input }) => cmd_info(&input),
        Some(Commands::Console) => {
            cmd_console();
            Ok(())
        }
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: extract everything if input is provided
            if let Some(input) = cli.input {
                cmd_extract(&input, cli.output.as_deref(), ExtractOptions::default(), false)
            } else {
                println!("{}", "Usage: pdfelem <FILE> [OUTPUT]".yellow());
                println!("       pdfelem console for interactive mode");
                println!("       pdfelem --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn build_options(
    every: u32,
    pages: Option<&str>,
    text_only: bool,
    images_only: bool,
    sequential: bool,
    clean: Option<CleanupLevel>,
) -> Result<ExtractOptions, Box<dyn std::error::Error>> {
    let mut options = ExtractOptions::new().with_pages_per_chunk(every);

    if let Some(p) = pages {
        options = options.with_pages(p.parse::<PageRequest>()?);
    }
    if text_only {
        options = options.text_only();
    } else if images_only {
        options = options.images_only();
    }
    if sequential {
        options = options.sequential();
    }
    if let Some(level) = clean {
        options = options.with_cleanup_preset(level.into());
    }
    Ok(options)
}

fn default_output_dir(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    PathBuf::from(format!("{}_output", stem))
}

fn cmd_extract(
    input: &Path,
    output: Option<&Path>,
    options: ExtractOptions,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let output_dir = output
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| default_output_dir(input));

    let result = run_with_progress(input, &output_dir, options, !json)?;

    if json {
        println!("{}", result.to_json()?);
    } else {
        print_report(&result);
    }
    Ok(())
}

/// Run an extraction on a worker thread and drive a progress bar from its events.
fn run_with_progress(
    input: &Path,
    output: &Path,
    options: ExtractOptions,
    show_progress: bool,
) -> Result<ExtractionResult, Box<dyn std::error::Error>> {
    let task = spawn_extraction(input, output, options)?;

    let pb = if show_progress {
        ProgressBar::new(0)
    } else {
        ProgressBar::hidden()
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    for event in task.events() {
        match event {
            ExtractionEvent::Started { chunks, .. } => {
                pb.set_length(chunks as u64);
                pb.set_message("Extracting text...");
            }
            ExtractionEvent::TextWritten { .. } | ExtractionEvent::ImageWritten { .. } => {
                pb.inc(1)
            }
            ExtractionEvent::ImagesCollected { count } => {
                pb.inc_length(count as u64);
                pb.set_message("Writing images...");
            }
            ExtractionEvent::ItemFailed(failure) => {
                pb.inc(1);
                pb.println(format!("{} {}", "Skipped".yellow(), failure));
            }
            ExtractionEvent::Finished { .. } => pb.finish_with_message("Done!"),
        }
    }

    match task.wait() {
        Ok(result) => Ok(result),
        Err(e) => {
            pb.abandon();
            Err(e.into())
        }
    }
}

fn print_report(result: &ExtractionResult) {
    println!();
    println!("{}", tree::render_tree(result));
    println!();
    println!("{}", tree::summary_line(result));

    for failure in &result.failures {
        println!("  {} {}", "!".yellow().bold(), failure);
    }
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let backend = LopdfBackend::open(input)?;
    let page_count = backend.page_count();
    let images = PageRequest::ALL
        .resolve(page_count)
        .map(|range| collect_range(&backend, range).len())
        .unwrap_or(0);

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: PDF {}", "Format".bold(), backend.version());
    println!("{}: {}", "Pages".bold(), page_count);
    println!(
        "{}: {}",
        "Encrypted".bold(),
        if backend.is_encrypted() { "Yes" } else { "No" }
    );
    println!("{}: {}", "Images".bold(), images);

    Ok(())
}

fn cmd_console() {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout();

    if let Err(e) = console::print_intro(&mut out) {
        log::error!("{}", e);
        return;
    }

    let params = match console::prompt_params(&mut input, &mut out) {
        Ok(Some(params)) => params,
        Ok(None) => {
            log::warn!("Input ended before source and destination were entered");
            return;
        }
        Err(e) => {
            log::error!("{}", e);
            return;
        }
    };

    // console mode reports errors but never fails the process
    match run_with_progress(
        &params.source,
        &params.destination,
        ExtractOptions::default(),
        true,
    ) {
        Ok(result) => print_report(&result),
        Err(e) => {
            log::error!("{}", e);
            eprintln!("{}: {}", "Error".red().bold(), e);
        }
    }
}

fn cmd_version() {
    println!("{} {}", "pdfelem".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("PDF text and image extraction tool");
    println!();
    println!("License: MIT");
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdfelem::ExtractMode;

    #[test]
    fn test_default_output_dir() {
        assert_eq!(
            default_output_dir(Path::new("/docs/report.pdf")),
            PathBuf::from("report_output")
        );
        assert_eq!(default_output_dir(Path::new("")), PathBuf::from("_output"));
    }

    #[test]
    fn test_build_options() {
        let options =
            build_options(5, Some("2-9"), true, false, true, Some(CleanupLevel::Minimal)).unwrap();
        assert_eq!(options.pages_per_chunk, 5);
        assert_eq!(options.pages, PageRequest::new(2, 9));
        assert_eq!(options.mode, ExtractMode::TextOnly);
        assert!(!options.parallel);
        assert!(options.cleanup.is_some());

        let options = build_options(1, None, false, true, false, None).unwrap();
        assert_eq!(options.mode, ExtractMode::ImagesOnly);
        assert_eq!(options.pages, PageRequest::ALL);
    }

    #[test]
    fn test_build_options_rejects_bad_pages() {
        assert!(build_options(1, Some("two-five"), false, false, false, None).is_err());
    }

    #[test]
    fn test_cli_parses_extract_flags() {
        let cli = Cli::parse_from([
            "pdfelem", "extract", "a.pdf", "-o", "out", "--every", "3", "--pages", "4-",
            "--text-only",
        ]);
        match cli.command {
            Some(Commands::Extract {
                every,
                pages,
                text_only,
                output,
                ..
            }) => {
                assert_eq!(every, 3);
                assert_eq!(pages.as_deref(), Some("4-"));
                assert!(text_only);
                assert_eq!(output, Some(PathBuf::from("out")));
            }
            _ => panic!("expected extract command"),
        }
    }

    #[test]
    fn test_cli_text_and_images_only_conflict() {
        let parsed = Cli::try_parse_from([
            "pdfelem",
            "extract",
            "a.pdf",
            "--text-only",
            "--images-only",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_run_with_progress_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_with_progress(
            &dir.path().join("missing.pdf"),
            &dir.path().join("out"),
            ExtractOptions::default(),
            false,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Cannot find the PDF file"));
    }
}
