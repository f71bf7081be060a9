//! Images to PDF CLI tool
//!
//! A command-line front end for the conversion pipeline.

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};

use images_to_pdf::pdf::extract_metadata;
use images_to_pdf::{
    convert_images, list_images, CompletionStatus, ConvertOptions, PageSize, ProgressEvent,
};

/// Images to PDF - Bind a folder of images into one PDF
#[derive(Parser)]
#[command(name = "images-to-pdf")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Convert every image in scans/ into an A4 document
    images-to-pdf convert scans/ -o scans.pdf

    # Use Letter pages and open the result
    images-to-pdf convert photos/ -o out/photos.pdf --page-size letter --open

    # Preview the page order
    images-to-pdf list scans/")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert all images in a directory into one PDF
    Convert {
        /// Directory containing png, jpg, jpeg, gif, bmp or tiff files
        source: PathBuf,

        /// Output PDF file path (parent directories are created)
        #[arg(short, long)]
        output: PathBuf,

        /// Page size: "a4" or "letter"
        #[arg(long, default_value = "a4", value_parser = parse_page_size)]
        page_size: PageSize,

        /// Open the output file after creation
        #[arg(long)]
        open: bool,
    },

    /// List the images of a directory in the order they would be converted
    List {
        /// Directory to scan
        source: PathBuf,
    },

    /// Show information about a PDF file
    Info {
        /// PDF file to inspect
        input: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Convert {
            source,
            output,
            page_size,
            open,
        } => cmd_convert(source, output, page_size, open),
        Commands::List { source } => cmd_list(&source),
        Commands::Info { input } => cmd_info(&input),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn parse_page_size(value: &str) -> std::result::Result<PageSize, String> {
    value.parse().map_err(|e: images_to_pdf::Error| e.to_string())
}

/// Open a file with the system default application
fn open_file(path: &Path) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        process::Command::new("open").arg(path).spawn()?;
    }
    #[cfg(target_os = "linux")]
    {
        process::Command::new("xdg-open").arg(path).spawn()?;
    }
    #[cfg(target_os = "windows")]
    {
        process::Command::new("cmd")
            .args(["/C", "start", "", &path.display().to_string()])
            .spawn()?;
    }
    Ok(())
}

/// Convert a directory of images
fn cmd_convert(source: PathBuf, output: PathBuf, page_size: PageSize, open: bool) -> Result<()> {
    let options = ConvertOptions::new(source, output).with_page_size(page_size);
    let mut print = |event: &ProgressEvent| eprintln!("{}", event);

    let status = convert_images(&options, &mut print)
        .with_context(|| format!("converting {}", options.source_dir.display()))?;

    let skipped = status.skipped();
    if !skipped.is_empty() {
        eprintln!("{} file(s) skipped:", skipped.len());
        for image in skipped {
            eprintln!("  {}: {}", image.file, image.reason);
        }
    }

    match status {
        CompletionStatus::Empty | CompletionStatus::NoPages { .. } => {
            eprintln!("Nothing written.");
        }
        CompletionStatus::Completed(summary) => {
            if open {
                open_file(&summary.output)?;
            }
        }
    }

    Ok(())
}

/// Print the natural-ordered image list
fn cmd_list(source: &Path) -> Result<()> {
    let images = list_images(source)?;

    if images.is_empty() {
        eprintln!("No images found in {}", source.display());
    }
    for (i, name) in images.iter().enumerate() {
        println!("{:>4}  {}", i + 1, name);
    }

    Ok(())
}

/// Show information about a PDF
fn cmd_info(input: &Path) -> Result<()> {
    let metadata = extract_metadata(input)
        .with_context(|| format!("reading {}", input.display()))?;

    println!("File: {}", input.display());
    println!("Pages: {}", metadata.page_count);

    if let Some(title) = metadata.title {
        println!("Title: {}", title);
    }
    if let Some(producer) = metadata.producer {
        println!("Producer: {}", producer);
    }

    for (i, page) in metadata.pages.iter().enumerate() {
        match page.image_box {
            Some((x, y, w, h)) => println!(
                "  page {:>3}: {:.1} x {:.1} pt, image {:.1} x {:.1} at ({:.1}, {:.1})",
                i + 1,
                page.width,
                page.height,
                w,
                h,
                x,
                y
            ),
            None => println!("  page {:>3}: {:.1} x {:.1} pt", i + 1, page.width, page.height),
        }
    }

    Ok(())
}
