// Entry point of the image-slicer CLI.
// All processing lives in the library; this file only parses arguments,
// sets up logging and wires Ctrl-C to the run's cancel flag.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use image_slicer_lib::{
    RunState, RunSummary, SliceSettings, TranscodeSettings, compress_images, convert_images,
    load_settings, log_progress, slice_images,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "image-slicer", version)]
#[command(about = "Resize, stack and slice image folders; batch compress and convert", long_about = None)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print the run summary as JSON on stdout
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resize every image to one width, stack each folder and cut it into tiles
    Slice(SliceArgs),
    /// Re-encode every image in its own format
    Compress(TranscodeArgs),
    /// Re-encode every image to one format
    Convert {
        /// Target format (jpeg, jpg, png, webp, bmp, tiff, gif)
        #[arg(short, long)]
        format: String,

        #[command(flatten)]
        args: TranscodeArgs,
    },
}

#[derive(Args, Debug)]
struct SliceArgs {
    source: PathBuf,
    dest: PathBuf,

    /// Target width in pixels; 0 keeps original sizes
    #[arg(short, long)]
    width: Option<i64>,

    /// Tile height in pixels; 0 or less saves each image on its own
    #[arg(long, allow_negative_numbers = true)]
    slice_height: Option<i64>,

    /// Output format; defaults to the format of the source files
    #[arg(short, long)]
    format: Option<String>,

    /// Encoder quality, 1-100
    #[arg(short, long)]
    quality: Option<u32>,

    /// Worker threads; defaults to the number of CPUs
    #[arg(long)]
    workers: Option<usize>,

    /// JSON settings file; flags given on the command line win
    #[arg(long)]
    settings: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct TranscodeArgs {
    source: PathBuf,

    /// Output directory; defaults to a sibling of the source
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Encoder quality, 1-100
    #[arg(short, long)]
    quality: Option<u32>,

    /// Worker threads; defaults to the number of CPUs
    #[arg(long)]
    workers: Option<usize>,
}

impl SliceArgs {
    fn settings(&self) -> Result<SliceSettings> {
        let mut settings: SliceSettings = load_settings(self.settings.as_deref())?;
        if let Some(width) = self.width {
            settings.target_width = width;
        }
        if let Some(slice_height) = self.slice_height {
            settings.slice_height = slice_height;
        }
        if let Some(format) = &self.format {
            settings.output_format = Some(format.clone());
        }
        if let Some(quality) = self.quality {
            settings.quality = quality;
        }
        if self.workers.is_some() {
            settings.workers = self.workers;
        }
        Ok(settings)
    }
}

impl TranscodeArgs {
    fn apply(&self, mut settings: TranscodeSettings) -> TranscodeSettings {
        if let Some(quality) = self.quality {
            settings.quality = quality;
        }
        if self.workers.is_some() {
            settings.workers = self.workers;
        }
        settings
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_target(false)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn execute(command: Command, state: &RunState) -> Result<RunSummary> {
    let summary = match command {
        Command::Slice(args) => {
            let settings = args.settings()?;
            slice_images(&args.source, &args.dest, &settings, state, log_progress)
                .context("slice failed")?
        }
        Command::Compress(args) => {
            let settings = args.apply(TranscodeSettings::compress());
            compress_images(&args.source, args.output.as_deref(), &settings, state, log_progress)
                .context("compress failed")?
        }
        Command::Convert { format, args } => {
            let settings = args.apply(TranscodeSettings::convert(format));
            convert_images(&args.source, args.output.as_deref(), &settings, state, log_progress)
                .context("convert failed")?
        }
    };
    Ok(summary)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    info!("=== image-slicer {} ===", env!("CARGO_PKG_VERSION"));

    let state = Arc::new(RunState::new());
    let interrupt = Arc::clone(&state);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current group");
            interrupt.cancel();
        }
    });

    let json = cli.json;
    let run_state = Arc::clone(&state);
    let summary = tokio::task::spawn_blocking(move || execute(cli.command, &run_state))
        .await
        .context("processing thread failed")??;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}
