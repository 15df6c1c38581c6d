use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use env_logger::{Builder, Env};
use log::{error, info};

use filament_seg::detector::ComponentDetector;
use filament_seg::pipeline::{Pipeline, PipelineConfig};
use filament_seg::threshold::ThresholdParams;

#[derive(Parser)]
#[command(name = "filament-seg")]
#[command(about = "Detect filaments in microscopy images and write binary segmentations")]
struct Cli {
    #[command(flatten)]
    verbosity: Verbosity<InfoLevel>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Segment a single image
    Detect {
        /// Image to segment
        #[arg(long)]
        image: PathBuf,

        #[command(flatten)]
        options: SegmentArgs,
    },

    /// Segment every .png image in a directory
    Batch {
        /// Directory of images
        #[arg(long)]
        dir: PathBuf,

        #[command(flatten)]
        options: SegmentArgs,
    },
}

#[derive(Args, Clone)]
struct SegmentArgs {
    /// Directory receiving reports, segmentations and overlays
    #[arg(long, default_value = "results")]
    results: PathBuf,

    /// Discard detections scoring below this
    #[arg(long, default_value_t = 0.8)]
    min_confidence: f32,

    /// Window side of the masked threshold (odd, >= 3)
    #[arg(long, default_value_t = 9)]
    block_size: u32,

    /// Margin subtracted from the masked local mean
    #[arg(long, default_value_t = 4.0)]
    margin: f64,

    /// Pixels added around each drawn bounding box
    #[arg(long, default_value_t = 10)]
    box_margin: i32,

    /// Smallest component, in pixels, reported as a filament
    #[arg(long, default_value_t = 50)]
    min_area: usize,

    /// Most filaments reported per image, largest first
    #[arg(long, default_value_t = 100)]
    max_instances: usize,
}

impl SegmentArgs {
    fn pipeline(&self) -> Pipeline<ComponentDetector> {
        let detector = ComponentDetector {
            min_area: self.min_area,
            max_instances: self.max_instances,
            ..Default::default()
        };
        let config = PipelineConfig {
            results_dir: self.results.clone(),
            threshold: ThresholdParams {
                block_size: self.block_size,
                c: self.margin,
                ..Default::default()
            },
            box_margin: self.box_margin,
            min_confidence: self.min_confidence,
        };
        Pipeline::new(detector, config)
    }
}

fn init_logging(verbosity: &Verbosity<InfoLevel>) {
    // RUST_LOG wins unless -v/-q was given explicitly.
    let use_env = !verbosity.is_present() && std::env::var_os("RUST_LOG").is_some();
    let mut builder = if use_env {
        Builder::from_env(Env::default())
    } else {
        let mut b = Builder::new();
        b.filter_level(verbosity.log_level_filter());
        b
    };
    builder.format_timestamp(None).init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.verbosity);

    match cli.command {
        Command::Detect { image, options } => {
            info!("Segmenting {}", image.display());
            match options.pipeline().process_image(&image) {
                Ok(report) => {
                    info!(
                        "{} instance(s); segmentation written to {}",
                        report.rois.len(),
                        report.paths.binary.display()
                    );
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    error!("Segmentation failed: {e:#}");
                    ExitCode::FAILURE
                }
            }
        }
        Command::Batch { dir, options } => match options.pipeline().process_directory(&dir) {
            Ok(summary) => {
                info!(
                    "Processed {} image(s), {} failed",
                    summary.processed.len(),
                    summary.failed.len()
                );
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("Batch failed: {e:#}");
                ExitCode::FAILURE
            }
        },
    }
}
