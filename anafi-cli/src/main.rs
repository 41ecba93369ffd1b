// Anafi detection overlay command line
// Projects detections onto a viewport and paints them onto still frames

mod commands;

use anafi_eye::Size;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "anafi")]
#[command(about = "Anafi detection overlay tools", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (JSON, TOML or YAML); ANAFI_* variables otherwise
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Project detections onto a viewport and print the overlay as JSON
    Project {
        /// JSON file holding an array of detections
        #[arg(long, short)]
        detections: PathBuf,

        /// Size of the image the detector ran on, as WxH
        #[arg(long, value_parser = parse_size)]
        source: Size,

        /// Size of the viewport showing the feed, as WxH
        #[arg(long, value_parser = parse_size)]
        viewport: Size,

        /// Margin kept between boxes and the viewport edges
        #[arg(long)]
        edge_offset: Option<f64>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Paint detections onto an image
    Render {
        /// Input image; detections are expressed in its pixel space
        #[arg(long, short)]
        image: PathBuf,

        /// JSON file holding an array of detections
        #[arg(long, short)]
        detections: PathBuf,

        /// Where to write the painted frame
        #[arg(long, short)]
        output: PathBuf,

        /// Resize the frame to WxH before painting
        #[arg(long, value_parser = parse_size)]
        viewport: Option<Size>,

        /// Border thickness in pixels
        #[arg(long, default_value = "2")]
        border_width: u32,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = commands::load_config(cli.config.as_deref())?;
    debug!("Using configuration {:?}", config);

    match cli.command {
        Commands::Project {
            detections,
            source,
            viewport,
            edge_offset,
            pretty,
        } => {
            let mut config = config;
            if let Some(edge_offset) = edge_offset {
                config.edge_offset = edge_offset;
            }
            let items = commands::project(&config, &detections, source, viewport)?;
            let json = if pretty {
                serde_json::to_string_pretty(&items)?
            } else {
                serde_json::to_string(&items)?
            };
            println!("{}", json);
        }
        Commands::Render {
            image,
            detections,
            output,
            viewport,
            border_width,
        } => {
            let painted = commands::render(&config, &image, &detections, &output, viewport, border_width)?;
            println!("Painted {} overlay(s) to {}", painted, output.display());
        }
    }

    Ok(())
}

/// Parse `WxH` (also `W,H`) into a size with positive dimensions.
fn parse_size(s: &str) -> Result<Size, String> {
    let (width, height) = s
        .split_once(['x', 'X', ','])
        .ok_or_else(|| format!("expected WxH, got {:?}", s))?;
    let width: f64 = width.trim().parse().map_err(|_| format!("invalid width {:?}", width))?;
    let height: f64 = height.trim().parse().map_err(|_| format!("invalid height {:?}", height))?;
    let size = Size::new(width, height);
    if !size.is_positive() {
        return Err(format!("size must be positive, got {}", s));
    }
    Ok(size)
}
