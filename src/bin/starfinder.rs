//! Command-line front end: load an image, find stars, export their positions.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use starfinder::{write_peaks, PeakFinderConfig, Session};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "starfinder", version, about = "Find bright stars in a FITS image")]
struct Args {
    /// Input image (.fits/.fit/.fts; other rasters with the `image` feature)
    input: PathBuf,

    /// Write `row,col` detections to this CSV file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Half-width of the suppression window in pixels
    #[arg(short, long, default_value_t = PeakFinderConfig::default().suppression_radius)]
    radius: usize,

    /// Maximum number of scan passes
    #[arg(long, conflicts_with = "no_iteration_cap")]
    max_iterations: Option<usize>,

    /// Search until the image is exhausted, however long it takes
    #[arg(long)]
    no_iteration_cap: bool,
}

impl Args {
    fn peak_config(&self) -> PeakFinderConfig {
        let defaults = PeakFinderConfig::default();
        PeakFinderConfig {
            suppression_radius: self.radius,
            max_iterations: if self.no_iteration_cap {
                None
            } else {
                self.max_iterations.or(defaults.max_iterations)
            },
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut session = Session::open(&args.input)
        .with_context(|| format!("Failed to open image: {}", args.input.display()))?;
    let (rows, cols) = session.image().shape();

    let result = session
        .find_stars(&args.peak_config())
        .context("Star finding failed")?;
    eprintln!(
        "{}: {}x{} pixels, range [{}, {}], {} stars in {} passes{}",
        args.input.display(),
        rows,
        cols,
        result.global_min,
        result.global_max,
        result.len(),
        result.iterations,
        if result.iteration_cap_hit {
            " (iteration cap reached)"
        } else {
            ""
        }
    );

    match &args.output {
        Some(path) => session
            .export(path)
            .with_context(|| format!("Failed to export detections to {}", path.display()))?,
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            write_peaks(&result.coordinates(), &mut lock).context("Failed to write detections")?;
            lock.flush()?;
        }
    }

    Ok(())
}
