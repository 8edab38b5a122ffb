use std::{env, path::PathBuf};

use anyhow::Context;
use spectral_reduction::{Pipeline, PlotConfig, Reduction};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "spectral-reduction",
    about = "Dark subtraction and lens barrel to reference ratio of spectrometer frames"
)]
struct Opt {
    /// Path to the measurement files [default: $SPECTRA_DATA_PATH or .]
    path: Option<PathBuf>,
    /// Frame combination: mean or median
    #[structopt(short, long, default_value = "median")]
    reduction: Reduction,
    /// Moving average window
    #[structopt(short, long, default_value = "3")]
    window: usize,
    /// Number of header lines in the measurement files
    #[structopt(long, default_value = "14")]
    header_lines: usize,
    /// Plots resolution in dots per inch
    #[structopt(long, default_value = "300")]
    dpi: u32,
    /// TrueType font for the plots text
    #[structopt(long)]
    font: Option<PathBuf>,
    /// Derive all the plot bounds from the data
    #[structopt(long)]
    auto_limits: bool,
    /// Save the processed frames to FITS files
    #[structopt(long)]
    fits: bool,
    /// Save the processed curves to a CSV file
    #[structopt(long)]
    csv: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opt = Opt::from_args();

    let path = opt
        .path
        .or_else(|| env::var_os("SPECTRA_DATA_PATH").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));

    let mut pipeline = Pipeline::default()
        .data_path(&path)
        .reduction(opt.reduction)
        .window(opt.window)
        .header_lines(opt.header_lines)
        .plot_config(PlotConfig {
            dpi: opt.dpi,
            font: opt.font,
            ..Default::default()
        });
    if opt.auto_limits {
        pipeline = pipeline.auto_limits();
    }
    if opt.fits {
        pipeline = pipeline.fits();
    }
    if let Some(csv) = opt.csv {
        pipeline = pipeline.csv(csv);
    }

    let report = pipeline
        .run()
        .with_context(|| format!("frame reduction in {:?} failed", path))?;

    println!("SUMMARY:");
    println!(" - # of samples: {}", report.ratio.len());
    if let (Some(first), Some(last)) = (report.wavelength.first(), report.wavelength.last()) {
        println!(" - wavelength range: [{:8.3}-{:8.3}]", first, last);
    }
    let n_non_finite = report.ratio.iter().filter(|r| !r.is_finite()).count();
    if n_non_finite > 0 {
        println!(" - # of non finite ratio samples: {}", n_non_finite);
    }
    println!(" - plots:");
    report
        .plots
        .iter()
        .for_each(|p| println!("  - {}", p.display()));
    if !report.exports.is_empty() {
        println!(" - exports:");
        report
            .exports
            .iter()
            .for_each(|p| println!("  - {}", p.display()));
    }

    Ok(())
}
