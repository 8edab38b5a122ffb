use std::path::PathBuf;

use crate::{
    calibration::CalibrationError, combine::CombineError, discovery::DiscoveryError,
    fits::FitsError, frame::FrameError, plot::PlotError, smooth::SmoothError, FrameGroup,
};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("no {0} file found in {1:?}")]
    MissingGroup(FrameGroup, PathBuf),
    #[error("failed to list the {0} files")]
    Discovery(FrameGroup, #[source] DiscoveryError),
    #[error("failed to load a frame")]
    Frame(#[from] FrameError),
    #[error("failed to combine the {0} frames")]
    Combine(FrameGroup, #[source] CombineError),
    #[error("failed to smooth the {0} frame")]
    Smooth(FrameGroup, #[source] SmoothError),
    #[error("failed to calibrate the {0} frame")]
    Calibration(FrameGroup, #[source] CalibrationError),
    #[error("failed to plot")]
    Plot(#[from] PlotError),
    #[error("failed to export to FITS")]
    Fits(#[from] FitsError),
    #[error("failed to export to CSV")]
    Csv(#[from] csv::Error),
}
pub type Result<T> = std::result::Result<T, Error>;
