//! # Spectral frame reduction
//!
//! Reduces the spectrometer frames of a measurement session:
//!  - the files of each optical configuration ([FrameGroup]) are combined pixel-wise,
//!  - the intensity is smoothed with a moving average,
//!  - the dark signal is subtracted and the lens barrel to reference ratio computed,
//!  - the curves are plotted into PNG images.
//!
//! The whole sequence is driven by [Pipeline].

pub mod calibration;
pub mod combine;
pub mod discovery;
pub mod error;
pub mod fits;
pub mod frame;
pub mod pipeline;
pub mod plot;
pub mod smooth;
pub mod title;

pub use combine::Reduction;
pub use discovery::FrameGroup;
pub use error::{Error, Result};
pub use frame::Frame;
pub use pipeline::{Pipeline, PlotLimits, ReductionReport};
pub use plot::{AxisLimits, PlotConfig, PlotRequest};
