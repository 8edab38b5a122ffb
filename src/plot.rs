//! Diagnostic plots
//!
//! Each [PlotRequest] is rendered into its own PNG file named after the
//! sanitized title.

use std::{
    fs,
    ops::Range,
    path::{Path, PathBuf},
    sync::{Mutex, Once},
};

use plotters::prelude::*;
use plotters::style::{register_font, FontStyle};

use crate::title::{display_title, sanitize};

/// File name stem of plots without title
pub const DEFAULT_STEM: &str = "plot";

/// Fonts looked up when none is given
const SYSTEM_FONTS: [&str; 7] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

#[derive(Debug, thiserror::Error)]
pub enum PlotError {
    #[error("x has {0} samples but y has {1}")]
    Length(usize, usize),
    #[error("failed to read font {1:?}")]
    Font(#[source] std::io::Error, PathBuf),
    #[error("{0:?} is not a valid TrueType font")]
    InvalidFont(PathBuf),
    #[error("failed to draw {0:?}: {1}")]
    Drawing(PathBuf, String),
}
type Result<T> = std::result::Result<T, PlotError>;

/// Image settings shared by all plots
#[derive(Debug, Clone)]
pub struct PlotConfig {
    /// Figure size in hundredths of an inch
    pub figure_size: (u32, u32),
    /// Dots per inch
    pub dpi: u32,
    /// Maximum number of ticks per axis
    pub n_bins: usize,
    /// TrueType font used for the title and the tick labels
    pub font: Option<PathBuf>,
}
impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            figure_size: (1920, 1080),
            dpi: 300,
            n_bins: 50,
            font: None,
        }
    }
}
impl PlotConfig {
    /// Image size in pixels
    pub fn pixel_size(&self) -> (u32, u32) {
        let (w, h) = self.figure_size;
        (w * self.dpi / 100, h * self.dpi / 100)
    }
    /// Converts typographic points to pixels
    fn points(&self, pt: f64) -> f64 {
        pt * self.dpi as f64 / 72.
    }
}

/// Axis bounds, `None` bounds are derived from the data
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct AxisLimits {
    pub xmin: Option<f64>,
    pub xmax: Option<f64>,
    pub ymin: Option<f64>,
    pub ymax: Option<f64>,
}
impl From<[Option<f64>; 4]> for AxisLimits {
    fn from([xmin, xmax, ymin, ymax]: [Option<f64>; 4]) -> Self {
        Self {
            xmin,
            xmax,
            ymin,
            ymax,
        }
    }
}
impl From<[f64; 4]> for AxisLimits {
    fn from(limits: [f64; 4]) -> Self {
        limits.map(Some).into()
    }
}

/// A single curve to plot
#[derive(Debug, Clone, Default)]
pub struct PlotRequest {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub limits: Option<AxisLimits>,
    pub title: Option<String>,
}
impl PlotRequest {
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Self {
        Self {
            x,
            y,
            ..Default::default()
        }
    }
    pub fn limits<L: Into<AxisLimits>>(self, limits: L) -> Self {
        Self {
            limits: Some(limits.into()),
            ..self
        }
    }
    pub fn title<S: Into<String>>(self, title: S) -> Self {
        Self {
            title: Some(title.into()),
            ..self
        }
    }
    /// PNG file name derived from the title
    pub fn file_name(&self) -> String {
        format!(
            "{}.png",
            self.title
                .as_deref()
                .map(sanitize)
                .unwrap_or_else(|| DEFAULT_STEM.to_string())
        )
    }
    /// Returns the x and y axis ranges
    pub fn ranges(&self) -> (Range<f64>, Range<f64>) {
        let limits = self.limits.unwrap_or_default();
        (
            axis_range(limits.xmin, limits.xmax, &self.x),
            axis_range(limits.ymin, limits.ymax, &self.y),
        )
    }
    /// Continuous pieces of the curve, non-finite samples break the line
    fn segments(&self) -> Vec<Vec<(f64, f64)>> {
        let mut segments = vec![vec![]];
        for (&x, &y) in self.x.iter().zip(&self.y) {
            if x.is_finite() && y.is_finite() {
                if let Some(segment) = segments.last_mut() {
                    segment.push((x, y));
                }
            } else if segments.last().is_some_and(|s| !s.is_empty()) {
                segments.push(vec![]);
            }
        }
        segments.retain(|s| !s.is_empty());
        segments
    }
    /// Renders the plot into `dir` and returns the image path
    pub fn render<P: AsRef<Path>>(&self, dir: P, config: &PlotConfig) -> Result<PathBuf> {
        if self.x.len() != self.y.len() {
            return Err(PlotError::Length(self.x.len(), self.y.len()));
        }
        let text = fonts_available(config.font.as_deref())?;
        let path = dir.as_ref().join(self.file_name());
        self.draw(&path, config, text)
            .map_err(|e| PlotError::Drawing(path.clone(), e))?;
        log::info!("Saved {:?}", path);
        Ok(path)
    }
    fn draw(
        &self,
        path: &Path,
        config: &PlotConfig,
        text: bool,
    ) -> std::result::Result<(), String> {
        let plot = BitMapBackend::new(path, config.pixel_size()).into_drawing_area();
        plot.fill(&WHITE).map_err(|e| e.to_string())?;

        let (x_range, y_range) = self.ranges();
        let mut builder = ChartBuilder::on(&plot);
        builder.margin(config.points(10.) as u32);
        if text {
            if let Some(title) = &self.title {
                builder.caption(display_title(title), ("sans-serif", config.points(20.)));
            }
            builder
                .x_label_area_size(config.points(24.) as u32)
                .y_label_area_size(config.points(48.) as u32);
        }
        let mut chart = builder
            .build_cartesian_2d(x_range, y_range)
            .map_err(|e| e.to_string())?;
        {
            let mut mesh = chart.configure_mesh();
            mesh.x_labels(config.n_bins).y_labels(config.n_bins);
            if text {
                mesh.label_style(("sans-serif", config.points(6.)));
            }
            mesh.draw().map_err(|e| e.to_string())?;
        }

        let color = colorous::TABLEAU10[0];
        let rgb = RGBColor(color.r, color.g, color.b);
        for segment in self.segments() {
            chart
                .draw_series(LineSeries::new(
                    segment,
                    rgb.stroke_width(config.points(1.) as u32),
                ))
                .map_err(|e| e.to_string())?;
        }
        plot.present().map_err(|e| e.to_string())
    }
}

/// Returns the `lo..hi` range, missing bounds are set from the finite values
/// in `data` with 5% margins
fn axis_range(lo: Option<f64>, hi: Option<f64>, data: &[f64]) -> Range<f64> {
    let (min, max) = data
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(a, b), &v| {
            (a.min(v), b.max(v))
        });
    let (auto_lo, auto_hi) = if min > max {
        (0., 1.)
    } else if min == max {
        (min - 0.5, max + 0.5)
    } else {
        let margin = 0.05 * (max - min);
        (min - margin, max + margin)
    };
    let (lo, hi) = (lo.unwrap_or(auto_lo), hi.unwrap_or(auto_hi));
    if lo < hi {
        lo..hi
    } else if lo > hi {
        hi..lo
    } else {
        lo - 0.5..hi + 0.5
    }
}

/// Path of the font registered as "sans-serif"
static FONT: Mutex<Option<PathBuf>> = Mutex::new(None);

/// Registers a font for text rendering, returns false if none can be found
///
/// A font given by path replaces any font registered earlier, otherwise the
/// registered font is reused.
fn fonts_available(font: Option<&Path>) -> Result<bool> {
    let mut registered = FONT.lock().unwrap_or_else(|e| e.into_inner());
    match (font, registered.as_deref()) {
        (Some(path), Some(current)) if path == current => return Ok(true),
        (None, Some(_)) => return Ok(true),
        _ => (),
    }
    let (path, bytes) = match font {
        Some(path) => (
            path.to_path_buf(),
            fs::read(path).map_err(|e| PlotError::Font(e, path.to_path_buf()))?,
        ),
        None => match SYSTEM_FONTS
            .iter()
            .find_map(|p| fs::read(p).ok().map(|bytes| (PathBuf::from(p), bytes)))
        {
            Some(found) => found,
            None => {
                static WARN: Once = Once::new();
                WARN.call_once(|| log::warn!("no font found, plots are drawn without text"));
                return Ok(false);
            }
        },
    };
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    register_font("sans-serif", FontStyle::Normal, bytes)
        .map_err(|_| PlotError::InvalidFont(path.clone()))?;
    match registered.replace(path.clone()) {
        Some(previous) => log::info!("Using font {:?} instead of {:?}", path, previous),
        None => log::info!("Using font {:?}", path),
    }
    Ok(true)
}
