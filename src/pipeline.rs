//! Frame reduction pipeline
//!
//! discover → load → combine → smooth → subtract darks → divide → plot

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use serde::Serialize;
use strum::IntoEnumIterator;

use crate::{
    calibration::{ratio, subtract_dark},
    combine::{combine, Reduction},
    error::{Error, Result},
    fits::write_fits,
    frame::{Frame, HEADER_LINES},
    plot::{PlotConfig, PlotRequest},
    smooth::{moving_average, WINDOW},
    FrameGroup,
};

/// Title of the lens barrel to reference ratio plot
pub const RATIO_TITLE: &str = r"$\frac{LensBarrel}{Ref}$";

/// Fixed plot bounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotLimits {
    pub wavelength: (f64, f64),
    pub ratio: (f64, f64),
    pub intensity: (f64, f64),
}
impl Default for PlotLimits {
    fn default() -> Self {
        Self {
            wavelength: (400., 700.),
            ratio: (0., 2.),
            intensity: (2000., 13500.),
        }
    }
}

/// Reduction settings
///
/// Built with the consuming setters:
/// ```no_run
/// use spectral_reduction::{Pipeline, Reduction};
///
/// let report = Pipeline::default()
///     .data_path("22-02-2021")
///     .reduction(Reduction::Median)
///     .run()?;
/// # Ok::<(), spectral_reduction::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline {
    path: PathBuf,
    header_lines: usize,
    reduction: Reduction,
    window: usize,
    plot: PlotConfig,
    limits: Option<PlotLimits>,
    fits: bool,
    csv: Option<PathBuf>,
}
impl Default for Pipeline {
    fn default() -> Self {
        Self {
            path: PathBuf::from("."),
            header_lines: HEADER_LINES,
            reduction: Reduction::Median,
            window: WINDOW,
            plot: PlotConfig::default(),
            limits: Some(PlotLimits::default()),
            fits: false,
            csv: None,
        }
    }
}
impl Pipeline {
    /// Directory holding the measurement files, plots are saved there too
    pub fn data_path<P: AsRef<Path>>(self, path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            ..self
        }
    }
    pub fn header_lines(self, header_lines: usize) -> Self {
        Self {
            header_lines,
            ..self
        }
    }
    pub fn reduction(self, reduction: Reduction) -> Self {
        Self { reduction, ..self }
    }
    /// Moving average window
    pub fn window(self, window: usize) -> Self {
        Self { window, ..self }
    }
    pub fn plot_config(self, plot: PlotConfig) -> Self {
        Self { plot, ..self }
    }
    pub fn limits(self, limits: PlotLimits) -> Self {
        Self {
            limits: Some(limits),
            ..self
        }
    }
    /// Derives all the plot bounds from the data
    pub fn auto_limits(self) -> Self {
        Self {
            limits: None,
            ..self
        }
    }
    /// Saves the processed frames and the ratio to FITS files
    pub fn fits(self) -> Self {
        Self { fits: true, ..self }
    }
    /// Saves the processed curves to a CSV file
    pub fn csv<P: AsRef<Path>>(self, path: P) -> Self {
        Self {
            csv: Some(path.as_ref().to_path_buf()),
            ..self
        }
    }
    /// Loads and combines the files of a group
    fn combined(&self, group: FrameGroup, paths: &[PathBuf]) -> Result<Frame> {
        let frames = paths
            .iter()
            .map(|path| Frame::from_path_with_header(path, self.header_lines))
            .collect::<std::result::Result<Vec<Frame>, _>>()?;
        combine(&frames, self.reduction).map_err(|e| Error::Combine(group, e))
    }
    /// Runs the reduction
    pub fn run(&self) -> Result<ReductionReport> {
        log::info!("Reducing the frames in {:?}", self.path);
        let mut frames = BTreeMap::new();
        for group in FrameGroup::iter() {
            let paths = group
                .glob(&self.path)
                .map_err(|e| Error::Discovery(group, e))?;
            if paths.is_empty() {
                if group.is_optional() {
                    log::warn!("no {} file found in {:?}", group, self.path);
                    continue;
                }
                return Err(Error::MissingGroup(group, self.path.clone()));
            }
            log::info!("{}: {} files", group, paths.len());
            let mut frame = self.combined(group, &paths)?;
            let smoothed = moving_average(&frame.intensity()?, self.window)
                .map_err(|e| Error::Smooth(group, e))?;
            frame.set_column(1, &smoothed)?;
            frames.insert(group, frame);
        }

        let dark = frames
            .get(&FrameGroup::Darks)
            .ok_or_else(|| Error::MissingGroup(FrameGroup::Darks, self.path.clone()))?
            .intensity()?;
        for (&group, frame) in frames
            .iter_mut()
            .filter(|(group, _)| **group != FrameGroup::Darks)
        {
            let mut signal = frame.intensity()?;
            subtract_dark(&mut signal, &dark).map_err(|e| Error::Calibration(group, e))?;
            frame.set_column(1, &signal)?;
        }

        let lens = self.group(&frames, FrameGroup::Lens)?;
        let reference = self.group(&frames, FrameGroup::Reference)?;
        let wavelength = lens.x()?;
        let ratio = ratio(&lens.intensity()?, &reference.intensity()?)
            .map_err(|e| Error::Calibration(FrameGroup::Reference, e))?;

        let mut report = ReductionReport {
            wavelength,
            ratio,
            frames,
            plots: vec![],
            exports: vec![],
        };
        for request in report.plot_requests(self.limits)? {
            let path = request.render(&self.path, &self.plot)?;
            report.plots.push(path);
        }
        if self.fits {
            let exported = report.to_fits(&self.path)?;
            report.exports.extend(exported);
        }
        if let Some(path) = &self.csv {
            report.to_csv(path)?;
            report.exports.push(path.clone());
        }
        Ok(report)
    }
    fn group<'a>(
        &self,
        frames: &'a BTreeMap<FrameGroup, Frame>,
        group: FrameGroup,
    ) -> Result<&'a Frame> {
        frames
            .get(&group)
            .ok_or_else(|| Error::MissingGroup(group, self.path.clone()))
    }
}

#[derive(Serialize)]
struct Row {
    #[serde(rename = "Wavelength")]
    wavelength: f64,
    #[serde(rename = "LensBarrel/Ref")]
    ratio: f64,
    #[serde(rename = "LensBarrel")]
    lens: f64,
    #[serde(rename = "Ref")]
    reference: f64,
    #[serde(rename = "Filter_1")]
    filter_1: Option<f64>,
    #[serde(rename = "Filter_2")]
    filter_2: Option<f64>,
}

/// Outcome of a reduction
#[derive(Debug)]
pub struct ReductionReport {
    /// Wavelength of the lens barrel frame
    pub wavelength: Vec<f64>,
    /// Lens barrel to reference ratio
    pub ratio: Vec<f64>,
    /// Combined and smoothed frames, all but the darks are dark subtracted
    pub frames: BTreeMap<FrameGroup, Frame>,
    /// Saved images
    pub plots: Vec<PathBuf>,
    /// Saved FITS and CSV files
    pub exports: Vec<PathBuf>,
}
impl ReductionReport {
    /// Intensity of a group, empty if the group has no frame
    pub fn intensity(&self, group: FrameGroup) -> Result<Vec<f64>> {
        Ok(match self.frames.get(&group) {
            Some(frame) => frame.intensity()?,
            None => vec![],
        })
    }
    /// The ratio, reference, lens barrel and filter plots
    pub fn plot_requests(&self, limits: Option<PlotLimits>) -> Result<Vec<PlotRequest>> {
        let curve = |group: FrameGroup| -> Result<PlotRequest> {
            let y = self.intensity(group)?;
            let x = if y.is_empty() {
                vec![]
            } else {
                self.wavelength.clone()
            };
            Ok(PlotRequest::new(x, y))
        };
        let ratio = PlotRequest::new(self.wavelength.clone(), self.ratio.clone());
        let requests = match limits {
            Some(PlotLimits {
                wavelength: (xmin, xmax),
                ratio: (rmin, rmax),
                intensity: (imin, imax),
            }) => vec![
                ratio.limits([xmin, xmax, rmin, rmax]).title(RATIO_TITLE),
                curve(FrameGroup::Reference)?
                    .limits([xmin, xmax, imin, imax])
                    .title("Ref"),
                curve(FrameGroup::Lens)?
                    .limits([xmin, xmax, imin, imax])
                    .title("Lens Barrel"),
                curve(FrameGroup::Filter1)?
                    .limits([Some(xmin), Some(xmax), None, None])
                    .title("Filter_1"),
                curve(FrameGroup::Filter2)?
                    .limits([Some(xmin), Some(xmax), None, None])
                    .title("Filter_2"),
            ],
            None => vec![
                ratio.title(RATIO_TITLE),
                curve(FrameGroup::Reference)?.title("Ref"),
                curve(FrameGroup::Lens)?.title("Lens Barrel"),
                curve(FrameGroup::Filter1)?.title("Filter_1"),
                curve(FrameGroup::Filter2)?.title("Filter_2"),
            ],
        };
        Ok(requests)
    }
    /// Writes each frame to `<group>.fits` and the ratio to `lens_by_ref.fits` in `dir`
    pub fn to_fits<P: AsRef<Path>>(&self, dir: P) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        let mut paths = self
            .frames
            .iter()
            .map(|(group, frame)| Ok(write_fits(dir.join(format!("{group}.fits")), frame)?))
            .collect::<Result<Vec<PathBuf>>>()?;
        let ratio = Frame::from_columns(&[self.wavelength.as_slice(), self.ratio.as_slice()])?;
        paths.push(write_fits(dir.join("lens_by_ref.fits"), &ratio)?);
        Ok(paths)
    }
    /// Writes the wavelength, ratio and intensities to a CSV file
    pub fn to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let lens = self.intensity(FrameGroup::Lens)?;
        let reference = self.intensity(FrameGroup::Reference)?;
        let filter_1 = self.intensity(FrameGroup::Filter1)?;
        let filter_2 = self.intensity(FrameGroup::Filter2)?;
        let mut wtr = csv::Writer::from_path(path.as_ref())?;
        for (k, (&wavelength, &ratio)) in self.wavelength.iter().zip(&self.ratio).enumerate() {
            wtr.serialize(Row {
                wavelength,
                ratio,
                lens: lens[k],
                reference: reference[k],
                filter_1: filter_1.get(k).copied(),
                filter_2: filter_2.get(k).copied(),
            })?;
        }
        wtr.flush().map_err(csv::Error::from)?;
        log::info!("Saved {:?}", path.as_ref());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const N_ROWS: usize = 20;

    fn temp_dir(name: &str) -> PathBuf {
        let dir =
            std::env::temp_dir().join(format!("spectral-pipeline-{}-{name}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn wavelength(i: usize) -> f64 {
        400. + 15. * i as f64
    }

    fn write_frame(path: PathBuf, intensity: impl Fn(usize) -> f64) {
        let mut contents = crate::frame::tests::header();
        for i in 0..N_ROWS {
            contents.push_str(&format!("{:.2}\t{:.4}\n", wavelength(i), intensity(i)));
        }
        fs::write(path, contents).unwrap();
    }

    fn small() -> PlotConfig {
        PlotConfig {
            dpi: 20,
            ..Default::default()
        }
    }

    fn png_files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".png"))
            .collect();
        names.sort();
        names
    }

    #[test]
    fn end_to_end() {
        let dir = temp_dir("e2e");
        for (k, (dark, lens, reference)) in [(1., 9., 4.), (2., 10., 5.), (3., 11., 100.)]
            .into_iter()
            .enumerate()
        {
            write_frame(dir.join(format!("dark{k}.txt")), |_| dark);
            write_frame(dir.join(format!("lens{k}.txt")), |_| lens);
            write_frame(dir.join(format!("ref{k}.txt")), |_| reference);
        }
        let report = Pipeline::default()
            .data_path(&dir)
            .plot_config(small())
            .run()
            .unwrap();

        assert_eq!(
            png_files(&dir),
            vec![
                "Filter_1.png",
                "Filter_2.png",
                "Lens Barrel.png",
                "LensBarrel_Ref.png",
                "Ref.png"
            ]
        );
        assert_eq!(report.plots.len(), 5);
        assert_eq!(report.plots[0], dir.join("LensBarrel_Ref.png"));
        assert_eq!(report.ratio.len(), N_ROWS);
        report
            .ratio
            .iter()
            .for_each(|r| assert!((r - 8. / 3.).abs() < 1e-12));
        assert_eq!(report.wavelength[1], 415.);
        assert!(report.exports.is_empty());
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn stage_sequence() {
        let dir = temp_dir("sequence");
        let signal = |scale: f64| move |i: usize| scale * (1. + (i * i % 7) as f64);
        write_frame(dir.join("dark.txt"), signal(1.));
        write_frame(dir.join("lens.txt"), signal(5.));
        write_frame(dir.join("ref.txt"), |i| 100. + i as f64);
        write_frame(dir.join("filter (1).txt"), signal(3.));
        let report = Pipeline::default()
            .data_path(&dir)
            .plot_config(small())
            .auto_limits()
            .run()
            .unwrap();

        let raw = |f: &dyn Fn(usize) -> f64| (0..N_ROWS).map(f).collect::<Vec<f64>>();
        let dark = moving_average(&raw(&signal(1.)), 3).unwrap();
        let mut lens = moving_average(&raw(&signal(5.)), 3).unwrap();
        let mut reference = moving_average(&raw(&|i: usize| 100. + i as f64), 3).unwrap();
        subtract_dark(&mut lens, &dark).unwrap();
        subtract_dark(&mut reference, &dark).unwrap();
        let expected = ratio(&lens, &reference).unwrap();
        report
            .ratio
            .iter()
            .zip(&expected)
            .for_each(|(a, b)| assert!((a - b).abs() < 1e-9, "{a} != {b}"));

        let filter_1 = report.intensity(FrameGroup::Filter1).unwrap();
        let mut expected = moving_average(&raw(&signal(3.)), 3).unwrap();
        subtract_dark(&mut expected, &dark).unwrap();
        filter_1
            .iter()
            .zip(&expected)
            .for_each(|(a, b)| assert!((a - b).abs() < 1e-9));
        assert!(report.intensity(FrameGroup::Filter2).unwrap().is_empty());
        assert_eq!(report.intensity(FrameGroup::Darks).unwrap().len(), N_ROWS);
        assert_eq!(png_files(&dir).len(), 5);
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn missing_reference() {
        let dir = temp_dir("missing");
        write_frame(dir.join("dark.txt"), |_| 1.);
        write_frame(dir.join("lens.txt"), |_| 2.);
        let err = Pipeline::default().data_path(&dir).run().unwrap_err();
        assert!(matches!(
            err,
            Error::MissingGroup(FrameGroup::Reference, _)
        ));
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn mismatched_frames() {
        let dir = temp_dir("mismatch");
        write_frame(dir.join("dark.txt"), |_| 1.);
        write_frame(dir.join("lens.txt"), |_| 2.);
        let mut short = crate::frame::tests::header();
        short.push_str("400 3\n401 3\n");
        fs::write(dir.join("ref.txt"), short).unwrap();
        let err = Pipeline::default().data_path(&dir).run().unwrap_err();
        assert!(matches!(
            err,
            Error::Calibration(FrameGroup::Reference, _)
        ));
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn exports() {
        let dir = temp_dir("exports");
        write_frame(dir.join("dark.txt"), |_| 1.);
        write_frame(dir.join("lens.txt"), |_| 5.);
        write_frame(dir.join("ref.txt"), |_| 3.);
        let csv = dir.join("reduction.csv");
        let report = Pipeline::default()
            .data_path(&dir)
            .plot_config(small())
            .fits()
            .csv(&csv)
            .run()
            .unwrap();
        assert_eq!(
            report.exports,
            vec![
                dir.join("dark.fits"),
                dir.join("lens.fits"),
                dir.join("ref.fits"),
                dir.join("lens_by_ref.fits"),
                csv.clone()
            ]
        );
        let ratio = crate::fits::read_fits(dir.join("lens_by_ref.fits")).unwrap();
        assert_eq!(ratio.intensity().unwrap(), vec![2.; N_ROWS]);

        let mut rdr = csv::Reader::from_path(&csv).unwrap();
        assert_eq!(
            rdr.headers().unwrap().iter().collect::<Vec<_>>(),
            vec![
                "Wavelength",
                "LensBarrel/Ref",
                "LensBarrel",
                "Ref",
                "Filter_1",
                "Filter_2"
            ]
        );
        let records: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), N_ROWS);
        assert_eq!(&records[0][0], "400.0");
        assert_eq!(&records[0][1], "2.0");
        assert_eq!(&records[0][4], "");

        // a second run keeps the first exports
        let report = Pipeline::default()
            .data_path(&dir)
            .plot_config(small())
            .fits()
            .run()
            .unwrap();
        assert_eq!(report.exports[0], dir.join("new_dark.fits"));
        fs::remove_dir_all(dir).unwrap();
    }
}
