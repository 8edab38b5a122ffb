//! FITS export of processed frames

use std::path::{Path, PathBuf};

use fitrs::{Fits, FitsData, FitsDataArray, Hdu};

use crate::frame::{Frame, FrameError};

/// Prefix of the fallback file name when the destination already exists
pub const FALLBACK_PREFIX: &str = "new_";

#[derive(Debug, thiserror::Error)]
pub enum FitsError {
    #[error("{0:?} and its fallback already exist")]
    Exists(PathBuf),
    #[error("{0:?} has no file name")]
    FileName(PathBuf),
    #[error("failed to access {1:?}")]
    Io(#[source] std::io::Error, PathBuf),
    #[error("{0:?} doesn't hold a 2D 64-bit floating point image")]
    Format(PathBuf),
    #[error("invalid FITS image")]
    Frame(#[from] FrameError),
}
type Result<T> = std::result::Result<T, FitsError>;

/// Returns `new_<file name>` next to `path`
pub fn fallback_path(path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .ok_or_else(|| FitsError::FileName(path.to_path_buf()))?;
    let mut fallback = std::ffi::OsString::from(FALLBACK_PREFIX);
    fallback.push(name);
    Ok(path.with_file_name(fallback))
}

fn create(path: &Path, frame: &Frame) -> Result<()> {
    let (n_rows, n_cols) = frame.shape();
    let hdu = Hdu::new(&[n_cols, n_rows], frame.as_slice().to_vec());
    Fits::create(path, hdu).map_err(|e| FitsError::Io(e, path.to_path_buf()))?;
    Ok(())
}

/// Writes `frame` to the FITS file `path` and returns the written path
///
/// Existing files are never overwritten: if `path` exists the frame is written
/// to `new_<file name>` instead, if that one exists too the write fails.
pub fn write_fits<P: AsRef<Path>>(path: P, frame: &Frame) -> Result<PathBuf> {
    let path = path.as_ref();
    let path = if path.exists() {
        let fallback = fallback_path(path)?;
        if fallback.exists() {
            return Err(FitsError::Exists(path.to_path_buf()));
        }
        log::warn!("{:?} already exists, writing {:?} instead", path, fallback);
        fallback
    } else {
        path.to_path_buf()
    };
    create(&path, frame)?;
    log::info!("Saved {:?}", path);
    Ok(path)
}

/// Reads the primary image of a FITS file written by [write_fits]
pub fn read_fits<P: AsRef<Path>>(path: P) -> Result<Frame> {
    let path = path.as_ref();
    let fits = Fits::open(path).map_err(|e| FitsError::Io(e, path.to_path_buf()))?;
    let hdu = fits
        .get(0)
        .ok_or_else(|| FitsError::Format(path.to_path_buf()))?;
    match hdu.read_data() {
        FitsData::FloatingPoint64(FitsDataArray { shape, data }) if shape.len() == 2 => {
            Ok(Frame::new(shape[1], shape[0], data.to_vec())?)
        }
        _ => Err(FitsError::Format(path.to_path_buf())),
    }
}
