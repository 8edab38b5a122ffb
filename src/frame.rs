//! Spectrometer frames
//!
//! A frame is the numeric table exported by the spectrometer: column 0 is the
//! wavelength and column 1 the intensity, any further columns are carried along.

use std::{
    fs,
    path::{Path, PathBuf},
};

/// Number of instrument header lines preceding the data rows
pub const HEADER_LINES: usize = 14;

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("failed to read {1:?}")]
    Io(#[source] std::io::Error, PathBuf),
    #[error("{path:?} has {lines} lines, expected a header of {header} lines")]
    Header {
        path: PathBuf,
        lines: usize,
        header: usize,
    },
    #[error("{path:?} line {line}: {token:?} is not a number")]
    Parse {
        path: PathBuf,
        line: usize,
        token: String,
    },
    #[error("{path:?} line {line}: found {found} columns, expected {expected}")]
    Ragged {
        path: PathBuf,
        line: usize,
        found: usize,
        expected: usize,
    },
    #[error("{0:?} has no data rows after the header")]
    Empty(PathBuf),
    #[error("frame data length {len} doesn't match shape {n_rows}x{n_cols}")]
    Shape {
        len: usize,
        n_rows: usize,
        n_cols: usize,
    },
    #[error("column {column} out of range, the frame has {n_cols} columns")]
    Column { column: usize, n_cols: usize },
}
type Result<T> = std::result::Result<T, FrameError>;

/// A 2-D numeric table stored row-major
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    n_rows: usize,
    n_cols: usize,
    data: Vec<f64>,
}
impl Frame {
    /// Creates a frame from row-major `data`
    pub fn new(n_rows: usize, n_cols: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != n_rows * n_cols {
            return Err(FrameError::Shape {
                len: data.len(),
                n_rows,
                n_cols,
            });
        }
        Ok(Self {
            n_rows,
            n_cols,
            data,
        })
    }
    /// Creates a frame from equal length columns
    pub fn from_columns(columns: &[&[f64]]) -> Result<Self> {
        let n_cols = columns.len();
        let n_rows = columns.first().map_or(0, |c| c.len());
        if let Some(c) = columns.iter().find(|c| c.len() != n_rows) {
            return Err(FrameError::Shape {
                len: c.len(),
                n_rows,
                n_cols,
            });
        }
        let data = (0..n_rows)
            .flat_map(|i| columns.iter().map(move |c| c[i]))
            .collect();
        Self::new(n_rows, n_cols, data)
    }
    /// Loads a frame from a text file, skipping the default instrument header
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_path_with_header(path, HEADER_LINES)
    }
    /// Loads a frame from a text file, skipping `header` lines
    pub fn from_path_with_header<P: AsRef<Path>>(path: P, header: usize) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Loading {:?}...", path);
        let contents =
            fs::read_to_string(path).map_err(|e| FrameError::Io(e, path.to_path_buf()))?;
        Self::parse(&contents, header, path)
    }
    fn parse(contents: &str, header: usize, path: &Path) -> Result<Self> {
        let lines: Vec<&str> = contents.lines().collect();
        if lines.len() < header {
            return Err(FrameError::Header {
                path: path.to_path_buf(),
                lines: lines.len(),
                header,
            });
        }
        let mut n_cols = 0;
        let mut data = vec![];
        for (k, line) in lines.iter().enumerate().skip(header) {
            let line = line.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }
            let row = line
                .split_whitespace()
                .map(|token| {
                    token.parse::<f64>().map_err(|_| FrameError::Parse {
                        path: path.to_path_buf(),
                        line: k + 1,
                        token: token.to_string(),
                    })
                })
                .collect::<Result<Vec<f64>>>()?;
            if n_cols == 0 {
                n_cols = row.len();
            } else if row.len() != n_cols {
                return Err(FrameError::Ragged {
                    path: path.to_path_buf(),
                    line: k + 1,
                    found: row.len(),
                    expected: n_cols,
                });
            }
            data.extend(row);
        }
        if data.is_empty() {
            return Err(FrameError::Empty(path.to_path_buf()));
        }
        Self::new(data.len() / n_cols, n_cols, data)
    }
    /// Returns (# of rows, # of columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.n_cols)
    }
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }
    /// Row-major data
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }
    /// Returns a copy of column `j`
    pub fn column(&self, j: usize) -> Result<Vec<f64>> {
        self.check_column(j)?;
        Ok(self.data.iter().skip(j).step_by(self.n_cols).copied().collect())
    }
    /// Overwrites column `j` with `values`
    pub fn set_column(&mut self, j: usize, values: &[f64]) -> Result<()> {
        self.check_column(j)?;
        if values.len() != self.n_rows {
            return Err(FrameError::Shape {
                len: values.len(),
                n_rows: self.n_rows,
                n_cols: 1,
            });
        }
        self.data
            .iter_mut()
            .skip(j)
            .step_by(self.n_cols)
            .zip(values)
            .for_each(|(d, &v)| *d = v);
        Ok(())
    }
    /// The wavelength column
    pub fn x(&self) -> Result<Vec<f64>> {
        self.column(0)
    }
    /// The intensity column
    pub fn intensity(&self) -> Result<Vec<f64>> {
        self.column(1)
    }
    fn check_column(&self, j: usize) -> Result<()> {
        if j < self.n_cols {
            Ok(())
        } else {
            Err(FrameError::Column {
                column: j,
                n_cols: self.n_cols,
            })
        }
    }
}
