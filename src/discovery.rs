//! Measurement file discovery
//!
//! The spectrometer files of a session are sorted into groups by name.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use strum_macros::EnumIter;

#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("invalid file pattern")]
    Pattern(#[from] glob::PatternError),
    #[error("failed to read a matching path")]
    Glob(#[from] glob::GlobError),
    #[error("{0:?} is not a valid UTF-8 path")]
    Path(PathBuf),
}
type Result<T> = std::result::Result<T, DiscoveryError>;

/// Optical configurations of a measurement session
#[derive(EnumIter, Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord)]
pub enum FrameGroup {
    Darks,
    Filter1,
    Filter2,
    Lens,
    Reference,
}
impl FrameGroup {
    /// File name pattern of the group
    pub fn pattern(&self) -> &'static str {
        use FrameGroup::*;
        match self {
            Darks => "dark*.txt",
            Filter1 => "filter (*.txt",
            Filter2 => "filter_2*.txt",
            Lens => "lens*.txt",
            Reference => "ref*.txt",
        }
    }
    /// Whether the reduction can proceed without any file of the group
    pub fn is_optional(&self) -> bool {
        matches!(self, FrameGroup::Filter1 | FrameGroup::Filter2)
    }
    /// Returns the sorted list of the group files in `dir`
    pub fn glob<P: AsRef<Path>>(&self, dir: P) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        let dir_str = dir
            .to_str()
            .ok_or_else(|| DiscoveryError::Path(dir.to_path_buf()))?;
        let pattern = Path::new(&glob::Pattern::escape(dir_str)).join(self.pattern());
        let pattern = pattern
            .to_str()
            .ok_or_else(|| DiscoveryError::Path(pattern.clone()))?;
        let mut paths = glob::glob(pattern)?
            .collect::<std::result::Result<Vec<PathBuf>, glob::GlobError>>()?;
        paths.retain(|p| p.is_file());
        paths.sort();
        Ok(paths)
    }
}
impl fmt::Display for FrameGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use FrameGroup::*;
        match self {
            Darks => write!(f, "dark"),
            Filter1 => write!(f, "filter_1"),
            Filter2 => write!(f, "filter_2"),
            Lens => write!(f, "lens"),
            Reference => write!(f, "ref"),
        }
    }
}
