//! Pixel-wise combination of repeated exposures

use strum_macros::{Display, EnumString};

use crate::frame::{Frame, FrameError};

#[derive(Debug, thiserror::Error)]
pub enum CombineError {
    #[error("no frame to combine")]
    Empty,
    #[error("frame #{index} has shape {found:?}, expected {expected:?}")]
    Shape {
        index: usize,
        found: (usize, usize),
        expected: (usize, usize),
    },
    #[error("failed to build the combined frame")]
    Frame(#[from] FrameError),
}
type Result<T> = std::result::Result<T, CombineError>;

/// Element-wise reduction across a stack of frames
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Reduction {
    #[default]
    Mean,
    Median,
}
impl Reduction {
    /// Reduces a (non-empty) set of samples
    pub fn reduce(&self, samples: &mut [f64]) -> f64 {
        match self {
            Reduction::Mean => mean(samples),
            Reduction::Median => median(samples),
        }
    }
}

pub fn mean(samples: &[f64]) -> f64 {
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Median of `samples`, the mean of the two middle values for an even count
///
/// The samples are sorted in place. Any NaN sample makes the median NaN.
pub fn median(samples: &mut [f64]) -> f64 {
    if samples.iter().any(|s| s.is_nan()) {
        return f64::NAN;
    }
    samples.sort_by(|a, b| a.total_cmp(b));
    let n = samples.len();
    if n % 2 == 1 {
        samples[n / 2]
    } else {
        0.5 * (samples[n / 2 - 1] + samples[n / 2])
    }
}

/// Combines equally shaped frames into a single frame
pub fn combine(frames: &[Frame], reduction: Reduction) -> Result<Frame> {
    let first = frames.first().ok_or(CombineError::Empty)?;
    let expected = first.shape();
    if let Some((index, frame)) = frames
        .iter()
        .enumerate()
        .find(|(_, frame)| frame.shape() != expected)
    {
        return Err(CombineError::Shape {
            index,
            found: frame.shape(),
            expected,
        });
    }
    let mut stack = vec![0f64; frames.len()];
    let data: Vec<f64> = (0..first.as_slice().len())
        .map(|i| {
            stack
                .iter_mut()
                .zip(frames)
                .for_each(|(s, frame)| *s = frame.as_slice()[i]);
            reduction.reduce(&mut stack)
        })
        .collect();
    let (n_rows, n_cols) = expected;
    Ok(Frame::new(n_rows, n_cols, data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn random_frames(n: usize) -> Vec<Frame> {
        let mut rng = rand::thread_rng();
        (0..n)
            .map(|_| Frame::new(7, 2, (0..14).map(|_| rng.gen_range(-10f64..10f64)).collect()))
            .collect::<std::result::Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn mean_per_cell() {
        for n in 1..5 {
            let frames = random_frames(n);
            let combined = combine(&frames, Reduction::Mean).unwrap();
            assert_eq!(combined.shape(), (7, 2));
            for (i, value) in combined.as_slice().iter().enumerate() {
                let expected =
                    frames.iter().map(|f| f.as_slice()[i]).sum::<f64>() / frames.len() as f64;
                assert!((value - expected).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn median_per_cell() {
        for n in 1..6 {
            let frames = random_frames(n);
            let combined = combine(&frames, Reduction::Median).unwrap();
            for (i, value) in combined.as_slice().iter().enumerate() {
                let mut cell: Vec<f64> = frames.iter().map(|f| f.as_slice()[i]).collect();
                cell.sort_by(|a, b| a.partial_cmp(b).unwrap());
                let expected = if n % 2 == 1 {
                    cell[n / 2]
                } else {
                    (cell[n / 2 - 1] + cell[n / 2]) / 2.
                };
                assert_eq!(*value, expected);
            }
        }
    }

    #[test]
    fn median_of_known_values() {
        assert_eq!(median(&mut [3., 1., 2.]), 2.);
        assert_eq!(median(&mut [4., 1., 3., 2.]), 2.5);
        let frames = vec![
            Frame::from_columns(&[&[1., 1.], &[10., 0.]]).unwrap(),
            Frame::from_columns(&[&[1., 1.], &[30., 5.]]).unwrap(),
            Frame::from_columns(&[&[1., 1.], &[20., 100.]]).unwrap(),
        ];
        let combined = combine(&frames, Reduction::Median).unwrap();
        assert_eq!(combined.intensity().unwrap(), vec![20., 5.]);
        let combined = combine(&frames, Reduction::Mean).unwrap();
        assert_eq!(combined.intensity().unwrap(), vec![20., 35.]);
    }

    #[test]
    fn nan_samples() {
        assert!(median(&mut [1., f64::NAN, 2.]).is_nan());
        assert!(median(&mut [f64::NAN, 4., 1., 3.]).is_nan());
        let frames = vec![
            Frame::from_columns(&[&[1., 2.], &[10., 1.]]).unwrap(),
            Frame::from_columns(&[&[1., 2.], &[f64::NAN, 2.]]).unwrap(),
            Frame::from_columns(&[&[1., 2.], &[20., 3.]]).unwrap(),
        ];
        for reduction in [Reduction::Median, Reduction::Mean] {
            let intensity = combine(&frames, reduction).unwrap().intensity().unwrap();
            assert!(intensity[0].is_nan());
            assert_eq!(intensity[1], 2.);
        }
    }

    #[test]
    fn empty_and_mismatched() {
        assert!(matches!(
            combine(&[], Reduction::Mean).unwrap_err(),
            CombineError::Empty
        ));
        let frames = vec![
            Frame::from_columns(&[&[1., 2.], &[1., 2.]]).unwrap(),
            Frame::from_columns(&[&[1., 2., 3.], &[1., 2., 3.]]).unwrap(),
        ];
        assert!(matches!(
            combine(&frames, Reduction::Median).unwrap_err(),
            CombineError::Shape {
                index: 1,
                found: (3, 2),
                expected: (2, 2)
            }
        ));
    }

    #[test]
    fn reduction_from_str() {
        assert_eq!("median".parse::<Reduction>().unwrap(), Reduction::Median);
        assert_eq!(Reduction::default(), Reduction::Mean);
        assert_eq!(Reduction::Mean.to_string(), "mean");
    }
}
