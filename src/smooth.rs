//! Centered moving average

/// Default moving average window
pub const WINDOW: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum SmoothError {
    #[error("moving average window must be at least 1")]
    Window,
}

/// Maps an out of range index onto `0..n` by half-sample symmetric reflection
/// (`d c b a | a b c d | d c b a`)
fn reflect(index: isize, n: usize) -> usize {
    let period = 2 * n as isize;
    let m = index.rem_euclid(period);
    if m < n as isize {
        m as usize
    } else {
        (period - 1 - m) as usize
    }
}

/// Returns the moving average of `values` over `window` samples
///
/// The window for sample `i` spans `i - window/2 ..= i - window/2 + window - 1`,
/// samples beyond the edges are reflected.
pub fn moving_average(values: &[f64], window: usize) -> Result<Vec<f64>, SmoothError> {
    if window == 0 {
        return Err(SmoothError::Window);
    }
    let n = values.len();
    if n == 0 {
        return Ok(vec![]);
    }
    let lag = (window / 2) as isize;
    Ok((0..n as isize)
        .map(|i| {
            (i - lag..i - lag + window as isize)
                .map(|k| values[reflect(k, n)])
                .sum::<f64>()
                / window as f64
        })
        .collect())
}
