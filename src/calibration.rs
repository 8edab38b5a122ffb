//! Dark subtraction and flux ratio

#[derive(Debug, thiserror::Error)]
pub enum CalibrationError {
    #[error("length mismatch: {0} samples against {1}")]
    Length(usize, usize),
}
type Result<T> = std::result::Result<T, CalibrationError>;

fn check_len(a: &[f64], b: &[f64]) -> Result<()> {
    if a.len() == b.len() {
        Ok(())
    } else {
        Err(CalibrationError::Length(a.len(), b.len()))
    }
}

/// Subtracts the `dark` signal from `signal` in place
pub fn subtract_dark(signal: &mut [f64], dark: &[f64]) -> Result<()> {
    check_len(signal, dark)?;
    signal.iter_mut().zip(dark).for_each(|(s, d)| *s -= d);
    Ok(())
}

/// Returns the element-wise ratio `numerator / denominator`
///
/// Zero denominators yield infinities or NaN, which are kept in the output.
pub fn ratio(numerator: &[f64], denominator: &[f64]) -> Result<Vec<f64>> {
    check_len(numerator, denominator)?;
    let ratio: Vec<f64> = numerator
        .iter()
        .zip(denominator)
        .map(|(n, d)| n / d)
        .collect();
    let n_non_finite = ratio.iter().filter(|r| !r.is_finite()).count();
    if n_non_finite > 0 {
        log::warn!(
            "{} out of {} ratio samples are not finite",
            n_non_finite,
            ratio.len()
        );
    }
    Ok(ratio)
}
