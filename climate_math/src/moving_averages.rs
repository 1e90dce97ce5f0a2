//! Moving average calculations
//!
//! Contains the centered moving average used to smooth yearly series.

use crate::{MathError, Result};

/// Centered moving average with a shrinking window at the edges.
///
/// For position `i` the window covers `[i + 1 + (w - 1) / 2 - w, i + (w - 1) / 2]`,
/// clipped to the bounds of `values`. Near the boundaries the mean is taken
/// over however many points fall inside the series, so the output has the same
/// length as the input and never contains gaps. For an even `window` the extra
/// point falls before the center.
pub fn centered_rolling_mean(values: &[f64], window: usize) -> Result<Vec<f64>> {
    if window == 0 {
        return Err(MathError::InvalidInput(
            "Window must be greater than zero".to_string(),
        ));
    }

    let n = values.len();
    let offset = (window - 1) / 2;

    let smoothed = (0..n)
        .map(|i| {
            let end = (i + 1 + offset).min(n);
            let start = (i + 1 + offset).saturating_sub(window);
            let slice = &values[start..end];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect();

    Ok(smoothed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_window_shrinks_at_boundaries() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        let smoothed = centered_rolling_mean(&values, 5).unwrap();

        assert_eq!(smoothed.len(), values.len());
        // First element: mean of 1, 2, 3
        assert_relative_eq!(smoothed[0], 2.0);
        // Second element: mean of 1..=4
        assert_relative_eq!(smoothed[1], 2.5);
        // Interior element: full window 1..=5
        assert_relative_eq!(smoothed[2], 3.0);
        // Last element: mean of 5, 6, 7
        assert_relative_eq!(smoothed[6], 6.0);
    }

    #[test]
    fn test_even_window_leans_backwards() {
        let values = [1.0, 2.0, 3.0, 4.0];
        let smoothed = centered_rolling_mean(&values, 2).unwrap();
        // Window for i covers [i - 1, i]
        assert_relative_eq!(smoothed[0], 1.0);
        assert_relative_eq!(smoothed[1], 1.5);
        assert_relative_eq!(smoothed[3], 3.5);
    }

    #[test]
    fn test_window_of_one_is_identity() {
        let values = [0.3, -0.1, 0.8];
        assert_eq!(centered_rolling_mean(&values, 1).unwrap(), values.to_vec());
    }

    #[test]
    fn test_zero_window_is_rejected() {
        assert!(centered_rolling_mean(&[1.0], 0).is_err());
    }

    #[test]
    fn test_empty_input() {
        assert!(centered_rolling_mean(&[], 5).unwrap().is_empty());
    }
}
