//! Regression implementations for trend estimation
//!
//! Contains:
//! - Ordinary least squares with correlation and significance statistics
//! - Polynomial least squares on a standardized predictor

use crate::{MathError, Result};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Guards the t statistic against division by zero for perfect correlations
const TINY: f64 = 1.0e-20;

/// Ordinary least squares fit of `y` on `x`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearFit {
    /// Slope of the regression line
    pub slope: f64,
    /// Intercept of the regression line
    pub intercept: f64,
    /// Pearson correlation coefficient
    pub r_value: f64,
    /// Two-sided p-value for a null hypothesis of zero slope
    pub p_value: f64,
    /// Standard error of the estimated slope
    pub std_err: f64,
    /// Number of observations used
    pub n: usize,
}

impl LinearFit {
    /// Fit a straight line through `(x, y)` pairs.
    ///
    /// The correlation is clipped to `[-1, 1]` and is zero when either
    /// variable has no spread. With exactly two points the p-value is `1.0`
    /// for equal responses and `0.0` otherwise; beyond that it comes from a
    /// Student-t distribution with `n - 2` degrees of freedom.
    pub fn fit(x: &[f64], y: &[f64]) -> Result<Self> {
        if x.len() != y.len() {
            return Err(MathError::InvalidInput(format!(
                "x and y must have the same length ({} vs {})",
                x.len(),
                y.len()
            )));
        }
        let n = x.len();
        if n < 2 {
            return Err(MathError::InsufficientData(format!(
                "Linear regression needs at least 2 points, have {}",
                n
            )));
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(MathError::InvalidInput(
                "Regression input must be finite".to_string(),
            ));
        }

        let nf = n as f64;
        let x_mean = x.iter().sum::<f64>() / nf;
        let y_mean = y.iter().sum::<f64>() / nf;

        let mut ssxm = 0.0;
        let mut ssym = 0.0;
        let mut ssxym = 0.0;
        for (&xi, &yi) in x.iter().zip(y.iter()) {
            let dx = xi - x_mean;
            let dy = yi - y_mean;
            ssxm += dx * dx;
            ssym += dy * dy;
            ssxym += dx * dy;
        }
        ssxm /= nf;
        ssym /= nf;
        ssxym /= nf;

        if ssxm == 0.0 {
            return Err(MathError::CalculationError(
                "Cannot fit a line: all x values are identical".to_string(),
            ));
        }

        let r_value = if ssym == 0.0 {
            0.0
        } else {
            (ssxym / (ssxm * ssym).sqrt()).clamp(-1.0, 1.0)
        };

        let slope = ssxym / ssxm;
        let intercept = y_mean - slope * x_mean;

        let (p_value, std_err) = if n == 2 {
            let p = if y[0] == y[1] { 1.0 } else { 0.0 };
            (p, 0.0)
        } else {
            let df = (n - 2) as f64;
            let t = r_value * (df / ((1.0 - r_value + TINY) * (1.0 + r_value + TINY))).sqrt();
            let dist = StudentsT::new(0.0, 1.0, df)
                .map_err(|e| MathError::CalculationError(e.to_string()))?;
            let p = 2.0 * dist.cdf(-t.abs());
            let se = ((1.0 - r_value * r_value) * ssym / ssxm / df).sqrt();
            (p, se)
        };

        Ok(Self {
            slope,
            intercept,
            r_value,
            p_value,
            std_err,
            n,
        })
    }

    /// Coefficient of determination (`r²`)
    pub fn r_squared(&self) -> f64 {
        self.r_value * self.r_value
    }

    /// Predicted response at `x`
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Polynomial least squares regression of a single predictor.
///
/// The predictor is standardized before the power basis is built, which keeps
/// the normal equations well conditioned for calendar years. Predictions are
/// identical to fitting the raw powers.
#[derive(Debug, Clone, PartialEq)]
pub struct PolynomialRegression {
    degree: usize,
    x_mean: f64,
    x_scale: f64,
    coefficients: Vec<f64>,
}

impl PolynomialRegression {
    /// Fit a polynomial of the given degree
    pub fn fit(x: &[f64], y: &[f64], degree: usize) -> Result<Self> {
        if degree == 0 {
            return Err(MathError::InvalidInput(
                "Polynomial degree must be at least 1".to_string(),
            ));
        }
        if x.len() != y.len() {
            return Err(MathError::InvalidInput(format!(
                "x and y must have the same length ({} vs {})",
                x.len(),
                y.len()
            )));
        }
        if x.len() <= degree {
            return Err(MathError::InsufficientData(format!(
                "Polynomial of degree {} needs at least {} points, have {}",
                degree,
                degree + 1,
                x.len()
            )));
        }

        let n = x.len() as f64;
        let x_mean = x.iter().sum::<f64>() / n;
        let x_scale = (x.iter().map(|v| (v - x_mean).powi(2)).sum::<f64>() / n).sqrt();
        if !x_scale.is_finite() || x_scale == 0.0 {
            return Err(MathError::CalculationError(
                "Cannot fit a polynomial: x values have no spread".to_string(),
            ));
        }

        let terms = degree + 1;
        let mut xtx = vec![vec![0.0; terms]; terms];
        let mut xty = vec![0.0; terms];

        for (&xi, &yi) in x.iter().zip(y.iter()) {
            let row = power_basis((xi - x_mean) / x_scale, degree);
            for i in 0..terms {
                xty[i] += row[i] * yi;
                for j in 0..terms {
                    xtx[i][j] += row[i] * row[j];
                }
            }
        }

        let coefficients = solve_linear_system(xtx, xty)?;

        Ok(Self {
            degree,
            x_mean,
            x_scale,
            coefficients,
        })
    }

    /// Degree of the fitted polynomial
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Predicted response at `x`
    pub fn predict(&self, x: f64) -> f64 {
        let z = (x - self.x_mean) / self.x_scale;
        // Horner evaluation
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, &c| acc * z + c)
    }
}

fn power_basis(z: f64, degree: usize) -> Vec<f64> {
    let mut row = Vec::with_capacity(degree + 1);
    let mut value = 1.0;
    for _ in 0..=degree {
        row.push(value);
        value *= z;
    }
    row
}

/// Gaussian elimination with partial pivoting
fn solve_linear_system(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);

        if a[pivot][col].abs() < 1e-12 {
            return Err(MathError::CalculationError(
                "Normal equations are singular".to_string(),
            ));
        }

        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut solution = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * solution[k]).sum();
        solution[row] = (b[row] - tail) / a[row][row];
    }

    Ok(solution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_perfect_line() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [3.0, 5.0, 7.0, 9.0, 11.0];
        let fit = LinearFit::fit(&x, &y).unwrap();

        assert_relative_eq!(fit.slope, 2.0, epsilon = 1e-12);
        assert_relative_eq!(fit.intercept, 1.0, epsilon = 1e-12);
        assert_relative_eq!(fit.r_squared(), 1.0, epsilon = 1e-12);
        assert!(fit.p_value < 1e-10);
        assert_relative_eq!(fit.predict(6.0), 13.0, epsilon = 1e-12);
    }

    #[test]
    fn test_noisy_line_statistics() {
        // Reference values from a classical least squares routine
        let x = [0.0, 1.0, 2.0, 3.0, 4.0];
        let y = [1.0, 3.0, 2.0, 5.0, 4.0];
        let fit = LinearFit::fit(&x, &y).unwrap();

        assert_relative_eq!(fit.slope, 0.8, epsilon = 1e-12);
        assert_relative_eq!(fit.intercept, 1.4, epsilon = 1e-12);
        assert_relative_eq!(fit.r_value, 0.8, epsilon = 1e-12);
        assert_relative_eq!(fit.p_value, 0.10409, epsilon = 1e-4);
        assert_relative_eq!(fit.std_err, 0.34641016151377546, epsilon = 1e-9);
    }

    #[test]
    fn test_two_points() {
        let fit = LinearFit::fit(&[0.0, 1.0], &[1.0, 2.0]).unwrap();
        assert_eq!(fit.p_value, 0.0);
        let flat = LinearFit::fit(&[0.0, 1.0], &[1.0, 1.0]).unwrap();
        assert_eq!(flat.p_value, 1.0);
        assert_eq!(flat.r_value, 0.0);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(LinearFit::fit(&[1.0], &[1.0]).is_err());
        assert!(LinearFit::fit(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]).is_err());
        assert!(LinearFit::fit(&[1.0, 2.0], &[1.0]).is_err());
    }

    #[test]
    fn test_polynomial_recovers_cubic() {
        let x: Vec<f64> = (1900..1960).map(|y| y as f64).collect();
        let y: Vec<f64> = x
            .iter()
            .map(|&v| {
                let t = v - 1930.0;
                0.5 + 0.01 * t - 0.002 * t * t + 0.0001 * t * t * t
            })
            .collect();

        let model = PolynomialRegression::fit(&x, &y, 3).unwrap();
        assert_eq!(model.degree(), 3);

        let t: f64 = 2000.0 - 1930.0;
        let expected = 0.5 + 0.01 * t - 0.002 * t * t + 0.0001 * t * t * t;
        assert_relative_eq!(model.predict(2000.0), expected, epsilon = 1e-6);
    }

    #[test]
    fn test_polynomial_validation() {
        assert!(PolynomialRegression::fit(&[1.0, 2.0], &[1.0, 2.0], 3).is_err());
        assert!(PolynomialRegression::fit(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0], 1).is_err());
        assert!(PolynomialRegression::fit(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0], 0).is_err());
    }
}
