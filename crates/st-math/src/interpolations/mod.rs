//! 1D interpolation trait and implementations.

use st_core::{errors::Result, Real};

/// A 1D interpolation function `f: R → R` defined by a set of known points.
pub trait Interpolation1D: std::fmt::Debug + Send + Sync {
    /// Evaluate the interpolation at `x`.
    fn operator(&self, x: Real) -> Real;

    /// Return the lower bound of the interpolation domain.
    fn x_min(&self) -> Real;

    /// Return the upper bound of the interpolation domain.
    fn x_max(&self) -> Real;

    /// Return `true` if `x` is within the interpolation range.
    fn is_in_range(&self, x: Real) -> bool {
        x >= self.x_min() && x <= self.x_max()
    }

    /// Evaluate with flat extrapolation outside `[x_min, x_max]`.
    fn operator_flat(&self, x: Real) -> Real {
        self.operator(x.clamp(self.x_min(), self.x_max()))
    }
}

// ── Linear ────────────────────────────────────────────────────────────────────

/// Linear interpolation.
///
/// `f(x) = y[i] + (y[i+1] - y[i]) * (x - x[i]) / (x[i+1] - x[i])`
#[derive(Debug, Clone)]
pub struct LinearInterpolation {
    xs: Vec<Real>,
    ys: Vec<Real>,
}

impl LinearInterpolation {
    /// Construct a linear interpolation from sorted `xs` and corresponding `ys`.
    ///
    /// # Errors
    /// Returns an error if the slices have different lengths, fewer than 2
    /// points, or `xs` is not strictly increasing.
    pub fn new(xs: &[Real], ys: &[Real]) -> Result<Self> {
        st_core::ensure!(xs.len() >= 2, "need at least 2 points for interpolation");
        st_core::ensure!(
            xs.len() == ys.len(),
            "xs and ys must have the same length"
        );
        st_core::ensure!(
            xs.windows(2).all(|w| w[1] > w[0]),
            "xs must be strictly increasing"
        );
        Ok(Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
        })
    }

    fn locate(&self, x: Real) -> usize {
        let n = self.xs.len();
        if x <= self.xs[0] {
            return 0;
        }
        if x >= self.xs[n - 1] {
            return n - 2;
        }
        // first index with xs[i] > x, minus one
        self.xs.partition_point(|&xi| xi <= x) - 1
    }
}

impl Interpolation1D for LinearInterpolation {
    fn x_min(&self) -> Real {
        self.xs[0]
    }

    fn x_max(&self) -> Real {
        self.xs[self.xs.len() - 1]
    }

    fn operator(&self, x: Real) -> Real {
        let i = self.locate(x);
        let dx = self.xs[i + 1] - self.xs[i];
        self.ys[i] + (x - self.xs[i]) * (self.ys[i + 1] - self.ys[i]) / dx
    }
}

// ── Log-linear ────────────────────────────────────────────────────────────────

/// Log-linear interpolation.
///
/// Interpolates `log(y)` linearly and exponentiates the result.
#[derive(Debug, Clone)]
pub struct LogLinearInterpolation {
    inner: LinearInterpolation,
}

impl LogLinearInterpolation {
    /// Construct a log-linear interpolation.
    ///
    /// All `ys` values must be strictly positive.
    pub fn new(xs: &[Real], ys: &[Real]) -> Result<Self> {
        st_core::ensure!(
            ys.iter().all(|&y| y > 0.0),
            "all y values must be positive for log-linear interpolation"
        );
        let log_ys: Vec<Real> = ys.iter().map(|&y| y.ln()).collect();
        Ok(Self {
            inner: LinearInterpolation::new(xs, &log_ys)?,
        })
    }
}

impl Interpolation1D for LogLinearInterpolation {
    fn x_min(&self) -> Real {
        self.inner.x_min()
    }

    fn x_max(&self) -> Real {
        self.inner.x_max()
    }

    fn operator(&self, x: Real) -> Real {
        self.inner.operator(x).exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn linear_interpolation() {
        let xs = [0.0, 1.0, 2.0];
        let ys = [0.0, 1.0, 4.0];
        let interp = LinearInterpolation::new(&xs, &ys).unwrap();
        assert_abs_diff_eq!(interp.operator(0.5), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(interp.operator(1.5), 2.5, epsilon = 1e-12);
        assert_abs_diff_eq!(interp.operator(2.0), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn linear_flat_extrapolation() {
        let interp = LinearInterpolation::new(&[1.0, 2.0], &[0.1, 0.2]).unwrap();
        assert_abs_diff_eq!(interp.operator_flat(0.0), 0.1, epsilon = 1e-15);
        assert_abs_diff_eq!(interp.operator_flat(5.0), 0.2, epsilon = 1e-15);
        // plain operator extrapolates linearly
        assert_abs_diff_eq!(interp.operator(3.0), 0.3, epsilon = 1e-12);
    }

    #[test]
    fn rejects_unsorted_abscissae() {
        assert!(LinearInterpolation::new(&[0.0, 0.0], &[1.0, 2.0]).is_err());
        assert!(LinearInterpolation::new(&[0.0], &[1.0]).is_err());
    }

    #[test]
    fn log_linear_interpolation() {
        let xs = [0.0, 1.0];
        let ys = [1.0, std::f64::consts::E];
        let interp = LogLinearInterpolation::new(&xs, &ys).unwrap();
        // At x=0.5, log(y)=0.5 → y = e^0.5
        let expected = std::f64::consts::E.sqrt();
        assert_abs_diff_eq!(interp.operator(0.5), expected, epsilon = 1e-12);
        assert!(LogLinearInterpolation::new(&xs, &[1.0, 0.0]).is_err());
    }
}
