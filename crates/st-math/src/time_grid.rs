//! Time grids for lattice methods.
//!
//! A [`TimeGrid`] is a strictly increasing sequence of times in years that
//! starts at `0`. Grids are built once per lattice configuration, either
//! with a fixed step or adaptively so that every step carries the same
//! instantaneous variance `σ(t)²·Δt`.

use st_core::{errors::Result, Real, Time, Volatility};

/// Upper bound on the number of points an adaptive grid may generate.
const MAX_ADAPTIVE_POINTS: usize = 1_000_000;

/// A grid of time points used by lattice methods.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeGrid {
    times: Vec<Time>,
}

impl TimeGrid {
    /// Evenly spaced grid covering `[0, duration]` with
    /// `ceil(duration / step) + 1` points.
    ///
    /// Degenerate inputs are clamped instead of rejected: a non-positive or
    /// infinite duration gives the single-point grid `[0]`, a non-positive
    /// step gives the one-period grid `[0, duration]`.
    pub fn fixed_step(duration: Time, step: Time) -> Self {
        if !(duration > 0.0) || !duration.is_finite() {
            tracing::warn!(duration, "degenerate duration, using a single-point grid");
            return Self { times: vec![0.0] };
        }
        if !(step > 0.0) || !step.is_finite() {
            tracing::warn!(step, "non-positive step, using a one-period grid");
            return Self {
                times: vec![0.0, duration],
            };
        }
        let n = step_count(duration / step);
        let dt = duration / n as Real;
        let mut times: Vec<Time> = (0..n).map(|i| i as Real * dt).collect();
        times.push(duration);
        Self { times }
    }

    /// The single-point grid `[0]`.
    pub fn origin() -> Self {
        Self { times: vec![0.0] }
    }

    /// Uniform grid from `0` to `end` with `steps` intervals.
    ///
    /// Zero steps is clamped to one.
    pub fn uniform(end: Time, steps: usize) -> Self {
        if steps == 0 {
            tracing::warn!(end, "zero steps requested, using a one-period grid");
            return Self::fixed_step(end, 0.0);
        }
        Self::fixed_step(end, end / steps as Real)
    }

    /// Grid whose steps keep `σ(t)²·Δt` constant.
    ///
    /// Starting from `t = 0` with step `initial_step`, each step is rescaled
    /// as `dt_next = σ(t)² · dt / σ(t + dt)²`. Generation stops once the
    /// accumulated time reaches `duration` within `epsilon · grid_size`; a
    /// final point within that tolerance is snapped onto `duration`.
    ///
    /// Otherwise the last point overshoots `duration` by less than the last
    /// step: `duration <= last < duration + dt(steps − 1)`.
    pub fn adaptive<F>(duration: Time, initial_step: Time, volatility: F, epsilon: Real) -> Self
    where
        F: Fn(Time) -> Volatility,
    {
        if !(duration > 0.0)
            || !duration.is_finite()
            || !(initial_step > 0.0)
            || !initial_step.is_finite()
        {
            return Self::fixed_step(duration, initial_step);
        }
        let scale = duration.max(1.0);
        let mut times = vec![0.0];
        let mut t = 0.0;
        let mut dt = initial_step;

        while t < duration - epsilon * times.len() as Real * scale {
            if times.len() >= MAX_ADAPTIVE_POINTS {
                tracing::warn!(
                    points = times.len(),
                    reached = t,
                    duration,
                    "adaptive grid truncated"
                );
                break;
            }
            let sig_curr = volatility(t);
            let next = t + dt;
            times.push(next);
            let sig_next = volatility(next);
            if sig_next > 0.0 && sig_curr > 0.0 {
                dt = sig_curr * sig_curr * dt / (sig_next * sig_next);
            }
            t = next;
        }

        let tolerance = epsilon * times.len() as Real * scale;
        let n = times.len();
        if n > 1 && (times[n - 1] - duration).abs() <= tolerance {
            times[n - 1] = duration;
        }
        Self { times }
    }

    /// Build from explicit times.
    ///
    /// # Errors
    /// The first time must be `0` and the sequence strictly increasing.
    pub fn from_times(times: &[Time]) -> Result<Self> {
        st_core::ensure!(!times.is_empty(), "time grid needs at least one point");
        st_core::ensure!(times[0] == 0.0, "time grid must start at 0, got {}", times[0]);
        st_core::ensure!(
            times.windows(2).all(|w| w[1] > w[0]),
            "time grid must be strictly increasing"
        );
        Ok(Self {
            times: times.to_vec(),
        })
    }

    /// Append a time point.
    ///
    /// # Errors
    /// `t` must be strictly greater than the current last point.
    pub fn push(&mut self, t: Time) -> Result<()> {
        let last = self.last();
        st_core::ensure!(t > last, "appended time {t} must exceed last point {last}");
        self.times.push(t);
        Ok(())
    }

    /// Number of time points (= steps + 1).
    pub fn size(&self) -> usize {
        self.times.len()
    }

    /// Number of steps (= time points − 1).
    pub fn steps(&self) -> usize {
        self.times.len() - 1
    }

    /// Time at index `i`.
    pub fn time(&self, i: usize) -> Time {
        self.times[i]
    }

    /// Time step between index `i` and `i+1`.
    pub fn dt(&self, i: usize) -> Time {
        self.times[i + 1] - self.times[i]
    }

    /// Final time.
    pub fn last(&self) -> Time {
        self.times[self.times.len() - 1]
    }

    /// All time points.
    pub fn times(&self) -> &[Time] {
        &self.times
    }

    /// Index of the grid point nearest to `expiry`.
    ///
    /// Returns `None` when `expiry` is negative, not a number, or beyond the
    /// last grid point. When `expiry` lies exactly halfway between two points
    /// the later index is returned; the earlier one wins only if strictly
    /// closer.
    pub fn time_index_for_expiry(&self, expiry: Time) -> Option<usize> {
        if !(expiry >= 0.0) || expiry > self.last() {
            return None;
        }
        for (i, &t) in self.times.iter().enumerate() {
            if expiry <= t {
                if i > 0 && expiry - self.times[i - 1] < t - expiry {
                    return Some(i - 1);
                }
                return Some(i);
            }
        }
        None
    }

    /// Index of the grid point equal to `t` up to rounding noise, or `None`
    /// when `t` falls between grid points or outside the grid.
    ///
    /// Unlike [`time_index_for_expiry`](Self::time_index_for_expiry) this
    /// never snaps to a neighbouring point; it suits cashflow dates, which
    /// must be paid exactly when they fall due.
    pub fn index_of(&self, t: Time) -> Option<usize> {
        let i = self.time_index_for_expiry(t.min(self.last()))?;
        let tolerance = 1e-9 * t.abs().max(1.0);
        ((self.times[i] - t).abs() <= tolerance).then_some(i)
    }
}

/// Number of intervals for `ratio = duration / step`, treating ratios within
/// rounding noise of an integer as that integer.
fn step_count(ratio: Real) -> usize {
    let rounded = ratio.round();
    let n = if (ratio - rounded).abs() <= 1e-9 * rounded.max(1.0) {
        rounded
    } else {
        ratio.ceil()
    };
    (n as usize).max(1)
}
