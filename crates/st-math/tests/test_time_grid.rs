//! Property tests for `TimeGrid` construction and expiry lookup.

use proptest::prelude::*;
use st_math::TimeGrid;

proptest! {
    #[test]
    fn fixed_step_point_count(steps in 1usize..400, step in 1.0e-3f64..0.5) {
        // duration an exact multiple of the step
        let duration = steps as f64 * step;
        let grid = TimeGrid::fixed_step(duration, step);
        prop_assert_eq!(grid.size(), steps + 1);
        prop_assert!((grid.last() - duration).abs() < 1e-12);
    }

    #[test]
    fn fixed_step_is_strictly_increasing(duration in 1.0e-3f64..10.0, step in 1.0e-3f64..1.0) {
        let grid = TimeGrid::fixed_step(duration, step);
        prop_assert_eq!(grid.time(0), 0.0);
        prop_assert!(grid.times().windows(2).all(|w| w[1] > w[0]));
        let ratio = duration / step;
        prop_assert!(grid.steps() as f64 >= ratio - 1e-8 * (ratio + 1.0));
    }

    #[test]
    fn lookup_outside_grid_is_none(duration in 1.0e-2f64..5.0, step in 1.0e-2f64..0.5, excess in 1.0e-9f64..10.0) {
        let grid = TimeGrid::fixed_step(duration, step);
        prop_assert_eq!(grid.time_index_for_expiry(-excess), None);
        prop_assert_eq!(grid.time_index_for_expiry(grid.last() + excess), None);
    }

    #[test]
    fn lookup_returns_nearest_point(duration in 1.0e-2f64..5.0, step in 1.0e-2f64..0.5, frac in 0.0f64..1.0) {
        let grid = TimeGrid::fixed_step(duration, step);
        let expiry = frac * grid.last();
        let idx = grid.time_index_for_expiry(expiry).unwrap();
        let best = grid
            .times()
            .iter()
            .map(|t| (t - expiry).abs())
            .fold(f64::INFINITY, f64::min);
        prop_assert!(((grid.time(idx) - expiry).abs() - best).abs() < 1e-12);
    }

    #[test]
    fn exact_lookup_hits_only_grid_points(duration in 1.0e-2f64..5.0, step in 1.0e-2f64..0.5, frac in 0.0f64..1.0) {
        let grid = TimeGrid::fixed_step(duration, step);
        let t = frac * grid.last();
        match grid.index_of(t) {
            Some(i) => prop_assert!((grid.time(i) - t).abs() <= 1e-9 * t.max(1.0)),
            None => prop_assert!(grid.times().iter().all(|g| (g - t).abs() > 1e-9 * t.max(1.0))),
        }
        for (i, &g) in grid.times().iter().enumerate() {
            prop_assert_eq!(grid.index_of(g), Some(i));
        }
    }

    #[test]
    fn adaptive_grid_reaches_duration(duration in 0.1f64..3.0, dt in 1.0e-3f64..0.05, slope in -0.05f64..0.3) {
        let vol = move |t: f64| 0.2 + slope * t;
        let grid = TimeGrid::adaptive(duration, dt, vol, f64::EPSILON);
        prop_assert!(grid.last() >= duration);
        // overshoot stays under one step
        prop_assert!(grid.last() - duration < grid.dt(grid.steps() - 1));
        prop_assert!(grid.times().windows(2).all(|w| w[1] > w[0]));
    }
}
