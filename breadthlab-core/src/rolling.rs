//! Full-window rolling mean.
//!
//! Arithmetic mean of the trailing `window` cells of a price column.
//! A cell is defined only when all `window` cells ending there are present;
//! any NaN inside the window makes the mean NaN (no partial windows).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollingMean {
    window: usize,
}

impl RollingMean {
    /// Returns `None` for a zero window.
    pub fn new(window: usize) -> Option<Self> {
        (window >= 1).then_some(Self { window })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Rolling mean aligned to `values`; leading `window - 1` cells are NaN.
    pub fn compute(&self, values: &[f64]) -> Vec<f64> {
        let n = values.len();
        let mut result = vec![f64::NAN; n];

        if n < self.window {
            return result;
        }

        let mut sum = 0.0;
        let mut nan_in_window = 0usize;
        for &v in values.iter().take(self.window) {
            if v.is_nan() {
                nan_in_window += 1;
            } else {
                sum += v;
            }
        }
        if nan_in_window == 0 {
            result[self.window - 1] = sum / self.window as f64;
        }

        for i in self.window..n {
            let leaving = values[i - self.window];
            let entering = values[i];

            let had_nan = nan_in_window > 0;
            if leaving.is_nan() {
                nan_in_window -= 1;
            } else {
                sum -= leaving;
            }
            if entering.is_nan() {
                nan_in_window += 1;
            } else {
                sum += entering;
            }

            if nan_in_window > 0 {
                continue;
            }

            // Window just became NaN-free: resum to shed drift from the gap.
            if had_nan {
                sum = values[(i + 1 - self.window)..=i].iter().sum();
            }
            result[i] = sum / self.window as f64;
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-10;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < EPS,
            "actual={actual}, expected={expected}"
        );
    }

    #[test]
    fn mean_5_basic() {
        let values = [10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0];
        let result = RollingMean::new(5).unwrap().compute(&values);

        assert_eq!(result.len(), 7);
        for (i, v) in result.iter().enumerate().take(4) {
            assert!(v.is_nan(), "expected NaN at index {i}");
        }
        assert_approx(result[4], 12.0);
        assert_approx(result[5], 13.0);
        assert_approx(result[6], 14.0);
    }

    #[test]
    fn window_1_is_identity() {
        let result = RollingMean::new(1).unwrap().compute(&[100.0, 200.0, 300.0]);
        assert_eq!(result, vec![100.0, 200.0, 300.0]);
    }

    #[test]
    fn nan_inside_window_poisons_mean() {
        let values = [10.0, 11.0, f64::NAN, 13.0, 14.0, 15.0];
        let result = RollingMean::new(3).unwrap().compute(&values);
        // [10,11,NaN] [11,NaN,13] [NaN,13,14] are all undefined
        assert!(result[2].is_nan());
        assert!(result[3].is_nan());
        assert!(result[4].is_nan());
        // [13,14,15]
        assert_approx(result[5], 14.0);
    }

    #[test]
    fn leading_gap_then_full_window() {
        let mut values = vec![f64::NAN; 3];
        values.extend([1.0, 2.0, 3.0, 4.0]);
        let result = RollingMean::new(4).unwrap().compute(&values);
        assert!(result[..6].iter().all(|v| v.is_nan()));
        assert_approx(result[6], 2.5);
    }

    #[test]
    fn too_few_values() {
        let result = RollingMean::new(5).unwrap().compute(&[10.0, 11.0]);
        assert!(result.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn zero_window_rejected() {
        assert!(RollingMean::new(0).is_none());
    }
}
