//! Trailing-window column transforms.

use crate::domain::AlignedMatrix;
use crate::error::EngineError;

/// Mean of the trailing `window` values; `None` unless all of them are defined.
pub fn trailing_mean(column: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    (0..column.len())
        .map(|i| {
            if window == 0 || i + 1 < window {
                return None;
            }
            let slice = &column[i + 1 - window..=i];
            let sum = slice.iter().try_fold(0.0, |acc, v| v.map(|v| acc + v))?;
            Some(sum / window as f64)
        })
        .collect()
}

/// `v(t) - v(t - periods)`, `None` where either side is missing.
pub fn backward_difference(column: &[Option<f64>], periods: usize) -> Vec<Option<f64>> {
    (0..column.len())
        .map(|i| {
            let prev = i.checked_sub(periods)?;
            Some(column[i]? - column[prev]?)
        })
        .collect()
}

/// Trailing moving average over `window >= 1` days for every location.
pub fn moving_average(matrix: &AlignedMatrix, window: usize) -> Result<AlignedMatrix, EngineError> {
    EngineError::check_window(window, 1)?;
    Ok(matrix.map_columns(|c| trailing_mean(c, window)))
}

/// Backward difference over `periods >= 1` days for every location.
pub fn difference(matrix: &AlignedMatrix, periods: usize) -> Result<AlignedMatrix, EngineError> {
    EngineError::check_window(periods, 1)?;
    Ok(matrix.map_columns(|c| backward_difference(c, periods)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_mean_needs_a_full_window() {
        let col = vec![Some(1.0), Some(2.0), Some(3.0), None, Some(5.0), Some(7.0)];
        let ma = trailing_mean(&col, 2);
        assert_eq!(ma, vec![None, Some(1.5), Some(2.5), None, None, Some(6.0)]);
    }

    #[test]
    fn window_of_one_is_identity() {
        let col = vec![Some(1.0), None, Some(3.0)];
        assert_eq!(trailing_mean(&col, 1), col);
    }

    #[test]
    fn backward_difference_keeps_negative_revisions() {
        let col = vec![Some(10.0), Some(12.0), Some(11.0), None];
        assert_eq!(backward_difference(&col, 1), vec![None, Some(2.0), Some(-1.0), None]);
        assert_eq!(backward_difference(&col, 2), vec![None, None, Some(1.0), None]);
    }
}
