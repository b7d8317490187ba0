//! Gap filling for a single column.

/// How to fill dates that have no reported value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GapPolicy {
    /// Carry the last observed value forward.
    #[default]
    ForwardFill,
    /// Interpolate linearly between observed neighbours; trailing gaps carry
    /// the last value forward. Leading gaps stay missing.
    Linear,
    /// Leave gaps missing.
    Keep,
}

impl GapPolicy {
    pub fn apply(self, column: &mut [Option<f64>]) {
        match self {
            GapPolicy::ForwardFill => forward_fill(column),
            GapPolicy::Linear => interpolate_linear(column),
            GapPolicy::Keep => {}
        }
    }
}

/// Replace each missing cell with the most recent defined value before it.
pub fn forward_fill(column: &mut [Option<f64>]) {
    let mut last = None;
    for cell in column.iter_mut() {
        match cell {
            Some(v) => last = Some(*v),
            None => *cell = last,
        }
    }
}

/// Linear interpolation over the row index (one row per day).
pub fn interpolate_linear(column: &mut [Option<f64>]) {
    let mut prev: Option<(usize, f64)> = None;
    let mut idx = 0;
    while idx < column.len() {
        let Some(v) = column[idx] else {
            idx += 1;
            continue;
        };
        if let Some((p_idx, p_val)) = prev {
            let span = (idx - p_idx) as f64;
            for gap in (p_idx + 1)..idx {
                let u = (gap - p_idx) as f64 / span;
                column[gap] = Some(p_val + u * (v - p_val));
            }
        }
        prev = Some((idx, v));
        idx += 1;
    }

    if let Some((p_idx, p_val)) = prev {
        for cell in column.iter_mut().skip(p_idx + 1) {
            *cell = Some(p_val);
        }
    }
}
