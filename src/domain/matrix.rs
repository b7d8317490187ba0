//! Date-by-location matrices and single-location series.
//!
//! Missing cells are `None`. The constructors never store a non-finite value:
//! anything that is not a finite `f64` becomes `None` on the way in, so no
//! infinity or NaN can leak out of a matrix.

use chrono::NaiveDate;

use crate::math::finite;

/// Dense table indexed by date (rows, ascending, unique) and location (columns).
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedMatrix {
    dates: Vec<NaiveDate>,
    locations: Vec<String>,
    columns: Vec<Vec<Option<f64>>>,
}

impl AlignedMatrix {
    /// Build a matrix from one column per location.
    ///
    /// # Panics
    /// Panics if the number of columns differs from the number of locations, or
    /// if any column length differs from the number of dates. Callers inside
    /// this crate always construct matching shapes.
    pub fn from_columns(dates: Vec<NaiveDate>, locations: Vec<String>, columns: Vec<Vec<Option<f64>>>) -> Self {
        assert_eq!(columns.len(), locations.len(), "one column per location");
        assert!(
            columns.iter().all(|c| c.len() == dates.len()),
            "every column spans every date"
        );
        debug_assert!(dates.windows(2).all(|w| w[0] < w[1]), "dates strictly ascending");

        let columns = columns
            .into_iter()
            .map(|col| col.into_iter().map(|v| v.and_then(finite)).collect())
            .collect();

        Self {
            dates,
            locations,
            columns,
        }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn locations(&self) -> &[String] {
        &self.locations
    }

    pub fn n_rows(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn columns(&self) -> &[Vec<Option<f64>>] {
        &self.columns
    }

    pub fn column(&self, location: &str) -> Option<&[Option<f64>]> {
        let idx = self.location_index(location)?;
        Some(&self.columns[idx])
    }

    pub fn location_index(&self, location: &str) -> Option<usize> {
        self.locations.iter().position(|l| l == location)
    }

    pub fn row_index(&self, date: NaiveDate) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }

    pub fn value_at(&self, date: NaiveDate, location: &str) -> Option<f64> {
        let row = self.row_index(date)?;
        self.column(location)?[row]
    }

    /// Latest defined value for a location.
    pub fn latest(&self, location: &str) -> Option<(NaiveDate, f64)> {
        let column = self.column(location)?;
        self.dates
            .iter()
            .zip(column.iter())
            .rev()
            .find_map(|(date, v)| v.map(|v| (*date, v)))
    }

    pub fn series(&self, location: &str) -> Option<Series> {
        let column = self.column(location)?;
        Some(Series::new(self.dates.clone(), column.to_vec()))
    }

    /// Apply a column transform to every location.
    ///
    /// The transform must return a column of the same length.
    pub fn map_columns<F>(&self, f: F) -> AlignedMatrix
    where
        F: Fn(&[Option<f64>]) -> Vec<Option<f64>>,
    {
        let columns = self.columns.iter().map(|c| f(c)).collect();
        AlignedMatrix::from_columns(self.dates.clone(), self.locations.clone(), columns)
    }

    /// Combine two matrices cell by cell.
    ///
    /// The result has `self`'s shape. Cells of `other` are looked up by date and
    /// location name, so the two matrices need not share an identical index;
    /// cells absent from `other` are passed as `None`.
    pub fn combine<F>(&self, other: &AlignedMatrix, f: F) -> AlignedMatrix
    where
        F: Fn(Option<f64>, Option<f64>) -> Option<f64>,
    {
        let rows: Vec<Option<usize>> = self.dates.iter().map(|d| other.row_index(*d)).collect();
        let columns = self
            .locations
            .iter()
            .zip(self.columns.iter())
            .map(|(location, left)| {
                let right = other.column(location);
                left.iter()
                    .zip(rows.iter())
                    .map(|(l, row)| {
                        let r = match (right, row) {
                            (Some(col), Some(row)) => col[*row],
                            _ => None,
                        };
                        f(*l, r)
                    })
                    .collect()
            })
            .collect();
        AlignedMatrix::from_columns(self.dates.clone(), self.locations.clone(), columns)
    }

    /// Rows whose date lies in `[start, end]` (either bound optional).
    pub fn slice_dates(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> AlignedMatrix {
        let lo = start.map_or(0, |s| self.dates.partition_point(|d| *d < s));
        let hi = end.map_or(self.dates.len(), |e| self.dates.partition_point(|d| *d <= e));
        let hi = hi.max(lo);
        let columns = self.columns.iter().map(|c| c[lo..hi].to_vec()).collect();
        AlignedMatrix::from_columns(self.dates[lo..hi].to_vec(), self.locations.clone(), columns)
    }

    /// The last `n` rows.
    pub fn tail(&self, n: usize) -> AlignedMatrix {
        let start = self.dates.len().saturating_sub(n);
        match self.dates.get(start) {
            Some(first) => self.slice_dates(Some(*first), None),
            None => self.clone(),
        }
    }
}

/// A single location's values on a date index (dates strictly ascending).
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub dates: Vec<NaiveDate>,
    pub values: Vec<Option<f64>>,
}

impl Series {
    /// # Panics
    /// Panics if `dates` and `values` differ in length. Debug builds also
    /// panic unless `dates` are strictly ascending.
    pub fn new(dates: Vec<NaiveDate>, values: Vec<Option<f64>>) -> Self {
        assert_eq!(dates.len(), values.len(), "one value per date");
        debug_assert!(dates.windows(2).all(|w| w[0] < w[1]), "dates strictly ascending");
        let values = values.into_iter().map(|v| v.and_then(finite)).collect();
        Self { dates, values }
    }

    /// Daily series starting at `start`.
    pub fn daily(start: NaiveDate, values: &[f64]) -> Self {
        let dates = start.iter_days().take(values.len()).collect();
        Self::new(dates, values.iter().map(|v| Some(*v)).collect())
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 3, day).unwrap()
    }

    fn matrix() -> AlignedMatrix {
        AlignedMatrix::from_columns(
            vec![d(1), d(2), d(3)],
            vec!["A".to_string(), "B".to_string()],
            vec![
                vec![Some(1.0), Some(f64::INFINITY), Some(3.0)],
                vec![None, Some(5.0), None],
            ],
        )
    }

    #[test]
    fn non_finite_cells_become_missing() {
        let m = matrix();
        assert_eq!(m.value_at(d(2), "A"), None);
        assert_eq!(m.value_at(d(3), "A"), Some(3.0));
        assert_eq!(m.value_at(d(3), "C"), None);
    }

    #[test]
    fn latest_skips_trailing_missing() {
        let m = matrix();
        assert_eq!(m.latest("B"), Some((d(2), 5.0)));
        assert_eq!(m.latest("A"), Some((d(3), 3.0)));
    }

    #[test]
    fn slice_and_tail() {
        let m = matrix();
        let s = m.slice_dates(Some(d(2)), Some(d(2)));
        assert_eq!(s.dates(), &[d(2)]);
        assert_eq!(s.column("B").unwrap(), &[Some(5.0)]);

        let t = m.tail(2);
        assert_eq!(t.dates(), &[d(2), d(3)]);
        assert_eq!(m.tail(10).n_rows(), 3);
    }

    #[test]
    fn combine_looks_up_other_by_date() {
        let m = matrix();
        let other = AlignedMatrix::from_columns(
            vec![d(3)],
            vec!["A".to_string()],
            vec![vec![Some(10.0)]],
        );
        let sum = m.combine(&other, |a, b| Some(a? + b?));
        assert_eq!(sum.column("A").unwrap(), &[None, None, Some(13.0)]);
        assert_eq!(sum.column("B").unwrap(), &[None, None, None]);
    }

    #[test]
    fn daily_series_has_consecutive_dates() {
        let s = Series::daily(d(30), &[1.0, 2.0, 3.0]);
        assert_eq!(s.dates[2], NaiveDate::from_ymd_opt(2020, 4, 1).unwrap());
        assert_eq!(s.len(), 3);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "dates strictly ascending")]
    fn series_rejects_unsorted_dates() {
        Series::new(vec![d(2), d(1)], vec![Some(1.0), Some(2.0)]);
    }
}
