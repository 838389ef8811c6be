/// Location and spread of the valid part of a sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DescriptiveStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Population standard deviation (divides by `n`).
    pub std_dev: f64,
}

impl DescriptiveStats {
    /// Summarizes values given in any order; `None` when there are none.
    ///
    /// ```
    /// # use driftwatch_stats::descriptive::DescriptiveStats;
    /// let stats = DescriptiveStats::new([5.0, 2.0, 4.0, 1.0, 3.0]).unwrap();
    /// assert_eq!((stats.min, stats.max, stats.mean), (1.0, 5.0, 3.0));
    /// ```
    #[must_use]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let values = values.into_iter().collect::<Vec<_>>();
        let (min, max) = values.iter().fold(None, |bounds, &v| match bounds {
            None => Some((v, v)),
            Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
        })?;
        Some(Self::with_bounds(&values, min, max))
    }

    /// Summarizes an ascending slice, taking the bounds from its ends.
    #[must_use]
    pub fn from_sorted(sorted: &[f64]) -> Option<Self> {
        debug_assert!(sorted.is_sorted_by(|a, b| a <= b), "values must be ascending");
        let (&min, &max) = (sorted.first()?, sorted.last()?);
        Some(Self::with_bounds(sorted, min, max))
    }

    #[expect(clippy::cast_precision_loss)]
    fn with_bounds(values: &[f64], min: f64, max: f64) -> Self {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let squared_deviations = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>();
        Self {
            min,
            max,
            mean,
            std_dev: (squared_deviations / n).sqrt(),
        }
    }
}
