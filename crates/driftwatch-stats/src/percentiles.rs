//! Percentile ladders: the 101-point quantile function of a sample.
//!
//! A [`PercentileLadder`] stores the value at every integer percentile
//! `0, 1, ..., 100`. Between two integer percentiles the quantile function is
//! treated as piecewise linear, which gives both directions of lookup:
//!
//! - [`PercentileLadder::value_at`]: percentile → value (quantile function)
//! - [`PercentileLadder::cdf_at`]: value → percentile (empirical CDF, in percent)

use serde::{Deserialize, Deserializer, Serialize, Serializer, ser::SerializeSeq as _};

/// Number of points in a ladder (integer percentiles 0 through 100).
pub const PERCENTILE_POINTS: usize = 101;

/// Values at the integer percentiles 0..=100, non-decreasing.
///
/// # Examples
///
/// ```
/// use driftwatch_stats::percentiles::PercentileLadder;
///
/// let values = (0..10).map(f64::from).collect::<Vec<_>>();
/// let ladder = PercentileLadder::from_sorted(&values).unwrap();
///
/// assert_eq!(ladder.first(), 0.0);
/// assert_eq!(ladder.last(), 9.0);
/// assert_eq!(ladder.get(50), 5.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentileLadder([f64; PERCENTILE_POINTS]);

impl PercentileLadder {
    /// Computes the ladder from sorted values.
    ///
    /// Each point takes the next observed value at or above the exact rank
    /// ("higher" interpolation), so the ladder only holds observed values.
    ///
    /// Returns `None` if `sorted_values` is empty.
    ///
    /// # Panics
    ///
    /// Panics if `sorted_values` is not sorted in ascending order.
    #[must_use]
    pub fn from_sorted(sorted_values: &[f64]) -> Option<Self> {
        assert!(
            sorted_values.is_sorted_by(|a, b| a <= b),
            "values must be sorted in ascending order"
        );
        if sorted_values.is_empty() {
            return None;
        }
        let mut ladder = [0.0; PERCENTILE_POINTS];
        for (percentile, slot) in ladder.iter_mut().enumerate() {
            *slot = compute_percentile(sorted_values, percentile);
        }
        Some(Self(ladder))
    }

    /// Builds a ladder from raw points, checking they are finite and non-decreasing.
    #[must_use]
    pub fn from_points(points: [f64; PERCENTILE_POINTS]) -> Option<Self> {
        let ok = points.iter().all(|v| v.is_finite()) && points.is_sorted_by(|a, b| a <= b);
        ok.then_some(Self(points))
    }

    /// Value at the integer percentile `percentile` (clamped to 100).
    #[must_use]
    pub fn get(&self, percentile: usize) -> f64 {
        self.0[percentile.min(PERCENTILE_POINTS - 1)]
    }

    #[must_use]
    pub fn first(&self) -> f64 {
        self.0[0]
    }

    #[must_use]
    pub fn last(&self) -> f64 {
        self.0[PERCENTILE_POINTS - 1]
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().copied()
    }

    /// Value at a fractional percentile, linearly interpolated between the
    /// surrounding integer percentiles.
    ///
    /// `percentile` is clamped to `[0, 100]`.
    ///
    /// ```
    /// use driftwatch_stats::percentiles::PercentileLadder;
    ///
    /// let values = (0..=100).map(f64::from).collect::<Vec<_>>();
    /// let ladder = PercentileLadder::from_sorted(&values).unwrap();
    /// assert_eq!(ladder.value_at(12.5), 12.5);
    /// assert_eq!(ladder.value_at(-3.0), 0.0);
    /// ```
    #[expect(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    #[must_use]
    pub fn value_at(&self, percentile: f64) -> f64 {
        let p = percentile.clamp(0.0, 100.0);
        let floor = p.floor();
        let idx = floor as usize;
        if idx >= PERCENTILE_POINTS - 1 {
            return self.last();
        }
        let (lo, hi) = (self.0[idx], self.0[idx + 1]);
        let alpha = p - floor;
        (lo * (1.0 - alpha) + hi * alpha).clamp(lo, hi)
    }

    /// Percentile (in `[0, 100]`) at which the interpolated quantile function
    /// reaches `value`.
    ///
    /// Values below the first point map to 0 and values at or above the last
    /// point map to 100. When several points share a value, the value is
    /// associated with the highest of those percentiles.
    ///
    /// ```
    /// use driftwatch_stats::percentiles::PercentileLadder;
    ///
    /// let values = (0..=100).map(f64::from).collect::<Vec<_>>();
    /// let ladder = PercentileLadder::from_sorted(&values).unwrap();
    /// assert_eq!(ladder.cdf_at(40.25), 40.25);
    /// assert_eq!(ladder.cdf_at(-1.0), 0.0);
    /// assert_eq!(ladder.cdf_at(1000.0), 100.0);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn cdf_at(&self, value: f64) -> f64 {
        if value < self.first() {
            return 0.0;
        }
        if value >= self.last() {
            return 100.0;
        }
        // first index whose point exceeds `value`; in 1..=100 given the checks above
        let upper = self.0.partition_point(|&v| v <= value);
        let lower = upper - 1;
        let (lo, hi) = (self.0[lower], self.0[upper]);
        lower as f64 + (value - lo) / (hi - lo)
    }

    /// Ladder re-read at every percentile shifted by `offset` (clamped to
    /// `[0, 100]`). A negative offset gives a lower envelope, a positive one an
    /// upper envelope.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn shifted(&self, offset: f64) -> Self {
        let mut points = [0.0; PERCENTILE_POINTS];
        for (percentile, slot) in points.iter_mut().enumerate() {
            *slot = self.value_at(percentile as f64 + offset);
        }
        Self(points)
    }
}

impl Serialize for PercentileLadder {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(PERCENTILE_POINTS))?;
        for value in &self.0 {
            seq.serialize_element(value)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for PercentileLadder {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let values = Vec::<f64>::deserialize(deserializer)?;
        let points: [f64; PERCENTILE_POINTS] = values.try_into().map_err(|v: Vec<f64>| {
            serde::de::Error::custom(format!(
                "invalid percentile ladder: expected {PERCENTILE_POINTS} values, got {}",
                v.len()
            ))
        })?;
        Self::from_points(points).ok_or_else(|| {
            serde::de::Error::custom("invalid percentile ladder: values must be finite and non-decreasing")
        })
    }
}

/// Computes a single percentile value from sorted data.
///
/// Uses "higher" interpolation: the element at rank `ceil(percentile * (n - 1) / 100)`.
/// The rank is computed in integer arithmetic so that integer percentiles map
/// to exact positions.
///
/// Returns `f64::NAN` if the input is empty.
///
/// # Examples
///
/// ```
/// use driftwatch_stats::percentiles::compute_percentile;
///
/// let values = [1.0, 2.0, 3.0, 4.0, 5.0];
/// assert_eq!(compute_percentile(&values, 50), 3.0);
/// assert_eq!(compute_percentile(&values, 30), 3.0);
/// assert_eq!(compute_percentile(&values, 100), 5.0);
/// ```
#[must_use]
pub fn compute_percentile(sorted_values: &[f64], percentile: usize) -> f64 {
    if sorted_values.is_empty() {
        return f64::NAN;
    }
    let last = sorted_values.len() - 1;
    let idx = (percentile.min(100) * last).div_ceil(100);
    sorted_values[idx.min(last)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ladder_of(values: &[f64]) -> PercentileLadder {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        PercentileLadder::from_sorted(&sorted).unwrap()
    }

    #[test]
    fn test_higher_interpolation_never_synthesizes() {
        let values = [1.0, 10.0, 100.0];
        let ladder = ladder_of(&values);
        assert!(ladder.iter().all(|v| values.contains(&v)));
        // rank 0.02 rounds up to the second observation
        assert_eq!(ladder.get(1), 10.0);
        assert_eq!(ladder.get(50), 10.0);
        assert_eq!(ladder.get(51), 100.0);
    }

    #[test]
    fn test_cdf_ties_map_to_highest_percentile() {
        let ladder = ladder_of(&[1.0, 1.0, 1.0, 2.0]);
        // 1.0 covers percentiles 0..=66
        assert_eq!(ladder.cdf_at(1.0), 66.0);
    }

    #[test]
    fn test_shifted_brackets_ladder() {
        let ladder = ladder_of(&[0.0, 3.0, 4.0, 9.0, 20.0, 21.0]);
        let lower = ladder.shifted(-7.5);
        let upper = ladder.shifted(7.5);
        for p in 0..PERCENTILE_POINTS {
            assert!(lower.get(p) <= ladder.get(p));
            assert!(ladder.get(p) <= upper.get(p));
        }
        assert_eq!(lower.first(), ladder.first());
        assert_eq!(upper.last(), ladder.last());
    }

    #[test]
    fn test_serde_rejects_wrong_length() {
        let err = serde_json::from_str::<PercentileLadder>("[1.0, 2.0]").unwrap_err();
        assert!(err.to_string().contains("expected 101 values"));
    }

    #[test]
    fn test_serde_rejects_decreasing() {
        let mut values = vec![1.0; PERCENTILE_POINTS];
        values[100] = 0.0;
        let json = serde_json::to_string(&values).unwrap();
        assert!(serde_json::from_str::<PercentileLadder>(&json).is_err());
    }

    mod properties {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            #[test]
            fn ladder_is_monotone_and_spans_range(
                mut values in prop::collection::vec(-1.0e6..1.0e6f64, 2..200)
            ) {
                values.sort_by(f64::total_cmp);
                let ladder = PercentileLadder::from_sorted(&values).unwrap();
                prop_assert!(ladder.as_slice().is_sorted_by(|a, b| a <= b));
                prop_assert_eq!(ladder.first(), values[0]);
                prop_assert_eq!(ladder.last(), values[values.len() - 1]);
            }

            #[test]
            fn cdf_inverts_value_at(
                mut values in prop::collection::vec(-1.0e3..1.0e3f64, 2..100),
                percentile in 0.0..100.0f64,
            ) {
                values.sort_by(f64::total_cmp);
                let ladder = PercentileLadder::from_sorted(&values).unwrap();
                let value = ladder.value_at(percentile);
                // flat stretches push the cdf to the end of the stretch
                prop_assert!(ladder.cdf_at(value) + 1e-6 >= percentile);
            }
        }
    }
}
