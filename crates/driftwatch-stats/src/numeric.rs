use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    DataError, InvariantError,
    descriptive::DescriptiveStats,
    percentiles::{PERCENTILE_POINTS, PercentileLadder},
    report::{DriftLocation, DriftReport, InvalidsReport},
};

/// Significance level of the confidence envelopes around a summary.
pub const CONFIDENCE_ALPHA: f64 = 0.05;

/// Half-width, in percentile points, of the DKW confidence band for a sample
/// of `sample_size` values.
///
/// The Dvoretzky–Kiefer–Wolfowitz inequality bounds the distance between the
/// empirical and true CDF by `sqrt(ln(2 / alpha) / (2 n))` with probability
/// `1 - alpha`.
///
/// ```
/// use driftwatch_stats::numeric::dkw_epsilon;
///
/// let eps = dkw_epsilon(100);
/// assert!((eps - 13.581).abs() < 1e-3);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn dkw_epsilon(sample_size: usize) -> f64 {
    ((2.0 / CONFIDENCE_ALPHA).ln() / (2.0 * sample_size as f64)).sqrt() * 100.0
}

/// Allowed range of a numeric feature. Either bound may be left open, in which
/// case it is taken from the data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NumericDomain {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl NumericDomain {
    #[must_use]
    pub fn new(lower: Option<f64>, upper: Option<f64>) -> Self {
        Self { lower, upper }
    }

    #[must_use]
    pub fn bounded(lower: f64, upper: f64) -> Self {
        Self::new(Some(lower), Some(upper))
    }

    fn check(self) -> Result<Self, DataError> {
        let finite = self.lower.is_none_or(f64::is_finite) && self.upper.is_none_or(f64::is_finite);
        let ordered = match (self.lower, self.upper) {
            (Some(lower), Some(upper)) => lower <= upper,
            _ => true,
        };
        if finite && ordered {
            Ok(self)
        } else {
            Err(DataError::InvalidDomain {
                reason: format!("{:?}..{:?} is not a finite, ordered range", self.lower, self.upper),
            })
        }
    }
}

/// Compact summary of a numeric distribution with a confidence envelope.
///
/// The persisted field names follow the profile document format (`invalids`,
/// `percentiles`, `samplesize`, ...). Deserialization re-checks every
/// invariant, so a decoded summary is always usable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NumericStatsState")]
pub struct NumericStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std: f64,
    /// Fraction of the sample that was NaN, non-finite or outside `[min, max]`.
    #[serde(rename = "invalids")]
    pub invalid_fraction: f64,
    #[serde(rename = "percentiles")]
    pub percentile_ladder: PercentileLadder,
    /// Number of values the summary was built from, invalid ones included.
    #[serde(rename = "samplesize")]
    pub sample_size: usize,
    #[serde(rename = "percentiles_lb")]
    pub percentile_lower_band: PercentileLadder,
    #[serde(rename = "percentiles_ub")]
    pub percentile_upper_band: PercentileLadder,
}

#[derive(Deserialize)]
struct NumericStatsState {
    min: f64,
    max: f64,
    mean: f64,
    std: f64,
    invalids: f64,
    percentiles: PercentileLadder,
    samplesize: usize,
    percentiles_lb: PercentileLadder,
    percentiles_ub: PercentileLadder,
}

impl TryFrom<NumericStatsState> for NumericStats {
    type Error = InvariantError;

    fn try_from(state: NumericStatsState) -> Result<Self, Self::Error> {
        let stats = Self {
            min: state.min,
            max: state.max,
            mean: state.mean,
            std: state.std,
            invalid_fraction: state.invalids,
            percentile_ladder: state.percentiles,
            sample_size: state.samplesize,
            percentile_lower_band: state.percentiles_lb,
            percentile_upper_band: state.percentiles_ub,
        };
        stats.validate()?;
        Ok(stats)
    }
}

impl NumericStats {
    /// Builds a summary from a sample.
    ///
    /// NaN and infinite values are counted as invalid and dropped. `min` and
    /// `max` come from `domain` when given and from the data otherwise; values
    /// outside `[min, max]` are invalid too.
    ///
    /// # Errors
    ///
    /// * [`DataError::EmptySample`] - `sample` is empty
    /// * [`DataError::NoValidValues`] - every value was invalid
    /// * [`DataError::InvalidDomain`] - `domain` has non-finite or reversed bounds
    ///
    /// # Examples
    ///
    /// ```
    /// use driftwatch_stats::numeric::NumericStats;
    ///
    /// let sample = (0..10).map(f64::from).collect::<Vec<_>>();
    /// let stats = NumericStats::build(&sample, None).unwrap();
    /// assert_eq!(stats.min, 0.0);
    /// assert_eq!(stats.max, 9.0);
    /// assert_eq!(stats.mean, 4.5);
    /// assert_eq!(stats.invalid_fraction, 0.0);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    pub fn build(sample: &[f64], domain: Option<NumericDomain>) -> Result<Self, DataError> {
        if sample.is_empty() {
            return Err(DataError::EmptySample);
        }
        let domain = domain.unwrap_or_default().check()?;

        let finite = sample
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .collect::<Vec<_>>();
        let min = domain
            .lower
            .or_else(|| finite.iter().copied().reduce(f64::min))
            .ok_or(DataError::NoValidValues)?;
        let max = domain
            .upper
            .or_else(|| finite.iter().copied().reduce(f64::max))
            .ok_or(DataError::NoValidValues)?;

        let mut valid = finite
            .into_iter()
            .filter(|v| (min..=max).contains(v))
            .collect::<Vec<_>>();
        valid.sort_by(f64::total_cmp);

        let descriptive = DescriptiveStats::from_sorted(&valid).ok_or(DataError::NoValidValues)?;
        let percentile_ladder =
            PercentileLadder::from_sorted(&valid).ok_or(DataError::NoValidValues)?;

        let sample_size = sample.len();
        let epsilon = dkw_epsilon(sample_size);

        Ok(Self {
            min,
            max,
            mean: descriptive.mean,
            std: descriptive.std_dev,
            invalid_fraction: (sample_size - valid.len()) as f64 / sample_size as f64,
            percentile_ladder,
            sample_size,
            percentile_lower_band: percentile_ladder.shifted(-epsilon),
            percentile_upper_band: percentile_ladder.shifted(epsilon),
        })
    }

    /// Whether the summary holds a usable distribution.
    #[must_use]
    pub fn is_built(&self) -> bool {
        self.sample_size > 0 && self.validate().is_ok()
    }

    /// Width of the accepted value range.
    #[must_use]
    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    /// Whether `value` lies within `[min, max]`.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// Checks the invariants a built summary has to satisfy.
    pub fn validate(&self) -> Result<(), InvariantError> {
        if self.sample_size == 0 {
            return Err(InvariantError::EmptySample);
        }
        for (field, value) in [
            ("min", self.min),
            ("max", self.max),
            ("mean", self.mean),
            ("std", self.std),
            ("invalids", self.invalid_fraction),
        ] {
            if !value.is_finite() {
                return Err(InvariantError::NonFinite { field });
            }
        }
        if !(0.0..=1.0).contains(&self.invalid_fraction) {
            return Err(InvariantError::InvalidFraction {
                value: self.invalid_fraction,
            });
        }
        if self.min > self.max || self.std < 0.0 {
            return Err(InvariantError::Range {
                min: self.min,
                max: self.max,
            });
        }
        let bracketed = (0..PERCENTILE_POINTS).all(|p| {
            self.percentile_lower_band.get(p) <= self.percentile_ladder.get(p)
                && self.percentile_ladder.get(p) <= self.percentile_upper_band.get(p)
        });
        if !bracketed {
            return Err(InvariantError::Bands { what: "percentiles" });
        }
        Ok(())
    }

    /// Measures how distinguishable `other` is from this summary.
    ///
    /// Both ladders are merged into one sorted domain. On every point of that
    /// domain each side's confidence envelope is read back as a CDF interval,
    /// and the gap between the two intervals (zero when they overlap) is taken
    /// in both directions. The largest gap, in percent, scaled to `[0, 1]` is
    /// the drift.
    #[must_use]
    pub fn report_drift(&self, other: &Self, threshold: f64) -> DriftReport {
        if other.sample_size == 0 {
            return DriftReport::invalid();
        }

        let mut domain = self
            .percentile_ladder
            .iter()
            .chain(other.percentile_ladder.iter())
            .collect::<Vec<_>>();
        domain.sort_by(f64::total_cmp);

        let mut max_gap = 0.0;
        let mut location = domain[0];
        for &value in &domain {
            let gap = self.envelope_gap(other, value);
            if gap > max_gap {
                max_gap = gap;
                location = value;
            }
        }

        let drift = f64::min(max_gap, 100.0) / 100.0;
        DriftReport {
            drift,
            drift_idx: DriftLocation::Value(location),
            alert: drift > threshold,
            valid: true,
        }
    }

    // The upper quantile band gives the lower CDF envelope and vice versa.
    fn envelope_gap(&self, other: &Self, value: f64) -> f64 {
        let self_lower = self.percentile_upper_band.cdf_at(value);
        let self_upper = self.percentile_lower_band.cdf_at(value);
        let other_lower = other.percentile_upper_band.cdf_at(value);
        let other_upper = other.percentile_lower_band.cdf_at(value);
        f64::max(self_lower - other_upper, other_lower - self_upper).max(0.0)
    }

    /// Compares the invalid fraction of `other` against this summary.
    #[must_use]
    pub fn report_invalid_diff(&self, other: &Self, threshold: f64) -> InvalidsReport {
        if other.sample_size == 0 {
            return InvalidsReport::invalid();
        }
        InvalidsReport::from_fractions(self.invalid_fraction, other.invalid_fraction, threshold)
    }

    /// Draws `n` values from the summarized distribution by inverse-CDF
    /// sampling on the percentile ladder.
    pub fn sample<R>(&self, n: usize, rng: &mut R) -> Vec<f64>
    where
        R: Rng + ?Sized,
    {
        (0..n)
            .map(|_| self.percentile_ladder.value_at(rng.random_range(0.0..100.0)))
            .collect()
    }
}
