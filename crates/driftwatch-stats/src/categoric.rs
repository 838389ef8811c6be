use std::collections::{BTreeMap, BTreeSet};

use rand::{Rng, distr::Distribution as _, distr::weighted::WeightedIndex};
use serde::{Deserialize, Serialize};

use crate::{
    DataError, InvariantError,
    report::{DriftLocation, DriftReport, InvalidsReport},
};

/// z-score of the two-sided 95% normal interval.
pub const CONFIDENCE_Z: f64 = 1.96;

/// Allowed categories of a categorical feature.
pub type CategoricDomain = BTreeSet<String>;

/// Compact summary of a categorical distribution with per-category
/// confidence intervals.
///
/// Categories are kept in a [`BTreeMap`], so iteration (and sampling weights)
/// always follow the sorted category order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CategoricStatsState")]
pub struct CategoricStats {
    /// Probability of each valid category; sums to 1.
    #[serde(rename = "frequencies")]
    pub frequency_table: BTreeMap<String, f64>,
    #[serde(rename = "invalids")]
    pub invalid_fraction: f64,
    #[serde(rename = "samplesize")]
    pub sample_size: usize,
    #[serde(rename = "frequencies_lb")]
    pub frequency_lower_band: BTreeMap<String, f64>,
    #[serde(rename = "frequencies_ub")]
    pub frequency_upper_band: BTreeMap<String, f64>,
}

#[derive(Deserialize)]
struct CategoricStatsState {
    frequencies: BTreeMap<String, f64>,
    invalids: f64,
    samplesize: usize,
    frequencies_lb: BTreeMap<String, f64>,
    frequencies_ub: BTreeMap<String, f64>,
}

impl TryFrom<CategoricStatsState> for CategoricStats {
    type Error = InvariantError;

    fn try_from(state: CategoricStatsState) -> Result<Self, Self::Error> {
        let stats = Self {
            frequency_table: state.frequencies,
            invalid_fraction: state.invalids,
            sample_size: state.samplesize,
            frequency_lower_band: state.frequencies_lb,
            frequency_upper_band: state.frequencies_ub,
        };
        stats.validate()?;
        Ok(stats)
    }
}

fn bound(band: &BTreeMap<String, f64>, category: &str) -> f64 {
    band.get(category).copied().unwrap_or(0.0)
}

/// Normal-approximation interval of a binomial proportion, clipped to `[0, 1]`.
#[expect(clippy::cast_precision_loss)]
fn proportion_interval(p: f64, sample_size: usize) -> (f64, f64) {
    let error = CONFIDENCE_Z * (p * (1.0 - p) / sample_size as f64).sqrt();
    ((p - error).max(0.0), (p + error).min(1.0))
}

impl CategoricStats {
    /// Builds a summary from a sample of categories.
    ///
    /// `None` entries are invalid. When `domain` is given, categories outside
    /// it are invalid too.
    ///
    /// # Errors
    ///
    /// * [`DataError::EmptySample`] - `sample` is empty
    /// * [`DataError::NoValidValues`] - every value was invalid
    ///
    /// # Examples
    ///
    /// ```
    /// use driftwatch_stats::categoric::CategoricStats;
    ///
    /// let sample = ["a", "a", "b", "b"].map(Some);
    /// let stats = CategoricStats::build(sample, None).unwrap();
    /// assert_eq!(stats.frequency_table["a"], 0.5);
    /// assert_eq!(stats.frequency_table["b"], 0.5);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    pub fn build<I, S>(sample: I, domain: Option<&CategoricDomain>) -> Result<Self, DataError>
    where
        I: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        let mut sample_size = 0;
        let mut counts = BTreeMap::<String, usize>::new();
        for value in sample {
            sample_size += 1;
            let Some(value) = value else { continue };
            let value = value.as_ref();
            if domain.is_some_and(|domain| !domain.contains(value)) {
                continue;
            }
            *counts.entry(value.to_owned()).or_default() += 1;
        }
        if sample_size == 0 {
            return Err(DataError::EmptySample);
        }
        let valid = counts.values().sum::<usize>();
        if valid == 0 {
            return Err(DataError::NoValidValues);
        }

        let frequency_table = counts
            .into_iter()
            .map(|(category, count)| (category, count as f64 / valid as f64))
            .collect::<BTreeMap<_, _>>();
        let (frequency_lower_band, frequency_upper_band): (BTreeMap<_, _>, BTreeMap<_, _>) =
            frequency_table
                .iter()
                .map(|(category, &p)| {
                    let (lower, upper) = proportion_interval(p, sample_size);
                    ((category.clone(), lower), (category.clone(), upper))
                })
                .unzip();

        Ok(Self {
            frequency_table,
            invalid_fraction: (sample_size - valid) as f64 / sample_size as f64,
            sample_size,
            frequency_lower_band,
            frequency_upper_band,
        })
    }

    #[must_use]
    pub fn is_built(&self) -> bool {
        self.sample_size > 0 && self.validate().is_ok()
    }

    /// Whether `category` was observed when the summary was built.
    #[must_use]
    pub fn contains(&self, category: &str) -> bool {
        self.frequency_table.contains_key(category)
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> + '_ {
        self.frequency_table.keys().map(String::as_str)
    }

    pub fn validate(&self) -> Result<(), InvariantError> {
        if self.sample_size == 0 {
            return Err(InvariantError::EmptySample);
        }
        if !(0.0..=1.0).contains(&self.invalid_fraction) {
            return Err(InvariantError::InvalidFraction {
                value: self.invalid_fraction,
            });
        }
        for (category, &p) in &self.frequency_table {
            let (Some(&lower), Some(&upper)) = (
                self.frequency_lower_band.get(category),
                self.frequency_upper_band.get(category),
            ) else {
                return Err(InvariantError::Bands { what: "frequencies" });
            };
            if !(0.0..=1.0).contains(&p) {
                return Err(InvariantError::Frequency {
                    category: category.clone(),
                });
            }
            if !(0.0 <= lower && lower <= p && p <= upper && upper <= 1.0) {
                return Err(InvariantError::Bands { what: "frequencies" });
            }
        }
        if self.frequency_lower_band.len() != self.frequency_table.len()
            || self.frequency_upper_band.len() != self.frequency_table.len()
        {
            return Err(InvariantError::Bands { what: "frequencies" });
        }
        let sum = self.frequency_table.values().sum::<f64>();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(InvariantError::FrequencySum { sum });
        }
        Ok(())
    }

    /// Measures how distinguishable `other` is from this summary.
    ///
    /// Categories missing on one side count as probability 0 with a zero-width
    /// interval. For every category the gap between the two confidence
    /// intervals is taken (zero when they overlap); the largest gap is the
    /// drift. Ties resolve to the first category in sorted order.
    #[must_use]
    pub fn report_drift(&self, other: &Self, threshold: f64) -> DriftReport {
        if other.sample_size == 0 {
            return DriftReport::invalid();
        }
        let domain = self
            .frequency_table
            .keys()
            .chain(other.frequency_table.keys())
            .collect::<BTreeSet<_>>();

        let mut max_gap = 0.0;
        let mut location = None;
        for category in domain {
            let category = category.as_str();
            let self_lower = bound(&self.frequency_lower_band, category);
            let self_upper = bound(&self.frequency_upper_band, category);
            let other_lower = bound(&other.frequency_lower_band, category);
            let other_upper = bound(&other.frequency_upper_band, category);
            let gap = f64::max(self_lower - other_upper, other_lower - self_upper).max(0.0);
            if location.is_none() || gap > max_gap {
                max_gap = gap;
                location = Some(category.to_owned());
            }
        }

        let drift = f64::min(max_gap, 1.0);
        DriftReport {
            drift,
            drift_idx: DriftLocation::Category(location.unwrap_or_default()),
            alert: drift > threshold,
            valid: true,
        }
    }

    #[must_use]
    pub fn report_invalid_diff(&self, other: &Self, threshold: f64) -> InvalidsReport {
        if other.sample_size == 0 {
            return InvalidsReport::invalid();
        }
        InvalidsReport::from_fractions(self.invalid_fraction, other.invalid_fraction, threshold)
    }

    /// Draws `n` categories weighted by their frequency.
    pub fn sample<R>(&self, n: usize, rng: &mut R) -> Result<Vec<String>, DataError>
    where
        R: Rng + ?Sized,
    {
        let categories = self.frequency_table.keys().collect::<Vec<_>>();
        let weights = WeightedIndex::new(self.frequency_table.values().copied())
            .map_err(|_| DataError::NoValidValues)?;
        Ok((0..n)
            .map(|_| categories[weights.sample(rng)].to_owned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg64;

    use super::*;

    fn build(values: &[&str]) -> CategoricStats {
        CategoricStats::build(values.iter().map(Some), None).unwrap()
    }

    fn five_a_five_b() -> CategoricStats {
        build(&["a", "a", "a", "a", "a", "b", "b", "b", "b", "b"])
    }

    #[test]
    fn test_build_balanced() {
        let stats = five_a_five_b();
        assert_eq!(
            stats.frequency_table,
            BTreeMap::from([("a".to_owned(), 0.5), ("b".to_owned(), 0.5)])
        );
        assert_eq!(stats.invalid_fraction, 0.0);
        assert_eq!(stats.sample_size, 10);
        assert!(stats.is_built());
    }

    #[test]
    fn test_bands() {
        let stats = five_a_five_b();
        let error = 1.96 * (0.25_f64 / 10.0).sqrt();
        assert!((stats.frequency_lower_band["a"] - (0.5 - error)).abs() < 1e-12);
        assert!((stats.frequency_upper_band["a"] - (0.5 + error)).abs() < 1e-12);
    }

    #[test]
    fn test_certain_category_has_zero_width_band() {
        let stats = build(&["x", "x", "x"]);
        assert_eq!(stats.frequency_lower_band["x"], 1.0);
        assert_eq!(stats.frequency_upper_band["x"], 1.0);
    }

    #[test]
    fn test_nulls_and_domain_are_invalid() {
        let sample = [Some("a"), None, Some("b"), Some("c")];
        let domain = CategoricDomain::from(["a".to_owned(), "b".to_owned()]);
        let stats = CategoricStats::build(sample, Some(&domain)).unwrap();
        assert_eq!(stats.invalid_fraction, 0.5);
        assert_eq!(stats.frequency_table.len(), 2);
        assert!(!stats.contains("c"));
    }

    #[test]
    fn test_build_errors() {
        assert!(matches!(
            CategoricStats::build(Vec::<Option<&str>>::new(), None),
            Err(DataError::EmptySample)
        ));
        assert!(matches!(
            CategoricStats::build([None::<&str>, None], None),
            Err(DataError::NoValidValues)
        ));
    }

    #[test]
    fn test_drift_against_self_is_zero() {
        let stats = five_a_five_b();
        let report = stats.report_drift(&stats, 0.05);
        assert_eq!(report.drift, 0.0);
        assert_eq!(report.drift_idx, DriftLocation::Category("a".to_owned()));
        assert!(!report.alert);
    }

    #[test]
    fn test_drift_on_new_category() {
        let reference = build(&["a"; 200]);
        let mut observed = vec!["a"; 100];
        observed.extend(["b"; 100]);
        let observed = build(&observed);

        let report = reference.report_drift(&observed, 0.05);
        assert!(report.alert);
        assert!(report.drift > 0.3);
        assert_eq!(report.drift, observed.report_drift(&reference, 0.05).drift);
        assert!(report.drift_idx.is_category());
    }

    #[test]
    fn test_drift_is_symmetric() {
        let a = build(&["a", "a", "a", "b", "c", "c"]);
        let b = build(&["b", "b", "b", "b", "d", "a", "a"]);
        assert_eq!(a.report_drift(&b, 0.1), b.report_drift(&a, 0.1));
    }

    #[test]
    fn test_invalid_diff_on_empty_other() {
        let stats = five_a_five_b();
        let empty = CategoricStats {
            sample_size: 0,
            ..stats.clone()
        };
        assert!(!stats.report_invalid_diff(&empty, 0.01).valid);
        assert!(!stats.report_drift(&empty, 0.05).valid);
    }

    #[test]
    fn test_serde_roundtrip_is_exact() {
        let stats = build(&["x", "y", "y", "z", "z", "z", "w"]);
        let json = serde_json::to_string(&stats).unwrap();
        let decoded: CategoricStats = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, stats);
        let value = serde_json::to_value(&stats).unwrap();
        for key in ["frequencies", "invalids", "samplesize", "frequencies_lb", "frequencies_ub"] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn test_deserialize_rejects_missing_band() {
        let mut value = serde_json::to_value(five_a_five_b()).unwrap();
        value["frequencies_lb"]
            .as_object_mut()
            .unwrap()
            .remove("a");
        assert!(serde_json::from_value::<CategoricStats>(value).is_err());
    }

    #[test]
    fn test_sample_only_known_categories() {
        let stats = build(&["a", "b", "b", "b"]);
        let mut rng = Pcg64::seed_from_u64(9);
        let drawn = stats.sample(500, &mut rng).unwrap();
        assert_eq!(drawn.len(), 500);
        assert!(drawn.iter().all(|c| stats.contains(c)));
        let b_count = drawn.iter().filter(|c| *c == "b").count();
        assert!(b_count > 300, "b drawn {b_count} times");
    }

    mod properties {
        use proptest::prelude::*;

        use super::*;

        fn categories(max_len: usize) -> impl Strategy<Value = Vec<&'static str>> {
            prop::collection::vec(prop::sample::select(vec!["a", "b", "c", "d", "e"]), 1..max_len)
        }

        proptest! {
            #[test]
            fn drift_is_symmetric(a in categories(80), b in categories(80)) {
                let a = build(&a);
                let b = build(&b);
                prop_assert_eq!(a.report_drift(&b, 0.05), b.report_drift(&a, 0.05));
            }

            #[test]
            fn drift_against_self_is_zero(a in categories(80)) {
                let a = build(&a);
                let report = a.report_drift(&a, 0.05);
                prop_assert_eq!(report.drift, 0.0);
                prop_assert!(!report.alert);
            }
        }
    }
}
