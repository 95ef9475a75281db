//! Summary statistics, distribution buckets and record ordering

use std::cmp::Ordering;

use serde::Serialize;

use crate::record::{Feature, Record};

/// Mean, minimum and maximum of one feature
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FeatureSummary {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

/// Aggregate metrics over a record set
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub total_customers: usize,
    pub age: FeatureSummary,
    pub income: FeatureSummary,
    pub spending_score: FeatureSummary,
}

impl Metrics {
    pub fn feature(&self, feature: Feature) -> &FeatureSummary {
        match feature {
            Feature::Age => &self.age,
            Feature::Income => &self.income,
            Feature::SpendingScore => &self.spending_score,
        }
    }
}

/// Count and per-feature mean/min/max. Empty input yields all zeros.
pub fn summarize(records: &[Record]) -> Metrics {
    if records.is_empty() {
        return Metrics::default();
    }
    Metrics {
        total_customers: records.len(),
        age: summarize_feature(records, Feature::Age),
        income: summarize_feature(records, Feature::Income),
        spending_score: summarize_feature(records, Feature::SpendingScore),
    }
}

fn summarize_feature(records: &[Record], feature: Feature) -> FeatureSummary {
    let mut sum = 0.0;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for value in records.iter().map(|record| feature.value(record)) {
        sum += value;
        min = min.min(value);
        max = max.max(value);
    }
    FeatureSummary {
        mean: sum / records.len() as f64,
        min,
        max,
    }
}

/// Range of values counted by a histogram bucket
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    /// `lo..=hi`
    Inclusive(f64, f64),
    /// `lo..hi`
    HalfOpen(f64, f64),
    /// `lo..`
    AtLeast(f64),
}

impl Bound {
    pub fn contains(&self, value: f64) -> bool {
        match *self {
            Bound::Inclusive(lo, hi) => lo <= value && value <= hi,
            Bound::HalfOpen(lo, hi) => lo <= value && value < hi,
            Bound::AtLeast(lo) => lo <= value,
        }
    }
}

/// A labeled histogram bucket
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    pub label: &'static str,
    pub count: usize,
}

static AGE_BUCKETS: [(&str, Bound); 5] = [
    ("18-25", Bound::Inclusive(18.0, 25.0)),
    ("26-35", Bound::Inclusive(26.0, 35.0)),
    ("36-45", Bound::Inclusive(36.0, 45.0)),
    ("46-55", Bound::Inclusive(46.0, 55.0)),
    ("56+", Bound::AtLeast(56.0)),
];

static INCOME_BUCKETS: [(&str, Bound); 5] = [
    ("$0-30k", Bound::HalfOpen(f64::NEG_INFINITY, 30_000.0)),
    ("$30-50k", Bound::HalfOpen(30_000.0, 50_000.0)),
    ("$50-70k", Bound::HalfOpen(50_000.0, 70_000.0)),
    ("$70-100k", Bound::HalfOpen(70_000.0, 100_000.0)),
    ("$100k+", Bound::AtLeast(100_000.0)),
];

static SCORE_BUCKETS: [(&str, Bound); 5] = [
    ("1-20", Bound::Inclusive(1.0, 20.0)),
    ("21-40", Bound::Inclusive(21.0, 40.0)),
    ("41-60", Bound::Inclusive(41.0, 60.0)),
    ("61-80", Bound::Inclusive(61.0, 80.0)),
    ("81-100", Bound::Inclusive(81.0, 100.0)),
];

/// Bucket boundaries used for a feature's histogram
pub fn buckets_for(feature: Feature) -> &'static [(&'static str, Bound)] {
    match feature {
        Feature::Age => &AGE_BUCKETS,
        Feature::Income => &INCOME_BUCKETS,
        Feature::SpendingScore => &SCORE_BUCKETS,
    }
}

/// Histograms of every feature
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Distributions {
    pub age: Vec<Bucket>,
    pub income: Vec<Bucket>,
    pub spending_score: Vec<Bucket>,
}

impl Distributions {
    pub fn feature(&self, feature: Feature) -> &[Bucket] {
        match feature {
            Feature::Age => &self.age,
            Feature::Income => &self.income,
            Feature::SpendingScore => &self.spending_score,
        }
    }
}

/// Count records per bucket for each feature. Values outside every bucket are skipped.
pub fn distributions(records: &[Record]) -> Distributions {
    Distributions {
        age: histogram(records, Feature::Age),
        income: histogram(records, Feature::Income),
        spending_score: histogram(records, Feature::SpendingScore),
    }
}

fn histogram(records: &[Record], feature: Feature) -> Vec<Bucket> {
    buckets_for(feature)
        .iter()
        .map(|&(label, bound)| Bucket {
            label,
            count: records
                .iter()
                .filter(|record| bound.contains(feature.value(record)))
                .count(),
        })
        .collect()
}

/// Column to order records by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    Id,
    Name,
    Age,
    Income,
    SpendingScore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Stable sort of `records` by the given column
pub fn sort_records(records: &mut [Record], field: SortField, direction: SortDirection) {
    records.sort_by(|a, b| {
        let ordering = compare(a, b, field);
        match direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}

fn compare(a: &Record, b: &Record, field: SortField) -> Ordering {
    match field {
        SortField::Id => a.id.cmp(&b.id),
        SortField::Name => a.name.cmp(&b.name),
        SortField::Age => a.age.total_cmp(&b.age),
        SortField::Income => a.income.total_cmp(&b.income),
        SortField::SpendingScore => a.spending_score.total_cmp(&b.spending_score),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Record> {
        vec![
            Record::new("1", "John Doe", 25.0, 50_000.0, 80.0),
            Record::new("2", "Jane Smith", 35.0, 80_000.0, 60.0),
            Record::new("3", "Bob Johnson", 45.0, 120_000.0, 40.0),
            Record::new("4", "Alice Williams", 28.0, 45_000.0, 85.0),
            Record::new("5", "Charlie Brown", 52.0, 150_000.0, 30.0),
        ]
    }

    #[test]
    fn test_summarize_two_records() {
        let metrics = summarize(&sample()[..2]);
        assert_eq!(metrics.total_customers, 2);
        assert_eq!(metrics.age.mean, 30.0);
        assert_eq!(metrics.age.min, 25.0);
        assert_eq!(metrics.age.max, 35.0);
        assert_eq!(metrics.income.mean, 65_000.0);
        assert_eq!(metrics.spending_score.mean, 70.0);
        assert_eq!(metrics.feature(Feature::Income).max, 80_000.0);
    }

    #[test]
    fn test_summarize_empty() {
        assert_eq!(summarize(&[]), Metrics::default());
        assert_eq!(summarize(&[]).age.mean, 0.0);
    }

    #[test]
    fn test_distributions() {
        let dist = distributions(&sample());
        let counts = |buckets: &[Bucket]| buckets.iter().map(|b| b.count).collect::<Vec<_>>();

        assert_eq!(counts(&dist.age), vec![1, 2, 1, 1, 0]);
        assert_eq!(counts(&dist.income), vec![0, 1, 1, 1, 2]);
        assert_eq!(counts(&dist.spending_score), vec![0, 2, 1, 1, 1]);
        assert_eq!(dist.feature(Feature::Age)[4].label, "56+");
    }

    #[test]
    fn test_distribution_gaps_are_skipped() {
        // 25.5 falls between the integer age buckets; 17 is below the first
        let records = vec![
            Record::new("a", "A", 25.5, 1.0, 1.0),
            Record::new("b", "B", 17.0, 1.0, 1.0),
        ];
        let dist = distributions(&records);
        assert_eq!(dist.age.iter().map(|b| b.count).sum::<usize>(), 0);
        assert_eq!(dist.income[0].count, 2);
    }

    #[test]
    fn test_sort_records() {
        let mut records = sample();
        sort_records(&mut records, SortField::Income, SortDirection::Descending);
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["5", "3", "2", "1", "4"]);

        sort_records(&mut records, SortField::Name, SortDirection::Ascending);
        assert_eq!(records[0].name, "Alice Williams");
        assert_eq!(records[4].name, "John Doe");
    }
}
