//! Customer records, feature axes and segment annotations

use std::collections::HashSet;
use std::fmt;
use std::ops::RangeInclusive;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::rules::ValueTier;

/// Number of numeric attributes modeled per customer
pub const N_FEATURES: usize = 3;

/// One numeric attribute of a customer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Age,
    Income,
    SpendingScore,
}

impl Feature {
    /// All features in column order of the feature matrix
    pub const ALL: [Feature; N_FEATURES] = [Feature::Age, Feature::Income, Feature::SpendingScore];

    /// Canonical column name used for import and export
    pub fn column_name(self) -> &'static str {
        match self {
            Feature::Age => "age",
            Feature::Income => "income",
            Feature::SpendingScore => "spendingScore",
        }
    }

    /// Header names accepted when importing tabular data, in priority order
    pub fn synonyms(self) -> &'static [&'static str] {
        match self {
            Feature::Age => &["age"],
            Feature::Income => &["income"],
            Feature::SpendingScore => &["spendingScore", "spending_score", "score"],
        }
    }

    /// Accepted input range for validated records
    pub fn valid_range(self) -> RangeInclusive<f64> {
        match self {
            Feature::Age => 0.0..=120.0,
            Feature::Income => 0.0..=500_000.0,
            Feature::SpendingScore => 1.0..=100.0,
        }
    }

    /// Column index in the feature matrix
    pub fn index(self) -> usize {
        self as usize
    }

    /// Read this feature from a record
    pub fn value(self, record: &Record) -> f64 {
        match self {
            Feature::Age => record.age,
            Feature::Income => record.income,
            Feature::SpendingScore => record.spending_score,
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Feature::Age => "Age",
            Feature::Income => "Income",
            Feature::SpendingScore => "Spending Score",
        };
        f.write_str(label)
    }
}

/// Segment annotation attached to a record by one of the two labeling schemes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Segment {
    /// Cluster index assigned by the K-Means engine
    Cluster(usize),
    /// Value tier assigned by the rule classifier
    Tier(ValueTier),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Cluster(idx) => write!(f, "{idx}"),
            Segment::Tier(tier) => write!(f, "{tier}"),
        }
    }
}

/// A single customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    pub name: String,
    pub age: f64,
    pub income: f64,
    pub spending_score: f64,
    #[serde(rename = "cluster", default, skip_serializing_if = "Option::is_none")]
    pub segment: Option<Segment>,
}

impl Record {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        age: f64,
        income: f64,
        spending_score: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            age,
            income,
            spending_score,
            segment: None,
        }
    }

    /// Copy of this record carrying the given annotation
    pub fn with_segment(&self, segment: Segment) -> Self {
        Self {
            segment: Some(segment),
            ..self.clone()
        }
    }

    /// Feature values in matrix column order
    pub fn features(&self) -> [f64; N_FEATURES] {
        Feature::ALL.map(|feature| feature.value(self))
    }

    /// Cluster index, if this record was annotated by the K-Means engine
    pub fn cluster(&self) -> Option<usize> {
        match self.segment {
            Some(Segment::Cluster(idx)) => Some(idx),
            _ => None,
        }
    }

    /// Reject values that would poison distance arithmetic
    pub fn check_finite(&self) -> Result<(), ValidationError> {
        for feature in Feature::ALL {
            if !feature.value(self).is_finite() {
                return Err(ValidationError::NonFiniteFeature {
                    id: self.id.clone(),
                    field: feature.column_name(),
                });
            }
        }
        Ok(())
    }
}

/// Stack the raw features of `records` into an (n, 3) matrix
pub fn feature_matrix(records: &[Record]) -> Array2<f64> {
    let mut data = Vec::with_capacity(records.len() * N_FEATURES);
    for record in records {
        data.extend_from_slice(&record.features());
    }
    Array2::from_shape_vec((records.len(), N_FEATURES), data)
        .unwrap_or_else(|_| Array2::zeros((0, N_FEATURES)))
}

/// Fail on the first identifier that appears twice
pub fn ensure_unique_ids(records: &[Record]) -> Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        if !seen.insert(record.id.as_str()) {
            return Err(ValidationError::DuplicateId(record.id.clone()));
        }
    }
    Ok(())
}
