//! Rule-based value tiers from income and spending score

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::record::{Record, Segment};

/// Income above which a customer can reach the high tier
pub const HIGH_INCOME: f64 = 70_000.0;
/// Spending score above which a customer can reach the high tier
pub const HIGH_SCORE: f64 = 70.0;
/// Income above which a customer can reach the medium tier
pub const MEDIUM_INCOME: f64 = 40_000.0;
/// Spending score above which a customer can reach the medium tier
pub const MEDIUM_SCORE: f64 = 40.0;

/// Fixed customer value tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueTier {
    #[serde(rename = "High Value")]
    HighValue,
    #[serde(rename = "Medium Value")]
    MediumValue,
    #[serde(rename = "Low Value")]
    LowValue,
}

impl ValueTier {
    pub fn label(self) -> &'static str {
        match self {
            ValueTier::HighValue => "High Value",
            ValueTier::MediumValue => "Medium Value",
            ValueTier::LowValue => "Low Value",
        }
    }
}

impl fmt::Display for ValueTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Assign a value tier. Thresholds are strict and checked high to low.
pub fn assign_tier(income: f64, spending_score: f64) -> ValueTier {
    if income > HIGH_INCOME && spending_score > HIGH_SCORE {
        ValueTier::HighValue
    } else if income > MEDIUM_INCOME && spending_score > MEDIUM_SCORE {
        ValueTier::MediumValue
    } else {
        ValueTier::LowValue
    }
}

/// Annotate every record with its value tier
pub fn classify_records(records: &[Record]) -> Vec<Record> {
    records
        .iter()
        .map(|record| {
            record.with_segment(Segment::Tier(assign_tier(
                record.income,
                record.spending_score,
            )))
        })
        .collect()
}
