//! SegmentForge: customer segmentation over age, income and spending score
//!
//! This library provides min-max feature normalization, a seedable K-Means
//! engine, a rule-based value-tier classifier and summary statistics, plus
//! CSV, JSON-store and chart collaborators used by the command-line tool.

pub mod cli;
pub mod data;
pub mod error;
pub mod model;
pub mod normalize;
pub mod record;
pub mod rules;
pub mod stats;
pub mod store;
pub mod viz;

// Re-export public items for easier access
pub use error::ValidationError;
pub use model::{cluster, Centroid, ClusterResult, KMeans};
pub use normalize::{normalize, MinMaxScaler};
pub use record::{Feature, Record, Segment};
pub use rules::{assign_tier, classify_records, ValueTier};
pub use stats::{distributions, sort_records, summarize, Metrics};
pub use store::SessionStore;

/// Common result type used by the I/O collaborators
pub type Result<T> = anyhow::Result<T>;
