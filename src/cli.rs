//! Command-line interface definitions and argument parsing

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};

use crate::model::{DEFAULT_CLUSTERS, DEFAULT_MAX_ITERATIONS};
use crate::stats::{SortDirection, SortField};
use crate::store::DEFAULT_STORE_PATH;

/// Customer segmentation CLI: K-Means clusters and rule-based value tiers
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to the JSON file holding the working customer list
    #[arg(long, default_value = DEFAULT_STORE_PATH, global = true)]
    pub store: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load customers from a CSV file into the store
    Import {
        /// Path to the input CSV file
        input: PathBuf,

        /// Keep existing customers instead of replacing them
        #[arg(long)]
        append: bool,
    },

    /// Add one customer by hand; the value tier is assigned by rule
    Add(AddArgs),

    /// Run K-Means clustering
    Cluster(ClusterArgs),

    /// Label every customer with its rule-based value tier
    Classify {
        #[command(flatten)]
        source: SourceArgs,

        /// Write the labeled customers to this CSV file
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Print summary metrics, distributions and the customer table
    Summary(SummaryArgs),

    /// Write a sample CSV file
    Sample {
        /// Output path for the sample file
        #[arg(default_value = "sample_customers.csv")]
        output: PathBuf,
    },

    /// Remove every customer from the store
    Clear,
}

/// Where to read customers from
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Read customers from this CSV file instead of the store
    #[arg(short, long)]
    pub input: Option<PathBuf>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct AddArgs {
    /// Customer name
    #[arg(long)]
    pub name: String,

    /// Age in years (0-120)
    #[arg(long)]
    pub age: f64,

    /// Annual income (0-500000)
    #[arg(long)]
    pub income: f64,

    /// Spending score (1-100)
    #[arg(long)]
    pub score: f64,

    /// Customer identifier; generated when omitted
    #[arg(long)]
    pub id: Option<String>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ClusterArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Number of clusters for K-Means
    #[arg(short = 'k', long, default_value_t = DEFAULT_CLUSTERS)]
    pub clusters: usize,

    /// Maximum iterations for K-Means algorithm
    #[arg(long, default_value_t = DEFAULT_MAX_ITERATIONS)]
    pub max_iters: usize,

    /// Seed for centroid initialization; random when omitted
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output path for the cluster plot (a `_sizes` chart is written alongside)
    #[arg(short, long)]
    pub plot: Option<PathBuf>,

    /// Write the clustered customers to this CSV file
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Save cluster labels back into the store
    #[arg(long)]
    pub save: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Column to sort the customer table by
    #[arg(long, value_enum, default_value_t = SortKey::Id)]
    pub sort_by: SortKey,

    /// Sort in descending order
    #[arg(long)]
    pub desc: bool,

    /// Directory to write distribution histograms into
    #[arg(long)]
    pub charts: Option<PathBuf>,
}

impl SummaryArgs {
    pub fn direction(&self) -> SortDirection {
        if self.desc {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        }
    }
}

/// Sortable table columns
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Id,
    Name,
    Age,
    Income,
    #[value(name = "spending-score", alias = "score")]
    SpendingScore,
}

impl From<SortKey> for SortField {
    fn from(key: SortKey) -> Self {
        match key {
            SortKey::Id => SortField::Id,
            SortKey::Name => SortField::Name,
            SortKey::Age => SortField::Age,
            SortKey::Income => SortField::Income,
            SortKey::SpendingScore => SortField::SpendingScore,
        }
    }
}

/// Map `-v` occurrences to a default tracing filter
pub fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cluster_args() {
        let args = Args::try_parse_from([
            "segmentforge",
            "cluster",
            "-k",
            "4",
            "--seed",
            "42",
            "--input",
            "data.csv",
        ])
        .unwrap();

        match args.command {
            Command::Cluster(cluster) => {
                assert_eq!(cluster.clusters, 4);
                assert_eq!(cluster.max_iters, 100);
                assert_eq!(cluster.seed, Some(42));
                assert_eq!(cluster.source.input, Some(PathBuf::from("data.csv")));
                assert!(!cluster.save);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(args.store, PathBuf::from("customers.json"));
    }

    #[test]
    fn test_parse_add_args() {
        let args = Args::try_parse_from([
            "segmentforge",
            "-vv",
            "--store",
            "/tmp/s.json",
            "add",
            "--name",
            "Ann",
            "--age",
            "30",
            "--income",
            "75000",
            "--score",
            "88",
        ])
        .unwrap();

        assert_eq!(args.verbose, 2);
        assert_eq!(args.store, PathBuf::from("/tmp/s.json"));
        let Command::Add(add) = args.command else {
            panic!("expected add");
        };
        assert_eq!(add.name, "Ann");
        assert_eq!(add.income, 75_000.0);
        assert_eq!(add.id, None);
    }

    #[test]
    fn test_parse_summary_sort() {
        let args =
            Args::try_parse_from(["segmentforge", "summary", "--sort-by", "score", "--desc"]).unwrap();
        let Command::Summary(summary) = args.command else {
            panic!("expected summary");
        };
        assert_eq!(SortField::from(summary.sort_by), SortField::SpendingScore);
        assert_eq!(summary.direction(), SortDirection::Descending);
    }

    #[test]
    fn test_invalid_args_rejected() {
        assert!(Args::try_parse_from(["segmentforge", "cluster", "-k", "three"]).is_err());
        assert!(Args::try_parse_from(["segmentforge", "add", "--name", "A"]).is_err());
    }

    #[test]
    fn test_log_filter() {
        assert_eq!(log_filter(0), "warn");
        assert_eq!(log_filter(1), "info");
        assert_eq!(log_filter(7), "trace");
    }
}
