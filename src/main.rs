//! SegmentForge: customer segmentation CLI
//!
//! This is the main entrypoint that orchestrates record loading, clustering,
//! rule classification, reporting and export.

use std::path::Path;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use anyhow::Result;
use clap::Parser;
use segmentforge::cli::{log_filter, AddArgs, Args, ClusterArgs, Command, SourceArgs, SummaryArgs};
use segmentforge::record::{Feature, Record, Segment};
use segmentforge::{
    assign_tier, classify_records, data, distributions, sort_records, summarize, viz, KMeans,
    SessionStore,
};
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();
    init_tracing(args.verbose);

    let store = SessionStore::open(&args.store);
    debug!(store = %store.path().display(), "using session store");

    match args.command {
        Command::Import { input, append } => run_import(&store, &input, append),
        Command::Add(add) => run_add(&store, add),
        Command::Cluster(cluster) => run_cluster(&store, &cluster),
        Command::Classify { source, export } => run_classify(&store, &source, export.as_deref()),
        Command::Summary(summary) => run_summary(&store, &summary),
        Command::Sample { output } => {
            data::write_sample(&output)?;
            println!("✓ Sample CSV written to {}", output.display());
            Ok(())
        }
        Command::Clear => {
            store.clear()?;
            println!("✓ Store cleared");
            Ok(())
        }
    }
}

/// Install the stderr log subscriber; `RUST_LOG` overrides the `-v` level
fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_filter(verbose)));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Customers from `--input` when given, otherwise from the store
fn load_source(store: &SessionStore, source: &SourceArgs) -> Result<Vec<Record>> {
    match &source.input {
        Some(path) => data::load_records(path),
        None => store.load(),
    }
}

fn run_import(store: &SessionStore, input: &Path, append: bool) -> Result<()> {
    let records = data::load_records(input)?;
    let count = records.len();
    let total = if append {
        store.extend(records)?
    } else {
        store.save(&records)?;
        count
    };
    println!("✓ Imported {count} customers ({total} in store)");
    Ok(())
}

fn run_add(store: &SessionStore, add: AddArgs) -> Result<()> {
    let tier = assign_tier(add.income, add.score);
    let id = add.id.unwrap_or_else(generated_id);
    let record = Record::new(id, add.name, add.age, add.income, add.score)
        .with_segment(Segment::Tier(tier));

    let total = store.add(record)?;
    println!("✓ Customer added. Segment: {tier} ({total} in store)");
    Ok(())
}

fn generated_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    format!("customer-{millis}")
}

/// Run full clustering pipeline
fn run_cluster(store: &SessionStore, args: &ClusterArgs) -> Result<()> {
    println!("=== Clustering Pipeline ===\n");
    let start_time = Instant::now();

    let records = load_source(store, &args.source)?;
    println!("✓ Data loaded: {} customers", records.len());
    if records.is_empty() {
        println!("No customers to cluster. Import or add some first.");
        return Ok(());
    }

    info!(
        k = args.clusters,
        max_iterations = args.max_iters,
        seed = ?args.seed,
        "fitting k-means"
    );
    let mut params = KMeans::new(args.clusters).max_iterations(args.max_iters);
    if let Some(seed) = args.seed {
        params = params.seed(seed);
    }
    let result = params.fit(&records)?;
    println!("✓ Model fitted in {:.2}s", start_time.elapsed().as_secs_f64());

    viz::print_cluster_statistics(&result);

    if let Some(plot) = &args.plot {
        viz::generate_visualization_report(&result, plot)?;
        println!("\n✓ Cluster plot saved to {}", plot.display());
    }
    if let Some(export) = &args.export {
        data::write_records(export, &result.records)?;
        println!("✓ Clustered customers exported to {}", export.display());
    }
    if args.save {
        store.save(&result.records)?;
        println!("✓ Cluster labels saved to {}", store.path().display());
    }

    println!("\nTotal processing time: {:.2}s", start_time.elapsed().as_secs_f64());
    Ok(())
}

fn run_classify(store: &SessionStore, source: &SourceArgs, export: Option<&Path>) -> Result<()> {
    let records = classify_records(&load_source(store, source)?);

    println!("=== Value Tiers ===\n");
    for record in &records {
        let tier = record.segment.map(|s| s.to_string()).unwrap_or_default();
        println!("  {:<20} {:<24} {tier}", record.id, record.name);
    }

    if let Some(export) = export {
        data::write_records(export, &records)?;
        println!("\n✓ Labeled customers exported to {}", export.display());
    }
    Ok(())
}

fn run_summary(store: &SessionStore, args: &SummaryArgs) -> Result<()> {
    let mut records = load_source(store, &args.source)?;

    let metrics = summarize(&records);
    viz::print_metrics(&metrics);

    let dist = distributions(&records);
    viz::print_distributions(&dist);

    sort_records(&mut records, args.sort_by.into(), args.direction());
    println!("\n=== Customers ===");
    println!(
        "  {:<20} {:<24} {:>5} {:>10} {:>6}  Segment",
        "ID", "Name", "Age", "Income", "Score"
    );
    for record in &records {
        let segment = record.segment.map(|s| s.to_string()).unwrap_or_default();
        println!(
            "  {:<20} {:<24} {:>5.0} {:>10.0} {:>6.0}  {segment}",
            record.id, record.name, record.age, record.income, record.spending_score
        );
    }

    if let Some(dir) = &args.charts {
        std::fs::create_dir_all(dir)?;
        for feature in Feature::ALL {
            let path = dir.join(format!("{}_distribution.png", feature.column_name()));
            viz::create_distribution_chart(&dist, feature, &path)?;
        }
        println!("\n✓ Distribution charts saved to {}", dir.display());
    }
    Ok(())
}
