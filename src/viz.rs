//! Visualization functions using Plotters for segmentation reports

use std::path::Path;

use plotters::prelude::*;
use tracing::info;

use crate::model::ClusterResult;
use crate::record::Feature;
use crate::stats::{Distributions, Metrics};

/// Color palette for different clusters
const CLUSTER_COLORS: [RGBColor; 5] = [RED, BLUE, GREEN, MAGENTA, CYAN];

fn cluster_color(cluster: usize) -> RGBColor {
    CLUSTER_COLORS
        .get(cluster)
        .copied()
        .unwrap_or(BLACK)
}

/// Padded axis range covering `values`
fn axis_range(values: impl Iterator<Item = f64>, pad_fraction: f64) -> std::ops::Range<f64> {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if min > max {
        return 0.0..1.0;
    }
    let pad = ((max - min) * pad_fraction).max(1.0);
    (min - pad)..(max + pad)
}

/// Create scatter plot of income against spending score, colored by cluster
///
/// # Arguments
/// * `result` - Clustering run to draw
/// * `output_path` - Path to save the PNG plot
/// * `plot_title` - Title for the plot
pub fn create_cluster_visualization(
    result: &ClusterResult,
    output_path: &Path,
    plot_title: Option<&str>,
) -> crate::Result<()> {
    let title = plot_title.unwrap_or("Customer Segments: Income vs Spending Score");

    let incomes = result.records.iter().map(|r| r.income);
    let scores = result.records.iter().map(|r| r.spending_score);
    let x_range = axis_range(incomes, 0.05);
    let y_range = axis_range(scores, 0.05);
    // Centroid squares are sized relative to the axes
    let x_half = (x_range.end - x_range.start) * 0.01;
    let y_half = (y_range.end - y_range.start) * 0.01;

    let root = BitMapBackend::new(output_path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .x_desc("Income")
        .y_desc("Spending Score")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    chart.draw_series(result.records.iter().map(|record| {
        let color = cluster_color(record.cluster().unwrap_or(usize::MAX));
        Circle::new((record.income, record.spending_score), 4, color.filled())
    }))?;

    for (cluster_id, centroid) in result.centroids.iter().enumerate() {
        let color = cluster_color(cluster_id);
        chart
            .draw_series(std::iter::once(Rectangle::new(
                [
                    (centroid.income - x_half, centroid.spending_score - y_half),
                    (centroid.income + x_half, centroid.spending_score + y_half),
                ],
                color.filled(),
            )))?
            .label(format!("Cluster {cluster_id} centroid"))
            .legend(move |(x, y)| Rectangle::new([(x, y), (x + 10, y + 10)], color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    info!(path = %output_path.display(), "cluster plot saved");

    Ok(())
}

/// Draw a bar chart of labeled counts
fn draw_bar_chart(
    output_path: &Path,
    title: &str,
    x_desc: &str,
    bars: &[(String, usize)],
) -> crate::Result<()> {
    let max_count = bars.iter().map(|(_, count)| *count).max().unwrap_or(1).max(1) as f64;
    let n_bars = bars.len().max(1);

    let root = BitMapBackend::new(output_path, (600, 400)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(-0.5f64..(n_bars as f64 - 0.5), 0f64..(max_count * 1.1))?;

    let labels: Vec<String> = bars.iter().map(|(label, _)| label.clone()).collect();
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n_bars)
        .x_label_formatter(&|x| {
            let idx = x.round();
            if idx >= 0.0 && (x - idx).abs() < 1e-6 {
                labels.get(idx as usize).cloned().unwrap_or_default()
            } else {
                String::new()
            }
        })
        .x_desc(x_desc)
        .y_desc("Number of Customers")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    for (idx, (_, count)) in bars.iter().enumerate() {
        let color = cluster_color(idx);
        chart.draw_series(std::iter::once(Rectangle::new(
            [(idx as f64 - 0.4, 0.0), (idx as f64 + 0.4, *count as f64)],
            color.filled(),
        )))?;
    }

    root.present()?;
    info!(path = %output_path.display(), "{title} chart saved");

    Ok(())
}

/// Create a bar chart of cluster sizes
pub fn create_cluster_size_chart(result: &ClusterResult, output_path: &Path) -> crate::Result<()> {
    let bars: Vec<(String, usize)> = result
        .cluster_sizes()
        .into_iter()
        .enumerate()
        .map(|(cluster, size)| (cluster.to_string(), size))
        .collect();
    draw_bar_chart(output_path, "Cluster Sizes", "Cluster ID", &bars)
}

/// Create a histogram of one feature's distribution buckets
pub fn create_distribution_chart(
    distributions: &Distributions,
    feature: Feature,
    output_path: &Path,
) -> crate::Result<()> {
    let bars: Vec<(String, usize)> = distributions
        .feature(feature)
        .iter()
        .map(|bucket| (bucket.label.to_string(), bucket.count))
        .collect();
    let title = format!("{feature} Distribution");
    draw_bar_chart(output_path, &title, &feature.to_string(), &bars)
}

/// Print cluster statistics to console
pub fn print_cluster_statistics(result: &ClusterResult) {
    let total = result.records.len();

    println!("\n=== Cluster Statistics ===");
    println!("Number of clusters: {}", result.n_clusters());
    println!("Total customers: {total}");
    let stop = if result.converged {
        "converged"
    } else {
        "iteration cap reached"
    };
    println!("Iterations: {} ({stop})", result.iterations);
    if let Some(seed) = result.seed {
        println!("Seed: {seed}");
    }
    println!("Within-cluster sum of squares (Inertia): {:.4}", result.inertia);
    println!("Silhouette score (sample): {:.3}", result.silhouette_sample(100));

    println!("\nCluster sizes:");
    for (i, size) in result.cluster_sizes().into_iter().enumerate() {
        let percentage = if total == 0 {
            0.0
        } else {
            size as f64 / total as f64 * 100.0
        };
        println!("  Cluster {i}: {size} customers ({percentage:.1}%)");
    }

    println!("\nCluster centroids:");
    println!("  Cluster |    Age |     Income | Spending Score");
    println!("  --------|--------|------------|---------------");
    for (i, centroid) in result.centroids.iter().enumerate() {
        println!(
            "  {:7} | {:6.1} | {:10.0} | {:14.1}",
            i, centroid.age, centroid.income, centroid.spending_score
        );
    }
}

/// Print summary metrics to console
pub fn print_metrics(metrics: &Metrics) {
    println!("\n=== Summary ===");
    println!("Total customers: {}", metrics.total_customers);
    println!("  Feature        |       Mean |        Min |        Max");
    println!("  ---------------|------------|------------|-----------");
    for feature in Feature::ALL {
        let summary = metrics.feature(feature);
        println!(
            "  {:14} | {:10.1} | {:10.1} | {:10.1}",
            feature.to_string(),
            summary.mean,
            summary.min,
            summary.max
        );
    }
}

/// Print bucket counts for every feature
pub fn print_distributions(distributions: &Distributions) {
    for feature in Feature::ALL {
        println!("\n{feature} distribution:");
        for bucket in distributions.feature(feature) {
            println!("  {:>9}: {}", bucket.label, bucket.count);
        }
    }
}

/// Generate the cluster scatter plot and size chart side by side
///
/// The size chart is written next to `base_output_path` with a `_sizes` suffix.
pub fn generate_visualization_report(
    result: &ClusterResult,
    base_output_path: &Path,
) -> crate::Result<()> {
    create_cluster_visualization(result, base_output_path, None)?;

    let stem = base_output_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "clusters".to_string());
    let size_chart_path = base_output_path.with_file_name(format!("{stem}_sizes.png"));
    create_cluster_size_chart(result, &size_chart_path)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::cluster;
    use crate::record::Record;
    use crate::stats::distributions;
    use tempfile::tempdir;

    fn create_test_result() -> ClusterResult {
        let records = vec![
            Record::new("1", "John Doe", 25.0, 50_000.0, 80.0),
            Record::new("2", "Jane Smith", 35.0, 80_000.0, 60.0),
            Record::new("3", "Bob Johnson", 45.0, 120_000.0, 40.0),
            Record::new("4", "Alice Williams", 28.0, 45_000.0, 85.0),
            Record::new("5", "Charlie Brown", 52.0, 150_000.0, 30.0),
            Record::new("6", "Dana White", 61.0, 30_000.0, 12.0),
        ];
        cluster(&records, 3, 100, Some(42)).unwrap()
    }

    #[test]
    fn test_create_cluster_visualization() {
        let result = create_test_result();
        let temp_dir = tempdir().unwrap();
        let output_path = temp_dir.path().join("test_plot.png");

        create_cluster_visualization(&result, &output_path, None).unwrap();
        assert!(output_path.exists());
    }

    #[test]
    fn test_create_cluster_size_chart() {
        let result = create_test_result();
        let temp_dir = tempdir().unwrap();
        let output_path = temp_dir.path().join("test_sizes.png");

        create_cluster_size_chart(&result, &output_path).unwrap();
        assert!(output_path.exists());
    }

    #[test]
    fn test_create_distribution_chart() {
        let result = create_test_result();
        let dist = distributions(&result.records);
        let temp_dir = tempdir().unwrap();
        let output_path = temp_dir.path().join("income.png");

        create_distribution_chart(&dist, Feature::Income, &output_path).unwrap();
        assert!(output_path.exists());
    }

    #[test]
    fn test_generate_visualization_report() {
        let result = create_test_result();
        let temp_dir = tempdir().unwrap();
        let output_path = temp_dir.path().join("test_report.png");

        generate_visualization_report(&result, &output_path).unwrap();
        assert!(output_path.exists());
        assert!(temp_dir.path().join("test_report_sizes.png").exists());
    }

    #[test]
    fn test_axis_range_pads_degenerate_input() {
        assert_eq!(axis_range(std::iter::empty(), 0.1), 0.0..1.0);
        let range = axis_range([5.0, 5.0].into_iter(), 0.1);
        assert!(range.start < 5.0 && range.end > 5.0);
    }
}
