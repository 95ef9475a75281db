//! K-Means clustering engine and result materialization

use std::collections::HashSet;

use ndarray::{Array1, Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::error::ValidationError;
use crate::normalize::MinMaxScaler;
use crate::record::{ensure_unique_ids, feature_matrix, Record, Segment, N_FEATURES};

/// Default number of clusters
pub const DEFAULT_CLUSTERS: usize = 3;
/// Default iteration cap
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// Cluster centroid in original feature units
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Centroid {
    pub age: f64,
    pub income: f64,
    pub spending_score: f64,
}

impl From<[f64; N_FEATURES]> for Centroid {
    fn from(values: [f64; N_FEATURES]) -> Self {
        Self {
            age: values[0],
            income: values[1],
            spending_score: values[2],
        }
    }
}

/// Outcome of one clustering run
#[derive(Debug, Clone)]
pub struct ClusterResult {
    /// Input records in input order, each annotated with its cluster index
    pub records: Vec<Record>,
    /// Denormalized centroids ordered by cluster index
    pub centroids: Vec<Centroid>,
    /// Sum of squared distances to assigned centroids, in normalized space
    pub inertia: f64,
    /// Number of assignment passes performed
    pub iterations: usize,
    /// Whether assignments stabilized before the iteration cap
    pub converged: bool,
    /// Seed of the RNG used for centroid initialization
    pub seed: Option<u64>,
    /// Centroids in normalized space, shape (k, 3)
    pub normalized_centroids: Array2<f64>,
    /// Scaler fitted on the input records
    pub scaler: MinMaxScaler,
}

impl ClusterResult {
    fn empty() -> Self {
        Self {
            records: Vec::new(),
            centroids: Vec::new(),
            inertia: 0.0,
            iterations: 0,
            converged: false,
            seed: None,
            normalized_centroids: Array2::zeros((0, N_FEATURES)),
            scaler: MinMaxScaler::default(),
        }
    }

    /// Number of clusters in this result
    pub fn n_clusters(&self) -> usize {
        self.centroids.len()
    }

    /// Cluster index per record, in record order
    pub fn labels(&self) -> Vec<usize> {
        self.records
            .iter()
            .map(|record| record.cluster().unwrap_or(0))
            .collect()
    }

    /// Get cluster sizes
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.n_clusters()];
        for record in &self.records {
            if let Some(label) = record.cluster() {
                if label < sizes.len() {
                    sizes[label] += 1;
                }
            }
        }
        sizes
    }

    /// Cluster assigned to the record with the given id
    pub fn assignment(&self, id: &str) -> Option<usize> {
        self.records
            .iter()
            .find(|record| record.id == id)
            .and_then(Record::cluster)
    }

    /// Normalized feature matrix of the clustered records
    pub fn normalized_points(&self) -> Array2<f64> {
        self.scaler.transform(&feature_matrix(&self.records))
    }

    /// Assign a new record to the nearest existing centroid.
    ///
    /// Values outside the fitted range are clamped into [0, 1] first.
    pub fn predict(&self, record: &Record) -> Result<Option<usize>, ValidationError> {
        record.check_finite()?;
        if self.normalized_centroids.nrows() == 0 {
            return Ok(None);
        }
        let point = self
            .scaler
            .transform_row(&record.features())
            .mapv(|x| x.clamp(0.0, 1.0));
        Ok(Some(nearest_centroid(point.view(), &self.normalized_centroids)))
    }

    /// Compute basic silhouette coefficient for a subset of points (for efficiency)
    pub fn silhouette_sample(&self, sample_size: usize) -> f64 {
        let features = self.normalized_points();
        let labels = self.labels();
        let n_clusters = self.n_clusters();
        let n_samples = features.nrows().min(sample_size);
        if n_samples < 2 {
            return 0.0;
        }

        let mut silhouette_sum = 0.0;

        for i in 0..n_samples {
            let point = features.row(i);
            let cluster_label = labels[i];

            let mut same_cluster = (0.0, 0usize);
            let mut other_clusters = vec![(0.0, 0usize); n_clusters];

            for j in 0..n_samples {
                if i == j {
                    continue;
                }
                let distance = euclidean_distance(&point, &features.row(j));
                let other_label = labels[j];

                if other_label == cluster_label {
                    same_cluster.0 += distance;
                    same_cluster.1 += 1;
                } else if other_label < n_clusters {
                    other_clusters[other_label].0 += distance;
                    other_clusters[other_label].1 += 1;
                }
            }

            // a(i): mean distance within own cluster
            let a_i = if same_cluster.1 == 0 {
                0.0
            } else {
                same_cluster.0 / same_cluster.1 as f64
            };

            // b(i): smallest mean distance to another cluster
            let b_i = other_clusters
                .iter()
                .filter(|(_, count)| *count > 0)
                .map(|(sum, count)| sum / *count as f64)
                .fold(f64::INFINITY, f64::min);

            silhouette_sum += if b_i.is_infinite() || (a_i == 0.0 && b_i == 0.0) {
                0.0
            } else {
                (b_i - a_i) / a_i.max(b_i)
            };
        }

        silhouette_sum / n_samples as f64
    }
}

/// K-Means configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KMeans {
    n_clusters: usize,
    max_iterations: usize,
    seed: Option<u64>,
}

impl Default for KMeans {
    fn default() -> Self {
        Self::new(DEFAULT_CLUSTERS)
    }
}

impl KMeans {
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            seed: None,
        }
    }

    /// Cap on assignment passes
    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Fix the RNG seed used for centroid initialization
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    /// Cluster `records`, seeding a [`StdRng`] from the configured seed or a fresh one.
    pub fn fit(&self, records: &[Record]) -> Result<ClusterResult, ValidationError> {
        let seed = self.seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);
        let mut result = self.fit_with_rng(records, &mut rng)?;
        result.seed = Some(seed);
        Ok(result)
    }

    /// Cluster `records` drawing initial centroids from `rng`
    pub fn fit_with_rng<R: Rng + ?Sized>(
        &self,
        records: &[Record],
        rng: &mut R,
    ) -> Result<ClusterResult, ValidationError> {
        let k = self.n_clusters;
        self.fit_with_init(records, |points| initial_centroids(points, k, rng))
    }

    /// Cluster `records` starting from the centroids `init` picks in normalized space
    fn fit_with_init(
        &self,
        records: &[Record],
        init: impl FnOnce(&Array2<f64>) -> Array2<f64>,
    ) -> Result<ClusterResult, ValidationError> {
        let k = self.n_clusters;
        if k < 1 {
            return Err(ValidationError::InvalidClusterCount {
                requested: k,
                n_records: records.len(),
            });
        }
        if records.is_empty() {
            return Ok(ClusterResult::empty());
        }
        if k > records.len() {
            return Err(ValidationError::InvalidClusterCount {
                requested: k,
                n_records: records.len(),
            });
        }
        for record in records {
            record.check_finite()?;
        }
        ensure_unique_ids(records)?;

        let raw = feature_matrix(records);
        let scaler = MinMaxScaler::fit(&raw);
        let points = scaler.transform(&raw);

        debug!(
            n_records = records.len(),
            k,
            max_iterations = self.max_iterations,
            "starting k-means"
        );

        let mut state = Snapshot::initial(init(&points));
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_iterations {
            let next = state.step(&points);
            iterations += 1;
            if next.assignments == state.assignments {
                converged = true;
                state = next;
                break;
            }
            trace!(iteration = iterations, "assignments changed");
            state = next;
        }

        if converged {
            debug!(iterations, "k-means converged");
        } else {
            debug!(iterations, "k-means stopped at iteration cap");
        }

        let Snapshot {
            assignments,
            centroids,
        } = state;
        let assignments = assignments.unwrap_or_else(|| assign(&points, &centroids));

        let orphans = count_orphans(&assignments, k);
        if orphans > 0 {
            warn!(orphans, k, "clusters ended without members; their centroids were kept");
        }

        Ok(materialize(
            records,
            &points,
            assignments,
            centroids,
            scaler,
            iterations,
            converged,
        ))
    }
}

/// Cluster `records` into `k` groups.
///
/// `seed` fixes centroid initialization; `None` draws a fresh seed, reported
/// back in [`ClusterResult::seed`].
pub fn cluster(
    records: &[Record],
    k: usize,
    max_iterations: usize,
    seed: Option<u64>,
) -> Result<ClusterResult, ValidationError> {
    let mut params = KMeans::new(k).max_iterations(max_iterations);
    if let Some(seed) = seed {
        params = params.seed(seed);
    }
    params.fit(records)
}

/// Immutable engine state between iterations
#[derive(Debug, Clone, PartialEq)]
struct Snapshot {
    /// Assignment produced by the last pass; `None` before the first pass
    assignments: Option<Vec<usize>>,
    centroids: Array2<f64>,
}

impl Snapshot {
    fn initial(centroids: Array2<f64>) -> Self {
        Self {
            assignments: None,
            centroids,
        }
    }

    /// Assign every point, then move each centroid to the mean of its members
    fn step(&self, points: &Array2<f64>) -> Snapshot {
        let assignments = assign(points, &self.centroids);
        let centroids = update_centroids(points, &assignments, &self.centroids);
        Snapshot {
            assignments: Some(assignments),
            centroids,
        }
    }
}

/// Sample `k` rows of `points` uniformly with replacement
fn initial_centroids<R: Rng + ?Sized>(points: &Array2<f64>, k: usize, rng: &mut R) -> Array2<f64> {
    let mut centroids = Array2::zeros((k, points.ncols()));
    for mut row in centroids.outer_iter_mut() {
        let idx = rng.gen_range(0..points.nrows());
        row.assign(&points.row(idx));
    }
    centroids
}

/// Index of the nearest centroid for every point; ties go to the lowest index
pub fn assign(points: &Array2<f64>, centroids: &Array2<f64>) -> Vec<usize> {
    points
        .outer_iter()
        .map(|point| nearest_centroid(point, centroids))
        .collect()
}

fn nearest_centroid(point: ArrayView1<f64>, centroids: &Array2<f64>) -> usize {
    let mut min_distance = f64::INFINITY;
    let mut closest_cluster = 0;

    for (cluster_idx, centroid) in centroids.outer_iter().enumerate() {
        let distance = euclidean_distance(&point, &centroid);
        if distance < min_distance {
            min_distance = distance;
            closest_cluster = cluster_idx;
        }
    }

    closest_cluster
}

/// Mean of each cluster's members; empty clusters keep their previous centroid
fn update_centroids(
    points: &Array2<f64>,
    assignments: &[usize],
    previous: &Array2<f64>,
) -> Array2<f64> {
    let mut sums = Array2::<f64>::zeros(previous.raw_dim());
    let mut counts = vec![0usize; previous.nrows()];

    for (point, &cluster) in points.outer_iter().zip(assignments) {
        let mut sum = sums.row_mut(cluster);
        sum += &point;
        counts[cluster] += 1;
    }

    let mut centroids = previous.clone();
    for (cluster, &count) in counts.iter().enumerate() {
        if count > 0 {
            let mean: Array1<f64> = sums.row(cluster).mapv(|x| x / count as f64);
            centroids.row_mut(cluster).assign(&mean);
        }
    }
    centroids
}

fn count_orphans(assignments: &[usize], k: usize) -> usize {
    let used: HashSet<usize> = assignments.iter().copied().collect();
    k - used.len().min(k)
}

fn materialize(
    records: &[Record],
    points: &Array2<f64>,
    assignments: Vec<usize>,
    centroids: Array2<f64>,
    scaler: MinMaxScaler,
    iterations: usize,
    converged: bool,
) -> ClusterResult {
    let inertia = compute_inertia(points, &assignments, &centroids);

    let denormalized = centroids
        .outer_iter()
        .map(|row| Centroid::from(scaler.inverse_row(row)))
        .collect();

    let records = records
        .iter()
        .zip(&assignments)
        .map(|(record, &cluster)| record.with_segment(Segment::Cluster(cluster)))
        .collect();

    ClusterResult {
        records,
        centroids: denormalized,
        inertia,
        iterations,
        converged,
        seed: None,
        normalized_centroids: centroids,
        scaler,
    }
}

/// Compute within-cluster sum of squares (inertia)
fn compute_inertia(features: &Array2<f64>, labels: &[usize], centroids: &Array2<f64>) -> f64 {
    features
        .outer_iter()
        .zip(labels)
        .map(|(point, &cluster)| euclidean_distance(&point, &centroids.row(cluster)).powi(2))
        .sum()
}

/// Calculate Euclidean distance between two points
fn euclidean_distance(point1: &ArrayView1<f64>, point2: &ArrayView1<f64>) -> f64 {
    point1
        .iter()
        .zip(point2.iter())
        .map(|(a, b)| (a - b).powi(2))
        .sum::<f64>()
        .sqrt()
}
