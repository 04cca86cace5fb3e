use crate::cluster::init::InitStrategy;
use crate::error::CoreError;
use crate::num::matrix::{svd, Matrix};
use crate::rng::{Rng, RngCore};

/// K-means clustering using squared Euclidean distance. `sample` matrices
/// throughout this module hold one point per row (the opposite convention
/// from a column-major linear-algebra library, but the one the rest of this
/// crate's `Matrix` type uses for observation matrices).
pub struct KMeans {
    init_strategy: Box<dyn InitStrategy>,
    tol_abs: f64,
    tol_rel: f64,
    ref_pca: bool,
    max_iterations: usize,
    b: usize,
}

/// (mean, standard error) of a gap statistic estimate.
pub type GapStatistic = (f64, f64);

impl KMeans {
    pub fn new(
        init_strategy: Box<dyn InitStrategy>,
        tol_abs: f64,
        tol_rel: f64,
        ref_pca: bool,
        max_iterations: usize,
        b: usize,
    ) -> Result<Self, CoreError> {
        if tol_abs < 0.0 || tol_rel < 0.0 {
            return Err(CoreError::invalid_argument("KMeans: tolerances must be non-negative"));
        }
        if max_iterations == 0 || b == 0 {
            return Err(CoreError::invalid_argument("KMeans: max_iterations and b must be positive"));
        }
        Ok(Self { init_strategy, tol_abs, tol_rel, ref_pca, max_iterations, b })
    }

    /// Runs k-means with a fixed `k`, returning one cluster index per row
    /// of `sample`.
    pub fn clusterise(&self, sample: &Matrix, k: usize, rng: &mut dyn RngCore) -> Result<Vec<usize>, CoreError> {
        if k == 0 || k >= sample.rows {
            return Err(CoreError::invalid_argument("KMeans::clusterise: k must be positive and less than the sample size"));
        }
        let mut centroids = self.init_strategy.initialise(sample, k, rng)?;
        let mut assignments = Self::assign(sample, &centroids, k, rng);
        let mut prev_shift = f64::INFINITY;
        for _ in 0..self.max_iterations {
            let new_centroids = Self::update_centroids(sample, &assignments, k, &centroids);
            let shift = average_centroid_shift(&centroids, &new_centroids);
            centroids = new_centroids;
            assignments = Self::assign(sample, &centroids, k, rng);
            if shift <= self.tol_abs.max(self.tol_rel * prev_shift) {
                break;
            }
            prev_shift = shift;
        }
        Ok(assignments)
    }

    /// Auto-selects `k` via the gap statistic (Tibshirani, Walther, Hastie),
    /// returning `(k, assignments)`. Searches `k = 1, 2, ...` up to
    /// `sample.rows - 1`, stopping at the first `k` for which
    /// `gap(k) >= gap(k+1) - se(k+1)`.
    pub fn clusterise_auto_k(&self, sample: &Matrix, rng: &mut dyn RngCore) -> Result<(usize, Vec<usize>), CoreError> {
        let (origin, edges) = if self.ref_pca {
            Self::calculate_reference_box_pca(sample)
        } else {
            Self::calculate_reference_box_naive(sample)
        };
        let max_k = (sample.rows - 1).min(20).max(1);

        let mut k = 1;
        let mut assignments = vec![0usize; sample.rows];
        let mut stat_k = self.gap_for_k(sample, 1, &origin, &edges, rng);
        while k < max_k {
            let next_k = k + 1;
            let assignments_next = self.clusterise(sample, next_k, rng)?;
            let stat_next = self.estimate_gap_statistic(sample, &assignments_next, &origin, &edges, next_k, rng);
            if Self::accept_higher_k(stat_k, stat_next) {
                k = next_k;
                assignments = assignments_next;
                stat_k = stat_next;
            } else {
                break;
            }
        }
        if k == 1 {
            assignments = vec![0usize; sample.rows];
        }
        Ok((k, assignments))
    }

    fn gap_for_k(&self, sample: &Matrix, k: usize, origin: &[f64], edges: &Matrix, rng: &mut dyn RngCore) -> GapStatistic {
        if k == 1 {
            let assignments = vec![0usize; sample.rows];
            self.estimate_gap_statistic(sample, &assignments, origin, edges, 1, rng)
        } else {
            let assignments = self.clusterise(sample, k, rng).expect("k < sample.rows by construction");
            self.estimate_gap_statistic(sample, &assignments, origin, edges, k, rng)
        }
    }

    /// Resamples `sample`'s rows with replacement `n_boot` times, repeating
    /// k-selection each time. Returns `(mode_k, assignments_at_mode,
    /// k_distribution)` where `k_distribution[k - 1]` is the fraction of
    /// bootstrap iterations that selected that `k`.
    pub fn clusterise_bootstrapping(
        &self,
        sample: &Matrix,
        n_boot: usize,
        rng: &mut dyn RngCore,
    ) -> Result<(usize, Vec<usize>, Vec<f64>), CoreError> {
        if n_boot == 0 {
            return Err(CoreError::invalid_argument("KMeans::clusterise_bootstrapping: n_boot must be positive"));
        }
        let mut counts: Vec<usize> = Vec::new();
        for _ in 0..n_boot {
            let mut resampled = Matrix::zeros(sample.rows, sample.cols);
            for r in 0..sample.rows {
                let src = rng.next_uniform_below((sample.rows - 1) as u64) as usize;
                for c in 0..sample.cols {
                    resampled.set(r, c, sample.get(src, c));
                }
            }
            let (k, _) = self.clusterise_auto_k(&resampled, rng)?;
            if counts.len() < k {
                counts.resize(k, 0);
            }
            counts[k - 1] += 1;
        }
        let mode_k = counts.iter().enumerate().max_by_key(|&(_, &c)| c).map(|(i, _)| i + 1).unwrap_or(1);
        let assignments = if mode_k == 1 { vec![0usize; sample.rows] } else { self.clusterise(sample, mode_k, rng)? };
        let k_distr: Vec<f64> = counts.iter().map(|&c| c as f64 / n_boot as f64).collect();
        Ok((mode_k, assignments, k_distr))
    }

    /// Assigns every row of `sample` to its nearest of the first `k`
    /// centroids, breaking exact ties uniformly at random.
    pub fn assign(sample: &Matrix, centroids: &Matrix, k: usize, rng: &mut dyn RngCore) -> Vec<usize> {
        let mut assignments = vec![0usize; sample.rows];
        for r in 0..sample.rows {
            let mut best: Vec<usize> = vec![0];
            let mut best_dist = squared_distance_row_to_centroid(sample, r, centroids, 0);
            for c in 1..k {
                let dist = squared_distance_row_to_centroid(sample, r, centroids, c);
                if dist < best_dist {
                    best_dist = dist;
                    best = vec![c];
                } else if dist == best_dist {
                    best.push(c);
                }
            }
            assignments[r] = if best.len() == 1 {
                best[0]
            } else {
                best[rng.next_uniform_below((best.len() - 1) as u64) as usize]
            };
        }
        assignments
    }

    /// Recomputes each of the `k` centroids as the mean of its assigned
    /// points; a cluster with no assigned points keeps its previous
    /// centroid from `previous`.
    pub fn update_centroids(sample: &Matrix, assignments: &[usize], k: usize, previous: &Matrix) -> Matrix {
        let mut centroids = previous.clone();
        let mut sums = Matrix::zeros(k, sample.cols);
        let mut counts = vec![0usize; k];
        for (r, &c) in assignments.iter().enumerate() {
            counts[c] += 1;
            for j in 0..sample.cols {
                sums.set(c, j, sums.get(c, j) + sample.get(r, j));
            }
        }
        for c in 0..k {
            if counts[c] > 0 {
                for j in 0..sample.cols {
                    centroids.set(c, j, sums.get(c, j) / counts[c] as f64);
                }
            }
        }
        centroids
    }

    pub fn rescale_by_standard_deviation(sample: &mut Matrix) {
        for j in 0..sample.cols {
            let col = sample.col(j);
            let mean = col.iter().sum::<f64>() / col.len() as f64;
            let var = col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / col.len() as f64;
            let sd = var.sqrt();
            if sd > 0.0 {
                for r in 0..sample.rows {
                    sample.set(r, j, sample.get(r, j) / sd);
                }
            }
        }
    }

    pub fn rescale_to_01(sample: &mut Matrix) {
        for j in 0..sample.cols {
            let col = sample.col(j);
            let lo = col.iter().cloned().fold(f64::INFINITY, f64::min);
            let hi = col.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let range = hi - lo;
            for r in 0..sample.rows {
                let v = if range > 0.0 { (sample.get(r, j) - lo) / range } else { 0.0 };
                sample.set(r, j, v);
            }
        }
    }

    pub fn rescale(sample: &mut Matrix, factors: &[f64]) -> Result<(), CoreError> {
        if factors.len() != sample.cols {
            return Err(CoreError::invalid_argument("KMeans::rescale: one factor per dimension required"));
        }
        for j in 0..sample.cols {
            for r in 0..sample.rows {
                sample.set(r, j, sample.get(r, j) * factors[j]);
            }
        }
        Ok(())
    }

    /// `sum_j (sum_{i in j} ||x_i - mean_j||^2) / (2 * n_j)`.
    pub fn pooled_within_cluster_ssq(sample: &Matrix, assignments: &[usize], k: usize) -> Result<f64, CoreError> {
        if assignments.len() != sample.rows {
            return Err(CoreError::invalid_argument("pooled_within_cluster_ssq: assignments length must match sample rows"));
        }
        let centroids = {
            let zero = Matrix::zeros(k, sample.cols);
            Self::update_centroids(sample, assignments, k, &zero)
        };
        let mut counts = vec![0usize; k];
        for &c in assignments {
            counts[c] += 1;
        }
        let mut total = 0.0;
        for c in 0..k {
            if counts[c] == 0 {
                continue;
            }
            let mut ssq = 0.0;
            for (r, &ci) in assignments.iter().enumerate() {
                if ci == c {
                    ssq += squared_distance_row_to_centroid(sample, r, &centroids, c);
                }
            }
            total += ssq / (2.0 * counts[c] as f64);
        }
        Ok(total)
    }

    /// Draws `n` points uniformly from the box `{origin + sum_j t_j * edges[:,j] : t_j in [0,1]}`.
    pub fn sample_reference(origin: &[f64], edges: &Matrix, n: usize, rng: &mut dyn RngCore) -> Matrix {
        let d = origin.len();
        let mut out = Matrix::zeros(n, d);
        for r in 0..n {
            let t: Vec<f64> = (0..edges.cols).map(|_| rng.next_uniform()).collect();
            for i in 0..d {
                let mut v = origin[i];
                for (j, &tj) in t.iter().enumerate() {
                    v += tj * edges.get(i, j);
                }
                out.set(r, i, v);
            }
        }
        out
    }

    /// Gap statistic for a clustering into `k` clusters, estimated from
    /// `self.b` uniform reference samples in the given box.
    pub fn estimate_gap_statistic(
        &self,
        sample: &Matrix,
        assignments: &[usize],
        ref_origin: &[f64],
        ref_edges: &Matrix,
        k: usize,
        rng: &mut dyn RngCore,
    ) -> GapStatistic {
        let log_w = Self::pooled_within_cluster_ssq(sample, assignments, k).unwrap_or(0.0).max(1e-300).ln();
        let mut logs = Vec::with_capacity(self.b);
        for _ in 0..self.b {
            let reference = Self::sample_reference(ref_origin, ref_edges, sample.rows, rng);
            let ref_assignments = if k == 1 {
                vec![0usize; reference.rows]
            } else {
                self.clusterise(&reference, k, rng).unwrap_or_else(|_| vec![0usize; reference.rows])
            };
            let w_ref = Self::pooled_within_cluster_ssq(&reference, &ref_assignments, k).unwrap_or(1e-300).max(1e-300);
            logs.push(w_ref.ln());
        }
        let mean_log = logs.iter().sum::<f64>() / self.b as f64;
        let var_log = logs.iter().map(|v| (v - mean_log).powi(2)).sum::<f64>() / self.b as f64;
        let sd_log = var_log.sqrt();
        let gap = mean_log - log_w;
        let se = sd_log * (1.0 + 1.0 / self.b as f64).sqrt();
        (gap, se)
    }

    /// Whether to prefer `k + 1` over `k`: `gap(k+1) >= gap(k) - se(k+1)`.
    pub fn accept_higher_k(k_stat: GapStatistic, kp1_stat: GapStatistic) -> bool {
        kp1_stat.0 >= k_stat.0 - kp1_stat.1
    }

    /// Axis-aligned bounding box: `origin[j]` is the column minimum, edge
    /// `j` is `(range_j) * e_j`.
    pub fn calculate_reference_box_naive(sample: &Matrix) -> (Vec<f64>, Matrix) {
        let d = sample.cols;
        let mut origin = vec![0.0; d];
        let mut edges = Matrix::zeros(d, d);
        for j in 0..d {
            let col = sample.col(j);
            let lo = col.iter().cloned().fold(f64::INFINITY, f64::min);
            let hi = col.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            origin[j] = lo;
            edges.set(j, j, hi - lo);
        }
        (origin, edges)
    }

    /// Bounding box aligned with the data's principal axes (eigenvectors of
    /// the sample covariance matrix).
    pub fn calculate_reference_box_pca(sample: &Matrix) -> (Vec<f64>, Matrix) {
        let n = sample.rows;
        let d = sample.cols;
        let mean: Vec<f64> = (0..d).map(|j| sample.col(j).iter().sum::<f64>() / n as f64).collect();
        let mut centered = sample.clone();
        for r in 0..n {
            for j in 0..d {
                centered.set(r, j, centered.get(r, j) - mean[j]);
            }
        }
        let denom = (n.max(2) - 1) as f64;
        let cov = centered.transpose().matmul(&centered).scale(1.0 / denom);
        let decomposition = svd(&cov);
        let proj = centered.matmul(&decomposition.u);

        let mut lo = vec![f64::INFINITY; d];
        let mut hi = vec![f64::NEG_INFINITY; d];
        for r in 0..n {
            for j in 0..d {
                let v = proj.get(r, j);
                lo[j] = lo[j].min(v);
                hi[j] = hi[j].max(v);
            }
        }
        let mut origin = mean.clone();
        let mut edges = Matrix::zeros(d, d);
        for j in 0..d {
            for i in 0..d {
                origin[i] += decomposition.u.get(i, j) * lo[j];
                edges.set(i, j, decomposition.u.get(i, j) * (hi[j] - lo[j]));
            }
        }
        (origin, edges)
    }
}

fn squared_distance_row_to_centroid(sample: &Matrix, row: usize, centroids: &Matrix, c: usize) -> f64 {
    (0..sample.cols).map(|j| (sample.get(row, j) - centroids.get(c, j)).powi(2)).sum()
}

fn average_centroid_shift(prev: &Matrix, next: &Matrix) -> f64 {
    let mut total = 0.0;
    for c in 0..prev.rows {
        total += (0..prev.cols).map(|j| (prev.get(c, j) - next.get(c, j)).powi(2)).sum::<f64>().sqrt();
    }
    total / prev.rows as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::init::Forgy;
    use crate::rng::SplitMix64;

    fn two_blobs(n_a: usize, n_b: usize, mean_a: f64, mean_b: f64, rng: &mut dyn RngCore, sigma_a: f64, sigma_b: f64) -> Matrix {
        let mut rows = Vec::new();
        for _ in 0..n_a {
            rows.push(vec![mean_a + sigma_a * (rng.next_uniform() - 0.5), mean_a + sigma_a * (rng.next_uniform() - 0.5)]);
        }
        for _ in 0..n_b {
            rows.push(vec![mean_b + sigma_b * (rng.next_uniform() - 0.5), mean_b + sigma_b * (rng.next_uniform() - 0.5)]);
        }
        Matrix::from_rows(&rows)
    }

    fn default_kmeans() -> KMeans {
        KMeans::new(Box::new(Forgy), 1e-6, 1e-6, true, 200, 30).unwrap()
    }

    #[test]
    fn clusterise_separates_two_distinct_blobs() {
        let mut rng = SplitMix64::seed_from_u64(11);
        let sample = two_blobs(20, 20, -1.0, 1.0, &mut rng, 0.02, 0.02);
        let km = default_kmeans();
        let assignments = km.clusterise(&sample, 2, &mut rng).unwrap();
        let first_half: Vec<usize> = assignments[..20].to_vec();
        let second_half: Vec<usize> = assignments[20..].to_vec();
        assert!(first_half.iter().all(|&c| c == first_half[0]));
        assert!(second_half.iter().all(|&c| c == second_half[0]));
        assert_ne!(first_half[0], second_half[0]);
    }

    #[test]
    fn pooled_within_cluster_ssq_is_zero_for_coincident_points() {
        let sample = Matrix::from_rows(&[vec![1.0, 1.0], vec![1.0, 1.0], vec![5.0, 5.0]]);
        let assignments = vec![0, 0, 1];
        let ssq = KMeans::pooled_within_cluster_ssq(&sample, &assignments, 2).unwrap();
        assert!(ssq.abs() < 1e-12);
    }

    #[test]
    fn rescale_to_01_bounds_every_column() {
        let mut sample = Matrix::from_rows(&[vec![0.0, -5.0], vec![10.0, 5.0], vec![5.0, 0.0]]);
        KMeans::rescale_to_01(&mut sample);
        for j in 0..sample.cols {
            for r in 0..sample.rows {
                assert!((0.0..=1.0).contains(&sample.get(r, j)));
            }
        }
    }

    #[test]
    fn accept_higher_k_follows_the_tibshirani_rule() {
        assert!(KMeans::accept_higher_k((1.0, 0.1), (1.05, 0.1)));
        assert!(!KMeans::accept_higher_k((1.0, 0.1), (0.5, 0.1)));
    }

    #[test]
    fn auto_k_recovers_two_clusters_for_well_separated_blobs() {
        let mut rng = SplitMix64::seed_from_u64(42);
        let sample = two_blobs(20, 20, -3.0, 3.0, &mut rng, 0.05, 0.05);
        let km = KMeans::new(Box::new(Forgy), 1e-6, 1e-6, false, 200, 10).unwrap();
        let (k, _) = km.clusterise_auto_k(&sample, &mut rng).unwrap();
        assert_eq!(k, 2);
    }

    #[test]
    fn auto_k_picks_one_for_a_single_blob() {
        let mut rng = SplitMix64::seed_from_u64(17);
        let sample = two_blobs(40, 0, 0.0, 0.0, &mut rng, 0.2, 0.2);
        let km = KMeans::new(Box::new(Forgy), 1e-6, 1e-6, false, 200, 10).unwrap();
        let (k, assignments) = km.clusterise_auto_k(&sample, &mut rng).unwrap();
        assert_eq!(k, 1);
        assert!(assignments.iter().all(|&c| c == 0));
    }
}
