use crate::error::CoreError;
use crate::num::matrix::Matrix;

/// Builds finite-difference features from a time series and reassigns
/// K-means clusters over those features into chronologically ordered
/// trends.
pub struct TrendClustering;

fn differentiate_forward(x: &[f64]) -> Vec<f64> {
    let n = x.len();
    let mut out = vec![0.0; n];
    for i in 0..n {
        if i + 1 < n {
            out[i] = x[i + 1] - x[i];
        } else {
            out[i] = x[n - 1] - x[n - 2];
        }
    }
    out
}

fn differentiate_backward(x: &[f64]) -> Vec<f64> {
    let n = x.len();
    let mut out = vec![0.0; n];
    for i in 0..n {
        if i > 0 {
            out[i] = x[i] - x[i - 1];
        } else {
            out[i] = x[1] - x[0];
        }
    }
    out
}

impl TrendClustering {
    /// Returns an `n x (q - p + 1)` matrix (one point per row) with `D^p x,
    /// ..., D^q x` in successive columns.
    pub fn calculate_derivatives(series: &[f64], p: usize, q: usize, forward: bool) -> Result<Matrix, CoreError> {
        if p > q {
            return Err(CoreError::invalid_argument("calculate_derivatives: p must not exceed q"));
        }
        if series.len() < 2 {
            return Err(CoreError::invalid_argument("calculate_derivatives: series must have at least 2 points"));
        }
        let n = series.len();
        let mut current = series.to_vec();
        for _ in 0..p {
            current = if forward { differentiate_forward(&current) } else { differentiate_backward(&current) };
        }
        let mut out = Matrix::zeros(n, q - p + 1);
        for (row, v) in current.iter().enumerate() {
            out.set(row, 0, *v);
        }
        for order in 1..=(q - p) {
            current = if forward { differentiate_forward(&current) } else { differentiate_backward(&current) };
            for (row, v) in current.iter().enumerate() {
                out.set(row, order, *v);
            }
        }
        Ok(out)
    }

    /// Builds a `n x 2` sample suitable for [`crate::cluster::kmeans::KMeans`]:
    /// column 0 is the one-step difference of `series`, column 1 is the
    /// time index rescaled into `[0, 1]`.
    pub fn make_sample_for_kmeans_clustering(series: &[f64], forward: bool) -> Result<Matrix, CoreError> {
        if series.len() < 2 {
            return Err(CoreError::invalid_argument("make_sample_for_kmeans_clustering: series must have at least 2 points"));
        }
        let n = series.len();
        let diffs = if forward { differentiate_forward(series) } else { differentiate_backward(series) };
        let mut sample = Matrix::zeros(n, 2);
        for i in 0..n {
            sample.set(i, 0, diffs[i]);
            sample.set(i, 1, i as f64 / (n - 1) as f64);
        }
        Ok(sample)
    }

    /// Maps cluster assignments onto chronologically-ordered trends: trend
    /// `l` is the cluster with the `l`-th smallest median index. Returns
    /// `(trends, boundaries, misassigned_per_trend)`, where `trends[c]` is
    /// the trend number of original cluster `c`, `boundaries` (length `k -
    /// 1`) splits the series into claimed trend intervals, and
    /// `misassigned_per_trend[l]` counts points inside trend `l`'s interval
    /// whose original cluster wasn't the one mapped to trend `l`.
    pub fn map_clusters_in_trends(assignments: &[usize], k: usize) -> Result<(Vec<usize>, Vec<usize>, Vec<usize>), CoreError> {
        if k == 0 {
            return Err(CoreError::invalid_argument("map_clusters_in_trends: k must be positive"));
        }
        let sizes = Self::calc_cluster_sizes(assignments, k);
        let medians = Self::calc_median_indices(assignments, &sizes, k);
        let sorted = Self::sort_clusters_by_median_index(&medians, k);
        let trends = Self::calc_cluster_ranks(&sorted, k);
        let boundaries = Self::initialise_boundaries(&sizes, &sorted, k);
        let misassigned = Self::calc_errors_per_cluster(assignments, &sorted, &boundaries, k);
        Ok((trends, boundaries, misassigned))
    }

    pub fn reassign_to_trends(trends: &[usize], assignments: &mut [usize]) {
        for a in assignments.iter_mut() {
            *a = trends[*a];
        }
    }

    fn calc_cluster_sizes(assignments: &[usize], k: usize) -> Vec<usize> {
        let mut sizes = vec![0usize; k];
        for &a in assignments {
            sizes[a] += 1;
        }
        sizes
    }

    /// Lower-median convention: for a cluster with `m` members, the median
    /// is its `floor((m - 1) / 2)`-th member in ascending index order.
    fn calc_median_indices(assignments: &[usize], sizes: &[usize], k: usize) -> Vec<usize> {
        let mut per_cluster: Vec<Vec<usize>> = vec![Vec::new(); k];
        for (i, &c) in assignments.iter().enumerate() {
            per_cluster[c].push(i);
        }
        (0..k)
            .map(|c| {
                if sizes[c] == 0 {
                    usize::MAX
                } else {
                    per_cluster[c][(sizes[c] - 1) / 2]
                }
            })
            .collect()
    }

    pub fn calc_mean_indices(assignments: &[usize], k: usize) -> Vec<f64> {
        let mut sums = vec![0.0; k];
        let mut counts = vec![0usize; k];
        for (i, &c) in assignments.iter().enumerate() {
            sums[c] += i as f64;
            counts[c] += 1;
        }
        (0..k).map(|c| if counts[c] > 0 { sums[c] / counts[c] as f64 } else { f64::NAN }).collect()
    }

    fn sort_clusters_by_median_index(medians: &[usize], k: usize) -> Vec<usize> {
        let mut idx: Vec<usize> = (0..k).collect();
        idx.sort_by_key(|&c| medians[c]);
        idx
    }

    fn calc_cluster_ranks(cluster_indices_sorted: &[usize], k: usize) -> Vec<usize> {
        let mut ranks = vec![0usize; k];
        for (rank, &c) in cluster_indices_sorted.iter().enumerate() {
            ranks[c] = rank;
        }
        ranks
    }

    fn initialise_boundaries(sizes: &[usize], cluster_indices_sorted: &[usize], k: usize) -> Vec<usize> {
        let mut boundaries = Vec::with_capacity(k.saturating_sub(1));
        let mut cumulative = 0usize;
        for &c in cluster_indices_sorted.iter().take(k.saturating_sub(1)) {
            cumulative += sizes[c];
            boundaries.push(cumulative);
        }
        boundaries
    }

    fn calc_errors_per_cluster(assignments: &[usize], cluster_indices_sorted: &[usize], boundaries: &[usize], k: usize) -> Vec<usize> {
        let n = assignments.len();
        let mut errors = vec![0usize; k];
        let mut start = 0usize;
        for l in 0..k {
            let end = boundaries.get(l).copied().unwrap_or(n);
            let expected = cluster_indices_sorted[l];
            for &a in &assignments[start..end] {
                if a != expected {
                    errors[l] += 1;
                }
            }
            start = end;
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_difference_repeats_last_slope_at_the_end() {
        let series = [1.0, 2.0, 4.0, 7.0];
        let d = TrendClustering::calculate_derivatives(&series, 1, 1, true).unwrap();
        assert_eq!(d.get(0, 0), 1.0);
        assert_eq!(d.get(1, 0), 2.0);
        assert_eq!(d.get(2, 0), 3.0);
        assert_eq!(d.get(3, 0), 3.0);
    }

    #[test]
    fn backward_difference_repeats_first_slope_at_the_start() {
        let series = [1.0, 2.0, 4.0, 7.0];
        let d = TrendClustering::calculate_derivatives(&series, 1, 1, false).unwrap();
        assert_eq!(d.get(0, 0), 1.0);
        assert_eq!(d.get(1, 0), 1.0);
        assert_eq!(d.get(2, 0), 2.0);
        assert_eq!(d.get(3, 0), 3.0);
    }

    #[test]
    fn make_sample_rescales_time_index_to_unit_interval() {
        let series = [0.0, 1.0, 2.0, 3.0];
        let sample = TrendClustering::make_sample_for_kmeans_clustering(&series, true).unwrap();
        assert_eq!(sample.get(0, 1), 0.0);
        assert_eq!(sample.get(3, 1), 1.0);
    }

    #[test]
    fn map_clusters_in_trends_orders_by_median_and_finds_boundaries() {
        // cluster 1 occupies the first half chronologically, cluster 0 the second.
        let assignments = vec![1, 1, 1, 0, 0, 0];
        let (trends, boundaries, misassigned) = TrendClustering::map_clusters_in_trends(&assignments, 2).unwrap();
        assert_eq!(trends[1], 0);
        assert_eq!(trends[0], 1);
        assert_eq!(boundaries, vec![3]);
        assert_eq!(misassigned, vec![0, 0]);
    }

    #[test]
    fn map_clusters_in_trends_counts_misassignment_when_interleaved() {
        let assignments = vec![0, 1, 0, 1];
        let (_, boundaries, misassigned) = TrendClustering::map_clusters_in_trends(&assignments, 2).unwrap();
        assert_eq!(boundaries, vec![2]);
        assert_eq!(misassigned.iter().sum::<usize>(), 2);
    }

    #[test]
    fn reassign_to_trends_applies_the_mapping() {
        let trends = vec![1, 0];
        let mut assignments = vec![0, 1, 0];
        TrendClustering::reassign_to_trends(&trends, &mut assignments);
        assert_eq!(assignments, vec![1, 0, 1]);
    }

    #[test]
    fn mean_indices_average_member_positions() {
        let assignments = vec![0, 0, 1, 1, 1];
        let means = TrendClustering::calc_mean_indices(&assignments, 2);
        assert!((means[0] - 0.5).abs() < 1e-12);
        assert!((means[1] - 3.0).abs() < 1e-12);
    }
}
