use crate::error::CoreError;
use crate::num::matrix::Matrix;
use crate::rng::{Rng, RngCore};

/// Chooses initial cluster centroids. `sample` has one point per row.
pub trait InitStrategy {
    fn initialise(&self, sample: &Matrix, k: usize, rng: &mut dyn RngCore) -> Result<Matrix, CoreError>;
}

fn check_k(n: usize, k: usize) -> Result<(), CoreError> {
    if k == 0 || k >= n {
        return Err(CoreError::invalid_argument("InitStrategy: k must be positive and less than the sample size"));
    }
    Ok(())
}

/// Picks `k` distinct sample points at random as centroids.
pub struct Forgy;

impl InitStrategy for Forgy {
    fn initialise(&self, sample: &Matrix, k: usize, rng: &mut dyn RngCore) -> Result<Matrix, CoreError> {
        check_k(sample.rows, k)?;
        let mut indices: Vec<usize> = (0..sample.rows).collect();
        for i in 0..k {
            let j = i + (rng.next_uniform_below((sample.rows - i - 1) as u64) as usize);
            indices.swap(i, j);
        }
        let mut centroids = Matrix::zeros(k, sample.cols);
        for (c, &idx) in indices.iter().take(k).enumerate() {
            for j in 0..sample.cols {
                centroids.set(c, j, sample.get(idx, j));
            }
        }
        Ok(centroids)
    }
}

/// Assigns every point to a random cluster, then centroids are the per-cluster means.
pub struct RandomPartition;

impl InitStrategy for RandomPartition {
    fn initialise(&self, sample: &Matrix, k: usize, rng: &mut dyn RngCore) -> Result<Matrix, CoreError> {
        check_k(sample.rows, k)?;
        let assignments: Vec<usize> = (0..sample.rows).map(|_| rng.next_uniform_below((k - 1) as u64) as usize).collect();
        let mut centroids = Matrix::zeros(k, sample.cols);
        let mut counts = vec![0usize; k];
        for (i, &c) in assignments.iter().enumerate() {
            counts[c] += 1;
            for j in 0..sample.cols {
                centroids.set(c, j, centroids.get(c, j) + sample.get(i, j));
            }
        }
        for c in 0..k {
            if counts[c] > 0 {
                for j in 0..sample.cols {
                    centroids.set(c, j, centroids.get(c, j) / counts[c] as f64);
                }
            }
        }
        Ok(centroids)
    }
}

/// k-means++: seeds centroids one at a time, weighting the choice of each
/// next centroid by its squared distance to the nearest already-chosen one.
pub struct KMeansPlusPlus;

impl InitStrategy for KMeansPlusPlus {
    fn initialise(&self, sample: &Matrix, k: usize, rng: &mut dyn RngCore) -> Result<Matrix, CoreError> {
        check_k(sample.rows, k)?;
        let n = sample.rows;
        let mut centroids = Matrix::zeros(k, sample.cols);
        let first = rng.next_uniform_below((n - 1) as u64) as usize;
        for j in 0..sample.cols {
            centroids.set(0, j, sample.get(first, j));
        }
        let mut min_sq_dist = vec![f64::INFINITY; n];
        for chosen in 1..k {
            for i in 0..n {
                let d = squared_distance(sample, i, &centroids, chosen - 1);
                if d < min_sq_dist[i] {
                    min_sq_dist[i] = d;
                }
            }
            let total: f64 = min_sq_dist.iter().sum();
            let pick = if total > 0.0 {
                let target = rng.next_uniform() * total;
                let mut cum = 0.0;
                let mut selected = n - 1;
                for (i, &d) in min_sq_dist.iter().enumerate() {
                    cum += d;
                    if cum >= target {
                        selected = i;
                        break;
                    }
                }
                selected
            } else {
                rng.next_uniform_below((n - 1) as u64) as usize
            };
            for j in 0..sample.cols {
                centroids.set(chosen, j, sample.get(pick, j));
            }
        }
        Ok(centroids)
    }
}

fn squared_distance(sample: &Matrix, row: usize, centroids: &Matrix, crow: usize) -> f64 {
    (0..sample.cols).map(|j| (sample.get(row, j) - centroids.get(crow, j)).powi(2)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SplitMix64;

    fn sample() -> Matrix {
        Matrix::from_rows(&[vec![0.0, 0.0], vec![0.0, 0.1], vec![10.0, 10.0], vec![10.0, 10.1]])
    }

    #[test]
    fn forgy_picks_distinct_sample_points() {
        let mut rng = SplitMix64::seed_from_u64(1);
        let c = Forgy.initialise(&sample(), 2, &mut rng).unwrap();
        assert_eq!(c.rows, 2);
    }

    #[test]
    fn random_partition_produces_k_centroids() {
        let mut rng = SplitMix64::seed_from_u64(2);
        let c = RandomPartition.initialise(&sample(), 2, &mut rng).unwrap();
        assert_eq!(c.rows, 2);
    }

    #[test]
    fn kmeanspp_separates_centroids_from_distinct_blobs() {
        let mut rng = SplitMix64::seed_from_u64(3);
        let c = KMeansPlusPlus.initialise(&sample(), 2, &mut rng).unwrap();
        let d = squared_distance(&c, 0, &c, 1);
        assert!(d > 1.0);
    }

    #[test]
    fn rejects_k_not_less_than_sample_size() {
        let mut rng = SplitMix64::seed_from_u64(1);
        assert!(Forgy.initialise(&sample(), 4, &mut rng).is_err());
        assert!(Forgy.initialise(&sample(), 0, &mut rng).is_err());
    }
}
