use crate::copula::Copula;
use crate::error::CoreError;
use crate::multivariate::rank_transform_column;
use crate::num::matrix::Matrix;
use crate::rng::{Rng, RngCore};

/// Trivial copula under which every coordinate is an independent uniform.
#[derive(Debug, Clone, Copy)]
pub struct IndependentCopula {
    dim: usize,
}

impl IndependentCopula {
    pub fn new(dim: usize) -> Result<Self, CoreError> {
        if dim == 0 {
            return Err(CoreError::invalid_argument("IndependentCopula: dimension must be positive"));
        }
        Ok(Self { dim })
    }
}

impl Copula for IndependentCopula {
    fn dim(&self) -> usize {
        self.dim
    }

    fn draw_cdfs(&self, rng: &mut dyn RngCore, out: &mut [f64]) -> Result<(), CoreError> {
        if out.len() != self.dim {
            return Err(CoreError::invalid_argument("draw_cdfs: output size mismatch"));
        }
        for x in out.iter_mut() {
            *x = rng.next_uniform();
        }
        Ok(())
    }

    fn adjust_cdfs(&self, sample: &mut Matrix) -> Result<(), CoreError> {
        if sample.cols != self.dim {
            return Err(CoreError::invalid_argument("adjust_cdfs: column count must equal dimension"));
        }
        for c in 0..sample.cols {
            rank_transform_column(sample, c);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SplitMix64;

    #[test]
    fn draw_cdfs_produces_values_in_unit_interval() {
        let copula = IndependentCopula::new(3).unwrap();
        let mut rng = SplitMix64::seed_from_u64(9);
        let mut out = [0.0; 3];
        copula.draw_cdfs(&mut rng, &mut out).unwrap();
        assert!(out.iter().all(|&v| (0.0..1.0).contains(&v)));
    }

    #[test]
    fn adjust_cdfs_maps_each_column_to_percentiles() {
        let copula = IndependentCopula::new(1).unwrap();
        let mut sample = Matrix::from_rows(&[vec![30.0], vec![10.0], vec![20.0]]);
        copula.adjust_cdfs(&mut sample).unwrap();
        assert!((sample.get(1, 0) - 1.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_dimension_mismatch() {
        let copula = IndependentCopula::new(2).unwrap();
        let mut out = [0.0; 3];
        let mut rng = SplitMix64::seed_from_u64(1);
        assert!(copula.draw_cdfs(&mut rng, &mut out).is_err());
        let mut sample = Matrix::zeros(3, 3);
        assert!(copula.adjust_cdfs(&mut sample).is_err());
    }
}
