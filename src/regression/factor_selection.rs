use crate::error::CoreError;
use crate::num::matrix::Matrix;

/// A model that can be fit to a design matrix and target vector, the one
/// requirement [`FactorSelectionBottomUp`] places on its model type.
pub trait FittableModel {
    fn fit(&mut self, x: &Matrix, y: &[f64]) -> Result<(), CoreError>;
}

/// Greedily grows a factor set one column at a time: at each step, ranks
/// every not-yet-accepted column, fits a candidate model with the
/// highest-ranked one added, and accepts it if the comparator says the
/// candidate is significantly better than the incumbent. Stops at the
/// first rejected candidate.
pub struct FactorSelectionBottomUp<Model, MF, FR, MC> {
    model_factory: MF,
    factor_rank: FR,
    model_comparison: MC,
    _marker: std::marker::PhantomData<Model>,
}

impl<Model, MF, FR, MC> FactorSelectionBottomUp<Model, MF, FR, MC>
where
    Model: FittableModel,
    MF: Fn() -> Model,
    FR: Fn(&Matrix, &[f64], &Model, &[usize], usize) -> f64,
    MC: Fn(&Model, &Model) -> bool,
{
    pub fn new(model_factory: MF, factor_rank: FR, model_comparison: MC) -> Self {
        FactorSelectionBottomUp { model_factory, factor_rank, model_comparison, _marker: std::marker::PhantomData }
    }

    /// `X` has one row per sample point, one column per candidate factor.
    /// Returns the accepted factor indices in ascending order.
    pub fn select(&self, x: &Matrix, y: &[f64]) -> Result<Vec<usize>, CoreError> {
        if x.rows != y.len() {
            return Err(CoreError::invalid_argument("FactorSelectionBottomUp::select: X.rows() must equal y.len()"));
        }
        if x.rows == 0 || x.cols == 0 {
            return Err(CoreError::invalid_argument("FactorSelectionBottomUp::select: X must not be empty"));
        }

        let mut accepted: Vec<usize> = Vec::new();
        let mut available: Vec<usize> = (0..x.cols).collect();
        let mut model = (self.model_factory)();

        while !available.is_empty() {
            let ranks: Vec<f64> = available.iter().map(|&idx| (self.factor_rank)(x, y, &model, &accepted, idx)).collect();
            let best_pos = ranks
                .iter()
                .enumerate()
                .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
                .map(|(pos, _)| pos)
                .expect("available is non-empty");
            let candidate_idx = available[best_pos];

            let mut candidate_factors = accepted.clone();
            candidate_factors.push(candidate_idx);
            let mut new_model = (self.model_factory)();
            new_model.fit(&select_columns(x, &candidate_factors), y)?;

            if (self.model_comparison)(&model, &new_model) {
                model = new_model;
                accepted = candidate_factors;
                available.remove(best_pos);
            } else {
                break;
            }
        }

        accepted.sort_unstable();
        Ok(accepted)
    }
}

fn select_columns(x: &Matrix, cols: &[usize]) -> Matrix {
    let mut out = Matrix::zeros(x.rows, cols.len());
    for (j, &c) in cols.iter().enumerate() {
        for i in 0..x.rows {
            out.set(i, j, x.get(i, c));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regression::Ols;

    #[test]
    fn recovers_the_two_informative_factors_out_of_four() {
        // y depends on columns 1 and 2 plus a small deterministic wobble;
        // columns 0 and 3 carry no information about y, so they should
        // never be selected.
        let rows = 60;
        let mut x = Matrix::zeros(rows, 4);
        let mut y = vec![0.0; rows];
        for i in 0..rows {
            let t = i as f64;
            let x0 = (t * 0.37).sin();
            let x1 = (t * 0.11) - 2.0;
            let x2 = ((t * 0.19) % 5.0) - 2.5;
            let x3 = ((t * 7.0) % 3.0) - 1.0;
            let noise = ((i % 7) as f64 - 3.0) * 0.05;
            x.set(i, 0, x0);
            x.set(i, 1, x1);
            x.set(i, 2, x2);
            x.set(i, 3, x3);
            y[i] = 2.0 * x1 - 3.0 * x2 + 1.0 + noise;
        }

        let selector = FactorSelectionBottomUp::new(Ols::model_factory(true), Ols::factor_rank_residual_adj_r2, Ols::bic_comparator(6.0));
        let selected = selector.select(&x, &y).unwrap();
        assert_eq!(selected, vec![1, 2]);
    }

    #[test]
    fn rejects_mismatched_row_counts() {
        let x = Matrix::zeros(5, 2);
        let selector = FactorSelectionBottomUp::new(Ols::model_factory(true), Ols::factor_rank_residual_adj_r2, Ols::bic_comparator(6.0));
        assert!(selector.select(&x, &[1.0, 2.0]).is_err());
    }
}
