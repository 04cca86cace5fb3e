use crate::error::CoreError;

/// Row-major flat indexing over a d-dimensional box of non-constant sizes,
/// with dimension 0 varying fastest. Maps a multi-index `(i_0, ..., i_{d-1})`
/// with `0 <= i_k < sizes[k]` to a flat position in `0..flat_size()` and
/// back; used by [`crate::multivariate::MultivariateDistributionDiscrete`]
/// to linearize a d-dimensional probability tensor.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    sizes: Vec<usize>,
    flat_size: usize,
}

impl FlatIndex {
    pub fn new(sizes: Vec<usize>) -> Result<Self, CoreError> {
        if sizes.is_empty() || sizes.iter().any(|&s| s == 0) {
            return Err(CoreError::invalid_argument(
                "FlatIndex: sizes must be non-empty with no zero dimension",
            ));
        }
        let flat_size = sizes.iter().product();
        Ok(Self { sizes, flat_size })
    }

    pub fn dim(&self) -> usize {
        self.sizes.len()
    }

    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    pub fn flat_size(&self) -> usize {
        self.flat_size
    }

    /// Maps `(i_0, ..., i_{d-1})` to its flat position.
    pub fn flatten(&self, indices: &[usize]) -> Result<usize, CoreError> {
        if indices.len() != self.sizes.len() {
            return Err(CoreError::invalid_argument(
                "FlatIndex::flatten: index dimension mismatch",
            ));
        }
        let mut flat = 0usize;
        let mut stride = 1usize;
        for (k, &size) in self.sizes.iter().enumerate() {
            if indices[k] >= size {
                return Err(CoreError::out_of_range("FlatIndex::flatten: index out of bounds"));
            }
            flat += indices[k] * stride;
            stride *= size;
        }
        Ok(flat)
    }

    /// Recovers the multi-index `(i_0, ..., i_{d-1})` for a flat position.
    pub fn decompose(&self, mut flat: usize) -> Vec<usize> {
        let mut indices = vec![0usize; self.sizes.len()];
        for (k, &size) in self.sizes.iter().enumerate() {
            indices[k] = flat % size;
            flat /= size;
        }
        indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_and_decompose_round_trip() {
        let fi = FlatIndex::new(vec![3, 4]).unwrap();
        for flat in 0..fi.flat_size() {
            let idx = fi.decompose(flat);
            assert_eq!(fi.flatten(&idx).unwrap(), flat);
        }
    }

    #[test]
    fn dimension_zero_fastest() {
        let fi = FlatIndex::new(vec![3, 4]).unwrap();
        assert_eq!(fi.flatten(&[1, 0]).unwrap(), 1);
        assert_eq!(fi.flatten(&[0, 1]).unwrap(), 3);
    }

    #[test]
    fn rejects_out_of_bounds_index() {
        let fi = FlatIndex::new(vec![3, 4]).unwrap();
        assert!(fi.flatten(&[3, 0]).is_err());
    }
}
