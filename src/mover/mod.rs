//! Moves a population between ordered value ranges according to a Markov
//! transition matrix, redrawing each moved member's value from a
//! rank-preserving local density inside its destination range.

pub mod slope;

pub use slope::PopulationMoverSlopeCalculator;

use crate::error::CoreError;
use crate::num::matrix::Matrix;
use crate::rng::{Rng, RngCore};

/// One population member: which range it currently occupies and its value
/// within that range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Member {
    pub range_index: usize,
    pub value: f64,
}

/// Moves a population of `Member`s between `d` ordered ranges using a `d x
/// d` column-stochastic transition matrix: column `j` is the distribution
/// over destination ranges for a member currently in range `j`.
pub struct PopulationMover {
    transition: Matrix,
    ranges: Vec<f64>,
    slope_calculator: PopulationMoverSlopeCalculator,
}

impl PopulationMover {
    pub fn new(transition: Matrix, ranges: Vec<f64>, tolerance: f64) -> Result<Self, CoreError> {
        let d = ranges.len().checked_sub(1).ok_or_else(|| CoreError::invalid_argument("PopulationMover: need at least one range"))?;
        if transition.rows != d || transition.cols != d {
            return Err(CoreError::invalid_argument("PopulationMover: transition must be d x d where d == ranges.len() - 1"));
        }
        if !ranges.windows(2).all(|w| w[0] < w[1]) {
            return Err(CoreError::invalid_argument("PopulationMover: ranges must be strictly increasing"));
        }
        for j in 0..d {
            let mut sum = 0.0;
            for i in 0..d {
                let p = transition.get(i, j);
                if !(0.0..=1.0).contains(&p) {
                    return Err(CoreError::out_of_range("PopulationMover: transition entries must lie in [0, 1]"));
                }
                sum += p;
            }
            if (sum - 1.0).abs() > 1e-6 {
                return Err(CoreError::SumNotOne(format!("PopulationMover: column {j} of the transition matrix sums to {sum}, not 1")));
            }
        }
        let slope_calculator = PopulationMoverSlopeCalculator::new(tolerance)?;
        Ok(Self { transition, ranges, slope_calculator })
    }

    pub fn num_ranges(&self) -> usize {
        self.ranges.len() - 1
    }

    /// Index of the range containing `value`. Ranges are half-open
    /// (`[ranges[i], ranges[i + 1])`) except the last, which is closed on
    /// both ends: a value equal to the top boundary belongs to the last
    /// range rather than falling outside it.
    pub fn range_index_for_value(&self, value: f64) -> Result<usize, CoreError> {
        let d = self.num_ranges();
        if value < self.ranges[0] || value > self.ranges[d] {
            return Err(CoreError::out_of_range("range_index_for_value: value outside the covered ranges"));
        }
        if value == self.ranges[d] {
            return Ok(d - 1);
        }
        // Largest i such that ranges[i] <= value.
        match self.ranges.binary_search_by(|r| r.partial_cmp(&value).unwrap()) {
            Ok(i) => Ok(i.min(d - 1)),
            Err(i) => Ok(i - 1),
        }
    }

    /// Moves every member to a new range (drawn from its current range's
    /// transition column) and draws it a new value inside that range.
    pub fn move_between_ranges(&self, population: &mut [Member], rng: &mut dyn RngCore) -> Result<(), CoreError> {
        let d = self.num_ranges();
        let mut members_by_origin: Vec<Vec<usize>> = vec![Vec::new(); d];
        for (idx, m) in population.iter().enumerate() {
            if m.range_index >= d {
                return Err(CoreError::invalid_argument("move_between_ranges: member range_index out of bounds"));
            }
            members_by_origin[m.range_index].push(idx);
        }

        for from in 0..d {
            let members = &members_by_origin[from];
            if members.is_empty() {
                continue;
            }
            let distr = self.transition.col(from);
            let (a, b) = self.slope_calculator.calculate(&distr, from)?;
            let destinations = Self::draw_moved_indices(&distr, members, rng);
            for (to, member_indices) in destinations.into_iter().enumerate() {
                if member_indices.is_empty() {
                    continue;
                }
                let lo = self.ranges[to];
                let hi = self.ranges[to + 1];
                for idx in member_indices {
                    let q = rng.next_uniform();
                    let w = invert_linear_density(a[to], b[to], q);
                    population[idx].value = lo + w * (hi - lo);
                    population[idx].range_index = to;
                }
            }
        }
        Ok(())
    }

    /// Draws a destination range for each of `members` (indices into the
    /// caller's population), preserving relative order: the member draws
    /// are sorted before being mapped through the cumulative distribution,
    /// so members earlier in `members` are never assigned a lower-ranked
    /// destination than members later in the list.
    fn draw_moved_indices(distr: &[f64], members: &[usize], rng: &mut dyn RngCore) -> Vec<Vec<usize>> {
        let m = members.len();
        let mut draws: Vec<f64> = (0..m).map(|_| rng.next_uniform()).collect();
        draws.sort_by(|x, y| x.partial_cmp(y).unwrap());

        let mut cumulative = Vec::with_capacity(distr.len());
        let mut running = 0.0;
        for &p in distr {
            running += p;
            cumulative.push(running);
        }

        let mut buckets = vec![Vec::new(); distr.len()];
        for (i, &u) in draws.iter().enumerate() {
            let dest = cumulative.iter().position(|&c| u <= c).unwrap_or(distr.len() - 1);
            buckets[dest].push(members[i]);
        }
        buckets
    }
}

/// Samples from the density `f(w) = a + b * w` on `[0, 1]` given a uniform
/// draw `q`, by inverting its CDF `F(w) = a * w + b * w^2 / 2`.
fn invert_linear_density(a: f64, b: f64, q: f64) -> f64 {
    let w = if b.abs() < 1e-12 {
        if a > 1e-12 {
            q / a
        } else {
            q
        }
    } else {
        let discriminant = (a * a + 2.0 * b * q).max(0.0);
        (-a + discriminant.sqrt()) / b
    };
    w.clamp(1e-9, 1.0 - 1e-9)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SplitMix64;

    fn two_range_mover() -> PopulationMover {
        // Members below 5.0 either stay (0.7) or move up (0.3); members
        // above stay put entirely.
        let transition = Matrix::from_rows(&[vec![0.7, 0.0], vec![0.3, 1.0]]);
        PopulationMover::new(transition, vec![0.0, 5.0, 10.0], 1e-8).unwrap()
    }

    #[test]
    fn range_index_for_value_half_open_except_the_last() {
        let mover = two_range_mover();
        assert_eq!(mover.range_index_for_value(0.0).unwrap(), 0);
        assert_eq!(mover.range_index_for_value(4.999).unwrap(), 0);
        assert_eq!(mover.range_index_for_value(5.0).unwrap(), 1);
        assert_eq!(mover.range_index_for_value(10.0).unwrap(), 1);
        assert!(mover.range_index_for_value(10.1).is_err());
        assert!(mover.range_index_for_value(-0.1).is_err());
    }

    #[test]
    fn rejects_transition_columns_not_summing_to_one() {
        let transition = Matrix::from_rows(&[vec![0.5, 0.0], vec![0.4, 1.0]]);
        assert!(PopulationMover::new(transition, vec![0.0, 5.0, 10.0], 1e-8).is_err());
    }

    #[test]
    fn members_above_a_transition_with_identity_column_never_move() {
        let mover = two_range_mover();
        let mut population = vec![Member { range_index: 1, value: 7.0 }; 20];
        let mut rng = SplitMix64::seed_from_u64(11);
        mover.move_between_ranges(&mut population, &mut rng).unwrap();
        assert!(population.iter().all(|m| m.range_index == 1));
        assert!(population.iter().all(|m| m.value >= 5.0 && m.value <= 10.0));
    }

    #[test]
    fn moved_members_land_strictly_inside_their_destination_range() {
        let mover = two_range_mover();
        let mut population: Vec<Member> = (0..200).map(|i| Member { range_index: 0, value: i as f64 * 5.0 / 200.0 }).collect();
        let mut rng = SplitMix64::seed_from_u64(3);
        mover.move_between_ranges(&mut population, &mut rng).unwrap();
        let moved_up = population.iter().filter(|m| m.range_index == 1).count();
        assert!(moved_up > 0);
        for m in &population {
            let (lo, hi) = if m.range_index == 0 { (0.0, 5.0) } else { (5.0, 10.0) };
            assert!(m.value > lo && m.value < hi);
        }
    }

    #[test]
    fn assignment_preserves_rank_order_within_the_origin_bucket() {
        // 16 members all in range 0, distribution over a 3-bucket column
        // splits roughly 1/4, 1/2, 1/4: the earliest members in the list
        // should skew toward the lowest destination.
        let transition = Matrix::from_rows(&[vec![0.25, 0.0, 0.0], vec![0.5, 1.0, 0.0], vec![0.25, 0.0, 1.0]]);
        let mover = PopulationMover::new(transition, vec![0.0, 1.0, 2.0, 3.0], 1e-8).unwrap();
        let mut population: Vec<Member> = (0..16).map(|_| Member { range_index: 0, value: 0.5 }).collect();
        let mut rng = SplitMix64::seed_from_u64(42);
        mover.move_between_ranges(&mut population, &mut rng).unwrap();
        let mean_index_of = |range: usize| -> f64 {
            let (sum, count) = population
                .iter()
                .enumerate()
                .filter(|(_, m)| m.range_index == range)
                .fold((0.0, 0usize), |(s, c), (i, _)| (s + i as f64, c + 1));
            sum / count as f64
        };
        assert!(mean_index_of(0) < mean_index_of(1));
        assert!(mean_index_of(1) < mean_index_of(2));
    }

    #[test]
    fn invert_linear_density_matches_the_uniform_case() {
        assert!((invert_linear_density(1.0, 0.0, 0.5) - 0.5).abs() < 1e-6);
    }
}
