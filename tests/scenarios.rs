//! End-to-end scenarios exercising whole subsystems together rather than a
//! single function in isolation.

use microsim_stats_core::cluster::{KMeans, KMeansPlusPlus};
use microsim_stats_core::copula::GaussianCopula;
use microsim_stats_core::dist::{Continuous, Discrete, DiscreteGeneric, Distribution, Normal, ShiftedLognormal};
use microsim_stats_core::mover::{Member, PopulationMover};
use microsim_stats_core::multivariate::MultivariateDistribution;
use microsim_stats_core::num::matrix::Matrix;
use microsim_stats_core::regression::{FactorSelectionBottomUp, Ols};
use microsim_stats_core::rng::{Rng, SplitMix64};
use microsim_stats_core::stats::RunningStatisticsMulti;

#[test]
fn normal_quantile_round_trips_in_the_extreme_tails() {
    let n = Normal::new(0.0, 1.0).unwrap();
    for &p in &[1e-15, 1.0 - 1e-15] {
        let x = n.inv_cdf(p);
        let back = n.cdf(x);
        assert!((back - p).abs() < 2e-15, "p={p} back={back}");
    }
    let x_low = n.inv_cdf(1e-15);
    assert!((x_low - (-7.941_345_366_160_658_5)).abs() < 1e-6);
}

#[test]
fn gaussian_copula_conditional_matches_analytic_mean_and_covariance() {
    let rho = Matrix::from_rows(&[
        vec![1.0, 0.1, -0.2],
        vec![0.1, 1.0, -0.04],
        vec![-0.2, -0.04, 1.0],
    ]);
    let copula = GaussianCopula::new(rho, 1.0, None).unwrap();
    let conditional = copula.conditional_factors(&[0.3, f64::NAN, f64::NAN]).unwrap();
    assert_eq!(conditional.dim(), 2);

    let mut rng = SplitMix64::seed_from_u64(7);
    let mut stats = RunningStatisticsMulti::new(2);
    let mut draw = [0.0; 2];
    for _ in 0..10_000 {
        conditional.draw(&mut rng, &mut draw).unwrap();
        stats.add(&draw);
    }

    // Analytic conditional moments: mu = rho[1:,0] * 0.3, cov = Sigma_22 - Sigma_21*Sigma_12.
    let analytic_mean = [0.1 * 0.3, -0.2 * 0.3];
    let analytic_cov = [[0.99, -0.02], [-0.02, 0.96]];

    assert!((stats.marginal(0).mean() - analytic_mean[0]).abs() < 0.1);
    assert!((stats.marginal(1).mean() - analytic_mean[1]).abs() < 0.1);

    let empirical_cov = [
        [stats.marginal(0).variance(), stats.covariance(0, 1).covariance()],
        [stats.covariance(0, 1).covariance(), stats.marginal(1).variance()],
    ];
    let frobenius: f64 = (0..2)
        .flat_map(|i| (0..2).map(move |j| (i, j)))
        .map(|(i, j)| (empirical_cov[i][j] - analytic_cov[i][j]).powi(2))
        .sum::<f64>()
        .sqrt();
    assert!(frobenius < 3e-2, "frobenius={frobenius}");
}

#[test]
fn discrete_cdf_and_quantile_match_the_three_point_distribution() {
    let d = DiscreteGeneric::new(vec![(-1.0, 0.25), (0.0, 0.4), (1.0, 0.35)]).unwrap();
    assert_eq!(d.cdf(-0.1), 0.0);
    assert!((d.cdf(-1.0) - 0.25).abs() < 1e-12);
    assert!((d.cdf(0.0) - 0.65).abs() < 1e-12);
    assert_eq!(d.cdf(1.0), 1.0);
    assert_eq!(Discrete::inv_cdf(&d, 0.25), -1.0);
    assert_eq!(Discrete::inv_cdf(&d, 0.26), 0.0);
    assert_eq!(Discrete::inv_cdf(&d, 0.65 + 1e-9), 1.0);
}

#[test]
fn shifted_lognormal_exact_fit_reproduces_the_target_bucket_probabilities() {
    let d = ShiftedLognormal::fit_exactly_given_shift(0.4, 0.25, 0.5, 1.0, 2.0).unwrap();
    assert!((d.range_prob(0.5, 1.0) - 0.4).abs() < 1e-10);
    assert!((d.range_prob(1.0, 2.0) - 0.25).abs() < 1e-10);
    assert!((d.range_prob(2.0, f64::INFINITY) - 0.35).abs() < 1e-10);
}

#[test]
fn population_mover_large_population_matches_transition_times_histogram() {
    let ranges = vec![15.0, 25.0, 35.0, 60.0];
    let transition = Matrix::from_rows(&[
        vec![0.7, 0.1, 0.01],
        vec![0.25, 0.8, 0.09],
        vec![0.05, 0.1, 0.9],
    ]);
    let mover = PopulationMover::new(transition.clone(), ranges.clone(), 1e-8).unwrap();

    let source = ShiftedLognormal::new(15.0, 2.0, 0.5).unwrap();
    let mut rng = SplitMix64::seed_from_u64(123);
    let mut population: Vec<Member> = (0..20_000)
        .map(|_| {
            let value = source.sample(&mut rng).clamp(15.0, 60.0 - 1e-9);
            let range_index = mover.range_index_for_value(value).unwrap();
            Member { range_index, value }
        })
        .collect();

    let bucket_count = ranges.len() - 1;
    let mut p0 = vec![0.0; bucket_count];
    for m in &population {
        p0[m.range_index] += 1.0;
    }
    for v in &mut p0 {
        *v /= population.len() as f64;
    }

    mover.move_between_ranges(&mut population, &mut rng).unwrap();

    let mut p1 = vec![0.0; bucket_count];
    for m in &population {
        p1[m.range_index] += 1.0;
    }
    for v in &mut p1 {
        *v /= population.len() as f64;
    }

    let expected = transition.mul_vec(&p0);
    let frobenius: f64 = expected.iter().zip(&p1).map(|(e, a)| (e - a).powi(2)).sum::<f64>().sqrt();
    // A finite population only approximates pi*p0 up to the binomial sampling
    // noise of each origin bucket's multinomial split, hence the looser
    // tolerance than the idealized analytic property.
    assert!(frobenius < 2e-2, "frobenius={frobenius}, expected={expected:?}, got={p1:?}");
}

#[test]
fn kmeans_auto_k_recovers_two_well_separated_gaussian_blobs() {
    let mut rng = SplitMix64::seed_from_u64(55);
    let mut rows = Vec::new();
    for _ in 0..20 {
        rows.push(vec![-1.0 + 0.01 * rng.next_gaussian(), -1.0 + 0.01 * rng.next_gaussian()]);
    }
    for _ in 0..200 {
        rows.push(vec![1.0 + 0.2 * rng.next_gaussian(), 1.0 + 0.2 * rng.next_gaussian()]);
    }
    let sample = Matrix::from_rows(&rows);

    let kmeans = KMeans::new(Box::new(KMeansPlusPlus), 1e-6, 1e-6, false, 200, 20).unwrap();
    let (k, assignments) = kmeans.clusterise_auto_k(&sample, &mut rng).unwrap();
    assert_eq!(k, 2);

    let mut centroid_a = [0.0, 0.0];
    let mut count_a = 0usize;
    let cluster_of_first = assignments[0];
    for (row, &c) in rows.iter().zip(&assignments) {
        if c == cluster_of_first {
            centroid_a[0] += row[0];
            centroid_a[1] += row[1];
            count_a += 1;
        }
    }
    centroid_a[0] /= count_a as f64;
    centroid_a[1] /= count_a as f64;
    assert!((centroid_a[0] - (-1.0)).abs() < 0.1);
    assert!((centroid_a[1] - (-1.0)).abs() < 0.1);
}

#[test]
fn factor_selection_recovers_exactly_the_informative_factors() {
    let rows = 80;
    let mut x = Matrix::zeros(rows, 4);
    let mut y = vec![0.0; rows];
    for i in 0..rows {
        let t = i as f64;
        let x0 = (t * 0.41).sin();
        let x1 = (t * 0.09) - 3.0;
        let x2 = ((t * 0.23) % 4.0) - 2.0;
        let x3 = ((t * 5.0) % 3.0) - 1.0;
        let noise = ((i % 5) as f64 - 2.0) * 0.04;
        x.set(i, 0, x0);
        x.set(i, 1, x1);
        x.set(i, 2, x2);
        x.set(i, 3, x3);
        y[i] = 1.5 * x1 - 2.5 * x2 + 0.5 + noise;
    }

    let selector = FactorSelectionBottomUp::new(Ols::model_factory(true), Ols::factor_rank_residual_adj_r2, Ols::bic_comparator(6.0));
    assert_eq!(selector.select(&x, &y).unwrap(), vec![1, 2]);
}
