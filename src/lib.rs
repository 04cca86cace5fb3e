//! Statistical core of a microsimulation engine: a uniform abstraction over
//! univariate and multivariate probability distributions, copula-based
//! dependence modeling, streaming estimators, clustering/trend primitives,
//! and a population-redistribution algorithm.
//!
//! Dependency order (leaves first): [`num`] -> [`stats`] -> [`dist`] ->
//! [`generic`] -> [`multivariate`] -> [`copula`] -> [`cluster`] ->
//! [`mover`] -> [`regression`] -> [`history`] -> [`misc`]. [`external`]
//! defines the contracts this crate consumes but does not implement.

pub mod cluster;
pub mod copula;
pub mod dist;
pub mod error;
pub mod external;
pub mod generic;
pub mod history;
pub mod misc;
pub mod mover;
pub mod multivariate;
pub mod num;
pub mod regression;
pub mod rng;
pub mod stats;

pub use error::{CoreError, CoreResult};
