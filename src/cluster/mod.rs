//! K-means clustering with configurable initialization and gap-statistic
//! k-selection, plus trend extraction from clustered time series.

pub mod init;
pub mod kmeans;
pub mod trend;

pub use init::{Forgy, InitStrategy, KMeansPlusPlus, RandomPartition};
pub use kmeans::{GapStatistic, KMeans};
pub use trend::TrendClustering;
