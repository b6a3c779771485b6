//! Estimator engine composing the algorithm layer.

mod dp_slam;

pub use dp_slam::{DpSlam, DpSlamConfig, DpSlamState, MapSnapshot};
