pub mod error;
pub mod evaluation;
pub mod image_adapter;
pub mod knn;
pub mod sample;
pub mod sample_set;

pub use error::{Error, Result};
pub use knn::{KNearestNeighbors, TieBreak};
pub use sample::Sample;
pub use sample_set::EqualizationPolicy;
