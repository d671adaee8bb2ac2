//! Random forest classifier used to pick tree transformations.
//!
//! Training is an offline batch step ([`Forest::fit`]); the fitted model is
//! persisted as an rkyv archive of [`alpha_protocol::ForestModel`] and
//! reloaded read-only for inference.

pub mod config;
pub mod dataset;
pub mod error;
mod fit;
pub mod forest;

pub use config::{ForestConfig, MaxFeatures};
pub use dataset::Dataset;
pub use error::{DatasetError, ForestError};
pub use forest::Forest;
