//! Sampling nodes
//!
//! Seeded point distributions. Sampling is rejection based and bounded by
//! `EngineConfig::max_sample_attempts`, so an impossible request fails the
//! node with `ResourceExhausted` instead of looping forever.

mod populate_box;

pub use populate_box::{populate_box, BoxSampling, PopulateBox};
