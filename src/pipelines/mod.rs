//! Screening pipelines.
//!
//! - `screen`: homology → upstream extraction → promoter prediction →
//!   consensus, over every (record gene × reference gene) pair
pub mod screen;
