//! Core reusable components for promoter screening.
//!
//! Everything here is independent of how tasks are scheduled: sequence
//! types, the homology filter, promoter prediction, consensus accumulation
//! and input readers.

pub mod alignment;
pub mod consensus;
pub mod io;
pub mod promoter;
pub mod sequence;
