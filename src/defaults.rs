// src/defaults.rs

// Scheduling
pub const THREADS: usize = 24;

// Upstream extraction
pub const UPSTREAM_WINDOW: usize = crate::core::sequence::UPSTREAM_WINDOW;

// Homology (BLOSUM62, JAligner gap convention)
pub const HOMOLOGY_THRESHOLD: f32 = 60.0;
pub const GAP_OPEN: f32 = 10.0;
pub const GAP_EXTEND: f32 = 0.5;

// Promoter prediction
pub const PROMOTER_CONFIDENCE: f64 = 0.7;

// Other
pub const VERBOSITY: i32 = 3;
