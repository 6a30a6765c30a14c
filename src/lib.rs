pub mod core;
pub mod defaults;
pub mod pipelines;
pub mod screen_opt;
