//! Pipeline module.
//!
//! This module provides the wrangling pipeline, its builder and progress
//! reporting.

mod builder;
pub mod progress;

pub use builder::{WranglePipeline, WranglePipelineBuilder};
pub use progress::{ClosureProgressReporter, ProgressReporter, ProgressUpdate, WrangleStage};
