//! Data layer for the crash statistics pipeline.
//!
//! Reads the yearly dataset tables out of the published ZIP archive,
//! normalizes accident records and builds the aggregate views consumed by
//! the report binary.

pub mod aggregator;
pub mod analysis;
pub mod html;
pub mod normalizer;
pub mod reader;
pub mod timeseries;

#[cfg(test)]
mod fixtures;

pub use analysis::{analyze, AnalysisMetadata, AnalysisResult, PipelineOptions};
pub use crash_core as core;
