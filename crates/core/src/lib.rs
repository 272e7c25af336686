//! Core library: metadata extraction, hashing, name similarity and duplication scoring.

pub mod config;
pub mod error;
pub mod exif_data;
pub mod extractor;
pub mod hashing;
pub mod models;
pub mod pipeline;
pub mod scorer;
pub mod similarity;

pub use error::ExtractError;
pub use extractor::{ExtractedPair, Extractor};
pub use models::{ComparisonReport, ComparisonRow, FileMetadata, Verdict};
pub use pipeline::{compare, CompareOutcome};
