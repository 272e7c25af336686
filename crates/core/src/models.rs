use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub type ExifTags = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub name: String,
    pub size: u64,
    pub content_type: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub modified_at: Option<DateTime<Utc>>,
    pub content_hash: String,
    pub exif: Option<ExifTags>,
}

impl FileMetadata {
    pub fn is_image(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|t| t.starts_with("image/"))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub attribute: String,
    pub value_a: Option<String>,
    pub value_b: Option<String>,
    pub similar: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    IndicatorsFound,
    NoIndicators,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::IndicatorsFound => f.write_str("Duplication indicators found."),
            Verdict::NoIndicators => f.write_str("No significant duplication indicators found."),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub rows: Vec<ComparisonRow>,
    pub score: f64,
    pub warnings: Vec<String>,
    pub verdict: Verdict,
}

impl ComparisonReport {
    pub fn row(&self, attribute: &str) -> Option<&ComparisonRow> {
        self.rows.iter().find(|r| r.attribute == attribute)
    }
}
