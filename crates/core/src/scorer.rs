//! Duplication scoring: compares two metadata records attribute by attribute
//! and sums fixed weights into a score clamped to `[0, 100]`.

use crate::models::{ComparisonReport, ComparisonRow, ExifTags, FileMetadata, Verdict};
use crate::similarity::name_similarity;
use chrono::{DateTime, SecondsFormat, Utc};

pub const HASH_WEIGHT: f64 = 85.0;
pub const SIZE_WEIGHT: f64 = 20.0;
pub const EXIF_WEIGHT: f64 = 20.0;
pub const CREATED_WEIGHT: f64 = 10.0;
pub const MODIFIED_WEIGHT: f64 = 10.0;
pub const TYPE_WEIGHT: f64 = 5.0;
/// Multiplied by the name similarity fraction.
pub const NAME_WEIGHT: f64 = 10.0;
pub const NAME_SIMILARITY_THRESHOLD: f64 = 0.8;
pub const MAX_SCORE: f64 = 100.0;

pub const ATTR_NAME: &str = "Name";
pub const ATTR_SIZE: &str = "Size (bytes)";
pub const ATTR_TYPE: &str = "Type";
pub const ATTR_CREATED: &str = "Created";
pub const ATTR_MODIFIED: &str = "Last Modified";
pub const ATTR_HASH: &str = "Content Hash";
pub const ATTR_EXIF: &str = "EXIF Data";

#[derive(Default)]
struct Tally {
    rows: Vec<ComparisonRow>,
    total: f64,
    warnings: Vec<String>,
}

impl Tally {
    fn record(
        &mut self,
        attribute: &str,
        value_a: Option<String>,
        value_b: Option<String>,
        similar: bool,
        weight: f64,
        warning: Option<String>,
    ) {
        if similar {
            self.total += weight;
            if let Some(w) = warning {
                self.warnings.push(w);
            }
        }
        self.rows.push(ComparisonRow {
            attribute: attribute.to_string(),
            value_a,
            value_b,
            similar,
        });
    }

    fn finish(self) -> ComparisonReport {
        let verdict = if self.warnings.is_empty() {
            Verdict::NoIndicators
        } else {
            Verdict::IndicatorsFound
        };
        ComparisonReport {
            rows: self.rows,
            score: self.total.clamp(0.0, MAX_SCORE),
            warnings: self.warnings,
            verdict,
        }
    }
}

/// Absent values never match, not even each other.
fn both_equal<T: PartialEq>(a: &Option<T>, b: &Option<T>) -> bool {
    matches!((a, b), (Some(x), Some(y)) if x == y)
}

fn format_timestamp(ts: &Option<DateTime<Utc>>) -> Option<String> {
    ts.map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn format_exif(tags: &Option<ExifTags>) -> Option<String> {
    tags.as_ref()
        .and_then(|t| serde_json::to_string_pretty(t).ok())
}

pub fn score(a: &FileMetadata, b: &FileMetadata) -> ComparisonReport {
    let mut tally = Tally::default();

    let similarity = name_similarity(&a.name, &b.name);
    tally.record(
        ATTR_NAME,
        Some(a.name.clone()),
        Some(b.name.clone()),
        similarity > NAME_SIMILARITY_THRESHOLD,
        NAME_WEIGHT * similarity,
        Some(format!(
            "File names are highly similar ({}% match), which may indicate a renamed copy.",
            (similarity * 100.0).round()
        )),
    );

    tally.record(
        ATTR_SIZE,
        Some(a.size.to_string()),
        Some(b.size.to_string()),
        a.size == b.size,
        SIZE_WEIGHT,
        Some("Files have identical sizes, which may indicate duplication.".to_string()),
    );

    tally.record(
        ATTR_TYPE,
        a.content_type.clone(),
        b.content_type.clone(),
        both_equal(&a.content_type, &b.content_type),
        TYPE_WEIGHT,
        None,
    );

    tally.record(
        ATTR_CREATED,
        format_timestamp(&a.created_at),
        format_timestamp(&b.created_at),
        both_equal(&a.created_at, &b.created_at),
        CREATED_WEIGHT,
        Some("Files have identical creation dates, which may indicate copying.".to_string()),
    );

    tally.record(
        ATTR_MODIFIED,
        format_timestamp(&a.modified_at),
        format_timestamp(&b.modified_at),
        both_equal(&a.modified_at, &b.modified_at),
        MODIFIED_WEIGHT,
        Some("Files have identical last modified dates, which may indicate copying.".to_string()),
    );

    tally.record(
        ATTR_HASH,
        Some(a.content_hash.clone()),
        Some(b.content_hash.clone()),
        a.content_hash == b.content_hash,
        HASH_WEIGHT,
        Some(
            "Files have identical content hashes, which strongly indicates duplicate content."
                .to_string(),
        ),
    );

    tally.record(
        ATTR_EXIF,
        format_exif(&a.exif),
        format_exif(&b.exif),
        both_equal(&a.exif, &b.exif),
        EXIF_WEIGHT,
        Some("Files have identical EXIF data, which may indicate duplication.".to_string()),
    );

    tally.finish()
}
