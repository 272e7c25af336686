use crate::config::AppConfig;
use crate::error::ExtractError;
use crate::extractor::{ExtractedPair, Extractor};
use crate::models::{ComparisonReport, FileMetadata};
use crate::scorer;
use providers::http::{HttpMetadataProvider, HttpProviderConfig};
use providers::noop::NoopProvider;
use providers::{MetadataProvider, ProviderError};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct CompareOutcome {
    pub file_a: FileMetadata,
    pub file_b: FileMetadata,
    pub report: ComparisonReport,
    /// Non-fatal notice, e.g. that remote extraction fell back to local.
    pub notice: Option<String>,
}

/// Extracts both files, then scores them.
pub async fn compare(
    extractor: &Extractor,
    a: &Path,
    b: &Path,
) -> Result<CompareOutcome, ExtractError> {
    info!(
        "Comparing {:?} and {:?} (remote: {})",
        a,
        b,
        extractor.uses_remote()
    );
    let pair = extractor.extract_pair(a, b).await?;
    let report = scorer::score(&pair.a, &pair.b);
    info!(
        "Comparison complete. Score {:.1}, {} warnings, hashes: {}.",
        report.score,
        report.warnings.len(),
        hash_source(extractor, &pair)
    );
    Ok(CompareOutcome {
        file_a: pair.a,
        file_b: pair.b,
        report,
        notice: pair.notice,
    })
}

fn hash_source(extractor: &Extractor, pair: &ExtractedPair) -> String {
    if pair.hashes_from_remote {
        "remote service".to_string()
    } else {
        format!("local {}", extractor.digest())
    }
}

pub fn build_provider(config: &AppConfig) -> Result<Arc<dyn MetadataProvider>, ProviderError> {
    match &config.remote.url {
        Some(url) if !url.is_empty() => {
            let provider = HttpMetadataProvider::new(HttpProviderConfig {
                base_url: url.clone(),
                timeout: Some(Duration::from_secs(config.remote.timeout_secs)),
            })?;
            Ok(Arc::new(provider))
        }
        _ => {
            warn!("Remote metadata enabled without a URL; every request will fall back.");
            Ok(Arc::new(NoopProvider))
        }
    }
}

pub fn build_extractor(config: &AppConfig) -> Result<Extractor, ProviderError> {
    let digest = config.hashing.algorithm;
    if config.remote.enabled {
        Ok(Extractor::remote(digest, build_provider(config)?))
    } else {
        Ok(Extractor::local(digest))
    }
}
