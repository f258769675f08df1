use thiserror::Error;
use url::Url;

use super::analyze::build_report;
use super::extract::extract;
use crate::fetch::{FetchError, Fetcher};
use crate::models::{AnalysisReport, MetadataRecord};

#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to fetch URL: {0}")]
    Fetch(#[from] FetchError),
}

/// Validate a caller-supplied target: it must be an absolute http(s) URL
/// with a host.
pub fn parse_target_url(raw: &str) -> Result<Url, AnalyzeError> {
    let raw = raw.trim();
    let parsed = Url::parse(raw).map_err(|e| AnalyzeError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(AnalyzeError::InvalidUrl(format!(
                "unsupported scheme `{other}`, only http/https URLs are supported"
            )))
        }
    }

    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(AnalyzeError::InvalidUrl("URL has no host".into()));
    }

    Ok(parsed)
}

/// Fetch the page at `raw_url` and extract its metadata.
///
/// The URL is validated first; an invalid URL never reaches the fetcher.
/// The record's `sourceUrl` is the caller's input, not the normalized form.
pub async fn analyze(
    fetcher: &dyn Fetcher,
    raw_url: &str,
) -> Result<MetadataRecord, AnalyzeError> {
    let url = parse_target_url(raw_url)?;

    let markup = fetcher.fetch_markup(&url).await.map_err(|e| {
        tracing::warn!(error = %e, url = %url, "Failed to fetch page for analysis");
        e
    })?;

    Ok(extract(&markup, raw_url.trim()))
}

/// [`analyze`] followed by missing-field detection and recommendations.
pub async fn analyze_report(
    fetcher: &dyn Fetcher,
    raw_url: &str,
) -> Result<AnalysisReport, AnalyzeError> {
    let record = analyze(fetcher, raw_url).await?;
    let report = build_report(record);

    tracing::info!(
        url = %raw_url.trim(),
        missing = report.missing_fields.len(),
        "Analyzed page"
    );

    Ok(report)
}
