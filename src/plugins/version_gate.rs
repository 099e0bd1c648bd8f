//! Upstream version gate.
//!
//! Before a run, the upstream "last updated" timestamp for the theme is
//! compared with the baseline the current mapping was written against. A newer
//! upstream release blocks the run. The HTTP fetch of the versions document is
//! done outside this crate; this module only parses and compares.

use crate::core::error::EtlError;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GateDecision {
    Proceed,
    Blocked { remote: String, baseline: String },
}

impl GateDecision {
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }
}

/// Parse RFC 3339, `YYYY-MM-DDTHH:MM:SS[.f]`, or `YYYY-MM-DD` (midnight).
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, EtlError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(dt);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| EtlError::TimestampError(raw.to_string()))
}

/// Blocked iff `remote` is strictly newer than `baseline`.
pub fn check_version(remote: &str, baseline: &str) -> Result<GateDecision, EtlError> {
    let remote_ts = parse_timestamp(remote)?;
    let baseline_ts = parse_timestamp(baseline)?;
    if remote_ts > baseline_ts {
        Ok(GateDecision::Blocked {
            remote: remote.trim().to_string(),
            baseline: baseline.trim().to_string(),
        })
    } else {
        Ok(GateDecision::Proceed)
    }
}

#[derive(Debug, Deserialize)]
struct VersionsDocument {
    #[serde(rename = "themeDataStatus")]
    theme_data_status: Vec<ThemeStatus>,
}

#[derive(Debug, Deserialize)]
struct ThemeStatus {
    theme: String,
    #[serde(rename = "lastUpdate")]
    last_update: String,
}

/// `lastUpdate` of `theme` from a versions document.
pub fn theme_last_update(document: &str, theme: &str) -> Result<String, EtlError> {
    let doc: VersionsDocument = serde_json::from_str(document)?;
    doc.theme_data_status
        .into_iter()
        .find(|t| t.theme == theme)
        .map(|t| t.last_update)
        .ok_or_else(|| {
            EtlError::VersionDocumentError(format!("theme '{}' not listed", theme))
        })
}

/// Gate decision for `theme` against `baseline`.
pub fn evaluate(document: &str, theme: &str, baseline: &str) -> Result<GateDecision, EtlError> {
    let remote = theme_last_update(document, theme)?;
    let decision = check_version(&remote, baseline)?;
    match &decision {
        GateDecision::Proceed => tracing::info!(%remote, %baseline, "upstream unchanged"),
        GateDecision::Blocked { .. } => {
            tracing::warn!(%remote, %baseline, "new upstream version available")
        }
    }
    Ok(decision)
}
