//! Unwrapping and validating the capability's JSON answer.
//!
//! Model output often arrives wrapped in markdown code fences or with a line
//! of prose around it. The wrapping is stripped, then the object is parsed
//! into a strict wire shape: a missing key is a parse failure here, never a
//! silent default.

use leafdoc_core::error::AnalysisError;
use leafdoc_core::scan::{ContributingFactors, MAX_SEVERITY, PlantAnalysis, StatusColor};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```[A-Za-z]*[ \t]*\r?\n?(.*?)\r?\n?```").expect("code fence pattern is valid")
});

#[derive(Debug, Deserialize)]
struct AnalysisWire {
    disease: String,
    confidence: f64,
    description: String,
    treatment: String,
    severity: f64,
    factors: FactorsWire,
}

#[derive(Debug, Deserialize)]
struct FactorsWire {
    humidity: String,
    sunlight: String,
    airflow: String,
}

/// Removes code fences and surrounding prose, leaving the JSON object text.
pub fn strip_wrapping(raw: &str) -> &str {
    let inner = CODE_FENCE
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(raw)
        .trim();

    match (inner.find('{'), inner.rfind('}')) {
        (Some(start), Some(end)) if start < end => &inner[start..=end],
        _ => inner,
    }
}

/// Formats a bare confidence number as a percentage string.
///
/// Whole numbers drop the decimal point: `98.0` → `"98%"`, `92.5` → `"92.5%"`.
pub fn format_confidence(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}%", value as i64)
    } else {
        format!("{value}%")
    }
}

/// Parses raw capability text into a validated analysis.
pub fn parse_analysis(raw: &str) -> Result<PlantAnalysis, AnalysisError> {
    let json = strip_wrapping(raw);
    if json.is_empty() {
        return Err(AnalysisError::parse("Analysis response was empty"));
    }

    let wire: AnalysisWire = serde_json::from_str(json)
        .map_err(|e| AnalysisError::parse(format!("Analysis response is not valid JSON: {e}")))?;

    if !wire.confidence.is_finite() || !wire.severity.is_finite() {
        return Err(AnalysisError::parse("Analysis contains non-finite numbers"));
    }

    let severity = wire.severity.round().clamp(0.0, f64::from(MAX_SEVERITY)) as u8;
    if f64::from(severity) != wire.severity {
        tracing::warn!(
            "[Analyzer] Severity {} outside 0..={} or fractional, using {}",
            wire.severity,
            MAX_SEVERITY,
            severity
        );
    }

    Ok(PlantAnalysis {
        color: StatusColor::for_diagnosis(&wire.disease),
        confidence: format_confidence(wire.confidence),
        disease: wire.disease,
        description: wire.description,
        treatment: wire.treatment,
        severity,
        factors: ContributingFactors::new(
            wire.factors.humidity,
            wire.factors.sunlight,
            wire.factors.airflow,
        ),
    })
}
