use serde::{Deserialize, Serialize};

use super::PipelineError;

/// The structured contract every generated note must satisfy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedObservation {
    pub observation: String,
    pub affected_teeth: Vec<String>,
    pub recommendation: String,
}

/// Decode raw model output against the three-field schema.
///
/// Strict by design: the top level must be a JSON object, all three fields
/// must be present with their exact types, and `observation` /
/// `recommendation` must be non-empty. A bare string where
/// `affected_teeth` should be an array is rejected, not wrapped. Every
/// failure carries the exact raw text so an operator can inspect what the
/// model actually said.
pub fn parse_generated_observation(raw: &str) -> Result<GeneratedObservation, PipelineError> {
    let candidate = strip_code_fence(raw);

    let value: serde_json::Value =
        serde_json::from_str(candidate).map_err(|e| malformed(format!("not valid JSON: {e}"), raw))?;

    if !value.is_object() {
        return Err(malformed("top level is not a JSON object".into(), raw));
    }

    let parsed: GeneratedObservation = serde_json::from_value(value)
        .map_err(|e| malformed(format!("schema violation: {e}"), raw))?;

    if parsed.observation.trim().is_empty() {
        return Err(malformed("\"observation\" is empty".into(), raw));
    }
    if parsed.recommendation.trim().is_empty() {
        return Err(malformed("\"recommendation\" is empty".into(), raw));
    }

    Ok(parsed)
}

fn malformed(reason: String, raw: &str) -> PipelineError {
    PipelineError::MalformedGeneration {
        reason,
        raw_response: raw.to_string(),
    }
}

/// Models wrap output in ```json fences even when told not to. A fenced
/// response whose content satisfies the schema is accepted; the fence is
/// the only leniency applied.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
    else {
        return trimmed;
    };
    match rest.rfind("```") {
        Some(end) => rest[..end].trim(),
        None => trimmed,
    }
}
