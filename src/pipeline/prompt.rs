use super::PipelineError;

pub const OBSERVATION_SYSTEM_PROMPT: &str = r#"
You are a clinical documentation assistant for a dental practice. Your ONLY
role is to turn the clinical text you are given into one structured
consultation note.

RULES — ABSOLUTE, NO EXCEPTIONS:
1. Base the note ONLY on information present in the clinical text.
2. NEVER invent findings, tooth numbers, or treatments.
3. Keep the language of the clinical text (do not translate).
4. Respond with a single JSON object and NOTHING else — no prose,
   no code fences, no commentary before or after.

OUTPUT SCHEMA (all three fields required):
{
  "observation": "clinical observation as one text",
  "affected_teeth": ["FDI tooth numbers as strings, [] if none named"],
  "recommendation": "recommended next step"
}
"#;

/// Where the clinical text came from. The wording of the prompt differs
/// slightly per source so the model knows what it is reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptMode {
    /// The patient's stored free-text health history.
    History,
    /// Text extracted from an uploaded clinical report.
    Document,
}

/// Build the generation prompt for one consultation note.
///
/// Pure and deterministic: the same inputs always produce the same prompt.
/// Fails with `EmptyInput` when the clinical text is blank, since an empty
/// history makes no consultation and would waste a paid model call.
pub fn build_observation_prompt(
    clinical_text: &str,
    mode: PromptMode,
) -> Result<String, PipelineError> {
    if clinical_text.trim().is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let source_label = match mode {
        PromptMode::History => "the patient's recorded health history",
        PromptMode::Document => "a clinical report uploaded for the patient",
    };

    Ok(format!(
        r#"The following clinical text is {source_label}:

<clinical_text>
{clinical_text}
</clinical_text>

Write one consultation note for this patient. Respond with exactly one JSON
object with the fields "observation" (string), "affected_teeth" (array of
strings, may be empty) and "recommendation" (string). Output JSON only."#
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_contains_clinical_text() {
        let prompt =
            build_observation_prompt("Zahnschmerzen seit 3 Tagen", PromptMode::History).unwrap();
        assert!(prompt.contains("Zahnschmerzen seit 3 Tagen"));
        assert!(prompt.contains("<clinical_text>"));
        assert!(prompt.contains("</clinical_text>"));
    }

    #[test]
    fn prompt_names_all_schema_fields() {
        let prompt = build_observation_prompt("some text", PromptMode::History).unwrap();
        assert!(prompt.contains("\"observation\""));
        assert!(prompt.contains("\"affected_teeth\""));
        assert!(prompt.contains("\"recommendation\""));
    }

    #[test]
    fn mode_changes_source_wording() {
        let history = build_observation_prompt("text", PromptMode::History).unwrap();
        let document = build_observation_prompt("text", PromptMode::Document).unwrap();
        assert!(history.contains("health history"));
        assert!(document.contains("uploaded"));
        assert_ne!(history, document);
    }

    #[test]
    fn empty_text_is_rejected() {
        let result = build_observation_prompt("   \n ", PromptMode::History);
        assert!(matches!(result, Err(PipelineError::EmptyInput)));
    }

    #[test]
    fn builder_is_deterministic() {
        let a = build_observation_prompt("Karies an 36", PromptMode::Document).unwrap();
        let b = build_observation_prompt("Karies an 36", PromptMode::Document).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn system_prompt_enforces_json_only() {
        assert!(OBSERVATION_SYSTEM_PROMPT.contains("JSON object and NOTHING else"));
        assert!(OBSERVATION_SYSTEM_PROMPT.contains("NEVER invent"));
    }
}
