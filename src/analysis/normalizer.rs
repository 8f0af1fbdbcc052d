//! Turns raw provider output into a typed result.
//!
//! Providers often wrap their JSON in a markdown fence. The normalizer trims
//! the text, strips one opening fence (optionally tagged, e.g. ```` ```json ````)
//! and its closing marker, parses the remainder and checks the required
//! top-level fields for the operation kind.

use crate::analysis::types::{AnalysisError, OperationKind, OperationResult, ValidationMode};
use serde_json::{Map, Value};

const FENCE: &str = "```";

/// Remove a single surrounding code fence, if present.
///
/// Input without an opening fence is returned trimmed but otherwise untouched.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(after_open) = trimmed.strip_prefix(FENCE) else {
        return trimmed;
    };

    // Drop the language tag (if any) that follows the opening marker.
    let body = match after_open.find('\n') {
        Some(newline) if is_fence_tag(&after_open[..newline]) => &after_open[newline + 1..],
        Some(_) => after_open,
        None => after_open.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
    };

    body.strip_suffix(FENCE).unwrap_or(body).trim()
}

fn is_fence_tag(tag: &str) -> bool {
    tag.trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Parse and validate raw provider output for `kind`.
pub fn normalize(
    kind: OperationKind,
    raw: &str,
    mode: ValidationMode,
) -> Result<OperationResult, AnalysisError> {
    let body = strip_code_fence(raw);
    if body.is_empty() {
        return Err(AnalysisError::Parse("empty response".to_string()));
    }

    let value: Value = serde_json::from_str(body).map_err(|e| AnalysisError::Parse(e.to_string()))?;
    let Value::Object(object) = &value else {
        return Err(AnalysisError::Parse(format!(
            "expected a JSON object, got {}",
            json_type_name(&value)
        )));
    };

    let missing = missing_fields(object, kind.required_fields(mode));
    if !missing.is_empty() {
        return Err(AnalysisError::Validation { kind, missing });
    }

    OperationResult::from_value(kind, value).map_err(|e| AnalysisError::Parse(e.to_string()))
}

/// Required fields that are absent or null.
pub fn missing_fields(object: &Map<String, Value>, required: &[&str]) -> Vec<String> {
    required
        .iter()
        .filter(|field| object.get(**field).is_none_or(Value::is_null))
        .map(|field| field.to_string())
        .collect()
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_ANALYSIS: &str = r#"{
        "summary": {"tldr": "A lease.", "keyPoints": ["Rent is due monthly"], "confidence": 1.7},
        "keyInformation": {"parties": ["Landlord", "Tenant"], "dates": [], "monetaryAmounts": [{"amount": 1200, "currency": "USD", "description": "rent", "type": "payment"}], "obligations": []},
        "riskAssessment": {"overallRisk": "HIGH", "redFlags": [], "recommendations": []},
        "actionPlan": [{"id": 1, "task": "Sign", "priority": "low", "deadline": null, "completed": false}],
        "smartGlossary": "not validated"
    }"#;

    #[test]
    fn test_strip_tagged_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  ```JSON\n{\"a\":1}```  "), "{\"a\":1}");
    }

    #[test]
    fn test_strip_untagged_fence() {
        assert_eq!(strip_code_fence("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```{\"a\":1}```"), "{\"a\":1}");
    }

    #[test]
    fn test_unfenced_input_is_unchanged() {
        assert_eq!(strip_code_fence("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fence("{\"code\":\"```\"}"), "{\"code\":\"```\"}");
    }

    #[test]
    fn test_only_one_fence_pair_is_removed() {
        let raw = "```json\n{\"snippet\":\"```rust```\"}\n```";
        assert_eq!(strip_code_fence(raw), "{\"snippet\":\"```rust```\"}");
    }

    #[test]
    fn test_valid_analysis_is_accepted() {
        let raw = format!("```json\n{}\n```", VALID_ANALYSIS);
        let result = normalize(OperationKind::Analyze, &raw, ValidationMode::default()).unwrap();

        let OperationResult::Analysis(analysis) = result else {
            panic!("expected an analysis result");
        };
        assert_eq!(analysis.summary.confidence, 1.0);
        assert_eq!(analysis.risk_assessment.overall_risk, crate::analysis::Level::High);
        assert_eq!(analysis.action_plan[0].id, "1");
        assert_eq!(analysis.key_information.monetary_amounts[0].amount, "1200");
        assert!(analysis.smart_glossary.is_some());
    }

    #[test]
    fn test_missing_sections_are_named() {
        let raw = r#"{"summary": {"tldr": "x"}, "actionPlan": null}"#;
        let error = normalize(OperationKind::Analyze, raw, ValidationMode::default()).unwrap_err();

        match error {
            AnalysisError::Validation { kind, missing } => {
                assert_eq!(kind, OperationKind::Analyze);
                assert_eq!(missing, vec!["keyInformation", "riskAssessment", "actionPlan"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_output_is_a_parse_error() {
        for raw in ["", "Sorry, I cannot help with that.", "[1, 2]", "```json\n{\"summary\": \n```"] {
            let error = normalize(OperationKind::ExplainTerm, raw, ValidationMode::default());
            assert!(matches!(error, Err(AnalysisError::Parse(_))), "accepted {raw:?}");
        }
    }

    #[test]
    fn test_sibling_kinds_accept_any_object_by_default() {
        let result = normalize(OperationKind::ExplainTerm, "{}", ValidationMode::FullAnalysisOnly);
        assert!(matches!(result, Ok(OperationResult::TermExplanation(_))));

        let result = normalize(OperationKind::GenerateQuiz, r#"{"note": "x"}"#, ValidationMode::FullAnalysisOnly);
        assert!(matches!(result, Ok(OperationResult::Quiz(_))));
    }

    #[test]
    fn test_uniform_mode_checks_sibling_fields() {
        let error = normalize(OperationKind::ExplainTerm, r#"{"term": "lien"}"#, ValidationMode::Uniform)
            .unwrap_err();
        assert!(matches!(
            error,
            AnalysisError::Validation { ref missing, .. } if missing == &vec!["definition".to_string()]
        ));

        let ok = normalize(
            OperationKind::GenerateScenarios,
            r#"{"scenarios": [{"id": 1, "title": "t", "situation": "s", "consequences": []}]}"#,
            ValidationMode::Uniform,
        );
        assert!(matches!(ok, Ok(OperationResult::Scenarios(ref set)) if set.scenarios[0].id == "1"));
    }

    #[test]
    fn test_wrong_section_shape_is_a_parse_error() {
        let raw = r#"{"summary": "text", "keyInformation": {}, "riskAssessment": {}, "actionPlan": []}"#;
        let error = normalize(OperationKind::Analyze, raw, ValidationMode::default());
        assert!(matches!(error, Err(AnalysisError::Parse(_))));
    }

    #[test]
    fn test_single_string_is_accepted_as_list() {
        let raw = r#"{"term": "lien", "definition": "a claim", "examples": "e.g. a mortgage", "relatedTerms": ["levy", null]}"#;
        let result = normalize(OperationKind::ExplainTerm, raw, ValidationMode::Uniform).unwrap();

        let OperationResult::TermExplanation(term) = result else {
            panic!("expected a term explanation");
        };
        assert_eq!(term.examples, vec!["e.g. a mortgage"]);
        assert_eq!(term.related_terms, vec!["levy"]);

        let raw = r#"{"scenarios": [{"id": "a", "title": "Late rent", "situation": "s", "consequences": "Late fee applies", "severity": 3}]}"#;
        let Ok(OperationResult::Scenarios(set)) =
            normalize(OperationKind::GenerateScenarios, raw, ValidationMode::default())
        else {
            panic!("expected scenarios");
        };
        assert_eq!(set.scenarios[0].consequences, vec!["Late fee applies"]);
        assert_eq!(set.scenarios[0].severity, Some(crate::analysis::Level::High));
    }

    #[test]
    fn test_numeric_strings_are_accepted() {
        let raw = r#"{"quiz": {"title": "Lease", "questions": [
            {"id": 1, "type": "multiple-choice", "question": "Who pays?", "options": ["Tenant", "Landlord"], "correctAnswer": 0, "explanation": "x", "points": "10"}
        ]}}"#;
        let Ok(OperationResult::Quiz(quiz)) = normalize(OperationKind::GenerateQuiz, raw, ValidationMode::Uniform)
        else {
            panic!("expected a quiz");
        };
        assert_eq!(quiz.quiz.questions[0].points, 10);

        let raw = r#"{
            "summary": {"tldr": "A lease.", "keyPoints": "Rent is due monthly", "confidence": "0.9"},
            "keyInformation": {"parties": "Landlord", "dates": [], "monetaryAmounts": [], "obligations": []},
            "riskAssessment": {"overallRisk": 1, "redFlags": [], "recommendations": []},
            "actionPlan": [{"id": 1, "task": "Sign", "priority": "2", "completed": "false"}]
        }"#;
        let Ok(OperationResult::Analysis(analysis)) =
            normalize(OperationKind::Analyze, raw, ValidationMode::default())
        else {
            panic!("expected an analysis");
        };
        assert_eq!(analysis.summary.confidence, 0.9);
        assert_eq!(analysis.summary.key_points, vec!["Rent is due monthly"]);
        assert_eq!(analysis.key_information.parties, vec!["Landlord"]);
        assert_eq!(analysis.risk_assessment.overall_risk, crate::analysis::Level::Low);
        assert_eq!(analysis.action_plan[0].priority, crate::analysis::Level::Medium);
        assert!(!analysis.action_plan[0].completed);
    }

    #[test]
    fn test_malformed_entries_are_dropped() {
        let raw = r#"{"scenarios": [{"id": 1, "title": "kept", "situation": "s", "consequences": []}, "not a scenario"]}"#;
        let Ok(OperationResult::Scenarios(set)) =
            normalize(OperationKind::GenerateScenarios, raw, ValidationMode::default())
        else {
            panic!("expected scenarios");
        };
        assert_eq!(set.scenarios.len(), 1);
        assert_eq!(set.scenarios[0].title, "kept");
    }
}
