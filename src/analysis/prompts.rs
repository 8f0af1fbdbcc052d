//! Prompt construction for every operation kind.
//!
//! Each builder is a pure function of its parameters: it states the
//! assistant's role, embeds the exact JSON schema expected back, demands that
//! the reply be only that JSON, and names the target language explicitly.

use crate::analysis::types::OperationRequest;
use crate::env;
use std::borrow::Cow;

const DEFAULT_TERM_CONTEXT: &str = "General legal context";
const DEFAULT_DOCUMENT_TYPE: &str = "legal document";

/// Resolve a language code to the name used inside prompts.
///
/// Unknown codes (or full names) are returned verbatim.
pub fn language_name(language: &str) -> Cow<'_, str> {
    let trimmed = language.trim();
    let name = match trimmed.to_ascii_lowercase().as_str() {
        "" | "en" => "English",
        "es" => "Spanish",
        "fr" => "French",
        "de" => "German",
        "it" => "Italian",
        "pt" => "Portuguese",
        "nl" => "Dutch",
        "ru" => "Russian",
        "pl" => "Polish",
        "tr" => "Turkish",
        "ar" => "Arabic",
        "hi" => "Hindi",
        "bn" => "Bengali",
        "ta" => "Tamil",
        "te" => "Telugu",
        "mr" => "Marathi",
        "gu" => "Gujarati",
        "kn" => "Kannada",
        "ml" => "Malayalam",
        "pa" => "Punjabi",
        "ur" => "Urdu",
        "zh" => "Chinese",
        "ja" => "Japanese",
        "ko" => "Korean",
        "vi" => "Vietnamese",
        "id" => "Indonesian",
        _ => return Cow::Borrowed(trimmed),
    };
    Cow::Borrowed(name)
}

/// Build the prompt for any operation request.
pub fn build_prompt(request: &OperationRequest) -> String {
    match request {
        OperationRequest::Analyze {
            text,
            document_type,
            language,
        } => build_analysis_prompt(text, document_type, language),
        OperationRequest::ExplainTerm {
            term,
            context,
            document_type,
            language,
        } => build_term_explanation_prompt(
            term,
            context.as_deref(),
            document_type.as_deref(),
            language,
        ),
        OperationRequest::GenerateScenarios {
            clause,
            document_type,
            language,
        } => build_scenario_prompt(clause, document_type.as_deref(), language),
        OperationRequest::GenerateQuiz {
            document_text,
            difficulty,
            language,
        } => build_quiz_prompt(document_text, difficulty, language),
    }
}

pub fn build_analysis_prompt(text: &str, document_type: &str, language: &str) -> String {
    let language = language_name(language);
    let document_type = non_blank(document_type, "document");

    format!(
        r#"You are an advanced legal document analysis assistant. Analyze the provided legal document and return a comprehensive analysis with interactive features in JSON format. Focus on making complex legal language accessible to non-lawyers.

Please analyze the document and respond with ONLY a valid JSON object in this exact format:

{{
  "summary": {{
    "tldr": "One clear sentence summary in plain language",
    "keyPoints": ["3-5 bullet points of main provisions in simple language"],
    "confidence": 0.85
  }},
  "keyInformation": {{
    "parties": ["List of parties involved"],
    "dates": [{{"date": "YYYY-MM-DD", "description": "what this date is for", "importance": "high/medium/low"}}],
    "monetaryAmounts": [{{"amount": "$X", "currency": "USD", "description": "what this is for", "type": "payment/penalty/deposit/fee"}}],
    "obligations": ["List of key obligations and responsibilities in plain language"]
  }},
  "riskAssessment": {{
    "overallRisk": "low/medium/high",
    "redFlags": [{{"clause": "clause name", "risk": "what could go wrong", "severity": "high/medium/low", "explanation": "why this is risky in simple terms", "originalText": "exact text from document"}}],
    "recommendations": ["List of practical recommendations"]
  }},
  "actionPlan": [{{"id": "1", "task": "specific action to take", "priority": "high/medium/low", "deadline": "when to do this or null", "completed": false}}],
  "interactiveTerms": [{{"term": "legal term", "definition": "simple explanation", "positions": [{{"start": 0, "end": 10}}], "category": "legal|financial|temporal|obligation", "complexity": "basic|intermediate|advanced"}}],
  "clauseSimplifications": [{{"originalClause": "complex legal text", "simplifiedClause": "plain language version", "confidence": 0.9, "clauseType": "obligation|right|condition|penalty"}}],
  "contractVisualization": {{
    "mermaidDiagram": "graph TD\n    A[Party 1] -->|obligation| B[Party 2]\n    B -->|payment| A",
    "nodes": [{{"id": "A", "label": "Party 1", "type": "party"}}, {{"id": "B", "label": "Party 2", "type": "party"}}],
    "relationships": [{{"from": "A", "to": "B", "type": "obligation", "description": "specific obligation"}}]
  }},
  "realLifeScenarios": [{{"title": "What if scenario", "situation": "realistic situation", "consequences": ["consequence 1", "consequence 2"], "severity": "low|medium|high", "relatedClauses": ["clause reference"]}}],
  "smartGlossary": [{{"term": "legal term", "definition": "simple definition", "category": "legal|financial|temporal", "frequency": 3, "importance": "high|medium|low"}}]
}}

Important guidelines:
- Use simple, non-legal language that anyone can understand
- Focus on practical implications and risks
- Be specific about dates, amounts, and obligations
- Highlight unusual or concerning clauses
- Provide actionable recommendations
- Create realistic scenarios that help users understand consequences
- Generate a comprehensive glossary of all legal terms
- Create a visual representation of contract relationships
- Simplify complex clauses into plain language
- Ensure all JSON is valid and properly formatted

Document type: "{document_type}"

IMPORTANT: Please provide the analysis in {language} language. All explanations, summaries, and recommendations should be in {language}.

Document to analyze:

{text}"#
    )
}

pub fn build_term_explanation_prompt(
    term: &str,
    context: Option<&str>,
    document_type: Option<&str>,
    language: &str,
) -> String {
    let language = language_name(language);
    let context = non_blank(context.unwrap_or_default(), DEFAULT_TERM_CONTEXT);
    let document_type = non_blank(document_type.unwrap_or_default(), DEFAULT_DOCUMENT_TYPE);

    format!(
        r#"You are a legal term explanation assistant. Provide a clear, concise explanation of the legal term in context.

Respond with ONLY a valid JSON object in this format:
{{
  "term": "{term}",
  "definition": "Simple, clear definition in plain language",
  "contextualDefinition": "How this term applies in the specific context provided",
  "category": "legal|financial|temporal|obligation|right|condition",
  "complexity": "basic|intermediate|advanced",
  "examples": ["practical example 1", "practical example 2"],
  "relatedTerms": ["related term 1", "related term 2"],
  "consequences": "What happens if this term is violated or activated"
}}

Term to explain: "{term}"
Context: "{context}"
Document type: "{document_type}"

IMPORTANT: Provide the explanation in {language} language. Every generated phrase must be in {language}."#
    )
}

pub fn build_scenario_prompt(clause: &str, document_type: Option<&str>, language: &str) -> String {
    let language = language_name(language);
    let document_type = non_blank(document_type.unwrap_or_default(), DEFAULT_DOCUMENT_TYPE);

    format!(
        r#"You are a legal scenario generator. Create realistic, practical scenarios that help users understand the consequences of legal clauses.

Generate 3 different scenarios for the given clause. Respond with ONLY a valid JSON object:

{{
  "scenarios": [
    {{
      "id": "scenario_1",
      "title": "Descriptive scenario title",
      "situation": "Realistic situation description",
      "trigger": "What causes this scenario",
      "consequences": ["consequence 1", "consequence 2", "consequence 3"],
      "severity": "low|medium|high",
      "likelihood": "low|medium|high",
      "prevention": "How to avoid this scenario",
      "proTip": "Practical advice for users"
    }}
  ]
}}

Clause to analyze: "{clause}"
Document type: "{document_type}"

IMPORTANT: Generate scenarios in {language} language. Make them practical and easy to understand."#
    )
}

pub fn build_quiz_prompt(document_text: &str, difficulty: &str, language: &str) -> String {
    let language = language_name(language);
    let excerpt = truncate_chars(document_text, env::prompt::QUIZ_EXCERPT_LIMIT);

    format!(
        r#"You are a legal education quiz generator. Create educational quiz questions based on the legal document to help users learn and test their understanding.

Generate 5 quiz questions of varying types. Respond with ONLY a valid JSON object:

{{
  "quiz": {{
    "title": "Legal Document Quiz",
    "difficulty": "{difficulty}",
    "questions": [
      {{
        "id": "q1",
        "type": "multiple_choice|true_false|fill_blank",
        "question": "Question text",
        "options": ["option 1", "option 2", "option 3", "option 4"],
        "correctAnswer": "correct option or index",
        "explanation": "Why this is the correct answer",
        "points": 10,
        "category": "terms|clauses|obligations|rights"
      }}
    ]
  }}
}}

Document excerpt: "{excerpt}..."
Difficulty level: {difficulty}

IMPORTANT: Generate quiz in {language} language. Focus on practical understanding, not memorization."#
    )
}

fn non_blank<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.trim().is_empty() {
        default
    } else {
        value
    }
}

/// Take at most `limit` characters, never splitting a code point.
fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_names() {
        assert_eq!(language_name("en"), "English");
        assert_eq!(language_name("HI"), "Hindi");
        assert_eq!(language_name(""), "English");
        assert_eq!(language_name("Klingon"), "Klingon");
    }

    #[test]
    fn test_prompts_are_deterministic_and_name_the_language() {
        let requests = [
            OperationRequest::analyze("The tenant shall pay rent.", "lease", "es"),
            OperationRequest::explain_term("escrow", None, None, "fr"),
            OperationRequest::generate_scenarios("Late fees apply.", Some("lease".into()), "de"),
            OperationRequest::generate_quiz("Some document text", "hard", "ja"),
        ];
        let expected = ["Spanish", "French", "German", "Japanese"];

        for (request, language) in requests.iter().zip(expected) {
            let first = build_prompt(request);
            let second = build_prompt(request);
            assert_eq!(first, second);
            assert!(first.contains(language), "prompt missing {}", language);
            assert!(first.contains("ONLY a valid JSON object"));
        }
    }

    #[test]
    fn test_analysis_prompt_embeds_schema_and_text() {
        let prompt = build_analysis_prompt("short lease text", "lease", "en");
        for section in ["\"summary\"", "\"keyInformation\"", "\"riskAssessment\"", "\"actionPlan\""] {
            assert!(prompt.contains(section));
        }
        assert!(prompt.ends_with("short lease text"));
        assert!(prompt.contains("Document type: \"lease\""));
    }

    #[test]
    fn test_term_prompt_defaults() {
        let prompt = build_term_explanation_prompt("indemnity", Some("  "), None, "en");
        assert!(prompt.contains("Context: \"General legal context\""));
        assert!(prompt.contains("Document type: \"legal document\""));
        assert!(prompt.contains("\"term\": \"indemnity\""));
    }

    #[test]
    fn test_quiz_excerpt_is_truncated() {
        let long_text = "a".repeat(5000);
        let prompt = build_quiz_prompt(&long_text, "medium", "en");

        let excerpt = format!("\"{}...\"", "a".repeat(2000));
        assert!(prompt.contains(&excerpt));
        assert!(!prompt.contains(&"a".repeat(2001)));
        assert!(prompt.contains("Difficulty level: medium"));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
