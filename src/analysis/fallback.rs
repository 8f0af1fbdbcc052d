//! Deterministic, network-free results.
//!
//! [`generate_fallback_analysis`] builds a schema-complete [`AnalysisResult`]
//! from simple text heuristics. It is the terminal step of the provider chain
//! and the whole of offline mode. [`OperationResult::degraded`] picks the
//! canonical degraded value for any operation kind.

use crate::analysis::types::{
    ActionItem, AnalysisResult, KeyDate, KeyInformation, Level, MonetaryAmount, OperationRequest,
    OperationResult, Quiz, QuizBody, QuizQuestion, RedFlag, RiskAssessment, Scenario, ScenarioSet,
    Summary, TermExplanation,
};
use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

const EMPTY_CONFIDENCE: f64 = 0.1;
const HEURISTIC_CONFIDENCE: f64 = 0.3;
const MAX_KEY_POINT_SENTENCES: usize = 3;
const MAX_OBLIGATIONS: usize = 5;
const SENTENCE_CLIP: usize = 200;
const ORIGINAL_TEXT_CLIP: usize = 300;

static RE_SENTENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)[^\n]+?(?:[.!?]+(?:[ \t]+|$)|$)").unwrap());

static RE_PARTY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(Landlord|Tenant|Lessor|Lessee|Employer|Employee|Buyer|Seller|Purchaser|Vendor|Licensor|Licensee|Contractor|Client|Customer|Provider|Borrower|Lender|Consultant|Guarantor)s?\b",
    )
    .unwrap()
});

static RE_ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").unwrap());

static RE_WRITTEN_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(January|February|March|April|May|June|July|August|September|October|November|December)\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4})\b",
    )
    .unwrap()
});

static RE_SYMBOL_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([$€£])\s?(\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?)").unwrap()
});

static RE_CODE_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?)\s?(USD|EUR|GBP|INR|CAD|AUD|JPY|CHF)\b")
        .unwrap()
});

static RE_OBLIGATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(shall|must|agrees? to|(?:is|are) responsible for)\b").unwrap()
});

struct RedFlagRule {
    pattern: Regex,
    clause: &'static str,
    risk: &'static str,
    severity: Level,
    explanation: &'static str,
}

fn rule(
    pattern: &str,
    clause: &'static str,
    risk: &'static str,
    severity: Level,
    explanation: &'static str,
) -> RedFlagRule {
    RedFlagRule {
        pattern: Regex::new(pattern).unwrap(),
        clause,
        risk,
        severity,
        explanation,
    }
}

static RED_FLAG_RULES: LazyLock<Vec<RedFlagRule>> = LazyLock::new(|| {
    vec![
        rule(
            r"(?i)\bautomatic(?:ally)?\s+renew",
            "Automatic renewal",
            "The agreement may renew without any action from you",
            Level::High,
            "You could be bound to another term unless you cancel in time.",
        ),
        rule(
            r"(?i)\bnon-?refundable\b",
            "Non-refundable payment",
            "Money you pay may never be returned",
            Level::High,
            "You may lose this money even if the agreement ends early.",
        ),
        rule(
            r"(?i)\b(?:penalt(?:y|ies)|late fees?)\b",
            "Penalties and late fees",
            "Extra charges apply if you miss a deadline",
            Level::Medium,
            "Small delays can become expensive.",
        ),
        rule(
            r"(?i)\bterminat(?:e|ed|es|ion)\b",
            "Termination",
            "The agreement can be ended under conditions that may not favor you",
            Level::Medium,
            "Check who can end the agreement, how much notice is needed and what it costs.",
        ),
        rule(
            r"(?i)\bindemnif(?:y|ies|ication)\b",
            "Indemnification",
            "You may have to cover the other party's losses",
            Level::High,
            "Indemnity clauses can make you pay legal costs and damages you did not cause.",
        ),
        rule(
            r"(?i)\bwaive(?:s|r)?\b",
            "Waiver of rights",
            "You may be giving up rights you would otherwise have",
            Level::Medium,
            "Once waived, a right is usually hard to get back.",
        ),
        rule(
            r"(?i)\barbitration\b",
            "Mandatory arbitration",
            "Disputes may have to be settled privately instead of in court",
            Level::Medium,
            "Arbitration limits appeals and can be costly.",
        ),
        rule(
            r"(?i)\bliab(?:le|ility)\b",
            "Liability",
            "Responsibility for losses may be shifted or limited",
            Level::Medium,
            "Liability terms decide who pays when something goes wrong.",
        ),
    ]
});

/// A sentence and its byte span in the source text.
struct Sentence<'a> {
    start: usize,
    end: usize,
    text: &'a str,
}

/// Build a generic but complete analysis without any provider.
pub fn generate_fallback_analysis(text: &str, document_type: &str) -> AnalysisResult {
    let text = text.trim();
    let document_type = match document_type.trim() {
        "" => "document",
        other => other,
    };

    let sentences = split_sentences(text);
    let parties = find_parties(text);
    let dates = find_dates(text, &sentences);
    let monetary_amounts = find_amounts(text, &sentences);
    let obligations = sentences
        .iter()
        .filter(|s| RE_OBLIGATION.is_match(s.text))
        .take(MAX_OBLIGATIONS)
        .map(|s| clip(s.text, SENTENCE_CLIP))
        .collect();
    let red_flags = find_red_flags(&sentences);

    let overall_risk = if red_flags.iter().any(|f| f.severity == Level::High) {
        Level::High
    } else if red_flags.is_empty() {
        Level::Low
    } else {
        Level::Medium
    };

    let summary = build_summary(text, document_type, &sentences, &parties);
    let recommendations = build_recommendations(document_type, &red_flags);
    let action_plan = build_action_plan(document_type, &red_flags, !dates.is_empty());

    AnalysisResult {
        summary,
        key_information: KeyInformation {
            parties,
            dates,
            monetary_amounts,
            obligations,
        },
        risk_assessment: RiskAssessment {
            overall_risk,
            red_flags,
            recommendations,
        },
        action_plan,
        interactive_terms: None,
        clause_simplifications: None,
        contract_visualization: None,
        real_life_scenarios: None,
        smart_glossary: None,
    }
}

fn split_sentences(text: &str) -> Vec<Sentence<'_>> {
    RE_SENTENCE
        .find_iter(text)
        .filter_map(|m| {
            let trimmed = m.as_str().trim();
            trimmed
                .chars()
                .any(char::is_alphanumeric)
                .then_some(Sentence {
                    start: m.start(),
                    end: m.end(),
                    text: trimmed,
                })
        })
        .collect()
}

fn sentence_at<'a>(sentences: &[Sentence<'a>], position: usize) -> &'a str {
    sentences
        .iter()
        .find(|s| s.start <= position && position < s.end)
        .map(|s| s.text)
        .unwrap_or_default()
}

fn find_parties(text: &str) -> Vec<String> {
    let mut parties: Vec<String> = Vec::new();
    for captures in RE_PARTY.captures_iter(text) {
        let role = &captures[1];
        if !parties.iter().any(|p| p == role) {
            parties.push(role.to_string());
        }
    }
    parties
}

fn find_dates(text: &str, sentences: &[Sentence<'_>]) -> Vec<KeyDate> {
    let mut found: Vec<(usize, NaiveDate)> = Vec::new();

    for captures in RE_ISO_DATE.captures_iter(text) {
        let parsed = NaiveDate::from_ymd_opt(
            captures[1].parse().unwrap_or_default(),
            captures[2].parse().unwrap_or_default(),
            captures[3].parse().unwrap_or_default(),
        );
        if let (Some(date), Some(m)) = (parsed, captures.get(0)) {
            found.push((m.start(), date));
        }
    }

    for captures in RE_WRITTEN_DATE.captures_iter(text) {
        let parsed = NaiveDate::from_ymd_opt(
            captures[3].parse().unwrap_or_default(),
            month_number(&captures[1]),
            captures[2].parse().unwrap_or_default(),
        );
        if let (Some(date), Some(m)) = (parsed, captures.get(0)) {
            found.push((m.start(), date));
        }
    }

    found.sort_by_key(|(position, _)| *position);

    let mut dates: Vec<KeyDate> = Vec::new();
    for (position, date) in found {
        let date = date.format("%Y-%m-%d").to_string();
        if dates.iter().any(|d| d.date == date) {
            continue;
        }
        let (description, importance) = describe_date(sentence_at(sentences, position));
        dates.push(KeyDate {
            date,
            description: description.to_string(),
            importance,
        });
    }
    dates
}

fn month_number(name: &str) -> u32 {
    match name {
        "January" => 1,
        "February" => 2,
        "March" => 3,
        "April" => 4,
        "May" => 5,
        "June" => 6,
        "July" => 7,
        "August" => 8,
        "September" => 9,
        "October" => 10,
        "November" => 11,
        "December" => 12,
        _ => 0,
    }
}

fn describe_date(sentence: &str) -> (&'static str, Level) {
    let lower = sentence.to_lowercase();
    if lower.contains("terminat") || lower.contains("expir") || lower.contains(" end") {
        ("Termination or expiry date", Level::High)
    } else if lower.contains("due") || lower.contains("deadline") || lower.contains("no later than") {
        ("Payment or deadline date", Level::High)
    } else if ["effective", "commence", "start", "begin", "made", "dated"]
        .iter()
        .any(|word| lower.contains(word))
    {
        ("Start or effective date", Level::Medium)
    } else {
        ("Date mentioned in the document", Level::Medium)
    }
}

fn find_amounts(text: &str, sentences: &[Sentence<'_>]) -> Vec<MonetaryAmount> {
    let mut found: Vec<(usize, String, String)> = Vec::new();

    for captures in RE_SYMBOL_AMOUNT.captures_iter(text) {
        let currency = match &captures[1] {
            "€" => "EUR",
            "£" => "GBP",
            _ => "USD",
        };
        if let Some(m) = captures.get(0) {
            found.push((m.start(), m.as_str().to_string(), currency.to_string()));
        }
    }
    for captures in RE_CODE_AMOUNT.captures_iter(text) {
        if let Some(m) = captures.get(0) {
            found.push((m.start(), m.as_str().to_string(), captures[2].to_string()));
        }
    }

    found.sort_by_key(|(position, _, _)| *position);
    found
        .into_iter()
        .map(|(position, amount, currency)| {
            let (amount_type, description) = classify_amount(sentence_at(sentences, position));
            MonetaryAmount {
                amount,
                currency,
                description: description.to_string(),
                amount_type: amount_type.to_string(),
            }
        })
        .collect()
}

fn classify_amount(sentence: &str) -> (&'static str, &'static str) {
    let lower = sentence.to_lowercase();
    if lower.contains("deposit") {
        ("deposit", "Deposit")
    } else if lower.contains("penalt") || lower.contains("late fee") || lower.contains("fine") {
        ("penalty", "Penalty or late charge")
    } else if lower.contains("fee") {
        ("fee", "Fee")
    } else {
        ("payment", "Payment")
    }
}

fn find_red_flags(sentences: &[Sentence<'_>]) -> Vec<RedFlag> {
    RED_FLAG_RULES
        .iter()
        .filter_map(|rule| {
            let sentence = sentences.iter().find(|s| rule.pattern.is_match(s.text))?;
            Some(RedFlag {
                clause: rule.clause.to_string(),
                risk: rule.risk.to_string(),
                severity: rule.severity,
                explanation: rule.explanation.to_string(),
                original_text: clip(sentence.text, ORIGINAL_TEXT_CLIP),
            })
        })
        .collect()
}

fn build_summary(
    text: &str,
    document_type: &str,
    sentences: &[Sentence<'_>],
    parties: &[String],
) -> Summary {
    if text.is_empty() {
        return Summary {
            tldr: format!(
                "No readable text was provided for this {document_type}, so it could not be analyzed automatically."
            ),
            key_points: vec![format!(
                "Provide the full text of the {document_type} to get a detailed analysis"
            )],
            confidence: EMPTY_CONFIDENCE,
        };
    }

    let words = text.split_whitespace().count();
    let mut tldr = format!(
        "This {document_type} of about {words} words was reviewed with basic offline checks only."
    );
    if !parties.is_empty() {
        tldr.push_str(&format!(" It appears to involve: {}.", parties.join(", ")));
    }

    let mut key_points: Vec<String> = sentences
        .iter()
        .take(MAX_KEY_POINT_SENTENCES)
        .map(|s| clip(s.text, SENTENCE_CLIP))
        .collect();
    key_points.push(format!(
        "Have a qualified professional review this {document_type} before relying on it"
    ));

    Summary {
        tldr,
        key_points,
        confidence: HEURISTIC_CONFIDENCE,
    }
}

fn build_recommendations(document_type: &str, red_flags: &[RedFlag]) -> Vec<String> {
    let mut recommendations = vec![format!(
        "Read the entire {document_type} carefully before signing"
    )];
    recommendations.extend(red_flags.iter().map(|flag| {
        format!(
            "Ask for clarification on the {} terms before agreeing",
            flag.clause.to_lowercase()
        )
    }));
    recommendations
        .push("Consult a qualified legal professional for advice on your situation".to_string());
    recommendations
}

fn build_action_plan(document_type: &str, red_flags: &[RedFlag], has_dates: bool) -> Vec<ActionItem> {
    let mut tasks: Vec<(String, Level, Option<String>)> = vec![(
        format!("Read the full {document_type} carefully"),
        Level::High,
        Some("Before signing".to_string()),
    )];

    tasks.extend(
        red_flags
            .iter()
            .filter(|flag| flag.severity == Level::High)
            .map(|flag| (format!("Review the {} clause", flag.clause.to_lowercase()), Level::High, None)),
    );
    if has_dates {
        tasks.push(("Add the key dates to your calendar".to_string(), Level::Medium, None));
    }
    tasks.push((
        "Consult a legal professional if anything is unclear".to_string(),
        Level::Medium,
        None,
    ));

    tasks
        .into_iter()
        .enumerate()
        .map(|(index, (task, priority, deadline))| ActionItem {
            id: (index + 1).to_string(),
            task,
            priority,
            deadline,
            completed: false,
        })
        .collect()
}

/// Limit text to `limit` characters, marking the cut with an ellipsis.
fn clip(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((byte_index, _)) => format!("{}...", text[..byte_index].trim_end()),
        None => text.to_string(),
    }
}

impl OperationResult {
    /// Canonical degraded value returned when no provider produced a result.
    pub fn degraded(request: &OperationRequest) -> Self {
        match request {
            OperationRequest::Analyze {
                text,
                document_type,
                ..
            } => OperationResult::Analysis(Box::new(generate_fallback_analysis(text, document_type))),
            OperationRequest::ExplainTerm { term, .. } => {
                OperationResult::TermExplanation(TermExplanation::degraded(term))
            }
            OperationRequest::GenerateScenarios { .. } => {
                OperationResult::Scenarios(ScenarioSet::degraded())
            }
            OperationRequest::GenerateQuiz { .. } => OperationResult::Quiz(Quiz::degraded()),
        }
    }
}

impl TermExplanation {
    pub fn degraded(term: &str) -> Self {
        Self {
            term: term.to_string(),
            definition: "This appears to be a legal term. Please consult a legal professional for accurate definition.".to_string(),
            category: Some("legal".to_string()),
            complexity: Some("intermediate".to_string()),
            ..Default::default()
        }
    }
}

impl ScenarioSet {
    pub fn degraded() -> Self {
        Self {
            scenarios: vec![Scenario {
                id: "fallback_1".to_string(),
                title: "General Scenario".to_string(),
                situation: "This clause may have legal implications".to_string(),
                consequences: vec!["Consult a legal professional for specific advice".to_string()],
                severity: Some(Level::Medium),
                ..Default::default()
            }],
        }
    }
}

impl Quiz {
    pub fn degraded() -> Self {
        Self {
            quiz: QuizBody {
                title: "Basic Legal Quiz".to_string(),
                difficulty: None,
                questions: vec![QuizQuestion {
                    id: "q1".to_string(),
                    question_type: "multiple_choice".to_string(),
                    question: "What should you do when reviewing a legal document?".to_string(),
                    options: ["Sign immediately", "Read carefully", "Ignore it", "Guess the meaning"]
                        .into_iter()
                        .map(String::from)
                        .collect(),
                    correct_answer: serde_json::Value::String("Read carefully".to_string()),
                    explanation: "Always read legal documents carefully before signing.".to_string(),
                    points: 10,
                    category: None,
                }],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::types::OperationKind;

    const LEASE: &str = "This Lease Agreement is made between the Landlord and the Tenant on January 5, 2025. \
The Tenant shall pay rent of $1,200.00 per month. \
A security deposit of $2,400 is non-refundable. \
The lease will automatically renew unless terminated with 30 days notice. \
Late fees of 50 USD apply after 2025-02-05.";

    #[test]
    fn test_empty_input_has_every_section() {
        let analysis = generate_fallback_analysis("", "document");
        let json = serde_json::to_value(&analysis).unwrap();

        for section in AnalysisResult::REQUIRED_SECTIONS {
            assert!(!json[section].is_null(), "{section} is null");
        }
        assert!(!analysis.summary.tldr.is_empty());
        assert!(json["actionPlan"].is_array());
        assert_eq!(analysis.summary.confidence, EMPTY_CONFIDENCE);
        assert_eq!(analysis.risk_assessment.overall_risk, Level::Low);
    }

    #[test]
    fn test_is_deterministic() {
        assert_eq!(
            generate_fallback_analysis(LEASE, "lease"),
            generate_fallback_analysis(LEASE, "lease")
        );
    }

    #[test]
    fn test_extracts_parties_and_dates() {
        let analysis = generate_fallback_analysis(LEASE, "lease");
        let info = &analysis.key_information;

        assert_eq!(info.parties, vec!["Landlord", "Tenant"]);
        let dates: Vec<_> = info.dates.iter().map(|d| d.date.as_str()).collect();
        assert_eq!(dates, vec!["2025-01-05", "2025-02-05"]);
        assert_eq!(info.dates[0].description, "Start or effective date");
        assert!(analysis.summary.tldr.contains("Landlord, Tenant"));
    }

    #[test]
    fn test_classifies_amounts() {
        let analysis = generate_fallback_analysis(LEASE, "lease");
        let amounts: Vec<_> = analysis
            .key_information
            .monetary_amounts
            .iter()
            .map(|a| (a.amount.as_str(), a.currency.as_str(), a.amount_type.as_str()))
            .collect();

        assert_eq!(
            amounts,
            vec![
                ("$1,200.00", "USD", "payment"),
                ("$2,400", "USD", "deposit"),
                ("50 USD", "USD", "penalty"),
            ]
        );
    }

    #[test]
    fn test_obligations_and_red_flags() {
        let analysis = generate_fallback_analysis(LEASE, "lease");
        assert_eq!(
            analysis.key_information.obligations,
            vec!["The Tenant shall pay rent of $1,200.00 per month."]
        );

        let clauses: Vec<_> = analysis
            .risk_assessment
            .red_flags
            .iter()
            .map(|f| f.clause.as_str())
            .collect();
        assert_eq!(
            clauses,
            vec!["Automatic renewal", "Non-refundable payment", "Penalties and late fees", "Termination"]
        );
        assert_eq!(analysis.risk_assessment.overall_risk, Level::High);
    }

    #[test]
    fn test_action_plan_follows_findings() {
        let analysis = generate_fallback_analysis(LEASE, "lease");
        let tasks: Vec<_> = analysis.action_plan.iter().map(|a| a.task.as_str()).collect();

        assert_eq!(
            tasks,
            vec![
                "Read the full lease carefully",
                "Review the automatic renewal clause",
                "Review the non-refundable payment clause",
                "Add the key dates to your calendar",
                "Consult a legal professional if anything is unclear",
            ]
        );
        let ids: Vec<_> = analysis.action_plan.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);
    }

    #[test]
    fn test_invalid_dates_are_ignored() {
        let analysis = generate_fallback_analysis("Due on 2025-13-45 or February 30, 2024.", "");
        assert!(analysis.key_information.dates.is_empty());
        assert!(analysis.summary.tldr.contains("document"));
    }

    #[test]
    fn test_degraded_values_per_kind() {
        let requests = [
            OperationRequest::analyze("short lease text", "lease", "en"),
            OperationRequest::explain_term("easement", None, None, "en"),
            OperationRequest::generate_scenarios("clause", None, "en"),
            OperationRequest::generate_quiz("text", "hard", "en"),
        ];

        for request in &requests {
            let degraded = OperationResult::degraded(request);
            assert_eq!(degraded.kind(), request.kind());
        }

        let OperationResult::TermExplanation(term) = OperationResult::degraded(&requests[1]) else {
            panic!("expected term explanation");
        };
        assert_eq!(term.term, "easement");
        assert_eq!(term.complexity.as_deref(), Some("intermediate"));

        let OperationResult::Quiz(quiz) = OperationResult::degraded(&requests[3]) else {
            panic!("expected quiz");
        };
        assert_eq!(quiz.quiz.questions[0].correct_answer, "Read carefully");
        assert_eq!(quiz.quiz.questions[0].points, 10);

        let scenarios = serde_json::to_value(OperationResult::degraded(&requests[2])).unwrap();
        assert_eq!(scenarios["scenarios"][0]["id"], "fallback_1");
        assert_eq!(scenarios["scenarios"][0]["severity"], "medium");
        assert_eq!(requests[2].kind(), OperationKind::GenerateScenarios);
    }
}
