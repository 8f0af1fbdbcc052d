use crate::llm::LLMError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// The four operations the orchestrator can run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Analyze,
    ExplainTerm,
    GenerateScenarios,
    GenerateQuiz,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Analyze => "analyze",
            OperationKind::ExplainTerm => "explain_term",
            OperationKind::GenerateScenarios => "generate_scenarios",
            OperationKind::GenerateQuiz => "generate_quiz",
        }
    }

    /// Whether a failure on this kind disables the provider for later calls
    pub fn trips_breaker(&self) -> bool {
        matches!(self, OperationKind::Analyze)
    }

    /// Top-level fields a response must carry to be accepted
    pub fn required_fields(&self, mode: ValidationMode) -> &'static [&'static str] {
        match (self, mode) {
            (OperationKind::Analyze, _) => &AnalysisResult::REQUIRED_SECTIONS,
            (_, ValidationMode::FullAnalysisOnly) => &[],
            (OperationKind::ExplainTerm, ValidationMode::Uniform) => &["term", "definition"],
            (OperationKind::GenerateScenarios, ValidationMode::Uniform) => &["scenarios"],
            (OperationKind::GenerateQuiz, ValidationMode::Uniform) => &["quiz"],
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How strictly non-analysis responses are checked
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValidationMode {
    /// Only full analysis results need their mandatory sections
    #[default]
    FullAnalysisOnly,
    /// Every result kind is checked against its own required fields
    Uniform,
}

/// A request for one operation, carrying that operation's parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum OperationRequest {
    Analyze {
        text: String,
        document_type: String,
        language: String,
    },
    ExplainTerm {
        term: String,
        context: Option<String>,
        document_type: Option<String>,
        language: String,
    },
    GenerateScenarios {
        clause: String,
        document_type: Option<String>,
        language: String,
    },
    GenerateQuiz {
        document_text: String,
        difficulty: String,
        language: String,
    },
}

impl OperationRequest {
    pub fn analyze(
        text: impl Into<String>,
        document_type: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        OperationRequest::Analyze {
            text: text.into(),
            document_type: document_type.into(),
            language: language.into(),
        }
    }

    pub fn explain_term(
        term: impl Into<String>,
        context: Option<String>,
        document_type: Option<String>,
        language: impl Into<String>,
    ) -> Self {
        OperationRequest::ExplainTerm {
            term: term.into(),
            context,
            document_type,
            language: language.into(),
        }
    }

    pub fn generate_scenarios(
        clause: impl Into<String>,
        document_type: Option<String>,
        language: impl Into<String>,
    ) -> Self {
        OperationRequest::GenerateScenarios {
            clause: clause.into(),
            document_type,
            language: language.into(),
        }
    }

    pub fn generate_quiz(
        document_text: impl Into<String>,
        difficulty: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        OperationRequest::GenerateQuiz {
            document_text: document_text.into(),
            difficulty: difficulty.into(),
            language: language.into(),
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            OperationRequest::Analyze { .. } => OperationKind::Analyze,
            OperationRequest::ExplainTerm { .. } => OperationKind::ExplainTerm,
            OperationRequest::GenerateScenarios { .. } => OperationKind::GenerateScenarios,
            OperationRequest::GenerateQuiz { .. } => OperationKind::GenerateQuiz,
        }
    }

    pub fn language(&self) -> &str {
        match self {
            OperationRequest::Analyze { language, .. }
            | OperationRequest::ExplainTerm { language, .. }
            | OperationRequest::GenerateScenarios { language, .. }
            | OperationRequest::GenerateQuiz { language, .. } => language,
        }
    }
}

/// Result of one operation, tagged by kind
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OperationResult {
    Analysis(Box<AnalysisResult>),
    TermExplanation(TermExplanation),
    Scenarios(ScenarioSet),
    Quiz(Quiz),
}

impl OperationResult {
    pub fn kind(&self) -> OperationKind {
        match self {
            OperationResult::Analysis(_) => OperationKind::Analyze,
            OperationResult::TermExplanation(_) => OperationKind::ExplainTerm,
            OperationResult::Scenarios(_) => OperationKind::GenerateScenarios,
            OperationResult::Quiz(_) => OperationKind::GenerateQuiz,
        }
    }

    /// Deserialize a parsed response into the shape expected for `kind`.
    pub fn from_value(kind: OperationKind, value: serde_json::Value) -> serde_json::Result<Self> {
        Ok(match kind {
            OperationKind::Analyze => {
                let mut analysis: AnalysisResult = serde_json::from_value(value)?;
                analysis.summary.confidence = analysis.summary.confidence.clamp(0.0, 1.0);
                OperationResult::Analysis(Box::new(analysis))
            }
            OperationKind::ExplainTerm => {
                OperationResult::TermExplanation(serde_json::from_value(value)?)
            }
            OperationKind::GenerateScenarios => {
                OperationResult::Scenarios(serde_json::from_value(value)?)
            }
            OperationKind::GenerateQuiz => OperationResult::Quiz(serde_json::from_value(value)?),
        })
    }
}

/// Three-step scale used for risk, severity, priority and importance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    #[default]
    Medium,
    High,
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(raw) => Level::parse_lenient(&raw),
            serde_json::Value::Number(n) => Level::from_rank(n.as_f64().unwrap_or(2.0)),
            _ => Level::Medium,
        })
    }
}

impl Level {
    /// Case-insensitive parse; anything unrecognized is treated as medium.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Level::Low,
            "high" | "critical" => Level::High,
            _ => Level::Medium,
        }
    }

    /// Numeric ranks on a 1 to 3 scale.
    pub fn from_rank(rank: f64) -> Self {
        if rank < 1.5 {
            Level::Low
        } else if rank < 2.5 {
            Level::Medium
        } else {
            Level::High
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Level::Low => "low",
            Level::Medium => "medium",
            Level::High => "high",
        })
    }
}

/// Field readers for model output, which drifts between scalars and lists
/// and between numbers and numeric strings.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn scalar_text(value: Value) -> Option<String> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(s),
            Value::Array(items) => {
                let parts: Vec<String> = items.into_iter().filter_map(scalar_text).collect();
                (!parts.is_empty()).then(|| parts.join("; "))
            }
            other => Some(other.to_string()),
        }
    }

    fn numeric(value: &Value) -> Option<f64> {
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
            _ => None,
        };
        parsed.filter(|n| n.is_finite())
    }

    pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(scalar_text(Value::deserialize(deserializer)?).unwrap_or_default())
    }

    pub fn opt_string<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        Ok(scalar_text(Value::deserialize(deserializer)?).filter(|s| !s.trim().is_empty()))
    }

    /// A bare string becomes a one-element list.
    pub fn strings<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Array(items) => items.into_iter().filter_map(scalar_text).collect(),
            other => scalar_text(other)
                .filter(|s| !s.trim().is_empty())
                .into_iter()
                .collect(),
        })
    }

    /// Entries that do not fit `T` are dropped; a lone object is one entry.
    pub fn items<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: serde::de::DeserializeOwned,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
            object @ Value::Object(_) => serde_json::from_value(object).into_iter().collect(),
            _ => Vec::new(),
        })
    }

    pub fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(numeric(&Value::deserialize(deserializer)?).unwrap_or_default())
    }

    pub fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        let value = numeric(&Value::deserialize(deserializer)?).unwrap_or_default();
        Ok(value.round().clamp(0.0, u32::MAX as f64) as u32)
    }

    pub fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Bool(b) => b,
            Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "yes"),
            Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
            _ => false,
        })
    }
}

/// Full structured analysis of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub summary: Summary,
    pub key_information: KeyInformation,
    pub risk_assessment: RiskAssessment,
    #[serde(deserialize_with = "lenient::items")]
    pub action_plan: Vec<ActionItem>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interactive_terms: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clause_simplifications: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_visualization: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_life_scenarios: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smart_glossary: Option<serde_json::Value>,
}

impl AnalysisResult {
    /// Sections that must be present for a result to be accepted
    pub const REQUIRED_SECTIONS: [&'static str; 4] =
        ["summary", "keyInformation", "riskAssessment", "actionPlan"];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Summary {
    #[serde(deserialize_with = "lenient::string")]
    pub tldr: String,
    #[serde(deserialize_with = "lenient::strings")]
    pub key_points: Vec<String>,
    #[serde(deserialize_with = "lenient::number")]
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeyInformation {
    #[serde(deserialize_with = "lenient::strings")]
    pub parties: Vec<String>,
    #[serde(deserialize_with = "lenient::items")]
    pub dates: Vec<KeyDate>,
    #[serde(deserialize_with = "lenient::items")]
    pub monetary_amounts: Vec<MonetaryAmount>,
    #[serde(deserialize_with = "lenient::strings")]
    pub obligations: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeyDate {
    #[serde(deserialize_with = "lenient::string")]
    pub date: String,
    #[serde(deserialize_with = "lenient::string")]
    pub description: String,
    pub importance: Level,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MonetaryAmount {
    #[serde(deserialize_with = "lenient::string")]
    pub amount: String,
    #[serde(deserialize_with = "lenient::string")]
    pub currency: String,
    #[serde(deserialize_with = "lenient::string")]
    pub description: String,
    #[serde(rename = "type", deserialize_with = "lenient::string")]
    pub amount_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RiskAssessment {
    pub overall_risk: Level,
    #[serde(deserialize_with = "lenient::items")]
    pub red_flags: Vec<RedFlag>,
    #[serde(deserialize_with = "lenient::strings")]
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RedFlag {
    #[serde(deserialize_with = "lenient::string")]
    pub clause: String,
    #[serde(deserialize_with = "lenient::string")]
    pub risk: String,
    pub severity: Level,
    #[serde(deserialize_with = "lenient::string")]
    pub explanation: String,
    #[serde(deserialize_with = "lenient::string")]
    pub original_text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActionItem {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub task: String,
    pub priority: Level,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub deadline: Option<String>,
    #[serde(deserialize_with = "lenient::flag")]
    pub completed: bool,
}

/// Explanation of a single legal term
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TermExplanation {
    #[serde(deserialize_with = "lenient::string")]
    pub term: String,
    #[serde(deserialize_with = "lenient::string")]
    pub definition: String,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub contextual_definition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub complexity: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "lenient::strings")]
    pub examples: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "lenient::strings")]
    pub related_terms: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub consequences: Option<String>,
}

/// What-if scenarios for a clause
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioSet {
    #[serde(deserialize_with = "lenient::items")]
    pub scenarios: Vec<Scenario>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Scenario {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(deserialize_with = "lenient::string")]
    pub situation: String,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub trigger: Option<String>,
    #[serde(deserialize_with = "lenient::strings")]
    pub consequences: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Level>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likelihood: Option<Level>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub prevention: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub pro_tip: Option<String>,
}

/// Comprehension quiz built from a document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Quiz {
    pub quiz: QuizBody,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizBody {
    #[serde(deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub difficulty: Option<String>,
    #[serde(deserialize_with = "lenient::items")]
    pub questions: Vec<QuizQuestion>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuizQuestion {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(rename = "type", deserialize_with = "lenient::string")]
    pub question_type: String,
    #[serde(deserialize_with = "lenient::string")]
    pub question: String,
    #[serde(deserialize_with = "lenient::strings")]
    pub options: Vec<String>,
    /// Either the answer text or an option index
    pub correct_answer: serde_json::Value,
    #[serde(deserialize_with = "lenient::string")]
    pub explanation: String,
    #[serde(deserialize_with = "lenient::count")]
    pub points: u32,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub category: Option<String>,
}

/// Why a provider attempt was rejected
#[derive(Debug, Clone, thiserror::Error)]
pub enum AnalysisError {
    #[error("Provider call failed: {0}")]
    Provider(#[from] LLMError),
    #[error("Could not parse provider output: {0}")]
    Parse(String),
    #[error("Incomplete {kind} result, missing: {}", .missing.join(", "))]
    Validation {
        kind: OperationKind,
        missing: Vec<String>,
    },
}

/// One rejected attempt, recorded in chain order
#[derive(Debug, Clone, Serialize)]
pub struct ProviderFailure {
    pub provider: String,
    #[serde(serialize_with = "serialize_display")]
    pub error: AnalysisError,
}

fn serialize_display<T: fmt::Display, S: serde::Serializer>(
    value: &T,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// Where an accepted result came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "name", rename_all = "snake_case")]
pub enum ResultSource {
    Provider(String),
    StaticFallback,
}

/// Outcome of a single orchestrated call
#[derive(Debug, Clone, Serialize)]
pub struct InvocationOutcome {
    pub result: OperationResult,
    pub source: ResultSource,
    pub failures: Vec<ProviderFailure>,
}

impl InvocationOutcome {
    pub fn is_fallback(&self) -> bool {
        self.source == ResultSource::StaticFallback
    }
}
