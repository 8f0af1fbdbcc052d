//! Runs a parsed command against a [`DocumentAssistant`]
//!
//! Kept out of `main` so the path from flags to provider prompt can be
//! exercised in tests with a scripted provider chain.

use crate::cli::args::{ExecutionMode, InputSource};
use crate::extraction::ExtractedDocument;
use crate::integration::{DocumentAssistant, RetryPolicy};
use crate::InvocationOutcome;
use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::io::{self, Read};

/// What a command produced, ready to be printed as JSON
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CommandOutput {
    Outcome(Box<InvocationOutcome>),
    Document(ExtractedDocument),
}

impl CommandOutput {
    /// The JSON printed on stdout; `verbose` keeps the source and failures.
    pub fn to_json(&self, verbose: bool) -> serde_json::Result<String> {
        match self {
            CommandOutput::Outcome(outcome) if !verbose => {
                serde_json::to_string_pretty(&outcome.result)
            }
            other => serde_json::to_string_pretty(other),
        }
    }
}

/// Execute every mode except `ShowConfig`, which needs no assistant.
pub async fn execute(assistant: &DocumentAssistant, mode: ExecutionMode) -> Result<CommandOutput> {
    let outcome = match mode {
        ExecutionMode::Analyze(input) => {
            let text = read_input(assistant, &input).await?;
            assistant.analyze(&text, None, None).await
        }
        ExecutionMode::Explain {
            term,
            context,
            document_type,
        } => {
            assistant
                .explain_term(&term, context.as_deref(), document_type.as_deref(), None)
                .await
        }
        ExecutionMode::Scenarios {
            clause,
            document_type,
        } => {
            assistant
                .generate_scenarios(&clause, document_type.as_deref(), None)
                .await
        }
        ExecutionMode::Quiz(input) => {
            let text = read_input(assistant, &input).await?;
            assistant.generate_quiz(&text, None, None).await
        }
        ExecutionMode::Extract { url, attempts } => {
            let policy = match attempts {
                Some(attempts) => RetryPolicy::new(attempts, assistant.retry_policy().base_delay),
                None => assistant.retry_policy(),
            };
            let document = assistant.extract_with_policy(&url, policy).await?;
            return Ok(CommandOutput::Document(document));
        }
        ExecutionMode::ShowConfig => bail!("show-config does not run an operation"),
    };
    Ok(CommandOutput::Outcome(Box::new(outcome)))
}

async fn read_input(assistant: &DocumentAssistant, input: &InputSource) -> Result<String> {
    match input {
        InputSource::File(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read document {}", path.display())),
        InputSource::Stdin => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read document from stdin")?;
            Ok(text)
        }
        InputSource::Url(url) => {
            let document = assistant
                .extract_with_retry(url)
                .await
                .with_context(|| format!("Failed to extract content from {}", url))?;
            if document.is_empty() {
                bail!("No text could be extracted from {}", url);
            }
            Ok(document.text)
        }
    }
}
