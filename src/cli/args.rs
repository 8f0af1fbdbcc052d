//! Command line argument parsing
//!
//! This module handles CLI argument parsing with subcommands:
//! - `analyze`: Analyze a document from a file, stdin or a URL
//! - `explain`: Explain a legal term
//! - `scenarios`: Generate what-if scenarios for a clause
//! - `quiz`: Generate a comprehension quiz for a document
//! - `extract`: Extract clean text from a web page
//! - `show-config`: Show configuration discovery information

use crate::AssistantConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    File(PathBuf),
    Stdin,
    Url(String),
}

impl InputSource {
    fn resolve(file: Option<&PathBuf>, url: Option<&String>) -> Self {
        match (url, file) {
            (Some(url), _) => InputSource::Url(url.clone()),
            (None, Some(path)) if path.as_os_str() != "-" => InputSource::File(path.clone()),
            _ => InputSource::Stdin,
        }
    }
}

/// Values given on the command line that replace configured ones
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub language: Option<String>,
    pub difficulty: Option<String>,
    pub document_type: Option<String>,
    pub offline: bool,
}

impl ConfigOverrides {
    pub fn apply(&self, config: &mut AssistantConfig) {
        if let Some(language) = &self.language {
            config.language = language.clone();
        }
        if let Some(difficulty) = &self.difficulty {
            config.difficulty = difficulty.clone();
        }
        if let Some(document_type) = &self.document_type {
            config.document_type = document_type.clone();
        }
        if self.offline {
            config.orchestrator.offline = true;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionMode {
    Analyze(InputSource),
    Explain {
        term: String,
        context: Option<String>,
        document_type: Option<String>,
    },
    Scenarios {
        clause: String,
        document_type: Option<String>,
    },
    Quiz(InputSource),
    Extract { url: String, attempts: Option<u32> },
    ShowConfig,
}

#[derive(Debug, Parser)]
#[command(name = "legalitea")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Plain-language analysis of legal documents with multi-provider LLM fallback")]
#[command(long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Args {
    /// Configuration file path (skips discovery)
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,
    /// Include the result source and provider failures in the output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Analyze a legal document
    Analyze {
        /// Document file; `-` or absent reads stdin
        file: Option<PathBuf>,
        /// Fetch the document from a web page instead
        #[arg(long, conflicts_with = "file")]
        url: Option<String>,
        #[arg(short = 'd', long = "document-type")]
        document_type: Option<String>,
        /// Output language code or name
        #[arg(short = 'l', long)]
        language: Option<String>,
        /// Skip providers and use the offline analysis
        #[arg(long)]
        offline: bool,
    },
    /// Explain a legal term in plain language
    Explain {
        term: String,
        /// Surrounding text the term appears in
        #[arg(long)]
        context: Option<String>,
        #[arg(short = 'd', long = "document-type")]
        document_type: Option<String>,
        #[arg(short = 'l', long)]
        language: Option<String>,
    },
    /// Generate what-if scenarios for a clause
    Scenarios {
        clause: String,
        #[arg(short = 'd', long = "document-type")]
        document_type: Option<String>,
        #[arg(short = 'l', long)]
        language: Option<String>,
    },
    /// Generate a comprehension quiz for a document
    Quiz {
        /// Document file; `-` or absent reads stdin
        file: Option<PathBuf>,
        #[arg(long, conflicts_with = "file")]
        url: Option<String>,
        /// Passed to the generator verbatim
        #[arg(long)]
        difficulty: Option<String>,
        #[arg(short = 'l', long)]
        language: Option<String>,
    },
    /// Extract clean text from a web page
    Extract {
        url: String,
        /// Attempts before giving up (overrides the configured value)
        #[arg(long)]
        attempts: Option<u32>,
    },
    /// Show configuration discovery information
    ShowConfig,
}

impl Args {
    pub fn parse() -> Self {
        Parser::parse()
    }

    pub fn mode(&self) -> Result<ExecutionMode, String> {
        match &self.command {
            Some(Commands::Analyze { file, url, .. }) => Ok(ExecutionMode::Analyze(
                InputSource::resolve(file.as_ref(), url.as_ref()),
            )),
            Some(Commands::Explain {
                term,
                context,
                document_type,
                ..
            }) => {
                if term.trim().is_empty() {
                    return Err("The term to explain must not be empty".to_string());
                }
                Ok(ExecutionMode::Explain {
                    term: term.clone(),
                    context: context.clone(),
                    document_type: document_type.clone(),
                })
            }
            Some(Commands::Scenarios {
                clause,
                document_type,
                ..
            }) => {
                if clause.trim().is_empty() {
                    return Err("The clause must not be empty".to_string());
                }
                Ok(ExecutionMode::Scenarios {
                    clause: clause.clone(),
                    document_type: document_type.clone(),
                })
            }
            Some(Commands::Quiz { file, url, .. }) => Ok(ExecutionMode::Quiz(InputSource::resolve(
                file.as_ref(),
                url.as_ref(),
            ))),
            Some(Commands::Extract { url, attempts }) => Ok(ExecutionMode::Extract {
                url: url.clone(),
                attempts: *attempts,
            }),
            Some(Commands::ShowConfig) => Ok(ExecutionMode::ShowConfig),
            None => Err(
                "No command specified. Use 'legalitea --help' to see available commands."
                    .to_string(),
            ),
        }
    }

    /// Configuration values set by the subcommand's flags
    pub fn overrides(&self) -> ConfigOverrides {
        match &self.command {
            Some(Commands::Analyze {
                document_type,
                language,
                offline,
                ..
            }) => ConfigOverrides {
                language: language.clone(),
                document_type: document_type.clone(),
                offline: *offline,
                ..Default::default()
            },
            Some(Commands::Explain {
                document_type,
                language,
                ..
            })
            | Some(Commands::Scenarios {
                document_type,
                language,
                ..
            }) => ConfigOverrides {
                language: language.clone(),
                document_type: document_type.clone(),
                ..Default::default()
            },
            Some(Commands::Quiz {
                difficulty,
                language,
                ..
            }) => ConfigOverrides {
                language: language.clone(),
                difficulty: difficulty.clone(),
                ..Default::default()
            },
            _ => ConfigOverrides::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_analyze_file() {
        let args = parse(&["legalitea", "analyze", "lease.txt", "--language", "es"]);
        assert_eq!(
            args.mode().unwrap(),
            ExecutionMode::Analyze(InputSource::File(PathBuf::from("lease.txt")))
        );
        assert_eq!(args.overrides().language.as_deref(), Some("es"));
    }

    #[test]
    fn test_analyze_reads_stdin_by_default() {
        let args = parse(&["legalitea", "analyze"]);
        assert_eq!(args.mode().unwrap(), ExecutionMode::Analyze(InputSource::Stdin));

        let args = parse(&["legalitea", "analyze", "-"]);
        assert_eq!(args.mode().unwrap(), ExecutionMode::Analyze(InputSource::Stdin));
    }

    #[test]
    fn test_analyze_url_conflicts_with_file() {
        let args = parse(&["legalitea", "analyze", "--url", "https://example.com/tos"]);
        assert_eq!(
            args.mode().unwrap(),
            ExecutionMode::Analyze(InputSource::Url("https://example.com/tos".to_string()))
        );

        assert!(Args::try_parse_from(["legalitea", "analyze", "a.txt", "--url", "https://x.io"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = parse(&["legalitea", "explain", "escrow", "--verbose", "--config", "my.toml"]);
        assert!(args.verbose);
        assert_eq!(args.config, Some(PathBuf::from("my.toml")));
        assert_eq!(
            args.mode().unwrap(),
            ExecutionMode::Explain {
                term: "escrow".to_string(),
                context: None,
                document_type: None,
            }
        );
    }

    #[test]
    fn test_document_type_reaches_sibling_modes() {
        let args = parse(&["legalitea", "explain", "lien", "-d", "lease", "--context", "a lien on the car"]);
        assert_eq!(
            args.mode().unwrap(),
            ExecutionMode::Explain {
                term: "lien".to_string(),
                context: Some("a lien on the car".to_string()),
                document_type: Some("lease".to_string()),
            }
        );

        let args = parse(&["legalitea", "scenarios", "Rent is due on the 1st.", "--document-type", "lease"]);
        assert_eq!(
            args.mode().unwrap(),
            ExecutionMode::Scenarios {
                clause: "Rent is due on the 1st.".to_string(),
                document_type: Some("lease".to_string()),
            }
        );
    }

    #[test]
    fn test_blank_term_is_rejected() {
        let args = parse(&["legalitea", "explain", "  "]);
        assert!(args.mode().is_err());
    }

    #[test]
    fn test_overrides_apply_to_config() {
        let args = parse(&[
            "legalitea", "analyze", "--offline", "--document-type", "lease", "-l", "fr",
        ]);
        let mut config = AssistantConfig::default();
        args.overrides().apply(&mut config);

        assert!(config.orchestrator.offline);
        assert_eq!(config.document_type, "lease");
        assert_eq!(config.language, "fr");
        assert_eq!(config.difficulty, "medium");
    }

    #[test]
    fn test_quiz_difficulty_override() {
        let args = parse(&["legalitea", "quiz", "doc.txt", "--difficulty", "expert"]);
        let mut config = AssistantConfig::default();
        args.overrides().apply(&mut config);
        assert_eq!(config.difficulty, "expert");
    }

    #[test]
    fn test_extract_attempts() {
        let args = parse(&["legalitea", "extract", "https://example.com", "--attempts", "5"]);
        assert_eq!(
            args.mode().unwrap(),
            ExecutionMode::Extract {
                url: "https://example.com".to_string(),
                attempts: Some(5)
            }
        );
    }

    #[test]
    fn test_no_command_error() {
        let args = Args {
            config: None,
            verbose: false,
            command: None,
        };
        assert!(args.mode().is_err());
    }
}
