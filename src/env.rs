//! Environment constants and path utilities for legalitea.
//!
//! This module centralizes the hardcoded names used throughout the
//! application: configuration locations, credential variables, default
//! models and provider endpoints.

/// Main application directory name (hidden directory like .git, .vscode)
pub const APP_DIR_NAME: &str = ".legalitea";

/// Configuration file name inside the application directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Stand-alone configuration file name in the current directory
pub const LOCAL_CONFIG_FILE_NAME: &str = "legalitea.toml";

/// Default tracing filter used by the binary when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "legalitea=info";

/// Provider-related constants
pub mod provider {
    /// Credential variable enabling the DigitalOcean Gradient provider
    pub const GRADIENT_TOKEN_ENV: &str = "DIGITALOCEAN_ACCESS_TOKEN";

    /// Credential variable enabling the Google Gemini provider
    pub const GEMINI_KEY_ENV: &str = "GEMINI_API_KEY";

    /// Default Gradient model
    pub const GRADIENT_DEFAULT_MODEL: &str = "llama3.3-70b-instruct";

    /// Default Gemini model
    pub const GEMINI_DEFAULT_MODEL: &str = "gemini-2.5-flash";

    /// Gradient serverless inference endpoint (OpenAI-compatible)
    pub const GRADIENT_BASE_URL: &str = "https://inference.do-ai.run/v1";

    /// Google Generative Language endpoint
    pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

    /// Default per-request timeout in seconds
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
}

/// Prompt-related constants
pub mod prompt {
    /// Maximum number of characters of document text embedded in a quiz prompt
    pub const QUIZ_EXCERPT_LIMIT: usize = 2000;
}

/// Extraction-related constants
pub mod extraction {
    /// Browser-like user agent used by the HTTP page renderer
    pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

    /// Navigation timeout in seconds
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Maximum redirects followed during navigation
    pub const MAX_REDIRECTS: usize = 5;

    /// Caller-side attempts before giving up on a URL
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

    /// First backoff delay between caller-side attempts
    pub const DEFAULT_BASE_DELAY_MS: u64 = 1000;
}

use std::path::{Path, PathBuf};

/// Build the application directory path under a base directory
pub fn app_dir_path(base: &Path) -> PathBuf {
    base.join(APP_DIR_NAME)
}

/// Build config file path in user's home directory
pub fn user_config_file_path(home_dir: &Path) -> PathBuf {
    app_dir_path(home_dir).join(CONFIG_FILE_NAME)
}

/// Build the hidden-directory config file path in the current directory
pub fn local_config_file_path(current_dir: &Path) -> PathBuf {
    app_dir_path(current_dir).join(CONFIG_FILE_NAME)
}

/// Build the stand-alone config file path in the current directory
pub fn local_standalone_config_path(current_dir: &Path) -> PathBuf {
    current_dir.join(LOCAL_CONFIG_FILE_NAME)
}
