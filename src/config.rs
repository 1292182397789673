use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::pr::RepoRef;

pub const DEFAULT_CONFIG_FILE: &str = ".pr-reviewer.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Required environment variable {0} is not set")]
    MissingEnv(&'static str),

    #[error("Invalid value for {name}: {value}")]
    InvalidEnv { name: &'static str, value: String },
}

/// Settings read from the optional `.pr-reviewer.toml`.
/// Every field has a default so the tool runs with zero config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub gemini: GeminiConfig,

    #[serde(default)]
    pub review: ReviewConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubConfig {
    /// REST API root, overridable for GitHub Enterprise.
    #[serde(default = "default_github_api_url")]
    pub api_url: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_github_api_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    #[serde(default = "default_gemini_api_url")]
    pub api_url: String,

    #[serde(default = "default_gemini_model")]
    pub model: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_url: default_gemini_api_url(),
            model: default_gemini_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewConfig {
    /// File extensions (with the leading dot) that are sent for review
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
        }
    }
}

impl ReviewConfig {
    pub fn is_reviewable(&self, filename: &str) -> bool {
        self.extensions.iter().any(|ext| filename.ends_with(ext.as_str()))
    }
}

fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_gemini_api_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_extensions() -> Vec<String> {
    [".py", ".js", ".html", ".css", ".md"]
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

impl Config {
    /// Load configuration from `path`, or defaults if the file does not exist.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Config::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }
}

/// Credentials and pull request identity, all supplied by the CI job.
#[derive(Clone)]
pub struct Environment {
    pub gemini_api_key: String,
    pub github_token: String,
    pub pr_number: u64,
    pub repo: RepoRef,
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("pr_number", &self.pr_number)
            .field("repo", &self.repo)
            .finish_non_exhaustive()
    }
}

impl Environment {
    pub fn from_env() -> Result<Environment, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup (useful for testing).
    pub fn from_lookup<F>(lookup: F) -> Result<Environment, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::MissingEnv(name))
        };

        let gemini_api_key = require("GEMINI_API_KEY")?;
        let github_token = require("GH_TOKEN")?;

        let raw_number = require("PR_NUMBER")?;
        let pr_number = raw_number
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidEnv {
                name: "PR_NUMBER",
                value: raw_number.clone(),
            })?;

        let raw_repo = require("REPO_FULL_NAME")?;
        let repo = crate::pr::parse_repo_full_name(&raw_repo).map_err(|_| {
            ConfigError::InvalidEnv {
                name: "REPO_FULL_NAME",
                value: raw_repo.clone(),
            }
        })?;

        Ok(Environment {
            gemini_api_key,
            github_token,
            pr_number,
            repo,
        })
    }
}
