//! Configuration schema definitions.

use busca::llms::OllamaConfig;
use busca::prompts::{PromptError, PromptTemplate};
use busca::tools::SearchEngine;
use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuscaConfig {
    /// Ollama connection.
    #[serde(default)]
    pub ollama: OllamaSection,

    /// Agent loop settings.
    #[serde(default)]
    pub agent: AgentSection,

    /// Web search settings.
    #[serde(default)]
    pub search: SearchSection,
}

/// Ollama connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OllamaSection {
    /// Base URL of the Ollama server.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model name.
    #[serde(default = "default_model")]
    pub model: String,
    /// Request timeout in seconds.
    #[serde(default = "default_ollama_timeout")]
    pub timeout_secs: u64,
    /// How long Ollama keeps the model loaded (e.g. "5m").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<String>,
    /// Sampling temperature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

fn default_base_url() -> String {
    OllamaConfig::DEFAULT_BASE_URL.to_owned()
}

fn default_model() -> String {
    OllamaConfig::DEFAULT_MODEL.to_owned()
}

const fn default_ollama_timeout() -> u64 {
    OllamaConfig::DEFAULT_TIMEOUT_SECS
}

impl Default for OllamaSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            timeout_secs: default_ollama_timeout(),
            keep_alive: None,
            temperature: None,
        }
    }
}

/// Agent loop settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSection {
    /// Maximum model calls per turn.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Send malformed completions back to the model instead of failing the turn.
    #[serde(default = "default_true")]
    pub handle_parsing_errors: bool,
    /// Log each reasoning step at info level.
    #[serde(default = "default_true")]
    pub verbose: bool,
    /// Turns kept in the conversation history.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    /// Replacement for the built-in reason-act template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_template: Option<String>,
}

const fn default_max_iterations() -> usize {
    15
}

const fn default_history_capacity() -> usize {
    10
}

const fn default_true() -> bool {
    true
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            handle_parsing_errors: true,
            verbose: true,
            history_capacity: default_history_capacity(),
            prompt_template: None,
        }
    }
}

/// Web search settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSection {
    /// Backend to query.
    #[serde(default)]
    pub engine: SearchEngine,
    /// Results kept per query.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// HTTP timeout in seconds.
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

const fn default_max_results() -> usize {
    5
}

const fn default_search_timeout() -> u64 {
    30
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            engine: SearchEngine::default(),
            max_results: default_max_results(),
            timeout_secs: default_search_timeout(),
        }
    }
}

impl BuscaConfig {
    /// Validate the configuration and return any issues found.
    #[must_use]
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.ollama.model.trim().is_empty() {
            issues.push(ConfigIssue::error("ollama.model", "Model name must not be empty"));
        }

        if self.ollama.timeout_secs == 0 {
            issues.push(ConfigIssue::warning(
                "ollama.timeout_secs",
                "Timeout is 0, every request will fail immediately",
            ));
        }

        if self.search.timeout_secs == 0 {
            issues.push(ConfigIssue::warning(
                "search.timeout_secs",
                "Timeout is 0, every search will fail immediately",
            ));
        }

        if self.agent.max_iterations == 0 {
            issues.push(ConfigIssue::error(
                "agent.max_iterations",
                "Max iterations must be at least 1",
            ));
        }

        if self.agent.history_capacity == 0 {
            issues.push(ConfigIssue::error(
                "agent.history_capacity",
                "History capacity must be at least 1",
            ));
        } else if self.agent.history_capacity % 2 == 1 {
            issues.push(ConfigIssue::warning(
                "agent.history_capacity",
                "Odd capacity keeps half an exchange; use an even number",
            ));
        }

        if let Err(e) = self.prompt_template() {
            issues.push(ConfigIssue::error("agent.prompt_template", e.to_string()));
        }

        if self.search.max_results == 0 {
            issues.push(ConfigIssue::error(
                "search.max_results",
                "Max results must be at least 1",
            ));
        }

        issues
    }

    /// Apply `OLLAMA_BASE_URL` and `OLLAMA_MODEL` from the environment.
    #[must_use]
    pub fn with_env(self) -> Self {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    /// Apply environment overrides using `lookup` to read variables.
    #[must_use]
    pub fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup("OLLAMA_BASE_URL").filter(|v| !v.is_empty()) {
            self.ollama.base_url = url;
        }
        if let Some(model) = lookup("OLLAMA_MODEL").filter(|v| !v.is_empty()) {
            self.ollama.model = model;
        }
        self
    }

    /// Client settings for the Ollama provider.
    #[must_use]
    pub fn ollama_config(&self) -> OllamaConfig {
        let mut config = OllamaConfig::with_model(&self.ollama.model)
            .base_url(&self.ollama.base_url)
            .timeout(self.ollama.timeout_secs);
        if let Some(keep_alive) = &self.ollama.keep_alive {
            config = config.keep_alive(keep_alive);
        }
        if let Some(temperature) = self.ollama.temperature {
            config = config.temperature(temperature);
        }
        config
    }

    /// The configured template, or the built-in one.
    ///
    /// # Errors
    ///
    /// Returns a [`PromptError`] if a custom template cannot be parsed or
    /// lacks a required placeholder.
    pub fn prompt_template(&self) -> Result<PromptTemplate, PromptError> {
        self.agent
            .prompt_template
            .as_deref()
            .map_or_else(|| Ok(PromptTemplate::react()), PromptTemplate::react_from)
    }
}

/// Configuration validation issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    /// Issue severity level.
    pub level: IssueLevel,
    /// Configuration path (e.g., `agent.max_iterations`).
    pub path: String,
    /// Human-readable message.
    pub message: String,
}

impl ConfigIssue {
    /// Create an error-level issue.
    #[must_use]
    pub fn error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Error,
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a warning-level issue.
    #[must_use]
    pub fn warning(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Warning,
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.level {
            IssueLevel::Error => "ERROR",
            IssueLevel::Warning => "WARN",
        };
        write!(f, "[{}] {}: {}", prefix, self.path, self.message)
    }
}

/// Severity level for configuration issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueLevel {
    /// The assistant cannot start.
    Error,
    /// Suspicious but usable.
    Warning,
}
