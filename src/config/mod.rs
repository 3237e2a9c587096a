use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::sources::TranscriptBackend;
use crate::summarize::{PromptTemplate, DEFAULT_PROMPT_TEMPLATE};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM endpoint configuration
    pub llm: LlmConfig,

    /// Transcript acquisition settings
    pub transcripts: TranscriptsConfig,

    /// HTTP client settings
    pub http: HttpConfig,

    /// Application settings
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API
    pub base_url: String,

    /// Model used for summaries
    pub model: String,

    /// API key used when none is given on the command line
    pub api_key: Option<String>,

    /// Sampling temperature
    pub temperature: Option<f32>,

    /// Upper bound on generated tokens
    pub max_tokens: Option<u32>,

    /// Content longer than this many characters is truncated before prompting
    pub max_input_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptsConfig {
    /// `auto`, `yt-dlp` or `timedtext`
    pub backend: TranscriptBackend,

    /// Preferred caption languages, most preferred first
    pub languages: Vec<String>,

    /// yt-dlp executable
    pub yt_dlp_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// User-Agent header sent with page and caption requests
    pub user_agent: String,

    /// Request timeout; the client default applies when unset
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Prompt sent to the LLM, with one `{text}` placeholder
    pub prompt_template: String,

    /// Default output format
    pub default_output_format: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama3-8b-8192".to_string(),
            api_key: None,
            temperature: None,
            max_tokens: None,
            max_input_chars: 24_000,
        }
    }
}

impl Default for TranscriptsConfig {
    fn default() -> Self {
        Self {
            backend: TranscriptBackend::Auto,
            languages: vec!["en".to_string()],
            yt_dlp_path: "yt-dlp".to_string(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("url-summarizer/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: None,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
            default_output_format: "text".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file or create default
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = fs_err::read_to_string(&config_path)
                .context("Failed to read config file")?;

            let config = Self::from_yaml(&content)?;
            tracing::debug!("Loaded configuration from {}", config_path.display());
            Ok(config)
        } else {
            let config = Self::default();
            config.save().await?;
            Ok(config)
        }
    }

    /// Parse and validate YAML configuration
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content)
            .context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)
            .context("Failed to serialize config")?;

        fs_err::write(&config_path, content)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;

        Ok(config_dir.join("url-summarizer").join("config.yaml"))
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        crate::utils::validate_url(&self.llm.base_url)
            .context("llm.base_url must be an http(s) URL")?;

        if self.llm.model.trim().is_empty() {
            anyhow::bail!("llm.model must be configured");
        }

        if self.llm.max_input_chars == 0 {
            anyhow::bail!("llm.max_input_chars must be greater than zero");
        }

        PromptTemplate::new(&self.app.prompt_template)
            .context("app.prompt_template is invalid")?;

        Ok(())
    }

    /// Prompt template from the configuration
    pub fn prompt_template(&self) -> Result<PromptTemplate> {
        PromptTemplate::new(&self.app.prompt_template)
    }

    /// HTTP client shared by page loading and caption fetching
    pub fn http_client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder().user_agent(&self.http.user_agent);
        if let Some(secs) = self.http.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        builder.build().context("Failed to build HTTP client")
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  LLM Endpoint: {}", self.llm.base_url);
        println!("  Model: {}", self.llm.model);
        println!(
            "  API Key: {}",
            if self.llm.api_key.as_deref().is_some_and(|k| !k.trim().is_empty()) {
                "configured"
            } else {
                "not set"
            }
        );
        println!("  Max Input Chars: {}", self.llm.max_input_chars);
        println!("  Transcript Backend: {}", self.transcripts.backend);
        println!("  Caption Languages: {}", self.transcripts.languages.join(", "));
        println!("  Default Format: {}", self.app.default_output_format);
    }
}
