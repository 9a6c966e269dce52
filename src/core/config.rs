//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` (or the path given with `-f`) and applies the
//! `QUERYGENIE_BIND` and `QUERYGENIE_LOG_LEVEL` env overrides. API keys are
//! never read from TOML: `LLM_API_KEY` and `ALPHAVANTAGE_API_KEY` come from
//! the environment (or `.env`).

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::error::AppError;

/// Alpha Vantage accepts this key for its documented sample symbols.
const ALPHAVANTAGE_DEMO_KEY: &str = "demo";

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address the chat API binds to.
    pub bind: String,
    pub log_level: String,
    /// Append logs here instead of stderr (already `~`-expanded).
    pub log_file: Option<PathBuf>,
}

/// Cohere chat endpoint (`[llm.cohere]`).
#[derive(Debug, Clone)]
pub struct CohereConfig {
    pub api_base_url: String,
    /// Model identifier sent with every request.
    pub model: String,
    pub timeout_seconds: u64,
}

/// OpenAI / OpenAI-compatible endpoint (`[llm.openai]`).
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Full chat completions endpoint URL.
    pub api_base_url: String,
    pub model: String,
    /// Sampling temperature (ignored for models that forbid it).
    pub temperature: f32,
    pub timeout_seconds: u64,
}

/// Generative backend configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Active provider: `"dummy"`, `"cohere"` or `"openai"`.
    /// Named `default` in the TOML so other provider sections can coexist.
    pub provider: String,
    pub cohere: CohereConfig,
    pub openai: OpenAiConfig,
}

/// Domain resolver configuration (`[resolvers]`).
#[derive(Debug, Clone)]
pub struct ResolversConfig {
    /// `"http"` for the live data APIs, `"fixture"` for the built-in table.
    pub backend: String,
    pub timeout_seconds: u64,
    /// Sent on every outbound request; Wikipedia rejects anonymous agents.
    pub user_agent: String,
    pub openfda_base_url: String,
    pub alphavantage_base_url: String,
    pub openlibrary_base_url: String,
    pub wikipedia_base_url: String,
    /// Topic summaries are cut to this many characters.
    pub summary_limit: usize,
}

/// Entity recognizer configuration (`[nlp]`).
#[derive(Debug, Clone)]
pub struct NlpConfig {
    /// `"gazetteer"` (built-in) or `"remote"`.
    pub recognizer: String,
    /// Required when `recognizer = "remote"`.
    pub endpoint: Option<String>,
    pub timeout_seconds: u64,
}

/// Router/composer knobs (`[chat]`).
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Number of trailing turns returned with a generative reply.
    pub tail_len: usize,
    /// Fixed `ai_response` text used when a data API answered.
    pub api_notice: String,
}

/// Fully-resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub resolvers: ResolversConfig,
    pub nlp: NlpConfig,
    pub chat: ChatConfig,
    /// From `LLM_API_KEY`; `None` for keyless local models.
    pub llm_api_key: Option<String>,
    /// From `ALPHAVANTAGE_API_KEY`, falling back to the public demo key.
    pub alphavantage_api_key: String,
}

// ── Raw TOML shape ────────────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
struct RawConfig {
    #[serde(default)]
    server: RawServer,
    #[serde(default)]
    llm: RawLlm,
    #[serde(default)]
    resolvers: RawResolvers,
    #[serde(default)]
    nlp: RawNlp,
    #[serde(default)]
    chat: RawChat,
}

#[derive(Deserialize)]
struct RawServer {
    #[serde(default = "default_bind")]
    bind: String,
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default)]
    log_file: Option<String>,
}

impl Default for RawServer {
    fn default() -> Self {
        Self { bind: default_bind(), log_level: default_log_level(), log_file: None }
    }
}

#[derive(Deserialize)]
struct RawLlm {
    #[serde(rename = "default", default = "default_llm_provider")]
    provider: String,
    #[serde(default)]
    cohere: RawCohere,
    #[serde(default)]
    openai: RawOpenAi,
}

impl Default for RawLlm {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            cohere: RawCohere::default(),
            openai: RawOpenAi::default(),
        }
    }
}

#[derive(Deserialize)]
struct RawCohere {
    #[serde(default = "default_cohere_api_base_url")]
    api_base_url: String,
    #[serde(default = "default_cohere_model")]
    model: String,
    #[serde(default = "default_llm_timeout_seconds")]
    timeout_seconds: u64,
}

impl Default for RawCohere {
    fn default() -> Self {
        Self {
            api_base_url: default_cohere_api_base_url(),
            model: default_cohere_model(),
            timeout_seconds: default_llm_timeout_seconds(),
        }
    }
}

#[derive(Deserialize)]
struct RawOpenAi {
    #[serde(default = "default_openai_api_base_url")]
    api_base_url: String,
    #[serde(default = "default_openai_model")]
    model: String,
    #[serde(default = "default_openai_temperature")]
    temperature: f32,
    #[serde(default = "default_llm_timeout_seconds")]
    timeout_seconds: u64,
}

impl Default for RawOpenAi {
    fn default() -> Self {
        Self {
            api_base_url: default_openai_api_base_url(),
            model: default_openai_model(),
            temperature: default_openai_temperature(),
            timeout_seconds: default_llm_timeout_seconds(),
        }
    }
}

#[derive(Deserialize)]
struct RawResolvers {
    #[serde(default = "default_resolver_backend")]
    backend: String,
    #[serde(default = "default_resolver_timeout_seconds")]
    timeout_seconds: u64,
    #[serde(default = "default_user_agent")]
    user_agent: String,
    #[serde(default = "default_openfda_base_url")]
    openfda_base_url: String,
    #[serde(default = "default_alphavantage_base_url")]
    alphavantage_base_url: String,
    #[serde(default = "default_openlibrary_base_url")]
    openlibrary_base_url: String,
    #[serde(default = "default_wikipedia_base_url")]
    wikipedia_base_url: String,
    #[serde(default = "default_summary_limit")]
    summary_limit: usize,
}

impl Default for RawResolvers {
    fn default() -> Self {
        Self {
            backend: default_resolver_backend(),
            timeout_seconds: default_resolver_timeout_seconds(),
            user_agent: default_user_agent(),
            openfda_base_url: default_openfda_base_url(),
            alphavantage_base_url: default_alphavantage_base_url(),
            openlibrary_base_url: default_openlibrary_base_url(),
            wikipedia_base_url: default_wikipedia_base_url(),
            summary_limit: default_summary_limit(),
        }
    }
}

#[derive(Deserialize)]
struct RawNlp {
    #[serde(default = "default_recognizer")]
    recognizer: String,
    #[serde(default)]
    endpoint: Option<String>,
    #[serde(default = "default_resolver_timeout_seconds")]
    timeout_seconds: u64,
}

impl Default for RawNlp {
    fn default() -> Self {
        Self {
            recognizer: default_recognizer(),
            endpoint: None,
            timeout_seconds: default_resolver_timeout_seconds(),
        }
    }
}

#[derive(Deserialize)]
struct RawChat {
    #[serde(default = "default_tail_len")]
    tail_len: usize,
    #[serde(default = "default_api_notice")]
    api_notice: String,
}

impl Default for RawChat {
    fn default() -> Self {
        Self { tail_len: default_tail_len(), api_notice: default_api_notice() }
    }
}

fn default_bind() -> String { "127.0.0.1:8002".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_llm_provider() -> String { "dummy".to_string() }
fn default_cohere_api_base_url() -> String { "https://api.cohere.ai/v1/chat".to_string() }
fn default_cohere_model() -> String { "command-r".to_string() }
fn default_openai_api_base_url() -> String { "https://api.openai.com/v1/chat/completions".to_string() }
fn default_openai_model() -> String { "gpt-4o-mini".to_string() }
fn default_openai_temperature() -> f32 { 0.2 }
fn default_llm_timeout_seconds() -> u64 { 60 }
fn default_resolver_backend() -> String { "http".to_string() }
fn default_resolver_timeout_seconds() -> u64 { 10 }
fn default_user_agent() -> String { format!("querygenie/{}", env!("CARGO_PKG_VERSION")) }
fn default_openfda_base_url() -> String { "https://api.fda.gov".to_string() }
fn default_alphavantage_base_url() -> String { "https://www.alphavantage.co".to_string() }
fn default_openlibrary_base_url() -> String { "https://openlibrary.org".to_string() }
fn default_wikipedia_base_url() -> String { "https://en.wikipedia.org/api/rest_v1".to_string() }
fn default_summary_limit() -> usize { 500 }
fn default_recognizer() -> String { "gazetteer".to_string() }
fn default_tail_len() -> usize { 5 }
fn default_api_notice() -> String { "This information was retrieved from an external API.".to_string() }

// ── Loading ───────────────────────────────────────────────────────────────────

/// Load config from `path` (default `config/default.toml`), then apply
/// env-var overrides.
pub fn load(path: Option<&str>) -> Result<Config, AppError> {
    let bind_override = env::var("QUERYGENIE_BIND").ok();
    let log_level_override = env::var("QUERYGENIE_LOG_LEVEL").ok();
    load_from(
        Path::new(path.unwrap_or("config/default.toml")),
        bind_override.as_deref(),
        log_level_override.as_deref(),
    )
}

/// Loader with explicit overrides. Tests pass overrides directly instead of
/// mutating env vars.
pub fn load_from(
    path: &Path,
    bind_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;
    let mut config = parse(&raw)
        .map_err(|e| AppError::Config(format!("{} in {}", e, path.display())))?;

    if let Some(bind) = bind_override {
        config.server.bind = bind.to_string();
    }
    if let Some(level) = log_level_override {
        config.server.log_level = level.to_string();
    }
    Ok(config)
}

/// Parse and resolve a TOML document. Secrets are read from the environment.
pub fn parse(toml_text: &str) -> Result<Config, AppError> {
    let parsed: RawConfig = toml::from_str(toml_text)
        .map_err(|e| AppError::Config(format!("parse error: {e}")))?;

    if parsed.chat.tail_len == 0 {
        return Err(AppError::Config("chat.tail_len must be at least 1".into()));
    }
    if parsed.nlp.recognizer == "remote" && parsed.nlp.endpoint.is_none() {
        return Err(AppError::Config("nlp.endpoint is required for the remote recognizer".into()));
    }

    Ok(resolve(parsed))
}

fn resolve(parsed: RawConfig) -> Config {
    Config {
        server: ServerConfig {
            bind: parsed.server.bind,
            log_level: parsed.server.log_level,
            log_file: parsed.server.log_file.as_deref().map(expand_home),
        },
        llm: LlmConfig {
            provider: parsed.llm.provider,
            cohere: CohereConfig {
                api_base_url: parsed.llm.cohere.api_base_url,
                model: parsed.llm.cohere.model,
                timeout_seconds: parsed.llm.cohere.timeout_seconds,
            },
            openai: OpenAiConfig {
                api_base_url: parsed.llm.openai.api_base_url,
                model: parsed.llm.openai.model,
                temperature: parsed.llm.openai.temperature,
                timeout_seconds: parsed.llm.openai.timeout_seconds,
            },
        },
        resolvers: ResolversConfig {
            backend: parsed.resolvers.backend,
            timeout_seconds: parsed.resolvers.timeout_seconds,
            user_agent: parsed.resolvers.user_agent,
            openfda_base_url: trim_base(parsed.resolvers.openfda_base_url),
            alphavantage_base_url: trim_base(parsed.resolvers.alphavantage_base_url),
            openlibrary_base_url: trim_base(parsed.resolvers.openlibrary_base_url),
            wikipedia_base_url: trim_base(parsed.resolvers.wikipedia_base_url),
            summary_limit: parsed.resolvers.summary_limit,
        },
        nlp: NlpConfig {
            recognizer: parsed.nlp.recognizer,
            endpoint: parsed.nlp.endpoint,
            timeout_seconds: parsed.nlp.timeout_seconds,
        },
        chat: ChatConfig {
            tail_len: parsed.chat.tail_len,
            api_notice: parsed.chat.api_notice,
        },
        llm_api_key: env::var("LLM_API_KEY").ok().filter(|k| !k.is_empty()),
        alphavantage_api_key: env::var("ALPHAVANTAGE_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| ALPHAVANTAGE_DEMO_KEY.to_string()),
    }
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

/// Expand a leading `~` to the user's home directory.
/// Paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    if path == "~"
        && let Some(home) = dirs::home_dir()
    {
        return home;
    }
    PathBuf::from(path)
}

// ── test helpers ──────────────────────────────────────────────────────────────

impl Config {
    /// Offline config: dummy LLM, fixture resolvers, built-in recognizer.
    /// No external calls are made by anything built from it.
    pub fn offline() -> Self {
        let mut config = resolve(RawConfig::default());
        config.llm.provider = "dummy".into();
        config.resolvers.backend = "fixture".into();
        config.nlp.recognizer = "gazetteer".into();
        config.llm_api_key = None;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE_TOML: &str = r#"
[server]
bind = "0.0.0.0:9000"
log_level = "debug"

[llm]
default = "cohere"

[llm.cohere]
model = "command-r-plus"

[resolvers]
backend = "fixture"
wikipedia_base_url = "http://localhost:1234/api/"

[chat]
tail_len = 3
"#;

    fn write_toml(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn empty_document_uses_defaults() {
        let cfg = parse("").unwrap();
        assert_eq!(cfg.server.bind, "127.0.0.1:8002");
        assert_eq!(cfg.llm.provider, "dummy");
        assert_eq!(cfg.llm.cohere.model, "command-r");
        assert_eq!(cfg.resolvers.backend, "http");
        assert_eq!(cfg.resolvers.summary_limit, 500);
        assert_eq!(cfg.chat.tail_len, 5);
        assert_eq!(cfg.nlp.recognizer, "gazetteer");
    }

    #[test]
    fn parse_sample_config() {
        let f = write_toml(SAMPLE_TOML);
        let cfg = load_from(f.path(), None, None).unwrap();
        assert_eq!(cfg.server.bind, "0.0.0.0:9000");
        assert_eq!(cfg.server.log_level, "debug");
        assert_eq!(cfg.llm.provider, "cohere");
        assert_eq!(cfg.llm.cohere.model, "command-r-plus");
        assert_eq!(cfg.resolvers.backend, "fixture");
        assert_eq!(cfg.resolvers.wikipedia_base_url, "http://localhost:1234/api");
        assert_eq!(cfg.chat.tail_len, 3);
    }

    #[test]
    fn overrides_win_over_file() {
        let f = write_toml(SAMPLE_TOML);
        let cfg = load_from(f.path(), Some("127.0.0.1:1"), Some("trace")).unwrap();
        assert_eq!(cfg.server.bind, "127.0.0.1:1");
        assert_eq!(cfg.server.log_level, "trace");
    }

    #[test]
    fn missing_file_errors() {
        let result = load_from(Path::new("/nonexistent/config.toml"), None, None);
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("config error"));
    }

    #[test]
    fn zero_tail_rejected() {
        assert!(parse("[chat]\ntail_len = 0\n").is_err());
    }

    #[test]
    fn remote_recognizer_needs_endpoint() {
        assert!(parse("[nlp]\nrecognizer = \"remote\"\n").is_err());
        let cfg = parse("[nlp]\nrecognizer = \"remote\"\nendpoint = \"http://ner\"\n").unwrap();
        assert_eq!(cfg.nlp.endpoint.as_deref(), Some("http://ner"));
    }

    #[test]
    fn tilde_expands_to_home() {
        let home = dirs::home_dir().expect("home dir must exist in test env");
        let expanded = expand_home("~/querygenie.log");
        assert!(expanded.starts_with(&home));
        assert!(expanded.ends_with("querygenie.log"));
    }

    #[test]
    fn absolute_path_unchanged() {
        assert_eq!(expand_home("/var/log/q.log"), PathBuf::from("/var/log/q.log"));
    }

    #[test]
    fn offline_config_is_offline() {
        let cfg = Config::offline();
        assert_eq!(cfg.llm.provider, "dummy");
        assert_eq!(cfg.resolvers.backend, "fixture");
    }
}
