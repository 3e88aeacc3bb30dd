use anyhow::{Context, Result};
use secrecy::SecretString;
use std::env;
use url::Url;

/// Default chat-completion endpoint of the AI gateway.
pub const DEFAULT_AI_GATEWAY_URL: &str = "https://ai.gateway.lovable.dev";
pub const DEFAULT_AI_GATEWAY_MODEL: &str = "google/gemini-2.5-flash";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Staging,
    Prod,
}

impl Environment {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "prod" | "production" => Self::Prod,
            "staging" => Self::Staging,
            _ => Self::Dev,
        }
    }

    pub fn is_dev(&self) -> bool {
        matches!(self, Self::Dev)
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub env: Environment,
    pub server_addr: String,
    pub max_body_bytes: usize,

    // AI gateway
    pub ai_gateway_url: Url,
    pub ai_gateway_model: String,
    pub ai_gateway_api_key: Option<SecretString>,
    pub ai_gateway_timeout_seconds: u64,

    // Supabase auth service
    pub supabase_url: Option<Url>,
    pub supabase_anon_key: Option<SecretString>,
}

impl Settings {
    /// Load settings from the process environment.
    ///
    /// Secrets and the auth service URL are optional here: a missing value is
    /// reported per request as "service unavailable" instead of failing startup.
    pub fn from_env() -> Result<Self> {
        let env = Environment::from_str(&env::var("ENV").unwrap_or_else(|_| "dev".to_string()));
        let server_addr = env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let max_body_bytes = env::var("MAX_BODY_BYTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256 * 1024); // quotation text is capped at 50k chars

        // AI gateway
        let ai_gateway_url = parse_base_url(
            &env::var("AI_GATEWAY_URL").unwrap_or_else(|_| DEFAULT_AI_GATEWAY_URL.to_string()),
        )
        .context("AI_GATEWAY_URL is not a valid URL")?;
        let ai_gateway_model =
            env::var("AI_GATEWAY_MODEL").unwrap_or_else(|_| DEFAULT_AI_GATEWAY_MODEL.to_string());
        let ai_gateway_api_key = secret_var("AI_GATEWAY_API_KEY");
        let ai_gateway_timeout_seconds = env::var("AI_GATEWAY_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(120); // LLM research calls are slow

        // Supabase auth service
        let supabase_url = match non_empty_var("SUPABASE_URL") {
            Some(raw) => Some(parse_base_url(&raw).context("SUPABASE_URL is not a valid URL")?),
            None => None,
        };
        let supabase_anon_key = secret_var("SUPABASE_ANON_KEY");

        Ok(Settings {
            env,
            server_addr,
            max_body_bytes,
            ai_gateway_url,
            ai_gateway_model,
            ai_gateway_api_key,
            ai_gateway_timeout_seconds,
            supabase_url,
            supabase_anon_key,
        })
    }
}

/// Parse a service base URL so that relative joins append to its path:
/// `https://gw.example/api/openai` becomes `https://gw.example/api/openai/`.
pub fn parse_base_url(raw: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(raw.trim())?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn secret_var(name: &str) -> Option<SecretString> {
    non_empty_var(name).map(SecretString::from)
}
