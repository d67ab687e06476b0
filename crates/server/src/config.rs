use std::{collections::HashMap, fs, time::Duration};

use tracing::warn;

pub const DEFAULT_UPSTREAM_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_UPSTREAM_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone)]
pub struct UpstreamSettings {
    pub url: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl UpstreamSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_UPSTREAM_URL.into(),
            model: DEFAULT_UPSTREAM_MODEL.into(),
            max_tokens: 600,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub server_bind: String,
    pub upstream_api_key: Option<String>,
    pub upstream: UpstreamSettings,
    pub body_limit_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8787".into(),
            upstream_api_key: None,
            upstream: UpstreamSettings::default(),
            body_limit_bytes: 16 * 1024,
        }
    }
}

impl Settings {
    /// The upstream credential, treating an empty or whitespace value as unset.
    pub fn credential(&self) -> Option<String> {
        self.upstream_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
    }

    fn apply_file(&mut self, raw: &str) {
        let file_cfg = match toml::from_str::<HashMap<String, String>>(raw) {
            Ok(file_cfg) => file_cfg,
            Err(error) => {
                warn!(%error, "ignoring unreadable server.toml");
                return;
            }
        };

        if let Some(v) = file_cfg.get("bind_addr") {
            self.server_bind = v.clone();
        }
        if let Some(v) = file_cfg.get("upstream_api_key") {
            self.upstream_api_key = Some(v.clone());
        }
        if let Some(v) = file_cfg.get("upstream_url") {
            self.upstream.url = v.clone();
        }
        if let Some(v) = file_cfg.get("upstream_model") {
            self.upstream.model = v.clone();
        }
        if let Some(v) = file_cfg.get("max_tokens") {
            parse_into("max_tokens", v, &mut self.upstream.max_tokens);
        }
        if let Some(v) = file_cfg.get("upstream_timeout_secs") {
            parse_into("upstream_timeout_secs", v, &mut self.upstream.timeout_secs);
        }
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("SERVER_BIND") {
            self.server_bind = v;
        }
        if let Some(v) = var("APP__BIND_ADDR") {
            self.server_bind = v;
        }

        if let Some(v) = var("OPENAI_API_KEY") {
            self.upstream_api_key = Some(v);
        }
        if let Some(v) = var("APP__UPSTREAM_API_KEY") {
            self.upstream_api_key = Some(v);
        }

        if let Some(v) = var("APP__UPSTREAM_URL") {
            self.upstream.url = v;
        }
        if let Some(v) = var("APP__UPSTREAM_MODEL") {
            self.upstream.model = v;
        }
        if let Some(v) = var("APP__MAX_TOKENS") {
            parse_into("APP__MAX_TOKENS", &v, &mut self.upstream.max_tokens);
        }
        if let Some(v) = var("APP__UPSTREAM_TIMEOUT_SECS") {
            parse_into("APP__UPSTREAM_TIMEOUT_SECS", &v, &mut self.upstream.timeout_secs);
        }
        if let Some(v) = var("APP__BODY_LIMIT_BYTES") {
            parse_into("APP__BODY_LIMIT_BYTES", &v, &mut self.body_limit_bytes);
        }
    }
}

fn parse_into<T: std::str::FromStr>(key: &str, raw: &str, slot: &mut T) {
    match raw.trim().parse::<T>() {
        Ok(parsed) => *slot = parsed,
        Err(_) => warn!(key, value = raw, "ignoring unparsable setting"),
    }
}

pub fn load_settings() -> Settings {
    let file = fs::read_to_string("server.toml").ok();
    load_settings_from(file.as_deref(), |key| std::env::var(key).ok())
}

pub fn load_settings_from(file: Option<&str>, var: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();
    if let Some(raw) = file {
        settings.apply_file(raw);
    }
    settings.apply_env(var);
    settings
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
