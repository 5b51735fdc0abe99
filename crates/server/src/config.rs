use std::{fs, time::Duration};

use serde::Deserialize;
use server_api::DEFAULT_MAIL_FROM;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_bind: String,
    /// No default: a missing url is reported by the first registration that needs the store.
    pub database_url: Option<String>,
    pub resend_api_key: Option<String>,
    pub resend_api_url: String,
    pub mail_from: String,
    pub write_timeout_ms: u64,
    pub notify_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8080".into(),
            database_url: None,
            resend_api_key: None,
            resend_api_url: mailer::DEFAULT_RESEND_API_URL.into(),
            mail_from: DEFAULT_MAIL_FROM.into(),
            write_timeout_ms: 5_000,
            notify_timeout_ms: 10_000,
        }
    }
}

impl Settings {
    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    pub fn notify_timeout(&self) -> Duration {
        Duration::from_millis(self.notify_timeout_ms)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSettings {
    bind_addr: Option<String>,
    database_url: Option<String>,
    resend_api_url: Option<String>,
    mail_from: Option<String>,
    write_timeout_ms: Option<u64>,
    notify_timeout_ms: Option<u64>,
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("server.toml") {
        apply_file_settings(&mut settings, &raw);
    }
    apply_env_settings(&mut settings, |key| std::env::var(key).ok());

    settings
}

fn apply_file_settings(settings: &mut Settings, raw: &str) {
    let Ok(file_cfg) = toml::from_str::<FileSettings>(raw) else {
        return;
    };

    if let Some(v) = file_cfg.bind_addr {
        settings.server_bind = v;
    }
    if let Some(v) = file_cfg.database_url {
        settings.database_url = Some(v);
    }
    if let Some(v) = file_cfg.resend_api_url {
        settings.resend_api_url = v;
    }
    if let Some(v) = file_cfg.mail_from {
        settings.mail_from = v;
    }
    if let Some(v) = file_cfg.write_timeout_ms {
        settings.write_timeout_ms = v;
    }
    if let Some(v) = file_cfg.notify_timeout_ms {
        settings.notify_timeout_ms = v;
    }
}

fn apply_env_settings(settings: &mut Settings, env: impl Fn(&str) -> Option<String>) {
    if let Some(v) = env("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = env("DATABASE_URL") {
        settings.database_url = Some(v);
    }
    if let Some(v) = env("APP__DATABASE_URL") {
        settings.database_url = Some(v);
    }

    if let Some(v) = env("RESEND_API_KEY") {
        settings.resend_api_key = Some(v);
    }
    if let Some(v) = env("APP__RESEND_API_KEY") {
        settings.resend_api_key = Some(v);
    }
    settings.resend_api_key = settings
        .resend_api_key
        .take()
        .filter(|key| !key.trim().is_empty());

    if let Some(v) = env("APP__RESEND_API_URL") {
        settings.resend_api_url = v;
    }

    if let Some(v) = env("MAIL_FROM") {
        settings.mail_from = v;
    }
    if let Some(v) = env("APP__MAIL_FROM") {
        settings.mail_from = v;
    }

    if let Some(v) = env("APP__WRITE_TIMEOUT_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.write_timeout_ms = parsed;
        }
    }
    if let Some(v) = env("APP__NOTIFY_TIMEOUT_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.notify_timeout_ms = parsed;
        }
    }
}

/// Normalised url, or `None` when blank. The sqlite file and its parent
/// directory are created by the store on first use.
pub fn prepare_database_url(raw_database_url: &str) -> Option<String> {
    normalize_database_url(raw_database_url)
}

fn normalize_database_url(raw_database_url: &str) -> Option<String> {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return None;
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return Some(raw_database_url.to_string());
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return Some(format!("sqlite://{path}"));
    }

    Some(format!("sqlite://{}", raw_database_url.replace('\\', "/")))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
