// src/config.rs
//! Environment-driven settings and the main-theme list.
//!
//! Every knob has a default so a bare checkout boots; API keys default to
//! empty and the owning client degrades to "no data" until they are set.

use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

pub const ENV_THEMES: &str = "MAIN_THEMES";
pub const ENV_THEMES_PATH: &str = "MAIN_THEMES_PATH";
const DEFAULT_THEMES_PATH: &str = "config/themes.toml";

#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: String,
    pub database_url: String,
    pub reports_dir: String,

    pub deepsearch_api_key: String,
    pub deepsearch_base_url: String,
    pub quote_base_url: String,
    pub fred_api_key: String,
    pub fred_base_url: String,

    /// Fast model (quick opinion + follow-up) behind an OpenAI-compatible
    /// gateway.
    pub quick_model_api_key: String,
    pub quick_model_base_url: String,
    pub quick_model: String,
    /// Report model.
    pub report_model_api_key: String,
    pub report_model_base_url: String,
    pub report_model: String,

    pub macro_interval: Duration,
    pub theme_interval: Duration,
    pub indicator_hour_utc: u32,
}

impl Settings {
    /// Read settings from the process environment (after `.env` loading).
    pub fn from_env() -> Self {
        Self {
            bind_addr: env_or("BIND_ADDR", "0.0.0.0:8000"),
            database_url: env_or("DATABASE_URL", "sqlite://data/insight.db"),
            reports_dir: env_or("REPORTS_DIR", "reports"),

            deepsearch_api_key: env_or("DEEPSEARCH_API_KEY", ""),
            deepsearch_base_url: env_or("DEEPSEARCH_BASE_URL", "https://api-v2.deepsearch.com"),
            quote_base_url: env_or("QUOTE_BASE_URL", "https://m.stock.naver.com"),
            fred_api_key: env_or("FRED_API_KEY", ""),
            fred_base_url: env_or("FRED_BASE_URL", "https://api.stlouisfed.org"),

            quick_model_api_key: env_or("NCP_API_KEY", ""),
            quick_model_base_url: env_or("NCP_APIGW_URL", "https://api.openai.com/v1"),
            quick_model: env_or("QUICK_MODEL", "HCX-003"),
            report_model_api_key: env_or("OPENAI_API_KEY", ""),
            report_model_base_url: env_or("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            report_model: env_or("REPORT_MODEL", "gpt-4o-mini"),

            macro_interval: Duration::from_secs(env_parse("NEWS_MACRO_INTERVAL_SECS", 600)),
            theme_interval: Duration::from_secs(env_parse("NEWS_THEME_INTERVAL_SECS", 610)),
            indicator_hour_utc: env_parse("INDICATOR_REFRESH_HOUR_UTC", 21).min(23),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    match env::var(key) {
        Ok(v) if !v.trim().is_empty() => v,
        _ => default.to_string(),
    }
}

fn env_parse<T: std::str::FromStr + Copy>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(v) => v.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %v, "unparseable env value, using default");
            default
        }),
        Err(_) => default,
    }
}

/// Main themes the themed-news job refreshes and the API serves from the
/// store. Resolution order:
/// 1) $MAIN_THEMES (comma-separated)
/// 2) $MAIN_THEMES_PATH (TOML file)
/// 3) config/themes.toml
/// 4) built-in default
pub fn load_main_themes_default() -> Vec<String> {
    if let Ok(raw) = env::var(ENV_THEMES) {
        let themes = clean_list(raw.split(',').map(str::to_string).collect());
        if !themes.is_empty() {
            return themes;
        }
    }

    if let Ok(p) = env::var(ENV_THEMES_PATH) {
        match load_themes_from(Path::new(&p)) {
            Ok(themes) if !themes.is_empty() => return themes,
            Ok(_) => warn!(path = %p, "theme config is empty, using default"),
            Err(e) => warn!(path = %p, error = ?e, "failed to load theme config, using default"),
        }
    } else {
        let default_path = PathBuf::from(DEFAULT_THEMES_PATH);
        if default_path.exists() {
            match load_themes_from(&default_path) {
                Ok(themes) if !themes.is_empty() => return themes,
                Ok(_) => {}
                Err(e) => warn!(error = ?e, "failed to load config/themes.toml, using default"),
            }
        }
    }

    builtin_main_themes()
}

pub fn builtin_main_themes() -> Vec<String> {
    vec!["반도체".to_string(), "2차전지".to_string(), "인공지능".to_string()]
}

fn load_themes_from(path: &Path) -> anyhow::Result<Vec<String>> {
    #[derive(Deserialize)]
    struct ThemesFile {
        themes: Vec<String>,
    }
    let content = std::fs::read_to_string(path)?;
    let parsed: ThemesFile = toml::from_str(&content)?;
    Ok(clean_list(parsed.themes))
}

/// Trim, drop empties, dedupe preserving first occurrence (theme order is
/// the refresh order).
fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for it in items {
        let t = it.trim();
        if !t.is_empty() && !out.iter().any(|x| x == t) {
            out.push(t.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_list_trims_dedupes_and_keeps_order() {
        let out = clean_list(vec![
            " 반도체 ".into(),
            "".into(),
            "2차전지".into(),
            "반도체".into(),
        ]);
        assert_eq!(out, vec!["반도체".to_string(), "2차전지".to_string()]);
    }

    #[test]
    fn themes_file_parses() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("themes.toml");
        std::fs::write(&p, "themes = [\"인공지능\", \"바이오/제약\"]\n").unwrap();
        let out = load_themes_from(&p).unwrap();
        assert_eq!(out, vec!["인공지능".to_string(), "바이오/제약".to_string()]);
    }

    #[serial_test::serial]
    #[test]
    fn env_list_takes_precedence() {
        env::set_var(ENV_THEMES, "반도체, 로봇");
        let out = load_main_themes_default();
        env::remove_var(ENV_THEMES);
        assert_eq!(out, vec!["반도체".to_string(), "로봇".to_string()]);
    }

    #[serial_test::serial]
    #[test]
    fn builtin_default_when_nothing_configured() {
        env::remove_var(ENV_THEMES);
        env::remove_var(ENV_THEMES_PATH);
        // Isolate CWD so a real config/themes.toml in the repo doesn't leak in.
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();
        let out = load_main_themes_default();
        env::set_current_dir(old).unwrap();
        assert_eq!(out, builtin_main_themes());
    }
}
