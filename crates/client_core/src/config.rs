use std::{fs, path::Path, time::Duration};

use serde::Deserialize;

use crate::debouncer::DEFAULT_DEBOUNCE;

pub const SETTINGS_FILE: &str = "term_picker.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    pub base_url: String,
    pub debounce: Duration,
    pub request_timeout: Duration,
    pub scroll_threshold_px: f64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/terms/".into(),
            debounce: DEFAULT_DEBOUNCE,
            request_timeout: Duration::from_secs(10),
            scroll_threshold_px: 100.0,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    base_url: Option<String>,
    debounce_ms: Option<u64>,
    request_timeout_secs: Option<u64>,
    scroll_threshold_px: Option<f64>,
}

pub fn load_settings() -> ClientSettings {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> ClientSettings {
    let mut settings = ClientSettings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.base_url {
                    settings.base_url = v;
                }
                if let Some(v) = file_cfg.debounce_ms {
                    settings.debounce = Duration::from_millis(v);
                }
                if let Some(v) = file_cfg.request_timeout_secs {
                    settings.request_timeout = Duration::from_secs(v);
                }
                if let Some(v) = file_cfg.scroll_threshold_px {
                    settings.scroll_threshold_px = v;
                }
            }
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "ignoring malformed settings file");
            }
        }
    }

    if let Some(v) = env("TERM_PICKER_BASE_URL") {
        settings.base_url = v;
    }
    if let Some(v) = env("APP__BASE_URL") {
        settings.base_url = v;
    }
    if let Some(parsed) = env("APP__DEBOUNCE_MS").and_then(|v| v.parse::<u64>().ok()) {
        settings.debounce = Duration::from_millis(parsed);
    }
    if let Some(parsed) = env("APP__REQUEST_TIMEOUT_SECS").and_then(|v| v.parse::<u64>().ok()) {
        settings.request_timeout = Duration::from_secs(parsed);
    }
    if let Some(parsed) = env("APP__SCROLL_THRESHOLD_PX").and_then(|v| v.parse::<f64>().ok()) {
        settings.scroll_threshold_px = parsed;
    }

    settings
}
