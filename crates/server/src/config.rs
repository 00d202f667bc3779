use std::{fs, path::Path};

use serde::Deserialize;

pub const SETTINGS_FILE: &str = "catalog_server.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub bind_addr: String,
    pub catalog_path: Option<String>,
    pub page_size: usize,
    pub tag_page_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8000".into(),
            catalog_path: None,
            page_size: 3,
            tag_page_size: 20,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    bind_addr: Option<String>,
    catalog_path: Option<String>,
    page_size: Option<usize>,
    tag_page_size: Option<usize>,
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

pub(crate) fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.bind_addr {
                    settings.bind_addr = v;
                }
                if let Some(v) = file_cfg.catalog_path {
                    settings.catalog_path = Some(v);
                }
                if let Some(v) = file_cfg.page_size {
                    settings.page_size = v;
                }
                if let Some(v) = file_cfg.tag_page_size {
                    settings.tag_page_size = v;
                }
            }
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "ignoring malformed settings file");
            }
        }
    }

    if let Some(v) = env("APP__BIND_ADDR") {
        settings.bind_addr = v;
    }
    if let Some(v) = env("APP__CATALOG_PATH") {
        settings.catalog_path = Some(v);
    }
    if let Some(parsed) = env("APP__PAGE_SIZE").and_then(|v| v.parse::<usize>().ok()) {
        settings.page_size = parsed;
    }
    if let Some(parsed) = env("APP__TAG_PAGE_SIZE").and_then(|v| v.parse::<usize>().ok()) {
        settings.tag_page_size = parsed;
    }

    settings
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
