use std::{fs, path::Path, time::Duration};

use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_API_BASE_URL: &str = "https://skripsi.krayu.shop";
pub const DEFAULT_PHOTO_URL: &str = "https://example.com/default-profile-photo.jpg";
pub const SETTINGS_FILE: &str = "alumni.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub api_base_url: String,
    pub default_photo_url: String,
    /// No timeout unless configured; calls otherwise wait on reqwest's defaults.
    pub request_timeout_secs: Option<u64>,
    pub event_capacity: usize,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            default_photo_url: DEFAULT_PHOTO_URL.into(),
            request_timeout_secs: None,
            event_capacity: 64,
        }
    }
}

impl ClientSettings {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

/// Shape of `alumni.toml`; every key is optional and unknown keys are ignored.
#[derive(Debug, Deserialize)]
struct FileSettings {
    api_base_url: Option<String>,
    default_photo_url: Option<String>,
    request_timeout_secs: Option<u64>,
    event_capacity: Option<usize>,
}

pub fn load_settings() -> ClientSettings {
    let mut settings = load_settings_from(Path::new(SETTINGS_FILE));
    apply_overrides(&mut settings, |key| std::env::var(key).ok());
    settings
}

pub fn load_settings_from(path: &Path) -> ClientSettings {
    let mut settings = ClientSettings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.api_base_url {
                    settings.api_base_url = v;
                }
                if let Some(v) = file_cfg.default_photo_url {
                    settings.default_photo_url = v;
                }
                if let Some(v) = file_cfg.request_timeout_secs {
                    settings.request_timeout_secs = Some(v);
                }
                if let Some(v) = file_cfg.event_capacity {
                    settings.event_capacity = v.max(1);
                }
            }
            Err(err) => warn!(path = %path.display(), error = %err, "ignoring unreadable settings file"),
        }
    }

    settings.api_base_url = normalize_base_url(&settings.api_base_url);
    settings
}

pub fn apply_overrides(settings: &mut ClientSettings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("ALUMNI_API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = lookup("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = lookup("APP__DEFAULT_PHOTO_URL") {
        settings.default_photo_url = v;
    }

    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = Some(parsed);
        }
    }

    if let Some(v) = lookup("APP__EVENT_CAPACITY") {
        if let Ok(parsed) = v.parse::<usize>() {
            settings.event_capacity = parsed;
        }
    }

    settings.api_base_url = normalize_base_url(&settings.api_base_url);
    settings.event_capacity = settings.event_capacity.max(1);
}

pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return DEFAULT_API_BASE_URL.to_string();
    }
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}
