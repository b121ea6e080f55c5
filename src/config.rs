//! Application configuration
//!
//! Compile-time constants grouped by concern, plus the runtime [`Settings`]
//! layered from defaults, an optional settings file and the environment.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::{log_debug, log_info, log_warn};

const MODULE: &str = "config";

/// Application identity
pub mod app {
    /// Application name (used for config and data directories)
    pub const NAME: &str = "car-price-client";
    /// User agent sent with every request
    pub const USER_AGENT: &str = concat!("Car-Price-Client/", env!("CARGO_PKG_VERSION"));
    /// Number of log lines kept in memory
    pub const LOG_BUFFER_LINES: usize = 500;
    /// Settings file name inside the config directory
    pub const SETTINGS_FILE: &str = "settings.json";
}

/// Remote service endpoints
pub mod urls {
    /// Default prediction service root
    pub const DEFAULT_API_URL: &str = "http://localhost:5000";
    /// Liveness check
    pub const ROOT: &str = "/";
    /// Categorical option sets
    pub const GET_OPTIONS: &str = "/get_options";
    /// Structured prediction
    pub const PREDICT: &str = "/predict";
    /// Image prediction
    pub const PREDICT_IMAGE: &str = "/predict_image";
}

/// Request ceilings
pub mod timeouts {
    use std::time::Duration;

    pub const PROBE: Duration = Duration::from_secs(3);
    pub const PREDICT: Duration = Duration::from_secs(10);
    /// Longer to leave room for server-side image inference
    pub const PREDICT_IMAGE: Duration = Duration::from_secs(15);
}

/// Image upload constraints
pub mod image {
    /// Declared MIME types accepted for upload
    pub const ACCEPTED_MIME_TYPES: &[&str] = &[
        "image/jpeg",
        "image/jpg",
        "image/png",
        "image/gif",
        "image/webp",
        "image/bmp",
    ];
    /// Maximum upload size (10 MiB)
    pub const MAX_SIZE_BYTES: u64 = 10 * 1024 * 1024;
    /// MIME type used when the extension is unknown
    pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";
}

/// Form defaults and numeric bounds
///
/// The defaults are representative medians of the training data and shape
/// the first prediction a user sees, so they must not drift.
pub mod form {
    pub const DEFAULT_MODEL_YEAR: i32 = 2020;
    pub const DEFAULT_MILEAGE: u32 = 53_000;
    pub const DEFAULT_HORSEPOWER: f64 = 250.0;
    pub const DEFAULT_ENGINE_SIZE: f64 = 3.0;
    pub const DEFAULT_HAS_ACCIDENT: u8 = 0;
    pub const DEFAULT_IS_CLEAN_TITLE: u8 = 1;

    pub const MIN_MODEL_YEAR: i32 = 1990;
    pub const MIN_MILEAGE: u32 = 0;
    pub const MAX_MILEAGE: u32 = 410_000;
    pub const MIN_HORSEPOWER: f64 = 50.0;
    pub const MIN_ENGINE_SIZE: f64 = 1.0;
    pub const MAX_ENGINE_SIZE: f64 = 8.0;
}

/// Environment variable overriding the service URL
pub const ENV_API_URL: &str = "CAR_PRICE_API_URL";
/// Environment variable enabling developer mode ("1" or "true")
pub const ENV_DEVELOPER_MODE: &str = "CAR_PRICE_DEVELOPER_MODE";

/// Runtime settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Prediction service root, without trailing slash
    pub api_url: String,
    /// Enables DEBUG logging and stderr echo
    pub developer_mode: bool,
    pub probe_timeout: Duration,
    pub predict_timeout: Duration,
    pub image_predict_timeout: Duration,
    /// `None` leaves the options request unbounded
    pub options_timeout: Option<Duration>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: urls::DEFAULT_API_URL.to_string(),
            developer_mode: false,
            probe_timeout: timeouts::PROBE,
            predict_timeout: timeouts::PREDICT,
            image_predict_timeout: timeouts::PREDICT_IMAGE,
            options_timeout: None,
        }
    }
}

/// On-disk settings; every field is optional and only overrides the default
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SettingsFile {
    api_url: Option<String>,
    developer_mode: Option<bool>,
    probe_timeout_ms: Option<u64>,
    predict_timeout_ms: Option<u64>,
    image_predict_timeout_ms: Option<u64>,
    options_timeout_ms: Option<u64>,
}

impl Settings {
    /// Settings pointing at a specific service root, everything else default
    pub fn with_api_url(api_url: &str) -> Self {
        Self {
            api_url: normalize_api_url(api_url),
            ..Self::default()
        }
    }

    /// Load settings: defaults, then the settings file, then the environment
    pub fn load() -> Self {
        let mut settings = Self::default();

        if let Some(path) = settings_path() {
            match std::fs::read_to_string(&path) {
                Ok(content) => match settings.apply_json(&content) {
                    Ok(()) => log_info!(MODULE, "Loaded settings from {}", path.display()),
                    Err(e) => log_warn!(
                        MODULE,
                        "Ignoring malformed settings file {}: {}",
                        path.display(),
                        e
                    ),
                },
                Err(_) => log_debug!(MODULE, "No settings file at {}", path.display()),
            }
        }

        settings.apply_env(
            std::env::var(ENV_API_URL).ok(),
            std::env::var(ENV_DEVELOPER_MODE).ok(),
        );
        settings
    }

    /// Overlay values from a settings JSON document
    fn apply_json(&mut self, content: &str) -> Result<(), String> {
        let file: SettingsFile =
            serde_json::from_str(content).map_err(|e| format!("Invalid JSON: {}", e))?;

        if let Some(url) = file.api_url {
            self.api_url = normalize_api_url(&url);
        }
        if let Some(dev) = file.developer_mode {
            self.developer_mode = dev;
        }
        if let Some(ms) = file.probe_timeout_ms {
            self.probe_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = file.predict_timeout_ms {
            self.predict_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = file.image_predict_timeout_ms {
            self.image_predict_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = file.options_timeout_ms {
            self.options_timeout = Some(Duration::from_millis(ms));
        }
        Ok(())
    }

    fn apply_env(&mut self, api_url: Option<String>, developer_mode: Option<String>) {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.api_url = normalize_api_url(&url);
        }
        if let Some(flag) = developer_mode {
            self.developer_mode = matches!(flag.trim().to_lowercase().as_str(), "1" | "true" | "yes");
        }
    }
}

/// Path of the settings file in the user's config directory
pub fn settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(app::NAME).join(app::SETTINGS_FILE))
}

fn normalize_api_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
