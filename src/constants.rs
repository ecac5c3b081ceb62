//! Application constants
//!
//! Centralized location for magic strings and configuration defaults.

/// Base URL of the Kerem API when nothing else is configured
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";

/// Environment variable overriding the API base URL
pub const API_URL_ENV: &str = "KEREM_API_URL";

/// Directory (under the home directory) holding settings and the session token
pub const CONFIG_DIR_NAME: &str = ".kerem";

/// Settings file inside the config directory
pub const SETTINGS_FILE: &str = "config.yaml";

/// Fixed key the session token is persisted under
pub const TOKEN_KEY: &str = "token";

/// HTTP client timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Log file written next to the working directory
pub const LOG_FILE: &str = "kerem.log";

/// Initial map center (Jerusalem)
pub const DEFAULT_MAP_CENTER: (f64, f64) = (31.7683, 35.2137);

/// Initial map zoom level
pub const DEFAULT_MAP_ZOOM: u8 = 8;

/// Zoom level applied when a winery is selected
pub const SELECTED_MAP_ZOOM: u8 = 13;

/// Application name
pub const APP_NAME: &str = "Kerem Winery Explorer";
