use crate::color::Color;
use crate::color_settings::{ColorSettings, MonitoredKey};
use fast_config::Config;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "lighting_key_indicator.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to open config at {path}: {message}")]
    Open { path: PathBuf, message: String },
    #[error("failed to save config: {0}")]
    Save(String),
}

// One saved key entry. A zero color means "use the standard key color".
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoredKeyRecord {
    pub key: u32, // Virtual key code
    #[serde(default)]
    pub on_color: Color,
    #[serde(default)]
    pub off_color: Color,
}

impl MonitoredKeyRecord {
    pub fn new(key: MonitoredKey, on_color: Color, off_color: Color) -> Self {
        Self {
            key: key.virtual_key(),
            on_color,
            off_color,
        }
    }
}

// User settings saved to JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default = "default_brightness")]
    pub brightness: i32,
    #[serde(default = "default_standard_key_color")]
    pub standard_key_color: Color,
    // Left as None when missing from the file, merge rejects that
    #[serde(default)]
    pub monitored_keys_and_colors: Option<Vec<MonitoredKeyRecord>>,
}

fn default_brightness() -> i32 {
    ColorSettings::default().brightness
}

fn default_standard_key_color() -> Color {
    ColorSettings::default().default_color
}

// A fresh config mirrors the built-in color settings
impl Default for UserConfig {
    fn default() -> Self {
        UserConfig::from(&ColorSettings::default())
    }
}

impl From<&ColorSettings> for UserConfig {
    fn from(settings: &ColorSettings) -> Self {
        let records = MonitoredKey::ALL
            .into_iter()
            .map(|key| {
                let colors = settings.key_colors(key);
                MonitoredKeyRecord::new(key, colors.on, colors.off)
            })
            .collect();

        Self {
            brightness: settings.brightness,
            standard_key_color: settings.default_color,
            monitored_keys_and_colors: Some(records),
        }
    }
}

/// `<config dir>/lighting_key_indicator.json`, falling back to the working
/// directory when the platform has no config dir.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_FILE_NAME)
}

/// Opens the config file, creating it from defaults if it doesn't exist.
pub fn open_user_config(path: &Path) -> Result<Config<UserConfig>, ConfigError> {
    let path_str = path.to_string_lossy().into_owned();
    Config::new(&path_str, UserConfig::default()).map_err(|e| ConfigError::Open {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Copies the live color settings into the config and writes it out.
pub fn save_color_settings(
    config: &mut Config<UserConfig>,
    settings: &ColorSettings,
) -> Result<(), ConfigError> {
    config.data = UserConfig::from(settings);
    config.save().map_err(|e| ConfigError::Save(e.to_string()))
}
