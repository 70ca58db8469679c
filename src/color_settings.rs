use crate::color::{Color, ParseColorError};
use crate::config::UserConfig;
use log::{debug, warn};
use thiserror::Error;

/// Brightness values outside this range are stored but flagged.
pub const BRIGHTNESS_RANGE: std::ops::RangeInclusive<i32> = 0..=100;

// The three toggle keys whose state drives the lamps
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MonitoredKey {
    NumLock,
    CapsLock,
    ScrollLock,
}

impl MonitoredKey {
    pub const ALL: [MonitoredKey; 3] = [
        MonitoredKey::NumLock,
        MonitoredKey::CapsLock,
        MonitoredKey::ScrollLock,
    ];

    /// Windows virtual key code, used as the key identity in saved configs.
    pub const fn virtual_key(self) -> u32 {
        match self {
            MonitoredKey::NumLock => 0x90,
            MonitoredKey::CapsLock => 0x14,
            MonitoredKey::ScrollLock => 0x91,
        }
    }

    pub fn from_virtual_key(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.virtual_key() == code)
    }
}

impl std::fmt::Display for MonitoredKey {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            MonitoredKey::NumLock => write!(f, "Num Lock"),
            MonitoredKey::CapsLock => write!(f, "Caps Lock"),
            MonitoredKey::ScrollLock => write!(f, "Scroll Lock"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum KeyState {
    On,
    Off,
}

impl KeyState {
    pub const ALL: [KeyState; 2] = [KeyState::On, KeyState::Off];
}

impl std::fmt::Display for KeyState {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            KeyState::On => write!(f, "On"),
            KeyState::Off => write!(f, "Off"),
        }
    }
}

/// Lamp colors for one key while it is toggled on and off.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct KeyColors {
    pub on: Color,
    pub off: Color,
}

impl KeyColors {
    pub fn get(&self, state: KeyState) -> Color {
        match state {
            KeyState::On => self.on,
            KeyState::Off => self.off,
        }
    }

    fn set(&mut self, state: KeyState, color: Color) {
        match state {
            KeyState::On => self.on = color,
            KeyState::Off => self.off = color,
        }
    }
}

impl Default for KeyColors {
    fn default() -> Self {
        Self {
            on: Color::RED,
            off: Color::BLUE,
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeError {
    #[error("user config is missing")]
    MissingConfig,
    #[error("user config has no monitored key list")]
    MissingKeyList,
}

/// Outcome of [`ColorSettings::merge_user_config`]. Records the lenient
/// cases the merge lets through so callers can surface them.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MergeReport {
    /// Records written into a key slot.
    pub applied: usize,
    /// Virtual key codes that matched no monitored key, in record order.
    pub ignored_keys: Vec<u32>,
    pub brightness_out_of_range: bool,
}

/// Colors for scroll lock, caps lock and num lock, plus the default color
/// and brightness used for everything else.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ColorSettings {
    pub num_lock: KeyColors,
    pub caps_lock: KeyColors,
    pub scroll_lock: KeyColors,
    pub default_color: Color,
    pub brightness: i32,
}

impl Default for ColorSettings {
    fn default() -> Self {
        Self {
            num_lock: KeyColors::default(),
            caps_lock: KeyColors::default(),
            scroll_lock: KeyColors::default(),
            default_color: Color::BLUE,
            brightness: 100,
        }
    }
}

impl ColorSettings {
    pub fn key_colors(&self, key: MonitoredKey) -> &KeyColors {
        match key {
            MonitoredKey::NumLock => &self.num_lock,
            MonitoredKey::CapsLock => &self.caps_lock,
            MonitoredKey::ScrollLock => &self.scroll_lock,
        }
    }

    pub fn key_colors_mut(&mut self, key: MonitoredKey) -> &mut KeyColors {
        match key {
            MonitoredKey::NumLock => &mut self.num_lock,
            MonitoredKey::CapsLock => &mut self.caps_lock,
            MonitoredKey::ScrollLock => &mut self.scroll_lock,
        }
    }

    pub fn set_key_color(&mut self, key: MonitoredKey, state: KeyState, color: Color) {
        self.key_colors_mut(key).set(state, color);
    }

    /// Accepts hex strings with or without the `#`. On error the stored
    /// color is left untouched.
    pub fn set_key_color_hex(
        &mut self,
        key: MonitoredKey,
        state: KeyState,
        color: &str,
    ) -> Result<(), ParseColorError> {
        let color = Color::from_hex(color)?;
        self.set_key_color(key, state, color);
        Ok(())
    }

    pub fn set_num_lock_on_color(&mut self, color: &str) -> Result<(), ParseColorError> {
        self.set_key_color_hex(MonitoredKey::NumLock, KeyState::On, color)
    }

    pub fn set_num_lock_off_color(&mut self, color: &str) -> Result<(), ParseColorError> {
        self.set_key_color_hex(MonitoredKey::NumLock, KeyState::Off, color)
    }

    pub fn set_caps_lock_on_color(&mut self, color: &str) -> Result<(), ParseColorError> {
        self.set_key_color_hex(MonitoredKey::CapsLock, KeyState::On, color)
    }

    pub fn set_caps_lock_off_color(&mut self, color: &str) -> Result<(), ParseColorError> {
        self.set_key_color_hex(MonitoredKey::CapsLock, KeyState::Off, color)
    }

    pub fn set_scroll_lock_on_color(&mut self, color: &str) -> Result<(), ParseColorError> {
        self.set_key_color_hex(MonitoredKey::ScrollLock, KeyState::On, color)
    }

    pub fn set_scroll_lock_off_color(&mut self, color: &str) -> Result<(), ParseColorError> {
        self.set_key_color_hex(MonitoredKey::ScrollLock, KeyState::Off, color)
    }

    pub fn set_default_color(&mut self, color: &str) -> Result<(), ParseColorError> {
        self.default_color = Color::from_hex(color)?;
        Ok(())
    }

    /// Stored as given. Range checking is up to the caller.
    pub fn set_brightness(&mut self, brightness: i32) {
        self.brightness = brightness;
    }

    pub fn is_brightness_in_range(&self) -> bool {
        BRIGHTNESS_RANGE.contains(&self.brightness)
    }

    pub fn as_hex(color: Color) -> String {
        color.to_hex()
    }

    /// Rebuilds the colors from a saved user config.
    ///
    /// Brightness and the default color are taken from the config first.
    /// Each monitored key record then overwrites its key's pair, with a zero
    /// color standing in for "use the default color just loaded". Keys with
    /// no record keep their current colors. Records are applied in order, so
    /// a later record for the same key wins.
    pub fn merge_user_config(
        &mut self,
        user_config: Option<&UserConfig>,
    ) -> Result<MergeReport, MergeError> {
        let user_config = user_config.ok_or(MergeError::MissingConfig)?;
        let records = user_config
            .monitored_keys_and_colors
            .as_ref()
            .ok_or(MergeError::MissingKeyList)?;

        let mut report = MergeReport::default();

        self.brightness = user_config.brightness;
        self.default_color = user_config.standard_key_color;
        if !self.is_brightness_in_range() {
            warn!(
                "Brightness {} from user config is outside {:?}; keeping it as-is.",
                self.brightness, BRIGHTNESS_RANGE
            );
            report.brightness_out_of_range = true;
        }

        // Resolved against the default loaded above, not the previous one
        let default_color = self.default_color;
        let resolve = |color: Color| if color.is_unset() { default_color } else { color };

        for record in records {
            let resolved = KeyColors {
                on: resolve(record.on_color),
                off: resolve(record.off_color),
            };

            match MonitoredKey::from_virtual_key(record.key) {
                Some(key) => {
                    debug!("Merging {}: on={} off={}", key, resolved.on, resolved.off);
                    *self.key_colors_mut(key) = resolved;
                    report.applied += 1;
                }
                None => {
                    warn!("Ignoring user config record for unknown key code {:#04X}", record.key);
                    report.ignored_keys.push(record.key);
                }
            }
        }

        Ok(report)
    }
}
