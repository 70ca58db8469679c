use lighting_key_indicator::color::Color;
use lighting_key_indicator::color_settings::{ColorSettings, KeyColors, MergeError, MonitoredKey};
use lighting_key_indicator::config::{MonitoredKeyRecord, UserConfig};

fn user_config(standard: Color, records: Vec<MonitoredKeyRecord>) -> UserConfig {
    UserConfig {
        brightness: 60,
        standard_key_color: standard,
        monitored_keys_and_colors: Some(records),
    }
}

#[test]
fn test_merge_zero_color_falls_back_to_standard_color() {
    let mut settings = ColorSettings::default();
    let config = user_config(
        Color::from_rgb(10, 20, 30),
        vec![MonitoredKeyRecord::new(
            MonitoredKey::NumLock,
            Color::BLACK,
            Color::from_rgb(99, 99, 99),
        )],
    );

    let report = settings.merge_user_config(Some(&config)).unwrap();

    assert_eq!(settings.num_lock.on, Color::from_rgb(10, 20, 30));
    assert_eq!(settings.num_lock.off, Color::from_rgb(99, 99, 99));
    assert_eq!(settings.default_color, Color::from_rgb(10, 20, 30));
    assert_eq!(settings.brightness, 60);
    assert_eq!(report.applied, 1);
    assert!(report.ignored_keys.is_empty());
    assert!(!report.brightness_out_of_range);
}

#[test]
fn test_merge_fallback_uses_new_default_not_old() {
    let mut settings = ColorSettings::default();
    settings.set_default_color("#123456").unwrap();

    let config = user_config(
        Color::from_rgb(200, 100, 50),
        vec![MonitoredKeyRecord::new(MonitoredKey::ScrollLock, Color::BLACK, Color::BLACK)],
    );
    settings.merge_user_config(Some(&config)).unwrap();

    let expected = Color::from_rgb(200, 100, 50);
    assert_eq!(settings.scroll_lock, KeyColors { on: expected, off: expected });
}

#[test]
fn test_merge_is_sparse() {
    let mut settings = ColorSettings::default();
    settings.set_caps_lock_on_color("#00FF00").unwrap();
    settings.set_caps_lock_off_color("#FFFF00").unwrap();
    let caps_before = settings.caps_lock;

    let config = user_config(
        Color::from_rgb(1, 1, 1),
        vec![
            MonitoredKeyRecord::new(MonitoredKey::NumLock, Color::from_rgb(5, 5, 5), Color::from_rgb(6, 6, 6)),
            MonitoredKeyRecord::new(MonitoredKey::ScrollLock, Color::from_rgb(7, 7, 7), Color::from_rgb(8, 8, 8)),
        ],
    );
    settings.merge_user_config(Some(&config)).unwrap();

    assert_eq!(settings.caps_lock, caps_before);
    assert_eq!(settings.num_lock.on, Color::from_rgb(5, 5, 5));
    assert_eq!(settings.scroll_lock.off, Color::from_rgb(8, 8, 8));
}

#[test]
fn test_merge_later_record_wins() {
    let mut settings = ColorSettings::default();
    let config = user_config(
        Color::from_rgb(1, 1, 1),
        vec![
            MonitoredKeyRecord::new(MonitoredKey::CapsLock, Color::from_rgb(11, 11, 11), Color::from_rgb(12, 12, 12)),
            MonitoredKeyRecord::new(MonitoredKey::CapsLock, Color::from_rgb(21, 21, 21), Color::BLACK),
        ],
    );

    let report = settings.merge_user_config(Some(&config)).unwrap();

    assert_eq!(settings.caps_lock.on, Color::from_rgb(21, 21, 21));
    // The earlier off color does not survive; the zero falls back to default
    assert_eq!(settings.caps_lock.off, Color::from_rgb(1, 1, 1));
    assert_eq!(report.applied, 2);
}

#[test]
fn test_merge_missing_config_changes_nothing() {
    let mut settings = ColorSettings::default();
    settings.set_num_lock_on_color("#ABCDEF").unwrap();
    let before = settings;

    assert_eq!(settings.merge_user_config(None), Err(MergeError::MissingConfig));
    assert_eq!(settings, before);
}

#[test]
fn test_merge_missing_key_list_changes_nothing() {
    let mut settings = ColorSettings::default();
    let before = settings;
    let config = UserConfig {
        brightness: 5,
        standard_key_color: Color::from_rgb(9, 9, 9),
        monitored_keys_and_colors: None,
    };

    assert_eq!(settings.merge_user_config(Some(&config)), Err(MergeError::MissingKeyList));
    assert_eq!(settings, before);
}

#[test]
fn test_merge_ignores_unknown_keys_and_reports_them() {
    let mut settings = ColorSettings::default();
    let before_keys = (settings.num_lock, settings.caps_lock, settings.scroll_lock);
    let config = user_config(
        Color::from_rgb(3, 3, 3),
        vec![
            MonitoredKeyRecord {
                key: 0x2D, // Insert isn't monitored
                on_color: Color::from_rgb(40, 40, 40),
                off_color: Color::from_rgb(41, 41, 41),
            },
            MonitoredKeyRecord {
                key: 0x15, // Kana
                on_color: Color::BLACK,
                off_color: Color::BLACK,
            },
        ],
    );

    let report = settings.merge_user_config(Some(&config)).unwrap();

    assert_eq!(report.applied, 0);
    assert_eq!(report.ignored_keys, vec![0x2D, 0x15]);
    assert_eq!((settings.num_lock, settings.caps_lock, settings.scroll_lock), before_keys);
    // Brightness and default still come from the config
    assert_eq!(settings.default_color, Color::from_rgb(3, 3, 3));
    assert_eq!(settings.brightness, 60);
}

#[test]
fn test_merge_accepts_out_of_range_brightness() {
    let mut settings = ColorSettings::default();
    let mut config = user_config(Color::BLUE, vec![]);
    config.brightness = 140;

    let report = settings.merge_user_config(Some(&config)).unwrap();

    assert_eq!(settings.brightness, 140);
    assert!(report.brightness_out_of_range);
}

#[test]
fn test_merge_empty_key_list_only_sets_brightness_and_default() {
    let mut settings = ColorSettings::default();
    let config = user_config(Color::from_rgb(77, 0, 77), vec![]);

    let report = settings.merge_user_config(Some(&config)).unwrap();

    assert_eq!(report.applied, 0);
    assert_eq!(settings.default_color, Color::from_rgb(77, 0, 77));
    for key in MonitoredKey::ALL {
        assert_eq!(*settings.key_colors(key), KeyColors::default());
    }
}
