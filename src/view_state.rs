use crate::color::ParseColorError;
use crate::color_settings::{ColorSettings, KeyState, MergeError, MergeReport, MonitoredKey};
use crate::config::UserConfig;
use crate::device::LampDevice;
use crate::dispatch::AffinityContext;
use crate::observable::{lock_or_recover, ObservableField, PropertyChanged, SubscriptionId};
use std::convert::Infallible;
use std::sync::Mutex;

/// Identity of every property the presentation layer can observe.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Property {
    DeviceStatusMessage,
    AttachedDevices,
    AttachedDevicesMessage,
    HasAttachedDevices,
    HasNoAttachedDevices, // Derived
    DeviceWatcherStatusMessage,
    IsWatcherRunning,
    IsWatcherStopped,         // Derived
    WatcherRunningVisibility, // Derived
    SelectedDeviceIndex,
    ColorSettings,
}

impl Property {
    pub fn name(&self) -> &'static str {
        match self {
            Property::DeviceStatusMessage => "DeviceStatusMessage",
            Property::AttachedDevices => "AttachedDevices",
            Property::AttachedDevicesMessage => "AttachedDevicesMessage",
            Property::HasAttachedDevices => "HasAttachedDevices",
            Property::HasNoAttachedDevices => "HasNoAttachedDevices",
            Property::DeviceWatcherStatusMessage => "DeviceWatcherStatusMessage",
            Property::IsWatcherRunning => "IsWatcherRunning",
            Property::IsWatcherStopped => "IsWatcherStopped",
            Property::WatcherRunningVisibility => "WatcherRunningVisibility",
            Property::SelectedDeviceIndex => "SelectedDeviceIndex",
            Property::ColorSettings => "ColorSettings",
        }
    }
}

impl std::fmt::Display for Property {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Collapsed,
}

/// Selected device index meaning "nothing selected".
pub const NO_DEVICE_SELECTED: i32 = -1;

/// UI-facing state shared between the device watcher and the presentation
/// layer. Every setter may be called from any thread; subscribers are
/// always notified on the affinity thread.
pub struct ViewState {
    notifier: PropertyChanged<Property>,

    device_status_message: ObservableField<String>,
    attached_devices: ObservableField<Vec<LampDevice>>,
    attached_devices_message: ObservableField<String>,
    has_attached_devices: ObservableField<bool>,
    device_watcher_status_message: ObservableField<String>,
    is_watcher_running: ObservableField<bool>,
    selected_device_index: ObservableField<i32>,
    color_settings: ObservableField<ColorSettings>,

    // Serializes read-modify-write edits of the color settings
    color_edit: Mutex<()>,
}

impl ViewState {
    pub fn new(context: AffinityContext) -> Self {
        Self {
            notifier: PropertyChanged::new(context),
            device_status_message: ObservableField::new(String::new()),
            attached_devices: ObservableField::new(Vec::new()),
            attached_devices_message: ObservableField::new(String::new()),
            has_attached_devices: ObservableField::new(false),
            device_watcher_status_message: ObservableField::new(String::new()),
            is_watcher_running: ObservableField::new(false),
            selected_device_index: ObservableField::new(NO_DEVICE_SELECTED),
            color_settings: ObservableField::new(ColorSettings::default()),
            color_edit: Mutex::new(()),
        }
    }

    // --- Subscriptions ---

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(Property) + Send + Sync + 'static,
    {
        self.notifier.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    /// Raises `property` with no backing field change.
    pub fn notify(&self, property: Property) {
        self.notifier.notify(property);
    }

    // --- Device status ---

    pub fn device_status_message(&self) -> String {
        self.device_status_message.get()
    }

    pub fn set_device_status_message(&self, message: impl Into<String>) -> bool {
        self.notifier.set_field(
            &self.device_status_message,
            message.into(),
            Property::DeviceStatusMessage,
        )
    }

    pub fn attached_devices(&self) -> Vec<LampDevice> {
        self.attached_devices.get()
    }

    pub fn set_attached_devices(&self, devices: Vec<LampDevice>) -> bool {
        self.notifier
            .set_field(&self.attached_devices, devices, Property::AttachedDevices)
    }

    pub fn attached_devices_message(&self) -> String {
        self.attached_devices_message.get()
    }

    pub fn set_attached_devices_message(&self, message: impl Into<String>) -> bool {
        self.notifier.set_field(
            &self.attached_devices_message,
            message.into(),
            Property::AttachedDevicesMessage,
        )
    }

    pub fn has_attached_devices(&self) -> bool {
        self.has_attached_devices.get()
    }

    pub fn has_no_attached_devices(&self) -> bool {
        !self.has_attached_devices()
    }

    pub fn set_has_attached_devices(&self, value: bool) -> bool {
        self.notifier.set_field_with(
            &self.has_attached_devices,
            value,
            &[Property::HasAttachedDevices, Property::HasNoAttachedDevices],
        )
    }

    // --- Watcher status ---

    pub fn device_watcher_status_message(&self) -> String {
        self.device_watcher_status_message.get()
    }

    pub fn set_device_watcher_status_message(&self, message: impl Into<String>) -> bool {
        self.notifier.set_field(
            &self.device_watcher_status_message,
            message.into(),
            Property::DeviceWatcherStatusMessage,
        )
    }

    pub fn is_watcher_running(&self) -> bool {
        self.is_watcher_running.get()
    }

    pub fn is_watcher_stopped(&self) -> bool {
        !self.is_watcher_running()
    }

    pub fn watcher_running_visibility(&self) -> Visibility {
        if self.is_watcher_running() {
            Visibility::Visible
        } else {
            Visibility::Collapsed
        }
    }

    pub fn set_is_watcher_running(&self, value: bool) -> bool {
        self.notifier.set_field_with(
            &self.is_watcher_running,
            value,
            &[
                Property::IsWatcherRunning,
                Property::IsWatcherStopped,
                Property::WatcherRunningVisibility,
            ],
        )
    }

    // --- Device selection ---

    pub fn selected_device_index(&self) -> i32 {
        self.selected_device_index.get()
    }

    pub fn set_selected_device_index(&self, index: i32) -> bool {
        self.notifier.set_field(
            &self.selected_device_index,
            index,
            Property::SelectedDeviceIndex,
        )
    }

    // --- Colors ---

    pub fn color_settings(&self) -> ColorSettings {
        self.color_settings.get()
    }

    pub fn set_color_settings(&self, settings: ColorSettings) -> bool {
        let changed = {
            let _edit = lock_or_recover(&self.color_edit, "Color edit");
            self.color_settings.replace_if_changed(settings)
        };
        if changed {
            self.notifier.notify(Property::ColorSettings);
        }
        changed
    }

    /// Applies `edit` to a copy of the color settings and commits the copy
    /// only if `edit` succeeds, so a failed edit leaves nothing half-written.
    /// Raises `ColorSettings` once if the committed value differs.
    pub fn update_color_settings<R, E>(
        &self,
        edit: impl FnOnce(&mut ColorSettings) -> Result<R, E>,
    ) -> Result<R, E> {
        let (result, changed) = {
            let _edit = lock_or_recover(&self.color_edit, "Color edit");
            let mut working = self.color_settings.get();
            let result = edit(&mut working)?;
            (result, self.color_settings.replace_if_changed(working))
        };
        // Edit lock is released before subscribers run
        if changed {
            self.notifier.notify(Property::ColorSettings);
        }
        Ok(result)
    }

    pub fn set_key_color_hex(
        &self,
        key: MonitoredKey,
        state: KeyState,
        color: &str,
    ) -> Result<(), ParseColorError> {
        self.update_color_settings(|settings| settings.set_key_color_hex(key, state, color))
    }

    pub fn set_default_color_hex(&self, color: &str) -> Result<(), ParseColorError> {
        self.update_color_settings(|settings| settings.set_default_color(color))
    }

    /// Stored unclamped. Returns whether the brightness changed.
    pub fn set_brightness(&self, brightness: i32) -> bool {
        let result = self.update_color_settings(|settings| {
            let changed = settings.brightness != brightness;
            settings.set_brightness(brightness);
            Ok::<bool, Infallible>(changed)
        });
        match result {
            Ok(changed) => changed,
            Err(never) => match never {},
        }
    }

    pub fn merge_user_config(
        &self,
        user_config: Option<&UserConfig>,
    ) -> Result<MergeReport, MergeError> {
        self.update_color_settings(|settings| settings.merge_user_config(user_config))
    }
}
