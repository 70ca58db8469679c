use crate::about;
use crate::color::{Color, ParseColorError};
use crate::color_settings::{ColorSettings, KeyState, MonitoredKey, BRIGHTNESS_RANGE};
use crate::config::{self, UserConfig};
use crate::device::HidLampScanner;
use crate::dispatch::DispatchQueue;
use crate::observable::lock_or_recover;
use crate::state::State;
use crate::view_state::{Property, ViewState, Visibility, NO_DEVICE_SELECTED};
use crate::watcher::DeviceWatcher;
use crate::{Args, KeyIndicator, INITIAL_HEIGHT, INITIAL_WIDTH, PROGRAM_TITLE};
use eframe::egui::{self, Color32, Context, ScrollArea, Ui};
use eframe::glow;
use fast_config::Config;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const ERROR_COLOR: Color32 = Color32::from_rgb(255, 80, 80);

/// Text the user is editing for each color, plus the last apply error.
#[derive(Debug, Default, Clone)]
pub struct ColorInputs {
    pub key_text: HashMap<(MonitoredKey, KeyState), String>,
    pub default_text: String,
    pub brightness: i32,
    pub error: Option<String>,
}

impl ColorInputs {
    /// Resets every field from the committed settings.
    pub fn load_from(&mut self, settings: &ColorSettings) {
        for key in MonitoredKey::ALL {
            for state in KeyState::ALL {
                let color = settings.key_colors(key).get(state);
                self.key_text.insert((key, state), color.to_hex());
            }
        }
        self.default_text = settings.default_color.to_hex();
        self.brightness = settings.brightness;
        self.error = None;
    }

    /// Writes every edited value into `settings`, keys in display order.
    /// Stops at the first bad hex string.
    pub fn apply_to(&self, settings: &mut ColorSettings) -> Result<(), ParseColorError> {
        for key in MonitoredKey::ALL {
            for state in KeyState::ALL {
                if let Some(text) = self.key_text.get(&(key, state)) {
                    settings.set_key_color_hex(key, state, text)?;
                }
            }
        }
        settings.set_default_color(&self.default_text)?;
        settings.set_brightness(self.brightness);
        Ok(())
    }
}

// --- Lifecycle ---

impl KeyIndicator {
    /// Must be called on the UI thread: it becomes the affinity thread.
    pub fn new(config: Config<UserConfig>, config_path: PathBuf, args: &Args) -> Self {
        let queue = DispatchQueue::for_current_thread();
        let view_state = Arc::new(ViewState::new(queue.context()));

        let changed: Arc<Mutex<Vec<Property>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = changed.clone();
        view_state.subscribe(move |property| {
            log::trace!("UI: {} changed", property);
            lock_or_recover(&sink, "Changed properties").push(property);
        });

        Self {
            state: State::Initialising,
            view_state,
            queue,
            watcher: None,
            scan_interval: Duration::from_millis(args.scan_interval_ms),
            start_watcher_on_init: !args.no_watcher,
            changed,
            color_inputs: ColorInputs::default(),
            config,
            config_path,
        }
    }

    /// Wakes the UI whenever a notification is queued from another thread.
    pub fn attach_repaint(&self, ctx: &Context) {
        let ctx = ctx.clone();
        self.queue.context().set_waker(move || ctx.request_repaint());
    }

    // Initialization logic called once at the start
    fn init(&mut self) {
        self.merge_config();
        self.color_inputs.load_from(&self.view_state.color_settings());

        if self.start_watcher_on_init {
            self.start_watcher();
        }

        self.state = State::Running;
        log::info!("Initialization complete. State set to Running.");
    }

    fn merge_config(&mut self) {
        match self.view_state.merge_user_config(Some(&self.config.data)) {
            Ok(report) => {
                log::info!("Loaded {} key color record(s) from config.", report.applied);
                if !report.ignored_keys.is_empty() {
                    self.view_state.set_device_status_message(format!(
                        "Ignored {} unknown key(s) in config.",
                        report.ignored_keys.len()
                    ));
                }
            }
            Err(e) => {
                log::error!("Failed to merge user config: {}", e);
                self.view_state
                    .set_device_status_message(format!("Couldn't load saved colors: {}", e));
            }
        }
    }

    fn start_watcher(&mut self) {
        if self.watcher.is_some() {
            return;
        }
        self.watcher = Some(DeviceWatcher::start(
            self.view_state.clone(),
            HidLampScanner::new,
            self.scan_interval,
        ));
    }

    fn stop_watcher(&mut self) {
        if let Some(mut watcher) = self.watcher.take() {
            watcher.stop();
        }
    }

    /// Runs queued notifications and reacts to the ones we care about.
    pub fn process_notifications(&mut self) {
        self.queue.run_pending();
        self.reap_finished_watcher();
        let changed: Vec<Property> = std::mem::take(&mut *lock_or_recover(&self.changed, "Changed properties"));
        if changed.contains(&Property::ColorSettings) {
            // Re-read; the event doesn't carry the value
            self.color_inputs.load_from(&self.view_state.color_settings());
        }
    }

    /// Drops a watcher whose thread has already exited, e.g. when the
    /// scanner could not be created, so Start works again.
    pub fn reap_finished_watcher(&mut self) {
        if self.watcher.as_ref().is_some_and(|w| !w.is_running()) {
            log::debug!("Device watcher thread finished, releasing it.");
            self.stop_watcher();
        }
    }

    // Graceful shutdown logic
    fn shutdown_app(&mut self) {
        log::info!("Shutdown requested.");
        self.stop_watcher();

        if let Err(e) = config::save_color_settings(&mut self.config, &self.view_state.color_settings()) {
            log::error!("Failed to save configuration on exit: {}", e);
        } else {
            log::info!("Configuration saved.");
        }
        log::info!("Shutdown complete.");
    }

    // --- Button/Action Handlers (called from draw_running_state) ---

    fn handle_start_stop_toggle(&mut self) {
        if self.view_state.is_watcher_running() {
            self.stop_watcher();
            log::info!("Device watcher stopped.");
        } else {
            self.reap_finished_watcher();
            self.start_watcher();
            log::info!("Device watcher started.");
        }
    }

    fn handle_apply_colors(&mut self) {
        let inputs = self.color_inputs.clone();
        match self.view_state.update_color_settings(|settings| inputs.apply_to(settings)) {
            Ok(()) => {
                self.color_inputs.error = None;
                if !BRIGHTNESS_RANGE.contains(&inputs.brightness) {
                    log::warn!("Brightness {} is out of range.", inputs.brightness);
                }
            }
            Err(e) => {
                log::warn!("Rejected color edit: {}", e);
                self.color_inputs.error = Some(e.to_string());
            }
        }
    }

    fn handle_save_config(&mut self) {
        if let Err(e) = config::save_color_settings(&mut self.config, &self.view_state.color_settings()) {
            log::error!("Failed to manually save config: {}", e);
            self.color_inputs.error = Some(e.to_string());
        } else {
            log::info!("Configuration saved manually.");
        }
    }

    fn handle_reload_config(&mut self) {
        match config::open_user_config(&self.config_path) {
            Ok(config) => {
                self.config = config;
                self.merge_config();
            }
            Err(e) => {
                log::error!("Failed to reload config: {}", e);
                self.color_inputs.error = Some(e.to_string());
            }
        }
    }
}

// Main eframe application loop
impl eframe::App for KeyIndicator {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_notifications();

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::Resize::default()
                .default_width(INITIAL_WIDTH)
                .default_height(INITIAL_HEIGHT)
                .auto_sized()
                .show(ui, |ui| match self.state {
                    State::Initialising => {
                        ui.centered_and_justified(|ui| {
                            ui.label("Initialising...");
                        });
                        self.init();
                    }
                    State::About => draw_about_screen(self, ui),
                    State::Running => draw_running_state(self, ui, ctx),
                });
        });
    }

    // Called when the application is about to close
    fn on_exit(&mut self, _gl: Option<&glow::Context>) {
        self.shutdown_app();
    }
}

// --- UI Drawing Functions ---

/// Start/Stop button text, following the watcher thread's own state.
pub fn watcher_button_label(view_state: &ViewState) -> &'static str {
    if view_state.is_watcher_running() {
        "Stop Watcher"
    } else {
        "Start Watcher"
    }
}

pub(crate) fn draw_about_screen(app: &mut KeyIndicator, ui: &mut Ui) {
    ui.set_width(INITIAL_WIDTH);
    ui.vertical_centered(|ui| {
        ui.heading(format!("About {}", PROGRAM_TITLE));
        ui.separator();
        for line in about::about() {
            ui.label(line);
        }
        ui.separator();
        if ui.button("OK").clicked() {
            app.state = State::Running;
        }
    });
}

pub(crate) fn draw_running_state(app: &mut KeyIndicator, ui: &mut Ui, ctx: &Context) {
    ui.columns(2, |columns| {
        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(&mut columns[0], |ui| {
                ui.vertical(|ui| {
                    draw_status_section(app, ui);
                    ui.separator();
                    draw_colors_section(app, ui);
                    ui.add_space(10.0);
                });
            });

        columns[1].vertical(|ui| {
            draw_control_buttons(app, ui, ctx);
        });
    });
}

fn draw_status_section(app: &mut KeyIndicator, ui: &mut Ui) {
    let view_state = app.view_state.clone();

    ui.heading("Devices");
    ui.horizontal(|ui| {
        if view_state.watcher_running_visibility() == Visibility::Visible {
            ui.label(egui::RichText::new("WATCHING").color(Color32::GREEN));
        } else if view_state.is_watcher_stopped() {
            ui.label(egui::RichText::new("STOPPED").color(Color32::GRAY));
        }
        ui.label(view_state.device_watcher_status_message());
    });
    ui.label(view_state.device_status_message());
    ui.label(view_state.attached_devices_message());

    if view_state.has_no_attached_devices() {
        ui.colored_label(Color32::YELLOW, "Connect a Dynamic Lighting device to get started.");
        return;
    }

    let devices = view_state.attached_devices();
    let selected = view_state.selected_device_index();
    let selected_text = usize::try_from(selected)
        .ok()
        .and_then(|i| devices.get(i))
        .map(|d| d.to_string())
        .unwrap_or_else(|| "-SELECT DEVICE-".to_string());

    egui::ComboBox::from_id_salt("device_combo")
        .width(300.0)
        .selected_text(selected_text)
        .show_ui(ui, |ui| {
            for (j, device) in devices.iter().enumerate() {
                let j = j as i32;
                if ui.selectable_label(j == selected, device.to_string()).clicked() {
                    view_state.set_selected_device_index(j);
                }
            }
            if ui.selectable_label(selected == NO_DEVICE_SELECTED, "-NONE-").clicked() {
                view_state.set_selected_device_index(NO_DEVICE_SELECTED);
            }
        });
}

fn draw_colors_section(app: &mut KeyIndicator, ui: &mut Ui) {
    let settings = app.view_state.color_settings();

    ui.heading("Key Colors");
    egui::Grid::new("key_color_grid").num_columns(5).striped(true).show(ui, |ui| {
        for key in MonitoredKey::ALL {
            ui.label(key.to_string());
            for state in KeyState::ALL {
                let text = app.color_inputs.key_text.entry((key, state)).or_default();
                ui.add(egui::TextEdit::singleline(text).desired_width(80.0).hint_text(state.to_string()));
                color_swatch(ui, settings.key_colors(key).get(state));
            }
            ui.end_row();
        }

        ui.label("Default");
        ui.add(egui::TextEdit::singleline(&mut app.color_inputs.default_text).desired_width(80.0));
        color_swatch(ui, settings.default_color);
        ui.end_row();
    });

    ui.add(egui::Slider::new(&mut app.color_inputs.brightness, BRIGHTNESS_RANGE).text("Brightness"));

    if let Some(error) = &app.color_inputs.error {
        ui.colored_label(ERROR_COLOR, error.as_str());
    }
}

fn color_swatch(ui: &mut Ui, color: Color) {
    ui.label(egui::RichText::new("\u{25A0}").color(Color32::from_rgb(color.r, color.g, color.b)));
}

/// Draws the control buttons in the right column.
fn draw_control_buttons(app: &mut KeyIndicator, ui: &mut Ui, ctx: &Context) {
    let start_stop_text = watcher_button_label(&app.view_state);
    let start_stop_color = if app.view_state.is_watcher_running() {
        ERROR_COLOR
    } else {
        Color32::GREEN
    };
    if ui
        .button(
            egui::RichText::new(start_stop_text)
                .color(Color32::BLACK)
                .background_color(start_stop_color),
        )
        .clicked()
    {
        app.handle_start_stop_toggle();
    }

    if ui.button("Apply Colors").clicked() {
        app.handle_apply_colors();
    }
    if ui.button("Save Config").clicked() {
        app.handle_save_config();
    }
    if ui.button("Reload Config").clicked() {
        app.handle_reload_config();
    }

    if ui.button("About").clicked() {
        app.state = State::About;
    }

    if ui.button("Exit").clicked() {
        // Ask eframe to close the window. `on_exit` will be called.
        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
    }
}
