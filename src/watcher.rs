use crate::device::{describe_attached, DeviceScanner, LampDevice, ScanError};
use crate::view_state::{ViewState, NO_DEVICE_SELECTED};
use crate::SharedStateFlag;
use std::{
    sync::{Arc, Condvar, Mutex},
    thread::{self, JoinHandle},
    time::Duration,
};

pub const DEFAULT_SCAN_INTERVAL_MS: u64 = 1000;

/// Background thread that polls a [`DeviceScanner`] and publishes the
/// results to the device and watcher fields of [`ViewState`].
pub struct DeviceWatcher {
    run_state: SharedStateFlag, // Is the watcher thread supposed to run?
    handle: Option<JoinHandle<()>>,
}

impl DeviceWatcher {
    /// Spawns the watcher. The scanner is built inside the thread by
    /// `make_scanner`, so it never has to cross threads itself.
    pub fn start<S, F>(view_state: Arc<ViewState>, make_scanner: F, interval: Duration) -> Self
    where
        S: DeviceScanner + 'static,
        F: FnOnce() -> Result<S, ScanError> + Send + 'static,
    {
        log::info!("Starting device watcher thread...");
        let run_state: SharedStateFlag = Arc::new((Mutex::new(true), Condvar::new()));
        let thread_run_state = run_state.clone();

        let handle = thread::spawn(move || {
            match make_scanner() {
                Ok(scanner) => run_watcher_loop(&view_state, scanner, &thread_run_state, interval),
                Err(e) => {
                    log::error!("Failed to create device scanner: {}", e);
                    view_state.set_device_watcher_status_message(format!(
                        "Device watcher failed to start: {}",
                        e
                    ));
                }
            }
            // Also covers the early-exit paths above
            view_state.set_is_watcher_running(false);
            log::info!("Device watcher thread exiting.");
        });

        Self {
            run_state,
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        let running = match self.run_state.0.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => {
                log::error!("Watcher run state mutex poisoned!");
                **poisoned.get_ref()
            }
        };
        running && self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signals the thread to stop and waits for it to finish.
    pub fn stop(&mut self) {
        {
            let &(ref lock, ref cvar) = &*self.run_state;
            match lock.lock() {
                Ok(mut running) => *running = false,
                Err(poisoned) => {
                    log::error!("Watcher run state mutex poisoned during stop!");
                    *poisoned.into_inner() = false;
                }
            }
            cvar.notify_all(); // Wake the thread if it's waiting out the interval
        }

        if let Some(handle) = self.handle.take() {
            log::info!("Waiting for device watcher thread to stop...");
            if handle.join().is_err() {
                log::error!("Device watcher thread panicked.");
            }
        }
    }
}

impl Drop for DeviceWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn timestamp() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

fn run_watcher_loop<S: DeviceScanner>(
    view_state: &ViewState,
    mut scanner: S,
    run_state: &SharedStateFlag,
    interval: Duration,
) {
    view_state.set_is_watcher_running(true);
    view_state.set_device_watcher_status_message(format!("Device watcher started at {}", timestamp()));
    log::info!("Device watcher loop starting.");

    let &(ref run_lock, ref run_cvar) = &**run_state;
    let mut previous: Option<Vec<LampDevice>> = None;

    loop {
        // --- Scan ---
        match scanner.scan() {
            Ok(devices) => {
                publish_scan(view_state, previous.as_deref(), &devices);
                previous = Some(devices);
            }
            Err(e) => {
                log::warn!("Device scan failed: {}", e);
                view_state.set_device_status_message(format!("Device scan failed: {}", e));
            }
        }

        // --- Wait for the next interval or a stop signal ---
        let guard = match run_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::error!("Run state mutex poisoned in watcher loop!");
                poisoned.into_inner()
            }
        };
        let should_run = match run_cvar.wait_timeout_while(guard, interval, |running| *running) {
            Ok((guard, _)) => *guard,
            Err(poisoned) => *poisoned.into_inner().0,
        };

        if !should_run {
            log::info!("Stop signal received, exiting watcher loop.");
            break;
        }
    }

    view_state.set_device_watcher_status_message(format!("Device watcher stopped at {}", timestamp()));
}

/// Writes one scan result into the view state. `previous` is `None` on the
/// first scan.
pub fn publish_scan(view_state: &ViewState, previous: Option<&[LampDevice]>, devices: &[LampDevice]) {
    view_state.set_attached_devices(devices.to_vec());
    view_state.set_has_attached_devices(!devices.is_empty());
    view_state.set_attached_devices_message(describe_attached(devices));

    match previous {
        None => {
            let message = if devices.is_empty() {
                "No lighting devices found.".to_string()
            } else {
                format!("Found {} lighting device(s).", devices.len())
            };
            view_state.set_device_status_message(message);
        }
        Some(previous) => {
            let mut changes = Vec::new();
            for device in devices.iter().filter(|d| !previous.contains(d)) {
                log::info!("Lamp device attached: {}", device);
                changes.push(format!("Device attached: {}", device));
            }
            for device in previous.iter().filter(|d| !devices.contains(d)) {
                log::info!("Lamp device removed: {}", device);
                changes.push(format!("Device removed: {}", device));
            }
            if !changes.is_empty() {
                view_state.set_device_status_message(changes.join("; "));
            }
        }
    }

    follow_selection(view_state, previous, devices);
}

// Keeps the selection on the same device as the list changes, or clears it
// once that device is gone.
fn follow_selection(view_state: &ViewState, previous: Option<&[LampDevice]>, devices: &[LampDevice]) {
    let selected = view_state.selected_device_index();
    if selected == NO_DEVICE_SELECTED {
        return;
    }

    let selected_device = usize::try_from(selected)
        .ok()
        .and_then(|i| previous.unwrap_or(devices).get(i));
    let new_index = selected_device
        .and_then(|device| devices.iter().position(|d| d == device))
        .and_then(|i| i32::try_from(i).ok())
        .unwrap_or(NO_DEVICE_SELECTED);

    if new_index != selected {
        log::debug!("Selected device index {} -> {}", selected, new_index);
        view_state.set_selected_device_index(new_index);
    }
}
