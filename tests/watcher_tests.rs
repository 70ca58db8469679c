use lighting_key_indicator::device::{DeviceScanner, LampDevice, ScanError};
use lighting_key_indicator::dispatch::DispatchQueue;
use lighting_key_indicator::view_state::{Property, ViewState, NO_DEVICE_SELECTED};
use lighting_key_indicator::watcher::{publish_scan, DeviceWatcher};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

const TEST_INTERVAL: Duration = Duration::from_millis(5);

// Plays back scripted scan results, repeating the last one once exhausted
struct ScriptedScanner {
    script: VecDeque<Result<Vec<LampDevice>, String>>,
    last: Vec<LampDevice>,
}

impl ScriptedScanner {
    fn new(script: Vec<Result<Vec<LampDevice>, String>>) -> Self {
        Self {
            script: script.into(),
            last: Vec::new(),
        }
    }
}

impl DeviceScanner for ScriptedScanner {
    fn scan(&mut self) -> Result<Vec<LampDevice>, ScanError> {
        match self.script.pop_front() {
            Some(Ok(devices)) => {
                self.last = devices.clone();
                Ok(devices)
            }
            Some(Err(message)) => Err(ScanError::Other(message)),
            None => Ok(self.last.clone()),
        }
    }
}

fn lamp(name: &str) -> LampDevice {
    LampDevice {
        name: name.to_string(),
        vendor_id: 0x1532,
        product_id: 0x0266,
        serial_number: name.to_lowercase(),
    }
}

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    false
}

fn recording_view_state() -> (DispatchQueue, Arc<ViewState>, Arc<Mutex<Vec<Property>>>) {
    let queue = DispatchQueue::for_current_thread();
    let view_state = Arc::new(ViewState::new(queue.context()));
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();
    view_state.subscribe(move |property| sink.lock().unwrap().push(property));
    (queue, view_state, log)
}

#[test]
fn test_watcher_publishes_scans_and_stops() {
    let (queue, view_state, log) = recording_view_state();
    let script = vec![
        Ok(vec![]),
        Ok(vec![lamp("Alpha")]),
        Ok(vec![lamp("Alpha"), lamp("Bravo")]),
        Ok(vec![lamp("Bravo")]),
    ];

    let mut watcher = DeviceWatcher::start(
        view_state.clone(),
        move || Ok(ScriptedScanner::new(script)),
        TEST_INTERVAL,
    );

    assert!(wait_until(|| view_state.device_status_message().contains("Device removed: Alpha")));
    assert_eq!(view_state.attached_devices(), vec![lamp("Bravo")]);
    assert!(view_state.is_watcher_running());
    assert!(view_state.has_attached_devices());
    assert!(view_state.device_watcher_status_message().starts_with("Device watcher started at"));

    watcher.stop();
    assert!(!watcher.is_running());
    assert!(!view_state.is_watcher_running());
    assert!(view_state.device_watcher_status_message().starts_with("Device watcher stopped at"));

    // Nothing reached the subscriber until the affinity thread drained the queue
    assert!(log.lock().unwrap().is_empty());
    queue.run_pending();
    let raised = log.lock().unwrap().clone();

    assert_eq!(raised.first(), Some(&Property::IsWatcherRunning));
    assert_eq!(raised.get(1), Some(&Property::IsWatcherStopped));
    assert_eq!(raised.get(2), Some(&Property::WatcherRunningVisibility));
    let attached = raised
        .iter()
        .position(|p| *p == Property::HasAttachedDevices)
        .expect("attached devices raised");
    assert_eq!(raised[attached + 1], Property::HasNoAttachedDevices);
    assert_eq!(
        raised.iter().filter(|p| **p == Property::IsWatcherRunning).count(),
        2 // Started, then stopped
    );
}

#[test]
fn test_watcher_reports_scan_errors() {
    let (_queue, view_state, _log) = recording_view_state();
    // The repeated scans after the error find nothing new, so the error stays up
    let script = vec![Ok(vec![lamp("Alpha")]), Err("device busy".to_string())];

    let mut watcher = DeviceWatcher::start(
        view_state.clone(),
        move || Ok(ScriptedScanner::new(script)),
        TEST_INTERVAL,
    );

    assert!(wait_until(|| view_state.device_status_message() == "Device scan failed: device busy"));
    watcher.stop();
    assert!(!view_state.is_watcher_running());
    assert_eq!(view_state.attached_devices(), vec![lamp("Alpha")]);
}

#[test]
fn test_watcher_scanner_creation_failure() {
    let (_queue, view_state, _log) = recording_view_state();

    let mut watcher = DeviceWatcher::start(
        view_state.clone(),
        || -> Result<ScriptedScanner, ScanError> { Err(ScanError::Other("no HID backend".to_string())) },
        TEST_INTERVAL,
    );

    assert!(wait_until(|| !watcher.is_running()));
    watcher.stop();
    assert_eq!(
        view_state.device_watcher_status_message(),
        "Device watcher failed to start: no HID backend"
    );
    assert!(!view_state.is_watcher_running());
}

#[test]
fn test_publish_first_scan_messages() {
    let (_queue, view_state, _log) = recording_view_state();

    publish_scan(&view_state, None, &[]);
    assert_eq!(view_state.device_status_message(), "No lighting devices found.");
    assert!(view_state.has_no_attached_devices());

    publish_scan(&view_state, None, &[lamp("Alpha"), lamp("Bravo")]);
    assert_eq!(view_state.device_status_message(), "Found 2 lighting device(s).");
    assert!(view_state.has_attached_devices());
}

#[test]
fn test_publish_unchanged_scan_is_silent() {
    let (_queue, view_state, log) = recording_view_state();
    let devices = vec![lamp("Alpha")];

    publish_scan(&view_state, None, &devices);
    log.lock().unwrap().clear();

    publish_scan(&view_state, Some(devices.as_slice()), &devices);
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn test_publish_clears_stale_selection() {
    let (_queue, view_state, _log) = recording_view_state();
    let devices = vec![lamp("Alpha"), lamp("Bravo")];
    publish_scan(&view_state, None, &devices);
    view_state.set_selected_device_index(1);

    // Still in range
    publish_scan(&view_state, Some(devices.as_slice()), &devices);
    assert_eq!(view_state.selected_device_index(), 1);

    publish_scan(&view_state, Some(devices.as_slice()), &devices[..1]);
    assert_eq!(view_state.selected_device_index(), NO_DEVICE_SELECTED);
    assert_eq!(view_state.device_status_message(), format!("Device removed: {}", lamp("Bravo")));
}

#[test]
fn test_publish_clears_selection_of_removed_earlier_device() {
    let (_queue, view_state, _log) = recording_view_state();
    let devices = vec![lamp("Alpha"), lamp("Bravo")];
    publish_scan(&view_state, None, &devices);
    view_state.set_selected_device_index(0); // Alpha

    // Index 0 is still in range, but Alpha is gone
    publish_scan(&view_state, Some(devices.as_slice()), &[lamp("Bravo")]);

    assert_eq!(view_state.selected_device_index(), NO_DEVICE_SELECTED);
    assert_eq!(view_state.device_status_message(), format!("Device removed: {}", lamp("Alpha")));
}

#[test]
fn test_publish_selection_follows_device_to_new_index() {
    let (_queue, view_state, log) = recording_view_state();
    let devices = vec![lamp("Alpha"), lamp("Bravo")];
    publish_scan(&view_state, None, &devices);
    view_state.set_selected_device_index(1); // Bravo
    log.lock().unwrap().clear();

    publish_scan(&view_state, Some(devices.as_slice()), &[lamp("Bravo")]);
    assert_eq!(view_state.selected_device_index(), 0);
    assert!(log.lock().unwrap().contains(&Property::SelectedDeviceIndex));

    // Alpha comes back ahead of Bravo
    let current = vec![lamp("Bravo")];
    publish_scan(&view_state, Some(current.as_slice()), &devices);
    assert_eq!(view_state.selected_device_index(), 1);
}

#[test]
fn test_first_scan_clears_out_of_range_selection() {
    let (_queue, view_state, _log) = recording_view_state();
    view_state.set_selected_device_index(4);

    publish_scan(&view_state, None, &[lamp("Alpha")]);

    assert_eq!(view_state.selected_device_index(), NO_DEVICE_SELECTED);
}
