use hidapi::{DeviceInfo, HidApi, HidError};
use log::{info, trace};
use std::collections::HashSet;
use thiserror::Error;

/// HID "Lighting And Illumination" usage page used by LampArray devices.
pub const LAMP_ARRAY_USAGE_PAGE: u16 = 0x59;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("HID API error: {0}")]
    Hid(#[from] HidError),
    #[error("{0}")]
    Other(String),
}

// Represents a discovered lighting device
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct LampDevice {
    pub name: String, // Product string
    pub vendor_id: u16,
    pub product_id: u16,
    pub serial_number: String,
}

// How the device is displayed in lists and status messages
impl std::fmt::Display for LampDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} (VID:{:04X} PID:{:04X} SN:{})",
            self.name,
            self.vendor_id,
            self.product_id,
            if self.serial_number.is_empty() { "N/A" } else { &self.serial_number }
        )
    }
}

/// Source of the currently attached lamp devices. The watcher thread polls
/// it; tests substitute a scripted one.
pub trait DeviceScanner {
    fn scan(&mut self) -> Result<Vec<LampDevice>, ScanError>;
}

/// Enumerates LampArray devices through hidapi.
pub struct HidLampScanner {
    hidapi: HidApi,
}

impl HidLampScanner {
    pub fn new() -> Result<Self, ScanError> {
        let hidapi = HidApi::new()?;
        info!("HidApi created for lamp device scanning.");
        Ok(Self { hidapi })
    }
}

impl DeviceScanner for HidLampScanner {
    fn scan(&mut self) -> Result<Vec<LampDevice>, ScanError> {
        self.hidapi.refresh_devices()?;

        let mut devices = Vec::new();
        let mut seen = HashSet::new();
        for device_info in self.hidapi.device_list() {
            if device_info.usage_page() != LAMP_ARRAY_USAGE_PAGE {
                continue;
            }
            let Some(device) = lamp_device_from_info(device_info) else {
                continue;
            };
            // hidapi reports one entry per interface/collection
            let key = (device.vendor_id, device.product_id, device.serial_number.clone());
            if seen.insert(key) {
                devices.push(device);
            } else {
                trace!("Skipping duplicate device entry: {}", device);
            }
        }

        devices.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(devices)
    }
}

fn lamp_device_from_info(device_info: &DeviceInfo) -> Option<LampDevice> {
    let vendor_id = device_info.vendor_id();
    let product_id = device_info.product_id();
    if vendor_id == 0 || product_id == 0 {
        return None;
    }

    Some(LampDevice {
        name: device_info
            .product_string()
            .unwrap_or("Unknown Lamp Device")
            .to_string(),
        vendor_id,
        product_id,
        serial_number: device_info.serial_number().unwrap_or("").to_string(),
    })
}

/// Human-readable summary for the attached devices field.
pub fn describe_attached(devices: &[LampDevice]) -> String {
    match devices.len() {
        0 => "No lighting devices attached.".to_string(),
        1 => format!("1 lighting device attached: {}", devices[0]),
        n => {
            let names: Vec<String> = devices.iter().map(|d| d.to_string()).collect();
            format!("{} lighting devices attached: {}", n, names.join(", "))
        }
    }
}
