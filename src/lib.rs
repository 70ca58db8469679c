// Export modules for testing
pub mod about;
pub mod color;
pub mod color_settings;
pub mod config;
pub mod device;
pub mod dispatch;
pub mod observable;
pub mod state;
pub mod ui;
pub mod view_state;
pub mod watcher;

// Re-export main types for testing
pub use crate::color::{Color, ParseColorError};
pub use crate::color_settings::{ColorSettings, KeyState, MergeError, MergeReport, MonitoredKey};
pub use crate::config::{MonitoredKeyRecord, UserConfig};
pub use crate::dispatch::{AffinityContext, DispatchQueue};
pub use crate::state::State;
pub use crate::view_state::{Property, ViewState};

// Constants
pub const PROGRAM_TITLE: &str = "Lighting Key Indicator";
pub const INITIAL_WIDTH: f32 = 640.0;
pub const INITIAL_HEIGHT: f32 = 420.0;

// Type aliases for shared state
pub use std::sync::{Arc, Condvar, Mutex};
pub type SharedStateFlag = Arc<(Mutex<bool>, Condvar)>;

// Args struct for command line parsing
use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the user config file (defaults to the platform config dir)
    #[arg(short, long)]
    pub config: Option<std::path::PathBuf>,

    /// Don't start the device watcher on launch
    #[arg(long, default_value_t = false)]
    pub no_watcher: bool,

    /// Device scan interval in milliseconds
    #[arg(long, default_value_t = watcher::DEFAULT_SCAN_INTERVAL_MS)]
    pub scan_interval_ms: u64,
}

pub use fast_config::Config;

// The main application struct
pub struct KeyIndicator {
    // State
    pub state: State,

    // Shared with the device watcher thread; notifications land on `queue`
    pub view_state: Arc<ViewState>,
    pub queue: DispatchQueue,
    pub watcher: Option<watcher::DeviceWatcher>,
    pub scan_interval: std::time::Duration,
    pub start_watcher_on_init: bool,

    // Properties raised since the last frame, filled by our subscription
    pub changed: Arc<Mutex<Vec<Property>>>,

    // Hex text being edited in the color fields
    pub color_inputs: ui::ColorInputs,

    // Configuration
    pub config: Config<UserConfig>,
    pub config_path: std::path::PathBuf,
}
