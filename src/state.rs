// Represents the current high-level state of the application UI
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum State {
    Initialising, // App is starting, merging config, starting the watcher
    Running,      // Main operational state, showing status and color editors
    About,        // Showing the about screen
}
