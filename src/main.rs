#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

use clap::Parser;
use eframe::egui;
use lighting_key_indicator::{config, Args, KeyIndicator, INITIAL_HEIGHT, INITIAL_WIDTH, PROGRAM_TITLE};
use std::process::exit;

// Application Entry Point
fn main() -> eframe::Result<()> {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();
    log::info!("Starting {}", PROGRAM_TITLE);

    let config_path = args.config.clone().unwrap_or_else(config::default_config_path);
    let user_config = match config::open_user_config(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("{}", e);
            exit(1)
        }
    };
    log::info!("Using config file {}", config_path.display());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([INITIAL_WIDTH, INITIAL_HEIGHT])
            .with_title(PROGRAM_TITLE),
        ..Default::default()
    };

    // The app is built on this thread, which makes it the affinity thread
    let app = KeyIndicator::new(user_config, config_path, &args);

    eframe::run_native(
        PROGRAM_TITLE,
        options,
        Box::new(move |cc| {
            app.attach_repaint(&cc.egui_ctx);
            Ok(Box::new(app))
        }),
    )
}
