#![warn(clippy::all, rust_2018_idioms)]
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

use std::path::PathBuf;

use inkshape::{PaintApp, Settings, spawn_feed};

/// Flag that reads newline-delimited gesture messages from stdin
const GESTURES_STDIN: &str = "--gestures-stdin";

fn main() -> eframe::Result {
    env_logger::init(); // Log to stderr (if you run with `RUST_LOG=debug`).

    let mut config_path = None;
    let mut gestures_stdin = false;
    for arg in std::env::args().skip(1) {
        if arg == GESTURES_STDIN {
            gestures_stdin = true;
        } else {
            config_path = Some(PathBuf::from(arg));
        }
    }

    let settings = Settings::load_or_default(config_path.as_deref())
        .map_err(|err| eframe::Error::AppCreation(Box::new(err)))?;
    let gestures = gestures_stdin.then(|| {
        log::info!("Reading gestures from stdin");
        spawn_feed(std::io::BufReader::new(std::io::stdin()))
    });

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Inkshape")
            .with_inner_size([
                settings.canvas.width as f32 + 220.0,
                settings.canvas.height as f32 + 20.0,
            ])
            .with_min_inner_size([480.0, 320.0]),
        ..Default::default()
    };

    eframe::run_native(
        "inkshape",
        native_options,
        Box::new(move |cc| {
            let app = PaintApp::new(cc, &settings, gestures)?;
            Ok(Box::new(app))
        }),
    )
}
