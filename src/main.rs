use anyhow::Result;
use clap::Parser;
use eframe::egui;
use rusty_sieve::app::RustySieveApp;
use rusty_sieve::config::{Cli, ViewerConfig};
use rusty_sieve::state::AppState;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = ViewerConfig::resolve(&cli)?;

    let mut state = AppState::new(&config);
    // Loading finishes before the first frame, so filters never see a partial table.
    if let Some(path) = &cli.path {
        state.open_path(path);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Rusty Sieve – Table Filter",
        options,
        Box::new(|_cc| Ok(Box::new(RustySieveApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("running the viewer: {e}"))
}
