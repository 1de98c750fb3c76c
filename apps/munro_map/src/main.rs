use std::path::PathBuf;

mod backend_bridge;
mod config;
mod controller;
mod ui;

use anyhow::anyhow;
use clap::Parser;
use crossbeam_channel::bounded;
use eframe::egui;
use shared::domain::MapVariant;
use tracing_subscriber::EnvFilter;

use backend_bridge::{commands::BackendCommand, runtime::BackendConfig};
use config::{load_settings, CliOverrides};
use controller::events::UiEvent;
use ui::MunroMapApp;

#[derive(Debug, Parser)]
#[command(name = "munro_map", about = "Scottish munros on a slippy map")]
struct Args {
    /// Settings file (defaults to ./munro_map.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Munro data endpoint returning a JSON array
    #[arg(long)]
    api_url: Option<String>,
    /// Tile URL template with {z}/{x}/{y} and optional {s}
    #[arg(long)]
    tile_url: Option<String>,
    /// `interactive` flies to clicked markers, `static` only opens popups
    #[arg(long, value_parser = parse_variant)]
    variant: Option<MapVariant>,
}

fn parse_variant(raw: &str) -> Result<MapVariant, String> {
    MapVariant::parse(raw).ok_or_else(|| format!("unknown variant '{raw}' (static|interactive)"))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let settings = load_settings(&CliOverrides {
        config_path: args.config,
        api_url: args.api_url,
        tile_url: args.tile_url,
        variant: args.variant,
    })?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let startup = settings.into_startup()?;
    tracing::info!(
        api_url = %startup.api_url,
        variant = startup.variant.label(),
        "starting munro map"
    );

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    backend_bridge::runtime::launch(
        cmd_rx,
        ui_tx,
        BackendConfig {
            api_url: startup.api_url.clone(),
            tile_source: startup.tile_source.clone(),
        },
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(format!("Munro Map ({})", startup.variant.label()))
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([480.0, 360.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Munro Map",
        options,
        Box::new(move |_cc| Ok(Box::new(MunroMapApp::new(cmd_tx, ui_rx, &startup)))),
    )
    .map_err(|err| anyhow!("window event loop failed: {err}"))
}
