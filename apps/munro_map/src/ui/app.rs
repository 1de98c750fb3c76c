use client_core::{
    tiles::{TileId, TileSource},
    viewport::ViewMode,
    LoadScope,
};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use egui::TextureHandle;
use shared::domain::MapVariant;
use url::Url;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::{
    events::{err_label, TileEvent, UiError, UiErrorContext, UiEvent},
    orchestration::dispatch_backend_command,
    reducer::{LoadStatus, MapAppState},
};
use crate::ui::map_view::{MapInteraction, MapView};
use crate::ui::tile_cache::TileCache;

/// Everything the app needs at launch, resolved from settings.
#[derive(Debug, Clone)]
pub struct StartupConfig {
    pub api_url: Url,
    pub tile_source: TileSource,
    pub variant: MapVariant,
    pub tile_cache_capacity: usize,
}

pub struct MunroMapApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    state: MapAppState,
    map: MapView,
    tiles: TileCache<TextureHandle>,
    tile_source: TileSource,
    load_scope: LoadScope,
}

impl MunroMapApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        startup: &StartupConfig,
    ) -> Self {
        let state = MapAppState::new(startup.variant);
        let map = MapView::new(state.viewport(), state.viewport_revision());
        let mut app = Self {
            cmd_tx,
            ui_rx,
            state,
            map,
            tiles: TileCache::new(startup.tile_cache_capacity),
            tile_source: startup.tile_source.clone(),
            load_scope: LoadScope::new(),
        };
        app.request_munros();
        app
    }

    fn request_munros(&mut self) {
        if !self.state.begin_load() {
            return;
        }
        tracing::info!(variant = self.state.variant().label(), "requesting munros");
        let queued = dispatch_backend_command(
            &self.cmd_tx,
            BackendCommand::LoadMunros {
                scope: self.load_scope.clone(),
            },
            &mut self.state.status,
        );
        if !queued {
            let message = self.state.status.clone();
            self.state.apply_event(UiEvent::Error(UiError::from_message(
                UiErrorContext::BackendStartup,
                message,
            )));
        }
    }

    fn process_ui_events(&mut self, ctx: &egui::Context) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Tile(TileEvent::Loaded { tile, image }) => {
                    let color_image = egui::ColorImage::from_rgba_unmultiplied(
                        [image.width, image.height],
                        &image.rgba,
                    );
                    let texture = ctx.load_texture(
                        format!("tile:{tile}"),
                        color_image,
                        egui::TextureOptions::LINEAR,
                    );
                    self.tiles.insert(tile, texture);
                    tracing::trace!(%tile, held = self.tiles.len(), "tile texture ready");
                }
                UiEvent::Tile(TileEvent::Failed { tile, reason }) => {
                    tracing::debug!(%tile, "tile unavailable: {reason}");
                    self.tiles.mark_failed(tile);
                }
                other => self.state.apply_event(other),
            }
        }
    }

    fn apply_interaction(&mut self, interaction: MapInteraction) {
        for tile in interaction.tiles_to_fetch {
            self.request_tile(tile);
        }

        if let Some(id) = interaction.clicked_marker {
            if let Some(viewport) = self.state.marker_clicked(id) {
                tracing::info!(
                    lat = viewport.center.lat,
                    lng = viewport.center.lng,
                    zoom = viewport.zoom,
                    "marker selected"
                );
            }
        } else if interaction.clicked_empty || interaction.popup_closed {
            self.state.dismiss_popup();
        }
    }

    fn request_tile(&mut self, tile: TileId) {
        let mut status = String::new();
        if !dispatch_backend_command(&self.cmd_tx, BackendCommand::FetchTile { tile }, &mut status) {
            // Asked for again on a later frame.
            self.tiles.forget_pending(tile);
        }
    }

    fn show_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("map_top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.strong("Munro Map");
                ui.separator();
                ui.label(self.state.variant().label());
                ui.separator();
                if self.state.load_status() == LoadStatus::Loading {
                    ui.spinner();
                }
                ui.label(&self.state.status);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(format!("zoom {:.1}", self.map.camera().zoom));
                    if let ViewMode::Focused(_) = self.state.view_mode() {
                        if let Some(record) = self.state.popup_record() {
                            ui.label(format!("Focused on {}", record.name));
                        } else {
                            ui.label("Focused");
                        }
                    }
                });
            });
            self.show_status_banner(ui);
        });
    }

    fn show_status_banner(&mut self, ui: &mut egui::Ui) {
        let Some(banner) = self.state.status_banner().cloned() else {
            return;
        };

        egui::Frame::NONE
            .fill(egui::Color32::from_rgb(111, 53, 53))
            .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(175, 96, 96)))
            .corner_radius(8.0)
            .inner_margin(egui::Margin::symmetric(10, 8))
            .show(ui, |ui| {
                ui.horizontal_wrapped(|ui| {
                    ui.label(
                        egui::RichText::new(format!(
                            "{} error while {}: {}",
                            err_label(banner.category()),
                            banner.context().label(),
                            banner.message()
                        ))
                        .color(egui::Color32::WHITE),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("Dismiss").clicked() {
                            self.state.dismiss_banner();
                        }
                    });
                });
            });
        ui.add_space(4.0);
    }
}

impl eframe::App for MunroMapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events(ctx);

        let now = ctx.input(|i| i.time);
        self.map
            .sync_viewport(self.state.viewport(), self.state.viewport_revision(), now);
        self.map.advance(now);

        self.show_top_bar(ctx);

        let interaction = egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                self.map
                    .show(ui, &self.state, &mut self.tiles, &self.tile_source)
            })
            .inner;
        self.apply_interaction(interaction);

        if self.map.is_animating() {
            ctx.request_repaint();
        } else if self.tiles.pending_count() > 0
            || self.state.load_status() == LoadStatus::Loading
        {
            ctx.request_repaint_after(std::time::Duration::from_millis(16));
        } else {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }
}

impl Drop for MunroMapApp {
    fn drop(&mut self) {
        self.load_scope.cancel();
    }
}
