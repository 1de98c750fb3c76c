//! Slippy-map surface: base tiles, one pin per munro, the open popup and the
//! attribution line, plus drag/scroll gestures and fly-to animation.

use std::time::Duration;

use client_core::{
    projection::{Camera, MapFrame, ScreenPoint},
    tiles::{TileId, TileSource},
    viewport::FlyTo,
};
use eframe::egui;
use egui::{Align2, Color32, FontId, Pos2, Rect, Sense, Stroke, TextureHandle};
use shared::domain::{MarkerId, PointRecord, ViewportState};

use crate::controller::reducer::MapAppState;
use crate::ui::tile_cache::{TileCache, TileLookup};

pub const MARKER_HEAD_RADIUS: f64 = 7.0;
/// Distance from the pin tip up to the centre of its head.
pub const MARKER_STEM: f64 = 16.0;
/// Scroll distance in points that changes zoom by one level.
const SCROLL_POINTS_PER_ZOOM_LEVEL: f32 = 120.0;
const ZOOM_BUTTON_SIZE: f32 = 26.0;

const MARKER_FILL: Color32 = Color32::from_rgb(42, 129, 203);
const MARKER_FILL_OPEN: Color32 = Color32::from_rgb(24, 84, 140);
const TILE_PLACEHOLDER: Color32 = Color32::from_rgb(221, 221, 221);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerPlacement {
    pub id: MarkerId,
    /// Position of the record in the loaded collection.
    pub index: usize,
    pub tip: ScreenPoint,
}

impl MarkerPlacement {
    fn head(&self) -> ScreenPoint {
        ScreenPoint::new(self.tip.x, self.tip.y - MARKER_STEM)
    }

    fn contains(&self, point: ScreenPoint) -> bool {
        let slack = MARKER_HEAD_RADIUS + 2.0;
        if self.head().distance_sq(point) <= slack * slack {
            return true;
        }
        (point.x - self.tip.x).abs() <= MARKER_HEAD_RADIUS
            && point.y <= self.tip.y
            && point.y >= self.tip.y - MARKER_STEM
    }
}

/// One placement per record, in collection order. Nothing is merged or
/// culled, so overlapping records produce overlapping pins.
pub fn layout_markers(records: &[PointRecord], frame: &MapFrame) -> Vec<MarkerPlacement> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| MarkerPlacement {
            id: record.id,
            index,
            tip: frame.geo_to_screen(record.position),
        })
        .collect()
}

/// Top-most pin under `point`. Later pins are drawn over earlier ones, so
/// they win.
pub fn marker_at(placements: &[MarkerPlacement], point: ScreenPoint) -> Option<&MarkerPlacement> {
    placements.iter().rev().find(|placement| placement.contains(point))
}

#[derive(Debug, Default)]
pub struct MapInteraction {
    pub clicked_marker: Option<MarkerId>,
    pub clicked_empty: bool,
    pub popup_closed: bool,
    /// Tiles seen for the first time this frame; the caller requests them.
    pub tiles_to_fetch: Vec<TileId>,
}

struct ActiveFly {
    fly: FlyTo,
    started_at: f64,
}

pub struct MapView {
    camera: Camera,
    fly: Option<ActiveFly>,
    synced_revision: u64,
}

impl MapView {
    pub fn new(viewport: ViewportState, revision: u64) -> Self {
        Self {
            camera: Camera::from(viewport),
            fly: None,
            synced_revision: revision,
        }
    }

    pub fn camera(&self) -> Camera {
        self.camera
    }

    pub fn is_animating(&self) -> bool {
        self.fly.is_some()
    }

    /// Starts flying to `viewport` whenever the controller's revision moved
    /// past the one last seen. `now` is in seconds.
    pub fn sync_viewport(&mut self, viewport: ViewportState, revision: u64, now: f64) {
        if revision == self.synced_revision {
            return;
        }
        self.synced_revision = revision;
        let target = Camera::from(viewport);
        tracing::debug!(
            lat = target.center.lat,
            lng = target.center.lng,
            zoom = target.zoom,
            "flying to viewport"
        );
        self.fly = Some(ActiveFly {
            fly: FlyTo::new(self.camera, target),
            started_at: now,
        });
    }

    pub fn advance(&mut self, now: f64) {
        let Some(active) = &self.fly else {
            return;
        };
        let elapsed = Duration::from_secs_f64((now - active.started_at).max(0.0));
        self.camera = active.fly.sample(elapsed);
        if active.fly.is_finished(elapsed) {
            self.fly = None;
        }
    }

    fn pan(&mut self, dx: f64, dy: f64) {
        self.fly = None;
        self.camera = self.camera.panned(dx, dy);
    }

    fn zoom_by(&mut self, anchor: ScreenPoint, width: f64, height: f64, levels: f64) {
        if levels == 0.0 {
            return;
        }
        self.fly = None;
        let zoom = self.camera.zoom + levels;
        self.camera = self.camera.zoomed_around(anchor, width, height, zoom);
    }

    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        state: &MapAppState,
        tiles: &mut TileCache<TextureHandle>,
        source: &TileSource,
    ) -> MapInteraction {
        let mut interaction = MapInteraction::default();
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let width = f64::from(rect.width());
        let height = f64::from(rect.height());

        if response.dragged() {
            let delta = response.drag_delta();
            self.pan(f64::from(delta.x), f64::from(delta.y));
        }
        if response.hovered() {
            let (scroll, pinch) = ui.input(|i| (i.smooth_scroll_delta.y, i.zoom_delta()));
            let levels = f64::from(scroll / SCROLL_POINTS_PER_ZOOM_LEVEL) + f64::from(pinch.log2());
            if let Some(pointer) = response.hover_pos() {
                self.zoom_by(to_screen(rect, pointer), width, height, levels);
            }
        }

        let frame = MapFrame::new(self.camera, width, height);
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, TILE_PLACEHOLDER);
        self.paint_tiles(&painter, rect, &frame, tiles, &mut interaction);

        let placements = layout_markers(state.records(), &frame);
        let open = state.popup_record().map(|record| record.id);
        for placement in &placements {
            paint_marker(&painter, rect, placement, open == Some(placement.id));
        }

        if response.clicked() {
            let hit = response
                .interact_pointer_pos()
                .and_then(|pos| marker_at(&placements, to_screen(rect, pos)));
            match hit {
                Some(placement) => interaction.clicked_marker = Some(placement.id),
                None => interaction.clicked_empty = true,
            }
        }

        self.show_zoom_buttons(ui, rect);
        show_attribution(ui, rect, source);

        if let Some(record) = state.popup_record() {
            if let Some(placement) = placements.iter().find(|p| p.id == record.id) {
                let anchor = to_pos(rect, placement.head());
                if rect.contains(anchor) {
                    interaction.popup_closed = show_popup(ui.ctx(), anchor, record);
                }
            }
        }

        interaction
    }

    fn paint_tiles(
        &self,
        painter: &egui::Painter,
        rect: Rect,
        frame: &MapFrame,
        tiles: &mut TileCache<TextureHandle>,
        interaction: &mut MapInteraction,
    ) {
        let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
        for placement in frame.visible_tiles() {
            let size = placement.size as f32;
            let tile_rect = Rect::from_min_size(to_pos(rect, placement.min), egui::vec2(size, size));
            match tiles.lookup(placement.tile) {
                TileLookup::Ready(texture) => {
                    painter.image(texture.id(), tile_rect, uv, Color32::WHITE);
                }
                TileLookup::Requested => {
                    interaction.tiles_to_fetch.push(placement.tile);
                    paint_tile_placeholder(painter, tile_rect);
                }
                TileLookup::Pending | TileLookup::Failed => {
                    paint_tile_placeholder(painter, tile_rect);
                }
            }
        }
    }

    fn show_zoom_buttons(&mut self, ui: &mut egui::Ui, rect: Rect) {
        let size = egui::vec2(ZOOM_BUTTON_SIZE, ZOOM_BUTTON_SIZE);
        let zoom_in = Rect::from_min_size(rect.min + egui::vec2(10.0, 10.0), size);
        let zoom_out = zoom_in.translate(egui::vec2(0.0, ZOOM_BUTTON_SIZE + 2.0));
        let center = ScreenPoint::new(f64::from(rect.width()) / 2.0, f64::from(rect.height()) / 2.0);

        for (button_rect, label, levels) in [(zoom_in, "+", 1.0), (zoom_out, "−", -1.0)] {
            let response = ui.put(
                button_rect,
                egui::Button::new(egui::RichText::new(label).size(16.0)),
            );
            if response.clicked() {
                self.zoom_by(
                    center,
                    f64::from(rect.width()),
                    f64::from(rect.height()),
                    levels,
                );
            }
        }
    }
}

fn to_pos(rect: Rect, point: ScreenPoint) -> Pos2 {
    rect.min + egui::vec2(point.x as f32, point.y as f32)
}

fn to_screen(rect: Rect, pos: Pos2) -> ScreenPoint {
    let local = pos - rect.min;
    ScreenPoint::new(f64::from(local.x), f64::from(local.y))
}

fn paint_tile_placeholder(painter: &egui::Painter, tile_rect: Rect) {
    painter.rect_stroke(
        tile_rect,
        0.0,
        Stroke::new(1.0, Color32::from_gray(200)),
        egui::StrokeKind::Inside,
    );
}

fn paint_marker(painter: &egui::Painter, rect: Rect, placement: &MarkerPlacement, open: bool) {
    let tip = to_pos(rect, placement.tip);
    if !rect.expand(MARKER_STEM as f32 * 2.0).contains(tip) {
        return;
    }
    let head = to_pos(rect, placement.head());
    let radius = MARKER_HEAD_RADIUS as f32;
    let fill = if open { MARKER_FILL_OPEN } else { MARKER_FILL };
    let outline = Stroke::new(1.0, Color32::from_rgb(16, 52, 86));

    painter.add(egui::Shape::convex_polygon(
        vec![
            head + egui::vec2(-radius * 0.8, radius * 0.5),
            head + egui::vec2(radius * 0.8, radius * 0.5),
            tip,
        ],
        fill,
        outline,
    ));
    painter.circle(head, radius, fill, outline);
    painter.circle_filled(head, radius * 0.4, Color32::WHITE);
}

/// Returns `true` when the close button was pressed.
fn show_popup(ctx: &egui::Context, anchor: Pos2, record: &PointRecord) -> bool {
    let mut closed = false;
    egui::Area::new(egui::Id::new("munro_popup"))
        .order(egui::Order::Foreground)
        .pivot(Align2::CENTER_BOTTOM)
        .fixed_pos(anchor - egui::vec2(0.0, MARKER_HEAD_RADIUS as f32 + 4.0))
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.set_max_width(260.0);
                ui.horizontal(|ui| {
                    ui.heading(&record.name);
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Min), |ui| {
                        if ui.small_button("×").clicked() {
                            closed = true;
                        }
                    });
                });
                ui.label(format!("Height: {} meters", record.height_label()));
                ui.label(format!("Meaning: {}", record.meaning));
            });
        });
    closed
}

fn show_attribution(ui: &mut egui::Ui, rect: Rect, source: &TileSource) {
    let galley = ui.painter().layout_no_wrap(
        source.attribution.clone(),
        FontId::proportional(11.0),
        Color32::from_rgb(0, 120, 168),
    );
    let padding = egui::vec2(5.0, 2.0);
    let box_rect = Align2::RIGHT_BOTTOM.anchor_size(rect.right_bottom(), galley.size() + padding * 2.0);
    let painter = ui.painter_at(rect);
    painter.rect_filled(box_rect, 0.0, Color32::from_white_alpha(200));
    painter.galley(box_rect.min + padding, galley, Color32::BLACK);

    let Some(url) = source.attribution_url.as_deref() else {
        return;
    };
    let response = ui
        .interact(box_rect, ui.id().with("tile_attribution"), Sense::click())
        .on_hover_cursor(egui::CursorIcon::PointingHand);
    if response.clicked() {
        ui.ctx().open_url(egui::OpenUrl::new_tab(url));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::{LatLng, DEFAULT_CENTER};

    fn record(name: &str, lat: f64, lng: f64) -> PointRecord {
        PointRecord::new(name, 1000.0, "", LatLng::new(lat, lng))
    }

    fn overview_frame() -> MapFrame {
        MapFrame::new(Camera::from(ViewportState::overview()), 800.0, 600.0)
    }

    #[test]
    fn one_placement_per_record_in_collection_order() {
        let records = vec![
            record("Ben Nevis", 56.7969, -5.0036),
            record("Ben Macdui", 57.0704, -3.6691),
            record("Centre", DEFAULT_CENTER.lat, DEFAULT_CENTER.lng),
        ];
        let frame = overview_frame();
        let placements = layout_markers(&records, &frame);

        assert_eq!(placements.len(), 3);
        for (placement, record) in placements.iter().zip(&records) {
            assert_eq!(placement.id, record.id);
            assert_eq!(placement.tip, frame.geo_to_screen(record.position));
        }
        let centre = placements[2].tip;
        assert!((centre.x - 400.0).abs() < 1e-6);
        assert!((centre.y - 300.0).abs() < 1e-6);
        // West of centre is left on screen, north is up.
        assert!(placements[0].tip.x < centre.x);
        assert!(placements[1].tip.y < centre.y);
    }

    #[test]
    fn empty_collection_has_no_placements() {
        assert!(layout_markers(&[], &overview_frame()).is_empty());
    }

    #[test]
    fn overlapping_markers_hit_the_last_drawn() {
        let records = vec![
            record("First", 56.8, -4.2),
            record("Second", 56.8, -4.2),
        ];
        let placements = layout_markers(&records, &overview_frame());
        assert_eq!(placements.len(), 2);

        let hit = marker_at(&placements, placements[0].head()).expect("hit");
        assert_eq!(hit.index, 1);
    }

    #[test]
    fn stacked_records_with_same_name_resolve_to_the_top_one() {
        let here = LatLng::new(56.7969, -5.0036);
        let records = vec![
            PointRecord::new("Ben Nevis", 1344.0, "Old survey", here),
            PointRecord::new("Ben Nevis", 1345.0, "New survey", here),
        ];
        let placements = layout_markers(&records, &overview_frame());

        let hit = marker_at(&placements, placements[0].head()).expect("hit");
        assert_eq!(hit.index, 1);
        assert_eq!(hit.id, records[1].id);
        assert_ne!(hit.id, records[0].id);
    }

    #[test]
    fn clicks_away_from_pins_miss() {
        let records = vec![record("Ben Nevis", 56.7969, -5.0036)];
        let placements = layout_markers(&records, &overview_frame());
        let tip = placements[0].tip;

        assert!(marker_at(&placements, ScreenPoint::new(tip.x, tip.y - MARKER_STEM / 2.0)).is_some());
        assert!(marker_at(&placements, ScreenPoint::new(tip.x + 40.0, tip.y)).is_none());
        assert!(marker_at(&placements, ScreenPoint::new(tip.x, tip.y + 5.0)).is_none());
    }

    #[test]
    fn new_revision_starts_fly_that_lands_on_target() {
        let mut view = MapView::new(ViewportState::overview(), 0);
        let start = view.camera();
        let nevis = record("Ben Nevis", 56.7969, -5.0036);
        let target = ViewportState::focused_on(&nevis);

        view.sync_viewport(target, 1, 10.0);
        assert!(view.is_animating());
        view.advance(10.0);
        assert!((view.camera().center.lat - start.center.lat).abs() < 1e-9);
        assert!((view.camera().center.lng - start.center.lng).abs() < 1e-9);
        assert_eq!(view.camera().zoom, start.zoom);

        view.advance(10.6);
        assert!(view.camera().zoom > start.zoom && view.camera().zoom < 13.0);

        view.advance(12.0);
        assert!(!view.is_animating());
        assert_eq!(view.camera(), Camera::from(target));
    }

    #[test]
    fn unchanged_revision_does_not_restart_fly() {
        let mut view = MapView::new(ViewportState::overview(), 3);
        let nevis = record("Ben Nevis", 56.7969, -5.0036);
        view.sync_viewport(ViewportState::focused_on(&nevis), 3, 1.0);
        assert!(!view.is_animating());
        assert_eq!(view.camera(), Camera::from(ViewportState::overview()));
    }

    #[test]
    fn gestures_interrupt_fly() {
        let mut view = MapView::new(ViewportState::overview(), 0);
        let nevis = record("Ben Nevis", 56.7969, -5.0036);
        view.sync_viewport(ViewportState::focused_on(&nevis), 1, 0.0);
        view.pan(10.0, 0.0);
        assert!(!view.is_animating());
    }
}
