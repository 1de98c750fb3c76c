//! Web Mercator maths for the slippy map: camera, screen transform and
//! visible tile enumeration. Screen coordinates are pixels relative to the
//! top-left corner of the map rectangle.

use std::f64::consts::PI;

use shared::domain::{wrap_longitude, LatLng, ViewportState, MAX_MERCATOR_LAT};

use crate::tiles::TileId;

pub const TILE_SIZE: f64 = 256.0;
pub const MIN_ZOOM: f64 = 0.0;
pub const MAX_ZOOM: f64 = 18.0;

/// Projects to normalised Mercator space: both axes in `[0, 1]`, origin at
/// the north-west corner of the world.
pub fn to_unit(pos: LatLng) -> (f64, f64) {
    let pos = pos.clamped_to_mercator();
    let x = (pos.lng + 180.0) / 360.0;
    let y = (1.0 - pos.lat.to_radians().tan().asinh() / PI) / 2.0;
    (x, y)
}

pub fn from_unit(x: f64, y: f64) -> LatLng {
    let lng = wrap_longitude(x * 360.0 - 180.0);
    let lat = (PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees();
    LatLng::new(lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT), lng)
}

pub fn world_size(zoom: f64) -> f64 {
    TILE_SIZE * 2f64.powf(zoom)
}

/// Shortest signed distance between two normalised x coordinates.
fn wrapped_dx(from: f64, to: f64) -> f64 {
    let dx = to - from;
    if dx > 0.5 {
        dx - 1.0
    } else if dx < -0.5 {
        dx + 1.0
    } else {
        dx
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_sq(&self, other: ScreenPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// What the map surface is currently showing. Unlike [`ViewportState`] the
/// zoom is fractional so gestures and fly-to animations can move smoothly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub center: LatLng,
    pub zoom: f64,
}

impl Camera {
    pub fn new(center: LatLng, zoom: f64) -> Self {
        Self {
            center: center.clamped_to_mercator(),
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
        }
    }

    /// Moves the camera so the content follows a pointer drag of
    /// `(dx, dy)` pixels.
    pub fn panned(self, dx: f64, dy: f64) -> Self {
        let size = world_size(self.zoom);
        let (cx, cy) = to_unit(self.center);
        let x = (cx - dx / size).rem_euclid(1.0);
        let y = (cy - dy / size).clamp(0.0, 1.0);
        Self::new(from_unit(x, y), self.zoom)
    }

    /// Changes zoom while keeping the geographic point under `anchor` fixed
    /// on screen.
    pub fn zoomed_around(self, anchor: ScreenPoint, width: f64, height: f64, zoom: f64) -> Self {
        let zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        let anchor_geo = MapFrame::new(self, width, height).screen_to_geo(anchor);
        let (ax, ay) = to_unit(anchor_geo);
        let size = world_size(zoom);
        let x = (ax - (anchor.x - width / 2.0) / size).rem_euclid(1.0);
        let y = (ay - (anchor.y - height / 2.0) / size).clamp(0.0, 1.0);
        Self::new(from_unit(x, y), zoom)
    }
}

impl From<ViewportState> for Camera {
    fn from(viewport: ViewportState) -> Self {
        Self::new(viewport.center, f64::from(viewport.zoom))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TilePlacement {
    pub tile: TileId,
    pub min: ScreenPoint,
    pub size: f64,
}

/// A camera bound to a map rectangle of a given pixel size.
#[derive(Debug, Clone, Copy)]
pub struct MapFrame {
    camera: Camera,
    width: f64,
    height: f64,
}

impl MapFrame {
    pub fn new(camera: Camera, width: f64, height: f64) -> Self {
        Self {
            camera,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    pub fn camera(&self) -> Camera {
        self.camera
    }

    pub fn center_point(&self) -> ScreenPoint {
        ScreenPoint::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn geo_to_screen(&self, pos: LatLng) -> ScreenPoint {
        let size = world_size(self.camera.zoom);
        let (cx, cy) = to_unit(self.camera.center);
        let (px, py) = to_unit(pos);
        ScreenPoint::new(
            self.width / 2.0 + wrapped_dx(cx, px) * size,
            self.height / 2.0 + (py - cy) * size,
        )
    }

    pub fn screen_to_geo(&self, point: ScreenPoint) -> LatLng {
        let size = world_size(self.camera.zoom);
        let (cx, cy) = to_unit(self.camera.center);
        let x = (cx + (point.x - self.width / 2.0) / size).rem_euclid(1.0);
        let y = (cy + (point.y - self.height / 2.0) / size).clamp(0.0, 1.0);
        from_unit(x, y)
    }

    /// Integer zoom whose tiles are drawn for the current fractional zoom.
    pub fn tile_zoom(&self) -> u8 {
        self.camera.zoom.round().clamp(MIN_ZOOM, MAX_ZOOM) as u8
    }

    /// Tiles covering the frame, nearest to the centre first. Columns wrap
    /// around the antimeridian; rows outside the world are skipped.
    pub fn visible_tiles(&self) -> Vec<TilePlacement> {
        let tile_zoom = self.tile_zoom();
        let tiles_per_axis = 1i64 << tile_zoom;
        let tile_px = TILE_SIZE * 2f64.powf(self.camera.zoom - f64::from(tile_zoom));
        if tile_px <= 0.0 || self.width <= 0.0 || self.height <= 0.0 {
            return Vec::new();
        }

        let (ux, uy) = to_unit(self.camera.center);
        let center_x = ux * tiles_per_axis as f64;
        let center_y = uy * tiles_per_axis as f64;
        let half_w = self.width / 2.0 / tile_px;
        let half_h = self.height / 2.0 / tile_px;

        let first_col = (center_x - half_w).floor() as i64;
        let last_col = (center_x + half_w).floor() as i64;
        let first_row = ((center_y - half_h).floor() as i64).max(0);
        let last_row = ((center_y + half_h).floor() as i64).min(tiles_per_axis - 1);

        let mut placements = Vec::new();
        for row in first_row..=last_row {
            for col in first_col..=last_col {
                let min = ScreenPoint::new(
                    self.width / 2.0 + (col as f64 - center_x) * tile_px,
                    self.height / 2.0 + (row as f64 - center_y) * tile_px,
                );
                placements.push(TilePlacement {
                    tile: TileId {
                        zoom: tile_zoom,
                        x: col.rem_euclid(tiles_per_axis) as u32,
                        y: row as u32,
                    },
                    min,
                    size: tile_px,
                });
            }
        }

        let center = self.center_point();
        placements.sort_by(|a, b| {
            let da = tile_center(a).distance_sq(center);
            let db = tile_center(b).distance_sq(center);
            da.total_cmp(&db)
        });
        placements
    }
}

fn tile_center(placement: &TilePlacement) -> ScreenPoint {
    ScreenPoint::new(
        placement.min.x + placement.size / 2.0,
        placement.min.y + placement.size / 2.0,
    )
}
