//! Viewport controller for the interactive map: marker selection turns into
//! a commanded viewport, which the map surface animates towards.

use std::time::Duration;

use shared::domain::{MarkerId, PointRecord, ViewportState};

use crate::projection::{from_unit, to_unit, Camera};

pub const DEFAULT_FLY_DURATION: Duration = Duration::from_millis(1200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Overview,
    Focused(MarkerId),
}

/// Owns the commanded viewport. There is no transition back to
/// [`ViewMode::Overview`]; once a marker is selected the map stays focused.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportController {
    viewport: ViewportState,
    mode: ViewMode,
    revision: u64,
}

impl Default for ViewportController {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewportController {
    pub fn new() -> Self {
        Self {
            viewport: ViewportState::overview(),
            mode: ViewMode::Overview,
            revision: 0,
        }
    }

    pub fn viewport(&self) -> ViewportState {
        self.viewport
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    /// Bumped on every selection, including re-selecting the same record,
    /// so the map surface flies again each time.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn select(&mut self, record: &PointRecord) -> ViewportState {
        let viewport = ViewportState::focused_on(record);
        self.viewport = viewport;
        self.mode = ViewMode::Focused(record.id);
        self.revision = self.revision.wrapping_add(1);
        tracing::debug!(
            marker = record.id.0,
            name = %record.name,
            zoom = viewport.zoom,
            "viewport focused on marker"
        );
        viewport
    }
}

fn ease_in_out_cubic(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Animated camera transition. Position is interpolated in normalised
/// Mercator space along the shorter way round the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlyTo {
    from: Camera,
    to: Camera,
    duration: Duration,
}

impl FlyTo {
    pub fn new(from: Camera, to: Camera) -> Self {
        Self::with_duration(from, to, DEFAULT_FLY_DURATION)
    }

    pub fn with_duration(from: Camera, to: Camera, duration: Duration) -> Self {
        Self { from, to, duration }
    }

    pub fn target(&self) -> Camera {
        self.to
    }

    pub fn is_finished(&self, elapsed: Duration) -> bool {
        elapsed >= self.duration
    }

    pub fn sample(&self, elapsed: Duration) -> Camera {
        if self.is_finished(elapsed) || self.duration.is_zero() {
            return self.to;
        }
        let t = ease_in_out_cubic(elapsed.as_secs_f64() / self.duration.as_secs_f64());

        let (x0, y0) = to_unit(self.from.center);
        let (x1, y1) = to_unit(self.to.center);
        let mut dx = x1 - x0;
        if dx > 0.5 {
            dx -= 1.0;
        } else if dx < -0.5 {
            dx += 1.0;
        }
        let x = (x0 + dx * t).rem_euclid(1.0);
        let y = y0 + (y1 - y0) * t;
        let zoom = self.from.zoom + (self.to.zoom - self.from.zoom) * t;
        Camera::new(from_unit(x, y), zoom)
    }
}
