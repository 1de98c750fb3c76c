//! Application state owned by the UI thread. Every mutation goes through the
//! methods here so the egui layer only reads.

use client_core::viewport::{ViewMode, ViewportController};
use shared::domain::{MapVariant, MarkerId, PointRecord, ViewportState};

use crate::controller::events::{UiError, UiEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    NotStarted,
    Loading,
    Loaded { count: usize, rejected: usize },
    Failed,
}

pub struct MapAppState {
    variant: MapVariant,
    records: Vec<PointRecord>,
    controller: ViewportController,
    open_popup: Option<MarkerId>,
    load: LoadStatus,
    pub status: String,
    status_banner: Option<UiError>,
}

impl MapAppState {
    pub fn new(variant: MapVariant) -> Self {
        Self {
            variant,
            records: Vec::new(),
            controller: ViewportController::new(),
            open_popup: None,
            load: LoadStatus::NotStarted,
            status: "Loading munros...".to_string(),
            status_banner: None,
        }
    }

    pub fn variant(&self) -> MapVariant {
        self.variant
    }

    /// Marks the single data load as started. Only the first call returns
    /// `true`.
    pub fn begin_load(&mut self) -> bool {
        if self.load != LoadStatus::NotStarted {
            return false;
        }
        self.load = LoadStatus::Loading;
        true
    }

    pub fn load_status(&self) -> LoadStatus {
        self.load
    }

    pub fn apply_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::Info(message) => self.status = message,
            UiEvent::MunrosLoaded(report) => {
                let count = report.records.len();
                let rejected = report.rejected.len();
                self.records = report.records;
                if let Some(open) = self.open_popup {
                    if !self.records.iter().any(|record| record.id == open) {
                        self.open_popup = None;
                    }
                }
                self.load = LoadStatus::Loaded { count, rejected };
                self.status = if rejected == 0 {
                    format!("{count} munros loaded")
                } else {
                    format!("{count} munros loaded ({rejected} skipped)")
                };
            }
            UiEvent::Error(err) => {
                if self.load == LoadStatus::Loading {
                    self.load = LoadStatus::Failed;
                }
                self.status = err.message().to_string();
                self.status_banner = Some(err);
            }
            UiEvent::Tile(_) => {}
        }
    }

    /// Opens the popup of the clicked marker. In the interactive variant the
    /// commanded viewport also moves to the marker and is returned.
    pub fn marker_clicked(&mut self, id: MarkerId) -> Option<ViewportState> {
        let record = self.records.iter().find(|record| record.id == id)?;
        self.open_popup = Some(id);
        match self.variant {
            MapVariant::Interactive => Some(self.controller.select(record)),
            MapVariant::Static => None,
        }
    }

    pub fn dismiss_popup(&mut self) {
        self.open_popup = None;
    }

    pub fn records(&self) -> &[PointRecord] {
        &self.records
    }

    pub fn viewport(&self) -> ViewportState {
        self.controller.viewport()
    }

    pub fn view_mode(&self) -> ViewMode {
        self.controller.mode()
    }

    pub fn viewport_revision(&self) -> u64 {
        self.controller.revision()
    }

    pub fn popup_record(&self) -> Option<&PointRecord> {
        let open = self.open_popup?;
        self.records.iter().find(|record| record.id == open)
    }

    pub fn status_banner(&self) -> Option<&UiError> {
        self.status_banner.as_ref()
    }

    pub fn dismiss_banner(&mut self) {
        self.status_banner = None;
    }
}

#[cfg(test)]
#[path = "../tests/reducer_tests.rs"]
mod tests;
