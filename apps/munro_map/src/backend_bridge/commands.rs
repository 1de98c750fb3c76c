//! Backend commands queued from UI to backend worker.

use client_core::{tiles::TileId, LoadScope};

pub enum BackendCommand {
    /// The one provider request of the app's lifetime, scoped to the app.
    LoadMunros { scope: LoadScope },
    FetchTile { tile: TileId },
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::LoadMunros { .. } => "load_munros",
            Self::FetchTile { .. } => "fetch_tile",
        }
    }
}
