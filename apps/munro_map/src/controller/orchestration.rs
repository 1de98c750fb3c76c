//! Command orchestration helpers from UI actions to backend command queue.

use crossbeam_channel::{Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;

/// Queues `cmd` without blocking the frame. Returns whether it was accepted.
pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
    status: &mut String,
) -> bool {
    let cmd_name = cmd.name();

    match cmd_tx.try_send(cmd) {
        Ok(()) => {
            tracing::trace!(command = cmd_name, "queued ui->backend command");
            true
        }
        Err(TrySendError::Full(_)) => {
            tracing::debug!(command = cmd_name, "backend command queue full");
            *status = "Backend is busy; retrying shortly".to_string();
            false
        }
        Err(TrySendError::Disconnected(_)) => {
            tracing::warn!(command = cmd_name, "backend command processor disconnected");
            *status =
                "Backend worker disconnected (possible startup failure); map data unavailable"
                    .to_string();
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use client_core::tiles::TileId;

    #[test]
    fn reports_full_queue_without_blocking() {
        let (cmd_tx, _cmd_rx) = crossbeam_channel::bounded(1);
        let mut status = String::new();
        let tile = TileId { zoom: 7, x: 62, y: 39 };

        assert!(dispatch_backend_command(&cmd_tx, BackendCommand::FetchTile { tile }, &mut status));
        assert!(!dispatch_backend_command(&cmd_tx, BackendCommand::FetchTile { tile }, &mut status));
        assert!(status.contains("busy"));
    }

    #[test]
    fn reports_disconnected_backend() {
        let (cmd_tx, cmd_rx) = crossbeam_channel::bounded(1);
        drop(cmd_rx);
        let mut status = String::new();
        let tile = TileId { zoom: 0, x: 0, y: 0 };

        assert!(!dispatch_backend_command(&cmd_tx, BackendCommand::FetchTile { tile }, &mut status));
        assert!(status.contains("disconnected"));
    }
}
