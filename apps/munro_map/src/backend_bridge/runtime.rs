//! Backend worker: a tokio runtime on its own thread that turns UI commands
//! into network requests and reports results back as UI events.

use std::{sync::Arc, thread};

use client_core::{
    build_http_client, load_munros,
    tiles::{TileFetcher, TileId, TileSource},
    HttpMunroSource, LoadScope,
};
use crossbeam_channel::{Receiver, Sender};
use shared::error::LoadError;
use url::Url;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{TileEvent, UiError, UiErrorContext, UiEvent};
use crate::ui::tile_cache::TileImage;

pub struct BackendConfig {
    pub api_url: Url,
    pub tile_source: TileSource,
}

pub fn launch(cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>, config: BackendConfig) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("munro-backend")
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(run(cmd_rx, ui_tx, config));
        tracing::info!("backend worker stopped");
    });
}

async fn run(cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>, config: BackendConfig) {
    let http = match build_http_client() {
        Ok(http) => http,
        Err(err) => {
            let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                UiErrorContext::BackendStartup,
                format!("backend worker startup failure: invalid http client: {err}"),
            )));
            tracing::error!("failed to build http client: {err}");
            return;
        }
    };

    let source = Arc::new(HttpMunroSource::new(http.clone(), config.api_url));
    let fetcher = TileFetcher::new(http, config.tile_source);
    tracing::info!(api_url = %source.url(), "backend worker ready");
    let host = source.url().host_str().unwrap_or("provider").to_string();
    let _ = ui_tx.try_send(UiEvent::Info(format!("Loading munros from {host}...")));

    // The UI side drops its sender when the window closes, ending the loop.
    while let Ok(cmd) = cmd_rx.recv() {
        match cmd {
            BackendCommand::LoadMunros { scope } => {
                let source = source.clone();
                let ui_tx = ui_tx.clone();
                tokio::spawn(async move {
                    handle_load(source.as_ref(), &scope, &ui_tx).await;
                });
            }
            BackendCommand::FetchTile { tile } => {
                let fetcher = fetcher.clone();
                let ui_tx = ui_tx.clone();
                tokio::spawn(async move {
                    let event = fetch_tile_event(&fetcher, tile).await;
                    if ui_tx.try_send(UiEvent::Tile(event)).is_err() {
                        tracing::warn!(%tile, "ui event queue unavailable; dropping tile");
                    }
                });
            }
        }
    }
}

async fn handle_load(source: &HttpMunroSource, scope: &LoadScope, ui_tx: &Sender<UiEvent>) {
    match load_munros(source, scope).await {
        Ok(report) => {
            if scope.is_cancelled() {
                tracing::debug!("munro load resolved after teardown; discarding");
                return;
            }
            deliver_once(ui_tx, UiEvent::MunrosLoaded(report), "munros_loaded").await;
        }
        Err(LoadError::Cancelled) => {
            tracing::debug!("munro load cancelled; discarding");
        }
        Err(err) => {
            tracing::error!(url = %source.url(), code = ?err.code(), "munro load failed: {err}");
            let event = UiEvent::Error(UiError::from_load_error(&err));
            deliver_once(ui_tx, event, "load_error").await;
        }
    }
}

/// Delivers an event the UI must not miss. Unlike tile results it waits for
/// room in the queue instead of being dropped when the queue is full.
pub(crate) async fn deliver_once(
    ui_tx: &Sender<UiEvent>,
    event: UiEvent,
    name: &'static str,
) -> bool {
    let ui_tx = ui_tx.clone();
    match tokio::task::spawn_blocking(move || ui_tx.send(event)).await {
        Ok(Ok(())) => true,
        Ok(Err(_)) => {
            tracing::error!(event = name, "ui event queue closed; result lost");
            false
        }
        Err(err) => {
            tracing::error!(event = name, "ui event delivery task failed: {err}");
            false
        }
    }
}

async fn fetch_tile_event(fetcher: &TileFetcher, tile: TileId) -> TileEvent {
    let bytes = match fetcher.fetch(tile).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!("{err}");
            return TileEvent::failed(&err, tile);
        }
    };

    match tokio::task::spawn_blocking(move || decode_tile_image(&bytes)).await {
        Ok(Ok(image)) => TileEvent::Loaded { tile, image },
        Ok(Err(reason)) => {
            tracing::warn!(%tile, "tile decode failed: {reason}");
            TileEvent::Failed { tile, reason }
        }
        Err(err) => TileEvent::Failed {
            tile,
            reason: format!("tile decode task failed: {err}"),
        },
    }
}

pub(crate) fn decode_tile_image(bytes: &[u8]) -> Result<TileImage, String> {
    let dynamic = image::load_from_memory(bytes).map_err(|err| err.to_string())?;
    let rgba = dynamic.to_rgba8();
    let width = rgba.width() as usize;
    let height = rgba.height() as usize;
    Ok(TileImage {
        width,
        height,
        rgba: rgba.into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use client_core::LoadReport;

    use super::{decode_tile_image, deliver_once};
    use crate::controller::events::UiEvent;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn load_result_waits_for_room_in_a_full_queue() {
        let (ui_tx, ui_rx) = crossbeam_channel::bounded(1);
        ui_tx
            .try_send(UiEvent::Info("tile backlog".into()))
            .expect("fill queue");

        let delivery = tokio::spawn(async move {
            let event = UiEvent::MunrosLoaded(LoadReport::default());
            deliver_once(&ui_tx, event, "munros_loaded").await
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!delivery.is_finished(), "delivery waits while the queue is full");

        let first = ui_rx.recv_timeout(Duration::from_secs(5)).expect("backlog event");
        assert!(matches!(first, UiEvent::Info(_)));
        let second = ui_rx.recv_timeout(Duration::from_secs(5)).expect("load result");
        assert!(matches!(second, UiEvent::MunrosLoaded(_)));
        assert!(delivery.await.expect("join delivery"));
    }

    #[tokio::test]
    async fn delivery_reports_a_closed_queue() {
        let (ui_tx, ui_rx) = crossbeam_channel::bounded(1);
        drop(ui_rx);
        assert!(!deliver_once(&ui_tx, UiEvent::Info("late".into()), "info").await);
    }

    #[test]
    fn decodes_png_tile_into_rgba() {
        let mut png = Vec::new();
        let tile = image::RgbaImage::from_pixel(4, 2, image::Rgba([10, 20, 30, 255]));
        image::DynamicImage::ImageRgba8(tile)
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .expect("encode png");

        let decoded = decode_tile_image(&png).expect("decode");
        assert_eq!((decoded.width, decoded.height), (4, 2));
        assert_eq!(decoded.rgba.len(), 4 * 2 * 4);
        assert_eq!(&decoded.rgba[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn rejects_non_image_bytes() {
        assert!(decode_tile_image(b"<html>rate limited</html>").is_err());
    }
}
