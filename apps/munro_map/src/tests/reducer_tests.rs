use super::{LoadStatus, MapAppState};

use client_core::{viewport::ViewMode, LoadReport};
use shared::{
    domain::{LatLng, MapVariant, PointRecord, ViewportState, DEFAULT_CENTER, OVERVIEW_ZOOM},
    error::{LoadError, RecordRejection},
};

use crate::controller::events::{UiError, UiEvent};

fn record(name: &str, lat: f64, lng: f64) -> PointRecord {
    PointRecord::new(name, 1000.0, format!("meaning of {name}"), LatLng::new(lat, lng))
}

fn loaded(records: Vec<PointRecord>) -> UiEvent {
    UiEvent::MunrosLoaded(LoadReport {
        records,
        rejected: Vec::new(),
    })
}

#[test]
fn starts_at_overview_defaults_with_no_records() {
    let state = MapAppState::new(MapVariant::Interactive);
    assert_eq!(state.viewport().center, DEFAULT_CENTER);
    assert_eq!(state.viewport().zoom, OVERVIEW_ZOOM);
    assert_eq!(state.view_mode(), ViewMode::Overview);
    assert!(state.records().is_empty());
    assert!(state.popup_record().is_none());
}

#[test]
fn data_load_is_dispatched_once() {
    let mut state = MapAppState::new(MapVariant::Interactive);
    assert!(state.begin_load());
    assert!(!state.begin_load());
    assert_eq!(state.load_status(), LoadStatus::Loading);
}

#[test]
fn loaded_records_replace_collection_in_order() {
    let mut state = MapAppState::new(MapVariant::Interactive);
    state.begin_load();
    state.apply_event(loaded(vec![
        record("Ben Nevis", 56.7969, -5.0036),
        record("Ben Macdui", 57.0704, -3.6691),
    ]));

    let names: Vec<_> = state.records().iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["Ben Nevis", "Ben Macdui"]);
    assert_eq!(
        state.load_status(),
        LoadStatus::Loaded {
            count: 2,
            rejected: 0
        }
    );
    assert_eq!(state.status, "2 munros loaded");
}

#[test]
fn skipped_records_are_reported_in_status() {
    let mut state = MapAppState::new(MapVariant::Interactive);
    state.apply_event(UiEvent::MunrosLoaded(LoadReport {
        records: vec![record("Ben Nevis", 56.7969, -5.0036)],
        rejected: vec![RecordRejection::InvalidHeight {
            index: 1,
            name: "Nowhere".into(),
        }],
    }));
    assert_eq!(state.status, "1 munros loaded (1 skipped)");
}

#[test]
fn selecting_a_record_focuses_it_at_zoom_13() {
    let mut state = MapAppState::new(MapVariant::Interactive);
    let nevis = record("Ben Nevis", 56.7969, -5.0036);
    state.apply_event(loaded(vec![nevis.clone()]));

    let viewport = state.marker_clicked(nevis.id).expect("interactive focuses");
    assert_eq!(
        viewport,
        ViewportState {
            center: nevis.position,
            zoom: 13
        }
    );
    assert_eq!(state.viewport(), viewport);
    assert_eq!(state.view_mode(), ViewMode::Focused(nevis.id));
    assert_eq!(state.records().len(), 1);
    assert_eq!(state.popup_record().map(|r| r.name.as_str()), Some("Ben Nevis"));
}

#[test]
fn last_selection_wins() {
    let mut state = MapAppState::new(MapVariant::Interactive);
    let first = record("Ben Nevis", 56.7969, -5.0036);
    let second = record("Schiehallion", 56.6666, -4.1000);
    state.apply_event(loaded(vec![first.clone(), second.clone()]));

    state.marker_clicked(first.id);
    state.marker_clicked(second.id);

    assert_eq!(state.view_mode(), ViewMode::Focused(second.id));
    assert_eq!(state.viewport().center, second.position);
    assert_eq!(state.viewport_revision(), 2);
}

#[test]
fn reselecting_same_record_bumps_revision() {
    let mut state = MapAppState::new(MapVariant::Interactive);
    let nevis = record("Ben Nevis", 56.7969, -5.0036);
    state.apply_event(loaded(vec![nevis.clone()]));

    state.marker_clicked(nevis.id);
    state.marker_clicked(nevis.id);
    assert_eq!(state.viewport_revision(), 2);
}

#[test]
fn static_variant_opens_popup_without_moving() {
    let mut state = MapAppState::new(MapVariant::Static);
    let nevis = record("Ben Nevis", 56.7969, -5.0036);
    state.apply_event(loaded(vec![nevis.clone()]));

    assert_eq!(state.marker_clicked(nevis.id), None);
    assert_eq!(state.viewport(), ViewportState::overview());
    assert_eq!(state.view_mode(), ViewMode::Overview);
    assert_eq!(state.viewport_revision(), 0);
    assert!(state.popup_record().is_some());

    state.dismiss_popup();
    assert!(state.popup_record().is_none());
}

#[test]
fn unknown_marker_is_ignored() {
    let mut state = MapAppState::new(MapVariant::Interactive);
    let ghost = record("Ghost", 57.0, -4.0);
    assert_eq!(state.marker_clicked(ghost.id), None);
    assert_eq!(state.viewport_revision(), 0);
    assert!(state.popup_record().is_none());
}

#[test]
fn failed_load_keeps_collection_empty_and_raises_banner() {
    let mut state = MapAppState::new(MapVariant::Interactive);
    state.begin_load();
    state.apply_event(UiEvent::Error(UiError::from_load_error(&LoadError::Status(500))));

    assert!(state.records().is_empty());
    assert_eq!(state.load_status(), LoadStatus::Failed);
    assert!(state
        .status_banner()
        .is_some_and(|banner| banner.message().contains("HTTP 500")));
    assert_eq!(state.viewport(), ViewportState::overview());

    state.dismiss_banner();
    assert!(state.status_banner().is_none());
}

#[test]
fn empty_load_is_not_an_error() {
    let mut state = MapAppState::new(MapVariant::Interactive);
    state.begin_load();
    state.apply_event(loaded(Vec::new()));
    assert!(state.records().is_empty());
    assert!(state.status_banner().is_none());
    assert_eq!(state.status, "0 munros loaded");
}

#[test]
fn same_name_and_coordinate_records_open_their_own_popup() {
    let mut state = MapAppState::new(MapVariant::Static);
    let here = LatLng::new(56.7969, -5.0036);
    let older = PointRecord::new("Ben Nevis", 1344.0, "Old survey", here);
    let newer = PointRecord::new("Ben Nevis", 1345.0, "New survey", here);
    state.apply_event(loaded(vec![older, newer.clone()]));

    state.marker_clicked(newer.id);
    let popup = state.popup_record().expect("popup open");
    assert_eq!(popup.height_label(), "1345");
    assert_eq!(popup.meaning, "New survey");
}
