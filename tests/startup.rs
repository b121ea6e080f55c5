mod common;

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;

use car_price_client::form::FormField;
use car_price_client::render::render;
use car_price_client::state::{AppState, Phase, Pipeline, Screen, Snapshot};
use car_price_client::{ConnectivityStatus, ErrorSource, Settings};
use common::{Behavior, Hits, StubConfig, StubService};

fn settings_for(url: &str) -> Settings {
    let mut settings = Settings::with_api_url(url);
    settings.probe_timeout = Duration::from_millis(500);
    settings
}

#[tokio::test]
async fn test_unreachable_service_is_disconnected() {
    let url = common::unused_url().await;
    let mut state = AppState::new(settings_for(&url)).unwrap();

    state.start().await;

    assert_eq!(state.connectivity(), ConnectivityStatus::Disconnected);
    assert!(state.options().is_none());
    assert!(matches!(state.screen(), Screen::Disconnected { .. }));
    assert!(render(&state.screen()).contains("Backend Not Running"));
}

#[tokio::test]
async fn test_unreachable_screen_explains_the_failure() {
    let url = common::unused_url().await;
    let mut state = AppState::new(settings_for(&url)).unwrap();

    state.start().await;

    let failure = state.connectivity_error().unwrap();
    assert_eq!(failure.source, ErrorSource::Connectivity);
    let Screen::Disconnected { api_url, failure } = state.screen() else {
        panic!("expected the disconnected screen");
    };
    assert_eq!(api_url, url);
    assert!(failure.is_some());
}

#[tokio::test]
async fn test_retry_from_disconnected_reaches_ready() {
    let stub = StubService::start(StubConfig {
        root: Behavior::UnavailableFor(1, json!({"status": "running"})),
        ..StubConfig::default()
    })
    .await;
    let mut state = AppState::new(settings_for(&stub.url)).unwrap();
    stub.observe(state.subscribe());

    state.start().await;
    assert_eq!(state.connectivity(), ConnectivityStatus::Disconnected);
    assert!(state.connectivity_error().is_some());
    assert_eq!(Hits::get(&stub.hits().options), 0);
    assert!(render(&state.screen()).contains("Backend Not Running"));

    state.retry().await;

    assert_eq!(
        stub.connectivity_seen(),
        vec![ConnectivityStatus::Checking, ConnectivityStatus::Checking]
    );
    assert_eq!(Hits::get(&stub.hits().root), 2);
    assert_eq!(Hits::get(&stub.hits().options), 1);
    assert!(state.connectivity_error().is_none());
    assert_eq!(
        *state.subscribe().borrow(),
        Snapshot {
            connectivity: ConnectivityStatus::Connected,
            options_loaded: true,
            active: Pipeline::Form,
            phase: Phase::Idle,
            loading: false,
        }
    );

    let Screen::Ready(view) = state.screen() else {
        panic!("expected the ready screen");
    };
    assert!(view.can_submit);
    assert_eq!(view.form.get(FormField::Brand), "Toyota");
    assert_eq!(view.form.get(FormField::Transmission), "Automatic");
    assert_eq!(view.form.get(FormField::ModelYear), "2020");
}

#[tokio::test]
async fn test_non_success_root_blocks_options() {
    let stub = StubService::start(StubConfig {
        root: Behavior::Respond(StatusCode::SERVICE_UNAVAILABLE, json!({})),
        ..StubConfig::default()
    })
    .await;
    let mut state = AppState::new(settings_for(&stub.url)).unwrap();

    state.start().await;

    assert_eq!(state.connectivity(), ConnectivityStatus::Disconnected);
    assert_eq!(Hits::get(&stub.hits().root), 1);
    assert_eq!(Hits::get(&stub.hits().options), 0);
}

#[tokio::test]
async fn test_slow_root_times_out() {
    let stub = StubService::start(StubConfig {
        root: Behavior::Delay(Duration::from_secs(3), json!({})),
        ..StubConfig::default()
    })
    .await;
    let mut settings = settings_for(&stub.url);
    settings.probe_timeout = Duration::from_millis(100);
    let mut state = AppState::new(settings).unwrap();

    state.start().await;

    assert_eq!(state.connectivity(), ConnectivityStatus::Disconnected);
    assert_eq!(Hits::get(&stub.hits().options), 0);
}

#[tokio::test]
async fn test_options_seed_form_defaults() {
    let stub = StubService::start(StubConfig::default()).await;
    let mut state = AppState::new(settings_for(&stub.url)).unwrap();
    let snapshots = state.subscribe();

    state.start().await;

    assert_eq!(state.connectivity(), ConnectivityStatus::Connected);
    assert!(state.is_ready());
    assert!(snapshots.borrow().options_loaded);

    let form = state.form();
    assert_eq!(form.get(FormField::Brand), "Toyota");
    assert_eq!(form.get(FormField::FuelType), "Gasoline");
    assert_eq!(form.get(FormField::Transmission), "Automatic");
    assert_eq!(form.get(FormField::ModelYear), "2020");
    assert_eq!(form.get(FormField::Mileage), "53000");
    assert_eq!(form.get(FormField::Horsepower), "250");
    assert_eq!(form.get(FormField::EngineSize), "3.0");
    assert_eq!(form.get(FormField::HasAccident), "0");
    assert_eq!(form.get(FormField::IsCleanTitle), "1");

    let Screen::Ready(view) = state.screen() else {
        panic!("expected the ready screen");
    };
    assert!(view.can_submit);
    assert!(view.submission.result().is_none());
    assert!(view.submission.error().is_none());
}

#[tokio::test]
async fn test_failed_options_keep_form_blocked_until_retry() {
    let stub = StubService::start(StubConfig {
        options: Behavior::Respond(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"error": "mappings not loaded"}),
        ),
        ..StubConfig::default()
    })
    .await;
    let mut state = AppState::new(settings_for(&stub.url)).unwrap();

    state.start().await;

    assert_eq!(state.connectivity(), ConnectivityStatus::Connected);
    assert!(state.options().is_none());
    let failure = state.options_error().unwrap();
    assert_eq!(failure.source, ErrorSource::Options);
    assert_eq!(failure.message, "mappings not loaded");
    assert!(matches!(
        state.screen(),
        Screen::LoadingOptions { failure: Some(_) }
    ));
    assert!(state.set_field(FormField::Brand, "Toyota").is_err());

    state.retry().await;

    assert_eq!(Hits::get(&stub.hits().root), 2);
    assert_eq!(Hits::get(&stub.hits().options), 2);
    assert!(matches!(state.screen(), Screen::LoadingOptions { .. }));
}

#[tokio::test]
async fn test_malformed_options_body_is_an_options_failure() {
    let stub = StubService::start(StubConfig {
        options: Behavior::Respond(StatusCode::OK, json!({"brands": "Toyota"})),
        ..StubConfig::default()
    })
    .await;
    let mut state = AppState::new(settings_for(&stub.url)).unwrap();

    state.start().await;

    assert!(state.options().is_none());
    assert_eq!(state.options_error().unwrap().source, ErrorSource::Options);
}
