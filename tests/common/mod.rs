//! In-process stand-in for the prediction service

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::sync::watch;

use car_price_client::state::Snapshot;
use car_price_client::ConnectivityStatus;

/// How an endpoint answers
#[derive(Debug, Clone)]
pub enum Behavior {
    Respond(StatusCode, Value),
    /// Answer 200 with the body, but only after the delay
    Delay(Duration, Value),
    /// Answer 503 to the first `n` calls, then 200 with the body
    UnavailableFor(usize, Value),
}

#[derive(Debug, Clone)]
pub struct StubConfig {
    pub root: Behavior,
    pub options: Behavior,
    pub predict: Behavior,
    pub predict_image: Behavior,
}

impl Default for StubConfig {
    fn default() -> Self {
        Self {
            root: Behavior::Respond(StatusCode::OK, json!({"status": "running"})),
            options: Behavior::Respond(StatusCode::OK, sample_options()),
            predict: Behavior::Respond(StatusCode::OK, structured_success()),
            predict_image: Behavior::Respond(StatusCode::OK, image_success()),
        }
    }
}

pub fn sample_options() -> Value {
    json!({
        "brands": ["Toyota", "Honda"],
        "fuel_types": ["Gasoline"],
        "transmissions": ["Automatic"]
    })
}

pub fn structured_success() -> Value {
    json!({
        "success": true,
        "predicted_price": 23100.5,
        "predicted_price_formatted": "₹23,100.50",
        "input_data": {
            "brand": "Toyota",
            "model_year": 2020,
            "mileage": 53000.0,
            "fuel_type": "Gasoline",
            "transmission": "Automatic",
            "car_age": 5,
            "has_accident": 0,
            "horsepower": 250.0
        }
    })
}

pub fn image_success() -> Value {
    json!({
        "success": true,
        "predicted_price": 18750.0,
        "predicted_price_formatted": "₹18,750.00",
        "estimated_features": {"model_year": 2019, "mileage": 72000.0, "horsepower": 310.0},
        "message": "Prediction based on image analysis and provided data"
    })
}

/// What the image endpoint received
#[derive(Debug, Clone, Default)]
pub struct UploadRecord {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub size: usize,
    pub fields: HashMap<String, String>,
}

#[derive(Default)]
pub struct Hits {
    pub root: AtomicUsize,
    pub options: AtomicUsize,
    pub predict: AtomicUsize,
    pub predict_image: AtomicUsize,
}

impl Hits {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

pub struct Shared {
    config: StubConfig,
    pub hits: Hits,
    pub last_predict: Mutex<Option<Value>>,
    pub last_upload: Mutex<Option<UploadRecord>>,
    observer: Mutex<Option<watch::Receiver<Snapshot>>>,
    /// `loading` as seen by the observer while each prediction was being handled
    pub loading_seen: Mutex<Vec<bool>>,
    /// Connectivity as seen by the observer whenever the root was probed
    pub connectivity_seen: Mutex<Vec<ConnectivityStatus>>,
}

impl Shared {
    fn record_loading(&self) {
        if let Some(rx) = self.observer.lock().unwrap().as_ref() {
            let loading = rx.borrow().loading;
            self.loading_seen.lock().unwrap().push(loading);
        }
    }

    fn record_connectivity(&self) {
        if let Some(rx) = self.observer.lock().unwrap().as_ref() {
            let connectivity = rx.borrow().connectivity;
            self.connectivity_seen.lock().unwrap().push(connectivity);
        }
    }
}

pub struct StubService {
    pub url: String,
    pub shared: Arc<Shared>,
}

impl StubService {
    pub async fn start(config: StubConfig) -> Self {
        let shared = Arc::new(Shared {
            config,
            hits: Hits::default(),
            last_predict: Mutex::new(None),
            last_upload: Mutex::new(None),
            observer: Mutex::new(None),
            loading_seen: Mutex::new(Vec::new()),
            connectivity_seen: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/", get(root))
            .route("/get_options", get(options))
            .route("/predict", post(predict))
            .route("/predict_image", post(predict_image))
            .layer(DefaultBodyLimit::max(16 * 1024 * 1024))
            .with_state(shared.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{}", addr),
            shared,
        }
    }

    /// Record the app's loading flag whenever a prediction arrives
    pub fn observe(&self, rx: watch::Receiver<Snapshot>) {
        *self.shared.observer.lock().unwrap() = Some(rx);
    }

    pub fn hits(&self) -> &Hits {
        &self.shared.hits
    }

    pub fn loading_seen(&self) -> Vec<bool> {
        self.shared.loading_seen.lock().unwrap().clone()
    }

    pub fn connectivity_seen(&self) -> Vec<ConnectivityStatus> {
        self.shared.connectivity_seen.lock().unwrap().clone()
    }

    pub fn last_predict(&self) -> Option<Value> {
        self.shared.last_predict.lock().unwrap().clone()
    }

    pub fn last_upload(&self) -> Option<UploadRecord> {
        self.shared.last_upload.lock().unwrap().clone()
    }
}

/// An address nothing listens on
pub async fn unused_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// `call` is the zero-based index of this request to the endpoint
async fn answer(behavior: &Behavior, call: usize) -> (StatusCode, Json<Value>) {
    match behavior {
        Behavior::UnavailableFor(n, body) => {
            if call < *n {
                (StatusCode::SERVICE_UNAVAILABLE, Json(json!({})))
            } else {
                (StatusCode::OK, Json(body.clone()))
            }
        }
        Behavior::Respond(status, body) => (*status, Json(body.clone())),
        Behavior::Delay(delay, body) => {
            tokio::time::sleep(*delay).await;
            (StatusCode::OK, Json(body.clone()))
        }
    }
}

async fn root(State(shared): State<Arc<Shared>>) -> (StatusCode, Json<Value>) {
    let call = shared.hits.root.fetch_add(1, Ordering::SeqCst);
    shared.record_connectivity();
    answer(&shared.config.root, call).await
}

async fn options(State(shared): State<Arc<Shared>>) -> (StatusCode, Json<Value>) {
    let call = shared.hits.options.fetch_add(1, Ordering::SeqCst);
    answer(&shared.config.options, call).await
}

async fn predict(
    State(shared): State<Arc<Shared>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let call = shared.hits.predict.fetch_add(1, Ordering::SeqCst);
    shared.record_loading();
    *shared.last_predict.lock().unwrap() = Some(body);
    answer(&shared.config.predict, call).await
}

async fn predict_image(
    State(shared): State<Arc<Shared>>,
    mut multipart: Multipart,
) -> (StatusCode, Json<Value>) {
    let call = shared.hits.predict_image.fetch_add(1, Ordering::SeqCst);
    shared.record_loading();

    let mut record = UploadRecord::default();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" {
            record.filename = field.file_name().map(str::to_string);
            record.content_type = field.content_type().map(str::to_string);
            record.size = field.bytes().await.map(|b| b.len()).unwrap_or(0);
        } else {
            let text = field.text().await.unwrap_or_default();
            record.fields.insert(name, text);
        }
    }
    *shared.last_upload.lock().unwrap() = Some(record);

    answer(&shared.config.predict_image, call).await
}
