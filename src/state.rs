//! Application state machine
//!
//! One owner for every transition: startup (probe, then options), field
//! edits, image selection and the two submission pipelines. Each transition
//! publishes a [`Snapshot`] so observers can follow the flow while a request
//! is suspended, and [`AppState::screen`] projects the whole record for
//! rendering.

use chrono::Datelike;
use serde::Serialize;
use tokio::sync::watch;

use crate::api::{ApiClient, OptionSet, PredictionResult};
use crate::config::Settings;
use crate::connectivity::{self, ConnectivityStatus};
use crate::dispatch::{Dispatcher, MISSING_IMAGE_MESSAGE};
use crate::error::{ErrorSource, RequestError};
use crate::form::{FormField, FormInput};
use crate::image::{ImageAsset, ImageSelection, SelectedFile, SelectionOutcome};
use crate::options;
use crate::{log_debug, log_info, log_warn};

const MODULE: &str = "state";

/// Which submission flow is selected
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Pipeline {
    #[default]
    Form,
    Image,
}

/// The single result-or-error slot. Holding one variant at a time keeps a
/// result and an error from ever being live together.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SubmissionState {
    #[default]
    Idle,
    Submitting(Pipeline),
    Succeeded(PredictionResult),
    Failed(RequestError),
}

impl SubmissionState {
    pub fn is_loading(&self) -> bool {
        matches!(self, SubmissionState::Submitting(_))
    }

    pub fn result(&self) -> Option<&PredictionResult> {
        match self {
            SubmissionState::Succeeded(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&RequestError> {
        match self {
            SubmissionState::Failed(error) => Some(error),
            _ => None,
        }
    }

    pub fn phase(&self) -> Phase {
        match self {
            SubmissionState::Idle => Phase::Idle,
            SubmissionState::Submitting(_) => Phase::Submitting,
            SubmissionState::Succeeded(_) => Phase::Succeeded,
            SubmissionState::Failed(_) => Phase::Failed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

/// Immutable view published on every transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub connectivity: ConnectivityStatus,
    pub options_loaded: bool,
    pub active: Pipeline,
    pub phase: Phase,
    pub loading: bool,
}

/// Everything the ready screen shows
#[derive(Debug, Clone, Copy)]
pub struct ReadyView<'a> {
    pub options: &'a OptionSet,
    pub active: Pipeline,
    pub form: &'a FormInput,
    pub image: Option<&'a ImageAsset>,
    pub submission: &'a SubmissionState,
    pub can_submit: bool,
}

/// What the user sees
#[derive(Debug, Clone, Copy)]
pub enum Screen<'a> {
    Checking,
    Disconnected {
        api_url: &'a str,
        failure: Option<&'a RequestError>,
    },
    LoadingOptions { failure: Option<&'a RequestError> },
    Ready(ReadyView<'a>),
}

pub struct AppState {
    settings: Settings,
    client: ApiClient,
    dispatcher: Dispatcher,
    connectivity: ConnectivityStatus,
    connectivity_error: Option<RequestError>,
    options: Option<OptionSet>,
    options_error: Option<RequestError>,
    form: FormInput,
    image: ImageSelection,
    active: Pipeline,
    submission: SubmissionState,
    snapshots: watch::Sender<Snapshot>,
}

impl AppState {
    pub fn new(settings: Settings) -> Result<Self, String> {
        let client = ApiClient::new(&settings.api_url)?;
        let dispatcher = Dispatcher::new(client.clone(), &settings);
        let (snapshots, _) = watch::channel(Snapshot {
            connectivity: ConnectivityStatus::Checking,
            options_loaded: false,
            active: Pipeline::Form,
            phase: Phase::Idle,
            loading: false,
        });

        Ok(Self {
            settings,
            client,
            dispatcher,
            connectivity: ConnectivityStatus::Checking,
            connectivity_error: None,
            options: None,
            options_error: None,
            form: FormInput::default(),
            image: ImageSelection::default(),
            active: Pipeline::Form,
            submission: SubmissionState::Idle,
            snapshots,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn connectivity(&self) -> ConnectivityStatus {
        self.connectivity
    }

    pub fn options(&self) -> Option<&OptionSet> {
        self.options.as_ref()
    }

    pub fn connectivity_error(&self) -> Option<&RequestError> {
        self.connectivity_error.as_ref()
    }

    pub fn options_error(&self) -> Option<&RequestError> {
        self.options_error.as_ref()
    }

    pub fn form(&self) -> &FormInput {
        &self.form
    }

    pub fn image(&self) -> &ImageSelection {
        &self.image
    }

    pub fn active(&self) -> Pipeline {
        self.active
    }

    pub fn submission(&self) -> &SubmissionState {
        &self.submission
    }

    pub fn is_loading(&self) -> bool {
        self.submission.is_loading()
    }

    pub fn is_ready(&self) -> bool {
        self.connectivity == ConnectivityStatus::Connected && self.options.is_some()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.subscribe()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            connectivity: self.connectivity,
            options_loaded: self.options.is_some(),
            active: self.active,
            phase: self.submission.phase(),
            loading: self.submission.is_loading(),
        }
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.snapshot());
    }

    /// Probe the service, then load options if it is reachable
    pub async fn start(&mut self) {
        self.connectivity = ConnectivityStatus::Checking;
        self.connectivity_error = None;
        self.publish();

        if let Err(e) = connectivity::probe(&self.client, self.settings.probe_timeout).await {
            log_warn!(MODULE, "Service not reachable, waiting for manual retry");
            self.connectivity = ConnectivityStatus::Disconnected;
            self.connectivity_error = Some(e);
            self.publish();
            return;
        }
        self.connectivity = ConnectivityStatus::Connected;
        self.publish();

        match options::load(&self.client, self.settings.options_timeout).await {
            Ok(options) => {
                self.form.seed_from(&options);
                self.options = Some(options);
                self.options_error = None;
                log_info!(MODULE, "Ready");
            }
            Err(e) => {
                log_warn!(MODULE, "Options unavailable, form stays blocked: {}", e);
                self.options_error = Some(e);
            }
        }
        self.publish();
    }

    /// Discard everything and run startup again
    pub async fn retry(&mut self) {
        log_info!(MODULE, "Restarting from connectivity check");
        self.options = None;
        self.options_error = None;
        self.form = FormInput::default();
        self.image.clear();
        self.active = Pipeline::Form;
        self.submission = SubmissionState::Idle;
        self.start().await;
    }

    /// Select the active pipeline. The other pipeline's data is kept.
    pub fn set_active(&mut self, pipeline: Pipeline) {
        if self.active != pipeline {
            log_debug!(MODULE, "Active pipeline: {:?}", pipeline);
            self.active = pipeline;
            self.publish();
        }
    }

    /// Replace one form field
    pub fn set_field(&mut self, field: FormField, value: impl Into<String>) -> Result<(), String> {
        if !self.is_ready() {
            return Err("The form is not available until options are loaded".to_string());
        }
        self.form.set(field, value);
        Ok(())
    }

    /// Run a file through the image pipeline. Refused before the form is
    /// ready and while a submission is running.
    pub async fn select_image(&mut self, file: SelectedFile) -> Result<(), String> {
        if !self.is_ready() {
            log_warn!(MODULE, "Ignoring image selection before the form is ready");
            return Err("Images can be selected once options are loaded".to_string());
        }
        if self.is_loading() {
            log_warn!(MODULE, "Ignoring image selection while a submission is running");
            return Err("Wait for the current prediction to finish".to_string());
        }

        match self.image.select(file).await {
            SelectionOutcome::Rejected(e) => {
                self.submission = SubmissionState::Failed(e);
            }
            SelectionOutcome::Accepted { preview_error } => {
                if let Some(e) = preview_error {
                    self.submission = SubmissionState::Failed(e);
                } else if matches!(self.submission, SubmissionState::Failed(_)) {
                    self.submission = SubmissionState::Idle;
                }
            }
        }
        self.publish();
        Ok(())
    }

    /// Submit through whichever pipeline is active
    pub async fn submit(&mut self) {
        match self.active {
            Pipeline::Form => self.submit_structured().await,
            Pipeline::Image => self.submit_image().await,
        }
    }

    pub async fn submit_structured(&mut self) {
        if !self.can_start_submission() {
            return;
        }
        let Some(options) = self.options.as_ref() else {
            return;
        };
        let prepared = self.form.to_request(options, current_year());

        self.begin(Pipeline::Form);
        let outcome = match prepared {
            Ok(request) => self.dispatcher.submit_structured(&request).await,
            Err(e) => Err(e),
        };
        self.finish(outcome);
    }

    pub async fn submit_image(&mut self) {
        if !self.can_start_submission() {
            return;
        }
        if self.image.asset().is_none() {
            log_warn!(MODULE, "Image submission without a selected image");
            self.submission = SubmissionState::Failed(RequestError::new(
                ErrorSource::ImageSubmit,
                MISSING_IMAGE_MESSAGE,
            ));
            self.publish();
            return;
        }
        let Some(options) = self.options.as_ref() else {
            return;
        };
        let prepared = self.form.image_metadata(options);

        self.begin(Pipeline::Image);
        let outcome = match prepared {
            Ok(metadata) => {
                self.dispatcher
                    .submit_image(self.image.asset(), &metadata)
                    .await
            }
            Err(e) => Err(e),
        };
        self.finish(outcome);
    }

    fn can_start_submission(&self) -> bool {
        if !self.is_ready() {
            log_warn!(MODULE, "Ignoring submission before the form is ready");
            return false;
        }
        if self.is_loading() {
            log_warn!(MODULE, "Ignoring submission while another is running");
            return false;
        }
        true
    }

    /// Clears any previous result or error and raises the loading flag
    fn begin(&mut self, pipeline: Pipeline) {
        self.submission = SubmissionState::Submitting(pipeline);
        self.publish();
    }

    /// Stores the outcome and lowers the loading flag
    fn finish(&mut self, outcome: Result<PredictionResult, RequestError>) {
        self.submission = match outcome {
            Ok(result) => SubmissionState::Succeeded(result),
            Err(e) => {
                log_warn!(MODULE, "Submission failed ({}): {}", e.source, e.message);
                SubmissionState::Failed(e)
            }
        };
        self.publish();
    }

    /// Project the whole state for rendering
    pub fn screen(&self) -> Screen<'_> {
        match (self.connectivity, self.options.as_ref()) {
            (ConnectivityStatus::Checking, _) => Screen::Checking,
            (ConnectivityStatus::Disconnected, _) => Screen::Disconnected {
                api_url: &self.settings.api_url,
                failure: self.connectivity_error.as_ref(),
            },
            (ConnectivityStatus::Connected, None) => Screen::LoadingOptions {
                failure: self.options_error.as_ref(),
            },
            (ConnectivityStatus::Connected, Some(options)) => {
                let image = self.image.asset();
                let can_submit = !self.is_loading()
                    && (self.active == Pipeline::Form || image.is_some());
                Screen::Ready(ReadyView {
                    options,
                    active: self.active,
                    form: &self.form,
                    image,
                    submission: &self.submission,
                    can_submit,
                })
            }
        }
    }
}

fn current_year() -> i32 {
    chrono::Local::now().year()
}
