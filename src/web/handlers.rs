use axum::{
    extract::{rejection::FormRejection, State},
    response::{Html, IntoResponse, Redirect},
    Form, Json,
};
use serde::Serialize;
use std::sync::Arc;
use tera::{Context, Tera};
use tracing::{error, warn};

use super::client_ip::ClientIp;
use super::error::AppError;
use super::templates::{error_context, HistoryEntry};
use crate::lookup::LookupService;
use crate::models::{IpForm, VisitorData};

const TRACK_ERROR_MESSAGE: &str = "Error fetching IP info";
const TEST_ERROR_MESSAGE: &str = "Error running test mode";

pub struct AppState {
    pub lookups: LookupService,
    pub templates: Arc<Tera>,
}

impl AppState {
    pub fn new(lookups: LookupService, templates: Tera) -> Self {
        Self {
            lookups,
            templates: Arc::new(templates),
        }
    }

    fn render(&self, template: &str, context: &Context) -> Result<Html<String>, AppError> {
        Ok(Html(self.templates.render(template, context)?))
    }

    fn render_result(&self, data: &VisitorData) -> Result<Html<String>, AppError> {
        let mut context = Context::new();
        context.insert("data", data);
        self.render("result.html", &context)
    }
}

/// Home page: look up the visitor and show recent history
pub async fn home(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
) -> Result<Html<String>, AppError> {
    let view = state.lookups.visit(&ip).await;
    let history: Vec<HistoryEntry> = view.history.iter().map(HistoryEntry::from).collect();

    let mut context = Context::new();
    context.insert("visitor_data", &view.visitor);
    context.insert("history", &history);
    context.insert("error", &view.error);

    state.render("index.html", &context)
}

/// Look up an address submitted through the form
pub async fn track(
    State(state): State<Arc<AppState>>,
    Form(form): Form<IpForm>,
) -> Result<Html<String>, AppError> {
    let ip = form
        .ip()
        .ok_or_else(|| AppError::BadRequest("the ip field is required".to_string()))?;

    match state.lookups.lookup(ip).await {
        Ok(data) => state.render_result(&data),
        Err(e) => {
            error!(%ip, error = %e, "error fetching IP info");
            state.render("error.html", &error_context(TRACK_ERROR_MESSAGE))
        }
    }
}

/// Look up a random well-known public address
pub async fn test_mode(State(state): State<Arc<AppState>>) -> Result<Html<String>, AppError> {
    match state.lookups.test_lookup().await {
        Ok(data) => state.render_result(&data),
        Err(e) => {
            error!(error = %e, "error in test mode");
            state.render("error.html", &error_context(TEST_ERROR_MESSAGE))
        }
    }
}

/// Delete history for one address, then go home
pub async fn delete_history(
    State(state): State<Arc<AppState>>,
    form: Result<Form<IpForm>, FormRejection>,
) -> Redirect {
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            warn!(error = %rejection, "delete-history body could not be read");
            IpForm::default()
        }
    };

    match form.ip() {
        Some(ip) => {
            state.lookups.forget(ip).await;
        }
        None => warn!("delete-history submitted without an ip"),
    }
    Redirect::to("/")
}

/// Delete all history, then go home
pub async fn clear_history(State(state): State<Arc<AppState>>) -> Redirect {
    state.lookups.clear().await;
    Redirect::to("/")
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    #[derive(Serialize)]
    struct HealthResponse {
        status: String,
    }

    Json(HealthResponse {
        status: "OK".to_string(),
    })
}
