//! # API REST
//!
//! HTTP surface of the referral service.
//!
//! Handles:
//! - wizard session endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, status mapping)
//!
//! Sessions live in process memory keyed by UUID; each holds one
//! [`Wizard`]. Submission renders the email and delivers it through the
//! configured [`NotificationSink`] while the session sits in the
//! `Submitting` state, so a second submit for the same session is refused.

#![warn(rust_2018_idioms)]

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path as AxumPath, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use mailer::{build_message, MailerConfig, NotificationSink};
use referral_core::{
    Advance, ReferralError, ReferralRecord, Retreat, ValidationRules, Wizard, WizardState,
};
use referral_types::ReferralPath;

pub mod settings;

pub use settings::ServiceConfig;

/// Shared state for all request handlers.
#[derive(Clone)]
pub struct AppState {
    sessions: Arc<Mutex<HashMap<Uuid, Wizard>>>,
    sink: Arc<dyn NotificationSink>,
    mailer: Arc<MailerConfig>,
    rules: ValidationRules,
}

impl AppState {
    pub fn new(sink: Arc<dyn NotificationSink>, mailer: MailerConfig, rules: ValidationRules) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            sink,
            mailer: Arc::new(mailer),
            rules,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateSessionReq {
    pub path: ReferralPath,
}

/// Snapshot of a wizard session as returned by every endpoint.
#[derive(Serialize, ToSchema)]
pub struct SessionView {
    pub id: Uuid,
    pub path: ReferralPath,
    /// One of `step`, `blocked`, `submitting`, `submitted`.
    pub state: String,
    /// Current step (1-based); absent in `blocked` and `submitted`.
    pub step: Option<usize>,
    pub step_label: Option<String>,
    pub step_count: usize,
    /// Field-level validation errors from the last rejected transition.
    pub errors: BTreeMap<String, String>,
    /// Reason the last delivery attempt failed, if any.
    pub delivery_error: Option<String>,
    pub record: ReferralRecord,
}

impl SessionView {
    fn of(id: Uuid, wizard: &Wizard) -> Self {
        let state = match wizard.state() {
            WizardState::Step(_) => "step",
            WizardState::Blocked => "blocked",
            WizardState::Submitting => "submitting",
            WizardState::Submitted => "submitted",
        };
        Self {
            id,
            path: wizard.path(),
            state: state.to_string(),
            step: wizard.current_step(),
            step_label: wizard.step_label().map(str::to_string),
            step_count: wizard.step_count(),
            errors: wizard.errors().clone(),
            delivery_error: wizard.delivery_error().map(str::to_string),
            record: wizard.record().clone(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct TransitionRes {
    /// `moved`, `rejected`, `blocked` or `exited`.
    pub outcome: String,
    pub session: SessionView,
}

#[derive(Serialize, ToSchema)]
pub struct SubmitRes {
    /// Provider receipt for the delivered email.
    pub receipt_id: String,
    pub session: SessionView,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

/// An error response: a status code and a one-line reason.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: "No such session".into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<ReferralError> for ApiError {
    fn from(err: ReferralError) -> Self {
        let status = match err {
            ReferralError::RecordLocked
            | ReferralError::TransitionUnavailable
            | ReferralError::NotOnFinalStep
            | ReferralError::AlreadySubmitting
            | ReferralError::ImagingRequired
            | ReferralError::NotSubmitting
            | ReferralError::NotSubmitted => StatusCode::CONFLICT,
            ReferralError::PathMismatch
            | ReferralError::IncompleteRecord
            | ReferralError::AttachmentDecode { .. }
            | ReferralError::UnsupportedAttachmentType(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        create_session,
        get_session,
        update_record,
        advance_session,
        retreat_session,
        submit_session,
        dismiss_session,
        delete_session,
    ),
    components(schemas(
        HealthRes,
        CreateSessionReq,
        SessionView,
        TransitionRes,
        SubmitRes,
        ErrorBody,
        referral_core::ReferralRecord,
        referral_core::ImagingExam,
        referral_core::ClinicianContact,
        referral_core::PatientContact,
        referral_core::Attachment,
        referral_types::ReferralPath,
        referral_types::TriState,
        referral_types::ImagingKind,
        referral_types::Destination,
    ))
)]
struct ApiDoc;

/// Build the application router with Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/sessions", post(create_session))
        .route(
            "/sessions/:id",
            get(get_session).delete(delete_session),
        )
        .route("/sessions/:id/record", put(update_record))
        .route("/sessions/:id/advance", post(advance_session))
        .route("/sessions/:id/retreat", post(retreat_session))
        .route("/sessions/:id/submit", post(submit_session))
        .route("/sessions/:id/dismiss", post(dismiss_session))
        .merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(addr: &str, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("-- Referral REST API listening on {}", addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Run `f` against the named session under the store lock.
fn with_session<T>(
    state: &AppState,
    id: Uuid,
    f: impl FnOnce(&mut Wizard) -> Result<T, ApiError>,
) -> Result<T, ApiError> {
    let mut sessions = state
        .sessions
        .lock()
        .map_err(|_| ApiError::internal("Session store poisoned"))?;
    let wizard = sessions.get_mut(&id).ok_or_else(ApiError::not_found)?;
    f(wizard)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint used for monitoring and container probes.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "Referral REST API is alive".into(),
    })
}

#[utoipa::path(
    post,
    path = "/sessions",
    request_body = CreateSessionReq,
    responses(
        (status = 201, description = "Session created", body = SessionView)
    )
)]
/// Start a fresh wizard session on step 1 of the chosen path.
#[axum::debug_handler]
async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionReq>,
) -> Result<(StatusCode, Json<SessionView>), ApiError> {
    let id = Uuid::new_v4();
    let wizard = Wizard::new(req.path, state.rules);
    let view = SessionView::of(id, &wizard);
    state
        .sessions
        .lock()
        .map_err(|_| ApiError::internal("Session store poisoned"))?
        .insert(id, wizard);
    tracing::info!(session = %id, path = ?req.path, "session created");
    Ok((StatusCode::CREATED, Json(view)))
}

#[utoipa::path(
    get,
    path = "/sessions/{id}",
    responses(
        (status = 200, description = "Session snapshot", body = SessionView),
        (status = 404, description = "No such session", body = ErrorBody)
    )
)]
#[axum::debug_handler]
async fn get_session(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    with_session(&state, id, |wizard| Ok(Json(SessionView::of(id, wizard))))
}

#[utoipa::path(
    put,
    path = "/sessions/{id}/record",
    request_body = referral_core::ReferralRecord,
    responses(
        (status = 200, description = "Record replaced", body = SessionView),
        (status = 404, description = "No such session", body = ErrorBody),
        (status = 409, description = "Session is not editable", body = ErrorBody),
        (status = 422, description = "Record rejected", body = ErrorBody)
    )
)]
/// Replace the session's record with an edited copy.
#[axum::debug_handler]
async fn update_record(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<Uuid>,
    Json(record): Json<ReferralRecord>,
) -> Result<Json<SessionView>, ApiError> {
    with_session(&state, id, |wizard| {
        wizard.update_record(record)?;
        Ok(Json(SessionView::of(id, wizard)))
    })
}

#[utoipa::path(
    post,
    path = "/sessions/{id}/advance",
    responses(
        (status = 200, description = "Transition outcome", body = TransitionRes),
        (status = 404, description = "No such session", body = ErrorBody),
        (status = 409, description = "No forward transition from this state", body = ErrorBody)
    )
)]
/// Validate the current step and move forward; a rejected advance leaves
/// the field errors on the session snapshot.
#[axum::debug_handler]
async fn advance_session(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<Uuid>,
) -> Result<Json<TransitionRes>, ApiError> {
    with_session(&state, id, |wizard| {
        let outcome = match wizard.advance()? {
            Advance::Moved(_) => "moved",
            Advance::Rejected => "rejected",
            Advance::Blocked => "blocked",
        };
        Ok(Json(TransitionRes {
            outcome: outcome.to_string(),
            session: SessionView::of(id, wizard),
        }))
    })
}

#[utoipa::path(
    post,
    path = "/sessions/{id}/retreat",
    responses(
        (status = 200, description = "Transition outcome", body = TransitionRes),
        (status = 404, description = "No such session", body = ErrorBody),
        (status = 409, description = "No backward transition from this state", body = ErrorBody)
    )
)]
/// Move backwards. Retreating from step 1 or the blocked state exits the
/// wizard: the record is discarded and the session is removed from the
/// store, which the `exited` outcome announces.
#[axum::debug_handler]
async fn retreat_session(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<Uuid>,
) -> Result<Json<TransitionRes>, ApiError> {
    let mut sessions = state
        .sessions
        .lock()
        .map_err(|_| ApiError::internal("Session store poisoned"))?;
    let wizard = sessions.get_mut(&id).ok_or_else(ApiError::not_found)?;

    let outcome = match wizard.retreat()? {
        Retreat::Moved(_) => "moved",
        Retreat::Exited => {
            let view = SessionView::of(id, wizard);
            sessions.remove(&id);
            tracing::info!(session = %id, "session exited");
            return Ok(Json(TransitionRes {
                outcome: "exited".to_string(),
                session: view,
            }));
        }
    };
    Ok(Json(TransitionRes {
        outcome: outcome.to_string(),
        session: SessionView::of(id, wizard),
    }))
}

#[utoipa::path(
    post,
    path = "/sessions/{id}/submit",
    responses(
        (status = 200, description = "Referral delivered", body = SubmitRes),
        (status = 404, description = "No such session", body = ErrorBody),
        (status = 409, description = "Submission not available from this state", body = ErrorBody),
        (status = 422, description = "Record incomplete", body = ErrorBody),
        (status = 502, description = "Delivery failed; the session keeps the record", body = ErrorBody)
    )
)]
/// Submit the completed referral.
///
/// The store lock is not held across the delivery await; the session sits
/// in `Submitting` meanwhile, which refuses edits and concurrent submits.
#[axum::debug_handler]
async fn submit_session(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<Uuid>,
) -> Result<Json<SubmitRes>, ApiError> {
    let record = with_session(&state, id, |wizard| Ok(wizard.begin_submit()?))?;

    let message = build_message(&record, &state.mailer, Utc::now());
    let outcome = state.sink.deliver(&message).await;

    match outcome {
        Ok(receipt) => with_session(&state, id, |wizard| {
            wizard.finish_submit(Ok(()))?;
            tracing::info!(session = %id, receipt = %receipt.id, "referral delivered");
            Ok(Json(SubmitRes {
                receipt_id: receipt.id,
                session: SessionView::of(id, wizard),
            }))
        }),
        Err(error) => {
            let reason = error.to_string();
            tracing::error!(session = %id, %reason, "referral delivery failed");
            with_session(&state, id, |wizard| {
                wizard.finish_submit(Err(reason.clone()))?;
                Ok(())
            })?;
            Err(ApiError {
                status: StatusCode::BAD_GATEWAY,
                message: reason,
            })
        }
    }
}

#[utoipa::path(
    post,
    path = "/sessions/{id}/dismiss",
    responses(
        (status = 200, description = "Confirmation dismissed, session reset", body = SessionView),
        (status = 404, description = "No such session", body = ErrorBody),
        (status = 409, description = "Nothing to dismiss", body = ErrorBody)
    )
)]
/// Dismiss the success confirmation and reset the session to step 1.
#[axum::debug_handler]
async fn dismiss_session(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    with_session(&state, id, |wizard| {
        wizard.dismiss()?;
        Ok(Json(SessionView::of(id, wizard)))
    })
}

#[utoipa::path(
    delete,
    path = "/sessions/{id}",
    responses(
        (status = 204, description = "Session removed"),
        (status = 404, description = "No such session", body = ErrorBody)
    )
)]
#[axum::debug_handler]
async fn delete_session(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    let removed = state
        .sessions
        .lock()
        .map_err(|_| ApiError::internal("Session store poisoned"))?
        .remove(&id);
    match removed {
        Some(_) => Ok(StatusCode::NO_CONTENT),
        None => Err(ApiError::not_found()),
    }
}
