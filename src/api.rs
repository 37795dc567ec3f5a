use crate::admin::{AdminShell, AdminTab};
use crate::auth::SessionId;
use crate::logging::log_action;
use crate::manage_contacts::MemoryClipboard;
use crate::records::ContactStatus;
use crate::security::{AccessGate, AUTH_ERROR_KEY, AUTH_ERROR_MESSAGE};
use crate::services::{ServiceResult, SessionContext, StudioError};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{error, info};

/// Everything one client tab owns.
pub struct AdminSession {
    pub ctx: SessionContext,
    pub shell: AdminShell,
    pub clipboard: MemoryClipboard,
}

impl AdminSession {
    pub fn new(gate: AccessGate) -> Self {
        Self {
            ctx: SessionContext::new(),
            shell: AdminShell::new(gate),
            clipboard: MemoryClipboard::default(),
        }
    }
}

pub type SharedSession = Arc<tokio::sync::Mutex<AdminSession>>;

#[derive(Clone)]
pub struct AppState {
    gate: AccessGate,
    sessions: Arc<Mutex<HashMap<String, SharedSession>>>,
}

impl AppState {
    pub fn new(gate: AccessGate) -> Self {
        Self {
            gate,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn find_session(&self, id: &SessionId) -> Option<SharedSession> {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id.0)
            .cloned()
    }

    /// Session for an admin route. Only a successful login registers one, so
    /// an unknown id is treated as locked and never grows the registry.
    pub fn unlocked_session(&self, id: &SessionId) -> ServiceResult<SharedSession> {
        self.find_session(id)
            .ok_or_else(|| StudioError::PermissionDenied("admin_locked".into()))
    }

    fn register_session(&self, id: &SessionId, session: SharedSession) {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(id.0.clone())
            .or_insert(session);
        info!(session = %id.0, "admin session opened");
    }

    pub fn close_session(&self, id: &SessionId) -> Option<SharedSession> {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id.0)
    }

    pub fn session_count(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl IntoResponse for StudioError {
    fn into_response(self) -> Response {
        let status = match &self {
            StudioError::Validation(_) => StatusCode::BAD_REQUEST,
            StudioError::Authentication => StatusCode::UNAUTHORIZED,
            StudioError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            StudioError::NotFound(_) => StatusCode::NOT_FOUND,
            StudioError::Load(_) => StatusCode::SERVICE_UNAVAILABLE,
            StudioError::Config(_) | StudioError::Internal(_) => {
                error!(error = %self, "admin request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (
            status,
            Json(json!({ "status": "error", "message": self.to_string() })),
        )
            .into_response()
    }
}

type ApiResult = Result<Json<Value>, StudioError>;

#[derive(Deserialize)]
pub struct LoginPayload {
    pub password: String,
}

#[derive(Deserialize)]
pub struct RecordPayload {
    #[serde(default)]
    pub fields: Map<String, Value>,
}

#[derive(Deserialize)]
pub struct StatusPayload {
    pub status: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/admin", get(render_shell))
        .route("/admin/login", post(login))
        .route("/admin/logout", post(logout))
        .route("/admin/session", delete(close_session))
        .route("/admin/tabs/:tab", post(select_tab))
        .route("/admin/records/:tab", get(list_records).post(create_record))
        .route(
            "/admin/records/:tab/:id",
            put(update_record).delete(delete_record),
        )
        .route(
            "/admin/records/:tab/:id/view",
            post(view_record).delete(close_view),
        )
        .route("/admin/contacts/:id/status", put(update_contact_status))
        .route("/admin/contacts/:id/copy-email", post(copy_contact_email))
        .route("/admin/portfolio/:id/attachments", post(add_attachment))
        .route(
            "/admin/portfolio/:id/attachments/:attachment_id",
            delete(delete_attachment),
        )
        .with_state(state)
}

fn parse_tab(raw: &str) -> ServiceResult<AdminTab> {
    raw.parse()
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "service": "ok",
            "sessions": state.session_count(),
            "timestamp": Utc::now()
        })),
    )
}

async fn login(
    State(state): State<AppState>,
    session_id: SessionId,
    Json(payload): Json<LoginPayload>,
) -> Response {
    let existing = state.find_session(&session_id);
    let session = existing.clone().unwrap_or_else(|| {
        Arc::new(tokio::sync::Mutex::new(AdminSession::new(state.gate.clone())))
    });
    let mut guard = session.lock().await;
    let AdminSession { ctx, shell, .. } = &mut *guard;
    match shell.gate().unlock(ctx, &payload.password) {
        Ok(gate) => {
            if existing.is_none() {
                state.register_session(&session_id, session.clone());
            }
            Json(json!({ "status": "ok", "gate": gate })).into_response()
        }
        Err(_) => {
            let message = ctx
                .context
                .string(AUTH_ERROR_KEY)
                .unwrap_or_else(|| AUTH_ERROR_MESSAGE.to_string());
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "status": "error", "message": message, "gate": "locked" })),
            )
                .into_response()
        }
    }
}

async fn logout(State(state): State<AppState>, session_id: SessionId) -> ApiResult {
    let session = state.unlocked_session(&session_id)?;
    let mut session = session.lock().await;
    let AdminSession { ctx, shell, .. } = &mut *session;
    shell.gate().ensure_unlocked(ctx)?;
    let gate = shell.gate().logout(ctx);
    Ok(Json(json!({ "status": "ok", "gate": gate })))
}

async fn close_session(State(state): State<AppState>, session_id: SessionId) -> ApiResult {
    let closed = match state.close_session(&session_id) {
        Some(session) => {
            let mut session = session.lock().await;
            session.shell.close();
            session.ctx.close();
            info!(session = %session_id.0, "admin session closed");
            true
        }
        None => false,
    };
    Ok(Json(json!({ "status": "ok", "closed": closed })))
}

async fn render_shell(State(state): State<AppState>, session_id: SessionId) -> ApiResult {
    let session = state.unlocked_session(&session_id)?;
    let mut session = session.lock().await;
    let AdminSession { ctx, shell, .. } = &mut *session;
    let selected = shell.selected();
    shell.focus(ctx, selected).await?;
    Ok(Json(shell.render(ctx)?))
}

async fn select_tab(
    State(state): State<AppState>,
    session_id: SessionId,
    Path(tab): Path<String>,
) -> ApiResult {
    let tab = parse_tab(&tab)?;
    let session = state.unlocked_session(&session_id)?;
    let mut session = session.lock().await;
    let AdminSession { ctx, shell, .. } = &mut *session;
    shell.select(ctx, tab).await?;
    Ok(Json(shell.render(ctx)?))
}

async fn list_records(
    State(state): State<AppState>,
    session_id: SessionId,
    Path(tab): Path<String>,
) -> ApiResult {
    let tab = parse_tab(&tab)?;
    let session = state.unlocked_session(&session_id)?;
    let mut session = session.lock().await;
    let AdminSession { ctx, shell, .. } = &mut *session;
    let records = shell.list(ctx, tab).await?;
    Ok(Json(json!({ "status": "ok", "tab": tab, "records": records })))
}

async fn create_record(
    State(state): State<AppState>,
    session_id: SessionId,
    Path(tab): Path<String>,
    Json(payload): Json<RecordPayload>,
) -> ApiResult {
    let tab = parse_tab(&tab)?;
    let session = state.unlocked_session(&session_id)?;
    let mut session = session.lock().await;
    let AdminSession { ctx, shell, .. } = &mut *session;
    let result = shell.submit(ctx, tab, None, &payload.fields).await?;
    Ok(Json(json!({ "status": "ok", "result": result })))
}

async fn update_record(
    State(state): State<AppState>,
    session_id: SessionId,
    Path((tab, id)): Path<(String, i64)>,
    Json(payload): Json<RecordPayload>,
) -> ApiResult {
    let tab = parse_tab(&tab)?;
    let session = state.unlocked_session(&session_id)?;
    let mut session = session.lock().await;
    let AdminSession { ctx, shell, .. } = &mut *session;
    let result = shell.submit(ctx, tab, Some(id), &payload.fields).await?;
    Ok(Json(json!({ "status": "ok", "result": result })))
}

async fn delete_record(
    State(state): State<AppState>,
    session_id: SessionId,
    Path((tab, id)): Path<(String, i64)>,
) -> ApiResult {
    let tab = parse_tab(&tab)?;
    let session = state.unlocked_session(&session_id)?;
    let mut session = session.lock().await;
    let AdminSession { ctx, shell, .. } = &mut *session;
    let removed = shell.delete(ctx, tab, id).await?;
    Ok(Json(json!({ "status": "ok", "removed": removed })))
}

async fn view_record(
    State(state): State<AppState>,
    session_id: SessionId,
    Path((tab, id)): Path<(String, i64)>,
) -> ApiResult {
    let tab = parse_tab(&tab)?;
    let session = state.unlocked_session(&session_id)?;
    let mut session = session.lock().await;
    let AdminSession { ctx, shell, .. } = &mut *session;
    let record = shell.open_detail(ctx, tab, id).await?;
    Ok(Json(json!({ "status": "ok", "record": record })))
}

async fn close_view(
    State(state): State<AppState>,
    session_id: SessionId,
    Path((tab, id)): Path<(String, i64)>,
) -> ApiResult {
    let tab = parse_tab(&tab)?;
    let session = state.unlocked_session(&session_id)?;
    let mut session = session.lock().await;
    let AdminSession { ctx, shell, .. } = &mut *session;
    let closed = shell.close_detail(ctx, tab, id).await?;
    Ok(Json(json!({ "status": "ok", "closed": closed })))
}

async fn update_contact_status(
    State(state): State<AppState>,
    session_id: SessionId,
    Path(id): Path<i64>,
    Json(payload): Json<StatusPayload>,
) -> ApiResult {
    let status: ContactStatus = payload.status.parse()?;
    let session = state.unlocked_session(&session_id)?;
    let mut session = session.lock().await;
    let AdminSession { ctx, shell, .. } = &mut *session;
    let request = shell.set_contact_status(ctx, id, status).await?;
    Ok(Json(json!({ "status": "ok", "record": request, "badge": status.label() })))
}

async fn copy_contact_email(
    State(state): State<AppState>,
    session_id: SessionId,
    Path(id): Path<i64>,
) -> ApiResult {
    let session = state.unlocked_session(&session_id)?;
    let mut session = session.lock().await;
    let AdminSession {
        ctx,
        shell,
        clipboard,
    } = &mut *session;
    let email = shell.copy_contact_email(ctx, id, &*clipboard).await?;
    log_action(ctx, "contact_email_copied", json!({ "id": id }));
    Ok(Json(json!({ "status": "ok", "copied": email })))
}

async fn add_attachment(
    State(state): State<AppState>,
    session_id: SessionId,
    Path(id): Path<i64>,
    Json(payload): Json<RecordPayload>,
) -> ApiResult {
    let session = state.unlocked_session(&session_id)?;
    let mut session = session.lock().await;
    let AdminSession { ctx, shell, .. } = &mut *session;
    let attachment = shell.add_attachment(ctx, id, &payload.fields).await?;
    Ok(Json(json!({ "status": "ok", "attachment": attachment })))
}

async fn delete_attachment(
    State(state): State<AppState>,
    session_id: SessionId,
    Path((id, attachment_id)): Path<(i64, i64)>,
) -> ApiResult {
    let session = state.unlocked_session(&session_id)?;
    let mut session = session.lock().await;
    let AdminSession { ctx, shell, .. } = &mut *session;
    let removed = shell.remove_attachment(ctx, id, attachment_id).await?;
    Ok(Json(json!({ "status": "ok", "removed": removed })))
}
