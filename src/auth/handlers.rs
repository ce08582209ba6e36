use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    auth::{
        dto::{
            DashboardResponse, LoginRequest, LoginResponse, PublicUser, RegisterRequest,
            RegisteredUser,
        },
        extractors::CurrentUser,
        services,
    },
    error::{AuthError, FieldError},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/dashboard", get(dashboard))
        .route("/auth/profile", get(profile))
}

/// Malformed JSON or wrongly typed fields never reach the flows.
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AuthError> {
    payload.map(|Json(v)| v).map_err(|rejection| {
        warn!(reason = %rejection.body_text(), "rejected request body");
        AuthError::Validation(vec![FieldError::new("body", rejection.body_text())])
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisteredUser>), AuthError> {
    let user = services::register(state.users.as_ref(), body(payload)?).await?;
    Ok((StatusCode::CREATED, Json(RegisteredUser::from(&user))))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AuthError> {
    let session = services::login(state.users.as_ref(), &state.keys, body(payload)?).await?;
    Ok(Json(LoginResponse {
        token: session.token,
        user: PublicUser::from(&session.user),
    }))
}

#[instrument(skip_all)]
pub async fn dashboard(CurrentUser(user): CurrentUser) -> Json<DashboardResponse> {
    Json(DashboardResponse {
        message: format!("Welcome to your dashboard, {}!", user.name),
        user: PublicUser::from(&user),
    })
}

#[instrument(skip_all)]
pub async fn profile(CurrentUser(user): CurrentUser) -> Json<PublicUser> {
    Json(PublicUser::from(&user))
}
