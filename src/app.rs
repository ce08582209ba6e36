use std::net::SocketAddr;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth;
use crate::state::AppState;

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "API is running" }))
        .nest(
            "/api",
            Router::new()
                .merge(auth::router())
                .route("/health", get(|| async { "ok" })),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, host: &str, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{host}:{port}").parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use time::{Duration, OffsetDateTime};
    use tower::ServiceExt;

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec())
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_with_token(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut req = Request::get(uri);
        if let Some(t) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        req.body(Body::empty()).unwrap()
    }

    fn json_of(bytes: &[u8]) -> Value {
        serde_json::from_slice(bytes).unwrap()
    }

    fn jane() -> Value {
        json!({ "name": "Jane Smith", "email": "jane@example.com", "password": "password123" })
    }

    async fn register_and_login(app: &Router) -> (Value, String) {
        let (status, body) = send(app, post_json("/api/auth/register", jane())).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, body2) = send(
            app,
            post_json(
                "/api/auth/login",
                json!({ "email": "jane@example.com", "password": "password123" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let token = json_of(&body2)["token"].as_str().unwrap().to_string();
        (json_of(&body), token)
    }

    #[tokio::test]
    async fn root_and_health_respond() {
        let app = build_app(AppState::fake());
        let (status, body) = send(&app, Request::get("/").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"API is running");
        let health = Request::get("/api/health").body(Body::empty()).unwrap();
        let (status, _) = send(&app, health).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn register_then_duplicate_conflicts() {
        let app = build_app(AppState::fake());

        let (status, body) = send(&app, post_json("/api/auth/register", jane())).await;
        assert_eq!(status, StatusCode::CREATED);
        let created = json_of(&body);
        assert_eq!(created["role"], "user");
        assert_eq!(created["email"], "jane@example.com");
        assert_eq!(created["name"], "Jane Smith");
        assert!(created["id"].is_string());
        assert!(created.get("token").is_none());
        assert!(created.get("passwordHash").is_none());

        let (status, body) = send(&app, post_json("/api/auth/register", jane())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json_of(&body)["message"], "Email already registered");
    }

    #[tokio::test]
    async fn register_reports_all_invalid_fields() {
        let app = build_app(AppState::fake());
        let (status, body) = send(
            &app,
            post_json("/api/auth/register", json!({ "name": "J", "email": "nope" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let fields: Vec<String> = json_of(&body)["errors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["field"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(fields, vec!["name", "email", "password"]);
    }

    #[tokio::test]
    async fn malformed_body_is_a_validation_error() {
        let app = build_app(AppState::fake());
        let req = Request::post("/api/auth/register")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json_of(&body)["errors"][0]["field"], "body");

        let (status, _) = send(
            &app,
            post_json("/api/auth/login", json!({ "email": 42, "password": true })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let app = build_app(AppState::fake());
        send(&app, post_json("/api/auth/register", jane())).await;

        let (s1, unknown) = send(
            &app,
            post_json(
                "/api/auth/login",
                json!({ "email": "nobody@example.com", "password": "password123" }),
            ),
        )
        .await;
        let (s2, wrong) = send(
            &app,
            post_json(
                "/api/auth/login",
                json!({ "email": "jane@example.com", "password": "wrong" }),
            ),
        )
        .await;

        assert_eq!(s1, StatusCode::UNAUTHORIZED);
        assert_eq!(s2, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown, wrong);
        assert_eq!(json_of(&wrong)["message"], "Invalid credentials");
    }

    #[tokio::test]
    async fn login_returns_token_and_public_user() {
        let app = build_app(AppState::fake());
        send(&app, post_json("/api/auth/register", jane())).await;

        let (status, body) = send(
            &app,
            post_json(
                "/api/auth/login",
                json!({ "email": "jane@example.com", "password": "password123" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let json = json_of(&body);
        assert!(!json["token"].as_str().unwrap().is_empty());
        assert_eq!(json["user"]["email"], "jane@example.com");
        assert_eq!(json["user"]["role"], "user");
        assert!(json["user"]["createdAt"].is_string());
        assert!(json["user"].get("passwordHash").is_none());
    }

    #[tokio::test]
    async fn profile_requires_a_valid_token() {
        let state = AppState::fake();
        let app = build_app(state.clone());
        let (registered, token) = register_and_login(&app).await;

        let (status, _) = send(&app, get_with_token("/api/auth/profile", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let user_id = registered["id"].as_str().unwrap().parse().unwrap();
        let expired = state
            .keys
            .mint_at(user_id, OffsetDateTime::now_utc() - Duration::hours(1))
            .unwrap();
        let (status, body) = send(&app, get_with_token("/api/auth/profile", Some(&expired))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json_of(&body)["message"], "Unauthenticated");

        let (status, _) =
            send(&app, get_with_token("/api/auth/profile", Some("forged.token.value"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = send(&app, get_with_token("/api/auth/profile", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        let profile = json_of(&body);
        assert_eq!(profile["id"], registered["id"]);
        assert_eq!(profile["email"], "jane@example.com");
        assert_eq!(profile["name"], "Jane Smith");
        assert_eq!(profile["role"], "user");
        assert!(profile["createdAt"].is_string());
    }

    #[tokio::test]
    async fn dashboard_greets_the_token_holder() {
        let app = build_app(AppState::fake());
        let (registered, token) = register_and_login(&app).await;

        let (status, body) = send(&app, get_with_token("/api/auth/dashboard", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        let json = json_of(&body);
        assert!(json["message"].as_str().unwrap().contains("Jane Smith"));
        assert_eq!(json["user"]["id"], registered["id"]);

        let (status, _) = send(&app, get_with_token("/api/auth/dashboard", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn token_for_deleted_user_is_rejected() {
        let state = AppState::fake();
        let app = build_app(state.clone());
        let (_, token) = register_and_login(&app).await;

        state.users.delete_all().await.unwrap();

        let (status, _) = send(&app, get_with_token("/api/auth/profile", Some(&token))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
