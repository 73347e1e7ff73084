use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::dto::{Card, RegisterCardRequest, SkillList};
use super::services::{fetch_card, register_card};
use crate::{errors::AppError, state::AppState};

pub fn card_routes() -> Router<AppState> {
    Router::new()
        .route("/skills", get(list_skills))
        .route("/cards", post(register))
        .route("/cards/:id", get(get_card))
}

#[instrument(skip(state))]
pub async fn list_skills(State(state): State<AppState>) -> Result<Json<SkillList>, AppError> {
    let skills = state.store.list_skills().await?;
    Ok(Json(SkillList { skills }))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterCardRequest>,
) -> Result<impl IntoResponse, AppError> {
    let card = register_card(state.store.as_ref(), payload).await?;
    let location = format!("/cards/{}", card.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(card)))
}

#[instrument(skip(state))]
pub async fn get_card(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Card>, AppError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(AppError::Validation("id is required".into()));
    }
    fetch_card(state.store.as_ref(), id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("card {id} does not exist")))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{body::Body, http::Request, Router};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::app::build_app;
    use crate::state::AppState;
    use crate::store::memory::MemoryStore;

    fn app() -> (Router, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new().with_skills(&["Rust", "Go"]));
        (build_app(AppState::fake(store.clone())), store)
    }

    async fn send(app: Router, req: Request<Body>) -> (axum::http::StatusCode, axum::http::HeaderMap, Value) {
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let headers = res.headers().clone();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, headers, body)
    }

    fn post_card(body: Value) -> Request<Body> {
        Request::post("/api/v1/cards")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn lists_skills() {
        let (app, _) = app();
        let req = Request::get("/api/v1/skills").body(Body::empty()).unwrap();

        let (status, _, body) = send(app, req).await;

        assert_eq!(status, 200);
        assert_eq!(body["skills"][1], json!({"id": 2, "name": "Go"}));
    }

    #[tokio::test]
    async fn register_then_fetch() {
        let (app, _) = app();
        let (status, headers, body) = send(
            app.clone(),
            post_card(json!({"id": "yuki", "name": "Yuki", "x_id": "weblogv2", "skill_ids": [1]})),
        )
        .await;
        assert_eq!(status, 201);
        assert_eq!(headers["location"], "/cards/yuki");
        assert_eq!(body["x_url"], "https://x.com/weblogv2");

        let req = Request::get("/api/v1/cards/yuki").body(Body::empty()).unwrap();
        let (status, _, body) = send(app, req).await;
        assert_eq!(status, 200);
        assert_eq!(body["name"], "Yuki");
        assert_eq!(body["skills"], json!([{"id": 1, "name": "Rust"}]));
    }

    #[tokio::test]
    async fn duplicate_registration_is_409() {
        let (app, store) = app();
        store.seed_user("yuki", time::OffsetDateTime::now_utc(), &[]);

        let (status, _, body) =
            send(app, post_card(json!({"id": "yuki", "name": "Yuki", "skill_ids": [1]}))).await;

        assert_eq!(status, 409);
        assert_eq!(body["error"]["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn invalid_id_is_400() {
        let (app, store) = app();

        let (status, _, body) =
            send(app, post_card(json!({"id": "yu_ki", "name": "Yuki", "skill_ids": [1]}))).await;

        assert_eq!(status, 400);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn unknown_card_is_404() {
        let (app, _) = app();
        let req = Request::get("/api/v1/cards/nobody").body(Body::empty()).unwrap();

        let (status, _, body) = send(app, req).await;

        assert_eq!(status, 404);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn store_failure_is_500_without_details() {
        let (app, store) = app();
        store.fail_on(crate::store::memory::StoreOp::FindUser);
        let req = Request::get("/api/v1/cards/yuki").body(Body::empty()).unwrap();

        let (status, _, body) = send(app, req).await;

        assert_eq!(status, 500);
        assert_eq!(body["error"]["message"], "A storage error occurred");
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (app, _) = app();
        let req = Request::get("/api/v1/health").body(Body::empty()).unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), 200);
    }
}
