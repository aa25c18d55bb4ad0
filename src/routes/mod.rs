use axum::Router;

use crate::state::SharedState;

/// Token-protected player administration.
pub mod admin;
/// Swagger UI and the OpenAPI document.
pub mod docs;
/// Liveness and storage status.
pub mod health;
/// Leaderboard and course views.
pub mod leaderboard;
/// Player login, listing and score submission.
pub mod players;
/// Public event stream.
pub mod sse;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    health::router()
        .merge(sse::router())
        .merge(leaderboard::router())
        .merge(players::router())
        .merge(admin::router(state.clone()))
        .merge(docs::router())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
        response::Response,
    };
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::score_store::memory::MemoryScoreStore,
        state::AppState,
    };

    const TOKEN: &str = "s3cret";

    async fn test_app() -> Router {
        let mut config = AppConfig::builtin().unwrap();
        config.admin_token = Some(TOKEN.into());
        let state = AppState::new(config);
        state
            .set_score_store(Arc::new(MemoryScoreStore::new()))
            .await;
        router(state)
    }

    fn request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-admin-token", TOKEN);
        match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(res: Response) -> Value {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn admin_routes_require_the_token() {
        let app = test_app().await;
        let res = app
            .oneshot(
                Request::builder()
                    .uri("/admin/players")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn register_login_score_and_rank() {
        let app = test_app().await;

        let res = app
            .clone()
            .oneshot(request(
                Method::POST,
                "/admin/players",
                Some(json!({"name": "Alice", "phone": "555-000-0001", "team": "Hawks"})),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);

        let res = app
            .clone()
            .oneshot(request(
                Method::POST,
                "/session",
                Some(json!({"phone": "5550000001"})),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json_body(res).await["player"]["id"], "+15550000001");

        let res = app
            .clone()
            .oneshot(request(
                Method::PUT,
                "/players/5550000001/scores/as",
                Some(json!({"strokes": 4})),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json_body(res).await["card"]["stops"][0]["result"], "Bogey");

        let res = app
            .clone()
            .oneshot(request(Method::GET, "/leaderboard", None))
            .await
            .unwrap();
        let board = json_body(res).await;
        assert_eq!(board["players"][0]["rank_label"], "1");
        assert_eq!(board["players"][0]["cells"][0], "4");
        assert_eq!(board["players"][0]["cells"][1], "-");
        assert_eq!(board["teams"][0]["team"], "Hawks");
        assert_eq!(board["teams"][0]["cells"][0], "");
    }

    #[tokio::test]
    async fn invalid_registration_is_rejected() {
        let app = test_app().await;
        let res = app
            .oneshot(request(
                Method::POST,
                "/admin/players",
                Some(json!({"name": "Bob", "phone": "123"})),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn course_lists_stops_in_order() {
        let app = test_app().await;
        let res = app
            .oneshot(request(Method::GET, "/course", None))
            .await
            .unwrap();
        let course = json_body(res).await;
        assert_eq!(course["stops"][0]["id"], "as");
        assert_eq!(course["stops"].as_array().unwrap().len(), 9);
    }
}
