pub mod health;

use axum::{
    routing::{get, patch, post, put},
    Router,
};

use crate::export::handlers as export;
use crate::persistence::handlers as persistence;
use crate::state::AppState;
use crate::store::handlers as store;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Session aggregate
        .route("/api/v1/cv", get(store::handle_get_cv))
        .route("/api/v1/cv/completeness", get(store::handle_completeness))
        .route("/api/v1/cv/templates", get(store::handle_list_templates))
        .route("/api/v1/cv/personal", patch(store::handle_update_personal))
        .route(
            "/api/v1/cv/customization",
            patch(store::handle_update_customization),
        )
        .route(
            "/api/v1/cv/customization/template",
            put(store::handle_set_template),
        )
        .route(
            "/api/v1/cv/customization/colors",
            put(store::handle_set_colors),
        )
        // Collections
        .route("/api/v1/cv/experience", post(store::handle_add_experience))
        .route(
            "/api/v1/cv/experience/reorder",
            post(store::handle_reorder_experience),
        )
        .route(
            "/api/v1/cv/experience/:id",
            patch(store::handle_update_experience).delete(store::handle_delete_experience),
        )
        .route("/api/v1/cv/education", post(store::handle_add_education))
        .route(
            "/api/v1/cv/education/reorder",
            post(store::handle_reorder_education),
        )
        .route(
            "/api/v1/cv/education/:id",
            patch(store::handle_update_education).delete(store::handle_delete_education),
        )
        .route("/api/v1/cv/skills", post(store::handle_add_skill))
        .route(
            "/api/v1/cv/skills/:id",
            patch(store::handle_update_skill).delete(store::handle_delete_skill),
        )
        .route("/api/v1/cv/languages", post(store::handle_add_language))
        .route(
            "/api/v1/cv/languages/:id",
            patch(store::handle_update_language).delete(store::handle_delete_language),
        )
        // Persistence
        .route("/api/v1/cv/save", post(persistence::handle_save))
        .route("/api/v1/cv/load", post(persistence::handle_load))
        .route(
            "/api/v1/cv/restore-autosave",
            post(persistence::handle_restore_autosave),
        )
        .route("/api/v1/cv/reset", post(persistence::handle_reset))
        // Export
        .route("/api/v1/cv/export/:format", get(export::handle_export))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tokio::sync::RwLock;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::autosave::AutoSaver;
    use crate::config::Config;
    use crate::export::Exporters;
    use crate::persistence::memory::MemoryStore;
    use crate::persistence::CvPersistence;
    use crate::store::CvStore;

    fn test_state() -> AppState {
        let config = Config::from_lookup(|key| match key {
            "STORE_BACKEND" => Some("memory".to_string()),
            _ => None,
        })
        .unwrap();
        let persistence = Arc::new(CvPersistence::new(
            Arc::new(MemoryStore::new(8 * 1024 * 1024)),
            config.store_key_prefix.clone(),
        ));
        let (autosave, _task) = AutoSaver::spawn(persistence.clone(), Duration::from_millis(10));
        AppState {
            store: Arc::new(RwLock::new(CvStore::new())),
            persistence,
            autosave,
            exporters: Exporters::standard(),
            config,
        }
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        let request = match body {
            Some(body) => request.body(Body::from(body.to_string())).unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    fn experience_body() -> Value {
        json!({
            "position": "Engineer",
            "company": "Acme",
            "startDate": "2020-01",
            "endDate": "current",
            "current": true
        })
    }

    #[tokio::test]
    async fn test_health() {
        let app = build_router(test_state());
        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["storage"], "memory");
    }

    #[tokio::test]
    async fn test_add_and_update_experience() {
        let app = build_router(test_state());
        let (status, body) =
            send(&app, "POST", "/api/v1/cv/experience", Some(experience_body())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["dirty"], true);
        assert_eq!(body["cv"]["experience"][0]["endDate"], "current");
        let id = body["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            "PATCH",
            &format!("/api/v1/cv/experience/{id}"),
            Some(json!({ "description": "Shipped things" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cv"]["experience"][0]["description"], "Shipped things");
        assert_eq!(body["cv"]["experience"][0]["position"], "Engineer");
    }

    #[tokio::test]
    async fn test_stale_update_is_404_and_stale_delete_is_204() {
        let app = build_router(test_state());
        let missing = Uuid::new_v4();
        let (status, body) = send(
            &app,
            "PATCH",
            &format!("/api/v1/cv/skills/{missing}"),
            Some(json!({ "name": "Go" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");

        let (status, _) = send(&app, "DELETE", &format!("/api/v1/cv/skills/{missing}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_invalid_patch_is_rejected() {
        let app = build_router(test_state());
        let (status, body) = send(
            &app,
            "PATCH",
            "/api/v1/cv/personal",
            Some(json!({ "email": "not-an-email" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let (status, _) = send(
            &app,
            "PATCH",
            "/api/v1/cv/personal",
            Some(json!({ "nickname": "Ada" })),
        )
        .await;
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn test_save_clears_dirty_and_load_round_trips() {
        let app = build_router(test_state());
        send(
            &app,
            "PATCH",
            "/api/v1/cv/personal",
            Some(json!({ "fullName": "Ada Lovelace" })),
        )
        .await;

        let (status, body) = send(&app, "POST", "/api/v1/cv/save", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "saved");
        assert_eq!(body["slot"], "primary");
        assert_eq!(body["notice"]["level"], "info");
        assert_eq!(body["dirty"], false);

        let (status, body) = send(&app, "POST", "/api/v1/cv/load", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cv"]["personal"]["fullName"], "Ada Lovelace");
        assert_eq!(body["dirty"], false);
    }

    #[tokio::test]
    async fn test_reset_clears_session_and_slots() {
        let app = build_router(test_state());
        send(&app, "POST", "/api/v1/cv/experience", Some(experience_body())).await;
        send(&app, "POST", "/api/v1/cv/save", None).await;

        let (status, body) = send(&app, "POST", "/api/v1/cv/reset", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cv"]["experience"], json!([]));
        assert_eq!(body["dirty"], false);

        let (status, _) = send(&app, "POST", "/api/v1/cv/load", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, "POST", "/api/v1/cv/restore-autosave", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_reorder_and_completeness() {
        let app = build_router(test_state());
        for degree in ["BSc", "MSc"] {
            send(
                &app,
                "POST",
                "/api/v1/cv/education",
                Some(json!({
                    "degree": degree,
                    "school": "MIT",
                    "startDate": "2015-09"
                })),
            )
            .await;
        }
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/cv/education/reorder",
            Some(json!({ "from": 1, "to": 0 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cv"]["education"][0]["degree"], "MSc");

        let (status, body) = send(&app, "GET", "/api/v1/cv/completeness", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["overallScore"].as_f64().unwrap() > 0.0);
    }

    #[tokio::test]
    async fn test_customization_routes() {
        let app = build_router(test_state());
        let (_, templates) = send(&app, "GET", "/api/v1/cv/templates", None).await;
        assert_eq!(templates.as_array().unwrap().len(), 9);

        let (status, body) = send(
            &app,
            "PUT",
            "/api/v1/cv/customization/template",
            Some(json!({ "template": "executive" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cv"]["customization"]["template"], "executive");

        let (status, body) = send(
            &app,
            "PUT",
            "/api/v1/cv/customization/colors",
            Some(json!({ "primaryColor": "#FF0000", "secondaryColor": "#333" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cv"]["customization"]["primaryColor"], "#ff0000");

        let (status, _) = send(
            &app,
            "PUT",
            "/api/v1/cv/customization/colors",
            Some(json!({ "primaryColor": "red", "secondaryColor": "#333" })),
        )
        .await;
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn test_export_endpoints() {
        let app = build_router(test_state());
        for (format, magic, content_type) in [
            ("pdf", &b"%PDF"[..], "application/pdf"),
            (
                "docx",
                &b"PK"[..],
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            ),
        ] {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .uri(format!("/api/v1/cv/export/{format}"))
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(response.headers()["content-type"], content_type);
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            assert!(bytes.starts_with(magic));
        }

        let (status, body) = send(&app, "GET", "/api/v1/cv/export/odt", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "UNSUPPORTED_FORMAT");
    }
}
