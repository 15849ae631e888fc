use axum::Router;
use axum::middleware as axum_mw;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;

use crate::middleware;
use crate::routes;
use crate::state::AppState;

pub fn build(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/protocols", get(routes::protocols::list_protocols))
        .route("/protocols/{id}", get(routes::protocols::get_protocol))
        .route(
            "/protocols/{id}/calculate",
            post(routes::calculate::calculate),
        )
        .route(
            "/protocols/{id}/export",
            post(routes::export::export_result),
        )
        .layer(axum_mw::from_fn(middleware::audit::audit_log))
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use pedi_protocols::Registry;

    use super::*;

    fn app() -> Router {
        build(
            AppState::new(Registry::builtin().unwrap()),
            CorsLayer::permissive(),
        )
    }

    async fn send(request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    async fn get_json(uri: &str) -> (StatusCode, Value) {
        let request = Request::get(uri).body(Body::empty()).unwrap();
        let (status, body) = send(request).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn post_json(uri: &str, body: Value) -> (StatusCode, Vec<u8>) {
        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(request).await
    }

    #[tokio::test]
    async fn health_reports_catalog_size() {
        let (status, body) = get_json("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["protocols"], 20);
    }

    #[tokio::test]
    async fn lists_protocols_in_catalog_order() {
        let (status, body) = get_json("/protocols").await;
        assert_eq!(status, StatusCode::OK);
        let list = body.as_array().unwrap();
        assert_eq!(list.len(), 20);
        assert_eq!(list[0]["id"], "anafilaxia");
        assert_eq!(list[1]["name"], "Crise de asma");
    }

    #[tokio::test]
    async fn protocol_definition_is_inspectable() {
        let (status, body) = get_json("/protocols/asma").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], "asma");
        assert!(body["fields"].as_array().is_some_and(|f| !f.is_empty()));

        let (status, _) = get_json("/protocols/varicela").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn calculate_returns_the_result() {
        let (status, body) = post_json(
            "/protocols/pneumonia/calculate",
            json!({ "weight": 5, "age": 4, "ageUnit": "meses" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["ok"], true);
        assert_eq!(body["result"]["classification"]["level"]["id"], "pneumonia");
    }

    #[tokio::test]
    async fn invalid_parameters_are_unprocessable() {
        let (status, body) = post_json(
            "/protocols/asma/calculate",
            json!({ "weight": 0, "age": 8, "wheezing": "ausente" }),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["ok"], false);
        assert_eq!(body["errors"][0]["field"], "weight");
    }

    #[tokio::test]
    async fn unknown_protocol_is_not_found() {
        let (status, _) = post_json("/protocols/varicela/calculate", json!({})).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn export_defaults_to_text() {
        let (status, body) = post_json(
            "/protocols/anafilaxia/export",
            json!({
                "parameters": {
                    "weight": 20, "age": 6, "allergenExposure": true,
                    "urticaria": true, "dyspnea": true
                }
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let text = String::from_utf8(body).unwrap();
        assert!(text.starts_with("# Anafilaxia"));
        assert!(text.contains("Adrenalina IM: 0.2 mg"));
    }

    #[tokio::test]
    async fn export_docx() {
        let (status, body) = post_json(
            "/protocols/pneumonia/export",
            json!({ "parameters": { "weight": 12, "age": 3 }, "format": "docx" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&body[..2], b"PK");
    }

    #[tokio::test]
    async fn export_passes_validation_errors_through() {
        let (status, body) = post_json(
            "/protocols/pneumonia/export",
            json!({ "parameters": { "age": 3 } }),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["errors"][0]["code"], "missing");
    }
}
