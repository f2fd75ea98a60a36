pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::generation::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/interview-prep",
            post(handlers::handle_interview_prep),
        )
        .route(
            "/api/v1/interview-prep/requirements",
            post(handlers::handle_extract_requirements),
        )
        .route("/api/v1/cover-letter", post(handlers::handle_cover_letter))
        .route(
            "/api/v1/rejection-analysis",
            post(handlers::handle_rejection_analysis),
        )
        .route("/api/v1/next-actions", get(handlers::handle_next_actions))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::generation::documents::DocumentWriter;
    use crate::generation::orchestrator::{InterviewPrepOrchestrator, PipelineSettings};

    fn app() -> Router {
        let settings = PipelineSettings::default();
        let orchestrator = InterviewPrepOrchestrator::new(None, settings);
        build_router(AppState {
            orchestrator: Arc::new(orchestrator),
            documents: Arc::new(DocumentWriter::new(None, settings.llm_timeout)),
        })
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::get("/health").body(Body::empty()).unwrap();
        let (status, body) = send(request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "interview-prep-api");
    }

    #[tokio::test]
    async fn test_interview_prep_returns_full_bundle() {
        let (status, body) = send(post_json(
            "/api/v1/interview-prep",
            serde_json::json!({
                "title": "Senior React Developer",
                "company": "Acme",
                "description": "TypeScript and React on the web."
            }),
        ))
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["role"], "Senior React Developer");
        assert_eq!(body["company"], "Acme");
        for section in [
            "key_requirements",
            "technical_questions",
            "behavioral_questions",
            "tips",
            "preparation_checklist",
        ] {
            assert!(!body[section].as_array().unwrap().is_empty(), "{section} empty");
        }
        let agents = body["agents_used"].as_array().unwrap();
        assert_eq!(agents.len(), 4);
        assert_eq!(agents[0]["name"], "technical_agent");
        assert_eq!(agents[0]["status"], "fallback");
    }

    #[tokio::test]
    async fn test_empty_posting_is_unprocessable() {
        let (status, body) = send(post_json(
            "/api/v1/interview-prep",
            serde_json::json!({"title": "", "company": "Acme", "description": " "}),
        ))
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "EXTRACTION_ERROR");
    }

    #[tokio::test]
    async fn test_oversized_title_is_rejected() {
        let (status, body) = send(post_json(
            "/api/v1/interview-prep",
            serde_json::json!({"title": "x".repeat(301)}),
        ))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_requirements_preview() {
        let (status, body) = send(post_json(
            "/api/v1/interview-prep/requirements",
            serde_json::json!({"title": "Lead Data Engineer", "description": "Spark and Airflow"}),
        ))
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["seniority"], "lead");
        assert_eq!(body["specialization"], "data");
        assert!(!body["requirements"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cover_letter_from_template() {
        let (status, body) = send(post_json(
            "/api/v1/cover-letter",
            serde_json::json!({
                "posting": {
                    "title": "Backend Engineer",
                    "company": "Globex",
                    "description": "Rust services on Kubernetes."
                },
                "profile": {"name": "Sam Rivera", "skills": ["Rust"], "experience_years": 4}
            }),
        ))
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "template");
        assert_eq!(body["status"], "fallback");
        let text = body["text"].as_str().unwrap();
        assert!(text.contains("Backend Engineer position at Globex"));
        assert!(text.contains("4 years"));
        assert!(text.ends_with("Sam Rivera"));
    }

    #[tokio::test]
    async fn test_cover_letter_without_profile() {
        let (status, body) = send(post_json(
            "/api/v1/cover-letter",
            serde_json::json!({"posting": {"title": "QA Analyst"}}),
        ))
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["text"].as_str().unwrap().ends_with("The Applicant"));
    }

    #[tokio::test]
    async fn test_rejection_analysis_targets_missing_skills() {
        let (status, body) = send(post_json(
            "/api/v1/rejection-analysis",
            serde_json::json!({
                "posting": {
                    "title": "Platform Engineer",
                    "company": "Initech",
                    "description": "Kubernetes, Terraform and Python tooling."
                },
                "profile": {"skills": ["python"]},
                "notes": "No feedback given."
            }),
        ))
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "fallback");
        let focus: Vec<&str> = body["skill_focus_areas"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert!(focus.contains(&"Kubernetes"));
        assert!(!focus.iter().any(|s| s.eq_ignore_ascii_case("python")));
        assert_eq!(body["recommendations"].as_array().unwrap().len(), 4);
        assert!(body["analysis"].as_str().unwrap().contains("Platform Engineer"));
    }

    #[tokio::test]
    async fn test_document_routes_reject_empty_postings() {
        for uri in ["/api/v1/cover-letter", "/api/v1/rejection-analysis"] {
            let (status, body) = send(post_json(
                uri,
                serde_json::json!({"posting": {"title": " ", "description": ""}}),
            ))
            .await;

            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{uri}");
            assert_eq!(body["error"]["code"], "EXTRACTION_ERROR");
        }
    }

    #[tokio::test]
    async fn test_oversized_rejection_notes_are_rejected() {
        let (status, body) = send(post_json(
            "/api/v1/rejection-analysis",
            serde_json::json!({
                "posting": {"title": "Data Analyst"},
                "notes": "n".repeat(5_001)
            }),
        ))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_next_actions_buckets_applied_by_days() {
        let request = Request::get("/api/v1/next-actions?status=Applied&days_since_applied=20")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "applied");
        let actions = body["next_actions"].as_array().unwrap();
        assert_eq!(actions.len(), 3);
        assert!(actions[0].as_str().unwrap().contains("follow-up"));
    }

    #[tokio::test]
    async fn test_next_actions_requires_status() {
        let request = Request::get("/api/v1/next-actions?status=%20")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
