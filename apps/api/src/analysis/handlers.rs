use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info_span, Instrument};
use uuid::Uuid;

use crate::analysis::pipeline::process_upload;
use crate::analysis::store::{delete_analysis, get_analysis, list_summaries};
use crate::errors::AppError;
use crate::models::resume::{ResumeRow, ResumeSummary};
use crate::state::AppState;

const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    100
}

/// POST /api/upload
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ResumeRow>, AppError> {
    let (filename, pdf) = read_pdf_field(&mut multipart, state.config.max_upload_bytes).await?;

    let span = info_span!("upload", request_id = %Uuid::new_v4(), filename = %filename);
    let row = process_upload(&state.db, &state.analyzer, &filename, pdf)
        .instrument(span)
        .await?;

    Ok(Json(row))
}

/// GET /api/resumes
pub async fn handle_list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<ResumeSummary>>, AppError> {
    if params.skip < 0 || params.limit < 0 {
        return Err(AppError::Validation(
            "skip and limit must be non-negative".to_string(),
        ));
    }
    let summaries = list_summaries(&state.db, params.skip, params.limit).await?;
    Ok(Json(summaries))
}

/// GET /api/resumes/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ResumeRow>, AppError> {
    let row = get_analysis(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Resume not found".to_string()))?;
    Ok(Json(row))
}

/// DELETE /api/resumes/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let filename = delete_analysis(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Resume not found".to_string()))?;
    Ok(Json(json!({
        "ok": true,
        "message": format!("Resume '{filename}' deleted successfully.")
    })))
}

/// Pulls the `file` field out of the form, checking name and size before the
/// pipeline sees it.
async fn read_pdf_field(
    multipart: &mut Multipart,
    max_bytes: usize,
) -> Result<(String, Bytes), AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        if !filename.to_lowercase().ends_with(".pdf") {
            return Err(AppError::Validation(
                "Invalid file type. Only PDF files are allowed.".to_string(),
            ));
        }

        let data = field.bytes().await.map_err(multipart_error)?;
        if data.len() > max_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "File exceeds the {max_bytes} byte upload limit"
            )));
        }
        return Ok((filename, data));
    }

    Err(AppError::Validation(format!(
        "Missing multipart field '{UPLOAD_FIELD}'"
    )))
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::Validation(err.body_text())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use axum::Router;
    use tower::ServiceExt;

    use super::*;
    use crate::analysis::pipeline::ResumeAnalyzer;
    use crate::analysis::testing::{build_pdf, ScriptedGenerator};
    use crate::config::Config;
    use crate::db::test_pool;
    use crate::llm_client::retry::RetryPolicy;
    use crate::llm_client::LlmError;
    use crate::routes::build_router;

    const BOUNDARY: &str = "resume-test-boundary";

    const EXTRACTED: &str = r#"{"name": "Alice Smith", "email": "alice@x.com", "phone": "555-0100", "core_skills": ["Python", "AWS"]}"#;

    const ANALYSIS: &str = r#"{
        "resume_rating": 7,
        "improvement_areas": "Quantify impact.",
        "upskill_suggestions": [
            {"skill": "Docker", "rationale": "Containers"},
            {"skill": "Terraform", "rationale": "Infrastructure as code"},
            {"skill": "SQL", "rationale": "Data access"}
        ]
    }"#;

    async fn app(
        script: Vec<Result<String, LlmError>>,
        max_upload_bytes: usize,
    ) -> (Router, Arc<ScriptedGenerator>) {
        let llm = Arc::new(ScriptedGenerator::new(script));
        let mut config = Config::from_source(|key| {
            (key == "ANTHROPIC_API_KEY").then(|| "sk-test".to_string())
        })
        .unwrap();
        config.max_upload_bytes = max_upload_bytes;

        let state = AppState {
            db: test_pool().await,
            analyzer: Arc::new(ResumeAnalyzer::new(
                llm.clone(),
                RetryPolicy::default(),
                config.max_resume_chars,
            )),
            config,
        };
        (build_router(state), llm)
    }

    fn multipart_request(field: &str, filename: &str, content: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/pdf\r\n\r\n");
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn test_upload_list_get_delete() {
        let (app, llm) = app(
            vec![ScriptedGenerator::ok(EXTRACTED), ScriptedGenerator::ok(ANALYSIS)],
            5 * 1024 * 1024,
        )
        .await;
        let pdf = build_pdf(&["Alice Smith, alice@x.com, Python, AWS"]);

        let (status, body) = send(&app, multipart_request("file", "Alice.PDF", &pdf)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["filename"], "Alice.PDF");
        assert_eq!(body["name"], "Alice Smith");
        assert_eq!(body["phone"], "555-0100");
        assert_eq!(body["llm_analysis"]["resume_rating"], 7);
        assert_eq!(llm.call_count(), 2);
        let id = body["id"].as_i64().unwrap();

        let (status, body) = send(&app, request("GET", "/api/resumes")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["email"], "alice@x.com");
        assert!(body[0].get("extracted_data").is_none());

        let (status, body) = send(&app, request("GET", &format!("/api/resumes/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["extracted_data"]["core_skills"][1], "AWS");

        let (status, body) = send(&app, request("DELETE", &format!("/api/resumes/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert_eq!(body["message"], "Resume 'Alice.PDF' deleted successfully.");

        let (status, body) = send(&app, request("GET", &format!("/api/resumes/{id}"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");

        let (status, _) = send(&app, request("DELETE", &format!("/api/resumes/{id}"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_non_pdf_filename_is_rejected_without_llm_calls() {
        let (app, llm) = app(vec![], 5 * 1024 * 1024).await;

        let (status, body) = send(&app, multipart_request("file", "resume.docx", b"hello")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_oversized_upload_is_413() {
        let (app, llm) = app(vec![], 64).await;

        let (status, body) = send(&app, multipart_request("file", "big.pdf", &[b'x'; 100])).await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["error"]["code"], "PAYLOAD_TOO_LARGE");
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_file_field_is_400() {
        let (app, _) = app(vec![], 5 * 1024 * 1024).await;

        let (status, body) = send(&app, multipart_request("document", "a.pdf", b"%PDF")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("'file'"));
    }

    #[tokio::test]
    async fn test_blank_pdf_upload_is_400() {
        let (app, llm) = app(vec![], 5 * 1024 * 1024).await;
        let pdf = build_pdf(&[""]);

        let (status, body) = send(&app, multipart_request("file", "scan.pdf", &pdf)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"]["message"],
            "Could not extract text from PDF. The file might be empty or image-based."
        );
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_permanent_llm_failure_is_500_and_persists_nothing() {
        let (app, _) = app(
            vec![ScriptedGenerator::ok(EXTRACTED), ScriptedGenerator::permanent(401)],
            5 * 1024 * 1024,
        )
        .await;
        let pdf = build_pdf(&["Alice Smith"]);

        let (status, body) = send(&app, multipart_request("file", "a.pdf", &pdf)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "LLM_ERROR");

        let (_, body) = send(&app, request("GET", "/api/resumes")).await;
        assert!(body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_negative_pagination_is_rejected() {
        let (app, _) = app(vec![], 5 * 1024 * 1024).await;

        let (status, _) = send(&app, request("GET", "/api/resumes?skip=-1")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(&app, request("GET", "/api/resumes?skip=0&limit=5")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_root_and_health() {
        let (app, _) = app(vec![], 5 * 1024 * 1024).await;

        let (status, body) = send(&app, request("GET", "/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Welcome to the Smart Resume Analyzer API!");

        let (status, body) = send(&app, request("GET", "/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "resume-api");
    }
}
