//! HTTP surface over [`App`]

use crate::app::App;
use crate::models::{
    ComposePromptRequest, ComposePromptResponse, GenerateCodeRequest, GenerateCodeResponse,
    UploadResponse,
};
use crate::Error;
use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::JsonRejection,
        DefaultBodyLimit, Multipart, Path, State,
    },
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;
const ALLOWED_ORIGINS: [&str; 2] = ["http://localhost:5173", "http://localhost:3000"];

type SharedApp = Arc<App>;

/// Error body returned to clients as `{"detail": ...}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    /// Map an application error. Client mistakes keep their bare message;
    /// anything else is a 500 prefixed with `context`.
    fn from_error(err: Error, context: &str) -> Self {
        match err {
            Error::UnsupportedDocument(msg)
            | Error::DocumentDecode(msg)
            | Error::InvalidRequest(msg) => Self::new(StatusCode::BAD_REQUEST, msg),
            Error::NotFound(msg) => Self::new(StatusCode::NOT_FOUND, msg),
            other => {
                error!("{}: {}", context, other);
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("{}: {}", context, other),
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

/// Build the application router.
pub fn router(app: SharedApp) -> Router {
    let origins: Vec<HeaderValue> = ALLOWED_ORIGINS
        .into_iter()
        .map(HeaderValue::from_static)
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/upload", post(upload))
        .route("/api/snippets", get(list_snippets))
        .route("/api/practices", get(list_practices))
        .route("/api/compose-prompt", post(compose_prompt))
        .route("/api/generate-code", post(generate_code))
        .route("/api/download/{project_id}", get(download))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(app: SharedApp, addr: SocketAddr) -> crate::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);
    axum::serve(listener, router(app)).await?;
    Ok(())
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({ "message": "PromptCodeGen API is running" }))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

async fn upload(
    State(app): State<SharedApp>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<UploadResponse>> {
    const CONTEXT: &str = "Error processing file";
    let mut multipart = multipart?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, e.body_text()))?;

        let document = app
            .upload_document(&filename, bytes.to_vec())
            .await
            .map_err(|e| ApiError::from_error(e, CONTEXT))?;
        return Ok(Json(UploadResponse::from(&document)));
    }

    Err(ApiError::new(StatusCode::BAD_REQUEST, "No file uploaded"))
}

async fn list_snippets(State(app): State<SharedApp>) -> Json<serde_json::Value> {
    Json(json!({ "snippets": app.snippets() }))
}

async fn list_practices(State(app): State<SharedApp>) -> ApiResult<Json<serde_json::Value>> {
    let practices = app
        .practices()
        .await
        .map_err(|e| ApiError::from_error(e, "Error loading practices"))?;
    Ok(Json(json!({ "practices": practices })))
}

async fn compose_prompt(
    State(app): State<SharedApp>,
    payload: std::result::Result<Json<ComposePromptRequest>, JsonRejection>,
) -> ApiResult<Json<ComposePromptResponse>> {
    let Json(request) = payload?;
    let prompt = app
        .compose_prompt(&request)
        .await
        .map_err(|e| ApiError::from_error(e, "Error composing prompt"))?;
    Ok(Json(ComposePromptResponse { prompt }))
}

async fn generate_code(
    State(app): State<SharedApp>,
    payload: std::result::Result<Json<GenerateCodeRequest>, JsonRejection>,
) -> ApiResult<Json<GenerateCodeResponse>> {
    let Json(request) = payload?;
    let outcome = app
        .generate_project(&request.prompt)
        .await
        .map_err(|e| ApiError::from_error(e, "Error generating code"))?;

    let download_url = outcome
        .zip_path
        .as_ref()
        .map(|_| format!("/api/download/{}", outcome.project_id));

    Ok(Json(GenerateCodeResponse {
        project_id: outcome.project_id,
        files: outcome.result.files,
        download_url,
        raw_text: outcome.result.raw_text,
        instructions: outcome.result.instructions,
    }))
}

async fn download(
    State(app): State<SharedApp>,
    Path(project_id): Path<String>,
) -> ApiResult<Response> {
    let bytes = app
        .project_archive(&project_id)
        .await
        .map_err(|e| ApiError::from_error(e, "Error reading project archive"))?;

    let disposition = format!(
        "attachment; filename=\"generated_project_{}.zip\"",
        project_id
    );
    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
