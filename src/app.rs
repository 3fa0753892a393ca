//! Application orchestration: document intake, prompt composition,
//! generation and packaging.

use crate::ai::{GeminiGenerateClient, GenerativeService};
use crate::documents;
use crate::models::{
    ComposePromptRequest, Config, Document, GeneratedProject, GenerationResult, ModelResponse,
    Practice, Snippet,
};
use crate::package::ProjectPackager;
use crate::practices;
use crate::prompts::{self, PromptParts};
use crate::response;
use crate::snippets;
use crate::store::ProjectStore;
use crate::{Error, Result};
use chrono::Utc;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task;
use tokio_retry::{strategy::FixedInterval, Retry};
use tracing::{error, info, warn};
use uuid::Uuid;

const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Result of one generation request.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub project_id: String,
    pub result: GenerationResult,
    /// Archive location, when there was anything to package.
    pub zip_path: Option<PathBuf>,
}

/// Owns every collaborator a request needs.
pub struct App {
    generator: Box<dyn GenerativeService>,
    store: ProjectStore,
    packager: ProjectPackager,
    practices_dir: PathBuf,
    generation_retries: usize,
    retry_interval: Duration,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub generator: Box<dyn GenerativeService>,
    pub store: ProjectStore,
    pub packager: ProjectPackager,
    pub practices_dir: PathBuf,
}

impl App {
    /// Build an app from concrete service dependencies.
    pub fn with_services(services: AppServices) -> Self {
        Self {
            generator: services.generator,
            store: services.store,
            packager: services.packager,
            practices_dir: services.practices_dir,
            generation_retries: 0,
            retry_interval: DEFAULT_RETRY_INTERVAL,
        }
    }

    /// Extra backend attempts after a failure, and the pause between them.
    pub fn with_retry_policy(mut self, retries: usize, interval: Duration) -> Self {
        self.generation_retries = retries;
        self.retry_interval = interval;
        self
    }

    /// Construct an app from configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let store = ProjectStore::open(&config.database_path())?;

        let generator = GeminiGenerateClient::new(
            config.gemini_api_key.clone(),
            config.gemini_model.clone(),
        );
        info!("Generation provider: Gemini (model: {})", generator.model());

        let packager = ProjectPackager::new(&config.output_dir);
        info!("Project archives go to {}", packager.output_dir().display());

        Ok(Self::with_services(AppServices {
            generator: Box::new(generator),
            store,
            packager,
            practices_dir: config.practices_dir.clone(),
        })
        .with_retry_policy(config.generation_retries, DEFAULT_RETRY_INTERVAL))
    }

    /// Extract text from an uploaded file and persist it as a document.
    pub async fn upload_document(&self, filename: &str, bytes: Vec<u8>) -> Result<Document> {
        let store = self.store.clone();
        let filename = filename.to_string();

        task::spawn_blocking(move || -> Result<Document> {
            let (content, file_type) = documents::parse_document(&bytes, &filename)?;
            let document = Document {
                document_id: Uuid::new_v4().to_string(),
                filename,
                content,
                file_type,
                created_at: Utc::now().to_rfc3339(),
            };
            store.insert_document(&document)?;
            info!(
                "Stored document {} ({}, {} bytes)",
                document.document_id,
                document.file_type.as_str(),
                bytes.len()
            );
            Ok(document)
        })
        .await?
    }

    pub fn snippets(&self) -> &'static [Snippet] {
        snippets::SNIPPETS
    }

    pub async fn practices(&self) -> Result<Vec<Practice>> {
        let dir = self.practices_dir.clone();
        task::spawn_blocking(move || practices::load_practices(&dir)).await?
    }

    /// Compose the generation prompt for a stored document. Unknown snippet
    /// and practice ids are ignored.
    pub async fn compose_prompt(&self, request: &ComposePromptRequest) -> Result<String> {
        let store = self.store.clone();
        let document_id = request.document_id.clone();
        let document = task::spawn_blocking(move || store.get_document(&document_id))
            .await??
            .ok_or_else(|| Error::NotFound("Document not found".to_string()))?;

        let practices = if request.practice_ids.is_empty() {
            Vec::new()
        } else {
            self.practices().await?
        };

        let parts = PromptParts {
            document: &document.content,
            snippets: request
                .snippet_ids
                .iter()
                .filter_map(|id| snippets::find(id))
                .collect(),
            practices: request
                .practice_ids
                .iter()
                .filter_map(|id| practices.iter().find(|p| &p.id == id))
                .collect(),
            extra_instructions: request.extra_instructions.as_deref(),
        };

        Ok(prompts::compose(&parts))
    }

    /// Send `prompt` to the backend, interpret the response, package and
    /// persist the outcome.
    ///
    /// Backend failures are returned as errors. Anything the backend sends
    /// back, however malformed, yields an outcome.
    pub async fn generate_project(&self, prompt: &str) -> Result<GenerationOutcome> {
        if prompt.trim().is_empty() {
            return Err(Error::InvalidRequest("Prompt must not be empty".to_string()));
        }

        let response = self.call_backend(prompt).await?;
        let result = response::assemble(&response);
        if let Some(reason) = &result.error {
            warn!("Model response degraded: {}", reason);
        }

        let project_id = Uuid::new_v4().to_string();

        let zip_path = if result.is_empty() {
            info!("[{}] Nothing to package", project_id);
            None
        } else {
            let packager = self.packager.clone();
            let files = result.files.clone();
            let id = project_id.clone();
            Some(task::spawn_blocking(move || packager.package(&id, &files)).await??)
        };

        let project = GeneratedProject {
            project_id: project_id.clone(),
            prompt: prompt.to_string(),
            files: result.files.clone(),
            zip_path: zip_path.clone(),
            created_at: Utc::now().to_rfc3339(),
        };
        let store = self.store.clone();
        task::spawn_blocking(move || store.insert_project(&project)).await??;

        info!(
            "[{}] Generation stored with {} files",
            project_id,
            result.files.len()
        );

        Ok(GenerationOutcome {
            project_id,
            result,
            zip_path,
        })
    }

    /// Bytes of a project's archive.
    pub async fn project_archive(&self, project_id: &str) -> Result<Vec<u8>> {
        let store = self.store.clone();
        let id = project_id.to_string();
        let project = task::spawn_blocking(move || store.get_project(&id))
            .await??
            .ok_or_else(|| Error::NotFound("Project not found".to_string()))?;

        let missing = || Error::NotFound("Project file not found".to_string());
        let path = project.zip_path.ok_or_else(missing)?;

        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Archive for project {} is missing at {}", project_id, path.display());
                Err(missing())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn call_backend(&self, prompt: &str) -> Result<ModelResponse> {
        let retry_strategy = FixedInterval::new(self.retry_interval).take(self.generation_retries);

        Retry::spawn(retry_strategy, move || async move {
            self.generator.generate(prompt).await.map_err(|e| {
                warn!("Generation attempt failed: {}", e);
                e
            })
        })
        .await
        .map_err(|e| {
            error!("Generation failed after retries: {}", e);
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{App, AppServices};
    use crate::ai::MockGenerativeClient;
    use crate::models::{ComposePromptRequest, FileRecord};
    use crate::package::ProjectPackager;
    use crate::response::DECODE_FAILURE;
    use crate::store::ProjectStore;
    use crate::Error;
    use std::path::{Path, PathBuf};
    use std::time::Duration;
    use tempfile::tempdir;

    fn build_test_app(dir: &Path, generator: MockGenerativeClient) -> App {
        App::with_services(AppServices {
            generator: Box::new(generator),
            store: ProjectStore::in_memory().unwrap(),
            packager: ProjectPackager::new(dir.join("projects")),
            practices_dir: PathBuf::from("data/practices"),
        })
    }

    #[tokio::test]
    async fn test_generate_project_packages_and_persists_files() {
        let dir = tempdir().unwrap();
        let generator = MockGenerativeClient::new().with_text_response(
            r#"{"files": [{"path": "main.py", "content": "print(1)"}], "instructions": "python main.py"}"#,
        );
        let app = build_test_app(dir.path(), generator);

        let outcome = app.generate_project("Build it").await.unwrap();

        assert_eq!(outcome.result.files, vec![FileRecord::new("main.py", "print(1)")]);
        assert_eq!(outcome.result.instructions, "python main.py");
        let zip_path = outcome.zip_path.unwrap();
        assert!(zip_path.exists());

        let stored = app.store.get_project(&outcome.project_id).unwrap().unwrap();
        assert_eq!(stored.prompt, "Build it");
        assert_eq!(stored.files, outcome.result.files);

        let bytes = app.project_archive(&outcome.project_id).await.unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[tokio::test]
    async fn test_uninterpretable_response_is_stored_without_archive() {
        let dir = tempdir().unwrap();
        let generator = MockGenerativeClient::new().with_text_response("Sorry, I cannot help.");
        let app = build_test_app(dir.path(), generator);

        let outcome = app.generate_project("Build it").await.unwrap();

        assert!(outcome.result.files.is_empty());
        assert_eq!(outcome.result.error.as_deref(), Some(DECODE_FAILURE));
        assert_eq!(outcome.result.instructions, "Sorry, I cannot help.");
        assert!(outcome.zip_path.is_none());

        let err = app.project_archive(&outcome.project_id).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(ref msg) if msg == "Project file not found"));
    }

    #[tokio::test]
    async fn test_backend_failure_is_retried_then_returned() {
        let dir = tempdir().unwrap();
        let generator = MockGenerativeClient::new().with_failure("quota exceeded");
        let recorder = generator.clone();
        let app = build_test_app(dir.path(), generator).with_retry_policy(2, Duration::ZERO);

        let err = app.generate_project("Build it").await.unwrap_err();

        assert!(matches!(err, Error::AiProvider(_)));
        assert_eq!(recorder.get_call_count(), 3);
    }

    #[tokio::test]
    async fn test_backend_recovers_on_retry() {
        let dir = tempdir().unwrap();
        let generator = MockGenerativeClient::new()
            .with_failure("temporarily unavailable")
            .with_text_response(r#"{"files": []}"#);
        let recorder = generator.clone();
        let app = build_test_app(dir.path(), generator).with_retry_policy(1, Duration::ZERO);

        let outcome = app.generate_project("Build it").await.unwrap();

        assert!(outcome.result.files.is_empty());
        assert_eq!(outcome.result.error, None);
        assert_eq!(recorder.get_call_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_prompt_is_rejected() {
        let dir = tempdir().unwrap();
        let generator = MockGenerativeClient::new();
        let recorder = generator.clone();
        let app = build_test_app(dir.path(), generator);

        let err = app.generate_project("   ").await.unwrap_err();

        assert!(matches!(err, Error::InvalidRequest(_)));
        assert_eq!(recorder.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_compose_prompt_uses_uploaded_document() {
        let dir = tempdir().unwrap();
        let app = build_test_app(dir.path(), MockGenerativeClient::new());

        let document = app
            .upload_document("req.md", b"Build a todo app".to_vec())
            .await
            .unwrap();

        let prompt = app
            .compose_prompt(&ComposePromptRequest {
                document_id: document.document_id,
                snippet_ids: vec!["generate_tests".to_string(), "nope".to_string()],
                practice_ids: vec!["clean_code".to_string()],
                extra_instructions: None,
            })
            .await
            .unwrap();

        assert!(prompt.starts_with("## Document Requirements\nBuild a todo app\n"));
        assert!(prompt.contains("### Generate Tests"));
        assert!(prompt.contains("### Clean Code"));
        assert!(prompt.contains("## Output Requirements"));
    }

    #[tokio::test]
    async fn test_compose_prompt_unknown_document() {
        let dir = tempdir().unwrap();
        let app = build_test_app(dir.path(), MockGenerativeClient::new());

        let err = app
            .compose_prompt(&ComposePromptRequest {
                document_id: "missing".to_string(),
                snippet_ids: Vec::new(),
                practice_ids: Vec::new(),
                extra_instructions: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_project_archive_unknown_project() {
        let dir = tempdir().unwrap();
        let app = build_test_app(dir.path(), MockGenerativeClient::new());

        let err = app.project_archive("nope").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(ref msg) if msg == "Project not found"));
    }
}
