//! Data models and structures
//!
//! Defines the generation data model (model responses, file records and the
//! assembled result), the persisted document/project records, the prompt
//! catalogue entries and the runtime configuration.

use crate::ai::gemini::types::Candidate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

/// A generative backend response, in whichever shape the backend produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelResponse {
    /// The backend exposed its output as a single text field.
    Text(String),
    /// Candidate list with nested content parts.
    Candidates(Vec<Candidate>),
    /// Anything else; only usable through its string form.
    Raw(Value),
}

impl ModelResponse {
    /// Sniff a decoded response body, trying a top-level `text` field first,
    /// then a non-empty `candidates` list.
    pub fn from_value(value: Value) -> Self {
        if let Some(text) = value.get("text").and_then(Value::as_str) {
            return ModelResponse::Text(text.to_string());
        }

        let candidates = value
            .get("candidates")
            .filter(|c| c.as_array().is_some_and(|items| !items.is_empty()))
            .and_then(|c| serde_json::from_value::<Vec<Candidate>>(c.clone()).ok());

        match candidates {
            Some(candidates) => ModelResponse::Candidates(candidates),
            None => ModelResponse::Raw(value),
        }
    }
}

impl fmt::Display for ModelResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelResponse::Text(text) => f.write_str(text),
            ModelResponse::Candidates(candidates) => {
                let json = serde_json::to_string(candidates).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
            ModelResponse::Raw(Value::String(text)) => f.write_str(text),
            ModelResponse::Raw(value) => write!(f, "{}", value),
        }
    }
}

/// One generated file: a relative path and its full text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: String,
    pub content: String,
}

impl FileRecord {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Outcome of interpreting one model response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub files: Vec<FileRecord>,
    pub raw_text: String,
    pub instructions: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerationResult {
    /// True when the response produced nothing to package.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Supported upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Docx,
    Pdf,
    Md,
    Txt,
}

impl DocumentType {
    pub const ALLOWED_EXTENSIONS: [&'static str; 4] = [".docx", ".pdf", ".md", ".txt"];

    /// Resolve a type from a filename's extension, case-insensitively.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, extension) = filename.rsplit_once('.')?;
        match extension.to_ascii_lowercase().as_str() {
            "docx" => Some(DocumentType::Docx),
            "pdf" => Some(DocumentType::Pdf),
            "md" => Some(DocumentType::Md),
            "txt" => Some(DocumentType::Txt),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Docx => "docx",
            DocumentType::Pdf => "pdf",
            DocumentType::Md => "md",
            DocumentType::Txt => "txt",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::from_filename(&format!(".{}", value))
    }
}

/// An uploaded requirements document after text extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub document_id: String,
    pub filename: String,
    pub content: String,
    pub file_type: DocumentType,
    pub created_at: String,
}

/// A persisted generation: the prompt, the files it produced and the archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedProject {
    pub project_id: String,
    pub prompt: String,
    pub files: Vec<FileRecord>,
    pub zip_path: Option<PathBuf>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snippet {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub content: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Practice {
    pub id: String,
    pub title: String,
    pub excerpt: String,
    pub content: String,
}

// HTTP API request/response models
#[derive(Debug, Clone, Deserialize)]
pub struct ComposePromptRequest {
    pub document_id: String,
    #[serde(default)]
    pub snippet_ids: Vec<String>,
    #[serde(default)]
    pub practice_ids: Vec<String>,
    #[serde(default)]
    pub extra_instructions: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposePromptResponse {
    pub prompt: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateCodeRequest {
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateCodeResponse {
    pub project_id: String,
    pub files: Vec<FileRecord>,
    /// `None` when the response produced no files to package.
    pub download_url: Option<String>,
    pub raw_text: String,
    pub instructions: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub document_id: String,
    pub filename: String,
    pub file_type: DocumentType,
    pub content_preview: String,
    pub content_length: usize,
}

const PREVIEW_CHARS: usize = 200;

impl From<&Document> for UploadResponse {
    fn from(document: &Document) -> Self {
        let content_length = document.content.chars().count();
        let content_preview = if content_length > PREVIEW_CHARS {
            let head: String = document.content.chars().take(PREVIEW_CHARS).collect();
            format!("{}...", head)
        } else {
            document.content.clone()
        };

        Self {
            document_id: document.document_id.clone(),
            filename: document.filename.clone(),
            file_type: document.file_type,
            content_preview,
            content_length,
        }
    }
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub app_env: String,
    pub database_url: Option<String>,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub host: IpAddr,
    pub port: u16,
    pub practices_dir: PathBuf,
    pub output_dir: PathBuf,
    pub generation_retries: usize,
}

const DEV_DATABASE_PATH: &str = "promptcodegen.db";

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load an explicit env file into the process environment. Variables
    /// already set are left untouched.
    pub fn load_env_file(path: &std::path::Path) -> crate::Result<()> {
        dotenvy::from_path(path)?;
        Ok(())
    }

    /// Build a config from an arbitrary key lookup. Used by tests to avoid
    /// touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let gemini_api_key = lookup("GEMINI_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| crate::Error::Config("GEMINI_API_KEY not set".to_string()))?;

        Ok(Self {
            app_env: lookup("APP_ENV").unwrap_or_else(|| "dev".to_string()),
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            gemini_api_key,
            gemini_model: lookup("GEMINI_MODEL").unwrap_or_else(|| "gemini-1.5-flash".to_string()),
            host: parse_var(&lookup, "HOST", IpAddr::V4(Ipv4Addr::UNSPECIFIED))?,
            port: parse_var(&lookup, "PORT", 8000)?,
            practices_dir: lookup("PRACTICES_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/practices")),
            output_dir: lookup("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("output/projects")),
            generation_retries: parse_var(&lookup, "GENERATION_RETRIES", 2)?,
        })
    }

    /// SQLite database path. Only production honours `DATABASE_URL`.
    pub fn database_path(&self) -> PathBuf {
        match (&self.database_url, self.app_env.as_str()) {
            (Some(url), "prod") => {
                let path = url
                    .strip_prefix("sqlite:///")
                    .or_else(|| url.strip_prefix("sqlite://"))
                    .unwrap_or(url);
                PathBuf::from(path)
            }
            _ => PathBuf::from(DEV_DATABASE_PATH),
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> crate::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| crate::Error::Config(format!("Invalid value for {}: '{}'", key, raw))),
        None => Ok(default),
    }
}
