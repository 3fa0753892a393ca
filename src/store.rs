//! SQLite persistence for uploaded documents and generated projects

use crate::models::{Document, DocumentType, FileRecord, GeneratedProject};
use crate::{Error, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    document_id TEXT NOT NULL UNIQUE,
    filename TEXT NOT NULL,
    content TEXT NOT NULL,
    file_type TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS generated_projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id TEXT NOT NULL UNIQUE,
    prompt TEXT NOT NULL,
    files_json TEXT NOT NULL,
    zip_path TEXT,
    created_at TEXT NOT NULL
);
";

/// Shared handle to the application database.
///
/// Calls block on SQLite; async callers should go through
/// `tokio::task::spawn_blocking`.
#[derive(Clone)]
pub struct ProjectStore {
    conn: Arc<Mutex<Connection>>,
}

impl ProjectStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        tracing::info!("Opened database at {}", path.display());
        Self::with_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Invariant("database connection lock poisoned".to_string()))
    }

    pub fn insert_document(&self, document: &Document) -> Result<()> {
        self.lock()?.execute(
            "INSERT INTO documents (document_id, filename, content, file_type, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                document.document_id,
                document.filename,
                document.content,
                document.file_type.as_str(),
                document.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_document(&self, document_id: &str) -> Result<Option<Document>> {
        let row = self
            .lock()?
            .query_row(
                "SELECT document_id, filename, content, file_type, created_at
                 FROM documents WHERE document_id = ?1",
                params![document_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(document_id, filename, content, file_type, created_at)| -> Result<Document> {
            let file_type = DocumentType::parse(&file_type).ok_or_else(|| {
                Error::Invariant(format!("Unknown stored file type '{}'", file_type))
            })?;
            Ok(Document {
                document_id,
                filename,
                content,
                file_type,
                created_at,
            })
        })
        .transpose()
    }

    pub fn insert_project(&self, project: &GeneratedProject) -> Result<()> {
        let files_json = serde_json::to_string(&project.files)?;
        let zip_path = project
            .zip_path
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned());

        self.lock()?.execute(
            "INSERT INTO generated_projects (project_id, prompt, files_json, zip_path, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                project.project_id,
                project.prompt,
                files_json,
                zip_path,
                project.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_project(&self, project_id: &str) -> Result<Option<GeneratedProject>> {
        let row = self
            .lock()?
            .query_row(
                "SELECT project_id, prompt, files_json, zip_path, created_at
                 FROM generated_projects WHERE project_id = ?1",
                params![project_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(project_id, prompt, files_json, zip_path, created_at)| -> Result<GeneratedProject> {
            let files: Vec<FileRecord> = serde_json::from_str(&files_json)?;
            Ok(GeneratedProject {
                project_id,
                prompt,
                files,
                zip_path: zip_path.map(PathBuf::from),
                created_at,
            })
        })
        .transpose()
    }
}
