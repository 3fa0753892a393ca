use super::payload::ParsedPayload;
use crate::models::FileRecord;
use serde_json::Value;

/// How the `files` value of a payload was interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileListStatus {
    /// At least one valid entry survived.
    Valid,
    /// No `files` key.
    Missing,
    /// `files` was present but not an array.
    NotAList,
    /// `files` was an empty array.
    Empty,
    /// Every entry of a non-empty array was malformed.
    NoValidEntries,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileList {
    pub files: Vec<FileRecord>,
    pub dropped: usize,
    pub status: FileListStatus,
}

impl FileList {
    fn empty(status: FileListStatus) -> Self {
        Self {
            files: Vec::new(),
            dropped: 0,
            status,
        }
    }
}

/// Keep the `files` entries that carry a non-empty string `path` and a string
/// `content`, in their original order. Anything else is dropped.
pub fn validate_files(payload: &ParsedPayload) -> FileList {
    let entries = match payload.get("files") {
        None => return FileList::empty(FileListStatus::Missing),
        Some(Value::Array(entries)) => entries,
        Some(other) => {
            tracing::warn!(
                "Ignoring 'files' value of unexpected type: {}",
                value_kind(other)
            );
            return FileList::empty(FileListStatus::NotAList);
        }
    };

    if entries.is_empty() {
        return FileList::empty(FileListStatus::Empty);
    }

    let files: Vec<FileRecord> = entries.iter().filter_map(file_record).collect();
    let dropped = entries.len() - files.len();
    if dropped > 0 {
        tracing::debug!("Dropped {} of {} file entries", dropped, entries.len());
    }

    let status = if files.is_empty() {
        FileListStatus::NoValidEntries
    } else {
        FileListStatus::Valid
    };

    FileList {
        files,
        dropped,
        status,
    }
}

fn file_record(entry: &Value) -> Option<FileRecord> {
    let entry = entry.as_object()?;
    let path = entry.get("path")?.as_str()?;
    let content = entry.get("content")?.as_str()?;

    if path.trim().is_empty() {
        return None;
    }

    Some(FileRecord::new(path, content))
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
