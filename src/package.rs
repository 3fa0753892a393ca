//! ZIP packaging of generated project files

use crate::models::FileRecord;
use crate::Result;
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Writes project archives into a single output directory.
#[derive(Debug, Clone)]
pub struct ProjectPackager {
    output_dir: PathBuf,
}

impl ProjectPackager {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write `files` to `{output_dir}/{project_id}.zip` and return its path.
    ///
    /// Entries with an empty path or a path escaping the archive root are
    /// skipped. So are later repeats of a path.
    pub fn package(&self, project_id: &str, files: &[FileRecord]) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        // Written beside the final archive so the rename cannot cross devices.
        let staging = tempfile::NamedTempFile::new_in(&self.output_dir)?;
        let mut writer = ZipWriter::new(staging);
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let mut seen = HashSet::new();
        let mut written = 0usize;
        for file in files {
            let Some(entry_name) = normalize_entry_path(&file.path) else {
                tracing::warn!("Skipping file with unsafe path: {:?}", file.path);
                continue;
            };
            if !seen.insert(entry_name.clone()) {
                tracing::warn!("Skipping duplicate file path: {}", entry_name);
                continue;
            }

            writer.start_file(entry_name, options)?;
            writer.write_all(file.content.as_bytes())?;
            written += 1;
        }

        let staging = writer.finish()?;
        let archive_path = self.output_dir.join(format!("{}.zip", project_id));
        staging
            .persist(&archive_path)
            .map_err(|e| crate::Error::Io(e.error))?;

        tracing::info!(
            "Packaged {} of {} files into {}",
            written,
            files.len(),
            archive_path.display()
        );
        Ok(archive_path)
    }
}

/// Turn a model-supplied path into a safe relative archive entry name.
fn normalize_entry_path(path: &str) -> Option<String> {
    let unified = path.trim().replace('\\', "/");
    let mut components = Vec::new();

    for component in unified.split('/') {
        match component {
            "" | "." => continue,
            ".." => return None,
            other if other.ends_with(':') => return None,
            other => components.push(other),
        }
    }

    if components.is_empty() {
        None
    } else {
        Some(components.join("/"))
    }
}
