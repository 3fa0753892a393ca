//! Best-practice notes loaded from a directory of markdown files

use crate::models::Practice;
use crate::Result;
use std::fs;
use std::path::Path;

const EXCERPT_CHARS: usize = 200;

/// Load every `*.md` file in `dir`, sorted by file name.
///
/// A missing directory yields an empty list. Files that cannot be read are
/// skipped.
pub fn load_practices(dir: &Path) -> Result<Vec<Practice>> {
    if !dir.is_dir() {
        tracing::debug!("Practices directory {} not found", dir.display());
        return Ok(Vec::new());
    }

    let mut paths: Vec<_> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "md"))
        .collect();
    paths.sort();

    let mut practices = Vec::with_capacity(paths.len());
    for path in paths {
        let Some(id) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };

        match fs::read_to_string(&path) {
            Ok(content) => practices.push(Practice {
                id: id.to_string(),
                title: title_from_id(id),
                excerpt: excerpt(&content),
                content,
            }),
            Err(e) => tracing::warn!("Error reading practice file {}: {}", path.display(), e),
        }
    }

    Ok(practices)
}

fn title_from_id(id: &str) -> String {
    id.split(['_', '-', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// First non-blank line that is not a heading, else the leading characters.
fn excerpt(content: &str) -> String {
    if let Some(line) = content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
    {
        return line.to_string();
    }

    if content.chars().count() > EXCERPT_CHARS {
        let head: String = content.chars().take(EXCERPT_CHARS).collect();
        format!("{}...", head)
    } else {
        content.to_string()
    }
}
