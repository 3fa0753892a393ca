//! Prompt composition from a document, snippets and best practices

use crate::models::{Practice, Snippet};

pub const OUTPUT_REQUIREMENTS: &str = include_str!("../data/prompts/output_requirements.txt");

/// Everything that goes into one composed prompt. Snippets and practices are
/// already resolved; unknown ids were dropped by the caller.
#[derive(Debug, Default)]
pub struct PromptParts<'a> {
    pub document: &'a str,
    pub snippets: Vec<&'a Snippet>,
    pub practices: Vec<&'a Practice>,
    pub extra_instructions: Option<&'a str>,
}

/// Build the final prompt. Sections appear in a fixed order and the output
/// requirements are always appended.
pub fn compose(parts: &PromptParts<'_>) -> String {
    let mut lines: Vec<String> = vec![
        "## Document Requirements".to_string(),
        parts.document.to_string(),
        String::new(),
    ];

    if !parts.snippets.is_empty() {
        lines.push("## Prompt Engineering Context".to_string());
        for snippet in &parts.snippets {
            push_entry(&mut lines, snippet.title, snippet.content);
        }
    }

    if !parts.practices.is_empty() {
        lines.push("## Best Practices to Apply".to_string());
        for practice in &parts.practices {
            push_entry(&mut lines, &practice.title, &practice.content);
        }
    }

    if let Some(extra) = parts.extra_instructions.filter(|e| !e.trim().is_empty()) {
        lines.push("## Additional Instructions".to_string());
        lines.push(extra.to_string());
        lines.push(String::new());
    }

    lines.push("## Output Requirements".to_string());
    lines.push(OUTPUT_REQUIREMENTS.trim_end().to_string());

    lines.join("\n")
}

fn push_entry(lines: &mut Vec<String>, title: &str, content: &str) {
    lines.push(format!("### {}", title));
    lines.push(content.to_string());
    lines.push(String::new());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snippets;
    use pretty_assertions::assert_eq;

    fn practice(id: &str, title: &str, content: &str) -> Practice {
        Practice {
            id: id.to_string(),
            title: title.to_string(),
            excerpt: String::new(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_document_only() {
        let prompt = compose(&PromptParts {
            document: "Build a todo app",
            ..Default::default()
        });

        assert_eq!(
            prompt,
            format!(
                "## Document Requirements\nBuild a todo app\n\n## Output Requirements\n{}",
                OUTPUT_REQUIREMENTS.trim_end()
            )
        );
    }

    #[test]
    fn test_sections_in_order() {
        let clean = practice("clean_code", "Clean Code", "Small functions.");
        let snippet = snippets::find("senior_dev").unwrap();

        let prompt = compose(&PromptParts {
            document: "Doc",
            snippets: vec![snippet],
            practices: vec![&clean],
            extra_instructions: Some("Use Python 3.12"),
        });

        let order = [
            "## Document Requirements",
            "## Prompt Engineering Context",
            "### Senior Developer",
            "## Best Practices to Apply",
            "### Clean Code\nSmall functions.\n",
            "## Additional Instructions\nUse Python 3.12\n",
            "## Output Requirements",
        ];
        let mut cursor = 0;
        for marker in order {
            let found = prompt[cursor..]
                .find(marker)
                .unwrap_or_else(|| panic!("missing or out of order: {}", marker));
            cursor += found + marker.len();
        }
    }

    #[test]
    fn test_blank_extra_instructions_are_skipped() {
        let prompt = compose(&PromptParts {
            document: "Doc",
            extra_instructions: Some("   "),
            ..Default::default()
        });
        assert!(!prompt.contains("## Additional Instructions"));
    }

    #[test]
    fn test_output_requirements_ask_for_json_files() {
        assert!(OUTPUT_REQUIREMENTS.contains("\"files\""));
        assert!(OUTPUT_REQUIREMENTS.contains("\"instructions\""));
    }
}
