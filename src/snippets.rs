//! Hard-coded prompt-engineering snippets

use crate::models::Snippet;

pub const SNIPPETS: &[Snippet] = &[
    Snippet {
        id: "senior_dev",
        title: "Senior Developer",
        description: "Act as an experienced senior developer",
        content: "Act as a senior developer with more than five years of experience. \
                  Apply development best practices, design patterns and clean architecture. \
                  Produce production-ready code with proper error handling, logging and documentation.",
    },
    Snippet {
        id: "qa_perspective",
        title: "QA Perspective",
        description: "Take a QA perspective and generate tests",
        content: "Take the perspective of an experienced QA professional. Generate thorough unit tests, \
                  integration tests and edge-case scenarios. Include input validation, error handling \
                  and performance tests where appropriate.",
    },
    Snippet {
        id: "junior_dev",
        title: "Junior Developer",
        description: "Explain with simple comments",
        content: "Explain the code with detailed comments and generate solutions that beginners can follow. \
                  Use simple patterns, avoid unnecessary complexity and explain the design decisions taken.",
    },
    Snippet {
        id: "limited_complexity",
        title: "Limit Complexity",
        description: "Restrict to basic and intermediate solutions",
        content: "Restrict solutions to a basic or intermediate level of complexity. Avoid unnecessary \
                  advanced patterns, multiple layers of abstraction or overly elaborate designs. \
                  Favour simplicity and clarity.",
    },
    Snippet {
        id: "generate_tests",
        title: "Generate Tests",
        description: "Include basic tests",
        content: "Include basic tests that validate the main features of the system. \
                  Generate unit and integration tests, covering external dependencies and expected error cases.",
    },
    Snippet {
        id: "best_practices",
        title: "Best Practices",
        description: "Apply clean code standards",
        content: "Apply clean code standards and well-structured design principles. \
                  Use descriptive names, small focused functions, a clear separation of responsibilities \
                  and concise documentation.",
    },
];

pub fn find(id: &str) -> Option<&'static Snippet> {
    SNIPPETS.iter().find(|snippet| snippet.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_snippet_ids_are_unique() {
        let ids: HashSet<&str> = SNIPPETS.iter().map(|s| s.id).collect();
        assert_eq!(ids.len(), SNIPPETS.len());
    }

    #[test]
    fn test_snippets_are_non_empty() {
        assert_eq!(SNIPPETS.len(), 6);
        for snippet in SNIPPETS {
            assert!(!snippet.title.is_empty());
            assert!(!snippet.description.is_empty());
            assert!(!snippet.content.is_empty());
        }
    }

    #[test]
    fn test_find_by_id() {
        assert_eq!(find("qa_perspective").map(|s| s.title), Some("QA Perspective"));
        assert!(find("unknown").is_none());
    }
}
