pub mod demo;

use crate::pr::diff::changed_paths;
use crate::report::types::{FilesGrouped, PrMetadata, Review, Source};

const MIGRATION_RISK: &str = "Touches database migrations — verify migration safety in staging";
const PUBLIC_API_RISK: &str = "Modifies public API surface — ensure backward compatibility";
const NO_TESTS_RISK: &str = "No tests changed — consider adding/adjusting tests for new behavior";
const NO_RISK: &str = "No obvious high risks detected; run CI and sanity checks";
const LINT_SUMMARY: &str = "Lint: basic checks OK (deterministic mock)";
const SUMMARY_LINES: usize = 6;

const CHECKLIST: [&str; 5] = [
    "CI builds are passing",
    "At least one reviewer approved changes",
    "Tests cover new/changed behavior",
    "Documentation updated where needed",
    "Performance and security checks completed",
];

/// Output of the local summarizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub summary: String,
    pub files_grouped: FilesGrouped,
    pub risks: Vec<String>,
    pub checklist: Vec<String>,
    pub should_merge: bool,
    pub explanation: String,
    pub lint_summary: String,
}

impl Summary {
    /// A locally produced review is always tagged `demo`.
    pub fn into_review(self, title: String, metadata: PrMetadata) -> Review {
        Review {
            title,
            summary: self.summary,
            files_grouped: self.files_grouped,
            risks: self.risks,
            checklist: self.checklist,
            should_merge: self.should_merge,
            explanation: self.explanation,
            lint_summary: self.lint_summary,
            source: Source::Demo,
            metadata,
        }
    }
}

/// What kind of file a changed path is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Code,
    Tests,
    Docs,
}

/// Classify a path by name alone. Test patterns win over docs patterns.
pub fn classify(path: &str) -> FileKind {
    let lower = path.to_lowercase();
    if lower.contains(".test.")
        || lower.contains(".spec.")
        || lower.starts_with("test/")
        || lower.starts_with("tests/")
        || lower.contains("test")
    {
        return FileKind::Tests;
    }
    if lower.ends_with(".md")
        || lower.starts_with("doc/")
        || lower.starts_with("docs/")
        || lower.contains("readme")
    {
        return FileKind::Docs;
    }
    FileKind::Code
}

pub fn group_files(paths: &[String]) -> FilesGrouped {
    let mut grouped = FilesGrouped::default();
    for path in paths {
        let bucket = match classify(path) {
            FileKind::Code => &mut grouped.code,
            FileKind::Tests => &mut grouped.tests,
            FileKind::Docs => &mut grouped.docs,
        };
        bucket.push(path.clone());
    }
    grouped
}

fn any_path_contains(paths: &[String], needles: &[&str]) -> bool {
    paths.iter().any(|p| {
        let lower = p.to_lowercase();
        needles.iter().any(|n| lower.contains(n))
    })
}

fn assess_risks(paths: &[String], grouped: &FilesGrouped) -> Vec<String> {
    let mut risks = Vec::new();
    if any_path_contains(paths, &["migrations", "schema", "db", "database"]) {
        risks.push(MIGRATION_RISK.to_string());
    }
    if any_path_contains(paths, &["api", "routes", "controllers", "public"]) {
        risks.push(PUBLIC_API_RISK.to_string());
    }
    if grouped.tests.is_empty() {
        risks.push(NO_TESTS_RISK.to_string());
    }
    if risks.is_empty() {
        risks.push(NO_RISK.to_string());
    }
    risks
}

/// Summarize a unified diff (or any text) without touching the network.
///
/// Pure: the same input always yields the same `Summary`.
pub fn summarize(diff_text: &str) -> Summary {
    let paths = changed_paths(diff_text);
    let files_grouped = group_files(&paths);

    let opening = diff_text
        .split('\n')
        .filter(|l| !l.trim().is_empty())
        .take(SUMMARY_LINES)
        .collect::<Vec<_>>()
        .join(" ");
    let summary = if opening.is_empty() {
        format!(
            "This PR updates {} files across code, tests, and docs.",
            paths.len()
        )
    } else {
        format!(
            "This PR includes changes affecting {} files. {} The changes appear focused and include updates to code, tests, and documentation.",
            paths.len(),
            opening
        )
    };

    let risks = assess_risks(&paths, &files_grouped);
    let should_merge = risks.len() <= 1;
    let explanation = if should_merge {
        "Risks are manageable."
    } else {
        "Address listed risks before merging."
    };

    Summary {
        summary,
        files_grouped,
        risks,
        checklist: CHECKLIST.iter().map(|s| s.to_string()).collect(),
        should_merge,
        explanation: explanation.to_string(),
        lint_summary: LINT_SUMMARY.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOO_DIFF: &str = "diff --git a/src/foo.ts b/src/foo.ts\n+++ b/src/foo.ts\n@@\n+console.log(1)\n";

    #[test]
    fn test_classify_paths() {
        assert_eq!(classify("src/lib.rs"), FileKind::Code);
        assert_eq!(classify("tests/integration.rs"), FileKind::Tests);
        assert_eq!(classify("src/button.spec.tsx"), FileKind::Tests);
        assert_eq!(classify("src/latest_value.rs"), FileKind::Tests);
        assert_eq!(classify("docs/guide.txt"), FileKind::Docs);
        assert_eq!(classify("CHANGELOG.md"), FileKind::Docs);
        assert_eq!(classify("sub/ReadMe.rst"), FileKind::Docs);
        assert_eq!(classify("tests/README.md"), FileKind::Tests);
    }

    #[test]
    fn test_summarize_single_code_file() {
        let summary = summarize(FOO_DIFF);
        assert_eq!(summary.files_grouped.code, vec!["src/foo.ts"]);
        assert!(summary.files_grouped.tests.is_empty());
        assert!(summary.summary.starts_with("This PR includes changes affecting 1 files. diff --git"));
        assert_eq!(summary.risks, vec![NO_TESTS_RISK]);
        assert!(summary.should_merge);
        assert_eq!(summary.explanation, "Risks are manageable.");
        assert_eq!(summary.checklist.len(), 5);
        assert_eq!(summary.lint_summary, LINT_SUMMARY);
    }

    #[test]
    fn test_summarize_flags_migrations_and_api() {
        let diff = "diff --git a/db/migrations/001.sql b/db/migrations/001.sql\n\
                    diff --git a/src/api/routes.rs b/src/api/routes.rs\n";
        let summary = summarize(diff);
        assert_eq!(summary.risks, vec![MIGRATION_RISK, PUBLIC_API_RISK, NO_TESTS_RISK]);
        assert!(!summary.should_merge);
        assert_eq!(summary.explanation, "Address listed risks before merging.");
    }

    #[test]
    fn test_summarize_with_tests_has_no_risks() {
        let diff = "diff --git a/src/lib.rs b/src/lib.rs\ndiff --git a/tests/lib.rs b/tests/lib.rs\n";
        let summary = summarize(diff);
        assert_eq!(summary.risks, vec![NO_RISK]);
        assert!(summary.should_merge);
    }

    #[test]
    fn test_summarize_empty_input() {
        let summary = summarize("");
        assert_eq!(summary.summary, "This PR updates 0 files across code, tests, and docs.");
        assert_eq!(summary.files_grouped, FilesGrouped::default());
        assert_eq!(summary.risks, vec![NO_TESTS_RISK]);
    }

    #[test]
    fn test_summary_uses_first_six_lines() {
        let text = "a\n\nb\nc\n  \nd\ne\nf\ng\n";
        let summary = summarize(text);
        assert!(summary.summary.contains(" a b c d e f The changes"));
        assert!(!summary.summary.contains(" g "));
    }

    #[test]
    fn test_summarize_is_deterministic() {
        let diff = "diff --git a/docs/intro.md b/docs/intro.md\n+++ b/docs/intro.md\n+hello\n";
        assert_eq!(summarize(diff), summarize(diff));
        assert_eq!(format!("{:?}", summarize(diff)), format!("{:?}", summarize(diff)));
    }
}
