use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use crate::report::types::{FilesGrouped, PrMetadata, Review, Source};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(45);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_NAMESPACE: &str = "main";

/// Execution inputs sent to the review flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineInputs {
    pub pr_number: u64,
    /// `owner/repo`
    pub repository: String,
    pub pr_title: String,
    pub pr_body: String,
    pub pr_diff: String,
    pub author: String,
    pub files_changed: usize,
    pub additions: usize,
    pub deletions: usize,
}

/// Where and how to reach the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Base URL without trailing slash or `/api/v1`
    pub api_url: String,
    pub api_key: Option<String>,
    pub namespace: String,
    pub flow_id: String,
    /// Upper bound on the whole execution, also used per HTTP call
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl EngineOptions {
    pub fn new(api_url: &str, namespace: &str, flow_id: &str) -> Self {
        let base = api_url.trim_end_matches('/');
        let base = base.strip_suffix("/api/v1").unwrap_or(base);
        let namespace = if namespace.is_empty() {
            DEFAULT_NAMESPACE
        } else {
            namespace
        };
        Self {
            api_url: base.to_string(),
            api_key: None,
            namespace: namespace.to_string(),
            flow_id: flow_id.to_string(),
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// `ceil(timeout / poll_interval)`, never less than one attempt.
    pub fn max_attempts(&self) -> u32 {
        let interval = self.poll_interval.as_millis().max(1);
        let attempts = self.timeout.as_millis().div_ceil(interval);
        u32::try_from(attempts).unwrap_or(u32::MAX).max(1)
    }
}

/// Outputs of a finished execution, read leniently: a field of the wrong
/// JSON type counts as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOutputs {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub files_grouped: Option<FilesGrouped>,
    pub risks: Option<Vec<String>>,
    pub checklist: Option<Vec<String>>,
    pub should_merge: Option<bool>,
    pub explanation: Option<String>,
    pub lint_summary: Option<String>,
    pub source: Option<String>,
}

fn non_empty_str(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    value.as_array().map(|items| {
        items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect()
    })
}

impl EngineOutputs {
    pub fn from_value(outputs: &Value) -> Self {
        let files_grouped = outputs
            .get("filesGrouped")
            .filter(|v| v.is_object())
            .map(|grouped| FilesGrouped {
                code: grouped.get("code").and_then(string_list).unwrap_or_default(),
                tests: grouped.get("tests").and_then(string_list).unwrap_or_default(),
                docs: grouped.get("docs").and_then(string_list).unwrap_or_default(),
            });

        Self {
            title: non_empty_str(outputs, "title"),
            summary: non_empty_str(outputs, "summary"),
            files_grouped,
            risks: outputs.get("risks").and_then(string_list),
            checklist: outputs.get("checklist").and_then(string_list),
            should_merge: outputs.get("shouldMerge").and_then(Value::as_bool),
            explanation: non_empty_str(outputs, "explanation"),
            lint_summary: non_empty_str(outputs, "lintSummary"),
            source: non_empty_str(outputs, "source"),
        }
    }

    /// Fields the engine client insists on before accepting an execution.
    pub fn missing_core_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.summary.is_none() {
            missing.push("summary");
        }
        if self.checklist.is_none() {
            missing.push("checklist");
        }
        if self.risks.is_none() {
            missing.push("risks");
        }
        if self.should_merge.is_none() {
            missing.push("shouldMerge");
        }
        if self.explanation.is_none() {
            missing.push("explanation");
        }
        missing
    }

    /// All seven fields a review must carry to be shown as a live result.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.summary.is_none() {
            missing.push("summary");
        }
        if self.files_grouped.is_none() {
            missing.push("filesGrouped");
        }
        if self.risks.is_none() {
            missing.push("risks");
        }
        if self.checklist.is_none() {
            missing.push("checklist");
        }
        if self.should_merge.is_none() {
            missing.push("shouldMerge");
        }
        if self.explanation.is_none() {
            missing.push("explanation");
        }
        if self.lint_summary.is_none() {
            missing.push("lintSummary");
        }
        missing
    }

    /// Fill the defaults a successful execution is allowed to omit.
    pub fn with_defaults(mut self) -> Self {
        self.files_grouped.get_or_insert_with(FilesGrouped::default);
        self.risks.get_or_insert_with(Vec::new);
        self.checklist.get_or_insert_with(Vec::new);
        self.source.get_or_insert_with(|| Source::Kestra.to_string());
        self
    }

    /// Collapse into a `Review`. Anything other than `kestra` as the source
    /// is reported as `demo`. The title falls back to `pr_title`, then to
    /// `PR {n}`.
    pub fn into_review(self, pr_title: &str, metadata: PrMetadata) -> Review {
        let source = match self.source.as_deref() {
            Some("kestra") => Source::Kestra,
            _ => Source::Demo,
        };
        let title = self
            .title
            .or_else(|| Some(pr_title.to_string()).filter(|t| !t.is_empty()))
            .unwrap_or_else(|| format!("PR {}", metadata.pr_number));
        Review {
            title,
            summary: self.summary.unwrap_or_default(),
            files_grouped: self.files_grouped.unwrap_or_default(),
            risks: self.risks.unwrap_or_default(),
            checklist: self.checklist.unwrap_or_default(),
            should_merge: self.should_merge.unwrap_or(false),
            explanation: self.explanation.unwrap_or_default(),
            lint_summary: self.lint_summary.unwrap_or_default(),
            source,
            metadata,
        }
    }
}
