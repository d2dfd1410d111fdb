pub mod request;

pub use request::{parse_pr_ref, AnalysisRequest};

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use crate::analysis::{demo, summarize};
use crate::config::Config;
use crate::engine::{EngineError, EngineInputs, EngineOutputs, KestraClient, WorkflowEngine};
use crate::pr::diff::DiffStats;
use crate::pr::{GitHubClient, PrError, PrFacts, PrUrl, PullRequestSource};
use crate::report::types::{AnalysisResponse, Mode, PrMetadata, Source};

const FALLBACK_NOTE: &str = "Fallback to mock summary";

/// Failures the caller gets to see. Engine failures never appear here.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("Invalid PR URL provided")]
    InvalidRequest,

    #[error("{0}")]
    InvalidUrl(String),

    #[error("GITHUB_TOKEN is required for live analysis. Enable demoMode for mock results.")]
    MissingToken,

    #[error("Failed to fetch GitHub PR: {0}")]
    GitHub(#[source] PrError),
}

/// Why a live request ended up with a local summary.
#[derive(Debug)]
enum FallbackReason {
    NotConfigured,
    EngineFailed(EngineError),
    Incomplete(Vec<&'static str>),
    ForeignSource(String),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::NotConfigured => write!(f, "workflow engine not configured"),
            FallbackReason::EngineFailed(err) => write!(f, "workflow engine failed ({err})"),
            FallbackReason::Incomplete(fields) => write!(
                f,
                "workflow engine returned incomplete outputs ({})",
                fields.join(", ")
            ),
            FallbackReason::ForeignSource(source) => {
                write!(f, "workflow engine reported source '{source}'")
            }
        }
    }
}

impl FallbackReason {
    fn note(&self) -> String {
        format!("{FALLBACK_NOTE}: {self}")
    }
}

/// Decides between demo, live and fallback and always converges on one
/// `AnalysisResponse`.
pub struct Reviewer {
    config: Arc<Config>,
    github: Arc<dyn PullRequestSource>,
    engine: Option<Arc<dyn WorkflowEngine>>,
}

impl Reviewer {
    /// Build a reviewer with the real GitHub and Kestra clients. The engine
    /// client only exists when the engine is fully configured.
    pub fn new(config: Config) -> Result<Self, EngineError> {
        let github: Arc<dyn PullRequestSource> = Arc::new(GitHubClient::new(config.github_api_url()));
        let engine = match config.engine.options() {
            Some(options) => Some(Arc::new(KestraClient::new(options)?) as Arc<dyn WorkflowEngine>),
            None => None,
        };
        Ok(Self::with_clients(config, github, engine))
    }

    pub fn with_clients(
        config: Config,
        github: Arc<dyn PullRequestSource>,
        engine: Option<Arc<dyn WorkflowEngine>>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            github,
            engine,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run one review.
    ///
    /// Mode decision, first match wins:
    /// 1. the request asks for demo mode
    /// 2. demo mode is switched on process-wide
    /// 3. live
    #[instrument(skip(self, request), fields(pr_url = %request.pr_url))]
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResponse, AnalyzeError> {
        let pr = parse_pr_ref(&request.pr_url)?;
        debug!(owner = %pr.owner, repo = %pr.repo, pr = pr.pr_number, "parsed PR reference");

        if request.demo_mode || self.config.demo.enabled {
            info!(requested = request.demo_mode, "using demo mode");
            return Ok(self.demo(&pr));
        }

        self.live(&pr).await
    }

    fn demo(&self, pr: &PrUrl) -> AnalysisResponse {
        let review = demo::demo_review(&pr.owner, &pr.repo, pr.pr_number, self.config.sample_path());
        AnalysisResponse::new(review, Mode::Demo, None)
    }

    async fn live(&self, pr: &PrUrl) -> Result<AnalysisResponse, AnalyzeError> {
        let token = self.config.github_token().ok_or(AnalyzeError::MissingToken)?;

        let facts = self
            .github
            .fetch(&pr.canonical(), Some(token))
            .await
            .map_err(|err| {
                error!(error = %err, "GitHub fetch failed");
                AnalyzeError::GitHub(err)
            })?;
        info!(files = facts.files.len(), diff_bytes = facts.diff_text.len(), "fetched PR from GitHub");

        let stats = DiffStats::from_diff(&facts.diff_text);
        let metadata = PrMetadata {
            pr_number: pr.pr_number,
            repository: pr.repository(),
            author: facts.author.clone(),
            files_changed: facts.files.len(),
            additions: stats.additions,
            deletions: stats.deletions,
        };

        let (review, reason) = match self.run_engine(pr, &facts, &stats).await {
            Ok(outputs) => {
                let reported = outputs.source.clone().unwrap_or_default();
                let review = outputs.into_review(&facts.title, metadata);
                let reason = (review.source != Source::Kestra).then(|| FallbackReason::ForeignSource(reported));
                (review, reason)
            }
            Err(reason) => {
                warn!(%reason, "falling back to local summarizer");
                let review = summarize(&facts.diff_text).into_review(facts.title.clone(), metadata);
                (review, Some(reason))
            }
        };

        let mode = Mode::for_live_source(review.source);
        let note = match mode {
            Mode::Fallback => Some(reason.map_or_else(|| FALLBACK_NOTE.to_string(), |r| r.note())),
            _ => None,
        };
        info!(source = %review.source, %mode, "returning result");
        Ok(AnalysisResponse::new(review, mode, note))
    }

    /// Try the engine once. Every failure, including an unknown flow, turns
    /// into a fallback reason; nothing is retried.
    async fn run_engine(
        &self,
        pr: &PrUrl,
        facts: &PrFacts,
        stats: &DiffStats,
    ) -> Result<EngineOutputs, FallbackReason> {
        let Some(engine) = &self.engine else {
            warn!("workflow engine is not configured; will fall back to local summarizer");
            return Err(FallbackReason::NotConfigured);
        };
        if !self.config.engine.fallback_on_error {
            debug!("KESTRA_FALLBACK_ON_ERROR=false has no effect; engine failures always fall back");
        }

        let inputs = EngineInputs {
            pr_number: pr.pr_number,
            repository: pr.repository(),
            pr_title: facts.title.clone(),
            pr_body: String::new(),
            pr_diff: facts.diff_text.clone(),
            author: facts.author.clone(),
            files_changed: facts.files.len(),
            additions: stats.additions,
            deletions: stats.deletions,
        };

        let outputs = engine.run(&inputs).await.map_err(|err| {
            if err.is_flow_not_found() {
                warn!(error = %err, "workflow flow not found");
            } else {
                warn!(error = %err, "workflow execution failed");
            }
            FallbackReason::EngineFailed(err)
        })?;

        let missing = outputs.missing_fields();
        if !missing.is_empty() {
            warn!(missing = %missing.join(", "), "workflow returned incomplete outputs");
            return Err(FallbackReason::Incomplete(missing));
        }

        info!("workflow execution succeeded");
        Ok(outputs.with_defaults())
    }
}
