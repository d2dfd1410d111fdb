pub mod types;

pub use types::{EngineInputs, EngineOptions, EngineOutputs};

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Kestra authentication failed. Check KESTRA_API_KEY.")]
    Auth,

    /// Flow, namespace or execution is unknown to the engine.
    #[error("{0}")]
    FlowNotFound(String),

    #[error("Kestra request failed: {0}")]
    Request(String),

    #[error("Kestra did not return an execution id")]
    MissingExecutionId,

    #[error("Kestra execution failed or killed (state={state})")]
    ExecutionFailed { state: String },

    #[error("Kestra execution polling timed out after {attempts} attempts")]
    Timeout { attempts: u32 },

    #[error("Kestra execution returned no outputs")]
    NoOutputs,

    #[error("Kestra outputs missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
}

impl EngineError {
    pub fn is_flow_not_found(&self) -> bool {
        matches!(self, EngineError::FlowNotFound(_))
    }
}

/// Runs one review execution to completion. Outputs come back as the
/// engine sent them; defaults are left to the caller.
#[async_trait]
pub trait WorkflowEngine: Send + Sync {
    async fn run(&self, inputs: &EngineInputs) -> Result<EngineOutputs, EngineError>;
}

/// REST client for Kestra executions: start, then poll until terminal.
pub struct KestraClient {
    http: reqwest::Client,
    options: EngineOptions,
}

impl KestraClient {
    pub fn new(options: EngineOptions) -> Result<Self, EngineError> {
        let http = reqwest::Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(|e| EngineError::Request(e.to_string()))?;
        Ok(Self { http, options })
    }

    fn endpoint(&self, tail: &[&str]) -> Result<Url, EngineError> {
        let mut url = Url::parse(&self.options.api_url)
            .map_err(|e| EngineError::Request(format!("invalid API URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| EngineError::Request("API URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["api", "v1", "executions"])
            .extend(tail);
        Ok(url)
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.options.api_key {
            Some(key) => builder.header("Authorization", format!("ApiKey {key}")),
            None => builder,
        }
    }

    /// POST the execution and return its id.
    async fn start(&self, inputs: &EngineInputs) -> Result<String, EngineError> {
        let url = self.endpoint(&[self.options.namespace.as_str(), self.options.flow_id.as_str()])?;
        info!(%url, "creating execution");

        let response = self
            .request(self.http.post(url.clone()))
            .json(&json!({ "inputs": inputs }))
            .send()
            .await
            .map_err(|e| {
                warn!(%url, error = %e, "create execution failed");
                EngineError::Request(e.to_string())
            })?;

        let status = response.status();
        debug!(%status, "create execution responded");
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Err(EngineError::Auth),
            StatusCode::NOT_FOUND => {
                return Err(EngineError::FlowNotFound(
                    "Kestra flow not found. Make sure workflow is uploaded to Kestra and the namespace/flow id are correct."
                        .to_string(),
                ))
            }
            s if !s.is_success() => {
                return Err(EngineError::Request(format!("create execution returned {s}")))
            }
            _ => {}
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| EngineError::Request(e.to_string()))?;
        execution_id(&body).ok_or(EngineError::MissingExecutionId)
    }

    /// GET one snapshot of the execution.
    async fn poll(&self, execution_id: &str) -> Result<Value, EngineError> {
        let url = self.endpoint(&[execution_id])?;
        let response = self
            .request(self.http.get(url))
            .send()
            .await
            .map_err(|e| EngineError::Request(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(EngineError::FlowNotFound(
                "Kestra execution not found".to_string(),
            )),
            s if !s.is_success() => Err(EngineError::Request(format!("poll returned {s}"))),
            _ => response
                .json()
                .await
                .map_err(|e| EngineError::Request(e.to_string())),
        }
    }
}

/// The id may sit at the top level or under `data`, as `id` or `executionId`.
fn execution_id(body: &Value) -> Option<String> {
    ["/id", "/executionId", "/data/id", "/data/executionId"]
        .iter()
        .find_map(|ptr| match body.pointer(ptr)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

fn finish(execution: &Value) -> Result<EngineOutputs, EngineError> {
    let outputs = execution
        .get("outputs")
        .filter(|o| !o.is_null())
        .ok_or(EngineError::NoOutputs)?;
    let outputs = EngineOutputs::from_value(outputs);
    let missing = outputs.missing_core_fields();
    if !missing.is_empty() {
        return Err(EngineError::MissingFields(missing));
    }
    Ok(outputs)
}

#[async_trait]
impl WorkflowEngine for KestraClient {
    #[instrument(skip(self, inputs), fields(flow = %self.options.flow_id, pr = inputs.pr_number))]
    async fn run(&self, inputs: &EngineInputs) -> Result<EngineOutputs, EngineError> {
        let execution_id = self.start(inputs).await?;
        info!(%execution_id, "execution started");

        let max_attempts = self.options.max_attempts();
        for attempt in 1..=max_attempts {
            match self.poll(&execution_id).await {
                Ok(execution) => {
                    let state = execution
                        .pointer("/state/current")
                        .and_then(Value::as_str)
                        .unwrap_or("UNKNOWN");
                    info!(state, attempt, max_attempts, "polled execution");
                    match state {
                        "SUCCESS" => return finish(&execution),
                        "FAILED" | "KILLED" | "KILLING" => {
                            return Err(EngineError::ExecutionFailed {
                                state: state.to_string(),
                            })
                        }
                        _ => {}
                    }
                }
                Err(err) if err.is_flow_not_found() => return Err(err),
                Err(err) => warn!(attempt, error = %err, "transient poll failure"),
            }
            if attempt < max_attempts {
                tokio::time::sleep(self.options.poll_interval).await;
            }
        }

        Err(EngineError::Timeout {
            attempts: max_attempts,
        })
    }
}
