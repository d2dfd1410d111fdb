use serde_json::Value;

use super::AnalyzeError;
use crate::pr::PrUrl;

const URL_FORMAT_HINT: &str =
    "Invalid GitHub URL format. Expected: https://github.com/owner/repo or /pull/123";

/// One inbound analyze call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub pr_url: String,
    pub demo_mode: bool,
}

impl AnalysisRequest {
    pub fn new(pr_url: impl Into<String>, demo_mode: bool) -> Self {
        Self {
            pr_url: pr_url.into(),
            demo_mode,
        }
    }

    /// Parse a raw request body. A body that is not JSON is treated as an
    /// empty object, so it fails the `prUrl` check rather than the parser.
    pub fn from_body(body: &[u8]) -> Result<Self, AnalyzeError> {
        let value = serde_json::from_slice::<Value>(body).unwrap_or(Value::Null);
        Self::from_value(&value)
    }

    /// `prUrl` must be a non-empty string. Either `demoMode: true` or the
    /// legacy `demo: true` requests demo mode.
    pub fn from_value(body: &Value) -> Result<Self, AnalyzeError> {
        let pr_url = body
            .get("prUrl")
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
            .ok_or(AnalyzeError::InvalidRequest)?;
        let flag = |key: &str| body.get(key).and_then(Value::as_bool) == Some(true);
        Ok(Self::new(pr_url, flag("demoMode") || flag("demo")))
    }
}

/// Find `github.com/{owner}/{repo}` anywhere in the URL, with an optional
/// `/pull/{n}` (or `/pulls/{n}`) after it. Without a PR number the first PR
/// is assumed.
pub fn parse_pr_ref(url: &str) -> Result<PrUrl, AnalyzeError> {
    let invalid = || AnalyzeError::InvalidUrl(URL_FORMAT_HINT.to_string());

    let (_, rest) = url.split_once("github.com/").ok_or_else(invalid)?;
    let mut segments = rest.split('/');
    let owner = segments.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
    let repo = segments.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;

    let pr_number = match (segments.next(), segments.next()) {
        (Some("pull" | "pulls"), Some(number)) => {
            let digits: String = number.chars().take_while(char::is_ascii_digit).collect();
            if digits.is_empty() {
                1
            } else {
                digits.parse::<u64>().map_err(|_| invalid())?
            }
        }
        _ => 1,
    };

    Ok(PrUrl {
        owner: owner.to_string(),
        repo: repo.to_string(),
        pr_number,
    })
}
