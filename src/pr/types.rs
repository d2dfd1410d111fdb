use serde::Serialize;

/// What the reviewer needs to know about a pull request.
/// Built from three GitHub reads: metadata, raw diff and file list.
#[derive(Debug, Clone, Default)]
pub struct PrFacts {
    /// PR title
    pub title: String,
    /// Author's GitHub login
    pub author: String,
    /// Unified diff text as returned by the diff media type
    pub diff_text: String,
    /// Changed files as listed by the files endpoint
    pub files: Vec<PrFile>,
}

/// One entry of `GET /repos/{owner}/{repo}/pulls/{n}/files`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrFile {
    /// File path (e.g., "src/auth/config.rs")
    pub path: String,
    /// GitHub status: added, modified, removed, renamed...
    pub status: String,
}

/// Represents the parsed components of a GitHub PR URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrUrl {
    pub owner: String,
    pub repo: String,
    pub pr_number: u64,
}

impl PrUrl {
    /// `owner/repo`
    pub fn repository(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// `https://github.com/{owner}/{repo}/pull/{n}`
    pub fn canonical(&self) -> String {
        format!(
            "https://github.com/{}/{}/pull/{}",
            self.owner, self.repo, self.pr_number
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pr_url_canonical_form() {
        let url = PrUrl {
            owner: "org".to_string(),
            repo: "repo".to_string(),
            pr_number: 42,
        };
        assert_eq!(url.repository(), "org/repo");
        assert_eq!(url.canonical(), "https://github.com/org/repo/pull/42");
    }
}
