use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::types::{Forge, PullRequest, Repo};

// Subset of the REST `GET /repos/{owner}/{repo}/pulls` response.
#[derive(Debug, Deserialize)]
struct ApiPullRequest {
    number: u64,
    title: Option<String>,
    html_url: Option<String>,
    labels: Option<Vec<ApiLabel>>,
    merged_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct ApiLabel {
    name: String,
}

impl From<ApiPullRequest> for PullRequest {
    fn from(pr: ApiPullRequest) -> Self {
        PullRequest {
            number: pr.number,
            title: pr.title.unwrap_or_default(),
            url: pr.html_url.unwrap_or_default(),
            labels: pr
                .labels
                .unwrap_or_default()
                .into_iter()
                .map(|label| label.name)
                .collect(),
            merged_at: pr.merged_at,
        }
    }
}

/// Parses a pull-request listing as returned by the GitHub REST API.
pub fn parse_pull_requests(json: &str) -> Result<Vec<PullRequest>> {
    let prs: Vec<ApiPullRequest> =
        serde_json::from_str(json).context("Invalid pull request listing")?;
    Ok(prs.into_iter().map(PullRequest::from).collect())
}

/// A saved API response on disk, e.g. from
/// `gh api 'repos/OWNER/REPO/pulls?state=closed&sort=updated&direction=desc&per_page=100'`.
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Forge for JsonFile {
    async fn fetch_closed_pull_requests(&self, repo: &Repo) -> Result<Vec<PullRequest>> {
        debug!(repo = %repo, path = %self.path.display(), "Reading pull requests from file");

        let json = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        parse_pull_requests(&json)
            .with_context(|| format!("Failed to parse {}", self.path.display()))
    }
}
