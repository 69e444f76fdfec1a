use std::process::Command;

use anyhow::{Context, Result};
use async_trait::async_trait;
use octocrab::{Octocrab, params, service::middleware::retry::RetryConfig};
use tracing::debug;

use crate::{
    config::Token,
    types::{Forge, PullRequest, Repo},
};

/// Pull requests requested in the single page fetched per run.
pub const PAGE_SIZE: u8 = 100;

/// Environment variables checked for a token, in order.
pub const TOKEN_VARS: [&str; 2] = ["GITHUB_TOKEN", "GH_TOKEN"];

/// First non-blank token among [`TOKEN_VARS`].
fn token_from_vars<F>(lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    TOKEN_VARS
        .iter()
        .find_map(|var| lookup(var).filter(|token| !token.trim().is_empty()))
}

pub fn get_github_token() -> Result<String> {
    // Prefer environment variables over gh CLI to avoid subprocess overhead.
    if let Some(token) = token_from_vars(|var| std::env::var(var).ok()) {
        return Ok(token);
    }

    let output = Command::new("gh")
        .args(["auth", "token"])
        .output()
        .context("No GITHUB_TOKEN or GH_TOKEN set and the gh CLI could not be run")?;

    if !output.status.success() {
        anyhow::bail!("Failed to get GitHub token from gh CLI. Please run 'gh auth login' first");
    }

    Ok(String::from_utf8(output.stdout)?.trim().to_string())
}

/// The live GitHub REST API.
pub struct GitHub {
    client: Octocrab,
}

impl GitHub {
    pub fn new(token: &Token) -> Result<Self> {
        Self::connect(token, None)
    }

    /// Targets another API root, e.g. a GitHub Enterprise host or a test
    /// server.
    pub(crate) fn with_base_uri(token: &Token, base_uri: &str) -> Result<Self> {
        Self::connect(token, Some(base_uri))
    }

    fn connect(token: &Token, base_uri: Option<&str>) -> Result<Self> {
        // A failed listing aborts the run; octocrab would otherwise retry it.
        let mut builder = Octocrab::builder()
            .personal_token(token.expose().to_string())
            .add_retry_config(RetryConfig::None);

        if let Some(uri) = base_uri {
            builder = builder
                .base_uri(uri)
                .with_context(|| format!("Invalid GitHub API base URI '{uri}'"))?;
        }

        let client = builder.build().context("Failed to create GitHub client")?;
        Ok(Self { client })
    }
}

fn convert_pull_request(pr: octocrab::models::pulls::PullRequest) -> PullRequest {
    PullRequest {
        number: pr.number,
        title: pr.title.unwrap_or_default(),
        url: pr.html_url.map(|u| u.to_string()).unwrap_or_default(),
        labels: pr
            .labels
            .unwrap_or_default()
            .into_iter()
            .map(|label| label.name)
            .collect(),
        merged_at: pr.merged_at,
    }
}

#[async_trait]
impl Forge for GitHub {
    async fn fetch_closed_pull_requests(&self, repo: &Repo) -> Result<Vec<PullRequest>> {
        debug!(repo = %repo, per_page = PAGE_SIZE, "Listing closed pull requests");

        let page = self
            .client
            .pulls(repo.owner(), repo.name())
            .list()
            .state(params::State::Closed)
            .sort(params::pulls::Sort::Updated)
            .direction(params::Direction::Descending)
            .per_page(PAGE_SIZE)
            .send()
            .await
            .with_context(|| format!("Failed to list pull requests for {repo}"))?;

        Ok(page.items.into_iter().map(convert_pull_request).collect())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header_exists, method, path, query_param},
    };

    use super::*;

    fn token() -> Token {
        Token::new("ghp_test").unwrap()
    }

    fn repo() -> Repo {
        Repo::new("o", "r").unwrap()
    }

    fn ref_json(name: &str) -> serde_json::Value {
        json!({"label": format!("o:{name}"), "ref": name, "sha": "0123456789abcdef"})
    }

    fn pull_json(number: u64, labels: &[&str], merged_at: Option<&str>) -> serde_json::Value {
        let labels: Vec<serde_json::Value> = labels
            .iter()
            .enumerate()
            .map(|(i, name)| {
                json!({
                    "id": i + 1,
                    "node_id": format!("LA_{i}"),
                    "url": format!("https://api.github.com/repos/o/r/labels/{name}"),
                    "name": name,
                    "description": null,
                    "color": "ededed",
                    "default": false
                })
            })
            .collect();

        json!({
            "url": format!("https://api.github.com/repos/o/r/pulls/{number}"),
            "id": 1000 + number,
            "node_id": format!("PR_{number}"),
            "html_url": format!("https://github.com/o/r/pull/{number}"),
            "number": number,
            "state": "closed",
            "locked": false,
            "title": format!("Change {number}"),
            "labels": labels,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-02T00:00:00Z",
            "closed_at": "2024-01-02T00:00:00Z",
            "merged_at": merged_at,
            "head": ref_json("topic"),
            "base": ref_json("main")
        })
    }

    #[test]
    fn test_blank_token_variable_is_skipped() {
        let token = token_from_vars(|var| match var {
            "GITHUB_TOKEN" => Some("  ".to_string()),
            "GH_TOKEN" => Some("ghp_fallback".to_string()),
            _ => None,
        });
        assert_eq!(token.as_deref(), Some("ghp_fallback"));
    }

    #[test]
    fn test_github_token_variable_wins() {
        let token = token_from_vars(|var| Some(format!("{var}_value")));
        assert_eq!(token.as_deref(), Some("GITHUB_TOKEN_value"));
        assert_eq!(token_from_vars(|_| None), None);
    }

    #[tokio::test]
    async fn test_lists_closed_pull_requests_newest_first() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/o/r/pulls"))
            .and(query_param("state", "closed"))
            .and(query_param("sort", "updated"))
            .and(query_param("direction", "desc"))
            .and(query_param("per_page", "100"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                pull_json(12, &["bug", "feature"], Some("2024-01-02T00:00:00Z")),
                pull_json(11, &[], None),
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let github = GitHub::with_base_uri(&token(), &server.uri()).unwrap();
        let prs = github.fetch_closed_pull_requests(&repo()).await.unwrap();

        assert_eq!(prs.len(), 2);
        assert_eq!(prs[0].number, 12);
        assert_eq!(prs[0].title, "Change 12");
        assert_eq!(prs[0].url, "https://github.com/o/r/pull/12");
        assert_eq!(prs[0].labels, vec!["bug".to_string(), "feature".to_string()]);
        assert!(prs[0].is_merged());
        assert_eq!(prs[1].number, 11);
        assert!(prs[1].labels.is_empty());
        assert!(!prs[1].is_merged());
    }

    #[tokio::test]
    async fn test_server_error_fails_without_retrying() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/o/r/pulls"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({"message": "Server Error"})),
            )
            .mount(&server)
            .await;

        let github = GitHub::with_base_uri(&token(), &server.uri()).unwrap();
        let err = github
            .fetch_closed_pull_requests(&repo())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("o/r"));
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
    }

    #[tokio::test]
    async fn test_not_found_is_fatal() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/o/r/pulls"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "message": "Not Found",
                "documentation_url": "https://docs.github.com/rest"
            })))
            .mount(&server)
            .await;

        let github = GitHub::with_base_uri(&token(), &server.uri()).unwrap();
        assert!(github.fetch_closed_pull_requests(&repo()).await.is_err());
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }
}
