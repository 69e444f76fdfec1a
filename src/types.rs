use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Owner and name of a GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repo {
    owner: String,
    name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoError {
    Empty,
    InvalidFormat(String),
    InvalidSegment(String),
    NotGitHubUrl(String),
}

impl fmt::Display for RepoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepoError::Empty => write!(f, "repository must not be empty"),
            RepoError::InvalidFormat(s) => {
                write!(f, "repository must be in format 'owner/repo', got: '{s}'")
            }
            RepoError::InvalidSegment(s) => {
                write!(f, "invalid owner or repository name: '{s}'")
            }
            RepoError::NotGitHubUrl(s) => {
                write!(f, "URL must point at a github.com repository, got: '{s}'")
            }
        }
    }
}

impl std::error::Error for RepoError {}

fn validate_segment(segment: &str) -> Result<(), RepoError> {
    if segment.is_empty() || segment.chars().any(|c| c.is_whitespace() || c == '/') {
        return Err(RepoError::InvalidSegment(segment.to_string()));
    }
    Ok(())
}

impl Repo {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Result<Self, RepoError> {
        let owner = owner.into();
        let name = name.into();
        validate_segment(&owner)?;
        validate_segment(&name)?;
        Ok(Self { owner, name })
    }

    /// Parses `owner/repo` or a `https://github.com/owner/repo[/...]` URL.
    pub fn parse(input: &str) -> Result<Self, RepoError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(RepoError::Empty);
        }

        if input.starts_with("https://") || input.starts_with("http://") {
            return Self::parse_url(input);
        }

        let parts: Vec<&str> = input.split('/').collect();
        if parts.len() != 2 {
            return Err(RepoError::InvalidFormat(input.to_string()));
        }
        Self::new(parts[0], parts[1])
    }

    fn parse_url(input: &str) -> Result<Self, RepoError> {
        let url =
            url::Url::parse(input).map_err(|_| RepoError::InvalidFormat(input.to_string()))?;

        if url.host_str() != Some("github.com") {
            return Err(RepoError::NotGitHubUrl(input.to_string()));
        }

        let mut segments = url
            .path_segments()
            .ok_or_else(|| RepoError::InvalidFormat(input.to_string()))?
            .filter(|s| !s.is_empty());

        match (segments.next(), segments.next()) {
            (Some(owner), Some(name)) => Self::new(owner, name.trim_end_matches(".git")),
            _ => Err(RepoError::InvalidFormat(input.to_string())),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Repo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A pull request as reported by the forge.
#[derive(Debug, Clone, PartialEq)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub url: String,
    pub labels: Vec<String>,
    pub merged_at: Option<DateTime<Utc>>,
}

impl PullRequest {
    pub fn is_merged(&self) -> bool {
        self.merged_at.is_some()
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

/// Changelog section a pull request is filed under.
///
/// Variant order is the order sections are rendered in, and also the
/// precedence used by [`MatchPolicy::CategoryOrder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Feature,
    Bug,
    Enhancement,
    Documentation,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Feature,
        Category::Bug,
        Category::Enhancement,
        Category::Documentation,
        Category::Other,
    ];

    /// The label that files a pull request under this category.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Feature => "feature",
            Category::Bug => "bug",
            Category::Enhancement => "enhancement",
            Category::Documentation => "documentation",
            Category::Other => "other",
        }
    }

    pub fn heading(&self) -> &'static str {
        match self {
            Category::Feature => "## 🚀 New Features",
            Category::Bug => "## 🐛 Bug Fixes",
            Category::Enhancement => "## ✨ Enhancements",
            Category::Documentation => "## 📚 Documentation",
            Category::Other => "## 🛠 Other Changes",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How a pull request carrying several category labels is resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchPolicy {
    /// Categories are tried in [`Category::ALL`] order, so the result does
    /// not depend on the order the forge returns labels in.
    #[default]
    CategoryOrder,
    /// The first label that names a category wins.
    LabelOrder,
}

/// One rendered changelog line: `- <title> [#<number>](<url>)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEntry(String);

impl ChangeEntry {
    pub fn from_pull_request(pr: &PullRequest) -> Self {
        Self(format!("- {} [#{}]({})", pr.title, pr.number, pr.url))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChangeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Change entries grouped by category. Every category is always present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Changes {
    buckets: [Vec<ChangeEntry>; Category::ALL.len()],
}

impl Default for Changes {
    fn default() -> Self {
        Self {
            buckets: std::array::from_fn(|_| Vec::new()),
        }
    }
}

impl Changes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, category: Category, entry: ChangeEntry) {
        self.buckets[category as usize].push(entry);
    }

    pub fn entries(&self, category: Category) -> &[ChangeEntry] {
        &self.buckets[category as usize]
    }

    /// Categories with their entries, in rendering order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &[ChangeEntry])> {
        Category::ALL
            .into_iter()
            .map(|category| (category, self.entries(category)))
    }

    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Source of pull requests for a repository.
#[async_trait]
pub trait Forge {
    /// Closed pull requests, most recently updated first, at most one page.
    async fn fetch_closed_pull_requests(&self, repo: &Repo) -> anyhow::Result<Vec<PullRequest>>;
}
