use std::{fmt, path::PathBuf};

use anyhow::{Context, Result};

use crate::types::{MatchPolicy, Repo};

pub const DEFAULT_CHANGELOG: &str = "CHANGELOG.md";

/// Environment variable GitHub Actions sets to `owner/repo`.
pub const REPOSITORY_VAR: &str = "GITHUB_REPOSITORY";

/// A non-empty API token. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn new(raw: impl AsRef<str>) -> Result<Self> {
        let token = raw.as_ref().trim();
        if token.is_empty() {
            anyhow::bail!("GitHub token is empty");
        }
        Ok(Self(token.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

/// Where pull requests are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Api { token: Token },
    File(PathBuf),
}

/// Validated settings for one run.
#[derive(Debug, Clone)]
pub struct Config {
    pub repo: Repo,
    pub changelog: PathBuf,
    pub source: Source,
    pub policy: MatchPolicy,
    pub dry_run: bool,
}

/// Picks the repository from the command line, falling back to the
/// environment.
pub fn resolve_repo(flag: Option<&str>, env: Option<&str>) -> Result<Repo> {
    match (flag, env) {
        (Some(repo), _) => {
            Repo::parse(repo).with_context(|| format!("Invalid repository format '{repo}'"))
        }
        (None, Some(repo)) if !repo.trim().is_empty() => Repo::parse(repo)
            .with_context(|| format!("Invalid repository in {REPOSITORY_VAR}: '{repo}'")),
        _ => anyhow::bail!(
            "Repository is required: pass --repo OWNER/REPO or set {REPOSITORY_VAR}"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_rejects_blank() {
        assert!(Token::new("").is_err());
        assert!(Token::new("  \n").is_err());
        assert_eq!(Token::new(" ghp_abc\n").unwrap().expose(), "ghp_abc");
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token = Token::new("ghp_secret").unwrap();
        assert!(!format!("{token:?}").contains("secret"));
    }

    #[test]
    fn test_resolve_repo_prefers_flag() {
        let repo = resolve_repo(Some("a/b"), Some("c/d")).unwrap();
        assert_eq!(repo.to_string(), "a/b");
    }

    #[test]
    fn test_resolve_repo_falls_back_to_env() {
        let repo = resolve_repo(None, Some("c/d")).unwrap();
        assert_eq!(repo.to_string(), "c/d");
    }

    #[test]
    fn test_resolve_repo_missing() {
        let err = resolve_repo(None, None).unwrap_err();
        assert!(err.to_string().contains("Repository is required"));
        assert!(resolve_repo(None, Some("")).is_err());
        assert!(resolve_repo(Some("bad"), None).is_err());
    }
}
