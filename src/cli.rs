use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::{
    config::{Config, DEFAULT_CHANGELOG, REPOSITORY_VAR, Source, Token, resolve_repo},
    github::get_github_token,
    types::MatchPolicy,
};

const BUILD_INFO_HUMAN: &str = env!("BUILD_INFO_HUMAN");

#[derive(Parser, Debug)]
#[command(
    name = "changelog-updater",
    about = "Prepend a dated, categorized summary of recently merged pull requests to CHANGELOG.md"
)]
#[command(long_version = BUILD_INFO_HUMAN)]
struct CliArgs {
    /// GitHub repository as 'owner/repo' or a github.com URL (defaults to $GITHUB_REPOSITORY)
    #[arg(short = 'r', long, value_name = "OWNER/REPO")]
    pub repo: Option<String>,

    /// Changelog file to update
    #[arg(short = 'f', long, value_name = "PATH", default_value = DEFAULT_CHANGELOG)]
    pub changelog: PathBuf,

    /// Read pull requests from a saved API response instead of GitHub
    #[arg(long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Categorize by the first matching label rather than fixed category precedence
    #[arg(long = "label-order")]
    pub label_order: bool,

    /// Print the new section without modifying the changelog
    #[arg(short = 'n', long = "dry-run")]
    pub dry_run: bool,
}

fn build_config<T>(cli: CliArgs, env_repo: Option<&str>, token: T) -> Result<Config>
where
    T: FnOnce() -> Result<String>,
{
    let repo = resolve_repo(cli.repo.as_deref(), env_repo)?;

    // Only the live API needs credentials.
    let source = match cli.input {
        Some(path) => Source::File(path),
        None => Source::Api {
            token: Token::new(token()?)?,
        },
    };

    let policy = if cli.label_order {
        MatchPolicy::LabelOrder
    } else {
        MatchPolicy::CategoryOrder
    };

    Ok(Config {
        repo,
        changelog: cli.changelog,
        source,
        policy,
        dry_run: cli.dry_run,
    })
}

/// Parses command-line arguments into a validated [`Config`].
///
/// The repository falls back to `$GITHUB_REPOSITORY` and the token is
/// resolved from the environment or the gh CLI, so configuration problems
/// surface here rather than as a failed API call.
pub fn parse_args<I, T>(args: I) -> Result<Config>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = CliArgs::try_parse_from(args)?;
    let env_repo = std::env::var(REPOSITORY_VAR).ok();
    build_config(cli, env_repo.as_deref(), get_github_token)
}
