//! Changelog updater: prepends a summary of recently merged pull requests
//! to a repository's changelog.
//!
//! Closed pull requests are fetched from a [`Forge`], reduced to the merged
//! ones, grouped into a fixed set of [`Category`] buckets by label, and
//! rendered as a dated markdown section at the top of the changelog.

pub mod categorize;
pub mod changelog;
pub mod cli;
pub mod config;
pub mod fetch;
pub mod github;
pub mod json_file;
pub mod types;
pub mod update;

pub use categorize::{categorize, categorize_changes};
pub use changelog::{prepend_section, render_section};
pub use cli::parse_args;
pub use config::{Config, Source, Token};
pub use fetch::{fetch_merged_pull_requests, open_forge};
pub use github::GitHub;
pub use json_file::JsonFile;
pub use types::{
    Category, ChangeEntry, Changes, Forge, MatchPolicy, PullRequest, Repo, RepoError,
};
pub use update::{UpdateOutcome, update_changelog};
