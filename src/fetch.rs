use anyhow::Result;
use tracing::debug;

use crate::{
    config::Source,
    github::GitHub,
    json_file::JsonFile,
    types::{Forge, PullRequest, Repo},
};

/// Opens the forge a configured source describes.
pub fn open_forge(source: &Source) -> Result<Box<dyn Forge + Send + Sync>> {
    Ok(match source {
        Source::Api { token } => Box::new(GitHub::new(token)?),
        Source::File(path) => Box::new(JsonFile::new(path)),
    })
}

/// Fetches closed pull requests and keeps the merged ones, preserving the
/// forge's order.
pub async fn fetch_merged_pull_requests<F>(forge: &F, repo: &Repo) -> Result<Vec<PullRequest>>
where
    F: Forge + Sync + ?Sized,
{
    let closed = forge.fetch_closed_pull_requests(repo).await?;
    let total = closed.len();

    let merged: Vec<PullRequest> = closed.into_iter().filter(PullRequest::is_merged).collect();

    debug!(
        repo = %repo,
        closed = total,
        merged = merged.len(),
        "Filtered closed pull requests"
    );

    Ok(merged)
}
