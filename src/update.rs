use anyhow::Result;
use chrono::NaiveDate;
use tracing::info;

use crate::{
    categorize::categorize_changes,
    changelog::{prepend_section, render_section},
    config::Config,
    fetch::fetch_merged_pull_requests,
    types::{Changes, Forge},
};

/// What a run produced.
#[derive(Debug)]
pub struct UpdateOutcome {
    pub changes: Changes,
    pub section: String,
    pub written: bool,
}

/// Fetches merged pull requests, groups them and prepends a section dated
/// `today` to the configured changelog.
///
/// The changelog is only touched once everything before it has succeeded,
/// and not at all on a dry run.
pub async fn update_changelog<F>(
    config: &Config,
    forge: &F,
    today: NaiveDate,
) -> Result<UpdateOutcome>
where
    F: Forge + Sync + ?Sized,
{
    let merged = fetch_merged_pull_requests(forge, &config.repo).await?;
    let changes = categorize_changes(&merged, config.policy);
    let section = render_section(&changes, today);

    if !config.dry_run {
        prepend_section(&config.changelog, &section)?;
    }

    info!(
        repo = %config.repo,
        changelog = %config.changelog.display(),
        entries = changes.len(),
        dry_run = config.dry_run,
        "Changelog section rendered"
    );

    Ok(UpdateOutcome {
        changes,
        section,
        written: !config.dry_run,
    })
}
