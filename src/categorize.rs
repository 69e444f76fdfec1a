use crate::types::{Category, ChangeEntry, Changes, MatchPolicy, PullRequest};

/// Picks the category a pull request is filed under.
pub fn categorize(pr: &PullRequest, policy: MatchPolicy) -> Category {
    let matched = match policy {
        MatchPolicy::CategoryOrder => Category::ALL
            .into_iter()
            .find(|category| pr.has_label(category.label())),
        MatchPolicy::LabelOrder => pr.labels.iter().find_map(|label| Category::from_label(label)),
    };
    matched.unwrap_or(Category::Other)
}

/// Groups pull requests by category, keeping input order within each one.
pub fn categorize_changes(prs: &[PullRequest], policy: MatchPolicy) -> Changes {
    let mut changes = Changes::new();
    for pr in prs {
        changes.push(categorize(pr, policy), ChangeEntry::from_pull_request(pr));
    }
    changes
}
