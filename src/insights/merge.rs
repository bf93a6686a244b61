//! Folding per-repository reports into one multi-repository view.

use std::collections::BTreeMap;

use super::report::{BranchActivity, InsightsReport, PullActivity};

fn join_names(left: &str, right: &str) -> String {
    match (left.is_empty(), right.is_empty()) {
        (true, true) => String::new(),
        (true, false) => right.to_owned(),
        (false, true) => left.to_owned(),
        (false, false) => format!("{left}, {right}"),
    }
}

fn join_distinct(left: &str, right: &str) -> String {
    if left == right {
        return left.to_owned();
    }
    join_names(left, right)
}

fn merge_histograms(left: &mut BTreeMap<String, i64>, right: &BTreeMap<String, i64>) {
    for (login, count) in right {
        *left.entry(login.clone()).or_insert(0) += count;
    }
}

fn merge_branch_activity(left: &mut BranchActivity, right: &BranchActivity) {
    left.commits += right.commits;
    left.additions += right.additions;
    left.deletions += right.deletions;
    left.files_changed += right.files_changed;
    merge_histograms(&mut left.authors, &right.authors);
}

fn merge_pull_activity(left: &mut PullActivity, right: &PullActivity) {
    left.pulls += right.pulls;
    left.commits += right.commits;
    left.additions += right.additions;
    left.deletions += right.deletions;
    left.changed_files += right.changed_files;
    merge_histograms(&mut left.authors, &right.authors);
}

/// Merges `right` into `left`, field by field.
///
/// Lists concatenate with `left` entries first, counters sum, and author
/// histograms merge with summed counts. Repository names join with `", "`;
/// owners join only when they differ. The merged view always reads `main`
/// for its branch label because the per-repository default branches no
/// longer apply to a combined report.
#[must_use]
pub fn merge_reports(mut left: InsightsReport, right: &InsightsReport) -> InsightsReport {
    left.owner = join_distinct(&left.owner, &right.owner);
    left.repo = join_names(&left.repo, &right.repo);
    left.default_branch = "main".to_owned();

    left.open_pulls.extend(right.open_pulls.iter().cloned());
    left.merged_pulls.extend(right.merged_pulls.iter().cloned());
    left.closed_pulls.extend(right.closed_pulls.iter().cloned());
    left.open_issues.extend(right.open_issues.iter().cloned());
    left.closed_issues.extend(right.closed_issues.iter().cloned());
    left.unresolved_conversations
        .extend(right.unresolved_conversations.iter().cloned());
    left.releases.extend(right.releases.iter().cloned());

    merge_branch_activity(&mut left.main_branch, &right.main_branch);
    merge_pull_activity(&mut left.all_branches, &right.all_branches);

    left
}

/// Left-folds the reports into one view, starting from the empty report.
#[must_use]
pub fn summarize<I>(reports: I) -> InsightsReport
where
    I: IntoIterator<Item = InsightsReport>,
{
    reports
        .into_iter()
        .fold(InsightsReport::default(), |merged, report| {
            merge_reports(merged, &report)
        })
}
