//! Output formatting for the insights report.

use std::collections::BTreeMap;
use std::io::Write;

use chrono::{DateTime, Utc};

use crate::github::SyncError;
use crate::insights::InsightsReport;
use crate::store::{IssueRecord, ReleaseRecord};

fn io_error(error: &std::io::Error) -> SyncError {
    SyncError::Io {
        message: error.to_string(),
    }
}

fn format_date(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m-%d").to_string()
}

fn top_entries(histogram: &BTreeMap<String, i64>, cap: usize) -> Vec<(&str, i64)> {
    let mut entries: Vec<(&str, i64)> = histogram
        .iter()
        .map(|(login, count)| (login.as_str(), *count))
        .collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    entries.truncate(cap);
    entries
}

fn write_histogram<W: Write>(
    writer: &mut W,
    label: &str,
    histogram: &BTreeMap<String, i64>,
    cap: usize,
) -> Result<(), SyncError> {
    if histogram.is_empty() {
        return Ok(());
    }
    writeln!(writer, "  {label}:").map_err(|e| io_error(&e))?;
    for (login, count) in top_entries(histogram, cap) {
        writeln!(writer, "    {login}: {count}").map_err(|e| io_error(&e))?;
    }
    Ok(())
}

fn write_issue_section<W: Write>(
    writer: &mut W,
    heading: &str,
    items: &[IssueRecord],
    timestamp: impl Fn(&IssueRecord) -> Option<DateTime<Utc>>,
    cap: usize,
) -> Result<(), SyncError> {
    if items.is_empty() {
        return Ok(());
    }

    let mut sorted: Vec<&IssueRecord> = items.iter().collect();
    sorted.sort_by_key(|record| std::cmp::Reverse(timestamp(record)));
    sorted.truncate(cap);

    writeln!(writer, "{heading}:").map_err(|e| io_error(&e))?;
    for record in sorted {
        let author = record.author.as_deref().unwrap_or("unknown");
        let date = timestamp(record).map_or_else(|| "-".to_owned(), format_date);
        writeln!(
            writer,
            "  #{} {} (@{author}, {date})",
            record.number, record.title
        )
        .map_err(|e| io_error(&e))?;
    }
    writeln!(writer).map_err(|e| io_error(&e))
}

fn write_releases<W: Write>(
    writer: &mut W,
    releases: &[ReleaseRecord],
    cap: usize,
) -> Result<(), SyncError> {
    if releases.is_empty() {
        return Ok(());
    }

    let mut sorted: Vec<&ReleaseRecord> = releases.iter().collect();
    sorted.sort_by_key(|record| std::cmp::Reverse(record.published_at));
    sorted.truncate(cap);

    writeln!(writer, "Releases:").map_err(|e| io_error(&e))?;
    for release in sorted {
        let label = release.name.as_deref().unwrap_or(&release.tag);
        let author = release.author.as_deref().unwrap_or("unknown");
        let date = release
            .published_at
            .map_or_else(|| "-".to_owned(), format_date);
        writeln!(writer, "  {label} published {date} by {author}").map_err(|e| io_error(&e))?;
    }
    writeln!(writer).map_err(|e| io_error(&e))
}

/// Writes the merged report as plain text, listing at most `show` entries
/// per section.
///
/// # Errors
///
/// Returns [`SyncError::Io`] when the writer fails.
pub fn write_report<W: Write>(
    writer: &mut W,
    report: &InsightsReport,
    days: u32,
    show: usize,
) -> Result<(), SyncError> {
    writeln!(
        writer,
        "Insights for {owner} ({repo}) over the last {days} days",
        owner = report.owner,
        repo = report.repo,
    )
    .map_err(|e| io_error(&e))?;
    writeln!(writer).map_err(|e| io_error(&e))?;

    writeln!(
        writer,
        "Pull requests: {open} open, {merged} merged, {closed} closed",
        open = report.open_pulls.len(),
        merged = report.merged_pulls.len(),
        closed = report.closed_pulls.len(),
    )
    .map_err(|e| io_error(&e))?;
    writeln!(
        writer,
        "Issues: {opened} opened, {closed} closed, {unresolved} unresolved conversations",
        opened = report.open_issues.len(),
        closed = report.closed_issues.len(),
        unresolved = report.unresolved_conversations.len(),
    )
    .map_err(|e| io_error(&e))?;
    writeln!(writer).map_err(|e| io_error(&e))?;

    let main_branch = &report.main_branch;
    writeln!(
        writer,
        "{branch} branch: {commits} commits, +{additions} -{deletions} lines, {files} files changed",
        branch = report.default_branch,
        commits = main_branch.commits,
        additions = main_branch.additions,
        deletions = main_branch.deletions,
        files = main_branch.files_changed,
    )
    .map_err(|e| io_error(&e))?;
    write_histogram(writer, "Top committers", &main_branch.authors, show)?;
    writeln!(writer).map_err(|e| io_error(&e))?;

    let all_branches = &report.all_branches;
    writeln!(
        writer,
        "All branches: {pulls} PRs, {commits} commits, +{additions} -{deletions} lines, {files} files changed",
        pulls = all_branches.pulls,
        commits = all_branches.commits,
        additions = all_branches.additions,
        deletions = all_branches.deletions,
        files = all_branches.changed_files,
    )
    .map_err(|e| io_error(&e))?;
    write_histogram(writer, "Top authors", &all_branches.authors, show)?;
    writeln!(writer).map_err(|e| io_error(&e))?;

    write_releases(writer, &report.releases, show)?;
    write_issue_section(
        writer,
        "Opened PRs",
        &report.open_pulls,
        |record| Some(record.created_at),
        show,
    )?;
    write_issue_section(
        writer,
        "Merged PRs",
        &report.merged_pulls,
        |record| record.merged_at,
        show,
    )?;
    write_issue_section(
        writer,
        "Opened issues",
        &report.open_issues,
        |record| Some(record.created_at),
        show,
    )?;
    write_issue_section(
        writer,
        "Closed issues",
        &report.closed_issues,
        |record| record.closed_at,
        show,
    )?;
    write_issue_section(
        writer,
        "Unresolved conversations",
        &report.unresolved_conversations,
        |record| Some(record.updated_at),
        show,
    )?;

    Ok(())
}
