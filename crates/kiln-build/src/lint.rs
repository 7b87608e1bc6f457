//! Terminal output for lint passes.

use colored::Colorize;
use kiln_lint::{Issue, LintReport};

/// Colored form of an issue line: `line L, col C<TAB><TAB>message [rule:code]`.
pub fn format_issue(issue: &Issue) -> String {
    format!(
        "{}\t\t{} {}",
        format!("line {}, col {}", issue.line, issue.column).white(),
        issue.message.red(),
        format!("[{}:{}]", issue.rule.id(), issue.rule.code()).white()
    )
}

/// Print every failing file with its issues, then a pass/fail summary.
pub fn print_report(report: &LintReport) {
    for file in report.failed_files() {
        let path = file.path.display().to_string();
        if let Some(error) = &file.error {
            tracing::error!("{} {}", "[lint]".cyan(), error);
            continue;
        }

        tracing::warn!("{} Error in {}", "[lint]".cyan(), path.magenta());
        for issue in &file.issues {
            println!("{}", format_issue(issue));
        }
    }

    if report.is_clean() {
        tracing::info!("{} [lint]", "Task completed successfully!".green());
    } else {
        tracing::error!(
            "{} {} issues in {} files ({} unreadable)",
            "Task failed!".red(),
            report.issue_count(),
            report.failed_files().count(),
            report.unreadable_count()
        );
    }
}
