use orderdesk_import::{MatchCounts, RowIssue};
use uuid::Uuid;

use super::*;

fn summary() -> ImportSummary {
    ImportSummary {
        run_id: Uuid::nil(),
        total_rows: 4,
        created: 1,
        updated: 1,
        skipped: 1,
        errored: 1,
        errors: vec![RowIssue {
            row: 3,
            reason: "total: invalid amount \"ten\"".to_string(),
        }],
        warnings: vec![RowIssue {
            row: 4,
            reason: "missing order_id".to_string(),
        }],
        new_lead_store_ids: vec![17, 18],
        matches: MatchCounts {
            exact_name: 1,
            fuzzy_name: 1,
            ..MatchCounts::default()
        },
    }
}

#[test]
fn report_lists_counts_and_issues() {
    let report = format_summary(&summary(), false);

    assert!(report.starts_with("Import complete"));
    assert!(report.contains("created 1  updated 1  skipped 1  errors 1"));
    assert!(report.contains("new leads for review: 17, 18"));
    assert!(report.contains("row     3: total: invalid amount"));
    assert!(report.contains("warning row     4: missing order_id"));
}

#[test]
fn dry_run_report_says_rolled_back() {
    let report = format_summary(&summary(), true);
    assert!(report.starts_with("Import preview (rolled back)"));
}

#[test]
fn report_omits_lead_line_when_none_created() {
    let mut s = summary();
    s.new_lead_store_ids.clear();
    assert!(!format_summary(&s, false).contains("new leads"));
}
