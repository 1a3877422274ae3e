//! Per-row outcomes and the run summary they fold into.

use serde::Serialize;
use uuid::Uuid;

use crate::matcher::MatchMethod;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Created,
    Updated,
    Skipped,
    Error,
}

impl std::fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutcomeKind::Created => write!(f, "created"),
            OutcomeKind::Updated => write!(f, "updated"),
            OutcomeKind::Skipped => write!(f, "skipped"),
            OutcomeKind::Error => write!(f, "error"),
        }
    }
}

/// What happened to one data row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOutcome {
    pub row: usize,
    pub kind: OutcomeKind,
    /// Why the row was skipped or failed. `None` for created/updated rows.
    pub reason: Option<String>,
    /// Non-fatal notes about a row that was otherwise imported.
    pub warnings: Vec<String>,
}

impl ImportOutcome {
    #[must_use]
    pub fn imported(row: usize, kind: OutcomeKind) -> Self {
        Self {
            row,
            kind,
            reason: None,
            warnings: Vec::new(),
        }
    }

    #[must_use]
    pub fn skipped(row: usize, reason: impl Into<String>) -> Self {
        Self {
            row,
            kind: OutcomeKind::Skipped,
            reason: Some(reason.into()),
            warnings: Vec::new(),
        }
    }

    #[must_use]
    pub fn error(row: usize, reason: impl Into<String>) -> Self {
        Self {
            row,
            kind: OutcomeKind::Error,
            reason: Some(reason.into()),
            warnings: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowIssue {
    pub row: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MatchCounts {
    pub exact_name: usize,
    pub fuzzy_name: usize,
    pub email: usize,
    pub phone: usize,
    pub none: usize,
}

impl MatchCounts {
    fn bump(&mut self, method: MatchMethod) {
        let slot = match method {
            MatchMethod::ExactName => &mut self.exact_name,
            MatchMethod::FuzzyName => &mut self.fuzzy_name,
            MatchMethod::Email => &mut self.email,
            MatchMethod::Phone => &mut self.phone,
            MatchMethod::None => &mut self.none,
        };
        *slot += 1;
    }
}

/// Result of one import run.
///
/// Every data row is counted exactly once:
/// `created + updated + skipped + errored == total_rows`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub run_id: Uuid,
    pub total_rows: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errored: usize,
    pub errors: Vec<RowIssue>,
    pub warnings: Vec<RowIssue>,
    pub new_lead_store_ids: Vec<i64>,
    pub matches: MatchCounts,
}

impl ImportSummary {
    /// Sum of the per-kind counters.
    #[must_use]
    pub fn accounted_rows(&self) -> usize {
        self.created + self.updated + self.skipped + self.errored
    }
}

/// Folds row outcomes into an [`ImportSummary`].
pub struct RunAggregator {
    summary: ImportSummary,
}

impl RunAggregator {
    #[must_use]
    pub fn new(run_id: Uuid) -> Self {
        Self {
            summary: ImportSummary {
                run_id,
                total_rows: 0,
                created: 0,
                updated: 0,
                skipped: 0,
                errored: 0,
                errors: Vec::new(),
                warnings: Vec::new(),
                new_lead_store_ids: Vec::new(),
                matches: MatchCounts::default(),
            },
        }
    }

    pub fn record(&mut self, outcome: ImportOutcome) {
        let s = &mut self.summary;
        s.total_rows += 1;

        match outcome.kind {
            OutcomeKind::Created => s.created += 1,
            OutcomeKind::Updated => s.updated += 1,
            OutcomeKind::Skipped => s.skipped += 1,
            OutcomeKind::Error => s.errored += 1,
        }

        if let Some(reason) = outcome.reason {
            let issue = RowIssue {
                row: outcome.row,
                reason,
            };
            if outcome.kind == OutcomeKind::Error {
                s.errors.push(issue);
            } else {
                s.warnings.push(issue);
            }
        }

        s.warnings
            .extend(outcome.warnings.into_iter().map(|reason| RowIssue {
                row: outcome.row,
                reason,
            }));
    }

    pub fn record_match(&mut self, method: MatchMethod) {
        self.summary.matches.bump(method);
    }

    pub fn record_new_lead(&mut self, store_id: i64) {
        self.summary.new_lead_store_ids.push(store_id);
    }

    #[must_use]
    pub fn finish(self) -> ImportSummary {
        debug_assert_eq!(self.summary.accounted_rows(), self.summary.total_rows);
        self.summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_every_kind_once() {
        let mut agg = RunAggregator::new(Uuid::nil());
        agg.record(ImportOutcome::imported(1, OutcomeKind::Created));
        agg.record(ImportOutcome::imported(2, OutcomeKind::Updated));
        agg.record(ImportOutcome::skipped(3, "missing order_id"));
        agg.record(ImportOutcome::error(4, "total: invalid amount \"x\""));
        agg.record(ImportOutcome::error(5, "malformed record"));

        let summary = agg.finish();
        assert_eq!(summary.total_rows, 5);
        assert_eq!(summary.created, 1);
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.errored, 2);
        assert_eq!(summary.accounted_rows(), summary.total_rows);
    }

    #[test]
    fn errors_and_warnings_keep_row_indices() {
        let mut agg = RunAggregator::new(Uuid::nil());
        agg.record(ImportOutcome::error(7, "order_date: unrecognized date"));
        agg.record(ImportOutcome::skipped(8, "missing order_id"));
        agg.record(
            ImportOutcome::imported(9, OutcomeKind::Created).with_warning("no line items parsed"),
        );

        let summary = agg.finish();
        assert_eq!(
            summary.errors,
            vec![RowIssue {
                row: 7,
                reason: "order_date: unrecognized date".to_string()
            }]
        );
        let warned: Vec<usize> = summary.warnings.iter().map(|w| w.row).collect();
        assert_eq!(warned, vec![8, 9]);
    }

    #[test]
    fn match_counts_by_method() {
        let mut agg = RunAggregator::new(Uuid::nil());
        agg.record_match(MatchMethod::ExactName);
        agg.record_match(MatchMethod::FuzzyName);
        agg.record_match(MatchMethod::FuzzyName);
        agg.record_match(MatchMethod::None);

        let matches = agg.finish().matches;
        assert_eq!(matches.exact_name, 1);
        assert_eq!(matches.fuzzy_name, 2);
        assert_eq!(matches.email, 0);
        assert_eq!(matches.none, 1);
    }

    #[test]
    fn summary_serializes_kinds_and_ids() {
        let mut agg = RunAggregator::new(Uuid::nil());
        agg.record(ImportOutcome::imported(1, OutcomeKind::Created));
        agg.record_new_lead(42);

        let json = serde_json::to_value(agg.finish()).unwrap();
        assert_eq!(json["created"], 1);
        assert_eq!(json["new_lead_store_ids"][0], 42);
        assert_eq!(json["matches"]["fuzzy_name"], 0);
        assert_eq!(json["run_id"], "00000000-0000-0000-0000-000000000000");
    }
}
