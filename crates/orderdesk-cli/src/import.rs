//! `orderdesk import`: one file, one transaction.

use std::fmt::Write as _;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context;
use orderdesk_core::Actor;
use orderdesk_db::PgOrderRepository;
use orderdesk_import::{import_orders, ImportSummary, MatcherConfig};

#[derive(Debug, Clone, Copy)]
pub(crate) struct ImportOptions {
    pub actor: Actor,
    pub fuzzy_threshold: f64,
    pub dry_run: bool,
    pub json: bool,
}

/// Import `path` and print the summary.
///
/// The run is committed only when the pipeline returns a summary and
/// `dry_run` is off; every other path rolls back.
///
/// # Errors
///
/// Returns an error if the file cannot be opened, the header is unusable, or
/// the database fails at any point.
pub(crate) async fn run_import(
    pool: &sqlx::PgPool,
    path: &Path,
    options: &ImportOptions,
) -> anyhow::Result<()> {
    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let matcher = MatcherConfig {
        fuzzy_threshold: options.fuzzy_threshold,
    };

    let mut repo = PgOrderRepository::begin(pool).await?;
    let summary =
        match import_orders(&mut repo, BufReader::new(file), &options.actor, &matcher).await {
            Ok(summary) => summary,
            Err(e) => {
                if let Err(rollback) = repo.rollback().await {
                    tracing::warn!(error = %rollback, "rollback after failed import also failed");
                }
                return Err(e).with_context(|| format!("import of {} failed", path.display()));
            }
        };

    if options.dry_run {
        repo.rollback().await?;
    } else {
        repo.commit().await?;
    }

    if options.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", format_summary(&summary, options.dry_run));
    }
    Ok(())
}

/// Human-readable report of one run.
pub(crate) fn format_summary(summary: &ImportSummary, dry_run: bool) -> String {
    let mut out = String::new();
    let heading = if dry_run {
        "Import preview (rolled back)"
    } else {
        "Import complete"
    };

    let _ = writeln!(out, "{heading}: run {}", summary.run_id);
    let _ = writeln!(
        out,
        "  rows {}  created {}  updated {}  skipped {}  errors {}",
        summary.total_rows, summary.created, summary.updated, summary.skipped, summary.errored
    );
    let m = &summary.matches;
    let _ = writeln!(
        out,
        "  matched by name {}  fuzzy {}  email {}  phone {}  unmatched {}",
        m.exact_name, m.fuzzy_name, m.email, m.phone, m.none
    );

    if !summary.new_lead_store_ids.is_empty() {
        let ids: Vec<String> = summary
            .new_lead_store_ids
            .iter()
            .map(ToString::to_string)
            .collect();
        let _ = writeln!(out, "  new leads for review: {}", ids.join(", "));
    }

    for issue in &summary.errors {
        let _ = writeln!(out, "  error   row {:>5}: {}", issue.row, issue.reason);
    }
    for issue in &summary.warnings {
        let _ = writeln!(out, "  warning row {:>5}: {}", issue.row, issue.reason);
    }

    out
}

#[cfg(test)]
#[path = "import_test.rs"]
mod tests;
