use std::io::Read;

use orderdesk_core::{normalize_company_name, Actor, OrderRepository, ParsedOrder};
use uuid::Uuid;

use crate::error::ImportError;
use crate::matcher::{MatcherConfig, StoreMatcher};
use crate::registrar::{LeadRegistrar, LeadResolution};
use crate::schema::{parse_order, OrderFile};
use crate::summary::{ImportOutcome, ImportSummary, OutcomeKind, RunAggregator};
use crate::upsert::{upsert_order, UpsertKind};

pub const MISSING_ORDER_ID: &str = "missing order_id";
pub const NO_LINE_ITEMS: &str = "no line items parsed";

/// Import one complete order export through `repo`.
///
/// Rows are processed in file order. A row that fails to parse is recorded as
/// an error and the run continues; a repository failure ends the run. `repo`
/// is expected to be a single unit of work: the caller commits it after an
/// `Ok` and rolls it back otherwise.
///
/// # Errors
///
/// Returns a structural [`ImportError`] if the header is unusable, before
/// anything is written, or [`ImportError::Persistence`] if the repository
/// fails partway through.
pub async fn import_orders<R, I>(
    repo: &mut R,
    input: I,
    actor: &Actor,
    config: &MatcherConfig,
) -> Result<ImportSummary, ImportError>
where
    R: OrderRepository,
    I: Read,
{
    let file = OrderFile::open(input)?;
    let encoding = file.line_item_encoding();
    let run_id = Uuid::new_v4();

    tracing::info!(
        %run_id,
        columns = file.headers().len(),
        ?encoding,
        actor_role = %actor.role,
        fuzzy_threshold = config.fuzzy_threshold,
        "order import started"
    );

    let mut run = RowPipeline {
        matcher: StoreMatcher::new(*config),
        registrar: LeadRegistrar::new(*actor),
        aggregator: RunAggregator::new(run_id),
        actor: *actor,
    };

    for (row, raw) in file.into_rows() {
        let parsed = raw.and_then(|raw| parse_order(&raw, encoding));
        let outcome = match parsed {
            Err(e) => {
                tracing::warn!(row, error = %e, "row rejected");
                ImportOutcome::error(row, e.to_string())
            }
            Ok(None) => {
                tracing::warn!(row, "row skipped: {MISSING_ORDER_ID}");
                ImportOutcome::skipped(row, MISSING_ORDER_ID)
            }
            Ok(Some(order)) => run.import_row(repo, row, &order).await?,
        };
        run.aggregator.record(outcome);
    }

    let summary = run.aggregator.finish();
    tracing::info!(
        %run_id,
        total_rows = summary.total_rows,
        created = summary.created,
        updated = summary.updated,
        skipped = summary.skipped,
        errored = summary.errored,
        new_leads = summary.new_lead_store_ids.len(),
        "order import finished"
    );
    Ok(summary)
}

struct RowPipeline {
    matcher: StoreMatcher,
    registrar: LeadRegistrar,
    aggregator: RunAggregator,
    actor: Actor,
}

impl RowPipeline {
    async fn import_row<R: OrderRepository>(
        &mut self,
        repo: &mut R,
        row: usize,
        order: &ParsedOrder,
    ) -> Result<ImportOutcome, ImportError> {
        let matched = self
            .matcher
            .match_store(repo, &order.billing)
            .await
            .map_err(|e| ImportError::persistence(row, e))?;
        self.aggregator.record_match(matched.method);

        let store_id = if let Some(id) = matched.store_id {
            tracing::debug!(
                row,
                order_id = %order.order_id,
                store_id = id,
                method = %matched.method,
                confidence = ?matched.confidence,
                "matched store"
            );
            id
        } else {
            let lead = self
                .registrar
                .resolve(repo, &order.billing)
                .await
                .map_err(|e| ImportError::persistence(row, e))?;
            if let LeadResolution::Created(id) = lead {
                self.aggregator.record_new_lead(id);
            }
            if let Some(company) = order.billing.company.as_deref() {
                self.matcher
                    .remember_store(lead.store_id(), &normalize_company_name(company));
            }
            lead.store_id()
        };

        let upserted = upsert_order(repo, store_id, order, &self.actor)
            .await
            .map_err(|e| ImportError::persistence(row, e))?;

        let kind = match upserted.kind {
            UpsertKind::Created => OutcomeKind::Created,
            UpsertKind::Updated => OutcomeKind::Updated,
        };
        let outcome = ImportOutcome::imported(row, kind);

        if order.line_items.is_empty() {
            tracing::warn!(row, order_id = %order.order_id, "{NO_LINE_ITEMS}");
            return Ok(outcome.with_warning(NO_LINE_ITEMS));
        }
        Ok(outcome)
    }
}
