//! Lead creation for orders that matched no store.

use std::collections::HashMap;

use orderdesk_core::{Actor, BillingInfo, LeadInsert, NewLeadStore, OrderRepository};

/// How a lead was obtained for one order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadResolution {
    /// A new lead store was written in this run.
    Created(i64),
    /// An existing lead was reused: one created earlier in this run, or one a
    /// concurrent run created first.
    Reused(i64),
}

impl LeadResolution {
    #[must_use]
    pub fn store_id(self) -> i64 {
        match self {
            LeadResolution::Created(id) | LeadResolution::Reused(id) => id,
        }
    }
}

/// Creates lead stores and remembers them for the rest of the run, so repeated
/// unmatched companies collapse onto one lead.
///
/// The memory is keyed by normalized company name and lives exactly as long
/// as the registrar, which the pipeline creates once per run. Placeholder
/// leads for nameless orders are never remembered.
pub struct LeadRegistrar {
    actor: Actor,
    seen: HashMap<String, i64>,
}

impl LeadRegistrar {
    #[must_use]
    pub fn new(actor: Actor) -> Self {
        Self {
            actor,
            seen: HashMap::new(),
        }
    }

    /// Resolve `billing` to a lead store, creating one if this run has not
    /// seen the company before.
    ///
    /// # Errors
    ///
    /// Propagates any repository error unchanged.
    pub async fn resolve<R: OrderRepository>(
        &mut self,
        repo: &mut R,
        billing: &BillingInfo,
    ) -> Result<LeadResolution, R::Error> {
        let lead = NewLeadStore::from_billing(billing, self.actor.lead_owner());

        if let Some(&id) = self.seen.get(&lead.normalized_name) {
            tracing::debug!(store_id = id, company = %lead.company_name, "reusing lead from this run");
            return Ok(LeadResolution::Reused(id));
        }

        let resolution = match repo.create_lead_store(&lead).await? {
            LeadInsert::Created(id) => {
                tracing::info!(store_id = id, company = %lead.company_name, "created lead store");
                LeadResolution::Created(id)
            }
            LeadInsert::Existing(id) => {
                tracing::debug!(store_id = id, company = %lead.company_name, "lead already exists");
                LeadResolution::Reused(id)
            }
        };

        if !lead.is_placeholder() {
            self.seen.insert(lead.normalized_name, resolution.store_id());
        }
        Ok(resolution)
    }

    /// Number of distinct companies registered so far in this run.
    #[must_use]
    pub fn remembered(&self) -> usize {
        self.seen.len()
    }
}
