//! In-memory [`OrderRepository`] for tests and offline previews.
//!
//! [`MemoryStore`] holds committed state. [`MemoryStore::begin`] hands out a
//! [`MemoryTransaction`] that works on a private copy; nothing it writes is
//! visible in the store until [`MemoryTransaction::commit`]. Dropping the
//! transaction discards its writes, mirroring a rolled-back database
//! transaction. Transactions are not isolated from each other: the last
//! commit wins.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use chrono::NaiveDate;
use orderdesk_core::{
    normalize_company_name, phone_digits, LeadInsert, LineItem, NewActivity, NewLeadStore,
    OrderRecord, OrderRepository, ParsedOrder, StoreCandidate, StoreRecord, StoreStatus,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("write rejected for order {0}")]
    Rejected(String),
    #[error("order {0} not found")]
    OrderNotFound(i64),
}

/// A persisted order. `fields.line_items` is always empty; items live in
/// [`MemoryState::line_items`].
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryOrder {
    pub id: i64,
    pub store_id: i64,
    pub fields: ParsedOrder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryLineItem {
    pub order_id: i64,
    pub position: usize,
    pub item: LineItem,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub stores: Vec<StoreRecord>,
    pub orders: Vec<MemoryOrder>,
    pub line_items: Vec<MemoryLineItem>,
    pub activities: Vec<NewActivity>,
    next_store_id: i64,
    next_order_id: i64,
}

impl MemoryState {
    #[must_use]
    pub fn store(&self, id: i64) -> Option<&StoreRecord> {
        self.stores.iter().find(|s| s.id == id)
    }

    #[must_use]
    pub fn order_by_external_id(&self, order_id: &str) -> Option<&MemoryOrder> {
        self.orders.iter().find(|o| o.fields.order_id == order_id)
    }

    /// Line items of order `id`, in position order.
    #[must_use]
    pub fn items_for(&self, order_id: i64) -> Vec<&LineItem> {
        let mut items: Vec<&MemoryLineItem> = self
            .line_items
            .iter()
            .filter(|li| li.order_id == order_id)
            .collect();
        items.sort_by_key(|li| li.position);
        items.into_iter().map(|li| &li.item).collect()
    }

    #[must_use]
    pub fn lead_count(&self) -> usize {
        self.stores
            .iter()
            .filter(|s| s.status == StoreStatus::Lead)
            .count()
    }

    fn allocate_store_id(&mut self) -> i64 {
        self.next_store_id += 1;
        self.next_store_id
    }

    fn allocate_order_id(&mut self) -> i64 {
        self.next_order_id += 1;
        self.next_order_id
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    rejected_orders: Mutex<HashSet<String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an existing store directly into committed state.
    pub fn seed_store(
        &self,
        company_name: &str,
        email: Option<&str>,
        phone: Option<&str>,
        status: StoreStatus,
    ) -> i64 {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let id = state.allocate_store_id();
        state.stores.push(StoreRecord {
            id,
            company_name: company_name.to_string(),
            normalized_name: normalize_company_name(company_name),
            email: email.map(str::to_string),
            phone: phone.map(str::to_string),
            status,
            flagged_for_review: false,
            owner_user_id: None,
            last_order_date: None,
        });
        id
    }

    /// Make every write touching `order_id` fail, to exercise rollback.
    pub fn reject_writes_for_order(&self, order_id: &str) {
        self.rejected_orders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(order_id.to_string());
    }

    /// A copy of the committed state.
    #[must_use]
    pub fn snapshot(&self) -> MemoryState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn begin(&self) -> MemoryTransaction<'_> {
        MemoryTransaction {
            store: self,
            working: self.snapshot(),
            rejected_orders: self
                .rejected_orders
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
            candidate_scans: 0,
        }
    }
}

pub struct MemoryTransaction<'a> {
    store: &'a MemoryStore,
    working: MemoryState,
    rejected_orders: HashSet<String>,
    candidate_scans: usize,
}

impl MemoryTransaction<'_> {
    /// Publish this transaction's writes to the store.
    pub fn commit(self) {
        *self
            .store
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = self.working;
    }

    /// State as seen from inside the transaction, uncommitted writes included.
    #[must_use]
    pub fn state(&self) -> &MemoryState {
        &self.working
    }

    /// How many times the full candidate list has been read.
    #[must_use]
    pub fn candidate_scans(&self) -> usize {
        self.candidate_scans
    }

    fn check_writable(&self, order_id: &str) -> Result<(), MemoryError> {
        if self.rejected_orders.contains(order_id) {
            return Err(MemoryError::Rejected(order_id.to_string()));
        }
        Ok(())
    }

    fn stores_where(&self, predicate: impl Fn(&StoreRecord) -> bool) -> Vec<StoreRecord> {
        self.working
            .stores
            .iter()
            .filter(|s| predicate(s))
            .cloned()
            .collect()
    }
}

impl OrderRepository for MemoryTransaction<'_> {
    type Error = MemoryError;

    async fn find_stores_by_normalized_name(
        &mut self,
        normalized_name: &str,
    ) -> Result<Vec<StoreRecord>, MemoryError> {
        Ok(self.stores_where(|s| s.normalized_name == normalized_name))
    }

    async fn list_store_candidates(&mut self) -> Result<Vec<StoreCandidate>, MemoryError> {
        self.candidate_scans += 1;
        Ok(self
            .working
            .stores
            .iter()
            .map(|s| StoreCandidate {
                id: s.id,
                normalized_name: s.normalized_name.clone(),
            })
            .collect())
    }

    async fn find_stores_by_email(&mut self, email: &str) -> Result<Vec<StoreRecord>, MemoryError> {
        let email = email.to_lowercase();
        Ok(self.stores_where(|s| {
            s.email
                .as_deref()
                .is_some_and(|e| e.trim().to_lowercase() == email)
        }))
    }

    async fn find_stores_by_phone_digits(
        &mut self,
        digits: &str,
    ) -> Result<Vec<StoreRecord>, MemoryError> {
        Ok(self.stores_where(|s| s.phone.as_deref().is_some_and(|p| phone_digits(p) == digits)))
    }

    async fn create_lead_store(&mut self, lead: &NewLeadStore) -> Result<LeadInsert, MemoryError> {
        if !lead.is_placeholder() {
            if let Some(existing) = self.working.stores.iter().find(|s| {
                s.status == StoreStatus::Lead && s.normalized_name == lead.normalized_name
            }) {
                return Ok(LeadInsert::Existing(existing.id));
            }
        }

        let id = self.working.allocate_store_id();
        self.working.stores.push(StoreRecord {
            id,
            company_name: lead.company_name.clone(),
            normalized_name: lead.normalized_name.clone(),
            email: lead.email.clone(),
            phone: lead.phone.clone(),
            status: StoreStatus::Lead,
            flagged_for_review: true,
            owner_user_id: lead.owner_user_id,
            last_order_date: None,
        });
        Ok(LeadInsert::Created(id))
    }

    async fn find_order_by_external_id(
        &mut self,
        order_id: &str,
    ) -> Result<Option<OrderRecord>, MemoryError> {
        Ok(self
            .working
            .order_by_external_id(order_id)
            .map(|o| OrderRecord {
                id: o.id,
                store_id: o.store_id,
            }))
    }

    async fn insert_order(&mut self, store_id: i64, order: &ParsedOrder) -> Result<i64, MemoryError> {
        self.check_writable(&order.order_id)?;
        let id = self.working.allocate_order_id();
        self.working.orders.push(MemoryOrder {
            id,
            store_id,
            fields: ParsedOrder {
                line_items: Vec::new(),
                ..order.clone()
            },
        });
        Ok(id)
    }

    async fn update_order(
        &mut self,
        id: i64,
        store_id: i64,
        order: &ParsedOrder,
    ) -> Result<(), MemoryError> {
        self.check_writable(&order.order_id)?;
        let existing = self
            .working
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(MemoryError::OrderNotFound(id))?;
        existing.store_id = store_id;
        existing.fields = ParsedOrder {
            line_items: Vec::new(),
            ..order.clone()
        };
        Ok(())
    }

    async fn replace_line_items(
        &mut self,
        order_id: i64,
        items: &[LineItem],
    ) -> Result<(), MemoryError> {
        self.working.line_items.retain(|li| li.order_id != order_id);
        self.working
            .line_items
            .extend(items.iter().enumerate().map(|(position, item)| MemoryLineItem {
                order_id,
                position,
                item: item.clone(),
            }));
        Ok(())
    }

    async fn touch_store_last_order(
        &mut self,
        store_id: i64,
        order_date: NaiveDate,
    ) -> Result<(), MemoryError> {
        if let Some(store) = self.working.stores.iter_mut().find(|s| s.id == store_id) {
            store.last_order_date = Some(match store.last_order_date {
                Some(current) if current > order_date => current,
                _ => order_date,
            });
        }
        Ok(())
    }

    async fn record_activity(&mut self, activity: &NewActivity) -> Result<(), MemoryError> {
        self.working.activities.push(activity.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use orderdesk_core::BillingInfo;

    use super::*;

    #[tokio::test]
    async fn uncommitted_writes_are_discarded_on_drop() {
        let store = MemoryStore::new();
        {
            let mut tx = store.begin();
            let lead = NewLeadStore::from_billing(
                &BillingInfo {
                    company: Some("Smoke Signals".to_string()),
                    ..BillingInfo::default()
                },
                None,
            );
            tx.create_lead_store(&lead).await.unwrap();
            assert_eq!(tx.state().lead_count(), 1);
        }
        assert_eq!(store.snapshot().lead_count(), 0);
    }

    #[tokio::test]
    async fn committed_writes_are_visible() {
        let store = MemoryStore::new();
        let mut tx = store.begin();
        let lead = NewLeadStore::from_billing(&BillingInfo::default(), Some(4));
        let inserted = tx.create_lead_store(&lead).await.unwrap();
        tx.commit();

        let state = store.snapshot();
        let created = state.store(inserted.store_id()).unwrap();
        assert!(created.flagged_for_review);
        assert_eq!(created.owner_user_id, Some(4));
    }

    #[tokio::test]
    async fn second_lead_with_same_name_reuses_first() {
        let store = MemoryStore::new();
        let mut tx = store.begin();
        let lead = NewLeadStore::from_billing(
            &BillingInfo {
                company: Some("Puff Palace".to_string()),
                ..BillingInfo::default()
            },
            None,
        );
        let first = tx.create_lead_store(&lead).await.unwrap();
        let second = tx.create_lead_store(&lead).await.unwrap();
        assert!(matches!(first, LeadInsert::Created(_)));
        assert_eq!(second, LeadInsert::Existing(first.store_id()));
    }

    #[tokio::test]
    async fn placeholder_leads_are_never_merged() {
        let store = MemoryStore::new();
        let mut tx = store.begin();
        let lead = NewLeadStore::from_billing(&BillingInfo::default(), None);

        let first = tx.create_lead_store(&lead).await.unwrap();
        let second = tx.create_lead_store(&lead).await.unwrap();

        assert!(matches!(second, LeadInsert::Created(_)));
        assert_ne!(first.store_id(), second.store_id());
        assert_eq!(tx.state().lead_count(), 2);
    }

    #[tokio::test]
    async fn email_lookup_ignores_case() {
        let store = MemoryStore::new();
        let id = store.seed_store(
            "Cloud Nine",
            Some("Orders@CloudNine.ca"),
            None,
            StoreStatus::Active,
        );
        let mut tx = store.begin();
        let found = tx.find_stores_by_email("orders@cloudnine.ca").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, id);
    }
}
