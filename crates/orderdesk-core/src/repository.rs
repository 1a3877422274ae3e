//! Persistence seam for the order import pipeline.
//!
//! The pipeline only talks to storage through [`OrderRepository`]. A
//! repository instance represents one unit of work: the Postgres
//! implementation wraps a single transaction, so everything written through it
//! becomes visible together or not at all.

use std::future::Future;

use chrono::NaiveDate;

use crate::orders::{LineItem, NewActivity, OrderRecord, ParsedOrder};
use crate::stores::{NewLeadStore, StoreCandidate, StoreRecord};

/// Result of asking the repository to create a lead store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadInsert {
    /// A new lead row was written.
    Created(i64),
    /// A concurrent run already holds a lead with the same normalized name;
    /// that store is reused.
    Existing(i64),
}

impl LeadInsert {
    #[must_use]
    pub fn store_id(self) -> i64 {
        match self {
            LeadInsert::Created(id) | LeadInsert::Existing(id) => id,
        }
    }
}

pub trait OrderRepository: Send {
    type Error: std::error::Error + Send + Sync + 'static;

    /// All stores whose `normalized_name` equals `normalized_name`.
    fn find_stores_by_normalized_name(
        &mut self,
        normalized_name: &str,
    ) -> impl Future<Output = Result<Vec<StoreRecord>, Self::Error>> + Send;

    /// Every store's id and normalized name, for similarity scoring.
    fn list_store_candidates(
        &mut self,
    ) -> impl Future<Output = Result<Vec<StoreCandidate>, Self::Error>> + Send;

    /// Stores whose email equals `email`, compared case-insensitively.
    fn find_stores_by_email(
        &mut self,
        email: &str,
    ) -> impl Future<Output = Result<Vec<StoreRecord>, Self::Error>> + Send;

    /// Stores whose phone, reduced to digits, equals `digits`.
    fn find_stores_by_phone_digits(
        &mut self,
        digits: &str,
    ) -> impl Future<Output = Result<Vec<StoreRecord>, Self::Error>> + Send;

    fn create_lead_store(
        &mut self,
        lead: &NewLeadStore,
    ) -> impl Future<Output = Result<LeadInsert, Self::Error>> + Send;

    fn find_order_by_external_id(
        &mut self,
        order_id: &str,
    ) -> impl Future<Output = Result<Option<OrderRecord>, Self::Error>> + Send;

    /// Insert a new order attached to `store_id`, returning its internal id.
    fn insert_order(
        &mut self,
        store_id: i64,
        order: &ParsedOrder,
    ) -> impl Future<Output = Result<i64, Self::Error>> + Send;

    /// Overwrite every mutable field of order `id` and re-link it to `store_id`.
    fn update_order(
        &mut self,
        id: i64,
        store_id: i64,
        order: &ParsedOrder,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Delete all line items of order `id` and insert `items` in order.
    fn replace_line_items(
        &mut self,
        order_id: i64,
        items: &[LineItem],
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Raise the store's `last_order_date` to `order_date` if it is later.
    fn touch_store_last_order(
        &mut self,
        store_id: i64,
        order_date: NaiveDate,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    fn record_activity(
        &mut self,
        activity: &NewActivity,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
