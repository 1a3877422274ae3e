//! [`OrderRepository`] over a single Postgres transaction.

use chrono::NaiveDate;
use orderdesk_core::{
    LeadInsert, LineItem, NewActivity, NewLeadStore, OrderRecord, OrderRepository, ParsedOrder,
    StoreCandidate, StoreRecord,
};
use sqlx::{PgPool, Postgres, Transaction};

use crate::{activities, orders, stores, DbError};

/// One import run's unit of work.
///
/// Nothing written through the repository is visible to other connections
/// until [`commit`](Self::commit). Dropping it without committing rolls the
/// transaction back.
pub struct PgOrderRepository {
    tx: Transaction<'static, Postgres>,
}

impl PgOrderRepository {
    /// Open a transaction on `pool`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlx`] if no connection can be acquired.
    pub async fn begin(pool: &PgPool) -> Result<Self, DbError> {
        Ok(Self {
            tx: pool.begin().await?,
        })
    }

    /// # Errors
    ///
    /// Returns [`DbError::Sqlx`] if the commit fails.
    pub async fn commit(self) -> Result<(), DbError> {
        self.tx.commit().await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`DbError::Sqlx`] if the rollback fails.
    pub async fn rollback(self) -> Result<(), DbError> {
        self.tx.rollback().await?;
        Ok(())
    }
}

impl OrderRepository for PgOrderRepository {
    type Error = DbError;

    async fn find_stores_by_normalized_name(
        &mut self,
        normalized_name: &str,
    ) -> Result<Vec<StoreRecord>, DbError> {
        stores::find_stores_by_normalized_name(&mut self.tx, normalized_name).await
    }

    async fn list_store_candidates(&mut self) -> Result<Vec<StoreCandidate>, DbError> {
        stores::list_store_candidates(&mut self.tx).await
    }

    async fn find_stores_by_email(&mut self, email: &str) -> Result<Vec<StoreRecord>, DbError> {
        stores::find_stores_by_email(&mut self.tx, email).await
    }

    async fn find_stores_by_phone_digits(
        &mut self,
        digits: &str,
    ) -> Result<Vec<StoreRecord>, DbError> {
        stores::find_stores_by_phone_digits(&mut self.tx, digits).await
    }

    async fn create_lead_store(&mut self, lead: &NewLeadStore) -> Result<LeadInsert, DbError> {
        stores::insert_lead_store(&mut self.tx, lead).await
    }

    async fn find_order_by_external_id(
        &mut self,
        order_id: &str,
    ) -> Result<Option<OrderRecord>, DbError> {
        orders::find_order_by_external_id(&mut self.tx, order_id).await
    }

    async fn insert_order(&mut self, store_id: i64, order: &ParsedOrder) -> Result<i64, DbError> {
        orders::insert_order(&mut self.tx, store_id, order).await
    }

    async fn update_order(
        &mut self,
        id: i64,
        store_id: i64,
        order: &ParsedOrder,
    ) -> Result<(), DbError> {
        orders::update_order(&mut self.tx, id, store_id, order).await
    }

    async fn replace_line_items(
        &mut self,
        order_id: i64,
        items: &[LineItem],
    ) -> Result<(), DbError> {
        orders::replace_order_items(&mut self.tx, order_id, items).await
    }

    async fn touch_store_last_order(
        &mut self,
        store_id: i64,
        order_date: NaiveDate,
    ) -> Result<(), DbError> {
        stores::touch_last_order_date(&mut self.tx, store_id, order_date).await
    }

    async fn record_activity(&mut self, activity: &NewActivity) -> Result<(), DbError> {
        activities::insert_activity(&mut self.tx, activity).await
    }
}
