//! Database operations for `stores`.

use chrono::NaiveDate;
use orderdesk_core::{LeadInsert, NewLeadStore, StoreCandidate, StoreRecord, StoreStatus};
use sqlx::{PgConnection, PgPool};

use crate::DbError;

const STORE_COLUMNS: &str = "id, company_name, normalized_name, email, phone, status, \
                             flagged_for_review, owner_user_id, last_order_date";

/// A row from the `stores` table, restricted to the columns the importer reads.
///
/// `status` is kept as text here and validated when converting to
/// [`StoreRecord`].
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoreRow {
    pub id: i64,
    pub company_name: String,
    pub normalized_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: String,
    pub flagged_for_review: bool,
    pub owner_user_id: Option<i64>,
    pub last_order_date: Option<NaiveDate>,
}

impl TryFrom<StoreRow> for StoreRecord {
    type Error = DbError;

    fn try_from(row: StoreRow) -> Result<Self, Self::Error> {
        Ok(StoreRecord {
            id: row.id,
            company_name: row.company_name,
            normalized_name: row.normalized_name,
            email: row.email,
            phone: row.phone,
            status: row.status.parse::<StoreStatus>()?,
            flagged_for_review: row.flagged_for_review,
            owner_user_id: row.owner_user_id,
            last_order_date: row.last_order_date,
        })
    }
}

fn into_records(rows: Vec<StoreRow>) -> Result<Vec<StoreRecord>, DbError> {
    rows.into_iter().map(StoreRecord::try_from).collect()
}

/// Stores whose `normalized_name` equals `normalized_name`, lowest id first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or [`DbError::Core`] if a
/// row carries an unknown status.
pub async fn find_stores_by_normalized_name(
    conn: &mut PgConnection,
    normalized_name: &str,
) -> Result<Vec<StoreRecord>, DbError> {
    let rows = sqlx::query_as::<_, StoreRow>(&format!(
        "SELECT {STORE_COLUMNS} FROM stores WHERE normalized_name = $1 ORDER BY id"
    ))
    .bind(normalized_name)
    .fetch_all(conn)
    .await?;

    into_records(rows)
}

/// `(id, normalized_name)` for every store, lowest id first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_store_candidates(
    conn: &mut PgConnection,
) -> Result<Vec<StoreCandidate>, DbError> {
    let rows: Vec<(i64, String)> =
        sqlx::query_as("SELECT id, normalized_name FROM stores ORDER BY id")
            .fetch_all(conn)
            .await?;

    Ok(rows
        .into_iter()
        .map(|(id, normalized_name)| StoreCandidate {
            id,
            normalized_name,
        })
        .collect())
}

/// Stores whose email equals `email`, ignoring case.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or [`DbError::Core`] if a
/// row carries an unknown status.
pub async fn find_stores_by_email(
    conn: &mut PgConnection,
    email: &str,
) -> Result<Vec<StoreRecord>, DbError> {
    let rows = sqlx::query_as::<_, StoreRow>(&format!(
        "SELECT {STORE_COLUMNS} FROM stores WHERE LOWER(email) = LOWER($1) ORDER BY id"
    ))
    .bind(email)
    .fetch_all(conn)
    .await?;

    into_records(rows)
}

/// Stores whose phone, stripped to digits, equals `digits`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or [`DbError::Core`] if a
/// row carries an unknown status.
pub async fn find_stores_by_phone_digits(
    conn: &mut PgConnection,
    digits: &str,
) -> Result<Vec<StoreRecord>, DbError> {
    let rows = sqlx::query_as::<_, StoreRow>(&format!(
        "SELECT {STORE_COLUMNS} FROM stores \
         WHERE REGEXP_REPLACE(phone, '\\D', '', 'g') = $1 ORDER BY id"
    ))
    .bind(digits)
    .fetch_all(conn)
    .await?;

    into_records(rows)
}

const INSERT_LEAD: &str = "INSERT INTO stores \
         (company_name, normalized_name, email, phone, address1, city, province, \
          postal_code, status, flagged_for_review, owner_user_id, notes) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'lead', TRUE, $9, $10)";

/// Insert a lead store, or return the lead that already holds its
/// normalized name.
///
/// Relies on the partial unique index over `normalized_name` for lead rows:
/// when a concurrent transaction inserted the same lead first, this insert
/// waits for it, does nothing, and the existing id is read back instead.
/// Placeholder leads fall outside that index and are always inserted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either statement fails, or
/// [`DbError::NotFound`] if the conflicting lead vanished before it could be
/// read.
pub async fn insert_lead_store(
    conn: &mut PgConnection,
    lead: &NewLeadStore,
) -> Result<LeadInsert, DbError> {
    let sql = if lead.is_placeholder() {
        format!("{INSERT_LEAD} RETURNING id")
    } else {
        format!(
            "{INSERT_LEAD} \
             ON CONFLICT (normalized_name) \
                 WHERE status = 'lead' AND normalized_name NOT IN ('', 'unknown store') \
             DO NOTHING RETURNING id"
        )
    };

    let inserted: Option<i64> = sqlx::query_scalar(&sql)
        .bind(&lead.company_name)
        .bind(&lead.normalized_name)
        .bind(&lead.email)
        .bind(&lead.phone)
        .bind(&lead.address1)
        .bind(&lead.city)
        .bind(&lead.province)
        .bind(&lead.postal_code)
        .bind(lead.owner_user_id)
        .bind(&lead.notes)
        .fetch_optional(&mut *conn)
        .await?;

    if let Some(id) = inserted {
        return Ok(LeadInsert::Created(id));
    }

    let existing: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM stores WHERE normalized_name = $1 AND status = 'lead' ORDER BY id LIMIT 1",
    )
    .bind(&lead.normalized_name)
    .fetch_optional(&mut *conn)
    .await?;

    existing.map(LeadInsert::Existing).ok_or(DbError::NotFound)
}

/// Raise `last_order_date` to `order_date` unless it is already later.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn touch_last_order_date(
    conn: &mut PgConnection,
    store_id: i64,
    order_date: NaiveDate,
) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE stores SET \
             last_order_date = GREATEST(COALESCE(last_order_date, $2), $2), \
             updated_at      = NOW() \
         WHERE id = $1",
    )
    .bind(store_id)
    .bind(order_date)
    .execute(conn)
    .await?;

    Ok(())
}

/// Lead stores still waiting for review, oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or [`DbError::Core`] if a
/// row carries an unknown status.
pub async fn list_flagged_leads(pool: &PgPool) -> Result<Vec<StoreRecord>, DbError> {
    let rows = sqlx::query_as::<_, StoreRow>(&format!(
        "SELECT {STORE_COLUMNS} FROM stores \
         WHERE status = 'lead' AND flagged_for_review ORDER BY id"
    ))
    .fetch_all(pool)
    .await?;

    into_records(rows)
}
