//! Database operations for `orders` and `order_items`.

use orderdesk_core::{LineItem, OrderRecord, ParsedOrder};
use rust_decimal::Decimal;
use sqlx::PgConnection;

use crate::DbError;

/// A row from the `order_items` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderItemRow {
    pub id: i64,
    pub order_id: i64,
    pub position: i32,
    pub sku: Option<String>,
    pub product_name: String,
    pub category: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    /// Generated column: `quantity * unit_price`.
    pub line_total: Decimal,
    pub nicotine_mg: Option<Decimal>,
    pub puff_count: Option<i32>,
    pub ice_level: Option<String>,
}

/// Look up an order by its storefront id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_order_by_external_id(
    conn: &mut PgConnection,
    external_id: &str,
) -> Result<Option<OrderRecord>, DbError> {
    let row: Option<(i64, i64)> =
        sqlx::query_as("SELECT id, store_id FROM orders WHERE external_id = $1")
            .bind(external_id)
            .fetch_optional(conn)
            .await?;

    Ok(row.map(|(id, store_id)| OrderRecord { id, store_id }))
}

/// Insert a new order row attached to `store_id`. Line items are written
/// separately by [`replace_order_items`].
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails, including a unique
/// violation on `external_id`.
pub async fn insert_order(
    conn: &mut PgConnection,
    store_id: i64,
    order: &ParsedOrder,
) -> Result<i64, DbError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO orders \
             (external_id, store_id, order_date, subtotal, shipping_total, discount_total, \
              tax_total, excise_tax, total, payment_method, status, raw_payload) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
         RETURNING id",
    )
    .bind(&order.order_id)
    .bind(store_id)
    .bind(order.order_date)
    .bind(order.subtotal)
    .bind(order.shipping_total)
    .bind(order.discount_total)
    .bind(order.tax_total)
    .bind(order.excise_tax)
    .bind(order.total)
    .bind(&order.payment_method)
    .bind(&order.status)
    .bind(&order.raw_payload)
    .fetch_one(conn)
    .await?;

    Ok(id)
}

/// Overwrite the mutable fields of order `id` and re-link it to `store_id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no order has that id, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_order(
    conn: &mut PgConnection,
    id: i64,
    store_id: i64,
    order: &ParsedOrder,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE orders SET \
             store_id       = $2, \
             order_date     = $3, \
             subtotal       = $4, \
             shipping_total = $5, \
             discount_total = $6, \
             tax_total      = $7, \
             excise_tax     = $8, \
             total          = $9, \
             payment_method = $10, \
             status         = $11, \
             raw_payload    = $12, \
             updated_at     = NOW() \
         WHERE id = $1",
    )
    .bind(id)
    .bind(store_id)
    .bind(order.order_date)
    .bind(order.subtotal)
    .bind(order.shipping_total)
    .bind(order.discount_total)
    .bind(order.tax_total)
    .bind(order.excise_tax)
    .bind(order.total)
    .bind(&order.payment_method)
    .bind(&order.status)
    .bind(&order.raw_payload)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Delete every item of `order_id` and insert `items` in their place, in
/// one `UNNEST` round-trip.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either statement fails.
pub async fn replace_order_items(
    conn: &mut PgConnection,
    order_id: i64,
    items: &[LineItem],
) -> Result<(), DbError> {
    sqlx::query("DELETE FROM order_items WHERE order_id = $1")
        .bind(order_id)
        .execute(&mut *conn)
        .await?;

    if items.is_empty() {
        return Ok(());
    }

    let mut positions: Vec<i32> = Vec::with_capacity(items.len());
    let mut skus: Vec<Option<String>> = Vec::with_capacity(items.len());
    let mut names: Vec<String> = Vec::with_capacity(items.len());
    let mut categories: Vec<Option<String>> = Vec::with_capacity(items.len());
    let mut quantities: Vec<i32> = Vec::with_capacity(items.len());
    let mut prices: Vec<Decimal> = Vec::with_capacity(items.len());
    let mut strengths: Vec<Option<Decimal>> = Vec::with_capacity(items.len());
    let mut puffs: Vec<Option<i32>> = Vec::with_capacity(items.len());
    let mut ice_levels: Vec<Option<String>> = Vec::with_capacity(items.len());

    for (position, item) in (1_i32..).zip(items) {
        positions.push(position);
        skus.push(item.sku.clone());
        names.push(item.product_name.clone());
        categories.push(item.category.clone());
        quantities.push(item.quantity);
        prices.push(item.unit_price);
        strengths.push(item.nicotine_mg);
        puffs.push(item.puff_count);
        ice_levels.push(item.ice_level.clone());
    }

    sqlx::query(
        "INSERT INTO order_items \
             (order_id, position, sku, product_name, category, quantity, unit_price, \
              nicotine_mg, puff_count, ice_level) \
         SELECT $1, * FROM UNNEST(\
             $2::int4[], $3::text[], $4::text[], $5::text[], $6::int4[], $7::numeric[], \
             $8::numeric[], $9::int4[], $10::text[])",
    )
    .bind(order_id)
    .bind(&positions)
    .bind(&skus)
    .bind(&names)
    .bind(&categories)
    .bind(&quantities)
    .bind(&prices)
    .bind(&strengths)
    .bind(&puffs)
    .bind(&ice_levels)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Items of `order_id` in file order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_order_items(
    conn: &mut PgConnection,
    order_id: i64,
) -> Result<Vec<OrderItemRow>, DbError> {
    let rows = sqlx::query_as::<_, OrderItemRow>(
        "SELECT id, order_id, position, sku, product_name, category, quantity, unit_price, \
                line_total, nicotine_mg, puff_count, ice_level \
         FROM order_items WHERE order_id = $1 ORDER BY position",
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;

    Ok(rows)
}
