//! Create-or-replace of one order keyed by its external `order_id`.

use orderdesk_core::{Actor, NewActivity, OrderRepository, ParsedOrder};

pub const ORDER_ENTITY: &str = "order";
pub const ACTION_IMPORTED: &str = "order_imported";
pub const ACTION_UPDATED: &str = "order_updated";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertKind {
    Created,
    Updated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Upserted {
    /// Internal id of the persisted order.
    pub id: i64,
    pub kind: UpsertKind,
}

/// Persist `order` against `store_id`.
///
/// An order already known by `order_id` has its scalar fields overwritten,
/// is re-linked to `store_id`, and has its line items replaced wholesale.
/// Otherwise the order and its items are created. Either way the store's
/// last order date is advanced and an activity entry is recorded.
///
/// # Errors
///
/// Propagates any repository error unchanged; the caller's unit of work must
/// then be rolled back.
pub async fn upsert_order<R: OrderRepository>(
    repo: &mut R,
    store_id: i64,
    order: &ParsedOrder,
    actor: &Actor,
) -> Result<Upserted, R::Error> {
    let upserted = match repo.find_order_by_external_id(&order.order_id).await? {
        Some(existing) => {
            repo.update_order(existing.id, store_id, order).await?;
            if existing.store_id != store_id {
                tracing::debug!(
                    order_id = %order.order_id,
                    from_store = existing.store_id,
                    to_store = store_id,
                    "order re-linked to a different store"
                );
            }
            Upserted {
                id: existing.id,
                kind: UpsertKind::Updated,
            }
        }
        None => Upserted {
            id: repo.insert_order(store_id, order).await?,
            kind: UpsertKind::Created,
        },
    };

    repo.replace_line_items(upserted.id, &order.line_items).await?;
    repo.touch_store_last_order(store_id, order.order_date).await?;
    repo.record_activity(&NewActivity {
        entity_type: ORDER_ENTITY,
        entity_id: upserted.id,
        action: match upserted.kind {
            UpsertKind::Created => ACTION_IMPORTED,
            UpsertKind::Updated => ACTION_UPDATED,
        },
        actor_user_id: actor.user_id,
        metadata: order.status.clone(),
    })
    .await?;

    Ok(upserted)
}
