//! Database operations for the `activities` audit log.

use chrono::{DateTime, Utc};
use orderdesk_core::NewActivity;
use sqlx::PgConnection;

use crate::DbError;

/// A row from the `activities` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ActivityRow {
    pub id: i64,
    pub entity_type: String,
    pub entity_id: i64,
    pub action: String,
    pub actor_user_id: Option<i64>,
    pub metadata: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Append one activity entry.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_activity(
    conn: &mut PgConnection,
    activity: &NewActivity,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO activities (entity_type, entity_id, action, actor_user_id, metadata) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(activity.entity_type)
    .bind(activity.entity_id)
    .bind(activity.action)
    .bind(activity.actor_user_id)
    .bind(&activity.metadata)
    .execute(conn)
    .await?;

    Ok(())
}

/// Entries for one entity, oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_activities_for(
    conn: &mut PgConnection,
    entity_type: &str,
    entity_id: i64,
) -> Result<Vec<ActivityRow>, DbError> {
    let rows = sqlx::query_as::<_, ActivityRow>(
        "SELECT id, entity_type, entity_id, action, actor_user_id, metadata, created_at \
         FROM activities WHERE entity_type = $1 AND entity_id = $2 ORDER BY id",
    )
    .bind(entity_type)
    .bind(entity_id)
    .fetch_all(conn)
    .await?;

    Ok(rows)
}
