use crate::db::DatabaseError;
use crate::types::push::{StoredSubscription, Subscription};

use rusqlite::{Connection, params};

/// Inserts or re-activates the subscription; the serialized payload is the
/// uniqueness key together with the professional.
pub fn save_subscription(
    conn: &Connection,
    professional_id: i64,
    subscription: &Subscription,
    device: Option<&str>,
) -> Result<i64, DatabaseError> {
    let payload = serde_json::to_string(subscription)?;
    let id = conn.query_row(
        "INSERT INTO suscripciones_push (profesional_id, subscription, dispositivo, activa)
         VALUES (?1, ?2, ?3, 1)
         ON CONFLICT (profesional_id, subscription)
         DO UPDATE SET dispositivo = excluded.dispositivo, activa = 1
         RETURNING id",
        params![professional_id, payload, device],
        |row| row.get(0),
    )?;
    Ok(id)
}

pub fn active_subscriptions(
    conn: &Connection,
    professional_id: i64,
) -> Result<Vec<StoredSubscription>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, subscription, dispositivo
         FROM suscripciones_push
         WHERE profesional_id = ?1 AND activa = 1
         ORDER BY id",
    )?;
    let rows = stmt.query_map(params![professional_id], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, Option<String>>(2)?,
        ))
    })?;

    let mut subscriptions = Vec::new();
    for row in rows {
        let (id, payload, device) = row?;
        match serde_json::from_str::<Subscription>(&payload) {
            Ok(subscription) => subscriptions.push(StoredSubscription {
                id,
                professional_id,
                subscription,
                device,
                active: true,
            }),
            Err(err) => {
                tracing::warn!(
                    subscription_id = id,
                    "skipping unreadable push subscription: {err}"
                );
            }
        }
    }
    Ok(subscriptions)
}
