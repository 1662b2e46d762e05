use crate::db::DatabaseError;
use crate::types::appointment::{format_date, parse_date};
use crate::types::notification::{
    Notification, NotificationCategory, NotificationKind, NotificationMetadata,
};

use rusqlite::{Connection, params};
use time::Date;

pub struct NewNotification<'a> {
    pub professional_id: i64,
    pub title: &'a str,
    pub body: &'a str,
    pub kind: NotificationKind,
    pub metadata: &'a NotificationMetadata,
    pub created_on: Date,
}

pub fn insert_notification(
    conn: &Connection,
    notification: &NewNotification<'_>,
) -> Result<i64, DatabaseError> {
    let metadata = serde_json::to_string(notification.metadata)?;
    let id = conn.query_row(
        "INSERT INTO notificaciones_profesional
            (profesional_id, titulo, mensaje, tipo, leida, metadata, fecha_creacion)
         VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6)
         RETURNING id",
        params![
            notification.professional_id,
            notification.title,
            notification.body,
            notification.kind.as_str(),
            metadata,
            format_date(notification.created_on),
        ],
        |row| row.get(0),
    )?;
    Ok(id)
}

/// Newest rows first by id, at most `limit` of them.
pub fn list_notifications(
    conn: &Connection,
    professional_id: i64,
    unread_only: bool,
    limit: u32,
) -> Result<Vec<Notification>, DatabaseError> {
    let sql = if unread_only {
        "SELECT id, profesional_id, titulo, mensaje, tipo, metadata,
                fecha_creacion, leida, fecha_leida
         FROM notificaciones_profesional
         WHERE profesional_id = ?1 AND leida = 0
         ORDER BY id DESC
         LIMIT ?2"
    } else {
        "SELECT id, profesional_id, titulo, mensaje, tipo, metadata,
                fecha_creacion, leida, fecha_leida
         FROM notificaciones_profesional
         WHERE profesional_id = ?1
         ORDER BY id DESC
         LIMIT ?2"
    };
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params![professional_id, limit], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, Option<String>>(5)?,
            row.get::<_, Option<String>>(6)?,
            row.get::<_, bool>(7)?,
            row.get::<_, Option<String>>(8)?,
        ))
    })?;

    let mut notifications = Vec::new();
    for row in rows {
        let (id, professional_id, title, body, kind, metadata, created_on, read, read_on) = row?;
        notifications.push(Notification {
            id,
            professional_id,
            title,
            body,
            kind: kind.parse()?,
            metadata: NotificationMetadata::decode(metadata.as_deref()),
            created_on: created_on.as_deref().and_then(|value| parse_date(value).ok()),
            read,
            read_on: read_on.as_deref().and_then(|value| parse_date(value).ok()),
        });
    }
    Ok(notifications)
}

pub fn mark_read(conn: &Connection, id: i64, read_on: Date) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "UPDATE notificaciones_profesional
         SET leida = 1, fecha_leida = ?2
         WHERE id = ?1 AND leida = 0",
        params![id, format_date(read_on)],
    )?;
    Ok(changed)
}

pub fn mark_all_read(
    conn: &Connection,
    professional_id: i64,
    read_on: Date,
) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "UPDATE notificaciones_profesional
         SET leida = 1, fecha_leida = ?2
         WHERE profesional_id = ?1 AND leida = 0",
        params![professional_id, format_date(read_on)],
    )?;
    Ok(changed)
}

pub fn unread_count(conn: &Connection, professional_id: i64) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM notificaciones_profesional
         WHERE profesional_id = ?1 AND leida = 0",
        params![professional_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Whether a notification of `category` tagged with `date` in its metadata exists.
// TODO: a dedicated column would let this use an index instead of json_extract.
pub fn exists_for_date(
    conn: &Connection,
    professional_id: i64,
    category: NotificationCategory,
    date: Date,
) -> Result<bool, DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM notificaciones_profesional
         WHERE profesional_id = ?1
           AND CASE WHEN json_valid(metadata)
                    THEN json_extract(metadata, '$.tipo') = ?2
                     AND json_extract(metadata, '$.fecha') = ?3
                    ELSE 0
               END",
        params![professional_id, category.as_str(), format_date(date)],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}
