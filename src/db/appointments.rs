use crate::db::DatabaseError;
use crate::types::appointment::{
    AppointmentDetails, DayEntry, NewAppointment, ProfessionalDay, ReminderBucket, ReminderFlags,
    format_date, format_time, parse_date, parse_time,
};

use rusqlite::{Connection, OptionalExtension, Row, params};
use time::Date;

const DETAILS_SELECT: &str = "
    SELECT c.id, c.negocio_id, n.nombre, n.direccion,
           c.profesional_id, p.nombre, c.servicio_id, s.nombre, s.precio,
           c.cliente_telefono, c.cliente_nombre, c.fecha, c.hora, c.estado,
           c.recordatorio_24h_enviado, c.recordatorio_1h_enviado
    FROM citas c
    JOIN negocios n ON c.negocio_id = n.id
    JOIN profesionales p ON c.profesional_id = p.id
    JOIN servicios s ON c.servicio_id = s.id";

/// Raw column values of `DETAILS_SELECT`, decoded into domain types separately.
struct DetailsRow {
    id: i64,
    business_id: i64,
    business_name: String,
    business_address: Option<String>,
    professional_id: i64,
    professional_name: String,
    service_id: i64,
    service_name: String,
    price: i64,
    client_phone: String,
    client_name: Option<String>,
    date: String,
    time: String,
    status: String,
    day_before_sent: bool,
    hour_before_sent: bool,
}

fn read_details_row(row: &Row<'_>) -> rusqlite::Result<DetailsRow> {
    Ok(DetailsRow {
        id: row.get(0)?,
        business_id: row.get(1)?,
        business_name: row.get(2)?,
        business_address: row.get(3)?,
        professional_id: row.get(4)?,
        professional_name: row.get(5)?,
        service_id: row.get(6)?,
        service_name: row.get(7)?,
        price: row.get(8)?,
        client_phone: row.get(9)?,
        client_name: row.get(10)?,
        date: row.get(11)?,
        time: row.get(12)?,
        status: row.get(13)?,
        day_before_sent: row.get(14)?,
        hour_before_sent: row.get(15)?,
    })
}

impl TryFrom<DetailsRow> for AppointmentDetails {
    type Error = DatabaseError;

    fn try_from(row: DetailsRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            business_id: row.business_id,
            business_name: row.business_name,
            business_address: row.business_address,
            professional_id: row.professional_id,
            professional_name: row.professional_name,
            service_id: row.service_id,
            service_name: row.service_name,
            price: row.price,
            client_phone: row.client_phone,
            client_name: row.client_name,
            date: parse_date(&row.date)?,
            time: parse_time(&row.time)?,
            status: row.status.parse()?,
            flags: ReminderFlags {
                day_before: row.day_before_sent,
                hour_before: row.hour_before_sent,
            },
        })
    }
}

pub fn insert_appointment(
    conn: &Connection,
    appointment: &NewAppointment,
) -> Result<i64, DatabaseError> {
    let id = conn.query_row(
        "INSERT INTO citas
            (negocio_id, profesional_id, servicio_id, cliente_telefono, cliente_nombre,
             fecha, hora, estado)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         RETURNING id",
        params![
            appointment.business_id,
            appointment.professional_id,
            appointment.service_id,
            appointment.client_phone,
            appointment.client_name,
            format_date(appointment.date),
            format_time(appointment.time),
            appointment.status.as_str(),
        ],
        |row| row.get(0),
    )?;
    Ok(id)
}

pub fn appointment_details(
    conn: &Connection,
    id: i64,
) -> Result<Option<AppointmentDetails>, DatabaseError> {
    let sql = format!("{DETAILS_SELECT} WHERE c.id = ?1");
    let row = conn
        .query_row(&sql, params![id], read_details_row)
        .optional()?;
    row.map(AppointmentDetails::try_from).transpose()
}

/// Confirmed appointments dated within `[from, until]` with at least one
/// reminder still pending, ordered by date then time.
///
/// Rows that fail to decode are logged and skipped.
pub fn reminder_candidates(
    conn: &Connection,
    from: Date,
    until: Date,
) -> Result<Vec<AppointmentDetails>, DatabaseError> {
    let sql = format!(
        "{DETAILS_SELECT}
         WHERE c.estado = 'confirmado'
           AND c.fecha BETWEEN ?1 AND ?2
           AND (c.recordatorio_24h_enviado = 0 OR c.recordatorio_1h_enviado = 0)
         ORDER BY c.fecha, c.hora"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        params![format_date(from), format_date(until)],
        read_details_row,
    )?;

    let mut candidates = Vec::new();
    for row in rows {
        let row = row?;
        let id = row.id;
        match AppointmentDetails::try_from(row) {
            Ok(details) => candidates.push(details),
            Err(err) => {
                tracing::warn!(appointment_id = id, "skipping unreadable appointment: {err}");
            }
        }
    }
    Ok(candidates)
}

/// Flips the bucket's flag if it is still unset. Returns whether a row changed.
pub fn mark_reminder_sent(
    conn: &Connection,
    id: i64,
    bucket: ReminderBucket,
) -> Result<bool, DatabaseError> {
    let sql = match bucket {
        ReminderBucket::DayBefore => {
            "UPDATE citas SET recordatorio_24h_enviado = 1
             WHERE id = ?1 AND recordatorio_24h_enviado = 0"
        }
        ReminderBucket::HourBefore => {
            "UPDATE citas SET recordatorio_1h_enviado = 1
             WHERE id = ?1 AND recordatorio_1h_enviado = 0"
        }
    };
    let changed = conn.execute(sql, params![id])?;
    Ok(changed > 0)
}

pub fn cancel_appointment(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE citas SET estado = 'cancelado' WHERE id = ?1 AND estado <> 'cancelado'",
        params![id],
    )?;
    Ok(changed > 0)
}

/// Non-cancelled appointments on `date`, grouped by professional.
pub fn day_agenda(conn: &Connection, date: Date) -> Result<Vec<ProfessionalDay>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT p.id, p.nombre, c.id, c.hora, c.cliente_nombre, s.nombre
         FROM citas c
         JOIN profesionales p ON c.profesional_id = p.id
         JOIN servicios s ON c.servicio_id = s.id
         WHERE c.fecha = ?1 AND c.estado <> 'cancelado'
         ORDER BY p.id, c.hora",
    )?;
    let rows = stmt.query_map(params![format_date(date)], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, i64>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, String>(5)?,
        ))
    })?;

    let mut days: Vec<ProfessionalDay> = Vec::new();
    for row in rows {
        let (professional_id, professional_name, appointment_id, time, client_name, service_name) =
            row?;
        let entry = DayEntry {
            appointment_id,
            time: parse_time(&time)?,
            client_name,
            service_name,
        };
        match days.last_mut() {
            Some(day) if day.professional_id == professional_id => day.entries.push(entry),
            _ => days.push(ProfessionalDay {
                professional_id,
                professional_name,
                entries: vec![entry],
            }),
        }
    }
    Ok(days)
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use crate::db::fixtures;
    use crate::types::appointment::AppointmentStatus;
    use time::macros::{date, time};

    #[test]
    fn appointment_details__should_join_parties() {
        // Given
        let (_dir, database) = fixtures::temp_database();
        let conn = database.connect().expect("connect");
        let seed = fixtures::seed(&conn);
        let id = fixtures::book(
            &conn,
            &seed,
            date!(2024 - 01 - 02),
            time!(10:00),
            AppointmentStatus::Confirmed,
        );

        // When
        let details = appointment_details(&conn, id)
            .expect("query")
            .expect("appointment exists");

        // Then
        assert_eq!(details.business_name, "Barbería Centro");
        assert_eq!(details.professional_name, "Andrés");
        assert_eq!(details.service_name, "Corte clásico");
        assert_eq!(details.price, 25000);
        assert_eq!(details.time, time!(10:00));
        assert_eq!(details.flags, ReminderFlags::default());
        assert!(appointment_details(&conn, id + 100).expect("query").is_none());
    }

    #[test]
    fn reminder_candidates__should_only_return_confirmed_within_window() {
        // Given
        let (_dir, database) = fixtures::temp_database();
        let conn = database.connect().expect("connect");
        let seed = fixtures::seed(&conn);
        let late = fixtures::book(
            &conn,
            &seed,
            date!(2024 - 01 - 03),
            time!(08:00),
            AppointmentStatus::Confirmed,
        );
        let early = fixtures::book(
            &conn,
            &seed,
            date!(2024 - 01 - 01),
            time!(16:00),
            AppointmentStatus::Confirmed,
        );
        fixtures::book(
            &conn,
            &seed,
            date!(2024 - 01 - 02),
            time!(09:00),
            AppointmentStatus::Pending,
        );
        fixtures::book(
            &conn,
            &seed,
            date!(2024 - 01 - 02),
            time!(11:00),
            AppointmentStatus::Cancelled,
        );
        fixtures::book(
            &conn,
            &seed,
            date!(2024 - 01 - 04),
            time!(10:00),
            AppointmentStatus::Confirmed,
        );
        fixtures::book(
            &conn,
            &seed,
            date!(2023 - 12 - 31),
            time!(10:00),
            AppointmentStatus::Confirmed,
        );

        // When
        let candidates =
            reminder_candidates(&conn, date!(2024 - 01 - 01), date!(2024 - 01 - 03)).expect("scan");

        // Then
        let ids: Vec<i64> = candidates.iter().map(|details| details.id).collect();
        assert_eq!(ids, vec![early, late]);
    }

    #[test]
    fn reminder_candidates__should_drop_fully_reminded_appointments() {
        // Given
        let (_dir, database) = fixtures::temp_database();
        let conn = database.connect().expect("connect");
        let seed = fixtures::seed(&conn);
        let id = fixtures::book(
            &conn,
            &seed,
            date!(2024 - 01 - 02),
            time!(10:00),
            AppointmentStatus::Confirmed,
        );

        // When
        mark_reminder_sent(&conn, id, ReminderBucket::DayBefore).expect("mark 24h");
        let after_one =
            reminder_candidates(&conn, date!(2024 - 01 - 01), date!(2024 - 01 - 03)).expect("scan");
        mark_reminder_sent(&conn, id, ReminderBucket::HourBefore).expect("mark 1h");
        let after_both =
            reminder_candidates(&conn, date!(2024 - 01 - 01), date!(2024 - 01 - 03)).expect("scan");

        // Then
        assert_eq!(after_one.len(), 1);
        assert!(after_one[0].flags.day_before);
        assert!(!after_one[0].flags.hour_before);
        assert!(after_both.is_empty());
    }

    #[test]
    fn mark_reminder_sent__should_only_flip_once() {
        // Given
        let (_dir, database) = fixtures::temp_database();
        let conn = database.connect().expect("connect");
        let seed = fixtures::seed(&conn);
        let id = fixtures::book(
            &conn,
            &seed,
            date!(2024 - 01 - 02),
            time!(10:00),
            AppointmentStatus::Confirmed,
        );

        // Then
        assert!(mark_reminder_sent(&conn, id, ReminderBucket::DayBefore).expect("first"));
        assert!(!mark_reminder_sent(&conn, id, ReminderBucket::DayBefore).expect("second"));
        assert!(mark_reminder_sent(&conn, id, ReminderBucket::HourBefore).expect("other bucket"));
    }

    #[test]
    fn cancel_appointment__should_be_idempotent() {
        // Given
        let (_dir, database) = fixtures::temp_database();
        let conn = database.connect().expect("connect");
        let seed = fixtures::seed(&conn);
        let id = fixtures::book(
            &conn,
            &seed,
            date!(2024 - 01 - 02),
            time!(10:00),
            AppointmentStatus::Confirmed,
        );

        // Then
        assert!(cancel_appointment(&conn, id).expect("cancel"));
        assert!(!cancel_appointment(&conn, id).expect("cancel again"));
        let details = appointment_details(&conn, id).expect("query").expect("exists");
        assert_eq!(details.status, AppointmentStatus::Cancelled);
    }

    #[test]
    fn day_agenda__should_group_by_professional_in_time_order() {
        // Given
        let (_dir, database) = fixtures::temp_database();
        let conn = database.connect().expect("connect");
        let seed = fixtures::seed(&conn);
        let other = fixtures::add_professional(&conn, seed.business_id, "Camila");
        let day = date!(2024 - 01 - 02);
        fixtures::book(&conn, &seed, day, time!(15:00), AppointmentStatus::Confirmed);
        fixtures::book(&conn, &seed, day, time!(09:00), AppointmentStatus::Pending);
        fixtures::book(&conn, &seed, day, time!(10:00), AppointmentStatus::Cancelled);
        fixtures::book_with(&conn, &seed, other, day, time!(11:30), AppointmentStatus::Confirmed);
        fixtures::book(
            &conn,
            &seed,
            date!(2024 - 01 - 03),
            time!(09:00),
            AppointmentStatus::Confirmed,
        );

        // When
        let agenda = day_agenda(&conn, day).expect("agenda");

        // Then
        assert_eq!(agenda.len(), 2);
        assert_eq!(agenda[0].professional_id, seed.professional_id);
        let times: Vec<_> = agenda[0].entries.iter().map(|entry| entry.time).collect();
        assert_eq!(times, vec![time!(09:00), time!(15:00)]);
        assert_eq!(agenda[1].professional_name, "Camila");
        assert_eq!(agenda[1].entries.len(), 1);
    }
}
