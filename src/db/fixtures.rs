use crate::db::{Database, appointments};
use crate::types::appointment::{AppointmentStatus, NewAppointment};

use rusqlite::{Connection, params};
use tempfile::TempDir;
use time::{Date, Time};

pub(crate) struct Seed {
    pub(crate) business_id: i64,
    pub(crate) professional_id: i64,
    pub(crate) service_id: i64,
}

pub(crate) fn temp_database() -> (TempDir, Database) {
    let dir = tempfile::tempdir().expect("tempdir");
    let database = Database::open(dir.path().join("agenda.db")).expect("open database");
    (dir, database)
}

pub(crate) fn seed(conn: &Connection) -> Seed {
    conn.execute(
        "INSERT INTO negocios (nombre, telefono_whatsapp, direccion) VALUES (?1, ?2, ?3)",
        params!["Barbería Centro", "+573001112233", "Calle 10 #4-20"],
    )
    .expect("insert negocio");
    let business_id = conn.last_insert_rowid();
    let professional_id = add_professional(conn, business_id, "Andrés");
    conn.execute(
        "INSERT INTO servicios (negocio_id, nombre, duracion, precio) VALUES (?1, ?2, ?3, ?4)",
        params![business_id, "Corte clásico", 30, 25000],
    )
    .expect("insert servicio");
    let service_id = conn.last_insert_rowid();
    Seed {
        business_id,
        professional_id,
        service_id,
    }
}

pub(crate) fn add_professional(conn: &Connection, business_id: i64, name: &str) -> i64 {
    conn.execute(
        "INSERT INTO profesionales (negocio_id, nombre, telefono) VALUES (?1, ?2, ?3)",
        params![business_id, name, "3000000000"],
    )
    .expect("insert profesional");
    conn.last_insert_rowid()
}

pub(crate) fn book(
    conn: &Connection,
    seed: &Seed,
    date: Date,
    time: Time,
    status: AppointmentStatus,
) -> i64 {
    book_with(conn, seed, seed.professional_id, date, time, status)
}

pub(crate) fn book_with(
    conn: &Connection,
    seed: &Seed,
    professional_id: i64,
    date: Date,
    time: Time,
    status: AppointmentStatus,
) -> i64 {
    appointments::insert_appointment(
        conn,
        &NewAppointment {
            business_id: seed.business_id,
            professional_id,
            service_id: seed.service_id,
            client_phone: "3105551234".to_string(),
            client_name: Some("Laura".to_string()),
            date,
            time,
            status,
        },
    )
    .expect("insert cita")
}
