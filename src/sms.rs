//! Client-facing SMS texts and phone normalization.

use crate::types::appointment::{AppointmentDetails, ReminderBucket, format_date, format_time};

/// Returns the number as country-prefixed digits without `+`, e.g. `573105551234`.
///
/// Separators are dropped. A number that already starts with the country code
/// is kept as is; anything else gets the prefix.
pub fn normalize_phone(raw: &str, country_code: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    if raw.trim_start().starts_with('+') || digits.starts_with(country_code) {
        Some(digits)
    } else {
        Some(format!("{country_code}{digits}"))
    }
}

pub fn confirmation_text(appointment: &AppointmentDetails) -> String {
    let mut text = String::from("CITA CONFIRMADA\n\n");
    text.push_str(&format!("Hola {},\n", appointment.client_display_name()));
    text.push_str("tu cita quedó agendada:\n\n");
    text.push_str(&format!("Fecha: {}\n", format_date(appointment.date)));
    text.push_str(&format!("Hora: {}\n", format_time(appointment.time)));
    text.push_str(&format!("Negocio: {}\n", appointment.business_name));
    if let Some(address) = appointment.business_address.as_deref() {
        text.push_str(&format!("Dirección: {address}\n"));
    }
    text.push_str(&format!("Profesional: {}\n", appointment.professional_name));
    text.push_str(&format!("Servicio: {}\n", appointment.service_name));
    text.push_str(&format!("Precio: {}\n\n", format_price(appointment.price)));
    text.push_str("¡Te esperamos!");
    text
}

pub fn reminder_text(appointment: &AppointmentDetails, bucket: ReminderBucket) -> String {
    let mut text = format!("RECORDATORIO DE CITA ({})\n\n", bucket.label());
    text.push_str(&format!("Hola {},\n", appointment.client_display_name()));
    match bucket {
        ReminderBucket::DayBefore => {
            text.push_str("recuerda tu cita de mañana:\n\n");
            text.push_str(&format!("Fecha: {}\n", format_date(appointment.date)));
        }
        ReminderBucket::HourBefore => text.push_str("tu cita es en 1 hora:\n\n"),
    }
    text.push_str(&format!("Hora: {}\n", format_time(appointment.time)));
    text.push_str(&format!("{}\n", appointment.business_name));
    if let Some(address) = appointment.business_address.as_deref() {
        text.push_str(&format!("{address}\n"));
    }
    text.push('\n');
    text.push_str(match bucket {
        ReminderBucket::DayBefore => "Por favor confirma tu asistencia.",
        ReminderBucket::HourBefore => "¡Nos vemos pronto!",
    });
    text
}

/// `25000` → `$25.000`
pub fn format_price(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    if amount < 0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}
