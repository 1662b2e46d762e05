pub mod appointment;
pub mod notification;
pub mod push;
