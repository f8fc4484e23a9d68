pub mod appointment;
pub mod barber;
pub mod calendar_credential;
pub mod message;
pub mod service;
pub mod user;
pub mod working_hours;
