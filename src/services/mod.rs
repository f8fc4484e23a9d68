pub mod appointment_service;
pub mod auth_service;
pub mod barber_service;
pub mod calendar_service;
pub mod lifecycle_service;
pub mod memory;
pub mod message_service;
pub mod slot_service;
pub mod working_hours_service;
