pub mod appointment_dto;
pub mod auth_dto;
pub mod barber_dto;
pub mod calendar_dto;
