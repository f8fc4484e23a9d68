use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Barber {
    pub id: Uuid,
    pub user_id: Uuid,
    pub shop_name: String,
    pub address: String,
    pub neighborhood: String,
    pub city: String,
    pub description: Option<String>,
    pub hourly_rate: Option<Decimal>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Barber row joined with the owning user's contact fields.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BarberProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub shop_name: String,
    pub address: String,
    pub neighborhood: String,
    pub city: String,
    pub description: Option<String>,
    pub hourly_rate: Option<Decimal>,
    pub is_verified: bool,
    pub calendar_connected: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BarberSummary {
    pub id: Uuid,
    pub barber_name: String,
    pub phone: Option<String>,
    pub shop_name: String,
    pub address: String,
    pub neighborhood: String,
    pub city: String,
    pub description: Option<String>,
    pub hourly_rate: Option<Decimal>,
    pub total_appointments: i64,
}
