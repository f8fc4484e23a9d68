use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const DEFAULT_DURATION_MINUTES: i32 = 30;

/// A bookable service offered by one barber. Deleting only clears `is_active`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ShopService {
    pub id: Uuid,
    pub barber_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub duration_minutes: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
