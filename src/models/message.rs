use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderType {
    Client,
    Barber,
}

impl SenderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SenderType::Client => "client",
            SenderType::Barber => "barber",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub sender_type: String,
    pub sender_name: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// A message about to be written; the store supplies the appointment id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDraft {
    pub sender_type: SenderType,
    pub sender_name: String,
    pub body: String,
}

impl MessageDraft {
    pub fn new(sender_type: SenderType, sender_name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            sender_type,
            sender_name: sender_name.into(),
            body: body.into(),
        }
    }
}
