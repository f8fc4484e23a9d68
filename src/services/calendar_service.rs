use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::GoogleOAuthConfig;
use crate::error::Error;
use crate::models::appointment::Appointment;
use crate::models::calendar_credential::CalendarCredential;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_EVENTS_URL: &str = "https://www.googleapis.com/calendar/v3/calendars/primary/events";
const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";

#[derive(Debug, thiserror::Error)]
pub enum CalendarError {
    #[error("calendar sync is not configured")]
    Disabled,

    #[error("barber has no connected calendar")]
    NotConnected,

    #[error("calendar authorization failed: {0}")]
    Auth(String),

    #[error("calendar request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("calendar API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("calendar credential storage failed: {0}")]
    Storage(#[from] sqlx::Error),
}

impl From<CalendarError> for Error {
    fn from(err: CalendarError) -> Self {
        match err {
            CalendarError::Disabled => Error::BadRequest("Calendar sync is not configured".to_string()),
            CalendarError::NotConnected => Error::NotFound("No calendar connected".to_string()),
            CalendarError::Storage(e) => e.into(),
            other => Error::Integration(other.to_string()),
        }
    }
}

/// What gets written to the barber's calendar for a confirmed appointment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    pub appointment_id: Uuid,
    pub client_name: String,
    pub client_phone: String,
    pub client_email: Option<String>,
    pub service_name: Option<String>,
    pub notes: Option<String>,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl CalendarEvent {
    pub fn from_appointment(appointment: &Appointment, service_name: Option<String>) -> Self {
        let start = appointment
            .appointment_date
            .and_time(appointment.appointment_time);
        let end = start + Duration::minutes(i64::from(appointment.duration_minutes));

        Self {
            appointment_id: appointment.id,
            client_name: appointment.client_name.clone(),
            client_phone: appointment.client_phone.clone(),
            client_email: appointment.client_email.clone(),
            service_name,
            notes: appointment.notes.clone(),
            start,
            end,
        }
    }

    pub fn summary(&self) -> String {
        format!("Barbershop appointment - {}", self.client_name)
    }

    pub fn description(&self) -> String {
        format!(
            "Service: {}\nPhone: {}\nNotes: {}",
            self.service_name.as_deref().unwrap_or("Not specified"),
            self.client_phone,
            self.notes.as_deref().unwrap_or("No notes"),
        )
    }
}

/// One-way push of appointments into an external calendar.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CalendarAdapter: Send + Sync {
    async fn push_confirmed_event(
        &self,
        barber_id: Uuid,
        event: &CalendarEvent,
    ) -> Result<String, CalendarError>;

    async fn delete_event(&self, barber_id: Uuid, event_id: &str) -> Result<(), CalendarError>;
}

#[derive(Debug, Deserialize)]
pub struct OAuthTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct InsertedEvent {
    id: String,
}

#[derive(Clone)]
pub struct GoogleCalendarService {
    pool: PgPool,
    client: Client,
    oauth: Option<GoogleOAuthConfig>,
    timezone: String,
}

impl GoogleCalendarService {
    pub fn new(pool: PgPool, oauth: Option<GoogleOAuthConfig>, timezone: String) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            pool,
            client,
            oauth,
            timezone,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.oauth.is_some()
    }

    fn oauth(&self) -> Result<&GoogleOAuthConfig, CalendarError> {
        self.oauth.as_ref().ok_or(CalendarError::Disabled)
    }

    /// Consent screen URL. `state` comes back untouched on the callback.
    pub fn authorization_url(&self, state: &str) -> Result<String, CalendarError> {
        let oauth = self.oauth()?;
        let url = url::Url::parse_with_params(
            GOOGLE_AUTH_URL,
            &[
                ("client_id", oauth.client_id.as_str()),
                ("redirect_uri", oauth.redirect_uri.as_str()),
                ("response_type", "code"),
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("scope", CALENDAR_SCOPE),
                ("state", state),
            ],
        )
        .map_err(|e| CalendarError::Auth(e.to_string()))?;
        Ok(url.into())
    }

    pub async fn exchange_code(&self, code: &str) -> Result<OAuthTokens, CalendarError> {
        let oauth = self.oauth()?;
        let resp = self
            .client
            .post(GOOGLE_TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", oauth.client_id.as_str()),
                ("client_secret", oauth.client_secret.as_str()),
                ("redirect_uri", oauth.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;
        read_tokens(resp).await
    }

    pub async fn save_credentials(
        &self,
        barber_id: Uuid,
        tokens: &OAuthTokens,
    ) -> Result<CalendarCredential, CalendarError> {
        let expires_at = tokens
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs));

        let credential = sqlx::query_as::<_, CalendarCredential>(
            r#"
            INSERT INTO calendar_credentials (barber_id, access_token, refresh_token, expires_at, is_connected)
            VALUES ($1, $2, $3, $4, TRUE)
            ON CONFLICT (barber_id)
            DO UPDATE SET
                access_token = EXCLUDED.access_token,
                refresh_token = COALESCE(EXCLUDED.refresh_token, calendar_credentials.refresh_token),
                expires_at = EXCLUDED.expires_at,
                is_connected = TRUE,
                updated_at = NOW()
            RETURNING barber_id, access_token, refresh_token, expires_at, is_connected, created_at, updated_at
            "#,
        )
        .bind(barber_id)
        .bind(&tokens.access_token)
        .bind(&tokens.refresh_token)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;

        info!(%barber_id, "calendar connected");
        Ok(credential)
    }

    pub async fn disconnect(&self, barber_id: Uuid) -> Result<bool, CalendarError> {
        let result = sqlx::query(
            r#"
            UPDATE calendar_credentials SET is_connected = FALSE, updated_at = NOW()
            WHERE barber_id = $1
            "#,
        )
        .bind(barber_id)
        .execute(&self.pool)
        .await?;

        info!(%barber_id, "calendar disconnected");
        Ok(result.rows_affected() > 0)
    }

    pub async fn is_connected(&self, barber_id: Uuid) -> Result<bool, CalendarError> {
        Ok(self.connected_credential(barber_id).await?.is_some())
    }

    async fn connected_credential(
        &self,
        barber_id: Uuid,
    ) -> Result<Option<CalendarCredential>, CalendarError> {
        let credential = sqlx::query_as::<_, CalendarCredential>(
            r#"
            SELECT barber_id, access_token, refresh_token, expires_at, is_connected, created_at, updated_at
            FROM calendar_credentials
            WHERE barber_id = $1 AND is_connected = TRUE
            "#,
        )
        .bind(barber_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(credential)
    }

    /// Current access token for the barber, refreshed and persisted when expired.
    async fn access_token(&self, barber_id: Uuid) -> Result<String, CalendarError> {
        let oauth = self.oauth()?;
        let credential = self
            .connected_credential(barber_id)
            .await?
            .ok_or(CalendarError::NotConnected)?;

        if !credential.is_expired(Utc::now()) {
            return Ok(credential.access_token);
        }

        let refresh_token = credential
            .refresh_token
            .as_deref()
            .ok_or_else(|| CalendarError::Auth("token expired and no refresh token stored".into()))?;

        let resp = self
            .client
            .post(GOOGLE_TOKEN_URL)
            .form(&[
                ("refresh_token", refresh_token),
                ("client_id", oauth.client_id.as_str()),
                ("client_secret", oauth.client_secret.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;
        let tokens = read_tokens(resp).await?;
        self.save_credentials(barber_id, &tokens).await?;

        Ok(tokens.access_token)
    }

    fn event_body(&self, event: &CalendarEvent) -> serde_json::Value {
        let mut body = json!({
            "summary": event.summary(),
            "description": event.description(),
            "start": {
                "dateTime": event.start.format("%Y-%m-%dT%H:%M:%S").to_string(),
                "timeZone": self.timezone,
            },
            "end": {
                "dateTime": event.end.format("%Y-%m-%dT%H:%M:%S").to_string(),
                "timeZone": self.timezone,
            },
            "reminders": {
                "useDefault": false,
                "overrides": [
                    { "method": "email", "minutes": 24 * 60 },
                    { "method": "popup", "minutes": 30 },
                ],
            },
        });
        if let Some(email) = &event.client_email {
            body["attendees"] = json!([{ "email": email, "displayName": event.client_name }]);
        }
        body
    }
}

async fn read_tokens(resp: reqwest::Response) -> Result<OAuthTokens, CalendarError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(CalendarError::Auth(format!("token endpoint returned {}: {}", status, body)));
    }
    Ok(resp.json::<OAuthTokens>().await?)
}

#[async_trait]
impl CalendarAdapter for GoogleCalendarService {
    async fn push_confirmed_event(
        &self,
        barber_id: Uuid,
        event: &CalendarEvent,
    ) -> Result<String, CalendarError> {
        let token = self.access_token(barber_id).await?;
        let resp = self
            .client
            .post(GOOGLE_EVENTS_URL)
            .bearer_auth(token)
            .json(&self.event_body(event))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CalendarError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let inserted = resp.json::<InsertedEvent>().await?;
        info!(%barber_id, appointment_id = %event.appointment_id, event_id = %inserted.id, "calendar event created");
        Ok(inserted.id)
    }

    async fn delete_event(&self, barber_id: Uuid, event_id: &str) -> Result<(), CalendarError> {
        let token = self.access_token(barber_id).await?;
        let resp = self
            .client
            .delete(format!("{}/{}", GOOGLE_EVENTS_URL, event_id))
            .bearer_auth(token)
            .send()
            .await?;

        let status = resp.status();
        // Already gone on Google's side counts as deleted.
        if status.is_success() || status == StatusCode::GONE || status == StatusCode::NOT_FOUND {
            info!(%barber_id, %event_id, "calendar event deleted");
            return Ok(());
        }

        let body = resp.text().await.unwrap_or_default();
        warn!(%barber_id, %event_id, status = status.as_u16(), "calendar delete rejected");
        Err(CalendarError::Api {
            status: status.as_u16(),
            body,
        })
    }
}
