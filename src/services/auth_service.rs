use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::auth_dto::{LoginPayload, RegisterPayload, RegisterResponse, TokenResponse};
use crate::error::{Error, Result};
use crate::models::barber::Barber;
use crate::models::user::{User, ROLE_BARBER};
use crate::services::lifecycle_service::Actor;
use crate::utils::crypto::{hash_password, verify_password};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub barber_id: Uuid,
    pub name: String,
    pub role: String,
    pub exp: usize,
}

impl Claims {
    pub fn actor(&self) -> Actor {
        Actor::Barber {
            barber_id: self.barber_id,
            name: self.name.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AuthService {
    pool: PgPool,
    jwt_secret: String,
    ttl_hours: i64,
}

impl AuthService {
    pub fn new(pool: PgPool, jwt_secret: String, ttl_hours: i64) -> Self {
        Self {
            pool,
            jwt_secret,
            ttl_hours,
        }
    }

    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }

    /// Creates the user and its barber profile together.
    pub async fn register(&self, payload: RegisterPayload) -> Result<RegisterResponse> {
        let email = payload.email.trim().to_lowercase();
        let password_hash = hash_password(&payload.password)?;

        let mut tx = self.pool.begin().await?;

        let taken: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
            .bind(&email)
            .fetch_one(&mut *tx)
            .await?;
        if taken {
            return Err(Error::Conflict("Email is already registered".to_string()));
        }

        let user_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO users (name, email, password_hash, phone, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(payload.name.trim())
        .bind(&email)
        .bind(&password_hash)
        .bind(&payload.phone)
        .bind(ROLE_BARBER)
        .fetch_one(&mut *tx)
        .await?;

        let barber = sqlx::query_as::<_, Barber>(
            r#"
            INSERT INTO barbers (user_id, shop_name, address, neighborhood, city, description, hourly_rate, is_verified)
            VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE)
            RETURNING id, user_id, shop_name, address, neighborhood, city, description, hourly_rate,
                      is_verified, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(payload.shop_name.trim())
        .bind(payload.address.trim())
        .bind(payload.neighborhood.trim())
        .bind(payload.city.trim())
        .bind(&payload.description)
        .bind(payload.hourly_rate)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(%user_id, barber_id = %barber.id, shop = %barber.shop_name, "barber registered");
        Ok(RegisterResponse {
            user_id,
            barber_id: barber.id,
        })
    }

    pub async fn login(&self, payload: LoginPayload) -> Result<TokenResponse> {
        let email = payload.email.trim().to_lowercase();
        let invalid = || Error::Unauthorized("Invalid email or password".to_string());

        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, phone, role, created_at, updated_at
            FROM users WHERE email = $1
            "#,
        )
        .bind(&email)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(invalid)?;

        if !verify_password(&payload.password, &user.password_hash)? {
            tracing::warn!(user_id = %user.id, "login rejected");
            return Err(invalid());
        }

        let barber_id: Uuid = sqlx::query_scalar("SELECT id FROM barbers WHERE user_id = $1")
            .bind(user.id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(invalid)?;

        let access_token = self.issue_token(user.id, barber_id, &user.name, &user.role)?;
        Ok(TokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.ttl_hours * 3600,
            barber_id,
            name: user.name,
        })
    }

    pub fn issue_token(&self, user_id: Uuid, barber_id: Uuid, name: &str, role: &str) -> Result<String> {
        let exp = (Utc::now() + Duration::hours(self.ttl_hours)).timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            barber_id,
            name: name.to_string(),
            role: role.to_string(),
            exp: usize::try_from(exp).map_err(|_| Error::Internal("token expiry out of range".into()))?,
        };

        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )?)
    }

    pub fn decode_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &validation,
        )?;
        Ok(data.claims)
    }
}
