use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::barber_dto::{
    BarberSearchQuery, CreateServicePayload, UpdateProfilePayload, UpdateServicePayload,
};
use crate::error::{Error, Result};
use crate::models::barber::{BarberProfile, BarberSummary};
use crate::models::service::{ShopService, DEFAULT_DURATION_MINUTES};

const SERVICE_COLUMNS: &str =
    "id, barber_id, name, description, price, duration_minutes, is_active, created_at, updated_at";

const PROFILE_SELECT: &str = r#"
    SELECT b.id, b.user_id, u.name, u.email, u.phone,
           b.shop_name, b.address, b.neighborhood, b.city, b.description, b.hourly_rate,
           b.is_verified,
           COALESCE(c.is_connected, FALSE) AS calendar_connected
    FROM barbers b
    JOIN users u ON u.id = b.user_id
    LEFT JOIN calendar_credentials c ON c.barber_id = b.id
"#;

/// What booking needs to know about barbers and their services.
#[async_trait]
pub trait BookingCatalog: Send + Sync {
    async fn barber_exists(&self, barber_id: Uuid) -> Result<bool>;

    /// An active service offered by `barber_id`.
    async fn find_service(&self, barber_id: Uuid, service_id: Uuid) -> Result<Option<ShopService>>;
}

#[derive(Clone)]
pub struct BarberService {
    pool: PgPool,
}

impl BarberService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Verified barbers, optionally narrowed by case-insensitive substring on location.
    pub async fn search(&self, query: &BarberSearchQuery) -> Result<Vec<BarberSummary>> {
        let neighborhood = query
            .neighborhood
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s));
        let city = query
            .city
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s));

        let barbers = sqlx::query_as::<_, BarberSummary>(
            r#"
            SELECT b.id, u.name AS barber_name, u.phone,
                   b.shop_name, b.address, b.neighborhood, b.city, b.description, b.hourly_rate,
                   COUNT(a.id) AS total_appointments
            FROM barbers b
            JOIN users u ON u.id = b.user_id
            LEFT JOIN appointments a ON a.barber_id = b.id AND a.status = 'confirmed'
            WHERE b.is_verified = TRUE
              AND ($1::TEXT IS NULL OR b.neighborhood ILIKE $1)
              AND ($2::TEXT IS NULL OR b.city ILIKE $2)
            GROUP BY b.id, u.name, u.phone
            ORDER BY b.shop_name
            "#,
        )
        .bind(neighborhood)
        .bind(city)
        .fetch_all(&self.pool)
        .await?;

        Ok(barbers)
    }

    /// Profile as shown to clients. Unverified barbers are not visible.
    pub async fn get_public_profile(&self, barber_id: Uuid) -> Result<BarberProfile> {
        let sql = format!("{} WHERE b.id = $1 AND b.is_verified = TRUE", PROFILE_SELECT);
        sqlx::query_as::<_, BarberProfile>(&sql)
            .bind(barber_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Barber not found".to_string()))
    }

    pub async fn find_profile(&self, barber_id: Uuid) -> Result<BarberProfile> {
        let sql = format!("{} WHERE b.id = $1", PROFILE_SELECT);
        sqlx::query_as::<_, BarberProfile>(&sql)
            .bind(barber_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Barber not found".to_string()))
    }

    pub async fn update_profile(
        &self,
        barber_id: Uuid,
        payload: UpdateProfilePayload,
    ) -> Result<BarberProfile> {
        let result = sqlx::query(
            r#"
            UPDATE barbers SET
                shop_name = COALESCE($2, shop_name),
                address = COALESCE($3, address),
                neighborhood = COALESCE($4, neighborhood),
                city = COALESCE($5, city),
                description = COALESCE($6, description),
                hourly_rate = COALESCE($7, hourly_rate),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(barber_id)
        .bind(payload.shop_name)
        .bind(payload.address)
        .bind(payload.neighborhood)
        .bind(payload.city)
        .bind(payload.description)
        .bind(payload.hourly_rate)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Barber not found".to_string()));
        }

        tracing::info!(%barber_id, "barber profile updated");
        self.find_profile(barber_id).await
    }

    pub async fn list_services(&self, barber_id: Uuid) -> Result<Vec<ShopService>> {
        let sql = format!(
            "SELECT {} FROM services WHERE barber_id = $1 AND is_active = TRUE ORDER BY price, name",
            SERVICE_COLUMNS
        );
        let services = sqlx::query_as::<_, ShopService>(&sql)
            .bind(barber_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(services)
    }

    pub async fn create_service(
        &self,
        barber_id: Uuid,
        payload: CreateServicePayload,
    ) -> Result<ShopService> {
        ensure_price(payload.price)?;

        let sql = format!(
            r#"
            INSERT INTO services (barber_id, name, description, price, duration_minutes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            SERVICE_COLUMNS
        );
        let service = sqlx::query_as::<_, ShopService>(&sql)
            .bind(barber_id)
            .bind(payload.name.trim())
            .bind(payload.description)
            .bind(payload.price)
            .bind(payload.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES))
            .fetch_one(&self.pool)
            .await?;

        tracing::info!(%barber_id, service_id = %service.id, "service created");
        Ok(service)
    }

    pub async fn update_service(
        &self,
        barber_id: Uuid,
        service_id: Uuid,
        payload: UpdateServicePayload,
    ) -> Result<ShopService> {
        if let Some(price) = payload.price {
            ensure_price(price)?;
        }
        self.ensure_owner(barber_id, service_id).await?;

        let sql = format!(
            r#"
            UPDATE services SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                duration_minutes = COALESCE($5, duration_minutes),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            SERVICE_COLUMNS
        );
        let service = sqlx::query_as::<_, ShopService>(&sql)
            .bind(service_id)
            .bind(payload.name.map(|n| n.trim().to_string()))
            .bind(payload.description)
            .bind(payload.price)
            .bind(payload.duration_minutes)
            .fetch_one(&self.pool)
            .await?;

        Ok(service)
    }

    /// Soft delete: the service stops being offered but past appointments keep their link.
    pub async fn deactivate_service(&self, barber_id: Uuid, service_id: Uuid) -> Result<()> {
        self.ensure_owner(barber_id, service_id).await?;

        sqlx::query("UPDATE services SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
            .bind(service_id)
            .execute(&self.pool)
            .await?;

        tracing::info!(%barber_id, %service_id, "service deactivated");
        Ok(())
    }

    async fn ensure_owner(&self, barber_id: Uuid, service_id: Uuid) -> Result<()> {
        let owner: Option<Uuid> = sqlx::query_scalar("SELECT barber_id FROM services WHERE id = $1")
            .bind(service_id)
            .fetch_optional(&self.pool)
            .await?;

        match owner {
            None => Err(Error::NotFound("Service not found".to_string())),
            Some(owner) if owner != barber_id => Err(Error::Forbidden(
                "Service belongs to another barber".to_string(),
            )),
            Some(_) => Ok(()),
        }
    }
}

fn ensure_price(price: Decimal) -> Result<()> {
    if price < Decimal::ZERO {
        return Err(Error::BadRequest("price must not be negative".to_string()));
    }
    Ok(())
}

#[async_trait]
impl BookingCatalog for BarberService {
    async fn barber_exists(&self, barber_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM barbers WHERE id = $1)")
            .bind(barber_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn find_service(&self, barber_id: Uuid, service_id: Uuid) -> Result<Option<ShopService>> {
        let sql = format!(
            "SELECT {} FROM services WHERE id = $1 AND barber_id = $2 AND is_active = TRUE",
            SERVICE_COLUMNS
        );
        let service = sqlx::query_as::<_, ShopService>(&sql)
            .bind(service_id)
            .bind(barber_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(service)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn negative_prices_are_rejected() {
        assert!(ensure_price(Decimal::from_str("15.50").unwrap()).is_ok());
        assert!(ensure_price(Decimal::ZERO).is_ok());
        assert!(matches!(
            ensure_price(Decimal::from_str("-1").unwrap()),
            Err(Error::BadRequest(_))
        ));
    }
}
