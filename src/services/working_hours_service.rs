use async_trait::async_trait;
use chrono::Weekday;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::working_hours::{DayHours, WeeklySchedule, WorkingHours};
use crate::utils::time::day_index;

/// Read side of a barber's opening hours.
#[async_trait]
pub trait WorkingHoursStore: Send + Sync {
    async fn weekly_schedule(&self, barber_id: Uuid) -> Result<WeeklySchedule>;

    async fn day_hours(&self, barber_id: Uuid, day: Weekday) -> Result<Option<DayHours>> {
        let schedule = self.weekly_schedule(barber_id).await?;
        Ok(schedule.get(day).copied())
    }
}

/// One day's requested state when replacing a week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleChange {
    pub day: Weekday,
    pub hours: Option<DayHours>,
}

#[derive(Clone)]
pub struct WorkingHoursService {
    pool: PgPool,
}

impl WorkingHoursService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, barber_id: Uuid) -> Result<Vec<WorkingHours>> {
        let rows = sqlx::query_as::<_, WorkingHours>(
            r#"
            SELECT id, barber_id, day_of_week, start_time, end_time, is_active
            FROM working_hours
            WHERE barber_id = $1
            ORDER BY day_of_week, start_time
            "#,
        )
        .bind(barber_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Applies every change in one transaction. Closed days keep their row but go inactive.
    pub async fn replace_schedule(
        &self,
        barber_id: Uuid,
        changes: &[ScheduleChange],
    ) -> Result<WeeklySchedule> {
        let mut tx = self.pool.begin().await?;

        for change in changes {
            let day = day_index(change.day) as i16;
            match change.hours {
                Some(hours) => {
                    sqlx::query(
                        r#"
                        INSERT INTO working_hours (barber_id, day_of_week, start_time, end_time, is_active)
                        VALUES ($1, $2, $3, $4, TRUE)
                        ON CONFLICT (barber_id, day_of_week)
                        DO UPDATE SET start_time = EXCLUDED.start_time,
                                      end_time = EXCLUDED.end_time,
                                      is_active = TRUE
                        "#,
                    )
                    .bind(barber_id)
                    .bind(day)
                    .bind(hours.start_time)
                    .bind(hours.end_time)
                    .execute(&mut *tx)
                    .await?;
                }
                None => {
                    sqlx::query(
                        r#"
                        UPDATE working_hours SET is_active = FALSE
                        WHERE barber_id = $1 AND day_of_week = $2
                        "#,
                    )
                    .bind(barber_id)
                    .bind(day)
                    .execute(&mut *tx)
                    .await?;
                }
            }
        }

        tx.commit().await?;
        tracing::info!(%barber_id, days = changes.len(), "working hours updated");

        self.weekly_schedule(barber_id).await
    }
}

#[async_trait]
impl WorkingHoursStore for WorkingHoursService {
    async fn weekly_schedule(&self, barber_id: Uuid) -> Result<WeeklySchedule> {
        let rows = sqlx::query_as::<_, WorkingHours>(
            r#"
            SELECT id, barber_id, day_of_week, start_time, end_time, is_active
            FROM working_hours
            WHERE barber_id = $1 AND is_active = TRUE
            "#,
        )
        .bind(barber_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(WeeklySchedule::from_rows(&rows))
    }
}
