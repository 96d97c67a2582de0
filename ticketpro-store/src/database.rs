use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;
use tracing::info;

use crate::app_config::BusinessRules;
use crate::StoreError;

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(connection_string: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(connection_string)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations").run(&self.pool).await?;
        info!("Migrations completed successfully.");
        Ok(())
    }

    /// Overlay rules stored in the `business_rules` table on top of the file config.
    /// Rows look like `('lock_hold_hours', '{"value": 48}')`.
    pub async fn fetch_business_rules(&self, defaults: BusinessRules) -> Result<BusinessRules, StoreError> {
        let rows: Vec<(String, Value)> = sqlx::query_as("SELECT rule_key, rule_value FROM business_rules")
            .fetch_all(&self.pool)
            .await?;

        let mut rules = defaults;
        for (key, value) in rows {
            let Some(v) = value.get("value") else {
                continue;
            };
            match key.as_str() {
                "lock_hold_hours" => {
                    if let Some(n) = v.as_i64() {
                        rules.lock_hold_hours = n;
                    }
                }
                "expiry_warning_hours" => {
                    if let Some(n) = v.as_i64() {
                        rules.expiry_warning_hours = n;
                    }
                }
                "expiry_alert_hours" => {
                    if let Some(n) = v.as_i64() {
                        rules.expiry_alert_hours = n;
                    }
                }
                "booking_delay_ms" => {
                    if let Some(n) = v.as_u64() {
                        rules.booking_delay_ms = n;
                    }
                }
                _ => {}
            }
        }

        Ok(rules)
    }
}
