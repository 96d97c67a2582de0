use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::PgPool;
use ticketpro_core::{CoreError, CoreResult, Entity, Repository};
use ticketpro_inventory::Ticket;
use uuid::Uuid;

use crate::db_err;

pub struct PgTicketRepository {
    pool: PgPool,
}

impl PgTicketRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TicketRow {
    id: Uuid,
    serial_number: String,
    batch_id: Option<Uuid>,
    airline_name: String,
    destination: String,
    departure_date: NaiveDate,
    departure_time: NaiveTime,
    price: i64,
    buying_price: i64,
    is_confirmed: bool,
    lock_status: String,
    locked_by: Option<String>,
    lock_expiry: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = CoreError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        Ok(Ticket {
            id: row.id,
            serial_number: row.serial_number,
            batch_id: row.batch_id,
            airline_name: row.airline_name,
            destination: row.destination,
            departure_date: row.departure_date,
            departure_time: row.departure_time,
            price: row.price,
            buying_price: row.buying_price,
            is_confirmed: row.is_confirmed,
            lock_status: row.lock_status.parse()?,
            locked_by: row.locked_by,
            lock_expiry: row.lock_expiry,
            updated_at: row.updated_at,
        })
    }
}

const SELECT_TICKETS: &str = r#"
    SELECT id, serial_number, batch_id, airline_name, destination, departure_date, departure_time,
           price, buying_price, is_confirmed, lock_status, locked_by, lock_expiry, updated_at
    FROM tickets
"#;

#[async_trait]
impl Repository<Ticket> for PgTicketRepository {
    async fn list(&self) -> CoreResult<Vec<Ticket>> {
        let rows: Vec<TicketRow> = sqlx::query_as(&format!("{} ORDER BY seq", SELECT_TICKETS))
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.into_iter().map(Ticket::try_from).collect()
    }

    async fn get(&self, id: Uuid) -> CoreResult<Option<Ticket>> {
        let row: Option<TicketRow> = sqlx::query_as(&format!("{} WHERE id = $1", SELECT_TICKETS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(Ticket::try_from).transpose()
    }

    async fn insert(&self, ticket: Ticket) -> CoreResult<Ticket> {
        let result = sqlx::query(
            r#"
            INSERT INTO tickets (id, serial_number, batch_id, airline_name, destination, departure_date,
                                 departure_time, price, buying_price, is_confirmed, lock_status, locked_by,
                                 lock_expiry, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(ticket.id)
        .bind(&ticket.serial_number)
        .bind(ticket.batch_id)
        .bind(&ticket.airline_name)
        .bind(&ticket.destination)
        .bind(ticket.departure_date)
        .bind(ticket.departure_time)
        .bind(ticket.price)
        .bind(ticket.buying_price)
        .bind(ticket.is_confirmed)
        .bind(ticket.lock_status.as_str())
        .bind(&ticket.locked_by)
        .bind(ticket.lock_expiry)
        .bind(ticket.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::Conflict(format!("{} {} already exists", Ticket::KIND, ticket.id)));
        }
        Ok(ticket)
    }

    async fn update(&self, ticket: Ticket) -> CoreResult<Ticket> {
        let result = sqlx::query(
            r#"
            UPDATE tickets
            SET is_confirmed = $2, lock_status = $3, locked_by = $4, lock_expiry = $5, updated_at = $6,
                price = $7, buying_price = $8
            WHERE id = $1
            "#,
        )
        .bind(ticket.id)
        .bind(ticket.is_confirmed)
        .bind(ticket.lock_status.as_str())
        .bind(&ticket.locked_by)
        .bind(ticket.lock_expiry)
        .bind(ticket.updated_at)
        .bind(ticket.price)
        .bind(ticket.buying_price)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::not_found(Ticket::KIND, ticket.id));
        }
        Ok(ticket)
    }

    async fn delete(&self, id: Uuid) -> CoreResult<bool> {
        let result = sqlx::query("DELETE FROM tickets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }
}
