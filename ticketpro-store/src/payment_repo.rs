use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use ticketpro_core::{CoreError, CoreResult, Entity, Repository};
use ticketpro_ledger::PaymentRecord;
use uuid::Uuid;

use crate::db_err;

pub struct PgPaymentRepository {
    pool: PgPool,
}

impl PgPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    ticket_no: String,
    passenger_name: String,
    destination: String,
    total_amount: i64,
    paid_amount: i64,
    remaining_amount: i64,
    payment_status: String,
    payment_method: String,
    due_date: Option<NaiveDate>,
    last_payment: Option<NaiveDate>,
    agent_name: String,
    notes: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for PaymentRecord {
    type Error = CoreError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(PaymentRecord {
            id: row.id,
            ticket_no: row.ticket_no,
            passenger_name: row.passenger_name,
            destination: row.destination,
            total_amount: row.total_amount,
            paid_amount: row.paid_amount,
            remaining_amount: row.remaining_amount,
            payment_status: row.payment_status.parse()?,
            payment_method: row.payment_method,
            due_date: row.due_date,
            last_payment: row.last_payment,
            agent_name: row.agent_name,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}

const SELECT_PAYMENTS: &str = r#"
    SELECT id, ticket_no, passenger_name, destination, total_amount, paid_amount, remaining_amount,
           payment_status, payment_method, due_date, last_payment, agent_name, notes, created_at
    FROM payment_records
"#;

#[async_trait]
impl Repository<PaymentRecord> for PgPaymentRepository {
    async fn list(&self) -> CoreResult<Vec<PaymentRecord>> {
        let rows: Vec<PaymentRow> = sqlx::query_as(&format!("{} ORDER BY seq", SELECT_PAYMENTS))
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.into_iter().map(PaymentRecord::try_from).collect()
    }

    async fn get(&self, id: Uuid) -> CoreResult<Option<PaymentRecord>> {
        let row: Option<PaymentRow> = sqlx::query_as(&format!("{} WHERE id = $1", SELECT_PAYMENTS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(PaymentRecord::try_from).transpose()
    }

    async fn insert(&self, record: PaymentRecord) -> CoreResult<PaymentRecord> {
        let result = sqlx::query(
            r#"
            INSERT INTO payment_records (id, ticket_no, passenger_name, destination, total_amount, paid_amount,
                                         remaining_amount, payment_status, payment_method, due_date,
                                         last_payment, agent_name, notes, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(record.id)
        .bind(&record.ticket_no)
        .bind(&record.passenger_name)
        .bind(&record.destination)
        .bind(record.total_amount)
        .bind(record.paid_amount)
        .bind(record.remaining_amount)
        .bind(record.payment_status.as_str())
        .bind(&record.payment_method)
        .bind(record.due_date)
        .bind(record.last_payment)
        .bind(&record.agent_name)
        .bind(&record.notes)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::Conflict(format!(
                "{} {} already exists",
                PaymentRecord::KIND,
                record.id
            )));
        }
        Ok(record)
    }

    async fn update(&self, record: PaymentRecord) -> CoreResult<PaymentRecord> {
        let result = sqlx::query(
            r#"
            UPDATE payment_records
            SET paid_amount = $2, remaining_amount = $3, payment_status = $4, payment_method = $5,
                last_payment = $6, notes = $7, due_date = $8
            WHERE id = $1
            "#,
        )
        .bind(record.id)
        .bind(record.paid_amount)
        .bind(record.remaining_amount)
        .bind(record.payment_status.as_str())
        .bind(&record.payment_method)
        .bind(record.last_payment)
        .bind(&record.notes)
        .bind(record.due_date)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::not_found(PaymentRecord::KIND, record.id));
        }
        Ok(record)
    }

    async fn delete(&self, id: Uuid) -> CoreResult<bool> {
        let result = sqlx::query("DELETE FROM payment_records WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }
}
