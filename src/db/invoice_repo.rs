// src/db/invoice_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::invoice::{Invoice, InvoiceFilter, NewInvoice, UpdateInvoicePayload},
};

const INVOICE_COLUMNS: &str = "id, salesperson_id, invoice_number, amount_excl_tax, amount_incl_tax, invoice_date, due_date, payment_status, file_path, created_at, updated_at";

const INVOICE_UNIQUE_RULES: &[(&str, &str, &str)] =
    &[("invoices_invoice_number_key", "invoice_number", "duplicate_invoice_number")];

#[derive(Clone)]
pub struct InvoiceRepository {
    pool: PgPool,
}

impl InvoiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Contador atômico, sem corrida entre requisições concorrentes
    pub async fn next_sequence<'e, E>(&self, executor: E) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let value: i64 = sqlx::query_scalar("SELECT nextval('invoice_number_seq')")
            .fetch_one(executor)
            .await?;
        Ok(value)
    }

    pub async fn list(&self, salesperson_id: Uuid, filter: &InvoiceFilter) -> Result<Vec<Invoice>, AppError> {
        let sql = format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices
             WHERE salesperson_id = $1
               AND ($2::payment_status IS NULL OR payment_status = $2)
               AND ($3::text IS NULL OR invoice_number ILIKE '%' || $3 || '%')
             ORDER BY invoice_date DESC, created_at DESC"
        );
        let invoices = sqlx::query_as::<_, Invoice>(&sql)
            .bind(salesperson_id)
            .bind(filter.payment_status)
            .bind(filter.search.as_deref())
            .fetch_all(&self.pool)
            .await?;
        Ok(invoices)
    }

    pub async fn find_owned<'e, E>(&self, executor: E, salesperson_id: Uuid, id: Uuid) -> Result<Option<Invoice>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = $1 AND salesperson_id = $2");
        let invoice = sqlx::query_as::<_, Invoice>(&sql)
            .bind(id)
            .bind(salesperson_id)
            .fetch_optional(executor)
            .await?;
        Ok(invoice)
    }

    pub async fn create<'e, E>(&self, executor: E, invoice: &NewInvoice) -> Result<Invoice, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "INSERT INTO invoices (salesperson_id, invoice_number, amount_excl_tax, amount_incl_tax,
                                   invoice_date, due_date, payment_status)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {INVOICE_COLUMNS}"
        );
        sqlx::query_as::<_, Invoice>(&sql)
            .bind(invoice.salesperson_id)
            .bind(&invoice.invoice_number)
            .bind(invoice.amount_excl_tax)
            .bind(invoice.amount_incl_tax)
            .bind(invoice.invoice_date)
            .bind(invoice.due_date)
            .bind(invoice.payment_status)
            .fetch_one(executor)
            .await
            .map_err(|e| map_unique_violation(e, INVOICE_UNIQUE_RULES))
    }

    pub async fn update(&self, salesperson_id: Uuid, id: Uuid, payload: &UpdateInvoicePayload) -> Result<Option<Invoice>, AppError> {
        let sql = format!(
            "UPDATE invoices
             SET invoice_number = COALESCE($3, invoice_number),
                 amount_excl_tax = COALESCE($4, amount_excl_tax),
                 amount_incl_tax = COALESCE($5, amount_incl_tax),
                 invoice_date = COALESCE($6, invoice_date),
                 due_date = COALESCE($7, due_date),
                 payment_status = COALESCE($8, payment_status),
                 updated_at = NOW()
             WHERE id = $1 AND salesperson_id = $2
             RETURNING {INVOICE_COLUMNS}"
        );
        sqlx::query_as::<_, Invoice>(&sql)
            .bind(id)
            .bind(salesperson_id)
            .bind(payload.invoice_number.as_deref())
            .bind(payload.amount_excl_tax)
            .bind(payload.amount_incl_tax)
            .bind(payload.invoice_date)
            .bind(payload.due_date)
            .bind(payload.payment_status)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, INVOICE_UNIQUE_RULES))
    }

    pub async fn set_file_path(&self, salesperson_id: Uuid, id: Uuid, file_path: &str) -> Result<Option<Invoice>, AppError> {
        let sql = format!(
            "UPDATE invoices SET file_path = $3, updated_at = NOW()
             WHERE id = $1 AND salesperson_id = $2
             RETURNING {INVOICE_COLUMNS}"
        );
        let invoice = sqlx::query_as::<_, Invoice>(&sql)
            .bind(id)
            .bind(salesperson_id)
            .bind(file_path)
            .fetch_optional(&self.pool)
            .await?;
        Ok(invoice)
    }

    // Os negócios ficam sem fatura (ON DELETE SET NULL)
    pub async fn delete_owned(&self, salesperson_id: Uuid, id: Uuid) -> Result<Option<Invoice>, AppError> {
        let sql = format!(
            "DELETE FROM invoices WHERE id = $1 AND salesperson_id = $2 RETURNING {INVOICE_COLUMNS}"
        );
        let invoice = sqlx::query_as::<_, Invoice>(&sql)
            .bind(id)
            .bind(salesperson_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(invoice)
    }
}
