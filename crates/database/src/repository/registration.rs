//! Rows written by the signup flow.
//!
//! Registration writes under a temporary user id first, because the real id
//! only exists once the auth provider has created the account. The caller
//! rekeys the rows afterwards, or deletes them if any step fails.

use super::DbRepository;
use crate::DbError;
use core_types::payloads::{InvoiceInput, MapInfoInput};
use core_types::validation::clean;
use core_types::{PlanKind, UserRole};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewParticipant {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub short_description: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RegistrationRows {
    pub user_id: Uuid,
    pub email: String,
    pub user_name: String,
    pub plan: PlanKind,
    pub participant: Option<NewParticipant>,
    pub invoice: Option<InvoiceInput>,
    pub map_info: Option<(MapInfoInput, Option<(f64, f64)>)>,
}

const REGISTRATION_TABLES: [(&str, &str); 4] = [
    ("map_info", "user_id"),
    ("invoice_data", "user_id"),
    ("participants", "user_id"),
    ("users", "id"),
];

impl DbRepository {
    /// Inserts the user row and, when present, the participant, invoice and
    /// map rows, one statement at a time.
    pub async fn insert_pending_registration(&self, rows: &RegistrationRows) -> Result<(), DbError> {
        sqlx::query(
            "INSERT INTO users (id, email, user_name, role, plan, created_at) VALUES ($1, $2, $3, $4, $5, NOW())",
        )
        .bind(rows.user_id)
        .bind(&rows.email)
        .bind(rows.user_name.trim())
        .bind(UserRole::Participant)
        .bind(rows.plan)
        .execute(&self.pool)
        .await
        .map_err(DbError::from_query)?;

        if let Some(participant) = &rows.participant {
            sqlx::query(
                r#"
                INSERT INTO participants (id, user_id, name, slug, short_description, description, website, is_active, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE, NOW())
                "#,
            )
            .bind(participant.id)
            .bind(rows.user_id)
            .bind(participant.name.trim())
            .bind(&participant.slug)
            .bind(clean(participant.short_description.as_deref()))
            .bind(clean(participant.description.as_deref()))
            .bind(clean(participant.website.as_deref()))
            .execute(&self.pool)
            .await
            .map_err(DbError::from_query)?;
        }

        if let Some(invoice) = &rows.invoice {
            self.upsert_invoice(rows.user_id, invoice).await?;
        }

        if let Some((map_info, coordinates)) = &rows.map_info {
            self.upsert_map_info(rows.user_id, map_info, *coordinates).await?;
        }

        Ok(())
    }

    /// Moves every registration row from the temporary id to the auth
    /// provider's id. The user foreign keys are deferred, so the four updates
    /// only have to be consistent at commit.
    pub async fn rekey_registration(&self, temporary_id: Uuid, user_id: Uuid) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query("UPDATE users SET id = $2 WHERE id = $1")
            .bind(temporary_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(DbError::from_query)?;
        if updated.rows_affected() != 1 {
            return Err(DbError::NotFound);
        }

        for table in ["participants", "invoice_data", "map_info"] {
            let sql = format!("UPDATE {table} SET user_id = $2 WHERE user_id = $1");
            sqlx::query(&sql)
                .bind(temporary_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await.map_err(DbError::from_query)?;
        Ok(())
    }

    /// Best-effort removal of everything registration may have written for
    /// `user_id`. Every table is attempted; the first error is returned.
    pub async fn delete_registration(&self, user_id: Uuid) -> Result<(), DbError> {
        let mut first_error = None;
        for (table, column) in REGISTRATION_TABLES {
            let sql = format!("DELETE FROM {table} WHERE {column} = $1");
            if let Err(e) = sqlx::query(&sql).bind(user_id).execute(&self.pool).await {
                tracing::warn!(error = %e, table, %user_id, "Failed to delete registration rows.");
                first_error.get_or_insert(DbError::QueryError(e));
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
