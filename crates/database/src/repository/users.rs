use super::DbRepository;
use crate::DbError;
use core_types::{PlanKind, User};
use uuid::Uuid;

impl DbRepository {
    pub async fn get_user(&self, user_id: Uuid) -> Result<User, DbError> {
        sqlx::query_as::<_, User>(
            "SELECT id, email, user_name, role, plan, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from_query)
    }

    /// Emails are stored lowercased, so the lookup is exact.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, user_name, role, plan, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn update_user_plan(&self, user_id: Uuid, plan: PlanKind) -> Result<User, DbError> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET plan = $2 WHERE id = $1 \
             RETURNING id, email, user_name, role, plan, created_at",
        )
        .bind(user_id)
        .bind(plan)
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from_query)
    }

    pub async fn list_moderator_emails(&self) -> Result<Vec<String>, DbError> {
        let emails = sqlx::query_scalar::<_, String>(
            "SELECT email FROM users WHERE role = 'moderator' ORDER BY email",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(emails)
    }
}
