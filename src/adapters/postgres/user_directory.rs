//! PostgreSQL implementation of UserDirectory over `chat_users`.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::domain::user::{ChatUser, Role};
use crate::ports::UserDirectory;

use super::rows::{self, db_error, get};

#[derive(Clone)]
pub struct PostgresUserDirectory {
    pool: PgPool,
}

impl PostgresUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<ChatUser>, DomainError> {
        let row = sqlx::query(
            "SELECT id, role, verified, display_name, email FROM chat_users WHERE id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to fetch user"))?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn list_by_role(
        &self,
        role: Role,
        verified_only: bool,
    ) -> Result<Vec<ChatUser>, DomainError> {
        let records = sqlx::query(
            r#"
            SELECT id, role, verified, display_name, email
            FROM chat_users
            WHERE role = $1 AND (verified OR NOT $2)
            ORDER BY lower(display_name), id
            "#,
        )
        .bind(role.as_str())
        .bind(verified_only)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list users"))?;

        records.iter().map(row_to_user).collect()
    }
}

fn row_to_user(row: &PgRow) -> Result<ChatUser, DomainError> {
    let role: String = get(row, "role")?;
    let role: Role = role.parse().map_err(|_| {
        DomainError::new(ErrorCode::DatabaseError, format!("Unknown role '{}'", role))
    })?;

    Ok(ChatUser {
        id: rows::user_id(row, "id")?,
        role,
        verified: get(row, "verified")?,
        display_name: get(row, "display_name")?,
        email: get(row, "email")?,
    })
}
