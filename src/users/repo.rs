use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    db::{map_write_error, PgStore},
    error::Result,
    store::{UserKey, UserStore},
    users::{
        dto::UserSummary,
        repo_types::{PasswordWrite, UserRow},
    },
};

const USER_COLUMNS: &str = "id, name, email, password, google_id, profile_image, role, \
                            is_active, is_email_verified, created_at, updated_at";

/// Default projection: the password column is never selected.
const USER_COLUMNS_PUBLIC: &str = "id, name, email, NULL::text AS password, google_id, \
                                   profile_image, role, is_active, is_email_verified, \
                                   created_at, updated_at";

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, row: &UserRow) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password, google_id, profile_image, role,
                               is_active, is_email_verified, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(row.id)
        .bind(&row.name)
        .bind(&row.email)
        .bind(&row.password)
        .bind(&row.google_id)
        .bind(&row.profile_image)
        .bind(&row.role)
        .bind(row.is_active)
        .bind(row.is_email_verified)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;
        Ok(())
    }

    async fn replace_user(&self, row: &UserRow, password: PasswordWrite) -> Result<bool> {
        let base = r#"
            UPDATE users
               SET name = $2, email = $3, google_id = $4, profile_image = $5, role = $6,
                   is_active = $7, is_email_verified = $8, created_at = $9, updated_at = $10
            "#;
        let sql = match password {
            PasswordWrite::Keep => format!("{base} WHERE id = $1"),
            PasswordWrite::Set(_) => format!("{base}, password = $11 WHERE id = $1"),
        };

        let mut query = sqlx::query(&sql)
            .bind(row.id)
            .bind(&row.name)
            .bind(&row.email)
            .bind(&row.google_id)
            .bind(&row.profile_image)
            .bind(&row.role)
            .bind(row.is_active)
            .bind(row.is_email_verified)
            .bind(row.created_at)
            .bind(row.updated_at);
        if let PasswordWrite::Set(value) = password {
            query = query.bind(value);
        }

        let result = query.execute(&self.pool).await.map_err(map_write_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_user(&self, key: UserKey<'_>, with_password: bool) -> Result<Option<UserRow>> {
        let columns = if with_password {
            USER_COLUMNS
        } else {
            USER_COLUMNS_PUBLIC
        };
        let row = match key {
            UserKey::Id(id) => {
                let sql = format!("SELECT {columns} FROM users WHERE id = $1");
                sqlx::query_as::<_, UserRow>(&sql)
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?
            }
            UserKey::Email(email) => {
                let sql = format!("SELECT {columns} FROM users WHERE email = $1");
                sqlx::query_as::<_, UserRow>(&sql)
                    .bind(email)
                    .fetch_optional(&self.pool)
                    .await?
            }
            UserKey::GoogleId(google_id) => {
                let sql = format!("SELECT {columns} FROM users WHERE google_id = $1");
                sqlx::query_as::<_, UserRow>(&sql)
                    .bind(google_id)
                    .fetch_optional(&self.pool)
                    .await?
            }
        };
        Ok(row)
    }

    async fn find_user_summaries(&self, ids: &[Uuid]) -> Result<Vec<UserSummary>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT id, name, email, profile_image
              FROM users
             WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
