use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{debug, info};

use crate::{
    config::AppConfig,
    contacts::Contacts,
    error::{Error, Result},
    users::Users,
};

pub const USERS_EMAIL_INDEX: &str = "users_email_unique";
pub const USERS_GOOGLE_ID_INDEX: &str = "users_google_id_sparse";

/// Collections and index requests, applied idempotently on registration.
/// `contacts.user_id` is a weak reference: no foreign key, no cascade.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id                UUID PRIMARY KEY,
        name              TEXT NOT NULL,
        email             TEXT NOT NULL,
        password          TEXT,
        google_id         TEXT,
        profile_image     TEXT,
        role              TEXT NOT NULL DEFAULT 'user' CHECK (role IN ('user', 'admin')),
        is_active         BOOLEAN NOT NULL DEFAULT TRUE,
        is_email_verified BOOLEAN NOT NULL DEFAULT FALSE,
        created_at        TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at        TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS users_email_unique ON users (email)",
    concat!(
        "CREATE UNIQUE INDEX IF NOT EXISTS users_google_id_sparse",
        " ON users (google_id) WHERE google_id IS NOT NULL",
    ),
    r#"
    CREATE TABLE IF NOT EXISTS contacts (
        id         UUID PRIMARY KEY,
        name       TEXT NOT NULL,
        email      TEXT NOT NULL,
        message    TEXT NOT NULL,
        user_id    UUID,
        is_read    BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    concat!(
        "CREATE INDEX IF NOT EXISTS contacts_user_id_created_at_idx",
        " ON contacts (user_id, created_at DESC)",
    ),
    "CREATE INDEX IF NOT EXISTS contacts_is_read_idx ON contacts (is_read)",
    "CREATE INDEX IF NOT EXISTS contacts_email_idx ON contacts (email)",
];

/// Postgres-backed document store.
#[derive(Clone)]
pub struct PgStore {
    pub(crate) pool: PgPool,
}

impl PgStore {
    pub async fn connect(config: &AppConfig) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// User repository over this store, hashing with the configured cost.
    pub fn users(&self, config: &AppConfig) -> Users<PgStore> {
        Users::new(self.clone()).with_hash_cost(config.password_hash_cost)
    }

    pub fn contacts(&self) -> Contacts<PgStore, PgStore> {
        Contacts::new(self.clone(), self.clone())
    }

    /// Creates the `users` and `contacts` collections and their indexes if
    /// they are missing. Existing structure is never altered.
    pub async fn register_schemas(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
            debug!(statement = statement.trim(), "schema statement applied");
        }
        info!(statements = SCHEMA.len(), "schemas registered");
        Ok(())
    }
}

/// Field reported for a unique violation on the given constraint.
pub(crate) fn duplicate_field(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some(USERS_EMAIL_INDEX) => "email",
        Some(USERS_GOOGLE_ID_INDEX) => "googleId",
        Some("users_pkey") | Some("contacts_pkey") => "id",
        _ => "unknown",
    }
}

/// Turns unique violations into `Error::Duplicate`, everything else into
/// `Error::Database`.
pub(crate) fn map_write_error(err: sqlx::Error) -> Error {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return Error::Duplicate {
                field: duplicate_field(db.constraint()),
            };
        }
    }
    Error::Database(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_constraints_map_to_fields() {
        assert_eq!(duplicate_field(Some(USERS_EMAIL_INDEX)), "email");
        assert_eq!(duplicate_field(Some(USERS_GOOGLE_ID_INDEX)), "googleId");
        assert_eq!(duplicate_field(Some("users_pkey")), "id");
        assert_eq!(duplicate_field(Some("something_else")), "unknown");
        assert_eq!(duplicate_field(None), "unknown");
    }

    #[test]
    fn non_database_errors_pass_through() {
        let err = map_write_error(sqlx::Error::RowNotFound);
        assert!(matches!(err, Error::Database(sqlx::Error::RowNotFound)));
    }

    #[test]
    fn schema_declares_requested_indexes() {
        let joined = SCHEMA.join("\n");
        let email_index =
            format!("UNIQUE INDEX IF NOT EXISTS {USERS_EMAIL_INDEX} ON users (email)");
        assert!(joined.contains(&email_index));
        assert!(joined.contains("ON users (google_id) WHERE google_id IS NOT NULL"));
        assert!(joined.contains("ON contacts (user_id, created_at DESC)"));
        assert!(joined.contains("ON contacts (is_read)"));
        assert!(joined.contains("ON contacts (email)"));
        assert!(!joined.contains("REFERENCES"));
    }
}
