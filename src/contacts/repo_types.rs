use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Contact record in the database.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ContactRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub message: String,
    pub user_id: Option<Uuid>, // weak reference to users.id; NULL for anonymous submissions
    pub is_read: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}
