//! Store contracts the repositories write through. Implemented by
//! [`crate::db::PgStore`] and [`MemoryStore`].

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    contacts::{dto::ContactQuery, repo_types::ContactRow},
    error::Result,
    users::{
        dto::UserSummary,
        repo_types::{PasswordWrite, UserRow},
    },
};

mod memory;

pub use memory::MemoryStore;

/// Lookup keys backed by a unique index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserKey<'a> {
    Id(Uuid),
    Email(&'a str),
    GoogleId(&'a str),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Error::Duplicate` when email or googleId is taken.
    async fn insert_user(&self, row: &UserRow) -> Result<()>;

    /// Replaces the whole row. Returns `false` if no row has this id.
    async fn replace_user(&self, row: &UserRow, password: PasswordWrite) -> Result<bool>;

    /// With `with_password == false` the returned row never carries the hash.
    async fn find_user(&self, key: UserKey<'_>, with_password: bool) -> Result<Option<UserRow>>;

    /// Name, email and profile image of each existing user in `ids`.
    async fn find_user_summaries(&self, ids: &[Uuid]) -> Result<Vec<UserSummary>>;
}

#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn insert_contact(&self, row: &ContactRow) -> Result<()>;

    /// Replaces the whole row. Returns `false` if no row has this id.
    async fn replace_contact(&self, row: &ContactRow) -> Result<bool>;

    async fn find_contact(&self, id: Uuid) -> Result<Option<ContactRow>>;

    /// Matching rows ordered by `created_at` descending.
    async fn list_contacts(&self, query: &ContactQuery) -> Result<Vec<ContactRow>>;

    /// Matching rows, ignoring limit and offset.
    async fn count_contacts(&self, query: &ContactQuery) -> Result<i64>;
}
