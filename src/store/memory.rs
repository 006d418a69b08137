use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::{
    contacts::{dto::ContactQuery, repo_types::ContactRow},
    error::{Error, Result},
    store::{ContactStore, UserKey, UserStore},
    users::{
        dto::UserSummary,
        repo_types::{PasswordWrite, UserRow},
    },
};

/// Process-local store with the same unique indexes as the Postgres schema:
/// unique `email`, sparse unique `google_id`. Clones share state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    users: RwLock<HashMap<Uuid, UserRow>>,
    contacts: RwLock<HashMap<Uuid, ContactRow>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_user_indexes(users: &HashMap<Uuid, UserRow>, row: &UserRow) -> Result<()> {
    for other in users.values().filter(|u| u.id != row.id) {
        if other.email == row.email {
            return Err(Error::Duplicate { field: "email" });
        }
        if row.google_id.is_some() && other.google_id == row.google_id {
            return Err(Error::Duplicate { field: "googleId" });
        }
    }
    Ok(())
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, row: &UserRow) -> Result<()> {
        let mut users = self.inner.users.write().await;
        if users.contains_key(&row.id) {
            return Err(Error::Duplicate { field: "id" });
        }
        check_user_indexes(&users, row)?;
        users.insert(row.id, row.clone());
        debug!(user_id = %row.id, "memory user inserted");
        Ok(())
    }

    async fn replace_user(&self, row: &UserRow, password: PasswordWrite) -> Result<bool> {
        let mut users = self.inner.users.write().await;
        let Some(stored_password) = users.get(&row.id).map(|u| u.password.clone()) else {
            return Ok(false);
        };
        check_user_indexes(&users, row)?;
        let mut next = row.clone();
        next.password = match password {
            PasswordWrite::Keep => stored_password,
            PasswordWrite::Set(value) => value,
        };
        users.insert(row.id, next);
        Ok(true)
    }

    async fn find_user(&self, key: UserKey<'_>, with_password: bool) -> Result<Option<UserRow>> {
        let users = self.inner.users.read().await;
        let found = match key {
            UserKey::Id(id) => users.get(&id),
            UserKey::Email(email) => users.values().find(|u| u.email == email),
            UserKey::GoogleId(gid) => users
                .values()
                .find(|u| u.google_id.as_deref() == Some(gid)),
        };
        Ok(found.cloned().map(|mut row| {
            if !with_password {
                row.password = None;
            }
            row
        }))
    }

    async fn find_user_summaries(&self, ids: &[Uuid]) -> Result<Vec<UserSummary>> {
        let users = self.inner.users.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| users.get(id))
            .map(|u| UserSummary {
                id: u.id,
                name: u.name.clone(),
                email: u.email.clone(),
                profile_image: u.profile_image.clone(),
            })
            .collect())
    }
}

#[async_trait]
impl ContactStore for MemoryStore {
    async fn insert_contact(&self, row: &ContactRow) -> Result<()> {
        let mut contacts = self.inner.contacts.write().await;
        if contacts.contains_key(&row.id) {
            return Err(Error::Duplicate { field: "id" });
        }
        contacts.insert(row.id, row.clone());
        debug!(contact_id = %row.id, "memory contact inserted");
        Ok(())
    }

    async fn replace_contact(&self, row: &ContactRow) -> Result<bool> {
        let mut contacts = self.inner.contacts.write().await;
        match contacts.get_mut(&row.id) {
            Some(stored) => {
                *stored = row.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_contact(&self, id: Uuid) -> Result<Option<ContactRow>> {
        Ok(self.inner.contacts.read().await.get(&id).cloned())
    }

    async fn list_contacts(&self, query: &ContactQuery) -> Result<Vec<ContactRow>> {
        let contacts = self.inner.contacts.read().await;
        let mut rows: Vec<ContactRow> = contacts
            .values()
            .filter(|c| query.matches(c.user_id, c.is_read))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows
            .into_iter()
            .skip(usize::try_from(query.offset).unwrap_or(0))
            .take(usize::try_from(query.limit).unwrap_or(0))
            .collect())
    }

    async fn count_contacts(&self, query: &ContactQuery) -> Result<i64> {
        let contacts = self.inner.contacts.read().await;
        let n = contacts
            .values()
            .filter(|c| query.matches(c.user_id, c.is_read))
            .count();
        Ok(i64::try_from(n).unwrap_or(i64::MAX))
    }
}
