use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::dto::UserSummary;

/// Input for a contact-form submission.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewContact {
    pub name: String,
    pub email: String,
    pub message: String,
    pub user_id: Option<Uuid>,
}

/// Whether read methods replace `userId` with the referenced user's fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Population {
    #[default]
    Expand,
    /// Keep the stored identifier. Used by internal lookups.
    Raw,
}

/// The `userId` of a contact as returned by reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum UserRef {
    Id(Uuid),
    Populated(UserSummary),
}

/// Read representation of a contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub message: String,
    pub user_id: Option<UserRef>,
    pub is_read: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Owner {
    #[default]
    Any,
    Anonymous,
    User(Uuid),
}

/// Filter for contact listings, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactQuery {
    pub owner: Owner,
    pub is_read: Option<bool>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for ContactQuery {
    fn default() -> Self {
        Self {
            owner: Owner::Any,
            is_read: None,
            limit: default_limit(),
            offset: 0,
        }
    }
}

fn default_limit() -> i64 {
    20
}

impl ContactQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn owner(mut self, owner: Owner) -> Self {
        self.owner = owner;
        self
    }

    pub fn for_user(self, user_id: Uuid) -> Self {
        self.owner(Owner::User(user_id))
    }

    pub fn anonymous(self) -> Self {
        self.owner(Owner::Anonymous)
    }

    pub fn read(mut self, is_read: bool) -> Self {
        self.is_read = Some(is_read);
        self
    }

    pub fn unread(self) -> Self {
        self.read(false)
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = limit.max(0);
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = offset.max(0);
        self
    }

    pub(crate) fn matches(&self, user_id: Option<Uuid>, is_read: bool) -> bool {
        let owner_ok = match self.owner {
            Owner::Any => true,
            Owner::Anonymous => user_id.is_none(),
            Owner::User(id) => user_id == Some(id),
        };
        owner_ok && self.is_read.map_or(true, |r| r == is_read)
    }
}
