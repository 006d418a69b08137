use time::OffsetDateTime;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    error::{Error, Result},
    store::{UserKey, UserStore},
    users::{document::UserDocument, dto::NewUser, password::DEFAULT_HASH_COST},
    validation::{normalized_email, Validate},
};

/// User repository. Every write is normalised, validated and has its
/// password prepared before it reaches the store.
#[derive(Clone)]
pub struct Users<S> {
    store: S,
    hash_cost: u32,
}

impl<S: UserStore> Users<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            hash_cost: DEFAULT_HASH_COST,
        }
    }

    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn before_save(&self, doc: &mut UserDocument) -> Result<()> {
        doc.normalize();
        if let Err(errors) = doc.validate() {
            warn!(user_id = %doc.id, %errors, "user rejected by validation");
            return Err(errors.into());
        }
        doc.prepare_for_save(self.hash_cost)
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create(&self, input: NewUser) -> Result<UserDocument> {
        let mut doc = UserDocument::new(input);
        self.before_save(&mut doc)?;

        let (row, _) = doc.to_row();
        if let Err(e) = self.store.insert_user(&row).await {
            warn!(error = %e, "user insert failed");
            return Err(e);
        }
        info!(user_id = %doc.id, email = %doc.email, "user created");
        Ok(doc)
    }

    /// Whole-document replace. A password that was not changed since the
    /// document was loaded is left as stored. `doc` only takes the normalised,
    /// hashed and stamped state once the store accepts the write.
    #[instrument(skip(self, doc), fields(user_id = %doc.id))]
    pub async fn save(&self, doc: &mut UserDocument) -> Result<()> {
        let password_modified = doc.is_password_modified();
        let mut next = doc.clone();
        self.before_save(&mut next)?;
        next.updated_at = OffsetDateTime::now_utc();

        let (row, password) = next.to_row();
        if !self.store.replace_user(&row, password).await? {
            warn!("save for unknown user");
            return Err(Error::not_found("user", next.id));
        }
        *doc = next;
        info!(password_modified, "user saved");
        Ok(())
    }

    async fn find(&self, key: UserKey<'_>, with_password: bool) -> Result<Option<UserDocument>> {
        let row = self.store.find_user(key, with_password).await?;
        debug!(?key, found = row.is_some(), with_password, "user lookup");
        row.map(|r| UserDocument::from_row(r, with_password))
            .transpose()
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<UserDocument>> {
        self.find(UserKey::Id(id), false).await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserDocument>> {
        let email = normalized_email(email);
        self.find(UserKey::Email(&email), false).await
    }

    pub async fn find_by_google_id(&self, google_id: &str) -> Result<Option<UserDocument>> {
        self.find(UserKey::GoogleId(google_id), false).await
    }

    /// Like [`Self::find_by_email`] but also loads the stored hash, for
    /// credential checks.
    pub async fn find_by_email_with_password(&self, email: &str) -> Result<Option<UserDocument>> {
        let email = normalized_email(email);
        self.find(UserKey::Email(&email), true).await
    }
}
