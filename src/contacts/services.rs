use std::collections::HashMap;

use time::OffsetDateTime;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    contacts::{
        document::ContactDocument,
        dto::{ContactQuery, ContactView, NewContact, Population, UserRef},
        repo_types::ContactRow,
    },
    error::{Error, Result},
    store::{ContactStore, UserStore},
    validation::Validate,
};

/// Contact repository. Read methods expand `userId` into the referenced
/// user's name, email and profile image unless asked for `Population::Raw`.
#[derive(Clone)]
pub struct Contacts<C, U> {
    contacts: C,
    users: U,
}

impl<C: ContactStore, U: UserStore> Contacts<C, U> {
    pub fn new(contacts: C, users: U) -> Self {
        Self { contacts, users }
    }

    fn before_save(doc: &mut ContactDocument) -> Result<()> {
        doc.normalize();
        doc.validate().map_err(|errors| {
            warn!(contact_id = %doc.id, %errors, "contact rejected by validation");
            Error::from(errors)
        })
    }

    /// Stores a new submission. The returned document keeps `user_id` as a
    /// bare identifier.
    #[instrument(skip(self, input), fields(user_id = ?input.user_id))]
    pub async fn submit(&self, input: NewContact) -> Result<ContactDocument> {
        let mut doc = ContactDocument::new(input);
        Self::before_save(&mut doc)?;
        self.contacts.insert_contact(&ContactRow::from(&doc)).await?;
        info!(contact_id = %doc.id, anonymous = doc.is_anonymous(), "contact submitted");
        Ok(doc)
    }

    /// Whole-document replace. `doc` is updated only when the write succeeds.
    #[instrument(skip(self, doc), fields(contact_id = %doc.id))]
    pub async fn save(&self, doc: &mut ContactDocument) -> Result<()> {
        let mut next = doc.clone();
        Self::before_save(&mut next)?;
        next.updated_at = OffsetDateTime::now_utc();
        if !self.contacts.replace_contact(&ContactRow::from(&next)).await? {
            warn!("save for unknown contact");
            return Err(Error::not_found("contact", next.id));
        }
        *doc = next;
        info!("contact saved");
        Ok(())
    }

    /// Flags a contact as read and returns it, expanded like any other read.
    #[instrument(skip(self))]
    pub async fn mark_read(&self, id: Uuid) -> Result<ContactView> {
        let mut doc = self
            .find_document(id)
            .await?
            .ok_or_else(|| Error::not_found("contact", id))?;
        if !doc.is_read {
            doc.is_read = true;
            self.save(&mut doc).await?;
        }
        let mut views = self.expand(vec![doc], Population::Expand).await?;
        views.pop().ok_or_else(|| Error::not_found("contact", id))
    }

    /// Unexpanded lookup for internal use.
    pub async fn find_document(&self, id: Uuid) -> Result<Option<ContactDocument>> {
        Ok(self.contacts.find_contact(id).await?.map(ContactDocument::from))
    }

    pub async fn find_by_id(
        &self,
        id: Uuid,
        population: Population,
    ) -> Result<Option<ContactView>> {
        let Some(doc) = self.find_document(id).await? else {
            return Ok(None);
        };
        Ok(self.expand(vec![doc], population).await?.pop())
    }

    pub async fn find_one(
        &self,
        query: ContactQuery,
        population: Population,
    ) -> Result<Option<ContactView>> {
        let mut views = self.list(query.limit(1), population).await?;
        Ok(views.pop())
    }

    /// Newest first.
    pub async fn list(
        &self,
        query: ContactQuery,
        population: Population,
    ) -> Result<Vec<ContactView>> {
        let docs = self
            .contacts
            .list_contacts(&query)
            .await?
            .into_iter()
            .map(ContactDocument::from)
            .collect();
        self.expand(docs, population).await
    }

    pub async fn count(&self, query: ContactQuery) -> Result<i64> {
        self.contacts.count_contacts(&query).await
    }

    /// One user lookup for all distinct references. A reference to a user
    /// that no longer exists expands to `None`.
    async fn expand(
        &self,
        docs: Vec<ContactDocument>,
        population: Population,
    ) -> Result<Vec<ContactView>> {
        if population == Population::Raw {
            return Ok(docs.iter().map(ContactDocument::to_view).collect());
        }

        let mut ids: Vec<Uuid> = docs.iter().filter_map(|d| d.user_id).collect();
        ids.sort_unstable();
        ids.dedup();

        let summaries: HashMap<Uuid, _> = self
            .users
            .find_user_summaries(&ids)
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();
        debug!(requested = ids.len(), found = summaries.len(), "contact users expanded");

        Ok(docs
            .iter()
            .map(|doc| {
                let mut view = doc.to_view();
                view.user_id = doc
                    .user_id
                    .and_then(|id| summaries.get(&id).cloned())
                    .map(UserRef::Populated);
                view
            })
            .collect())
    }
}
