use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    contacts::{
        dto::{ContactView, NewContact, UserRef},
        repo_types::ContactRow,
    },
    validation::{
        is_valid_email, normalized_email, trimmed, FieldRule, Rule, Validate, ValidationErrors,
        Validator,
    },
};

pub const NAME_MAX_LEN: usize = 50;
pub const MESSAGE_MIN_LEN: usize = 10;
pub const MESSAGE_MAX_LEN: usize = 1000;

const NAME_RULES: &[FieldRule] = &[
    FieldRule::new(Rule::Required, "Please provide your name"),
    FieldRule::new(
        Rule::MaxLength(NAME_MAX_LEN),
        "Name cannot be more than 50 characters",
    ),
];

const EMAIL_RULES: &[FieldRule] = &[
    FieldRule::new(Rule::Required, "Please provide your email"),
    FieldRule::new(Rule::Pattern(is_valid_email), "Please provide a valid email"),
];

const MESSAGE_RULES: &[FieldRule] = &[
    FieldRule::new(Rule::Required, "Please provide a message"),
    FieldRule::new(
        Rule::MinLength(MESSAGE_MIN_LEN),
        "Message must be at least 10 characters",
    ),
    FieldRule::new(
        Rule::MaxLength(MESSAGE_MAX_LEN),
        "Message cannot be more than 1000 characters",
    ),
];

/// A contact-form message as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactDocument {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub message: String,
    pub user_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl ContactDocument {
    pub fn new(input: NewContact) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: Uuid::new_v4(),
            name: input.name,
            email: input.email,
            message: input.message,
            user_id: input.user_id,
            is_read: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.user_id.is_none()
    }

    pub fn normalize(&mut self) {
        self.name = trimmed(&self.name);
        self.email = normalized_email(&self.email);
        self.message = trimmed(&self.message);
    }

    /// Read representation with the reference left as a bare id.
    pub fn to_view(&self) -> ContactView {
        ContactView {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            message: self.message.clone(),
            user_id: self.user_id.map(UserRef::Id),
            is_read: self.is_read,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl From<ContactRow> for ContactDocument {
    fn from(r: ContactRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            email: r.email,
            message: r.message,
            user_id: r.user_id,
            is_read: r.is_read,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl From<&ContactDocument> for ContactRow {
    fn from(d: &ContactDocument) -> Self {
        Self {
            id: d.id,
            name: d.name.clone(),
            email: d.email.clone(),
            message: d.message.clone(),
            user_id: d.user_id,
            is_read: d.is_read,
            created_at: d.created_at,
            updated_at: d.updated_at,
        }
    }
}

impl Validate for ContactDocument {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .field("name", Some(self.name.as_str()), NAME_RULES)
            .field("email", Some(self.email.as_str()), EMAIL_RULES)
            .field("message", Some(self.message.as_str()), MESSAGE_RULES)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::RuleKind;

    fn contact(message: &str) -> ContactDocument {
        let mut doc = ContactDocument::new(NewContact {
            name: "Jane".into(),
            email: "jane@example.com".into(),
            message: message.into(),
            user_id: None,
        });
        doc.normalize();
        doc
    }

    #[test]
    fn message_length_bounds() {
        let err = contact(&"x".repeat(9)).validate().unwrap_err();
        assert_eq!(err.field("message").unwrap().kind, RuleKind::MinLength);

        assert!(contact(&"x".repeat(10)).validate().is_ok());
        assert!(contact(&"x".repeat(1000)).validate().is_ok());

        let err = contact(&"x".repeat(1001)).validate().unwrap_err();
        assert_eq!(
            err.field("message").unwrap().message,
            "Message cannot be more than 1000 characters"
        );
    }

    #[test]
    fn message_is_trimmed_before_length_check() {
        let err = contact("   short    ").validate().unwrap_err();
        assert_eq!(err.field("message").unwrap().kind, RuleKind::MinLength);
    }

    #[test]
    fn name_is_capped_at_fifty() {
        let mut doc = contact("a perfectly fine message");
        doc.name = "n".repeat(50);
        assert!(doc.validate().is_ok());
        doc.name = "n".repeat(51);
        let err = doc.validate().unwrap_err();
        assert_eq!(err.field("name").unwrap().kind, RuleKind::MaxLength);
    }

    #[test]
    fn all_violations_are_collected() {
        let mut doc = ContactDocument::new(NewContact {
            name: "  ".into(),
            email: "jane-at-example".into(),
            message: "".into(),
            user_id: None,
        });
        doc.normalize();
        let err = doc.validate().unwrap_err();
        let fields: Vec<_> = err.errors().iter().map(|e| e.field).collect();
        assert_eq!(fields, ["name", "email", "message"]);
        assert_eq!(err.field("message").unwrap().kind, RuleKind::Required);
    }

    #[test]
    fn new_defaults_and_normalization() {
        let user = Uuid::new_v4();
        let mut doc = ContactDocument::new(NewContact {
            name: " Jane ".into(),
            email: " JANE@Example.com".into(),
            message: "  Hello there, world!  ".into(),
            user_id: Some(user),
        });
        doc.normalize();
        assert!(!doc.is_read);
        assert!(!doc.is_anonymous());
        assert_eq!(doc.name, "Jane");
        assert_eq!(doc.email, "jane@example.com");
        assert_eq!(doc.message, "Hello there, world!");
        assert_eq!(doc.to_view().user_id, Some(UserRef::Id(user)));
    }

    #[test]
    fn row_conversion_roundtrips() {
        let doc = contact("a message of some length");
        let row = ContactRow::from(&doc);
        assert_eq!(ContactDocument::from(row), doc);
    }
}
