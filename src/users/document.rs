use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    error::{Error, Result},
    users::{
        dto::{NewUser, PublicUser, UserSummary},
        password::{hash_password, verify_password},
        repo_types::{PasswordWrite, Role, UserRow},
    },
    validation::{
        is_valid_email, normalized_email, trimmed, FieldRule, Rule, Validate, ValidationErrors,
        Validator,
    },
};

const NAME_RULES: &[FieldRule] = &[FieldRule::new(Rule::Required, "Please provide a name")];

const EMAIL_RULES: &[FieldRule] = &[
    FieldRule::new(Rule::Required, "Please provide an email"),
    FieldRule::new(Rule::Pattern(is_valid_email), "Please provide a valid email"),
];

/// State of the password field relative to what is stored.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// No password: a federated-identity account.
    Absent,
    /// Read without the password projection; the stored value is unknown.
    NotLoaded,
    /// Set by the caller and not yet hashed.
    Plain(String),
    Hashed(String),
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::Absent => f.write_str("Absent"),
            Credential::NotLoaded => f.write_str("NotLoaded"),
            Credential::Plain(_) => f.write_str("Plain(..)"),
            Credential::Hashed(_) => f.write_str("Hashed(..)"),
        }
    }
}

/// A user as loaded from or about to be written to the store.
#[derive(Debug, Clone)]
pub struct UserDocument {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    credential: Credential,
    pub google_id: Option<String>,
    pub profile_image: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub is_email_verified: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl UserDocument {
    /// Builds an unsaved document with schema defaults and a fresh id.
    pub fn new(input: NewUser) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: Uuid::new_v4(),
            name: input.name,
            email: input.email,
            credential: input.password.map_or(Credential::Absent, Credential::Plain),
            google_id: input.google_id,
            profile_image: input.profile_image,
            role: input.role.unwrap_or_default(),
            is_active: input.is_active.unwrap_or(true),
            is_email_verified: input.is_email_verified.unwrap_or(false),
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn from_row(row: UserRow, password_loaded: bool) -> Result<Self> {
        let credential = match (password_loaded, row.password) {
            (false, _) => Credential::NotLoaded,
            (true, Some(hash)) => Credential::Hashed(hash),
            (true, None) => Credential::Absent,
        };
        Ok(Self {
            id: row.id,
            name: row.name,
            email: row.email,
            credential,
            google_id: row.google_id,
            profile_image: row.profile_image,
            role: row.role.parse()?,
            is_active: row.is_active,
            is_email_verified: row.is_email_verified,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    /// Row image for the store. Only meaningful after `prepare_for_save`.
    pub(crate) fn to_row(&self) -> (UserRow, PasswordWrite) {
        let write = match &self.credential {
            Credential::Absent => PasswordWrite::Set(None),
            Credential::Hashed(hash) => PasswordWrite::Set(Some(hash.clone())),
            Credential::NotLoaded | Credential::Plain(_) => PasswordWrite::Keep,
        };
        let password = match &write {
            PasswordWrite::Set(value) => value.clone(),
            PasswordWrite::Keep => None,
        };
        let row = UserRow {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            password,
            google_id: self.google_id.clone(),
            profile_image: self.profile_image.clone(),
            role: self.role.as_str().to_string(),
            is_active: self.is_active,
            is_email_verified: self.is_email_verified,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        (row, write)
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn set_password(&mut self, plain: impl Into<String>) {
        self.credential = Credential::Plain(plain.into());
    }

    /// Drops the password, leaving a federated-only account.
    pub fn clear_password(&mut self) {
        self.credential = Credential::Absent;
    }

    pub fn is_password_modified(&self) -> bool {
        matches!(self.credential, Credential::Plain(_))
    }

    /// Applies the field setters: trim the name, trim and lowercase the email.
    pub fn normalize(&mut self) {
        self.name = trimmed(&self.name);
        self.email = normalized_email(&self.email);
    }

    /// Hashes a pending plaintext password. Leaves every other state alone.
    pub fn prepare_for_save(&mut self, cost: u32) -> Result<()> {
        if let Credential::Plain(plain) = &self.credential {
            let hash = hash_password(plain, cost)?;
            self.credential = Credential::Hashed(hash);
        }
        Ok(())
    }

    /// Checks a candidate password against the stored hash. Accounts without
    /// a password never match; a pending plaintext has nothing to compare to.
    pub fn verify_credential(&self, candidate: &str) -> Result<bool> {
        match &self.credential {
            Credential::Absent => Ok(false),
            Credential::NotLoaded => Err(Error::CredentialNotLoaded),
            Credential::Plain(_) => Err(Error::CredentialNotHashed),
            Credential::Hashed(hash) => Ok(verify_password(candidate, hash)?),
        }
    }

    /// Output form of the document, never carrying the password.
    pub fn to_output(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            google_id: self.google_id.clone(),
            profile_image: self.profile_image.clone(),
            role: self.role,
            is_active: self.is_active,
            is_email_verified: self.is_email_verified,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            profile_image: self.profile_image.clone(),
        }
    }
}

impl Validate for UserDocument {
    fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        Validator::new()
            .field("name", Some(self.name.as_str()), NAME_RULES)
            .field("email", Some(self.email.as_str()), EMAIL_RULES)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{users::password::MIN_HASH_COST, validation::RuleKind};

    fn input() -> NewUser {
        NewUser {
            name: "  Ada Lovelace ".into(),
            email: " Ada@Example.COM ".into(),
            password: Some("analytical-engine".into()),
            ..Default::default()
        }
    }

    #[test]
    fn new_applies_schema_defaults() {
        let doc = UserDocument::new(NewUser {
            name: "Grace".into(),
            email: "grace@example.com".into(),
            ..Default::default()
        });
        assert_eq!(doc.role, Role::User);
        assert!(doc.is_active);
        assert!(!doc.is_email_verified);
        assert_eq!(doc.profile_image, None);
        assert_eq!(doc.credential(), &Credential::Absent);
        assert_eq!(doc.created_at, doc.updated_at);
    }

    #[test]
    fn normalize_trims_and_lowercases() {
        let mut doc = UserDocument::new(input());
        doc.normalize();
        assert_eq!(doc.name, "Ada Lovelace");
        assert_eq!(doc.email, "ada@example.com");
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn validate_reports_every_failing_field() {
        let mut doc = UserDocument::new(NewUser {
            name: "   ".into(),
            email: "not-an-email".into(),
            ..Default::default()
        });
        doc.normalize();
        let err = doc.validate().unwrap_err();
        assert_eq!(err.len(), 2);
        assert_eq!(err.field("name").unwrap().kind, RuleKind::Required);
        assert_eq!(
            err.field("email").unwrap().message,
            "Please provide a valid email"
        );
    }

    #[test]
    fn prepare_for_save_hashes_plaintext_once() {
        let mut doc = UserDocument::new(input());
        assert!(doc.is_password_modified());
        doc.prepare_for_save(MIN_HASH_COST).expect("hash");
        let Credential::Hashed(first) = doc.credential().clone() else {
            panic!("expected a hash, got {:?}", doc.credential());
        };
        assert_ne!(first, "analytical-engine");
        assert!(!doc.is_password_modified());

        doc.prepare_for_save(MIN_HASH_COST).expect("no-op");
        assert_eq!(doc.credential(), &Credential::Hashed(first));
    }

    #[test]
    fn prepare_for_save_leaves_unloaded_and_absent_alone() {
        let mut doc = UserDocument::new(input());
        doc.credential = Credential::NotLoaded;
        doc.prepare_for_save(MIN_HASH_COST).unwrap();
        assert_eq!(doc.credential(), &Credential::NotLoaded);

        doc.clear_password();
        doc.prepare_for_save(MIN_HASH_COST).unwrap();
        assert_eq!(doc.credential(), &Credential::Absent);
    }

    #[test]
    fn verify_credential_matches_only_the_set_password() {
        let mut doc = UserDocument::new(input());
        doc.prepare_for_save(MIN_HASH_COST).unwrap();
        assert!(doc.verify_credential("analytical-engine").unwrap());
        assert!(!doc.verify_credential("difference-engine").unwrap());
    }

    #[test]
    fn verify_credential_without_password() {
        let mut doc = UserDocument::new(input());
        doc.clear_password();
        assert!(!doc.verify_credential("anything").unwrap());

        doc.credential = Credential::NotLoaded;
        assert!(matches!(
            doc.verify_credential("anything"),
            Err(Error::CredentialNotLoaded)
        ));
    }

    #[test]
    fn verify_credential_before_hashing_is_an_error() {
        let doc = UserDocument::new(input());
        assert!(doc.is_password_modified());
        for candidate in ["analytical-engine", "difference-engine"] {
            assert!(matches!(
                doc.verify_credential(candidate),
                Err(Error::CredentialNotHashed)
            ));
        }

        let mut changed = UserDocument::new(input());
        changed.prepare_for_save(MIN_HASH_COST).unwrap();
        changed.set_password("new-secret-value");
        assert!(matches!(
            changed.verify_credential("new-secret-value"),
            Err(Error::CredentialNotHashed)
        ));
    }

    #[test]
    fn output_never_contains_password() {
        let mut doc = UserDocument::new(input());
        doc.prepare_for_save(MIN_HASH_COST).unwrap();
        let json = serde_json::to_value(doc.to_output()).unwrap();
        let obj = json.as_object().unwrap();
        assert!(!obj.contains_key("password"));
        assert!(obj.contains_key("profileImage"));
        assert!(!obj.contains_key("googleId"));
        assert_eq!(obj["role"], "user");
        assert_eq!(obj["isActive"], true);
    }

    #[test]
    fn debug_hides_secret_material() {
        let doc = UserDocument::new(input());
        let printed = format!("{doc:?}");
        assert!(!printed.contains("analytical-engine"));
    }

    #[test]
    fn to_row_keeps_unloaded_password() {
        let mut doc = UserDocument::new(input());
        doc.credential = Credential::NotLoaded;
        let (row, write) = doc.to_row();
        assert_eq!(write, PasswordWrite::Keep);
        assert_eq!(row.password, None);

        doc.clear_password();
        assert_eq!(doc.to_row().1, PasswordWrite::Set(None));
    }

    #[test]
    fn from_row_rejects_unknown_role() {
        let mut doc = UserDocument::new(input());
        doc.prepare_for_save(MIN_HASH_COST).unwrap();
        let (mut row, _) = doc.to_row();
        row.role = "root".into();
        assert!(matches!(
            UserDocument::from_row(row, true),
            Err(Error::Corrupt(_))
        ));
    }
}
