//! Field rule tables and the validator that evaluates them before any write.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Trims surrounding whitespace, the setter applied to free-text fields.
pub(crate) fn trimmed(value: &str) -> String {
    value.trim().to_string()
}

/// Trims and lowercases, the setter applied to email fields.
pub(crate) fn normalized_email(value: &str) -> String {
    value.trim().to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    Required,
    MinLength,
    MaxLength,
    Pattern,
}

#[derive(Debug, Clone, Copy)]
pub enum Rule {
    Required,
    MinLength(usize),
    MaxLength(usize),
    Pattern(fn(&str) -> bool),
}

impl Rule {
    fn kind(&self) -> RuleKind {
        match self {
            Rule::Required => RuleKind::Required,
            Rule::MinLength(_) => RuleKind::MinLength,
            Rule::MaxLength(_) => RuleKind::MaxLength,
            Rule::Pattern(_) => RuleKind::Pattern,
        }
    }

    fn accepts(&self, value: &str) -> bool {
        match self {
            Rule::Required => !value.is_empty(),
            Rule::MinLength(min) => value.chars().count() >= *min,
            Rule::MaxLength(max) => value.chars().count() <= *max,
            Rule::Pattern(matches) => matches(value),
        }
    }
}

/// A rule paired with the message reported when it fails.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub rule: Rule,
    pub message: &'static str,
}

impl FieldRule {
    pub const fn new(rule: Rule, message: &'static str) -> Self {
        Self { rule, message }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: &'static str,
    pub kind: RuleKind,
    pub message: String,
}

/// Every rule violation of a single write, in field order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed: {}", describe(.0))]
pub struct ValidationErrors(Vec<ValidationError>);

fn describe(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    pub fn field(&self, name: &str) -> Option<&ValidationError> {
        self.0.iter().find(|e| e.field == name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Implemented by documents that carry a rule table.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

/// Collects failures across fields. A missing or empty value only reports
/// its `Required` rule; otherwise the first failing rule of a field is kept.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(
        &mut self,
        field: &'static str,
        value: Option<&str>,
        rules: &[FieldRule],
    ) -> &mut Self {
        let failed = match value.filter(|v| !v.is_empty()) {
            None => rules.iter().find(|r| matches!(r.rule, Rule::Required)),
            Some(v) => rules.iter().find(|r| !r.rule.accepts(v)),
        };
        if let Some(r) = failed {
            self.errors.push(ValidationError {
                field,
                kind: r.rule.kind(),
                message: r.message.to_string(),
            });
        }
        self
    }

    pub fn finish(&mut self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(std::mem::take(&mut self.errors)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMAIL_RULES: &[FieldRule] = &[
        FieldRule::new(Rule::Required, "Email is required"),
        FieldRule::new(Rule::Pattern(is_valid_email), "Please provide a valid email"),
    ];

    #[test]
    fn accepts_well_formed_emails() {
        for email in [
            "jane@example.com",
            "first.last@sub.example.org",
            "dev+tag@mail.co",
            "a@b.io",
        ] {
            assert!(is_valid_email(email), "{email} should be valid");
        }
    }

    #[test]
    fn rejects_emails_without_at_or_domain_suffix() {
        for email in [
            "plainaddress",
            "jane.example.com",
            "jane@example",
            "jane@",
            "@example.com",
            "jane doe@example.com",
            "jane@@example.com",
        ] {
            assert!(!is_valid_email(email), "{email} should be invalid");
        }
    }

    #[test]
    fn normalizers_trim_and_lowercase() {
        assert_eq!(trimmed("  Jane  "), "Jane");
        assert_eq!(normalized_email("  Jane@Example.COM "), "jane@example.com");
    }

    #[test]
    fn missing_value_reports_only_required() {
        let err = Validator::new()
            .field("email", None, EMAIL_RULES)
            .finish()
            .unwrap_err();
        assert_eq!(err.len(), 1);
        assert_eq!(err.errors()[0].kind, RuleKind::Required);
        assert_eq!(err.errors()[0].message, "Email is required");
    }

    #[test]
    fn empty_value_counts_as_missing() {
        let err = Validator::new()
            .field("email", Some(""), EMAIL_RULES)
            .finish()
            .unwrap_err();
        assert_eq!(err.field("email").unwrap().kind, RuleKind::Required);
    }

    #[test]
    fn optional_field_skips_rules_when_absent() {
        let rules = [FieldRule::new(Rule::MaxLength(3), "too long")];
        assert!(Validator::new().field("nick", None, &rules).finish().is_ok());
    }

    #[test]
    fn collects_failures_across_fields() {
        let name_rules = [
            FieldRule::new(Rule::Required, "Name is required"),
            FieldRule::new(Rule::MaxLength(5), "Name is too long"),
        ];
        let err = Validator::new()
            .field("name", Some("abcdefg"), &name_rules)
            .field("email", Some("nope"), EMAIL_RULES)
            .finish()
            .unwrap_err();
        assert_eq!(err.len(), 2);
        assert_eq!(err.field("name").unwrap().kind, RuleKind::MaxLength);
        assert_eq!(
            err.field("email").unwrap().message,
            "Please provide a valid email"
        );
        assert_eq!(
            err.to_string(),
            "validation failed: name: Name is too long; email: Please provide a valid email"
        );
    }

    #[test]
    fn lengths_count_characters_not_bytes() {
        let rules = [FieldRule::new(Rule::MaxLength(3), "too long")];
        assert!(Validator::new()
            .field("word", Some("äöü"), &rules)
            .finish()
            .is_ok());
    }
}
