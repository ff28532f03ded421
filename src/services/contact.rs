//! Contact form validation and submission.
//!
//! DESIGN
//! ======
//! A two-step pipeline: `validate` turns untrusted field values into a
//! `ContactSubmission` or a per-field error map, then `submit` makes exactly
//! one delivery attempt through a `Mailer`. Validation failures are returned
//! with detail; delivery faults are logged and flattened to a generic message.
//!
//! Nothing is stored between calls. A resubmission is a new attempt with a new
//! correlation id.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::Serialize;
use serde::ser::SerializeMap;
use uuid::Uuid;

use super::mailer::{MailError, Mailer, OutgoingEmail};
use crate::config::SiteConfig;
use crate::render::{ContactEmail, RenderError, Templates};

pub const MSG_INVALID: &str = "Please correct the errors below";
pub const MSG_DELIVERED: &str = "Thank you for your message! We will get back to you as soon as possible.";
pub const MSG_FAILED: &str = "Something went wrong. Please try again later.";

const NAME_MIN: usize = 2;
const SUBJECT_MIN: usize = 5;
const MESSAGE_MIN: usize = 20;

// Local part may not start with a dot and the address may not contain "..";
// both are checked outside the regex since `regex` has no lookahead.
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[A-Z0-9_'+\-.]*[A-Z0-9_+\-]@([A-Z0-9][A-Z0-9\-]*\.)+[A-Z]{2,}$")
        .expect("email regex compiles")
});

// =============================================================================
// RAW INPUT
// =============================================================================

/// One untrusted field value as it arrived.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RawValue {
    #[default]
    Missing,
    Text(String),
    /// Present but not text; holds the JSON kind name (`number`, `null`, ...).
    Other(&'static str),
}

impl RawValue {
    fn from_json(value: Option<&serde_json::Value>) -> Self {
        match value {
            None => Self::Missing,
            Some(serde_json::Value::String(s)) => Self::Text(s.clone()),
            Some(serde_json::Value::Null) => Self::Other("null"),
            Some(serde_json::Value::Bool(_)) => Self::Other("boolean"),
            Some(serde_json::Value::Number(_)) => Self::Other("number"),
            Some(serde_json::Value::Array(_)) => Self::Other("array"),
            Some(serde_json::Value::Object(_)) => Self::Other("object"),
        }
    }
}

/// The four contact fields before validation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawContactFields {
    pub name: RawValue,
    pub email: RawValue,
    pub subject: RawValue,
    pub message: RawValue,
}

impl RawContactFields {
    /// All four fields present as text.
    #[must_use]
    pub fn text(name: &str, email: &str, subject: &str, message: &str) -> Self {
        Self {
            name: RawValue::Text(name.to_owned()),
            email: RawValue::Text(email.to_owned()),
            subject: RawValue::Text(subject.to_owned()),
            message: RawValue::Text(message.to_owned()),
        }
    }

    /// Read fields from a JSON body. A non-object body yields all-missing fields.
    #[must_use]
    pub fn from_json(body: &serde_json::Value) -> Self {
        let field = |key: &str| RawValue::from_json(body.as_object().and_then(|o| o.get(key)));
        Self { name: field("name"), email: field("email"), subject: field("subject"), message: field("message") }
    }

    /// Read fields from URL-encoded form data. A form has no "missing" state:
    /// an absent key reads as `null`, the way browser form data reports it.
    #[must_use]
    pub fn from_form(form: &HashMap<String, String>) -> Self {
        let field = |key: &str| form.get(key).map_or(RawValue::Other("null"), |v| RawValue::Text(v.clone()));
        Self { name: field("name"), email: field("email"), subject: field("subject"), message: field("message") }
    }

    /// Text value of a field, for echoing back into a re-rendered form.
    #[must_use]
    pub fn text_of(&self, field: ContactField) -> &str {
        match self.get(field) {
            RawValue::Text(s) => s.as_str(),
            RawValue::Missing | RawValue::Other(_) => "",
        }
    }

    fn get(&self, field: ContactField) -> &RawValue {
        match field {
            ContactField::Name => &self.name,
            ContactField::Email => &self.email,
            ContactField::Subject => &self.subject,
            ContactField::Message => &self.message,
        }
    }
}

// =============================================================================
// VALIDATED SUBMISSION + ERRORS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContactField {
    Name,
    Email,
    Subject,
    Message,
}

impl ContactField {
    pub const ALL: [Self; 4] = [Self::Name, Self::Email, Self::Subject, Self::Message];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Subject => "subject",
            Self::Message => "message",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

/// Per-field error messages, ordered by field declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<ContactField, Vec<String>>);

impl FieldErrors {
    fn push(&mut self, field: ContactField, message: String) {
        self.0.entry(field).or_default().push(message);
    }

    #[must_use]
    pub fn get(&self, field: ContactField) -> Option<&[String]> {
        self.0.get(&field).map(Vec::as_slice)
    }

    #[must_use]
    pub fn first(&self, field: ContactField) -> Option<&str> {
        self.get(field).and_then(|msgs| msgs.first()).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = ContactField> + '_ {
        self.0.keys().copied()
    }
}

impl Serialize for FieldErrors {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (field, messages) in &self.0 {
            map.serialize_entry(field.as_str(), messages)?;
        }
        map.end()
    }
}

// =============================================================================
// RESULT
// =============================================================================

/// What the presentation layer gets back for one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<FieldErrors>,
}

impl SubmissionResult {
    #[must_use]
    pub fn invalid(errors: FieldErrors) -> Self {
        Self { success: false, message: MSG_INVALID.to_owned(), field_errors: Some(errors) }
    }

    #[must_use]
    pub fn delivered() -> Self {
        Self { success: true, message: MSG_DELIVERED.to_owned(), field_errors: None }
    }

    #[must_use]
    pub fn failed() -> Self {
        Self { success: false, message: MSG_FAILED.to_owned(), field_errors: None }
    }

    #[must_use]
    pub fn is_validation_failure(&self) -> bool {
        self.field_errors.as_ref().is_some_and(|errors| !errors.is_empty())
    }
}

// =============================================================================
// DELIVERY SETTINGS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliverySettings {
    pub from: String,
    pub to: String,
    pub timeout: Duration,
}

impl DeliverySettings {
    #[must_use]
    pub fn from_config(config: &SiteConfig) -> Self {
        Self { from: config.contact_from.clone(), to: config.contact_to.clone(), timeout: config.delivery_timeout }
    }
}

// =============================================================================
// PIPELINE
// =============================================================================

/// Check every field independently and collect all failures.
///
/// Each field reports at most one message: a presence/type problem first,
/// otherwise its own rule.
///
/// # Errors
///
/// Returns the per-field errors when any rule is violated.
pub fn validate(raw: &RawContactFields) -> Result<ContactSubmission, FieldErrors> {
    let mut errors = FieldErrors::default();
    let mut check = |field: ContactField| match check_field(field, raw.get(field)) {
        Ok(value) => Some(value),
        Err(message) => {
            errors.push(field, message);
            None
        }
    };

    let name = check(ContactField::Name);
    let email = check(ContactField::Email);
    let subject = check(ContactField::Subject);
    let message = check(ContactField::Message);

    match (name, email, subject, message) {
        (Some(name), Some(email), Some(subject), Some(message)) => {
            Ok(ContactSubmission { name, email, subject, message })
        }
        _ => Err(errors),
    }
}

fn check_field(field: ContactField, raw: &RawValue) -> Result<String, String> {
    let text = match raw {
        RawValue::Missing => return Err("Required".to_owned()),
        RawValue::Other(kind) => return Err(format!("Expected string, received {kind}")),
        RawValue::Text(text) => text,
    };

    let violation = match field {
        ContactField::Name => min_chars(text, NAME_MIN, "Name"),
        ContactField::Email => (!is_valid_email(text)).then(|| "Invalid email address".to_owned()),
        ContactField::Subject => min_chars(text, SUBJECT_MIN, "Subject"),
        ContactField::Message => min_chars(text, MESSAGE_MIN, "Message"),
    };

    match violation {
        Some(message) => Err(message),
        None => Ok(text.clone()),
    }
}

fn min_chars(text: &str, min: usize, label: &str) -> Option<String> {
    (text.chars().count() < min).then(|| format!("{label} must be at least {min} characters"))
}

#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    !email.starts_with('.') && !email.contains("..") && EMAIL_RE.is_match(email)
}

/// Build the message sent to the forum inbox.
///
/// # Errors
///
/// Returns a [`RenderError`] if the email template fails to render.
pub fn render_contact_email(
    templates: &Templates,
    submission: &ContactSubmission,
    settings: &DeliverySettings,
) -> Result<OutgoingEmail, RenderError> {
    let html = templates.render(&ContactEmail {
        name: &submission.name,
        email: &submission.email,
        subject: &submission.subject,
        message_lines: submission.message.lines().collect(),
    })?;
    let subject_line: String = submission
        .subject
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();

    Ok(OutgoingEmail {
        from: settings.from.clone(),
        to: settings.to.clone(),
        subject: format!("Contact Form: {subject_line}"),
        html,
    })
}

/// Make exactly one delivery attempt. Faults never escape: they are logged
/// and turned into the generic failure result.
pub async fn submit(
    mailer: &dyn Mailer,
    templates: &Templates,
    settings: &DeliverySettings,
    submission: &ContactSubmission,
) -> SubmissionResult {
    let submission_id = Uuid::new_v4();
    let email = match render_contact_email(templates, submission, settings) {
        Ok(email) => email,
        Err(e) => {
            tracing::error!(%submission_id, error = %e, "contact email render failed");
            return SubmissionResult::failed();
        }
    };

    let outcome = match tokio::time::timeout(settings.timeout, mailer.send(&email)).await {
        Ok(result) => result,
        Err(_) => Err(MailError::Timeout(settings.timeout.as_secs())),
    };

    match outcome {
        Ok(()) => {
            tracing::info!(%submission_id, mailer = mailer.name(), "contact submission delivered");
            SubmissionResult::delivered()
        }
        Err(e) => {
            tracing::error!(%submission_id, mailer = mailer.name(), error = %e, "contact submission delivery failed");
            SubmissionResult::failed()
        }
    }
}

/// Validate, then deliver only if valid.
pub async fn handle_submission(
    mailer: &dyn Mailer,
    templates: &Templates,
    settings: &DeliverySettings,
    raw: &RawContactFields,
) -> SubmissionResult {
    match validate(raw) {
        Ok(submission) => submit(mailer, templates, settings, &submission).await,
        Err(errors) => {
            tracing::debug!(fields = ?errors.fields().map(ContactField::as_str).collect::<Vec<_>>(), "contact submission rejected");
            SubmissionResult::invalid(errors)
        }
    }
}

#[cfg(test)]
#[path = "contact_test.rs"]
mod tests;
