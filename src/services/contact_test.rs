use super::*;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

// =========================================================================
// Mock mailers
// =========================================================================

#[derive(Default)]
struct CaptureMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
}

#[async_trait::async_trait]
impl Mailer for CaptureMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "capture"
    }
}

#[derive(Default)]
struct FailingMailer {
    attempts: AtomicUsize,
}

#[async_trait::async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _email: &OutgoingEmail) -> Result<(), MailError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(MailError::Delivery("smtp relay refused connection".into()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

struct StalledMailer;

#[async_trait::async_trait]
impl Mailer for StalledMailer {
    async fn send(&self, _email: &OutgoingEmail) -> Result<(), MailError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "stalled"
    }
}

fn settings() -> DeliverySettings {
    DeliverySettings {
        from: "EKGF <noreply@ekgf.org>".into(),
        to: "contact@ekgf.org".into(),
        timeout: Duration::from_secs(5),
    }
}

fn templates() -> Templates {
    Templates::new().unwrap()
}

fn valid_fields() -> RawContactFields {
    RawContactFields::text(
        "Jane Doe",
        "jane@example.com",
        "Question about EKG",
        "I would like to understand the governance model better.",
    )
}

// =========================================================================
// validate
// =========================================================================

#[test]
fn validate_accepts_fully_valid_input() {
    let submission = validate(&valid_fields()).unwrap();
    assert_eq!(submission.name, "Jane Doe");
    assert_eq!(submission.email, "jane@example.com");
    assert_eq!(submission.subject, "Question about EKG");
}

#[test]
fn validate_reports_short_name() {
    let raw = RawContactFields { name: RawValue::Text("J".into()), ..valid_fields() };
    let errors = validate(&raw).unwrap_err();
    assert_eq!(errors.get(ContactField::Name), Some(&["Name must be at least 2 characters".to_owned()][..]));
    assert_eq!(errors.fields().collect::<Vec<_>>(), vec![ContactField::Name]);
}

#[test]
fn validate_reports_bad_email() {
    let raw = RawContactFields { email: RawValue::Text("not-an-email".into()), ..valid_fields() };
    let errors = validate(&raw).unwrap_err();
    assert_eq!(errors.first(ContactField::Email), Some("Invalid email address"));
}

#[test]
fn validate_reports_short_subject_and_message_together() {
    let raw = RawContactFields {
        subject: RawValue::Text("Hi".into()),
        message: RawValue::Text("Too short.".into()),
        ..valid_fields()
    };
    let errors = validate(&raw).unwrap_err();
    assert_eq!(errors.first(ContactField::Subject), Some("Subject must be at least 5 characters"));
    assert_eq!(errors.first(ContactField::Message), Some("Message must be at least 20 characters"));
    assert!(errors.get(ContactField::Name).is_none());
    assert!(errors.get(ContactField::Email).is_none());
}

#[test]
fn validate_collects_every_field_without_short_circuit() {
    let raw = RawContactFields::text("", "", "", "");
    let errors = validate(&raw).unwrap_err();
    assert_eq!(errors.fields().collect::<Vec<_>>(), ContactField::ALL.to_vec());
    for field in ContactField::ALL {
        assert_eq!(errors.get(field).map(<[String]>::len), Some(1), "one message for {field:?}");
    }
}

#[test]
fn validate_reports_missing_and_non_text_fields() {
    let raw = RawContactFields {
        name: RawValue::Missing,
        email: RawValue::Other("number"),
        ..valid_fields()
    };
    let errors = validate(&raw).unwrap_err();
    assert_eq!(errors.first(ContactField::Name), Some("Required"));
    assert_eq!(errors.first(ContactField::Email), Some("Expected string, received number"));
}

#[test]
fn validate_counts_characters_not_bytes() {
    let raw = RawContactFields { name: RawValue::Text("é".into()), ..valid_fields() };
    let errors = validate(&raw).unwrap_err();
    assert_eq!(errors.first(ContactField::Name), Some("Name must be at least 2 characters"));

    let raw = RawContactFields { name: RawValue::Text("Zoë".into()), subject: RawValue::Text("Grüße".into()), ..valid_fields() };
    assert!(validate(&raw).is_ok());
}

#[test]
fn validate_boundaries_are_inclusive() {
    let raw = RawContactFields::text("Al", "a@b.co", "Hello", &"x".repeat(20));
    assert!(validate(&raw).is_ok());
    let raw = RawContactFields::text("Al", "a@b.co", "Hell", &"x".repeat(19));
    let errors = validate(&raw).unwrap_err();
    assert_eq!(errors.fields().collect::<Vec<_>>(), vec![ContactField::Subject, ContactField::Message]);
}

#[test]
fn validate_is_idempotent() {
    let raw = RawContactFields::text("J", "nope", "Hey", "short");
    let first = validate(&raw).unwrap_err();
    let second = validate(&raw).unwrap_err();
    assert_eq!(first, second);
}

#[test]
fn email_grammar() {
    for ok in ["jane@example.com", "o'neil+tag@mail.ekgf.org", "a_b-c@sub-domain.example.io", "JANE@EXAMPLE.COM"] {
        assert!(is_valid_email(ok), "expected valid: {ok}");
    }
    for bad in [
        "not-an-email",
        "",
        "@example.com",
        "jane@",
        "jane@example",
        "jane@example.c",
        ".jane@example.com",
        "jane..doe@example.com",
        "jane.@example.com",
        "jane doe@example.com",
        "jane@-example.com",
        "a@b@example.com",
    ] {
        assert!(!is_valid_email(bad), "expected invalid: {bad}");
    }
}

// =========================================================================
// raw input adapters
// =========================================================================

#[test]
fn from_json_classifies_values() {
    let body = serde_json::json!({
        "name": "Jane Doe",
        "email": 42,
        "subject": null,
    });
    let raw = RawContactFields::from_json(&body);
    assert_eq!(raw.name, RawValue::Text("Jane Doe".into()));
    assert_eq!(raw.email, RawValue::Other("number"));
    assert_eq!(raw.subject, RawValue::Other("null"));
    assert_eq!(raw.message, RawValue::Missing);
}

#[test]
fn from_json_non_object_is_all_missing() {
    let raw = RawContactFields::from_json(&serde_json::json!(["Jane"]));
    assert_eq!(raw, RawContactFields::default());
}

#[test]
fn from_form_reads_text_fields() {
    let mut form = HashMap::new();
    form.insert("name".to_owned(), "Jane Doe".to_owned());
    form.insert("message".to_owned(), String::new());
    let raw = RawContactFields::from_form(&form);
    assert_eq!(raw.text_of(ContactField::Name), "Jane Doe");
    assert_eq!(raw.message, RawValue::Text(String::new()));
    assert_eq!(raw.email, RawValue::Other("null"));
    assert_eq!(raw.text_of(ContactField::Email), "");
}

#[test]
fn absent_form_field_is_reported_as_null() {
    let mut form = HashMap::new();
    form.insert("name".to_owned(), "Jane Doe".to_owned());
    form.insert("subject".to_owned(), "Question about EKG".to_owned());
    form.insert("message".to_owned(), "I would like to understand the governance model better.".to_owned());

    let errors = validate(&RawContactFields::from_form(&form)).unwrap_err();

    assert_eq!(errors.fields().collect::<Vec<_>>(), vec![ContactField::Email]);
    assert_eq!(errors.first(ContactField::Email), Some("Expected string, received null"));
}

// =========================================================================
// SubmissionResult serialization
// =========================================================================

#[test]
fn invalid_result_serializes_field_errors_in_field_order() {
    let errors = validate(&RawContactFields::text("J", "nope", "Question about EKG", &"x".repeat(25))).unwrap_err();
    let json = serde_json::to_value(SubmissionResult::invalid(errors)).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "success": false,
            "message": "Please correct the errors below",
            "fieldErrors": {
                "name": ["Name must be at least 2 characters"],
                "email": ["Invalid email address"],
            },
        })
    );
}

#[test]
fn delivered_result_omits_field_errors() {
    let json = serde_json::to_value(SubmissionResult::delivered()).unwrap();
    assert_eq!(json["success"], true);
    assert!(json.get("fieldErrors").is_none());
}

// =========================================================================
// render_contact_email
// =========================================================================

#[test]
fn contact_email_escapes_user_text() {
    let submission = ContactSubmission {
        name: "<script>alert(1)</script>".into(),
        email: "jane@example.com".into(),
        subject: "Hello\r\nBcc: someone@evil.test".into(),
        message: "Line one & two\nLine three".into(),
    };
    let email = render_contact_email(&templates(), &submission, &settings()).unwrap();
    assert_eq!(email.to, "contact@ekgf.org");
    assert_eq!(email.from, "EKGF <noreply@ekgf.org>");
    assert!(!email.subject.contains('\n'));
    assert!(email.subject.starts_with("Contact Form: Hello"));
    assert!(email.html.contains("&lt;script&gt;"));
    assert!(!email.html.contains("<script>"));
    assert!(email.html.contains("Line one &amp; two<br>Line three"));
    assert!(!email.html.contains("{{"));
}

#[test]
fn contact_email_keeps_template_syntax_in_user_text() {
    let submission = ContactSubmission {
        name: "{{MESSAGE}}".into(),
        email: "jane@example.com".into(),
        subject: "{{ message_lines }}".into(),
        message: "SECRET-BODY-TEXT that is long enough".into(),
    };
    let email = render_contact_email(&templates(), &submission, &settings()).unwrap();

    assert!(email.html.contains("<p><strong>Name:</strong> {{MESSAGE}}</p>"));
    assert!(email.html.contains("<p><strong>Subject:</strong> {{ message_lines }}</p>"));
    assert_eq!(email.html.matches("SECRET-BODY-TEXT").count(), 1);
}

// =========================================================================
// handle_submission
// =========================================================================

#[tokio::test]
async fn valid_submission_is_delivered_once() {
    let mailer = CaptureMailer::default();
    let result = handle_submission(&mailer, &templates(), &settings(), &valid_fields()).await;

    assert!(result.success);
    assert_eq!(result.message, MSG_DELIVERED);
    assert!(result.field_errors.is_none());

    let sent = mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "Contact Form: Question about EKG");
}

#[tokio::test]
async fn invalid_submission_never_reaches_mailer() {
    let mailer = FailingMailer::default();
    let raw = RawContactFields { name: RawValue::Text("J".into()), ..valid_fields() };
    let result = handle_submission(&mailer, &templates(), &settings(), &raw).await;

    assert!(!result.success);
    assert_eq!(result.message, MSG_INVALID);
    assert!(result.is_validation_failure());
    assert_eq!(mailer.attempts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn delivery_fault_becomes_generic_failure() {
    let mailer = FailingMailer::default();
    let result = handle_submission(&mailer, &templates(), &settings(), &valid_fields()).await;

    assert!(!result.success);
    assert_eq!(result.message, MSG_FAILED);
    assert!(result.field_errors.is_none());
    assert!(!result.message.contains("smtp"));
    assert_eq!(mailer.attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn stalled_delivery_times_out_as_failure() {
    let settings = DeliverySettings { timeout: Duration::from_millis(50), ..settings() };
    let result = handle_submission(&StalledMailer, &templates(), &settings, &valid_fields()).await;
    assert_eq!(result, SubmissionResult::failed());
}

#[tokio::test]
async fn resubmission_is_a_new_attempt() {
    let mailer = CaptureMailer::default();
    handle_submission(&mailer, &templates(), &settings(), &valid_fields()).await;
    handle_submission(&mailer, &templates(), &settings(), &valid_fields()).await;
    assert_eq!(mailer.sent.lock().unwrap().len(), 2);
}
