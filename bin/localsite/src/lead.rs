//! Lead form submissions.
//!
//! `POST /api/lead` accepts JSON, URL-encoded or multipart bodies, drops
//! honeypot hits, and forwards the lead as a plain-text e-mail through the
//! Resend API. Browsers are redirected to the thanks page; callers sending
//! `Accept: application/json` get JSON back.

use std::{collections::BTreeMap, env, sync::Arc, time::Duration};

use axum::{
    Form, Json,
    extract::{FromRequest, Multipart, Request, State},
    http::{HeaderMap, Method, StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use localsite_core::Config;
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{error, info, warn};

/// Resend e-mail endpoint.
pub const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

/// Environment variable holding the Resend API key.
pub const API_KEY_ENV: &str = "RESEND_API_KEY";

/// Environment variable overriding the lead recipient.
pub const LEAD_TO_ENV: &str = "LEAD_TO";

/// Environment variable overriding the lead sender.
pub const LEAD_FROM_ENV: &str = "LEAD_FROM";

const NAME_KEYS: &[&str] = &["name", "Name", "full_name", "FullName"];
const EMAIL_KEYS: &[&str] = &["email", "Email"];
const PHONE_KEYS: &[&str] = &["phone", "Phone", "tel", "Tel", "telephone", "Telephone"];
const CITY_KEYS: &[&str] = &["city", "City", "town", "Town"];
const MESSAGE_KEYS: &[&str] = &["message", "Message", "notes", "Notes", "note", "Note"];
const HONEYPOT_KEYS: &[&str] = &["website", "Website", "url", "URL"];

/// Submitted form fields by name.
pub type Fields = BTreeMap<String, String>;

/// Lead handling errors. Each maps to an HTTP status.
#[derive(Debug, Error)]
pub enum LeadError {
    /// A delivery secret is not configured.
    #[error("Missing {0} env var")]
    MissingSecret(&'static str),

    /// Name, or both email and phone, are missing.
    #[error("Missing required fields: name and (email or phone).")]
    MissingFields,

    /// Body is not JSON, URL-encoded or multipart.
    #[error("Unsupported Content-Type")]
    UnsupportedContentType,

    /// Body could not be decoded.
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// The e-mail provider rejected the message.
    #[error("Resend error ({status}): {body}")]
    Provider {
        /// Provider HTTP status.
        status: u16,
        /// Provider response body.
        body: String,
    },

    /// The e-mail provider could not be reached.
    #[error("Resend request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl LeadError {
    /// HTTP status reported to the submitter.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingSecret(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::MissingFields | Self::UnsupportedContentType | Self::InvalidBody(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Provider { .. } | Self::Http(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

/// A normalized lead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lead {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub city: String,
    pub message: String,
    /// Honeypot value; bots fill it, people never see it.
    pub honeypot: String,
    /// Non-empty fields that are not one of the known aliases.
    pub extras: BTreeMap<String, String>,
}

impl Lead {
    /// Normalize submitted fields.
    ///
    /// Each known value is the first non-empty trimmed alias. `honeypot_field`
    /// is checked after the usual honeypot names.
    #[must_use]
    pub fn from_fields(fields: &Fields, honeypot_field: &str) -> Self {
        let mut honeypot = pick_first(fields, HONEYPOT_KEYS);
        if honeypot.is_empty() {
            honeypot = pick_first(fields, &[honeypot_field]);
        }

        let extras = fields
            .iter()
            .filter(|(key, _)| !is_known_key(key) && key.as_str() != honeypot_field)
            .map(|(key, value)| (key, value.trim()))
            .filter(|(_, value)| !value.is_empty())
            .map(|(key, value)| (key.clone(), value.to_string()))
            .collect();

        Self {
            name: pick_first(fields, NAME_KEYS),
            email: pick_first(fields, EMAIL_KEYS),
            phone: pick_first(fields, PHONE_KEYS),
            city: pick_first(fields, CITY_KEYS),
            message: pick_first(fields, MESSAGE_KEYS),
            honeypot,
            extras,
        }
    }

    /// Whether the honeypot was filled.
    #[must_use]
    pub fn is_spam(&self) -> bool {
        !self.honeypot.is_empty()
    }

    /// A lead needs a name and a way to reach them.
    pub fn validate(&self) -> Result<(), LeadError> {
        if self.name.is_empty() || (self.email.is_empty() && self.phone.is_empty()) {
            return Err(LeadError::MissingFields);
        }
        Ok(())
    }

    /// Plain-text e-mail body.
    #[must_use]
    pub fn email_text(&self) -> String {
        let mut lines = vec![
            format!("Name: {}", or_dash(&self.name)),
            format!("Email: {}", or_dash(&self.email)),
            format!("Phone: {}", or_dash(&self.phone)),
        ];
        if !self.city.is_empty() {
            lines.push(format!("City: {}", self.city));
        }
        if !self.message.is_empty() {
            lines.push(format!("Notes: {}", self.message));
        }
        if !self.extras.is_empty() {
            lines.push(String::new());
            lines.push("Extra fields:".to_string());
            lines.extend(self.extras.iter().map(|(key, value)| format!("{key}: {value}")));
        }
        lines.join("\n")
    }

    /// `"<prefix>: <name>"`, plus `" (<city>)"` when known.
    #[must_use]
    pub fn subject(&self, prefix: &str) -> String {
        let name = if self.name.is_empty() {
            "New Lead"
        } else {
            self.name.as_str()
        };
        if self.city.is_empty() {
            format!("{prefix}: {name}")
        } else {
            format!("{prefix}: {name} ({})", self.city)
        }
    }
}

fn pick_first(fields: &Fields, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|key| fields.get(*key))
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
        .unwrap_or_default()
        .to_string()
}

fn is_known_key(key: &str) -> bool {
    [
        NAME_KEYS,
        EMAIL_KEYS,
        PHONE_KEYS,
        CITY_KEYS,
        MESSAGE_KEYS,
        HONEYPOT_KEYS,
    ]
    .iter()
    .any(|keys| keys.contains(&key))
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}

/// Outgoing message, serialized as the Resend request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Email {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

/// Delivers lead e-mails.
pub trait Mailer: Send + Sync + 'static {
    /// Send one message.
    fn send(&self, email: &Email) -> impl Future<Output = Result<(), LeadError>> + Send;
}

/// Resend HTTP API client.
#[derive(Debug, Clone)]
pub struct ResendMailer {
    client: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
}

impl ResendMailer {
    /// Create a client. A missing key is reported when sending.
    pub fn new(api_key: Option<String>) -> Result<Self, LeadError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            endpoint: RESEND_ENDPOINT.to_string(),
        })
    }

    /// Create a client keyed from `RESEND_API_KEY`.
    pub fn from_env() -> Result<Self, LeadError> {
        Self::new(env::var(API_KEY_ENV).ok())
    }

    /// Send to another endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl Mailer for ResendMailer {
    async fn send(&self, email: &Email) -> Result<(), LeadError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(LeadError::MissingSecret(API_KEY_ENV))?;

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(email)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LeadError::Provider {
                status: status.as_u16(),
                body: if body.is_empty() {
                    "(empty response)".to_string()
                } else {
                    body
                },
            });
        }
        Ok(())
    }
}

/// Recipient, sender and response settings.
#[derive(Debug, Clone)]
pub struct LeadSettings {
    pub to: Option<String>,
    pub from: Option<String>,
    pub redirect: String,
    pub subject_prefix: String,
    pub honeypot_field: String,
}

impl LeadSettings {
    /// Settings from `[lead]`, with `LEAD_TO` and `LEAD_FROM` taking
    /// precedence.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let lead = &config.lead;
        Self {
            to: env_or(LEAD_TO_ENV, lead.to.as_deref()),
            from: env_or(LEAD_FROM_ENV, lead.from.as_deref()),
            redirect: lead.redirect.clone(),
            subject_prefix: lead.subject_prefix.clone(),
            honeypot_field: config.forms.honeypot_field.clone(),
        }
    }

    /// Build the message for a lead.
    pub fn email_for(&self, lead: &Lead) -> Result<Email, LeadError> {
        let to = self
            .to
            .clone()
            .ok_or(LeadError::MissingSecret(LEAD_TO_ENV))?;
        let from = self
            .from
            .clone()
            .ok_or(LeadError::MissingSecret(LEAD_FROM_ENV))?;

        Ok(Email {
            from,
            to: vec![to],
            subject: lead.subject(&self.subject_prefix),
            text: lead.email_text(),
            reply_to: (!lead.email.is_empty()).then(|| lead.email.clone()),
        })
    }
}

fn env_or(name: &str, configured: Option<&str>) -> Option<String> {
    env::var(name)
        .ok()
        .or_else(|| configured.map(ToString::to_string))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Shared state of the lead endpoint.
#[derive(Debug)]
pub struct LeadState<M> {
    mailer: M,
    settings: LeadSettings,
}

impl<M: Mailer> LeadState<M> {
    /// Create endpoint state.
    pub fn new(mailer: M, settings: LeadSettings) -> Self {
        Self { mailer, settings }
    }

    /// Mailer in use.
    pub fn mailer(&self) -> &M {
        &self.mailer
    }

    async fn accept(&self, request: Request) -> Result<(), LeadError> {
        let fields = read_fields(request).await?;
        let lead = Lead::from_fields(&fields, &self.settings.honeypot_field);

        if lead.is_spam() {
            info!("honeypot hit, dropping lead");
            return Ok(());
        }
        lead.validate()?;

        info!(
            name = %lead.name,
            has_email = !lead.email.is_empty(),
            has_phone = !lead.phone.is_empty(),
            city = %lead.city,
            extras = lead.extras.len(),
            "lead received"
        );

        let email = self.settings.email_for(&lead)?;
        self.mailer.send(&email).await
    }
}

/// Handler for `/api/lead`, mounted for every method.
pub async fn handle_lead<M: Mailer>(
    State(state): State<Arc<LeadState<M>>>,
    request: Request,
) -> Response {
    let method = request.method().clone();
    if method == Method::GET || method == Method::HEAD {
        return text_response(
            StatusCode::METHOD_NOT_ALLOWED,
            "Method Not Allowed. POST a lead to /api/lead.".to_string(),
        );
    }
    if method != Method::POST {
        return text_response(
            StatusCode::METHOD_NOT_ALLOWED,
            "Method Not Allowed.".to_string(),
        );
    }

    let wants_json = wants_json(request.headers());
    match state.accept(request).await {
        Ok(()) if wants_json => json_response(StatusCode::OK, json!({ "ok": true })),
        Ok(()) => Redirect::to(&state.settings.redirect).into_response(),
        Err(err) => {
            let status = err.status();
            if status.is_server_error() {
                error!(error = %err, status = status.as_u16(), "lead delivery failed");
            } else {
                warn!(error = %err, "lead rejected");
            }
            if wants_json {
                json_response(status, json!({ "ok": false, "error": err.to_string() }))
            } else {
                text_response(status, err.to_string())
            }
        }
    }
}

fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|accept| accept.to_ascii_lowercase().contains("application/json"))
}

fn json_response(status: StatusCode, body: Value) -> Response {
    (status, [(header::CACHE_CONTROL, "no-store")], Json(body)).into_response()
}

fn text_response(status: StatusCode, body: String) -> Response {
    (status, [(header::CACHE_CONTROL, "no-store")], body).into_response()
}

/// Decode the body according to its content type.
///
/// Only string values are kept from JSON bodies; multipart file parts
/// become `"[file]"`.
async fn read_fields(request: Request) -> Result<Fields, LeadError> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.contains("application/json") {
        let Json(value) = Json::<Value>::from_request(request, &())
            .await
            .map_err(|rejection| LeadError::InvalidBody(rejection.body_text()))?;
        Ok(fields_from_json(value))
    } else if content_type.contains("application/x-www-form-urlencoded") {
        let Form(pairs) = Form::<Vec<(String, String)>>::from_request(request, &())
            .await
            .map_err(|rejection| LeadError::InvalidBody(rejection.body_text()))?;
        Ok(pairs.into_iter().collect())
    } else if content_type.contains("multipart/form-data") {
        let mut multipart = Multipart::from_request(request, &())
            .await
            .map_err(|rejection| LeadError::InvalidBody(rejection.body_text()))?;

        let mut fields = Fields::new();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|err| LeadError::InvalidBody(err.body_text()))?
        {
            let Some(name) = field.name().map(ToString::to_string) else {
                continue;
            };
            let value = if field.file_name().is_some() {
                "[file]".to_string()
            } else {
                field
                    .text()
                    .await
                    .map_err(|err| LeadError::InvalidBody(err.body_text()))?
            };
            fields.insert(name, value);
        }
        Ok(fields)
    } else {
        Err(LeadError::UnsupportedContentType)
    }
}

fn fields_from_json(value: Value) -> Fields {
    let Value::Object(map) = value else {
        return Fields::new();
    };
    map.into_iter()
        .filter_map(|(key, value)| match value {
            Value::String(value) => Some((key, value)),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> Fields {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn settings() -> LeadSettings {
        LeadSettings {
            to: Some("owner@example.com".to_string()),
            from: Some("leads@example.com".to_string()),
            redirect: "/thanks/".to_string(),
            subject_prefix: "New Lead".to_string(),
            honeypot_field: "website".to_string(),
        }
    }

    #[test]
    fn test_aliases_pick_first_non_empty() {
        let lead = Lead::from_fields(
            &fields(&[
                ("Name", "  "),
                ("full_name", " Jane Doe "),
                ("Tel", "515-555-0100"),
                ("town", "Ankeny"),
                ("notes", "Two-story house"),
            ]),
            "website",
        );
        assert_eq!(lead.name, "Jane Doe");
        assert_eq!(lead.phone, "515-555-0100");
        assert_eq!(lead.city, "Ankeny");
        assert_eq!(lead.message, "Two-story house");
        assert!(lead.extras.is_empty());
        assert!(!lead.is_spam());
    }

    #[test]
    fn test_extras_skip_known_and_empty() {
        let lead = Lead::from_fields(
            &fields(&[
                ("name", "Jane"),
                ("email", "jane@example.com"),
                ("service", " Gutter guards "),
                ("budget", ""),
                ("website", ""),
            ]),
            "website",
        );
        assert_eq!(lead.extras.len(), 1);
        assert_eq!(lead.extras["service"], "Gutter guards");
    }

    #[test]
    fn test_configured_honeypot_field() {
        let lead = Lead::from_fields(&fields(&[("name", "Bot"), ("hp_company", "spam")]), "hp_company");
        assert!(lead.is_spam());
        assert!(lead.extras.is_empty());
    }

    #[test]
    fn test_validate() {
        let ok = Lead::from_fields(&fields(&[("name", "Jane"), ("phone", "1")]), "website");
        assert!(ok.validate().is_ok());

        let no_contact = Lead::from_fields(&fields(&[("name", "Jane")]), "website");
        assert!(matches!(no_contact.validate(), Err(LeadError::MissingFields)));

        let no_name = Lead::from_fields(&fields(&[("email", "a@b.c")]), "website");
        assert!(no_name.validate().is_err());
    }

    #[test]
    fn test_email_text_layout() {
        let lead = Lead::from_fields(
            &fields(&[
                ("name", "Jane"),
                ("phone", "515-555-0100"),
                ("city", "Ames"),
                ("zip", "50010"),
                ("roof", "Steep"),
            ]),
            "website",
        );
        assert_eq!(
            lead.email_text(),
            "Name: Jane\nEmail: -\nPhone: 515-555-0100\nCity: Ames\n\nExtra fields:\nroof: Steep\nzip: 50010"
        );
    }

    #[test]
    fn test_subject() {
        let mut lead = Lead {
            name: "Jane".to_string(),
            ..Lead::default()
        };
        assert_eq!(lead.subject("New Lead"), "New Lead: Jane");
        lead.city = "Ames".to_string();
        assert_eq!(lead.subject("New Lead"), "New Lead: Jane (Ames)");
    }

    #[test]
    fn test_email_for_sets_reply_to() {
        let lead = Lead::from_fields(&fields(&[("name", "Jane"), ("email", "jane@example.com")]), "website");
        let email = settings().email_for(&lead).unwrap();
        assert_eq!(email.to, vec!["owner@example.com".to_string()]);
        assert_eq!(email.reply_to.as_deref(), Some("jane@example.com"));

        let value = serde_json::to_value(&email).unwrap();
        assert_eq!(value["from"], "leads@example.com");
        assert_eq!(value["subject"], "New Lead: Jane");
    }

    #[test]
    fn test_email_for_missing_recipient() {
        let lead = Lead::from_fields(&fields(&[("name", "Jane"), ("phone", "1")]), "website");
        let mut settings = settings();
        settings.to = None;
        let err = settings.email_for(&lead).unwrap_err();
        assert!(matches!(err, LeadError::MissingSecret(LEAD_TO_ENV)));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_statuses() {
        assert_eq!(LeadError::MissingFields.status(), StatusCode::BAD_REQUEST);
        assert_eq!(LeadError::UnsupportedContentType.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            LeadError::Provider {
                status: 422,
                body: "invalid".to_string()
            }
            .status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_json_keeps_strings_only() {
        let fields = fields_from_json(json!({ "name": "Jane", "age": 40, "email": "j@x.io" }));
        assert_eq!(fields.len(), 2);
        assert!(fields_from_json(json!(["name"])).is_empty());
    }

    #[test]
    fn test_settings_env_overrides_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.toml");
        std::fs::write(
            &path,
            r#"
[site]
name = "Iowa Gutter Guards"
base_url = "https://iowagutterguards.online"

[lead]
to = "owner@example.com"
from = "leads@example.com"
redirect = "/thank-you/"
"#,
        )
        .unwrap();
        let config = Config::load(&path).unwrap();

        // SAFETY: no other test in this binary reads these variables.
        unsafe {
            env::set_var(LEAD_TO_ENV, "dispatch@example.com");
            env::remove_var(LEAD_FROM_ENV);
        }
        let to_only = LeadSettings::from_config(&config);
        unsafe {
            env::set_var(LEAD_FROM_ENV, "noreply@example.com");
        }
        let both = LeadSettings::from_config(&config);
        unsafe {
            env::remove_var(LEAD_TO_ENV);
            env::remove_var(LEAD_FROM_ENV);
        }
        let neither = LeadSettings::from_config(&config);

        assert_eq!(to_only.to.as_deref(), Some("dispatch@example.com"));
        assert_eq!(to_only.from.as_deref(), Some("leads@example.com"));
        assert_eq!(both.from.as_deref(), Some("noreply@example.com"));
        assert_eq!(neither.to.as_deref(), Some("owner@example.com"));
        assert_eq!(neither.from.as_deref(), Some("leads@example.com"));
        assert_eq!(neither.redirect, "/thank-you/");
    }

    #[test]
    fn test_resend_mailer_without_key() {
        let mailer = ResendMailer::new(Some("  ".to_string())).unwrap();
        assert!(mailer.api_key.is_none());
    }
}
