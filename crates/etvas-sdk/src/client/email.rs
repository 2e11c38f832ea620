use std::fmt;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::EtvasClient;
use crate::error::{ApiError, ValidationError};
use crate::request::OutboundRequest;
use crate::signing::CONTEXT_HEADER;
use crate::validation::{
    validate_context_id, validate_email, validate_locale, validate_message, validate_subject,
};

/// Notification sent to the customer behind a context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailNotification {
    /// Two-letter language code
    pub locale: String,
    pub subject: String,
    pub message: String,
}

impl EmailNotification {
    pub fn new(
        locale: impl Into<String>,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            locale: locale.into(),
            subject: subject.into(),
            message: message.into(),
        }
    }
}

/// Email recipient, rendered as `Name <email>` or a bare address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
}

impl Recipient {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            name: None,
            email: email.into(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name.as_deref().filter(|name| !name.is_empty()) {
            Some(name) => write!(f, "{} <{}>", name, self.email),
            None => f.write_str(&self.email),
        }
    }
}

impl From<&str> for Recipient {
    fn from(email: &str) -> Self {
        Self::new(email)
    }
}

/// Plain-text email to arbitrary recipients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEmail {
    pub to: Vec<Recipient>,
    #[serde(default)]
    pub cc: Option<Vec<Recipient>>,
    #[serde(default)]
    pub bcc: Option<Vec<Recipient>>,
    pub subject: String,
    pub text: String,
}

impl RawEmail {
    pub fn new(to: Vec<Recipient>, subject: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            to,
            cc: None,
            bcc: None,
            subject: subject.into(),
            text: text.into(),
        }
    }

    pub fn with_cc(mut self, cc: Vec<Recipient>) -> Self {
        self.cc = Some(cc);
        self
    }

    pub fn with_bcc(mut self, bcc: Vec<Recipient>) -> Self {
        self.bcc = Some(bcc);
        self
    }

    fn validate(&self, context: &str) -> Result<(), ValidationError> {
        if self.to.is_empty() {
            return Err(ValidationError::required(context, "to"));
        }
        let recipients = self
            .to
            .iter()
            .chain(self.cc.iter().flatten())
            .chain(self.bcc.iter().flatten());
        for recipient in recipients {
            validate_email(&recipient.email, context)?;
        }
        validate_subject(&self.subject, context)?;
        validate_message(&self.text, context)?;
        Ok(())
    }
}

fn format_recipients(recipients: &[Recipient]) -> Vec<String> {
    recipients.iter().map(Recipient::to_string).collect()
}

impl EtvasClient {
    /// Send a notification email to the customer behind `context_id`.
    ///
    /// Returns `true` when the platform accepted it (204).
    pub async fn send_email(
        &self,
        context_id: &str,
        notification: &EmailNotification,
    ) -> Result<bool, ApiError> {
        const CONTEXT: &str = "sendEmailNotification";
        validate_context_id(context_id, CONTEXT)?;
        validate_locale(&notification.locale, CONTEXT)?;
        validate_subject(&notification.subject, CONTEXT)?;
        validate_message(&notification.message, CONTEXT)?;

        let request = OutboundRequest::new("/user/notify")
            .with_method(Method::POST)
            .with_header(CONTEXT_HEADER, context_id)
            .with_json(json!({
                "locale": notification.locale,
                "subject": notification.subject,
                "message": notification.message,
            }));

        let response = self.execute(request).await?;
        Ok(response.status == 204)
    }

    /// Send a plain-text email.
    ///
    /// Returns `true` when the platform accepted it (204).
    pub async fn send_raw_email(&self, email: &RawEmail) -> Result<bool, ApiError> {
        email.validate("sendRawEmail")?;

        let mut body = json!({
            "to": format_recipients(&email.to),
            "subject": email.subject,
            "text": email.text,
        });
        if let Some(cc) = &email.cc {
            body["cc"] = json!(format_recipients(cc));
        }
        if let Some(bcc) = &email.bcc {
            body["bcc"] = json!(format_recipients(bcc));
        }

        let request = OutboundRequest::new("/email/send")
            .with_method(Method::POST)
            .with_json(body);

        let response = self.execute(request).await?;
        Ok(response.status == 204)
    }
}

#[cfg(test)]
#[path = "email_tests.rs"]
mod tests;
