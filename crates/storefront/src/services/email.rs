//! Email service for OTP codes and admin mail-outs.
//!
//! Delivers through Brevo's transactional API with Askama HTML templates.
//! Without an API key the service only logs what it would have sent, which
//! keeps local development and tests free of network calls.

use askama::Template;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Serialize;
use thiserror::Error;

use crate::config::EmailConfig;
use crate::models::otp::OTP_TTL_MINUTES;

/// Brevo transactional email endpoint.
const BREVO_SEND_URL: &str = "https://api.brevo.com/v3/smtp/email";

/// Characters of HTML included in the log line of an unsent email.
const PREVIEW_CHARS: usize = 80;

/// HTML template for the signup verification code.
#[derive(Template)]
#[template(path = "email/signup_code.html")]
struct SignupCodeEmail<'a> {
    code: &'a str,
    ttl_minutes: i64,
}

/// HTML template for the password reset code.
#[derive(Template)]
#[template(path = "email/password_reset_code.html")]
struct PasswordResetCodeEmail<'a> {
    code: &'a str,
    ttl_minutes: i64,
}

/// HTML template for admin broadcasts and newsletters.
#[derive(Template)]
#[template(path = "email/broadcast.html")]
struct BroadcastEmail<'a> {
    subject: &'a str,
    body: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// No recipient address was given.
    #[error("Email recipient is required")]
    MissingRecipient,

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Brevo rejected the message.
    #[error("Brevo API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The API key cannot be used as a header value.
    #[error("Invalid API key format")]
    InvalidApiKey,

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// What happened to a message handed to [`EmailService::send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// No provider is configured; the message was only logged.
    Logged,
    /// Brevo accepted the message.
    Sent,
}

#[derive(Clone)]
enum Transport {
    Log,
    Brevo(reqwest::Client),
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    transport: Transport,
    sender: Address,
}

#[derive(Debug, Clone, Serialize)]
struct Address {
    name: String,
    email: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BrevoMessage<'a> {
    sender: &'a Address,
    to: [Recipient<'a>; 1],
    subject: &'a str,
    html_content: &'a str,
}

#[derive(Serialize)]
struct Recipient<'a> {
    email: &'a str,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the API key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &EmailConfig) -> Result<Self, EmailError> {
        let transport = match &config.brevo_api_key {
            Some(key) => {
                let mut headers = HeaderMap::new();
                headers.insert(
                    "api-key",
                    HeaderValue::from_str(key.expose_secret())
                        .map_err(|_| EmailError::InvalidApiKey)?,
                );
                headers.insert("accept", HeaderValue::from_static("application/json"));
                Transport::Brevo(reqwest::Client::builder().default_headers(headers).build()?)
            }
            None => Transport::Log,
        };

        Ok(Self {
            transport,
            sender: Address {
                name: config.from_name.clone(),
                email: config.from_email.clone(),
            },
        })
    }

    /// Whether messages actually leave the process.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        matches!(self.transport, Transport::Brevo(_))
    }

    /// Send the signup verification code.
    ///
    /// # Errors
    ///
    /// Returns error if the template fails to render or delivery fails.
    pub async fn send_signup_code(&self, to: &str, code: &str) -> Result<Delivery, EmailError> {
        let html = SignupCodeEmail {
            code,
            ttl_minutes: OTP_TTL_MINUTES,
        }
        .render()?;
        self.send(to, "HEMBIT verification code", &html).await
    }

    /// Send the password reset code.
    ///
    /// # Errors
    ///
    /// Returns error if the template fails to render or delivery fails.
    pub async fn send_password_reset_code(
        &self,
        to: &str,
        code: &str,
    ) -> Result<Delivery, EmailError> {
        let html = PasswordResetCodeEmail {
            code,
            ttl_minutes: OTP_TTL_MINUTES,
        }
        .render()?;
        self.send(to, "HEMBIT password reset code", &html).await
    }

    /// Render an admin-authored message. The body is plain text and is
    /// HTML-escaped.
    ///
    /// # Errors
    ///
    /// Returns error if the template fails to render.
    pub fn render_broadcast(subject: &str, body: &str) -> Result<String, EmailError> {
        Ok(BroadcastEmail { subject, body }.render()?)
    }

    /// Send one HTML email.
    ///
    /// # Errors
    ///
    /// Returns `EmailError::MissingRecipient` for a blank address, or a
    /// transport error when Brevo is configured and the request fails.
    pub async fn send(&self, to: &str, subject: &str, html: &str) -> Result<Delivery, EmailError> {
        let to = to.trim();
        if to.is_empty() {
            return Err(EmailError::MissingRecipient);
        }

        let client = match &self.transport {
            Transport::Log => {
                let preview: String = html.chars().take(PREVIEW_CHARS).collect();
                tracing::info!(to = %to, subject = %subject, html_preview = %preview, "email not sent (no provider configured)");
                return Ok(Delivery::Logged);
            }
            Transport::Brevo(client) => client,
        };

        let message = BrevoMessage {
            sender: &self.sender,
            to: [Recipient { email: to }],
            subject,
            html_content: html,
        };
        let response = client.post(BREVO_SEND_URL).json(&message).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmailError::Api {
                status: status.as_u16(),
                message,
            });
        }

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(Delivery::Sent)
    }
}
