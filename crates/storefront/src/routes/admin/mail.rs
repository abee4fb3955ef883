//! Admin broadcasts to registered users and newsletter subscribers.
//!
//! Recipients are resolved from the store, mail goes out one recipient at a
//! time, and each run is recorded in the mail log. A run with failures
//! answers 207 with the first failures listed.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use hembit_core::MailAudience;

use crate::error::{ApiJson, AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{MailLog, Subscriber};
use crate::routes::all_present;
use crate::services::mailing::{MailReport, SendFailure, send_bulk};
use crate::state::AppState;

// =============================================================================
// Recipients
// =============================================================================

/// Recipient lists for each audience.
#[derive(Debug, Serialize)]
pub struct AudienceLists {
    pub users: Vec<String>,
    pub subscribers: Vec<String>,
    pub both: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct AudienceCounts {
    pub users: usize,
    pub subscribers: usize,
    pub both: usize,
}

#[derive(Debug, Serialize)]
pub struct RecipientsResponse {
    pub recipients: AudienceLists,
    pub counts: AudienceCounts,
}

/// Deduplicated, lowercased addresses for every audience.
#[instrument(skip(state, _admin))]
pub async fn recipients(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Json<RecipientsResponse> {
    let recipients = state.store().read(|doc| AudienceLists {
        users: doc.audience_emails(MailAudience::Users),
        subscribers: doc.audience_emails(MailAudience::Subscribers),
        both: doc.audience_emails(MailAudience::Both),
    });
    let counts = AudienceCounts {
        users: recipients.users.len(),
        subscribers: recipients.subscribers.len(),
        both: recipients.both.len(),
    };
    Json(RecipientsResponse { recipients, counts })
}

// =============================================================================
// Sending
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct SendMailRequest {
    pub subject: Option<String>,
    pub body: Option<String>,
    pub audience: Option<String>,
}

/// Outcome of a broadcast.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMailResponse {
    pub message: String,
    pub sent_count: usize,
    pub failed_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<SendFailure>,
}

impl SendMailResponse {
    /// 207 with failures listed when any recipient failed, else 200.
    fn from_report(report: &MailReport, complete_message: String) -> Response {
        if report.is_partial() {
            let body = Self {
                message: format!(
                    "Mail sent to {}/{} recipients",
                    report.sent_count(),
                    report.recipient_count
                ),
                sent_count: report.sent_count(),
                failed_count: report.failed_count(),
                failures: report.reported_failures().to_vec(),
            };
            return (StatusCode::MULTI_STATUS, Json(body)).into_response();
        }

        Json(Self {
            message: complete_message,
            sent_count: report.sent_count(),
            failed_count: 0,
            failures: Vec::new(),
        })
        .into_response()
    }
}

/// Broadcast a message to users, subscribers, or both.
#[instrument(skip(state, _admin, request))]
pub async fn send(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiJson(request): ApiJson<SendMailRequest>,
) -> Result<Response> {
    let [subject, body] = all_present([request.subject.as_ref(), request.body.as_ref()])
        .ok_or_else(|| AppError::bad_request("subject and body are required"))?;
    let audience: MailAudience = match request.audience.as_deref() {
        None => MailAudience::default(),
        Some(audience) => audience.parse().map_err(|_| {
            AppError::bad_request("audience must be users, subscribers, or both")
        })?,
    };

    let recipients = state.store().read(|doc| doc.audience_emails(audience));
    if recipients.is_empty() {
        return Err(AppError::bad_request(format!(
            "No recipients found for audience: {audience}"
        )));
    }

    let report = send_bulk(state.email(), &recipients, subject, body).await?;
    state
        .store()
        .write(|doc| report.record(doc, subject, body, Some(audience)))?;

    Ok(SendMailResponse::from_report(
        &report,
        format!("Mail sent to {} recipients", report.recipient_count),
    ))
}

// =============================================================================
// Newsletter
// =============================================================================

#[derive(Debug, Serialize)]
pub struct NewsletterResponse {
    pub subscribers: Vec<Subscriber>,
    pub mails: Vec<MailLog>,
}

/// Subscribers and the history of every mail-out.
#[instrument(skip(state, _admin))]
pub async fn newsletter(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Json<NewsletterResponse> {
    let response = state.store().read(|doc| NewsletterResponse {
        subscribers: doc.newsletter_subscribers.clone(),
        mails: doc.mail_logs.clone(),
    });
    Json(response)
}

#[derive(Debug, Deserialize)]
pub struct SendNewsletterRequest {
    pub subject: Option<String>,
    pub body: Option<String>,
}

/// Broadcast a message to every newsletter subscriber.
///
/// An empty subscriber list is not an error; the run is still logged.
#[instrument(skip(state, _admin, request))]
pub async fn send_newsletter(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiJson(request): ApiJson<SendNewsletterRequest>,
) -> Result<Response> {
    let [subject, body] = all_present([request.subject.as_ref(), request.body.as_ref()])
        .ok_or_else(|| AppError::bad_request("subject and body are required"))?;

    let recipients = state
        .store()
        .read(|doc| doc.audience_emails(MailAudience::Subscribers));
    let report = send_bulk(state.email(), &recipients, subject, body).await?;
    state
        .store()
        .write(|doc| report.record(doc, subject, body, None))?;

    Ok(SendMailResponse::from_report(
        &report,
        format!("Newsletter sent to {} subscribers", report.recipient_count),
    ))
}
