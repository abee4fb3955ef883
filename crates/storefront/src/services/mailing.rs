//! Bulk mail-outs to users and newsletter subscribers.
//!
//! Recipients are sent to one at a time. A failed recipient does not stop the
//! run; failures are collected into a [`MailReport`].

use chrono::Utc;
use serde::Serialize;

use hembit_core::{MailAudience, MailLogId};

use super::email::{EmailError, EmailService};
use crate::models::{Document, MailLog};

/// Most failures echoed back to the admin.
pub const MAX_REPORTED_FAILURES: usize = 20;

/// One recipient that could not be sent to.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SendFailure {
    pub email: String,
    pub error: String,
}

/// Outcome of a bulk send.
#[derive(Debug, Clone, Default)]
pub struct MailReport {
    pub recipient_count: usize,
    pub failures: Vec<SendFailure>,
}

impl MailReport {
    #[must_use]
    pub fn sent_count(&self) -> usize {
        self.recipient_count - self.failures.len()
    }

    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.failures.len()
    }

    /// Whether at least one recipient failed.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }

    /// The first [`MAX_REPORTED_FAILURES`] failures.
    #[must_use]
    pub fn reported_failures(&self) -> &[SendFailure] {
        let end = self.failures.len().min(MAX_REPORTED_FAILURES);
        self.failures.get(..end).unwrap_or_default()
    }

    /// Append this send to the mail log, newest first.
    pub fn record(
        &self,
        doc: &mut Document,
        subject: &str,
        body: &str,
        audience: Option<MailAudience>,
    ) -> MailLog {
        let log = MailLog {
            id: MailLogId::generate(),
            subject: subject.to_owned(),
            body: body.to_owned(),
            audience,
            recipient_count: self.recipient_count,
            sent_count: self.sent_count(),
            failed_count: self.failed_count(),
            sent_at: Utc::now(),
        };
        doc.mail_logs.insert(0, log.clone());
        log
    }
}

/// Render an admin message and send it to every recipient in order.
///
/// # Errors
///
/// Returns `EmailError` only if the message cannot be rendered. Delivery
/// failures are reported per recipient in the [`MailReport`].
pub async fn send_bulk(
    email: &EmailService,
    recipients: &[String],
    subject: &str,
    body: &str,
) -> Result<MailReport, EmailError> {
    let html = EmailService::render_broadcast(subject, body)?;
    let mut report = MailReport {
        recipient_count: recipients.len(),
        failures: Vec::new(),
    };

    for recipient in recipients {
        if let Err(e) = email.send(recipient, subject, &html).await {
            tracing::warn!(to = %recipient, error = %e, "bulk email failed");
            report.failures.push(SendFailure {
                email: recipient.clone(),
                error: e.to_string(),
            });
        }
    }

    tracing::info!(
        recipients = report.recipient_count,
        failed = report.failed_count(),
        subject = %subject,
        "bulk email finished"
    );
    Ok(report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::config::EmailConfig;

    use super::*;

    #[tokio::test]
    async fn test_blank_recipient_is_reported_not_fatal() {
        let email = EmailService::new(&EmailConfig::default()).unwrap();
        let recipients = vec!["a@example.com".to_owned(), " ".to_owned(), "b@example.com".to_owned()];

        let report = send_bulk(&email, &recipients, "Drop", "New arrivals").await.unwrap();

        assert_eq!(report.sent_count(), 2);
        assert_eq!(report.failed_count(), 1);
        assert!(report.is_partial());
        assert_eq!(report.failures[0].error, "Email recipient is required");
    }

    #[test]
    fn test_reported_failures_are_capped() {
        let report = MailReport {
            recipient_count: 30,
            failures: (0..25)
                .map(|n| SendFailure {
                    email: format!("u{n}@example.com"),
                    error: "boom".into(),
                })
                .collect(),
        };
        assert_eq!(report.reported_failures().len(), MAX_REPORTED_FAILURES);
        assert_eq!(report.sent_count(), 5);
    }

    #[test]
    fn test_record_prepends_log() {
        let mut doc = Document::default();
        let report = MailReport {
            recipient_count: 3,
            failures: Vec::new(),
        };
        report.record(&mut doc, "First", "a", Some(MailAudience::Users));
        report.record(&mut doc, "Second", "b", None);

        assert_eq!(doc.mail_logs.len(), 2);
        assert_eq!(doc.mail_logs[0].subject, "Second");
        assert_eq!(doc.mail_logs[1].audience, Some(MailAudience::Users));
        assert_eq!(doc.mail_logs[1].sent_count, 3);
    }
}
