//! Newsletter subscribers and the log of admin mail-outs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hembit_core::{MailAudience, MailLogId, SubscriberId};

/// A newsletter subscription captured from the storefront footer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscriber {
    pub id: SubscriberId,
    pub email: String,
    pub subscribed_at: DateTime<Utc>,
}

/// Record of one bulk mail-out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailLog {
    pub id: MailLogId,
    pub subject: String,
    pub body: String,
    /// Absent for newsletter sends, which always target subscribers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<MailAudience>,
    pub recipient_count: usize,
    #[serde(default)]
    pub sent_count: usize,
    #[serde(default)]
    pub failed_count: usize,
    pub sent_at: DateTime<Utc>,
}
