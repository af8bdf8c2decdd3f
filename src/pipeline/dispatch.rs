// src/pipeline/dispatch.rs

//! Takedown notification dispatch.
//!
//! Selects repositories by status tag, composes one HTML message per
//! owner, hands it to an [`EmailTransport`], and transitions every
//! repository included in an attempt to `Waiting`. Owners with no
//! known address or no matching repository are skipped untouched.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;

use crate::config::EmailConfig;
use crate::error::Result;
use crate::models::{RecordStore, RepoStatus};

/// Case-insensitive set of status tags selecting repositories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusFilter(HashSet<RepoStatus>);

impl StatusFilter {
    /// Parse operator-supplied tags; unknown tags are rejected.
    pub fn from_tags<S: AsRef<str>>(tags: &[S]) -> Result<Self> {
        let mut statuses = HashSet::new();
        for tag in tags {
            let status = RepoStatus::parse_tag(tag.as_ref()).ok_or_else(|| {
                crate::error::AppError::validation(format!(
                    "Unknown status tag '{}'",
                    tag.as_ref()
                ))
            })?;
            statuses.insert(status);
        }
        if statuses.is_empty() {
            return Err(crate::error::AppError::validation("Empty status filter"));
        }
        Ok(Self(statuses))
    }

    /// Default selection for takedown notices: `New` and `Redetected`.
    pub fn default_notify() -> Self {
        Self(HashSet::from([RepoStatus::New, RepoStatus::Redetected]))
    }

    pub fn matches(&self, status: RepoStatus) -> bool {
        self.0.contains(&status)
    }
}

/// Notification send operation.
///
/// Returns a mapping of recipient address to failure reason; an empty
/// mapping means every address accepted the message. The actual SMTP
/// mechanics live behind this boundary.
#[async_trait]
pub trait EmailTransport: Send + Sync {
    async fn send(
        &self,
        sender: &str,
        recipients: &[String],
        subject: &str,
        body_html: &str,
    ) -> Result<HashMap<String, String>>;
}

/// Dry-run transport that logs instead of delivering.
pub struct LogTransport;

#[async_trait]
impl EmailTransport for LogTransport {
    async fn send(
        &self,
        sender: &str,
        recipients: &[String],
        subject: &str,
        _body_html: &str,
    ) -> Result<HashMap<String, String>> {
        log::info!(
            "[dry-run] '{}' from {} to {}",
            subject,
            sender,
            recipients.join(", ")
        );
        Ok(HashMap::new())
    }
}

/// Counters reported by one dispatch pass.
#[derive(Debug, Default)]
pub struct DispatchOutcome {
    /// Owners for which a delivery was attempted
    pub owners_contacted: usize,

    /// Repositories transitioned to `Waiting`
    pub repos_notified: usize,

    /// Owners skipped for having no known address
    pub skipped_no_email: usize,

    /// Owners skipped because no repository matched the filter
    pub skipped_no_match: usize,

    /// Per-recipient delivery failures, as (address, reason)
    pub failed_recipients: Vec<(String, String)>,

    /// Whole-message transport errors
    pub transport_errors: usize,
}

/// Sends takedown notices and progresses the record state machine.
pub struct NotificationDispatcher<'a> {
    transport: &'a dyn EmailTransport,
    email: &'a EmailConfig,
}

impl<'a> NotificationDispatcher<'a> {
    pub fn new(transport: &'a dyn EmailTransport, email: &'a EmailConfig) -> Self {
        Self { transport, email }
    }

    /// Notify every eligible owner in the store.
    ///
    /// Repositories included in an attempt transition to `Waiting`
    /// whether or not individual addresses failed; a failing owner
    /// never blocks the remaining owners.
    pub async fn dispatch(&self, store: &mut RecordStore, filter: &StatusFilter) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();
        let usernames: Vec<String> = store.owners().map(|o| o.username.clone()).collect();

        for username in usernames {
            let Some(owner) = store.get(&username) else {
                continue;
            };

            if owner.emails.is_empty() {
                log::info!("No emails associated with {username}. Skipped.");
                outcome.skipped_no_email += 1;
                continue;
            }

            let selected: Vec<(String, String)> = owner
                .repos
                .values()
                .filter(|r| filter.matches(r.status))
                .map(|r| (r.name.clone(), r.url.clone()))
                .collect();

            if selected.is_empty() {
                log::info!("No repo matching the status filter for {username}. Skipped.");
                outcome.skipped_no_match += 1;
                continue;
            }

            let recipients: Vec<String> = owner.emails.iter().cloned().collect();
            let body = self.compose_body(&username, &selected);

            log::info!(
                "Sending takedown notice to {username} ({} repos, {} addresses)...",
                selected.len(),
                recipients.len()
            );
            match self
                .transport
                .send(&self.email.sender, &recipients, &self.email.subject, &body)
                .await
            {
                Ok(failed) => {
                    for (address, reason) in failed {
                        log::warn!("Message to {address} failed: {reason}");
                        outcome.failed_recipients.push((address, reason));
                    }
                }
                Err(e) => {
                    log::error!("Sending to {} failed: {e}", recipients.join(", "));
                    outcome.transport_errors += 1;
                }
            }

            // The attempt was made; the state machine moves on either way.
            let names: Vec<String> = selected.into_iter().map(|(name, _)| name).collect();
            store.mark_waiting(&username, &names, Utc::now());
            outcome.owners_contacted += 1;
            outcome.repos_notified += names.len();
        }

        outcome
    }

    /// Build the HTML message body for one owner.
    fn compose_body(&self, username: &str, repos: &[(String, String)]) -> String {
        let items: String = repos
            .iter()
            .map(|(name, url)| format!("<li><a href='{url}'>{name}</a></li>"))
            .collect();
        format!(
            "<html>{}<ul>{}</ul>{}</html>",
            self.email.preface.replace("{user}", username),
            items,
            self.email.ending.replace("{sender}", &self.email.sender)
        )
    }
}
