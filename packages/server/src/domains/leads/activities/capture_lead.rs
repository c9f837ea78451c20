//! Per-commenter outreach decision tree.
//!
//! ```text
//! trigger comment
//!   └─► upsert lead
//!         ├─ email (medium/high) ─► email_captured + public ack reply
//!         └─ no usable email ─► connection status
//!               ├─ connected ─────────────► DM ─► dm_sent
//!               ├─ invitation pending ────► nothing new
//!               └─ not connected ─────────► reply + invitation ─► connection_pending
//! ```
//!
//! Outreach calls are best-effort. Once an outreach call has been attempted,
//! later persistence failures are logged rather than returned so the caller
//! still writes the dedup ledger and the commenter is never contacted twice.

use anyhow::{Context, Result};

use super::templates;
use crate::common::LeadId;
use crate::domains::comments::models::Comment;
use crate::domains::leads::models::{LeadStatus, NewLead, PendingConnection};
use crate::domains::scrape_jobs::models::DueJob;
use crate::kernel::{bounded, EmailExtraction, ServerDeps};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// No author id yet. Nothing was written; a later sweep retries.
    UnresolvedAuthor,
    EmailCaptured { lead_id: LeadId },
    DmSent { lead_id: LeadId },
    /// The DM was attempted and failed. Not retried.
    DmFailed { lead_id: LeadId },
    ConnectionRequested {
        lead_id: LeadId,
        invitation_id: Option<String>,
    },
    ConnectionRequestFailed { lead_id: LeadId },
    /// An invitation is already outstanding for this commenter.
    InvitationPending { lead_id: LeadId },
}

impl CaptureOutcome {
    /// Value for the ledger's `dm_queued` column.
    pub fn dm_queued(&self) -> bool {
        matches!(
            self,
            CaptureOutcome::EmailCaptured { .. } | CaptureOutcome::DmSent { .. }
        )
    }

    /// Whether the comment should be written to the dedup ledger.
    pub fn is_final(&self) -> bool {
        !matches!(self, CaptureOutcome::UnresolvedAuthor)
    }
}

/// Run the decision tree for one new comment that matched the job's trigger.
pub async fn capture_lead(
    job: &DueJob,
    comment: &Comment,
    matched_trigger: &str,
    deps: &ServerDeps,
) -> Result<CaptureOutcome> {
    let Some(author_id) = comment.author_id() else {
        tracing::debug!(
            job_id = %job.id,
            comment_id = %comment.id,
            "Trigger comment has no resolved author yet, deferring"
        );
        return Ok(CaptureOutcome::UnresolvedAuthor);
    };

    let lead = deps
        .store
        .upsert_lead(&NewLead {
            campaign_id: job.campaign_id,
            platform_id: author_id.to_string(),
            name: comment.author.name.clone(),
            profile_url: comment.author.profile_url.clone(),
            comment_id: comment.id.clone(),
        })
        .await
        .with_context(|| format!("upserting lead for commenter {}", author_id))?;

    let first_name = templates::first_name(lead.name.as_deref());

    let extraction = match deps.email_extractor.extract_email(&comment.text).await {
        Ok(extraction) => extraction,
        Err(e) => {
            tracing::warn!(
                comment_id = %comment.id,
                error = %e,
                "Email extraction failed, treating comment as email-less"
            );
            EmailExtraction::none()
        }
    };

    if let Some(email) = extraction.usable_email() {
        deps.store
            .update_lead_status(lead.id, LeadStatus::EmailCaptured, Some(email))
            .await
            .with_context(|| format!("storing email for lead {}", lead.id))?;

        reply_best_effort(job, comment, &templates::email_acknowledgement(&first_name), deps)
            .await;

        tracing::info!(
            job_id = %job.id,
            lead_id = %lead.id,
            comment_id = %comment.id,
            "Captured email from trigger comment"
        );
        return Ok(CaptureOutcome::EmailCaptured { lead_id: lead.id });
    }

    let status = bounded(
        deps.settings.gateway_timeout,
        deps.connection_gateway
            .check_connection_status(&job.account_id, author_id),
    )
    .await
    .with_context(|| format!("checking connection status for {}", author_id))?;

    if status.is_connected {
        let message = templates::direct_message(&first_name, matched_trigger);
        let sent = bounded(
            deps.settings.gateway_timeout,
            deps.outreach_gateway
                .send_direct_message(&job.account_id, author_id, &message),
        )
        .await;

        return match sent {
            Ok(()) => {
                advance_lead_best_effort(lead.id, LeadStatus::DmSent, deps).await;
                tracing::info!(
                    job_id = %job.id,
                    lead_id = %lead.id,
                    comment_id = %comment.id,
                    "Sent direct message to connected commenter"
                );
                Ok(CaptureOutcome::DmSent { lead_id: lead.id })
            }
            Err(e) => {
                tracing::warn!(
                    job_id = %job.id,
                    lead_id = %lead.id,
                    comment_id = %comment.id,
                    error = %e,
                    "Direct message failed, comment will not be retried"
                );
                Ok(CaptureOutcome::DmFailed { lead_id: lead.id })
            }
        };
    }

    let pending_locally = deps
        .store
        .find_pending_connection(job.campaign_id, author_id)
        .await
        .with_context(|| format!("looking up pending connection for {}", author_id))?
        .is_some();

    if status.has_pending_invitation || pending_locally {
        tracing::debug!(
            job_id = %job.id,
            lead_id = %lead.id,
            comment_id = %comment.id,
            "Invitation already pending, no new outreach"
        );
        return Ok(CaptureOutcome::InvitationPending { lead_id: lead.id });
    }

    reply_best_effort(job, comment, &templates::connection_reply(&first_name), deps).await;

    let note = templates::connection_note(&first_name, matched_trigger);
    let requested = bounded(
        deps.settings.gateway_timeout,
        deps.outreach_gateway
            .send_connection_request(&job.account_id, author_id, &note),
    )
    .await;

    match requested {
        Ok(request) => {
            let pending = PendingConnection::new(
                job.campaign_id,
                author_id,
                comment.id.clone(),
                request.invitation_id.clone(),
            );
            if let Err(e) = deps.store.create_pending_connection(&pending).await {
                tracing::error!(
                    lead_id = %lead.id,
                    commenter_id = author_id,
                    error = %e,
                    "Failed to record pending connection"
                );
            }
            advance_lead_best_effort(lead.id, LeadStatus::ConnectionPending, deps).await;

            tracing::info!(
                job_id = %job.id,
                lead_id = %lead.id,
                comment_id = %comment.id,
                invitation_id = request.invitation_id.as_deref().unwrap_or("-"),
                "Sent connection request to commenter"
            );
            Ok(CaptureOutcome::ConnectionRequested {
                lead_id: lead.id,
                invitation_id: request.invitation_id,
            })
        }
        Err(e) => {
            tracing::warn!(
                job_id = %job.id,
                lead_id = %lead.id,
                comment_id = %comment.id,
                error = %e,
                "Connection request failed"
            );
            Ok(CaptureOutcome::ConnectionRequestFailed { lead_id: lead.id })
        }
    }
}

async fn reply_best_effort(job: &DueJob, comment: &Comment, text: &str, deps: &ServerDeps) {
    let result = bounded(
        deps.settings.gateway_timeout,
        deps.outreach_gateway
            .reply_to_comment(&job.account_id, &job.post_id, &comment.id, text),
    )
    .await;

    if let Err(e) = result {
        tracing::warn!(
            job_id = %job.id,
            comment_id = %comment.id,
            error = %e,
            "Comment reply failed"
        );
    }
}

async fn advance_lead_best_effort(lead_id: LeadId, status: LeadStatus, deps: &ServerDeps) {
    if let Err(e) = deps.store.update_lead_status(lead_id, status, None).await {
        tracing::error!(
            lead_id = %lead_id,
            status = ?status,
            error = %e,
            "Failed to advance lead status after outreach"
        );
    }
}
