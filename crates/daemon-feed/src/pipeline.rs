//! Feed-by-email flow: verify → parse → route → analyze → outcome.
//!
//! Storage is the caller's concern; the pipeline takes the known daemons as input and
//! returns the records a store would write (start + completion).

use crate::analysis::AnalysisService;
use crate::error::{FeedError, FeedResult};
use crate::inbound::{resolve_daemon, whitelist_attachments, Attachment, DaemonRecord, InboundMessage};
use crate::schemas::{AnalyzeRequest, AnalyzeResponse, PersonalityTraits};
use crate::signature::check_request;
use chrono::{DateTime, Utc};
use daemon_core::{DaemonConfig, TraitKey};
use serde::Serialize;
use std::collections::BTreeMap;

pub const EMAIL_SOURCE: &str = "email";

/// Written when processing starts; `feed_id` is the message id (idempotency key).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedRecord {
    pub feed_id: String,
    pub daemon_id: String,
    pub source: &'static str,
    pub content_summary: String,
    pub attachments_meta: Vec<Attachment>,
    pub started_at: DateTime<Utc>,
}

/// Result of a processed feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedOutcome {
    pub record: FeedRecord,
    pub analysis: AnalyzeResponse,
    /// Every trait present, 0 when unchanged.
    pub traits_delta: BTreeMap<TraitKey, u8>,
    pub completed_at: DateTime<Utc>,
}

impl FeedOutcome {
    /// Acknowledgement body for the webhook sender.
    pub fn ack(&self) -> serde_json::Value {
        serde_json::json!({
            "status": "success",
            "feedId": self.record.feed_id,
            "daemonId": self.record.daemon_id,
            "source": self.record.source,
        })
    }
}

#[derive(Debug, Clone)]
pub struct FeedPipeline {
    analysis: AnalysisService,
    webhook_secret: Option<String>,
}

impl FeedPipeline {
    pub fn new(analysis: AnalysisService, webhook_secret: Option<String>) -> Self {
        Self {
            analysis,
            webhook_secret: webhook_secret.filter(|s| !s.trim().is_empty()),
        }
    }

    pub fn from_config(config: &DaemonConfig, analysis: AnalysisService) -> Self {
        Self::new(analysis, config.webhook_secret.clone())
    }

    pub fn analysis(&self) -> &AnalysisService {
        &self.analysis
    }

    /// Process one raw webhook body addressed to one of `daemons`.
    pub async fn process(
        &self,
        body: &[u8],
        signature: Option<&str>,
        daemons: &[DaemonRecord],
    ) -> FeedResult<FeedOutcome> {
        if !check_request(self.webhook_secret.as_deref(), body, signature) {
            return Err(FeedError::InvalidSignature);
        }

        let message = InboundMessage::parse(body)?;
        tracing::info!(
            target: "daemon::feed",
            message_id = %message.message_id,
            attachments = message.attachments.len(),
            "Feed received"
        );

        let daemon = resolve_daemon(&message.to, daemons).ok_or(FeedError::RoutingUnavailable)?;
        let attachments = whitelist_attachments(&message.attachments);
        let record = FeedRecord {
            feed_id: message.message_id.clone(),
            daemon_id: daemon.id.clone(),
            source: EMAIL_SOURCE,
            content_summary: message.content_summary(),
            attachments_meta: attachments,
            started_at: Utc::now(),
        };

        let request = analyze_request(&message, &record.attachments_meta, daemon);
        let analysis = self.analysis.analyze(&request).await.map_err(|e| {
            tracing::error!(target: "daemon::feed", feed_id = %record.feed_id, error = %e, "Feed analysis failed");
            e
        })?;

        let traits_delta = analysis.delta_record();
        tracing::info!(
            target: "daemon::feed",
            feed_id = %record.feed_id,
            daemon_id = %record.daemon_id,
            archetype = analysis.new_archetype_id.as_deref().unwrap_or_default(),
            "Feed complete"
        );
        Ok(FeedOutcome {
            record,
            analysis,
            traits_delta,
            completed_at: Utc::now(),
        })
    }
}

/// Subject doubles as file name and description; the first image attachment is passed along.
fn analyze_request(message: &InboundMessage, attachments: &[Attachment], daemon: &DaemonRecord) -> AnalyzeRequest {
    let subject = Some(message.subject.clone()).filter(|s| !s.is_empty());
    let first = attachments.first();
    AnalyzeRequest {
        file_name: subject.clone(),
        file_type: None,
        file_description: subject,
        text: Some(message.text.clone()).filter(|t| !t.is_empty()),
        image_url: first.and_then(|a| a.url.clone()),
        image_base64: first.and_then(|a| a.base64.clone()),
        current_traits: PersonalityTraits::from_vector(&daemon.traits),
        dominant_trait: None,
        current_archetype_id: daemon.archetype_id.clone(),
    }
}
