//! Daemon feed pipeline.
//!
//! - **inbound**: webhook payload shapes, field mapping, attachment whitelist, daemon routing
//! - **signature**: `X-AgentMail-Signature` HMAC check
//! - **analysis**: content + traits → deltas, roast, new archetype (model or mock)
//! - **pipeline**: the end-to-end feed-by-email flow

mod analysis;
mod error;
mod inbound;
mod pipeline;
mod schemas;
mod signature;

pub use analysis::{caption, content_tags, mock_deltas, mock_name, AnalysisService};
pub use error::{FeedError, FeedResult};
pub use inbound::{
    content_summary, resolve_daemon, whitelist_attachments, Attachment, DaemonRecord,
    InboundMessage, InboundPayload, Recipients, ALLOWED_ATTACHMENT_TYPES, DEDICATED_MAILBOXES,
    MESSAGE_RECEIVED,
};
pub use pipeline::{FeedOutcome, FeedPipeline, FeedRecord, EMAIL_SOURCE};
pub use schemas::{AnalyzeRequest, AnalyzeResponse, NameSuggestion, PersonalityTraits};
pub use signature::{
    check_request, header_signature, sign_body, verify_signature, SIGNATURE_HEADER,
};
