//! Inbound email webhook payloads: shape detection, field mapping, attachment filtering,
//! and recipient → daemon routing.
//!
//! Senders disagree on layout. Three shapes are recognized:
//! - **EventEnvelope**: `{ "event_type": "message.received", "message": {...} }`
//! - **Nested**: `{ "message": {...} }` where the inner object looks like a message
//! - **Flat**: message fields at the top level
//!
//! Each field is read from the message object first, then from the top level.

use crate::error::{FeedError, FeedResult};
use daemon_core::TraitVector;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const MESSAGE_RECEIVED: &str = "message.received";

/// Attachment mime types accepted for analysis.
pub const ALLOWED_ATTACHMENT_TYPES: [&str; 4] = ["image/png", "image/jpeg", "image/webp", "image/gif"];

/// Dedicated mailbox local part → daemon name.
pub const DEDICATED_MAILBOXES: [(&str, &str); 3] =
    [("nova-pet", "nova"), ("pixel-pet", "pixel"), ("echo-pet", "echo")];

const SUMMARY_TEXT_CHARS: usize = 120;
const NESTED_MESSAGE_KEYS: [&str; 5] = ["to", "subject", "text", "from", "recipients"];

// -----------------------------------------------------------------------------
// Payload shapes
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum InboundPayload {
    EventEnvelope {
        root: Map<String, Value>,
        message: Map<String, Value>,
    },
    Nested {
        root: Map<String, Value>,
        message: Map<String, Value>,
    },
    Flat(Map<String, Value>),
}

impl InboundPayload {
    /// Detect the payload shape. Anything other than a JSON object is malformed.
    pub fn classify(value: Value) -> FeedResult<Self> {
        let Value::Object(mut root) = value else {
            return Err(FeedError::MalformedPayload("expected a JSON object".to_string()));
        };

        if root.contains_key("event_type") {
            let received = root.get("event_type").and_then(Value::as_str) == Some(MESSAGE_RECEIVED);
            // A non-object `message` stays in the flat map.
            if received && matches!(root.get("message"), Some(Value::Object(_))) {
                if let Some(Value::Object(message)) = root.remove("message") {
                    return Ok(Self::EventEnvelope { root, message });
                }
            }
            return Ok(Self::Flat(root));
        }

        let looks_like_message = matches!(
            root.get("message"),
            Some(Value::Object(m)) if NESTED_MESSAGE_KEYS.iter().any(|k| m.contains_key(*k))
        );
        if looks_like_message {
            if let Some(Value::Object(message)) = root.remove("message") {
                return Ok(Self::Nested { root, message });
            }
        }
        Ok(Self::Flat(root))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::EventEnvelope { .. } => "event_envelope",
            Self::Nested { .. } => "nested",
            Self::Flat(_) => "flat",
        }
    }

    /// (message layer, top-level layer)
    fn layers(&self) -> (&Map<String, Value>, &Map<String, Value>) {
        match self {
            Self::EventEnvelope { root, message } | Self::Nested { root, message } => (message, root),
            Self::Flat(root) => (root, root),
        }
    }

    /// First present value among `message_keys` in the message layer, then `root_keys` at
    /// the top level. Null, empty strings, and empty arrays count as absent.
    fn field(&self, message_keys: &[&str], root_keys: &[&str]) -> Option<&Value> {
        let (message, root) = self.layers();
        first_present(message, message_keys).or_else(|| first_present(root, root_keys))
    }
}

fn is_present(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Number(_) => true,
    }
}

fn first_present<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().filter_map(|k| map.get(*k)).find(|v| is_present(v))
}

fn value_to_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// -----------------------------------------------------------------------------
// Normalized message
// -----------------------------------------------------------------------------

/// One address or a list of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Recipients {
    One(String),
    Many(Vec<String>),
}

impl Default for Recipients {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl Recipients {
    fn from_value(v: Option<&Value>) -> Self {
        match v {
            Some(Value::String(s)) => Self::One(s.clone()),
            Some(Value::Array(items)) => Self::Many(items.iter().map(value_to_string).collect()),
            _ => Self::default(),
        }
    }

    pub fn addresses(&self) -> Vec<&str> {
        match self {
            Self::One(s) => vec![s.as_str()],
            Self::Many(v) => v.iter().map(String::as_str).collect(),
        }
    }
}

/// Message fields extracted from any payload shape.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub to: Recipients,
    pub subject: String,
    pub text: String,
    pub html: String,
    pub attachments: Vec<Value>,
    /// Sender-supplied id, or a fresh UUID when none was sent.
    pub message_id: String,
}

impl InboundMessage {
    pub fn from_payload(payload: &InboundPayload) -> Self {
        let string_field = |mk: &[&str], rk: &[&str]| {
            payload
                .field(mk, rk)
                .map(value_to_string)
                .unwrap_or_default()
        };

        let attachments = match payload.field(&["attachments", "files"], &["attachments", "files"]) {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        };

        let message_id = payload
            .field(
                &["message_id", "messageId", "id"],
                &["message_id", "messageId", "id", "event_id"],
            )
            .map(value_to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        Self {
            to: Recipients::from_value(payload.field(&["to", "recipients"], &["to"])),
            subject: string_field(&["subject"], &["subject"]),
            text: string_field(&["text", "plain", "body", "text_body"], &["text", "plain"]),
            html: string_field(&["html", "html_body"], &["html"]),
            attachments,
            message_id,
        }
    }

    /// Classify and map a raw JSON body in one step.
    pub fn parse(body: &[u8]) -> FeedResult<Self> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| FeedError::MalformedPayload(e.to_string()))?;
        let payload = InboundPayload::classify(value)?;
        tracing::debug!(target: "daemon::feed", shape = payload.kind(), "Inbound payload classified");
        Ok(Self::from_payload(&payload))
    }

    pub fn content_summary(&self) -> String {
        content_summary(&self.subject, &self.text)
    }
}

// -----------------------------------------------------------------------------
// Attachments
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub filename: Option<String>,
    pub content_type: String,
    pub size: Option<u64>,
    pub base64: Option<String>,
    pub url: Option<String>,
}

/// Keep image attachments only. Content type is read from `content_type`, `contentType`,
/// `mime`, or `type` (case-insensitive).
pub fn whitelist_attachments(attachments: &[Value]) -> Vec<Attachment> {
    attachments
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|att| {
            let text = |keys: &[&str]| {
                first_present(att, keys)
                    .and_then(Value::as_str)
                    .map(str::to_string)
            };
            let content_type = text(&["content_type", "contentType", "mime", "type"])?.to_lowercase();
            if !ALLOWED_ATTACHMENT_TYPES.contains(&content_type.as_str()) {
                tracing::debug!(target: "daemon::feed", content_type = %content_type, "Attachment dropped");
                return None;
            }
            Some(Attachment {
                filename: text(&["filename"]),
                content_type,
                size: att.get("size").and_then(Value::as_u64),
                base64: text(&["base64", "content"]),
                url: text(&["url"]),
            })
        })
        .collect()
}

// -----------------------------------------------------------------------------
// Routing
// -----------------------------------------------------------------------------

/// A daemon that can receive feeds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DaemonRecord {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lossy_traits")]
    pub traits: TraitVector,
    #[serde(default, alias = "archetypeId")]
    pub archetype_id: Option<String>,
}

/// Stored rows may predate the current trait set: unknown names are dropped and
/// negatives clamped so one stale row does not make the whole daemon list unreadable.
fn lossy_traits<'de, D>(deserializer: D) -> Result<TraitVector, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, i64>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(TraitVector::from_raw_lossy(
        raw.iter().map(|(name, value)| (name.as_str(), *value)),
    ))
}

/// Pick the daemon a message is addressed to.
///
/// Per recipient, in order: a dedicated mailbox (`nova-pet@…`) by daemon name, then a
/// plus-tag (`feed+<id or name>@…`). With no match the first daemon is used; `None` only
/// when there are no daemons.
pub fn resolve_daemon<'a>(recipients: &Recipients, daemons: &'a [DaemonRecord]) -> Option<&'a DaemonRecord> {
    let first = daemons.first()?;
    let by_name = |name: &str| daemons.iter().find(|d| d.name.eq_ignore_ascii_case(name));

    for address in recipients.addresses() {
        let address = address.trim().to_lowercase();
        let Some((local, _domain)) = address.split_once('@') else {
            continue;
        };

        if let Some((_, daemon_name)) = DEDICATED_MAILBOXES.iter().find(|(mb, _)| *mb == local) {
            if let Some(d) = by_name(*daemon_name) {
                return Some(d);
            }
        }

        if let Some((_, hint)) = local.split_once('+').filter(|(_, h)| !h.is_empty()) {
            if let Some(d) = daemons.iter().find(|d| d.id == hint).or_else(|| by_name(hint)) {
                return Some(d);
            }
        }
    }

    tracing::debug!(target: "daemon::feed", daemon_id = %first.id, "No routing hint matched, using first daemon");
    Some(first)
}

/// `"subject | text"` for feed records. Text is trimmed and cut at 120 chars with `…`.
pub fn content_summary(subject: &str, text: &str) -> String {
    let mut bits: Vec<String> = Vec::with_capacity(2);
    let subject = subject.trim();
    if !subject.is_empty() {
        bits.push(subject.to_string());
    }
    let text = text.trim();
    if !text.is_empty() {
        let mut cut: String = text.chars().take(SUMMARY_TEXT_CHARS).collect();
        if text.chars().count() > SUMMARY_TEXT_CHARS {
            cut.push('…');
        }
        bits.push(cut);
    }
    if bits.is_empty() {
        "(no subject/text)".to_string()
    } else {
        bits.join(" | ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daemon_core::TraitKey;
    use serde_json::json;

    fn daemons() -> Vec<DaemonRecord> {
        ["nova", "pixel", "echo"]
            .iter()
            .enumerate()
            .map(|(i, name)| DaemonRecord {
                id: format!("d{}", i),
                name: name.to_string(),
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn test_classify_shapes() {
        let env = InboundPayload::classify(json!({
            "event_type": "message.received",
            "message": {"to": ["a@x.io"]}
        }))
        .unwrap();
        assert_eq!(env.kind(), "event_envelope");

        let other_event = InboundPayload::classify(json!({
            "event_type": "message.sent",
            "message": {"to": ["a@x.io"]}
        }))
        .unwrap();
        assert_eq!(other_event.kind(), "flat");

        let nested = InboundPayload::classify(json!({"message": {"subject": "hi"}})).unwrap();
        assert_eq!(nested.kind(), "nested");

        let not_message = InboundPayload::classify(json!({"message": {"foo": 1}, "to": "a@x.io"})).unwrap();
        assert_eq!(not_message.kind(), "flat");

        assert!(matches!(
            InboundPayload::classify(json!([1, 2])),
            Err(FeedError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_received_event_with_scalar_message_keeps_field() {
        let payload = InboundPayload::classify(json!({
            "event_type": "message.received",
            "message": "hello there",
            "to": "a@x.io"
        }))
        .unwrap();
        let InboundPayload::Flat(root) = payload else {
            panic!("expected flat payload");
        };
        assert_eq!(root.get("message"), Some(&json!("hello there")));
        assert_eq!(root.get("to"), Some(&json!("a@x.io")));
    }

    #[test]
    fn test_daemon_rows_tolerate_unknown_traits() {
        let rows: Vec<DaemonRecord> = serde_json::from_value(json!([
            {"_id": "d0", "name": "Nova", "traits": {"Humor": 5}},
            {"_id": "d1", "name": "Pixel", "traits": {"Humor": 5, "Luck": 2, "Courage": -3}},
            {"_id": "d2", "name": "Echo", "traits": null, "archetypeId": "sage"},
            {"_id": "d3", "name": "Bare"}
        ]))
        .unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[1].traits.get(TraitKey::Humor), 5);
        assert_eq!(rows[1].traits.get(TraitKey::Courage), 0);
        assert_eq!(rows[1].traits.len(), 2);
        assert!(rows[2].traits.is_empty());
        assert_eq!(rows[2].archetype_id.as_deref(), Some("sage"));
        assert!(rows[3].traits.is_empty());
        assert_eq!(
            resolve_daemon(&Recipients::One("pixel-pet@agentmail.to".into()), &rows).unwrap().id,
            "d1"
        );
    }

    #[test]
    fn test_field_aliases_and_top_level_fallback() {
        let payload = InboundPayload::classify(json!({
            "event_type": "message.received",
            "event_id": "evt_1",
            "subject": "top subject",
            "message": {
                "recipients": ["pixel-pet@agentmail.to"],
                "text_body": "",
                "plain": "plain body",
                "html_body": "<p>hi</p>",
                "files": [{"contentType": "image/png"}]
            }
        }))
        .unwrap();
        let msg = InboundMessage::from_payload(&payload);
        assert_eq!(msg.to.addresses(), vec!["pixel-pet@agentmail.to"]);
        assert_eq!(msg.subject, "top subject");
        assert_eq!(msg.text, "plain body");
        assert_eq!(msg.html, "<p>hi</p>");
        assert_eq!(msg.attachments.len(), 1);
        assert_eq!(msg.message_id, "evt_1");
    }

    #[test]
    fn test_message_id_generated_when_missing() {
        let msg = InboundMessage::parse(br#"{"to": "nova-pet@x.io", "text": "yo"}"#).unwrap();
        assert_eq!(msg.to, Recipients::One("nova-pet@x.io".into()));
        assert!(uuid::Uuid::parse_str(&msg.message_id).is_ok());

        let msg = InboundMessage::parse(br#"{"id": 42}"#).unwrap();
        assert_eq!(msg.message_id, "42");
    }

    #[test]
    fn test_parse_rejects_bad_json() {
        assert!(matches!(
            InboundMessage::parse(b"not json"),
            Err(FeedError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_whitelist_attachments() {
        let atts = vec![
            json!({"filename": "a.PNG", "content_type": "IMAGE/PNG", "size": 10, "content": "b64"}),
            json!({"filename": "doc.pdf", "contentType": "application/pdf"}),
            json!({"filename": "c.gif", "mime": "image/gif", "url": "https://x/c.gif"}),
            json!({"filename": "nothing"}),
            json!("not an object"),
        ];
        let clean = whitelist_attachments(&atts);
        assert_eq!(clean.len(), 2);
        assert_eq!(clean[0].content_type, "image/png");
        assert_eq!(clean[0].base64.as_deref(), Some("b64"));
        assert_eq!(clean[0].size, Some(10));
        assert_eq!(clean[1].url.as_deref(), Some("https://x/c.gif"));
        let v = serde_json::to_value(&clean[0]).unwrap();
        assert_eq!(v["contentType"], "image/png");
    }

    #[test]
    fn test_resolve_dedicated_mailbox() {
        let ds = daemons();
        let to = Recipients::Many(vec!["someone@else.io".into(), " Echo-Pet@AgentMail.to ".into()]);
        assert_eq!(resolve_daemon(&to, &ds).unwrap().name, "echo");
    }

    #[test]
    fn test_resolve_plus_tag_by_id_and_name() {
        let ds = daemons();
        assert_eq!(resolve_daemon(&Recipients::One("feed+d1@x.io".into()), &ds).unwrap().name, "pixel");
        assert_eq!(resolve_daemon(&Recipients::One("feed+ECHO@x.io".into()), &ds).unwrap().id, "d2");
    }

    #[test]
    fn test_resolve_defaults_to_first() {
        let ds = daemons();
        assert_eq!(resolve_daemon(&Recipients::One("nobody".into()), &ds).unwrap().id, "d0");
        assert_eq!(resolve_daemon(&Recipients::default(), &ds).unwrap().id, "d0");
        assert!(resolve_daemon(&Recipients::One("nova-pet@x.io".into()), &[]).is_none());
    }

    #[test]
    fn test_content_summary() {
        assert_eq!(content_summary("", ""), "(no subject/text)");
        assert_eq!(content_summary("  Hi ", " there "), "Hi | there");
        assert_eq!(content_summary("   ", "body"), "body");
        let long = "x".repeat(130);
        let s = content_summary("S", &long);
        assert_eq!(s, format!("S | {}…", "x".repeat(120)));
    }
}
