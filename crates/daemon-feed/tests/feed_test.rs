//! Analysis service and feed pipeline against mock providers.
//!
//! Run with: `cargo test -p daemon-feed --test feed_test`

use daemon_core::validators::FORBIDDEN_ROAST_FALLBACK;
use daemon_core::{PersonalityBuilder, TraitKey, TraitVector};
use daemon_feed::{
    sign_body, AnalysisService, AnalyzeRequest, DaemonRecord, FeedError, FeedPipeline,
    PersonalityTraits,
};
use daemon_llm::{LlmProvider, MockProvider};
use serde_json::json;
use std::sync::Arc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn playful() -> TraitVector {
    TraitVector::new()
        .with(TraitKey::Humor, 19)
        .with(TraitKey::Playfulness, 20)
        .with(TraitKey::Creativity, 18)
        .with(TraitKey::Courage, 4)
}

fn request(text: &str) -> AnalyzeRequest {
    AnalyzeRequest {
        text: Some(text.to_string()),
        current_traits: PersonalityTraits::from_vector(&playful()),
        current_archetype_id: Some("trickster".to_string()),
        ..Default::default()
    }
}

fn with_provider(mock: &Arc<MockProvider>) -> AnalysisService {
    let provider: Arc<dyn LlmProvider> = mock.clone();
    AnalysisService::new(Some(provider), PersonalityBuilder::default(), false)
}

#[tokio::test]
async fn mock_analysis_is_deterministic() {
    init_tracing();
    let svc = AnalysisService::mock(PersonalityBuilder::default());
    let a = svc.analyze(&request("look at my cat")).await.unwrap();
    let b = svc.analyze(&request("look at my cat")).await.unwrap();
    assert_eq!(a, b);

    assert_eq!(
        a.roast.as_deref(),
        Some("Trickster says: Your vibe screams Playfulness — try harder.")
    );
    assert_eq!(a.tags, vec!["text", "short"]);
    assert_eq!(a.caption.as_deref(), Some("look at my cat"));
    assert_eq!(a.new_archetype_id.as_deref(), Some("trickster"));
    assert_eq!(a.trait_deltas.len(), 20);
    let bumped: Vec<TraitKey> = a
        .trait_deltas
        .iter()
        .filter(|d| d.delta == 1)
        .map(|d| d.trait_key)
        .collect();
    assert_eq!(
        bumped,
        vec![TraitKey::Creativity, TraitKey::Humor, TraitKey::Courage, TraitKey::Playfulness]
    );
    assert_eq!(
        a.top_traits,
        vec![TraitKey::Playfulness, TraitKey::Humor, TraitKey::Creativity]
    );
}

#[tokio::test]
async fn mock_roast_without_salient_traits_mentions_mystery() {
    let svc = AnalysisService::mock(PersonalityBuilder::default());
    let resp = svc.analyze(&AnalyzeRequest::default()).await.unwrap();
    assert_eq!(
        resp.roast.as_deref(),
        Some("Guardian says: Your vibe screams mystery — try harder.")
    );
    assert!(resp.tags.is_empty());
    assert!(resp.caption.is_none());
    assert!(resp.trait_deltas.iter().all(|d| d.delta == 0));
}

#[tokio::test]
async fn provider_reply_is_sanitized_and_projected() {
    init_tracing();
    let mock = Arc::new(MockProvider::new(
        "```json\n{\"traitDeltas\": {\"Humor\": 5, \"Playfulness\": 2, \"Kindness\": \"x\"}, \"roast\": \"  Meme quality: questionable.  \"}\n```",
    ));
    let svc = with_provider(&mock);
    assert!(svc.uses_llm());

    let resp = svc.analyze(&request("a meme about cats")).await.unwrap();
    assert_eq!(mock.call_count(), 1);
    let prompt = &mock.prompts()[0];
    assert!(prompt.contains("a meme about cats"));
    assert!(prompt.contains("You are speaking as a Trickster archetype Daemon."));

    assert_eq!(resp.roast.as_deref(), Some("Meme quality: questionable."));
    let record = resp.delta_record();
    assert_eq!(record[&TraitKey::Humor], 3);
    assert_eq!(record[&TraitKey::Playfulness], 2);
    assert_eq!(record[&TraitKey::Kindness], 0);
    assert_eq!(resp.new_archetype_id.as_deref(), Some("trickster"));
}

#[tokio::test]
async fn forbidden_roast_is_replaced() {
    let mock = Arc::new(MockProvider::new(
        r#"{"traitDeltas": {}, "roast": "Post your api_key next time"}"#,
    ));
    let resp = with_provider(&mock).analyze(&request("hi")).await.unwrap();
    assert_eq!(resp.roast.as_deref(), Some(FORBIDDEN_ROAST_FALLBACK));
    assert!(resp.trait_deltas.iter().all(|d| d.delta == 0));
}

#[tokio::test]
async fn provider_failure_falls_back_to_mock() {
    init_tracing();
    for mock in [
        Arc::new(MockProvider::failing(500, "boom")),
        Arc::new(MockProvider::new("definitely not json")),
    ] {
        let resp = with_provider(&mock).analyze(&request("hello")).await.unwrap();
        assert_eq!(mock.call_count(), 1);
        assert_eq!(
            resp.roast.as_deref(),
            Some("Trickster says: Your vibe screams Playfulness — try harder.")
        );
    }
}

#[tokio::test]
async fn mock_mode_never_calls_provider() {
    let mock = Arc::new(MockProvider::new("{}"));
    let provider: Arc<dyn LlmProvider> = mock.clone();
    let svc = AnalysisService::new(Some(provider), PersonalityBuilder::default(), true);
    assert!(!svc.uses_llm());
    svc.analyze(&request("hello")).await.unwrap();
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn invalid_input_traits_are_rejected() {
    let svc = AnalysisService::mock(PersonalityBuilder::default());
    let mut req = request("x");
    req.current_traits.values.insert("Luck".to_string(), 3);
    assert!(matches!(svc.analyze(&req).await, Err(FeedError::Persona(_))));
}

// -----------------------------------------------------------------------------
// Pipeline
// -----------------------------------------------------------------------------

const SECRET: &str = "whsec_feed";

fn daemons() -> Vec<DaemonRecord> {
    vec![
        DaemonRecord {
            id: "d_nova".into(),
            name: "Nova".into(),
            ..Default::default()
        },
        DaemonRecord {
            id: "d_pixel".into(),
            name: "Pixel".into(),
            traits: playful(),
            archetype_id: Some("trickster".into()),
        },
    ]
}

fn envelope() -> Vec<u8> {
    serde_json::to_vec(&json!({
        "event_type": "message.received",
        "event_id": "evt_9",
        "message": {
            "message_id": "msg_42",
            "to": ["pixel-pet@agentmail.to"],
            "subject": "Weekend photos",
            "text": "Here is my cat wearing a tiny hat",
            "attachments": [
                {"filename": "hat.jpg", "content_type": "image/jpeg", "url": "https://cdn/hat.jpg"},
                {"filename": "notes.txt", "content_type": "text/plain"}
            ]
        }
    }))
    .unwrap()
}

fn pipeline() -> FeedPipeline {
    FeedPipeline::new(
        AnalysisService::mock(PersonalityBuilder::default()),
        Some(SECRET.to_string()),
    )
}

#[tokio::test]
async fn signed_feed_is_routed_and_analyzed() {
    init_tracing();
    let body = envelope();
    let sig = format!("sha256={}", sign_body(SECRET, &body));
    let outcome = pipeline()
        .process(&body, Some(&sig), &daemons())
        .await
        .unwrap();

    assert_eq!(outcome.record.feed_id, "msg_42");
    assert_eq!(outcome.record.daemon_id, "d_pixel");
    assert_eq!(outcome.record.source, "email");
    assert_eq!(
        outcome.record.content_summary,
        "Weekend photos | Here is my cat wearing a tiny hat"
    );
    assert_eq!(outcome.record.attachments_meta.len(), 1);
    assert!(outcome.completed_at >= outcome.record.started_at);

    assert_eq!(outcome.analysis.caption.as_deref(), Some("Weekend photos"));
    assert_eq!(outcome.analysis.tags, vec!["text", "short", "image"]);
    assert_eq!(outcome.analysis.new_archetype_id.as_deref(), Some("trickster"));
    assert_eq!(outcome.traits_delta.len(), 20);
    assert_eq!(outcome.traits_delta[&TraitKey::Playfulness], 1);

    let ack = outcome.ack();
    assert_eq!(ack["status"], "success");
    assert_eq!(ack["feedId"], "msg_42");
    assert_eq!(ack["daemonId"], "d_pixel");

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["traitsDelta"]["Playfulness"], 1);
}

#[tokio::test]
async fn bad_signature_is_rejected() {
    let body = envelope();
    let err = pipeline()
        .process(&body, Some("sha256=deadbeef"), &daemons())
        .await
        .unwrap_err();
    assert!(matches!(err, FeedError::InvalidSignature));

    let err = pipeline().process(&body, None, &daemons()).await.unwrap_err();
    assert!(matches!(err, FeedError::InvalidSignature));
}

#[tokio::test]
async fn unsigned_pipeline_accepts_flat_payload() {
    let open = FeedPipeline::new(AnalysisService::mock(PersonalityBuilder::default()), None);
    let body = br#"{"to": "someone@agentmail.to", "plain": "hey"}"#;
    let outcome = open.process(body, None, &daemons()).await.unwrap();
    assert_eq!(outcome.record.daemon_id, "d_nova");
    assert_eq!(outcome.record.content_summary, "hey");
    assert!(uuid_like(&outcome.record.feed_id));
}

#[tokio::test]
async fn routing_and_payload_errors() {
    let open = FeedPipeline::new(AnalysisService::mock(PersonalityBuilder::default()), None);
    assert!(matches!(
        open.process(b"{}", None, &[]).await,
        Err(FeedError::RoutingUnavailable)
    ));
    assert!(matches!(
        open.process(b"<xml/>", None, &daemons()).await,
        Err(FeedError::MalformedPayload(_))
    ));
}

fn uuid_like(s: &str) -> bool {
    s.len() == 36 && s.chars().filter(|c| *c == '-').count() == 4
}
