//! End-to-end routing behaviour through the public API.
//!
//! Each test builds its own router, document cache and recording messenger.

use std::sync::Arc;

use helpdesk_chat::mock::{Delivery, RecordingMessenger, ScriptedCompletion, StaticFetcher};
use helpdesk_chat::replies;
use helpdesk_chat::{
    AnswerSynthesizer, ChatError, CompletionError, DocumentCache, FaqCatalog, InboundEvent,
    Resolution, Router,
};
use helpdesk_core::{default_faq_entries, escape_html, ChatId, FaqEntry, UserIdentity};

// =============================================================================
// Helpers
// =============================================================================

const USER_CHAT: ChatId = ChatId(555);
const OPERATOR: ChatId = ChatId(-5347449833);

fn user() -> UserIdentity {
    UserIdentity::new(31337, "Robin Q", None)
}

fn catalog() -> Arc<FaqCatalog> {
    Arc::new(FaqCatalog::new(default_faq_entries()).unwrap())
}

async fn loaded_cache(body: &str) -> Arc<DocumentCache> {
    let cache = DocumentCache::new();
    cache
        .load(Some("https://docs.example.org/help"), &StaticFetcher::ok(body))
        .await
        .unwrap();
    Arc::new(cache)
}

fn make_router(cache: Arc<DocumentCache>, service: ScriptedCompletion) -> Router<ScriptedCompletion> {
    Router::new(catalog(), AnswerSynthesizer::new(service, cache), OPERATOR)
}

fn press(payload: &str, message_id: i64) -> InboundEvent {
    InboundEvent::button(USER_CHAT, user(), format!("cb-{}", message_id), Some(message_id), payload)
}

fn say(text: &str) -> InboundEvent {
    InboundEvent::message(USER_CHAT, user(), text)
}

// =============================================================================
// FAQ path
// =============================================================================

#[tokio::test]
async fn every_topic_yields_its_stored_answer() {
    let router = make_router(Arc::new(DocumentCache::new()), ScriptedCompletion::answering("x"));
    for entry in default_faq_entries() {
        let messenger = RecordingMessenger::new();
        let res = router
            .handle(&messenger, &press(&format!("faq:{}", entry.key), 10))
            .await
            .unwrap();
        assert_eq!(res, Resolution::FaqAnswered { key: entry.key.clone() });
        let first = messenger.deliveries()[0].text().unwrap().to_string();
        assert!(first.contains(&escape_html(&entry.answer)), "topic {}", entry.key);
    }
}

#[tokio::test]
async fn repeated_selection_is_idempotent() {
    let router = make_router(Arc::new(DocumentCache::new()), ScriptedCompletion::answering("x"));
    let messenger = RecordingMessenger::new();

    router.handle(&messenger, &press("faq:payment_methods", 20)).await.unwrap();
    let first = messenger.deliveries();
    messenger.clear();
    router.handle(&messenger, &press("faq:payment_methods", 20)).await.unwrap();
    let second = messenger.deliveries();

    let texts = |ds: &[Delivery]| ds.iter().map(|d| d.text().map(str::to_string)).collect::<Vec<_>>();
    assert_eq!(texts(first.as_slice()), texts(second.as_slice()));
}

#[tokio::test]
async fn configured_catalog_drives_menu_and_answers() {
    let entries = vec![FaqEntry::new(
        "opening_hours",
        "Opening Hours",
        "When are you open?",
        "Monday to Friday, 9 to 5.",
    )];
    let router = Router::new(
        Arc::new(FaqCatalog::new(entries).unwrap()),
        AnswerSynthesizer::new(
            ScriptedCompletion::answering("x"),
            Arc::new(DocumentCache::new()),
        ),
        OPERATOR,
    );
    let messenger = RecordingMessenger::new();
    router.handle(&messenger, &say("/start")).await.unwrap();
    match &messenger.deliveries()[0] {
        Delivery::Sent { message, .. } => {
            let rows = message.keyboard.as_ref().unwrap();
            assert_eq!(rows.len(), 2);
            assert_eq!(rows[0][0].payload, "faq:opening_hours");
            assert_eq!(rows[1][0].label, replies::ESCALATE_LABEL);
        }
        other => panic!("expected send, got {:?}", other),
    }

    messenger.clear();
    router.handle(&messenger, &press("faq:shipping_info", 3)).await.unwrap();
    assert_eq!(messenger.deliveries()[0].text(), Some(replies::TOPIC_NOT_FOUND));
}

// =============================================================================
// Free-text path
// =============================================================================

#[tokio::test]
async fn unavailable_document_never_calls_service() {
    let cache = DocumentCache::new();
    let fetcher = StaticFetcher::ok("ignored");
    assert!(cache
        .load(Some("https://uquid.freshdesk.com/a/solutions"), &fetcher)
        .await
        .is_err());

    let service = ScriptedCompletion::answering("should not be used");
    let router = make_router(Arc::new(cache), service.clone());
    let messenger = RecordingMessenger::new();

    for text in ["Where is my order?", "", "   ", "/not-a-question"] {
        router.handle(&messenger, &say(text)).await.unwrap();
    }
    assert_eq!(service.call_count(), 0);
    assert!(fetcher.calls().is_empty());
}

#[tokio::test]
async fn grounded_answer_is_returned_verbatim() {
    let answer = "Express takes 1-2 business days.\n\n_Source: Shipping FAQ_";
    let service = ScriptedCompletion::answering(answer);
    let router = make_router(loaded_cache("Express: 1-2 days").await, service.clone());
    let messenger = RecordingMessenger::new();

    let res = router.handle(&messenger, &say("How fast is express?")).await.unwrap();
    assert_eq!(res, Resolution::Answered);
    assert_eq!(messenger.texts_to(USER_CHAT).last().map(String::as_str), Some(answer));

    let instruction = service.requests()[0].contents[0].parts[0].text.clone().unwrap();
    assert!(instruction.contains("Express: 1-2 days"));
    assert!(instruction.contains("How fast is express?"));
}

#[tokio::test]
async fn network_failure_yields_fallback_and_menu() {
    let service = ScriptedCompletion::failing(CompletionError::Http("dns error".to_string()));
    let router = make_router(loaded_cache("doc").await, service);
    let messenger = RecordingMessenger::new();

    let res = router.handle(&messenger, &say("Can I pay by cheque?")).await.unwrap();
    match res {
        Resolution::Recovered(ChatError::SynthesisFailure { question, .. }) => {
            assert_eq!(question, "Can I pay by cheque?");
        }
        other => panic!("unexpected resolution {:?}", other),
    }

    let deliveries = messenger.deliveries_to(USER_CHAT);
    assert_eq!(deliveries[1].text(), Some(replies::ANSWER_FAILED));
    assert!(deliveries.last().unwrap().has_keyboard());
    assert!(!deliveries.iter().any(|d| d.text().unwrap_or("").contains("dns")));
}

#[tokio::test]
async fn empty_message_is_routed_as_free_text() {
    let service = ScriptedCompletion::answering("Please ask a question.");
    let router = make_router(loaded_cache("doc").await, service.clone());
    let messenger = RecordingMessenger::new();
    let res = router.handle(&messenger, &say("")).await.unwrap();
    assert_eq!(res, Resolution::Answered);
    assert_eq!(service.call_count(), 1);
}

// =============================================================================
// Escalation path
// =============================================================================

#[tokio::test]
async fn escalation_sends_exactly_one_notice() {
    let router = make_router(Arc::new(DocumentCache::new()), ScriptedCompletion::answering("x"));
    let messenger = RecordingMessenger::new();

    let res = router.handle(&messenger, &press("escalate", 40)).await.unwrap();
    assert_eq!(res, Resolution::Escalated);

    let notices = messenger.deliveries_to(OPERATOR);
    assert_eq!(notices.len(), 1);
    let text = notices[0].text().unwrap();
    assert!(text.contains("31337"));
    assert!(text.contains("Robin Q"));
    assert!(text.contains("Username: N/A"));
}

#[tokio::test]
async fn failed_escalation_is_not_retried() {
    let router = make_router(Arc::new(DocumentCache::new()), ScriptedCompletion::answering("x"));
    let messenger = RecordingMessenger::new().unreachable(OPERATOR);

    let res = router.handle(&messenger, &press("escalate", 41)).await.unwrap();
    assert!(matches!(res, Resolution::Recovered(ChatError::DeliveryFailure(_))));

    let user_texts = messenger.texts_to(USER_CHAT);
    assert!(user_texts.contains(&replies::ESCALATION_FAILED.to_string()));
    assert_eq!(
        user_texts
            .iter()
            .filter(|t| t.as_str() == replies::AGENT_NOTIFIED)
            .count(),
        0
    );
    assert!(messenger.deliveries_to(OPERATOR).is_empty());
}

// =============================================================================
// Never silent
// =============================================================================

#[tokio::test]
async fn every_interaction_produces_a_reply() {
    let router = make_router(loaded_cache("doc").await, ScriptedCompletion::answering("ok"));
    let events = vec![
        say("/start"),
        say("/unknown"),
        say("hello"),
        press("faq:return_policy", 1),
        press("faq:nope", 2),
        press("garbage", 3),
        press("escalate", 4),
    ];
    for event in events {
        let messenger = RecordingMessenger::new();
        router.handle(&messenger, &event).await.unwrap();
        assert!(
            !messenger.deliveries_to(USER_CHAT).is_empty(),
            "no reply for {:?}",
            event.interaction
        );
    }
}
