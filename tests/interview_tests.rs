mod common;

use common::{recognized, recognizing, settle, words, MockConnector, MockSynthesizer, MockTranslator};
use speech_bridge::speech::ListenerKind;
use speech_bridge::{
    ControllerSettings, InterviewConfig, InterviewTranslationSession, RecognitionResult,
    SessionController, SessionState, Speaker,
};
use std::collections::HashMap;
use std::sync::Arc;

struct Harness {
    connector: MockConnector,
    translator: Arc<MockTranslator>,
    synthesizer: Arc<MockSynthesizer>,
    session: InterviewTranslationSession,
}

fn harness(config: InterviewConfig, translator: MockTranslator) -> Harness {
    let connector = MockConnector::new();
    let translator = Arc::new(translator);
    let synthesizer = Arc::new(MockSynthesizer::default());
    let controller =
        SessionController::spawn(Arc::new(connector.clone()), ControllerSettings::default());
    let session = InterviewTranslationSession::new(
        controller,
        Arc::clone(&translator) as _,
        Arc::clone(&synthesizer) as _,
        config,
    );
    Harness {
        connector,
        translator,
        synthesizer,
        session,
    }
}

fn french_arabic() -> InterviewConfig {
    InterviewConfig {
        staff_language: "fr".to_string(),
        client_language: "ar".to_string(),
        candidate_languages: vec!["fr".to_string(), "en".to_string(), "ar".to_string()],
        voices: HashMap::from([("fr".to_string(), "fr-FR-DeniseNeural".to_string())]),
        ..InterviewConfig::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_auto_detected_english_is_translated_for_staff() {
    let h = harness(french_arabic(), MockTranslator::default());
    h.session.start().await.unwrap();

    let config = h.connector.last_config().unwrap();
    assert_eq!(config.locale, "fr-FR");
    assert_eq!(config.auto_detect.unwrap().locales.len(), 3);

    h.connector.emit(recognized("Where do I sign", Some("en-US")));
    settle().await;

    let messages = h.session.messages().await;
    assert_eq!(messages.len(), 1);
    let message = &messages[0];
    assert_eq!(message.speaker, Speaker::Client);
    assert_eq!(message.original_language, "en");
    assert_eq!(message.target_language, "fr");
    assert_eq!(message.original_text, "Where do I sign");
    assert_eq!(message.translated_text, "[fr] Where do I sign");

    assert_eq!(
        h.synthesizer.calls(),
        vec![(
            "[fr] Where do I sign".to_string(),
            "fr-FR".to_string(),
            Some("fr-FR-DeniseNeural".to_string())
        )]
    );
}

#[tokio::test(start_paused = true)]
async fn test_translation_failure_falls_back_to_original_text() {
    let h = harness(french_arabic(), MockTranslator::failing());
    h.session.start().await.unwrap();

    h.connector.emit(recognized("Where do I sign", Some("en-US")));
    settle().await;

    let messages = h.session.messages().await;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].original_language, "en");
    assert_eq!(messages[0].target_language, "fr");
    assert_eq!(messages[0].translated_text, messages[0].original_text);

    // Nothing was translated, so nothing is spoken
    assert!(h.synthesizer.calls().is_empty());
    assert_eq!(h.session.stats().await.failed_translations, 1);
}

#[tokio::test(start_paused = true)]
async fn test_staff_utterance_is_translated_for_client() {
    let h = harness(french_arabic(), MockTranslator::default());
    h.session.start().await.unwrap();

    h.connector.emit(recognized("Bonjour, asseyez-vous", Some("fr-FR")));
    settle().await;

    let messages = h.session.messages().await;
    assert_eq!(messages[0].speaker, Speaker::Staff);
    assert_eq!(messages[0].target_language, "ar");

    let calls = h.synthesizer.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1, "ar-SA");
    assert_eq!(calls[0].2, None);
}

#[tokio::test(start_paused = true)]
async fn test_arabic_script_without_tag_is_attributed_to_client() {
    let h = harness(french_arabic(), MockTranslator::default());
    h.session.start().await.unwrap();

    h.connector.emit(recognized("مرحبا كيف حالك", None));
    settle().await;

    let messages = h.session.messages().await;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].original_language, "ar");
    assert_eq!(messages[0].speaker, Speaker::Client);
    assert_eq!(messages[0].target_language, "fr");
}

#[tokio::test(start_paused = true)]
async fn test_same_language_is_not_translated() {
    let config = InterviewConfig {
        staff_language: "en".to_string(),
        client_language: "en".to_string(),
        ..InterviewConfig::default()
    };
    let h = harness(config, MockTranslator::default());
    h.session.start().await.unwrap();

    h.connector.emit(recognized("Good afternoon", Some("en-US")));
    settle().await;

    let messages = h.session.messages().await;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].translated_text, "Good afternoon");
    assert!(h.translator.calls().is_empty());
    assert!(h.synthesizer.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_messages_keep_speech_order() {
    let h = harness(french_arabic(), MockTranslator::default());
    h.session.start().await.unwrap();

    h.connector.emit(recognized("premier message", Some("fr-FR")));
    h.connector.emit(recognized("second message", Some("en-US")));
    h.connector.emit(recognized("troisieme message", Some("fr-FR")));
    settle().await;

    let originals: Vec<String> = h
        .session
        .messages()
        .await
        .into_iter()
        .map(|m| m.original_text)
        .collect();
    assert_eq!(
        originals,
        vec!["premier message", "second message", "troisieme message"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_chunk_preview_is_replaced_by_final_message() {
    let h = harness(french_arabic(), MockTranslator::default());
    h.session.start().await.unwrap();

    h.connector.emit(recognizing(&words(3)));
    settle().await;
    assert!(h.session.preview().await.is_none());

    h.connector.emit(recognizing(&words(5)));
    settle().await;
    let preview = h.session.preview().await.unwrap();
    assert_eq!(preview.word_count, 5);
    assert_eq!(preview.translated_text, format!("[ar] {}", words(5)));

    h.connector.emit(recognized(&words(6), Some("fr-FR")));
    settle().await;
    assert!(h.session.preview().await.is_none());
    assert_eq!(h.session.messages().await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_synthesis_failure_is_ignored() {
    let connector = MockConnector::new();
    let controller =
        SessionController::spawn(Arc::new(connector.clone()), ControllerSettings::default());
    let session = InterviewTranslationSession::new(
        controller,
        Arc::new(MockTranslator::default()),
        Arc::new(MockSynthesizer::failing()),
        french_arabic(),
    );
    session.start().await.unwrap();

    connector.emit(recognized("Bonjour", Some("fr-FR")));
    connector.emit(recognized("Merci beaucoup", Some("fr-FR")));
    settle().await;

    assert_eq!(session.messages().await.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_process_result_appends_directly() {
    let h = harness(french_arabic(), MockTranslator::default());

    let message = h
        .session
        .process_result(RecognitionResult {
            text: "Can you repeat that".to_string(),
            confidence: 0.75,
            detected_language: "en".to_string(),
            duration_seconds: 2.0,
        })
        .await;

    assert_eq!(message.speaker, Speaker::Client);
    assert!((message.confidence - 0.75).abs() < f32::EPSILON);
    assert_eq!(h.session.messages().await, vec![message]);
}

#[tokio::test(start_paused = true)]
async fn test_pause_resume_and_stop() {
    let h = harness(french_arabic(), MockTranslator::default());
    h.session.start().await.unwrap();

    h.session.pause().await.unwrap();
    assert_eq!(h.session.controller().state(), SessionState::Idle);
    h.connector.emit(recognized("ignored while paused", Some("fr-FR")));
    settle().await;
    assert!(h.session.messages().await.is_empty());

    h.session.resume().await.unwrap();
    assert_eq!(h.session.controller().state(), SessionState::Listening);
    h.connector.emit(recognized("On reprend", Some("fr-FR")));
    settle().await;

    let stats = h.session.stop().await.unwrap();
    assert_eq!(stats.state, SessionState::Stopped);
    assert_eq!(stats.message_count, 1);
    assert_eq!(stats.translated_count, 1);
    assert_eq!(h.connector.close_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_session_detaches_listeners() {
    let h = harness(french_arabic(), MockTranslator::default());
    let controller = h.session.controller().clone();
    assert_eq!(controller.listeners().listener_count(ListenerKind::Result), 1);

    drop(h);
    assert_eq!(controller.listeners().listener_count(ListenerKind::Result), 0);
    assert_eq!(controller.listeners().listener_count(ListenerKind::Interim), 0);
}
