use speech_bridge::nats::messages::{
    RecognizerControl, RecognizerEvent, RecognizerEventMessage, SpeakRequest, TranscriptMessage,
    TranslateResponse,
};
use speech_bridge::speech::{
    CancellationCode, ProviderConfig, ProviderEvent, ReasonCode, SilenceTimeouts,
};

#[test]
fn test_start_control_serialization() {
    let config = ProviderConfig {
        locale: "fr-FR".to_string(),
        auto_detect: None,
        interim_results: true,
        timeouts: SilenceTimeouts::FAST,
    };
    let msg = RecognizerControl::start("rec-1", &config, true);

    let json = serde_json::to_string(&msg).unwrap();
    assert!(json.contains("\"action\":\"start\""));
    assert!(json.contains("\"locale\":\"fr-FR\""));
    assert!(json.contains("\"initial_silence_ms\":3000"));
    assert!(json.contains("\"end_silence_ms\":500"));
    assert!(!json.contains("auto_detect"));

    let deserialized: RecognizerControl = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized, msg);
    assert_eq!(deserialized.session_id(), "rec-1");
}

#[test]
fn test_stop_control_serialization() {
    let msg = RecognizerControl::Stop {
        session_id: "rec-1".to_string(),
    };
    let json = serde_json::to_string(&msg).unwrap();
    assert_eq!(json, r#"{"action":"stop","session_id":"rec-1"}"#);
}

#[test]
fn test_transcript_deserialization() {
    let json = r#"{
        "session_id": "rec-1",
        "text": "Hello world",
        "partial": false,
        "timestamp": "2025-10-27T14:30:05Z",
        "confidence": 0.95,
        "language": "en-US"
    }"#;

    let msg: TranscriptMessage = serde_json::from_str(json).unwrap();
    assert_eq!(msg.session_id, "rec-1");
    assert_eq!(msg.text, "Hello world");
    assert!(!msg.partial);
    assert_eq!(msg.confidence, Some(0.95));
    assert_eq!(msg.reason, None);

    match ProviderEvent::from(msg) {
        ProviderEvent::Recognized {
            text,
            reason,
            language,
            duration_seconds,
            ..
        } => {
            assert_eq!(text, "Hello world");
            assert_eq!(reason, ReasonCode::RecognizedSpeech);
            assert_eq!(language.as_deref(), Some("en-US"));
            assert_eq!(duration_seconds, None);
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[test]
fn test_partial_transcript_becomes_recognizing() {
    let json = r#"{
        "session_id": "rec-1",
        "text": "Hello",
        "partial": true,
        "timestamp": "2025-10-27T14:30:04Z"
    }"#;

    let msg: TranscriptMessage = serde_json::from_str(json).unwrap();
    assert_eq!(
        ProviderEvent::from(msg),
        ProviderEvent::Recognizing {
            text: "Hello".to_string()
        }
    );
}

#[test]
fn test_no_match_transcript() {
    let json = r#"{
        "session_id": "rec-1",
        "text": "",
        "partial": false,
        "timestamp": "2025-10-27T14:30:04Z",
        "reason": "no_match"
    }"#;

    let msg: TranscriptMessage = serde_json::from_str(json).unwrap();
    assert!(matches!(
        ProviderEvent::from(msg),
        ProviderEvent::Recognized {
            reason: ReasonCode::NoMatch,
            ..
        }
    ));
}

#[test]
fn test_recognizer_event_deserialization() {
    let json = r#"{"session_id": "rec-1", "event": "speech_end"}"#;
    let msg: RecognizerEventMessage = serde_json::from_str(json).unwrap();
    assert_eq!(msg.session_id, "rec-1");
    assert_eq!(msg.event, RecognizerEvent::SpeechEnd);
    assert_eq!(
        ProviderEvent::from(msg.event),
        ProviderEvent::SpeechEndDetected
    );
}

#[test]
fn test_canceled_event_carries_code() {
    let json = r#"{
        "session_id": "rec-1",
        "event": "canceled",
        "code": "too_many_requests",
        "detail": "quota exceeded"
    }"#;

    let msg: RecognizerEventMessage = serde_json::from_str(json).unwrap();
    match ProviderEvent::from(msg.event) {
        ProviderEvent::Canceled(err) => {
            assert_eq!(err.code, CancellationCode::TooManyRequests);
            assert_eq!(err.detail, "quota exceeded");
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[test]
fn test_canceled_event_without_code_is_unspecified() {
    let json = r#"{"session_id": "rec-1", "event": "canceled", "detail": "socket closed"}"#;
    let msg: RecognizerEventMessage = serde_json::from_str(json).unwrap();
    assert_eq!(
        msg.event,
        RecognizerEvent::Canceled {
            code: CancellationCode::Unspecified,
            detail: "socket closed".to_string()
        }
    );
}

#[test]
fn test_translate_response_variants() {
    let ok: TranslateResponse = serde_json::from_str(r#"{"text": "Bonjour"}"#).unwrap();
    assert_eq!(ok.text.as_deref(), Some("Bonjour"));
    assert_eq!(ok.error, None);

    let failed: TranslateResponse =
        serde_json::from_str(r#"{"error": "unsupported language pair"}"#).unwrap();
    assert_eq!(failed.text, None);
    assert!(failed.error.is_some());
}

#[test]
fn test_speak_request_omits_missing_voice() {
    let msg = SpeakRequest {
        text: "Bonjour".to_string(),
        locale: "fr-FR".to_string(),
        voice: None,
        timestamp: "2025-10-27T14:30:00Z".to_string(),
    };
    let json = serde_json::to_string(&msg).unwrap();
    assert!(!json.contains("voice"));

    let deserialized: SpeakRequest = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized, msg);
}
