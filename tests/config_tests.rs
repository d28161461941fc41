use speech_bridge::Config;
use std::io::Write;
use std::time::Duration;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_minimal_config_uses_defaults() {
    let file = write_config(
        r#"
[service]
name = "speech-bridge"

[service.http]
bind = "127.0.0.1"
port = 3030
"#,
    );

    let cfg = Config::load(file.path().to_str().unwrap()).unwrap();
    assert_eq!(cfg.service.http.port, 3030);
    assert_eq!(cfg.nats.url, "nats://localhost:4222");

    let settings = cfg.speech.to_settings();
    assert_eq!(settings.max_attempts, 3);
    assert_eq!(settings.base_delay, Duration::from_millis(1000));
    assert_eq!(settings.duplicate_window, Duration::from_millis(2000));
    assert_eq!(settings.min_text_chars, 2);
    assert_eq!(settings.chunk_min_words, 5);
    assert_eq!(settings.idle_timeout, Duration::from_secs(300));
    assert_eq!(settings.watchdog_interval, Duration::from_secs(60));

    let interview = cfg.interview_defaults();
    assert_eq!(interview.staff_language, "en");
    assert!(interview.persist_connection);
}

#[test]
fn test_interview_section_and_voices() {
    let file = write_config(
        r#"
[service]
name = "speech-bridge"

[service.http]
bind = "0.0.0.0"
port = 8080

[speech]
max_attempts = 5
persist_connection = false

[interview]
staff_language = "fr"
client_language = "ar"
candidate_languages = ["fr", "en", "ar"]

[interview.voices]
fr = "fr-FR-DeniseNeural"
"#,
    );

    let cfg = Config::load(file.path().to_str().unwrap()).unwrap();
    assert_eq!(cfg.speech.to_settings().max_attempts, 5);

    let interview = cfg.interview_defaults();
    assert_eq!(interview.staff_language, "fr");
    assert_eq!(interview.client_language, "ar");
    assert_eq!(interview.candidate_languages.len(), 3);
    assert_eq!(
        interview.voices.get("fr").map(String::as_str),
        Some("fr-FR-DeniseNeural")
    );
    assert!(!interview.persist_connection);
}

#[test]
fn test_missing_file_is_an_error() {
    assert!(Config::load("/nonexistent/speech-bridge").is_err());
}
