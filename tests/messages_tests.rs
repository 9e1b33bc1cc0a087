// Serialization tests for the duplex wire protocol

use voxlink::client::messages::{ClientMessage, ServerEvent};
use voxlink::transcript::Channel;

#[test]
fn test_outbound_audio_serialization() {
    let message = ClientMessage::Audio {
        mime_type: "audio/pcm;rate=16000".to_string(),
        data: "AAAA".to_string(),
    };

    let json = serde_json::to_string(&message).unwrap();
    assert!(json.contains("\"kind\":\"audio\""));
    assert!(json.contains("\"mimeType\":\"audio/pcm;rate=16000\""));
    assert!(json.contains("\"data\":\"AAAA\""));
}

#[test]
fn test_setup_omits_absent_system_instruction() {
    let message = ClientMessage::Setup {
        session_id: "voice-1".to_string(),
        model: "native-audio-agent".to_string(),
        system_instruction: None,
    };

    let json = serde_json::to_string(&message).unwrap();
    assert!(json.contains("\"kind\":\"setup\""));
    assert!(!json.contains("systemInstruction"));
}

#[test]
fn test_audio_chunk_deserialization() {
    let json = r#"{"kind":"audioChunk","payload":"UENN"}"#;
    let event: ServerEvent = serde_json::from_str(json).unwrap();
    assert!(matches!(event, ServerEvent::AudioChunk { payload } if payload == "UENN"));
}

#[test]
fn test_transcript_delta_deserialization() {
    let json = r#"{"kind":"transcriptDelta","channel":"caller","text":"He"}"#;
    let event: ServerEvent = serde_json::from_str(json).unwrap();
    match event {
        ServerEvent::TranscriptDelta { channel, text } => {
            assert_eq!(channel, Channel::Caller);
            assert_eq!(text, "He");
        }
        other => panic!("unexpected event: {:?}", other),
    }

    let json = r#"{"kind":"transcriptDelta","channel":"agent","text":"llo"}"#;
    let event: ServerEvent = serde_json::from_str(json).unwrap();
    assert!(matches!(
        event,
        ServerEvent::TranscriptDelta { channel: Channel::Agent, .. }
    ));
}

#[test]
fn test_signal_events_deserialize_from_kind_alone() {
    assert!(matches!(
        serde_json::from_str::<ServerEvent>(r#"{"kind":"turnComplete"}"#).unwrap(),
        ServerEvent::TurnComplete
    ));
    assert!(matches!(
        serde_json::from_str::<ServerEvent>(r#"{"kind":"interrupted"}"#).unwrap(),
        ServerEvent::Interrupted
    ));
    assert!(matches!(
        serde_json::from_str::<ServerEvent>(r#"{"kind":"closed"}"#).unwrap(),
        ServerEvent::Closed
    ));
}

#[test]
fn test_error_event_carries_message() {
    let json = r#"{"kind":"error","message":"quota exceeded"}"#;
    let event: ServerEvent = serde_json::from_str(json).unwrap();
    assert!(matches!(event, ServerEvent::Error { message } if message == "quota exceeded"));
}

#[test]
fn test_unknown_kind_is_rejected() {
    // Malformed shapes must fail to parse so the reader can drop them.
    assert!(serde_json::from_str::<ServerEvent>(r#"{"kind":"videoChunk"}"#).is_err());
    assert!(serde_json::from_str::<ServerEvent>(r#"{"payload":"AAAA"}"#).is_err());
}
