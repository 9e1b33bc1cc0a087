use crate::transcript::Channel;
use serde::{Deserialize, Serialize};

/// Message sent to the agent over the duplex link.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ClientMessage {
    /// One wire-encoded audio frame
    #[serde(rename_all = "camelCase")]
    Audio {
        mime_type: String,
        /// Base64-encoded PCM bytes
        data: String,
    },
    /// Session setup, sent once after the connection opens
    #[serde(rename_all = "camelCase")]
    Setup {
        session_id: String,
        model: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        system_instruction: Option<String>,
    },
}

/// Message received from the agent; a closed union so that a new inbound
/// kind is a compile-time-checked change at every dispatch site.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Synthesized speech (base64 PCM, 24kHz mono)
    AudioChunk { payload: String },
    /// Incremental transcript text for one channel
    TranscriptDelta { channel: Channel, text: String },
    /// The current turn is complete on both channels
    TurnComplete,
    /// The caller began speaking over the agent; flush playback
    Interrupted,
    /// Terminal server-side error
    Error { message: String },
    /// Orderly end of the conversation
    Closed,
}
