use serde::{Deserialize, Serialize};

/// Configuration for a live voice session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Unique session identifier (e.g., "voice-5c0f...")
    pub session_id: String,

    /// WebSocket URL of the conversational agent
    pub agent_url: String,

    /// Agent model identifier sent during setup
    pub model: String,

    /// Optional system instruction for the agent persona
    pub system_instruction: Option<String>,

    /// Microphone sample rate (the agent expects 16kHz)
    pub capture_sample_rate: u32,

    /// Microphone channel count (1 = mono)
    pub capture_channels: u16,

    /// Samples per captured frame (4096 = one frame per ~256ms at 16kHz)
    pub capture_block_size: usize,

    /// Playback sample rate (the agent synthesizes at 24kHz)
    pub playback_sample_rate: u32,

    /// Playback channel count (1 = mono)
    pub playback_channels: u16,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: format!("voice-{}", uuid::Uuid::new_v4()),
            agent_url: "ws://localhost:8765/live".to_string(),
            model: "native-audio-agent".to_string(),
            system_instruction: None,
            capture_sample_rate: 16000,
            capture_channels: 1,
            capture_block_size: 4096,
            playback_sample_rate: 24000,
            playback_channels: 1,
        }
    }
}

/// The connection-facing slice of the session configuration.
#[derive(Debug, Clone)]
pub struct AgentEndpoint {
    pub url: String,
    pub model: String,
    pub system_instruction: Option<String>,
    pub session_id: String,
}

impl SessionConfig {
    /// Endpoint details handed to the duplex connector.
    pub fn endpoint(&self) -> AgentEndpoint {
        AgentEndpoint {
            url: self.agent_url.clone(),
            model: self.model.clone(),
            system_instruction: self.system_instruction.clone(),
            session_id: self.session_id.clone(),
        }
    }
}
