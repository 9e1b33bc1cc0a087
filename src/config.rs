use crate::session::SessionConfig;
use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub agent: AgentConfig,
    pub audio: AudioConfig,
}

#[derive(Debug, Deserialize)]
pub struct AgentConfig {
    pub url: String,
    pub model: String,
    pub system_instruction: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AudioConfig {
    pub capture_sample_rate: u32,
    pub capture_channels: u16,
    pub capture_block_size: usize,
    pub playback_sample_rate: u32,
    pub playback_channels: u16,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Build a per-session configuration with a fresh session id.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            agent_url: self.agent.url.clone(),
            model: self.agent.model.clone(),
            system_instruction: self.agent.system_instruction.clone(),
            capture_sample_rate: self.audio.capture_sample_rate,
            capture_channels: self.audio.capture_channels,
            capture_block_size: self.audio.capture_block_size,
            playback_sample_rate: self.audio.playback_sample_rate,
            playback_channels: self.audio.playback_channels,
            ..SessionConfig::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let session = SessionConfig::default();
        Self {
            agent: AgentConfig {
                url: session.agent_url,
                model: session.model,
                system_instruction: None,
            },
            audio: AudioConfig {
                capture_sample_rate: session.capture_sample_rate,
                capture_channels: session.capture_channels,
                capture_block_size: session.capture_block_size,
                playback_sample_rate: session.playback_sample_rate,
                playback_channels: session.playback_channels,
            },
        }
    }
}
