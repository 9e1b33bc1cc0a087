//! Transcript accumulation and turn segmentation
//!
//! The agent streams transcript text as small deltas per channel and signals
//! turn boundaries separately. This module buffers deltas until a boundary,
//! then emits finalized turns into an append-only session log.

use serde::{Deserialize, Serialize};

/// Which side of the conversation produced a piece of transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// The human speaking into the microphone
    Caller,
    /// The remote conversational agent
    Agent,
}

/// An incremental transcript fragment, consumed immediately on arrival.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptDelta {
    pub channel: Channel,
    pub text: String,
}

/// One finalized, contiguous utterance attributed to one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptTurn {
    pub channel: Channel,
    pub text: String,
}

/// Accumulates deltas per channel and finalizes turns on boundary signals.
#[derive(Debug, Default)]
pub struct TranscriptAggregator {
    caller_buffer: String,
    agent_buffer: String,
    turns: Vec<TranscriptTurn>,
}

impl TranscriptAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment to the channel's accumulation buffer.
    pub fn on_delta(&mut self, channel: Channel, text: &str) {
        match channel {
            Channel::Caller => self.caller_buffer.push_str(text),
            Channel::Agent => self.agent_buffer.push_str(text),
        }
    }

    /// Finalize the current turn.
    ///
    /// Emits one turn per channel with non-empty trimmed text, caller before
    /// agent, clears both buffers, and appends the turns to the session log.
    /// Returns the newly finalized turns.
    pub fn on_turn_boundary(&mut self) -> Vec<TranscriptTurn> {
        let mut finalized = Vec::new();

        let caller_text = std::mem::take(&mut self.caller_buffer);
        let caller_text = caller_text.trim();
        if !caller_text.is_empty() {
            finalized.push(TranscriptTurn {
                channel: Channel::Caller,
                text: caller_text.to_string(),
            });
        }

        let agent_text = std::mem::take(&mut self.agent_buffer);
        let agent_text = agent_text.trim();
        if !agent_text.is_empty() {
            finalized.push(TranscriptTurn {
                channel: Channel::Agent,
                text: agent_text.to_string(),
            });
        }

        self.turns.extend(finalized.iter().cloned());
        finalized
    }

    /// The in-progress (not yet finalized) text for a channel.
    pub fn pending(&self, channel: Channel) -> &str {
        match channel {
            Channel::Caller => &self.caller_buffer,
            Channel::Agent => &self.agent_buffer,
        }
    }

    /// Append-only log of finalized turns for the session lifetime.
    pub fn turns(&self) -> &[TranscriptTurn] {
        &self.turns
    }
}
