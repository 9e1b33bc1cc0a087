use super::controller::SessionState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Statistics about a live voice session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    /// Current session state
    pub state: SessionState,

    /// When the session started, if it has
    pub started_at: Option<DateTime<Utc>>,

    /// Total duration in seconds since start
    pub duration_secs: f64,

    /// Number of captured audio frames forwarded to the agent
    pub frames_sent: usize,

    /// Number of agent audio segments scheduled for playback
    pub segments_played: usize,

    /// Number of finalized transcript turns
    pub turns_count: usize,
}
