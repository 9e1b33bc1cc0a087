pub mod audio;
pub mod client;
pub mod config;
pub mod error;
pub mod session;
pub mod transcript;

pub use audio::{
    CaptureBackend, CaptureConfig, OutputSink, OutputSinkFactory, PlaybackScheduler,
    PlaybackSegment, RawAudioFrame, SourceId, WireAudioPacket,
};
pub use client::{ClientEvent, ConnectionState, DuplexConnector, DuplexHandle, ServerEvent};
pub use config::Config;
pub use error::{SessionError, SessionResult};
pub use session::{AgentEndpoint, SessionConfig, SessionController, SessionState, SessionStats};
pub use transcript::{Channel, TranscriptAggregator, TranscriptDelta, TranscriptTurn};
