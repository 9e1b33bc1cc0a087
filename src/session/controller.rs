use super::config::SessionConfig;
use super::stats::SessionStats;
use crate::audio::codec::{decode_from_wire, decode_wire_payload, encode_for_wire};
use crate::audio::{
    CaptureBackend, CaptureConfig, CpalCaptureBackend, CpalOutputFactory, OutputSinkFactory,
    PlaybackScheduler, PlaybackSegment, RawAudioFrame,
};
use crate::client::{ClientEvent, DuplexConnector, DuplexHandle, ServerEvent, WsConnector};
use crate::error::{SessionError, SessionResult};
use crate::transcript::{TranscriptAggregator, TranscriptTurn};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Lifecycle of a session instance. `Error` is terminal: a new controller
/// must be constructed to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Connecting,
    Active,
    Error,
}

/// Owns every resource of one duplex voice session: the capture device, the
/// agent connection, the playback scheduler, and the transcript log.
///
/// Construction wires the seams; all host resources are acquired on
/// [`start`](Self::start) and released exactly once on teardown, no matter
/// how many times [`stop`](Self::stop) runs or which path triggered it.
pub struct SessionController {
    config: SessionConfig,

    capture: Box<dyn CaptureBackend>,
    connector: Box<dyn DuplexConnector>,
    output_factory: Box<dyn OutputSinkFactory>,

    state: SessionState,
    started_at: Option<chrono::DateTime<Utc>>,
    last_error: Option<String>,

    handle: Option<DuplexHandle>,
    events: Option<mpsc::Receiver<ClientEvent>>,
    frames: Option<mpsc::Receiver<RawAudioFrame>>,
    playback: Option<PlaybackScheduler>,
    transcript: TranscriptAggregator,

    frames_sent: usize,
    segments_played: usize,
}

impl SessionController {
    /// Controller wired to the real host: cpal devices and a WebSocket
    /// connection to the configured agent.
    pub fn new(config: SessionConfig) -> Self {
        let capture = CpalCaptureBackend::new(CaptureConfig {
            sample_rate: config.capture_sample_rate,
            channels: config.capture_channels,
            block_size: config.capture_block_size,
        });
        Self::with_parts(
            config,
            Box::new(capture),
            Box::new(WsConnector),
            Box::new(CpalOutputFactory),
        )
    }

    /// Controller with injected capture, transport, and output seams.
    pub fn with_parts(
        config: SessionConfig,
        capture: Box<dyn CaptureBackend>,
        connector: Box<dyn DuplexConnector>,
        output_factory: Box<dyn OutputSinkFactory>,
    ) -> Self {
        Self {
            config,
            capture,
            connector,
            output_factory,
            state: SessionState::Idle,
            started_at: None,
            last_error: None,
            handle: None,
            events: None,
            frames: None,
            playback: None,
            transcript: TranscriptAggregator::new(),
            frames_sent: 0,
            segments_played: 0,
        }
    }

    /// Acquire the microphone and begin connecting to the agent.
    ///
    /// Valid only from `Idle`. Device denial or connect failure tears the
    /// session down and leaves it in `Error`.
    pub async fn start(&mut self) -> SessionResult<()> {
        if self.state != SessionState::Idle {
            return Err(SessionError::AlreadyStarted);
        }

        info!(session_id = %self.config.session_id, "starting voice session");
        self.started_at = Some(Utc::now());

        let frames = match self.capture.start().await {
            Ok(rx) => rx,
            Err(e) => {
                self.fail(&e.to_string()).await;
                return Err(e);
            }
        };
        self.frames = Some(frames);
        info!(backend = self.capture.name(), "capture started");

        self.state = SessionState::Connecting;
        let endpoint = self.config.endpoint();
        match self.connector.connect(&endpoint).await {
            Ok((handle, events)) => {
                self.handle = Some(handle);
                self.events = Some(events);
                Ok(())
            }
            Err(e) => {
                self.fail(&e.to_string()).await;
                Err(e)
            }
        }
    }

    /// Drive the session until it reaches a terminal state or `shutdown`
    /// resolves. Returns the final state.
    ///
    /// This is the single cooperative loop: captured frames, connection
    /// events, and playback reaping all dispatch here run-to-completion.
    pub async fn run<F>(&mut self, shutdown: F) -> SessionState
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut frames = self.frames.take();
        let mut events = self.events.take();
        let mut reap_tick = tokio::time::interval(Duration::from_millis(250));

        loop {
            tokio::select! {
                // Drain captured audio ahead of inbound events so the send
                // path never lags behind dispatch.
                biased;

                _ = &mut shutdown => {
                    self.stop().await;
                    break;
                }
                maybe_frame = recv_opt(&mut frames) => match maybe_frame {
                    Some(frame) => self.forward_frame(frame),
                    None => frames = None,
                },
                maybe_event = recv_opt(&mut events) => match maybe_event {
                    Some(event) => {
                        self.handle_client_event(event).await;
                        if matches!(self.state, SessionState::Idle | SessionState::Error) {
                            break;
                        }
                    }
                    None => {
                        // Event channel died without an orderly close.
                        if matches!(self.state, SessionState::Connecting | SessionState::Active) {
                            self.fail("connection lost").await;
                        }
                        break;
                    }
                },
                _ = reap_tick.tick() => {
                    if let Some(playback) = self.playback.as_mut() {
                        playback.reap();
                    }
                }
            }
        }

        self.state
    }

    /// Encode one captured frame and forward it to the agent. Frames are
    /// dropped by the handle while the connection is not yet open.
    fn forward_frame(&mut self, frame: RawAudioFrame) {
        if let Some(handle) = &self.handle {
            handle.send(encode_for_wire(&frame));
            self.frames_sent += 1;
        }
    }

    /// Dispatch one connection event.
    pub async fn handle_client_event(&mut self, event: ClientEvent) {
        match event {
            ClientEvent::Open => {
                if self.state != SessionState::Connecting {
                    warn!(state = ?self.state, "ignoring open event");
                    return;
                }
                match self
                    .output_factory
                    .open(self.config.playback_sample_rate, self.config.playback_channels)
                {
                    Ok(sink) => {
                        self.playback = Some(PlaybackScheduler::new(sink));
                        self.state = SessionState::Active;
                        info!("session active");
                    }
                    Err(e) => self.fail(&e.to_string()).await,
                }
            }
            ClientEvent::Server(event) => self.handle_server_event(event).await,
            ClientEvent::TransportError(message) => self.fail(&message).await,
            ClientEvent::Closed => {
                info!("agent closed the connection");
                self.teardown().await;
                self.state = SessionState::Idle;
            }
        }
    }

    async fn handle_server_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::AudioChunk { payload } => {
                let bytes = match decode_wire_payload(&payload) {
                    Ok(b) => b,
                    Err(e) => {
                        warn!("dropping audio chunk: {}", e);
                        return;
                    }
                };
                let frame = match decode_from_wire(
                    &bytes,
                    self.config.playback_sample_rate,
                    self.config.playback_channels,
                ) {
                    Ok(f) => f,
                    Err(e) => {
                        warn!("dropping audio chunk: {}", e);
                        return;
                    }
                };

                match self.playback.as_mut() {
                    Some(playback) => {
                        playback.reap();
                        let segment = PlaybackSegment {
                            samples: frame.samples,
                            sample_rate: frame.sample_rate,
                        };
                        match playback.enqueue(segment) {
                            Ok(()) => self.segments_played += 1,
                            Err(e) => warn!("failed to schedule audio chunk: {}", e),
                        }
                    }
                    None => warn!("audio chunk before output device ready; dropped"),
                }
            }
            ServerEvent::TranscriptDelta { channel, text } => {
                self.transcript.on_delta(channel, &text);
            }
            ServerEvent::TurnComplete => {
                for turn in self.transcript.on_turn_boundary() {
                    info!(channel = ?turn.channel, text = %turn.text, "turn finalized");
                }
            }
            ServerEvent::Interrupted => {
                if let Some(playback) = self.playback.as_mut() {
                    playback.interrupt();
                }
            }
            ServerEvent::Error { message } => self.fail(&message).await,
            ServerEvent::Closed => {
                info!("agent ended the conversation");
                self.teardown().await;
                self.state = SessionState::Idle;
            }
        }
    }

    /// Tear everything down and return to `Idle`. Valid from any state and
    /// safe to invoke redundantly; a stop while already idle is a no-op.
    pub async fn stop(&mut self) {
        if self.state != SessionState::Idle {
            info!(session_id = %self.config.session_id, "stopping voice session");
        }
        self.teardown().await;
        self.state = SessionState::Idle;
    }

    async fn fail(&mut self, message: &str) {
        error!(session_id = %self.config.session_id, "session failed: {}", message);
        self.teardown().await;
        self.last_error = Some(message.to_string());
        self.state = SessionState::Error;
    }

    /// Release every owned resource, attempting each independently. A
    /// failure releasing one resource never blocks the others; cleanup
    /// errors are logged and swallowed.
    async fn teardown(&mut self) {
        if let Err(e) = self.capture.stop().await {
            warn!("cleanup: failed to stop capture: {}", e);
        }
        if let Some(mut playback) = self.playback.take() {
            playback.close();
        }
        if let Some(handle) = self.handle.take() {
            handle.close();
        }
        self.frames = None;
        self.events = None;
    }

    /// Current session state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Message of the fatal error that ended the session, if any
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Finalized transcript turns, in conversation order
    pub fn transcript(&self) -> &[TranscriptTurn] {
        self.transcript.turns()
    }

    /// Current session statistics
    pub fn stats(&self) -> SessionStats {
        let duration_secs = self
            .started_at
            .map(|t| Utc::now().signed_duration_since(t).num_milliseconds() as f64 / 1000.0)
            .unwrap_or(0.0);

        SessionStats {
            state: self.state,
            started_at: self.started_at,
            duration_secs,
            frames_sent: self.frames_sent,
            segments_played: self.segments_played,
            turns_count: self.transcript.turns().len(),
        }
    }
}

async fn recv_opt<T>(rx: &mut Option<mpsc::Receiver<T>>) -> Option<T> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
