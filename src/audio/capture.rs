//! Microphone capture abstraction

use crate::audio::codec::RawAudioFrame;
use crate::error::SessionResult;
use tokio::sync::mpsc;

/// Configuration for audio capture
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Capture sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels (1 = mono)
    pub channels: u16,
    /// Samples per emitted frame (4096 at 16kHz = one frame per ~256ms)
    pub block_size: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000, // 16kHz, the rate the agent expects
            channels: 1,        // Mono
            block_size: 4096,   // ~256ms blocks
        }
    }
}

/// Audio capture backend trait
///
/// Implementations:
/// - `CpalCaptureBackend`: default host microphone via cpal
/// - Test doubles that feed synthetic frames
#[async_trait::async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Start capturing audio
    ///
    /// Returns a channel receiver that will receive fixed-size raw frames.
    /// Fails with `UnsupportedEnvironment` if the host has no capture
    /// capability and `PermissionDenied` if device access is refused.
    async fn start(&mut self) -> SessionResult<mpsc::Receiver<RawAudioFrame>>;

    /// Stop capturing audio. Idempotent; always stops the underlying device.
    async fn stop(&mut self) -> SessionResult<()>;

    /// Check if backend is currently capturing
    fn is_capturing(&self) -> bool;

    /// Get backend name for logging
    fn name(&self) -> &str;
}
