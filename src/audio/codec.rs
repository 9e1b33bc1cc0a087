//! PCM wire codec
//!
//! Stateless conversion between normalized float sample buffers and the
//! 16-bit little-endian PCM encoding sent over the duplex link, plus the
//! base64 layer that makes the bytes text-safe for JSON transport.

use crate::error::{SessionError, SessionResult};
use base64::Engine;

/// MIME-style format tag attached to every outbound audio packet.
pub const WIRE_MIME_TYPE: &str = "audio/pcm;rate=16000";

/// A block of raw audio samples as produced by capture or decoded from the
/// wire. Samples are f32 in [-1.0, 1.0), interleaved when multi-channel.
#[derive(Debug, Clone)]
pub struct RawAudioFrame {
    /// Normalized samples (interleaved)
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
}

impl RawAudioFrame {
    /// Duration of this frame in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.channels as f64 / self.sample_rate as f64
    }
}

/// Text-safe encoding of one audio frame, ready for transmission.
#[derive(Debug, Clone)]
pub struct WireAudioPacket {
    /// Format tag, e.g. "audio/pcm;rate=16000"
    pub mime_type: String,
    /// Base64-encoded 16-bit little-endian PCM
    pub data: String,
}

/// Encode a raw frame for the wire: scale f32 samples into the signed 16-bit
/// range (clamped), serialize little-endian, then base64.
pub fn encode_for_wire(frame: &RawAudioFrame) -> WireAudioPacket {
    let mut pcm_bytes = Vec::with_capacity(frame.samples.len() * 2);
    for &sample in &frame.samples {
        let scaled = (sample * 32768.0).clamp(i16::MIN as f32, i16::MAX as f32) as i16;
        pcm_bytes.extend_from_slice(&scaled.to_le_bytes());
    }

    WireAudioPacket {
        mime_type: WIRE_MIME_TYPE.to_string(),
        data: base64::engine::general_purpose::STANDARD.encode(&pcm_bytes),
    }
}

/// Decode the base64 layer of an inbound audio payload.
pub fn decode_wire_payload(data: &str) -> SessionResult<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(data)
        .map_err(|e| SessionError::Format(format!("invalid base64 audio payload: {}", e)))
}

/// Decode raw PCM bytes into a normalized frame.
///
/// Bytes are interpreted as interleaved 16-bit signed little-endian samples
/// and rescaled to [-1.0, 1.0). Fails if the byte length is not a multiple
/// of `2 * channels`.
pub fn decode_from_wire(bytes: &[u8], sample_rate: u32, channels: u16) -> SessionResult<RawAudioFrame> {
    let frame_size = 2 * channels as usize;
    if frame_size == 0 || bytes.len() % frame_size != 0 {
        return Err(SessionError::Format(format!(
            "PCM byte length {} is not a multiple of {} ({}ch x 2 bytes)",
            bytes.len(),
            frame_size,
            channels
        )));
    }

    let samples: Vec<f32> = bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect();

    Ok(RawAudioFrame {
        samples,
        sample_rate,
        channels,
    })
}
