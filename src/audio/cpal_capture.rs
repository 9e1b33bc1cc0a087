//! Microphone capture via cpal
//!
//! `cpal::Stream` is `!Send`, so the stream lives on a dedicated thread that
//! holds it until a stop signal arrives. Samples are converted to f32,
//! sliced into fixed-size blocks, and handed to the session over a tokio
//! channel.

use crate::audio::capture::{CaptureBackend, CaptureConfig};
use crate::audio::codec::RawAudioFrame;
use crate::error::{SessionError, SessionResult};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, StreamConfig};
use std::sync::mpsc as std_mpsc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Capture from the default host input device.
pub struct CpalCaptureBackend {
    config: CaptureConfig,
    stop_tx: Option<std_mpsc::Sender<()>>,
}

impl CpalCaptureBackend {
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            config,
            stop_tx: None,
        }
    }
}

/// Accumulates converted samples and emits fixed-size frames.
struct BlockAssembler {
    pending: Vec<f32>,
    block_size: usize,
    sample_rate: u32,
    channels: u16,
    frame_tx: mpsc::Sender<RawAudioFrame>,
}

impl BlockAssembler {
    fn push(&mut self, samples: &[f32]) {
        self.pending.extend_from_slice(samples);
        while self.pending.len() >= self.block_size {
            let rest = self.pending.split_off(self.block_size);
            let block = std::mem::replace(&mut self.pending, rest);
            let frame = RawAudioFrame {
                samples: block,
                sample_rate: self.sample_rate,
                channels: self.channels,
            };
            // The device callback must never block; a full channel means the
            // consumer stalled, so the frame is dropped.
            if self.frame_tx.try_send(frame).is_err() {
                warn!("capture frame dropped: session channel full or closed");
            }
        }
    }
}

fn build_and_run_stream<T, F>(
    device: &cpal::Device,
    config: &StreamConfig,
    mut assembler: BlockAssembler,
    convert: F,
) -> SessionResult<cpal::Stream>
where
    T: cpal::Sample + cpal::SizedSample + Send + 'static,
    F: Fn(T) -> f32 + Send + 'static,
{
    let stream = device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let converted: Vec<f32> = data.iter().map(|&s| convert(s)).collect();
                assembler.push(&converted);
            },
            |err| error!("capture stream error: {}", err),
            None,
        )
        .map_err(map_build_error)?;

    stream
        .play()
        .map_err(|e| SessionError::PermissionDenied(e.to_string()))?;

    Ok(stream)
}

fn map_build_error(err: cpal::BuildStreamError) -> SessionError {
    match err {
        cpal::BuildStreamError::DeviceNotAvailable => {
            SessionError::PermissionDenied("input device not available".to_string())
        }
        other => SessionError::UnsupportedEnvironment(other.to_string()),
    }
}

#[async_trait::async_trait]
impl CaptureBackend for CpalCaptureBackend {
    async fn start(&mut self) -> SessionResult<mpsc::Receiver<RawAudioFrame>> {
        if self.stop_tx.is_some() {
            return Err(SessionError::AlreadyStarted);
        }

        let (frame_tx, frame_rx) = mpsc::channel::<RawAudioFrame>(32);
        let (stop_tx, stop_rx) = std_mpsc::channel::<()>();
        let (ready_tx, ready_rx) = std_mpsc::channel::<SessionResult<()>>();

        let capture_config = self.config.clone();

        std::thread::spawn(move || {
            info!("capture thread started");

            let host = cpal::default_host();
            let device = match host.default_input_device() {
                Some(d) => d,
                None => {
                    let _ = ready_tx.send(Err(SessionError::UnsupportedEnvironment(
                        "no input device available".to_string(),
                    )));
                    return;
                }
            };

            let stream_config = StreamConfig {
                channels: capture_config.channels,
                sample_rate: SampleRate(capture_config.sample_rate),
                buffer_size: cpal::BufferSize::Default,
            };

            let sample_format = match device.default_input_config() {
                Ok(c) => c.sample_format(),
                Err(e) => {
                    let _ = ready_tx.send(Err(SessionError::PermissionDenied(e.to_string())));
                    return;
                }
            };

            let assembler = BlockAssembler {
                pending: Vec::with_capacity(capture_config.block_size),
                block_size: capture_config.block_size,
                sample_rate: capture_config.sample_rate,
                channels: capture_config.channels,
                frame_tx,
            };

            let stream_result = match sample_format {
                SampleFormat::I16 => build_and_run_stream::<i16, _>(
                    &device,
                    &stream_config,
                    assembler,
                    |s| f32::from(s) / 32768.0,
                ),
                SampleFormat::U16 => build_and_run_stream::<u16, _>(
                    &device,
                    &stream_config,
                    assembler,
                    |s| (f32::from(s) - 32768.0) / 32768.0,
                ),
                SampleFormat::F32 => {
                    build_and_run_stream::<f32, _>(&device, &stream_config, assembler, |s| s)
                }
                other => Err(SessionError::UnsupportedEnvironment(format!(
                    "unsupported sample format: {:?}",
                    other
                ))),
            };

            let _stream = match stream_result {
                Ok(s) => {
                    let _ = ready_tx.send(Ok(()));
                    s
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            // The stream is owned by this thread and dropped (stopping the
            // device) when the stop signal arrives or the sender is dropped.
            match stop_rx.recv() {
                Ok(_) => info!("capture thread received stop signal"),
                Err(_) => warn!("capture stop channel closed before stop"),
            }
            info!("capture thread exiting");
        });

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                return Err(SessionError::UnsupportedEnvironment(
                    "capture thread failed to start".to_string(),
                ))
            }
        }

        self.stop_tx = Some(stop_tx);
        Ok(frame_rx)
    }

    async fn stop(&mut self) -> SessionResult<()> {
        if let Some(stop_tx) = self.stop_tx.take() {
            // Thread already gone means the device is already stopped.
            let _ = stop_tx.send(());
            info!("capture stopped");
        }
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.stop_tx.is_some()
    }

    fn name(&self) -> &str {
        "cpal-microphone"
    }
}
