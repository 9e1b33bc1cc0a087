//! Speaker output via cpal
//!
//! The output stream is owned by a dedicated thread (`cpal::Stream` is
//! `!Send`). Scheduling works against a shared mix state: the device
//! callback advances a sample-counter clock and mixes every source whose
//! start position has been reached, so `now()` and scheduled start times
//! share one timeline.

use crate::audio::playback::{OutputSink, SourceId};
use crate::error::{SessionError, SessionResult};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, StreamConfig};
use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};

struct MixSource {
    id: SourceId,
    start_sample: u64,
    samples: Vec<f32>,
    cursor: usize,
}

#[derive(Default)]
struct MixState {
    clock_samples: u64,
    sources: Vec<MixSource>,
    finished: Vec<SourceId>,
    next_id: u64,
}

impl MixState {
    /// Mix all due sources into one output buffer, advancing the clock.
    fn render(&mut self, output: &mut [f32]) {
        for slot in output.iter_mut() {
            let mut mixed = 0.0f32;
            for source in self.sources.iter_mut() {
                if self.clock_samples >= source.start_sample && source.cursor < source.samples.len()
                {
                    mixed += source.samples[source.cursor];
                    source.cursor += 1;
                }
            }
            *slot = mixed.clamp(-1.0, 1.0);
            self.clock_samples += 1;
        }

        let finished = &mut self.finished;
        self.sources.retain(|s| {
            if s.cursor >= s.samples.len() {
                finished.push(s.id);
                false
            } else {
                true
            }
        });
    }
}

/// Mixing output sink over the default host output device.
pub struct CpalOutputSink {
    sample_rate: u32,
    state: Arc<Mutex<MixState>>,
    stop_tx: Option<std_mpsc::Sender<()>>,
}

impl CpalOutputSink {
    /// Open the default output device at the given rate (mono).
    pub fn open(sample_rate: u32, channels: u16) -> SessionResult<Self> {
        let state = Arc::new(Mutex::new(MixState::default()));
        let (stop_tx, stop_rx) = std_mpsc::channel::<()>();
        let (ready_tx, ready_rx) = std_mpsc::channel::<SessionResult<()>>();

        let callback_state = Arc::clone(&state);
        std::thread::spawn(move || {
            info!("output thread started");

            let host = cpal::default_host();
            let device = match host.default_output_device() {
                Some(d) => d,
                None => {
                    let _ = ready_tx.send(Err(SessionError::UnsupportedEnvironment(
                        "no output device available".to_string(),
                    )));
                    return;
                }
            };

            let config = StreamConfig {
                channels,
                sample_rate: SampleRate(sample_rate),
                buffer_size: cpal::BufferSize::Default,
            };

            let stream = device.build_output_stream(
                &config,
                move |output: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    callback_state.lock().unwrap().render(output);
                },
                |err| error!("output stream error: {}", err),
                None,
            );

            let stream = match stream {
                Ok(s) => s,
                Err(e) => {
                    let _ = ready_tx.send(Err(SessionError::UnsupportedEnvironment(e.to_string())));
                    return;
                }
            };

            if let Err(e) = stream.play() {
                let _ = ready_tx.send(Err(SessionError::UnsupportedEnvironment(e.to_string())));
                return;
            }
            let _ = ready_tx.send(Ok(()));

            match stop_rx.recv() {
                Ok(_) => info!("output thread received stop signal"),
                Err(_) => warn!("output stop channel closed before stop"),
            }
            info!("output thread exiting");
        });

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                return Err(SessionError::UnsupportedEnvironment(
                    "output thread failed to start".to_string(),
                ))
            }
        }

        Ok(Self {
            sample_rate,
            state,
            stop_tx: Some(stop_tx),
        })
    }
}

impl OutputSink for CpalOutputSink {
    fn now(&self) -> f64 {
        let state = self.state.lock().unwrap();
        state.clock_samples as f64 / self.sample_rate as f64
    }

    fn schedule(&mut self, samples: &[f32], start: f64) -> SessionResult<SourceId> {
        let mut state = self.state.lock().unwrap();
        let id = SourceId(state.next_id);
        state.next_id += 1;
        state.sources.push(MixSource {
            id,
            start_sample: (start * self.sample_rate as f64) as u64,
            samples: samples.to_vec(),
            cursor: 0,
        });
        Ok(id)
    }

    fn stop(&mut self, id: SourceId) {
        self.state.lock().unwrap().sources.retain(|s| s.id != id);
    }

    fn finished(&mut self) -> Vec<SourceId> {
        std::mem::take(&mut self.state.lock().unwrap().finished)
    }

    fn close(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
            self.state.lock().unwrap().sources.clear();
            info!("output device released");
        }
    }
}

impl Drop for CpalOutputSink {
    fn drop(&mut self) {
        self.close();
    }
}

/// Factory handing out [`CpalOutputSink`]s when the session goes active.
pub struct CpalOutputFactory;

impl crate::audio::playback::OutputSinkFactory for CpalOutputFactory {
    fn open(&self, sample_rate: u32, channels: u16) -> SessionResult<Box<dyn OutputSink>> {
        Ok(Box::new(CpalOutputSink::open(sample_rate, channels)?))
    }
}
