//! Gapless playback scheduling
//!
//! Inbound agent audio arrives as discrete segments, not necessarily at the
//! pace of the output timeline. The scheduler keeps a `next_start` marker on
//! the device clock so consecutive segments play back-to-back with no gap
//! and no overlap, and flushes everything immediately on barge-in.

use crate::error::SessionResult;
use std::collections::HashSet;
use tracing::{debug, info};

/// Identifier for a scheduled playback source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(pub u64);

/// A decoded audio segment awaiting playback (PCM f32, mono).
#[derive(Debug, Clone)]
pub struct PlaybackSegment {
    /// Normalized samples
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl PlaybackSegment {
    /// Segment duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Host audio output capability.
///
/// `now()` is a monotonic clock in seconds that only advances while the
/// device is open. `finished()` drains the set of sources that completed
/// naturally since the last call.
pub trait OutputSink: Send {
    /// Current device clock in seconds
    fn now(&self) -> f64;

    /// Schedule a buffer to begin playing at `start` on the device clock
    fn schedule(&mut self, samples: &[f32], start: f64) -> SessionResult<SourceId>;

    /// Stop a scheduled source immediately
    fn stop(&mut self, id: SourceId);

    /// Sources that have completed naturally since the last call
    fn finished(&mut self) -> Vec<SourceId>;

    /// Stop everything and release the output device
    fn close(&mut self);
}

/// Opens the host output device. Separate from [`OutputSink`] because the
/// device is only allocated once the connection to the agent is open.
pub trait OutputSinkFactory: Send + Sync {
    fn open(&self, sample_rate: u32, channels: u16) -> SessionResult<Box<dyn OutputSink>>;
}

/// Schedules decoded segments gaplessly on an output sink.
pub struct PlaybackScheduler {
    sink: Box<dyn OutputSink>,
    next_start: f64,
    active: HashSet<SourceId>,
    closed: bool,
}

impl PlaybackScheduler {
    pub fn new(sink: Box<dyn OutputSink>) -> Self {
        Self {
            sink,
            next_start: 0.0,
            active: HashSet::new(),
            closed: false,
        }
    }

    /// Schedule a segment directly after the last one, or immediately if the
    /// timeline has fallen behind the device clock.
    pub fn enqueue(&mut self, segment: PlaybackSegment) -> SessionResult<()> {
        if self.closed {
            debug!("segment dropped: scheduler closed");
            return Ok(());
        }

        let start = self.next_start.max(self.sink.now());
        let id = self.sink.schedule(&segment.samples, start)?;
        self.active.insert(id);
        self.next_start = start + segment.duration_secs();

        debug!(
            start,
            duration = segment.duration_secs(),
            active = self.active.len(),
            "segment scheduled"
        );
        Ok(())
    }

    /// Remove naturally-completed sources from the active set.
    pub fn reap(&mut self) {
        for id in self.sink.finished() {
            self.active.remove(&id);
        }
    }

    /// Barge-in: stop all pending audio and reset the timeline to silence.
    pub fn interrupt(&mut self) {
        info!(stopped = self.active.len(), "playback interrupted");
        for id in self.active.drain() {
            self.sink.stop(id);
        }
        self.next_start = 0.0;
    }

    /// Stop all active sources and release the output device. Idempotent.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        for id in self.active.drain() {
            self.sink.stop(id);
        }
        self.sink.close();
        self.closed = true;
    }

    /// Number of sources currently scheduled or playing
    pub fn active_sources(&self) -> usize {
        self.active.len()
    }

    /// Device-clock time at which the next segment will start, at earliest
    pub fn next_start(&self) -> f64 {
        self.next_start
    }
}

impl Drop for PlaybackScheduler {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct FakeSinkState {
        clock: f64,
        scheduled: Vec<(SourceId, f64, usize)>,
        stopped: Vec<SourceId>,
        done: Vec<SourceId>,
        next_id: u64,
    }

    #[derive(Clone, Default)]
    struct FakeSink(Arc<Mutex<FakeSinkState>>);

    impl FakeSink {
        fn set_clock(&self, t: f64) {
            self.0.lock().unwrap().clock = t;
        }
    }

    impl OutputSink for FakeSink {
        fn now(&self) -> f64 {
            self.0.lock().unwrap().clock
        }

        fn schedule(&mut self, samples: &[f32], start: f64) -> SessionResult<SourceId> {
            let mut state = self.0.lock().unwrap();
            let id = SourceId(state.next_id);
            state.next_id += 1;
            state.scheduled.push((id, start, samples.len()));
            Ok(id)
        }

        fn stop(&mut self, id: SourceId) {
            self.0.lock().unwrap().stopped.push(id);
        }

        fn finished(&mut self) -> Vec<SourceId> {
            std::mem::take(&mut self.0.lock().unwrap().done)
        }

        fn close(&mut self) {}
    }

    fn segment(duration_secs: f64) -> PlaybackSegment {
        PlaybackSegment {
            samples: vec![0.0; (duration_secs * 24000.0) as usize],
            sample_rate: 24000,
        }
    }

    #[test]
    fn test_back_to_back_scheduling() {
        let sink = FakeSink::default();
        let mut scheduler = PlaybackScheduler::new(Box::new(sink.clone()));

        scheduler.enqueue(segment(0.5)).unwrap();
        sink.set_clock(0.1);
        scheduler.enqueue(segment(0.3)).unwrap();

        let state = sink.0.lock().unwrap();
        assert_eq!(state.scheduled[0].1, 0.0);
        // Second segment starts at the end of the first, not at arrival time.
        assert_eq!(state.scheduled[1].1, 0.5);
        drop(state);
        assert!((scheduler.next_start() - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_interrupt_flushes_and_resets() {
        let sink = FakeSink::default();
        let mut scheduler = PlaybackScheduler::new(Box::new(sink.clone()));

        scheduler.enqueue(segment(0.5)).unwrap();
        scheduler.enqueue(segment(0.3)).unwrap();
        sink.set_clock(0.6);
        scheduler.interrupt();

        assert_eq!(scheduler.active_sources(), 0);
        assert_eq!(scheduler.next_start(), 0.0);
        assert_eq!(sink.0.lock().unwrap().stopped.len(), 2);

        // Next segment schedules at the current clock, not in the past.
        sink.set_clock(0.65);
        scheduler.enqueue(segment(0.2)).unwrap();
        assert_eq!(sink.0.lock().unwrap().scheduled[2].1, 0.65);
    }

    #[test]
    fn test_reap_removes_completed_sources() {
        let sink = FakeSink::default();
        let mut scheduler = PlaybackScheduler::new(Box::new(sink.clone()));

        scheduler.enqueue(segment(0.5)).unwrap();
        assert_eq!(scheduler.active_sources(), 1);

        let id = sink.0.lock().unwrap().scheduled[0].0;
        sink.0.lock().unwrap().done.push(id);
        scheduler.reap();
        assert_eq!(scheduler.active_sources(), 0);
    }
}
