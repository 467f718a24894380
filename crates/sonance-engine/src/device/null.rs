//! A silent output backend for headless and test runs.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use sonance_core::{DeviceSpecs, Error, Result};

use crate::device::sink::{Sink, VoiceId};
use crate::device::spatial::{DistanceModel, ListenerParams, SpatialParams};

/// How fast the sink pretends to consume queued audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pacing {
    /// Wall-clock paced at the configured sample rate.
    Realtime,
    /// Every queued buffer is consumed at the next poll. Keeps tests fast.
    Immediate,
}

struct Voice {
    /// Frame counts of the queued buffers, oldest first.
    queued: VecDeque<usize>,
    playing: bool,
    /// Frames of consumption credit accumulated from the clock.
    budget: f64,
    last_tick: Instant,
}

impl Voice {
    fn new() -> Self {
        Self {
            queued: VecDeque::new(),
            playing: false,
            budget: 0.0,
            last_tick: Instant::now(),
        }
    }
}

/// Discards all audio, honoring queue pacing so transport behavior stays
/// realistic. Optionally captures every queued byte for inspection.
pub struct NullSink {
    specs: DeviceSpecs,
    pacing: Pacing,
    next_voice: u64,
    voices: HashMap<VoiceId, Voice>,
    capture: Option<Arc<Mutex<Vec<u8>>>>,
}

impl NullSink {
    /// A wall-clock paced silent sink.
    pub fn new(specs: DeviceSpecs) -> Self {
        Self {
            specs,
            pacing: Pacing::Realtime,
            next_voice: 0,
            voices: HashMap::new(),
            capture: None,
        }
    }

    /// A sink that consumes as fast as it is polled; useful for
    /// deterministic tests.
    pub fn immediate(specs: DeviceSpecs) -> Self {
        Self {
            pacing: Pacing::Immediate,
            ..Self::new(specs)
        }
    }

    /// Records every queued byte into `buffer`.
    pub fn with_capture(mut self, buffer: Arc<Mutex<Vec<u8>>>) -> Self {
        self.capture = Some(buffer);
        self
    }

    fn voice_mut(&mut self, voice: VoiceId) -> Option<&mut Voice> {
        self.voices.get_mut(&voice)
    }
}

impl Sink for NullSink {
    fn specs(&self) -> DeviceSpecs {
        self.specs
    }

    fn healthy(&self) -> bool {
        true
    }

    fn create_voice(&mut self) -> Result<VoiceId> {
        let id = VoiceId(self.next_voice);
        self.next_voice += 1;
        self.voices.insert(id, Voice::new());
        Ok(id)
    }

    fn destroy_voice(&mut self, voice: VoiceId) {
        self.voices.remove(&voice);
    }

    fn queue(&mut self, voice: VoiceId, frames: usize, data: &[u8]) -> Result<()> {
        if let Some(capture) = &self.capture {
            capture
                .lock()
                .expect("capture mutex poisoned")
                .extend_from_slice(data);
        }
        let entry = self
            .voice_mut(voice)
            .ok_or_else(|| Error::device("unknown voice"))?;
        entry.queued.push_back(frames);
        Ok(())
    }

    fn processed(&mut self, voice: VoiceId) -> usize {
        let rate = self.specs.rate as f64;
        let pacing = self.pacing;
        let Some(entry) = self.voice_mut(voice) else {
            return 0;
        };

        let now = Instant::now();
        if entry.playing {
            match pacing {
                Pacing::Realtime => {
                    entry.budget += now.duration_since(entry.last_tick).as_secs_f64() * rate;
                },
                Pacing::Immediate => {
                    entry.budget = entry.queued.iter().map(|&f| f as f64).sum();
                },
            }
        }
        entry.last_tick = now;

        let mut consumed = 0;
        while let Some(&frames) = entry.queued.front() {
            if entry.budget < frames as f64 {
                break;
            }
            entry.budget -= frames as f64;
            entry.queued.pop_front();
            consumed += 1;
        }
        if entry.queued.is_empty() {
            // Ran dry; a real source stops here.
            entry.playing = false;
            entry.budget = 0.0;
        }
        consumed
    }

    fn flush(&mut self, voice: VoiceId) {
        if let Some(entry) = self.voice_mut(voice) {
            entry.queued.clear();
            entry.budget = 0.0;
        }
    }

    fn playing(&self, voice: VoiceId) -> bool {
        self.voices.get(&voice).is_some_and(|v| v.playing)
    }

    fn start(&mut self, voice: VoiceId) {
        if let Some(entry) = self.voice_mut(voice) {
            entry.playing = true;
            entry.last_tick = Instant::now();
        }
    }

    fn pause(&mut self, voice: VoiceId) {
        if let Some(entry) = self.voice_mut(voice) {
            entry.playing = false;
        }
    }

    fn stop(&mut self, voice: VoiceId) {
        if let Some(entry) = self.voice_mut(voice) {
            entry.playing = false;
            entry.budget = 0.0;
        }
    }

    fn offset_seconds(&self, voice: VoiceId) -> f64 {
        self.voices
            .get(&voice)
            .map(|v| v.budget / self.specs.rate as f64)
            .unwrap_or(0.0)
    }

    fn set_volume(&mut self, _voice: VoiceId, _volume: f32) {}

    fn set_pitch(&mut self, _voice: VoiceId, _pitch: f32) {}

    fn set_spatial(&mut self, _voice: VoiceId, _params: &SpatialParams) {}

    fn set_listener(&mut self, _listener: &ListenerParams) {}

    fn set_distance_model(&mut self, _model: DistanceModel) {}

    fn set_master_volume(&mut self, _volume: f32) {}
}

#[cfg(test)]
mod tests {
    use super::NullSink;
    use crate::device::sink::Sink;
    use sonance_core::{ChannelLayout, DeviceSpecs, SampleFormat};

    fn specs() -> DeviceSpecs {
        DeviceSpecs::new(48_000, ChannelLayout::Mono, SampleFormat::S16)
    }

    #[test]
    fn immediate_pacing_consumes_on_poll() {
        let mut sink = NullSink::immediate(specs());
        let voice = sink.create_voice().expect("voice");
        sink.queue(voice, 4, &[0u8; 8]).expect("queued");
        sink.queue(voice, 4, &[0u8; 8]).expect("queued");

        // Not started yet: nothing is consumed.
        assert_eq!(sink.processed(voice), 0);
        sink.start(voice);
        assert_eq!(sink.processed(voice), 2);
        assert!(!sink.playing(voice), "drained voices stop");
    }

    #[test]
    fn capture_records_queued_bytes() {
        let buffer = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut sink = NullSink::immediate(specs()).with_capture(std::sync::Arc::clone(&buffer));
        let voice = sink.create_voice().expect("voice");
        sink.queue(voice, 2, &[1, 2, 3, 4]).expect("queued");
        assert_eq!(*buffer.lock().expect("capture"), vec![1, 2, 3, 4]);
    }
}
