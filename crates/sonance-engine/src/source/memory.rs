//! Sounds backed by interleaved frames held in memory.

use std::sync::Arc;

use sonance_core::{Error, ReadResult, Reader, Result, Sound, Specs};

/// A finite sound whose frames live in a shared, immutable buffer.
///
/// Readers created from the same `MemorySound` share the buffer but keep
/// independent positions.
#[derive(Debug, Clone)]
pub struct MemorySound {
    samples: Arc<[f32]>,
    specs: Specs,
}

impl MemorySound {
    /// Wraps interleaved frames. The sample count must be a whole number
    /// of frames for the given specs.
    pub fn from_frames(samples: Vec<f32>, specs: Specs) -> Result<Self> {
        let specs = specs.validate()?;
        if samples.len() % specs.channels() != 0 {
            return Err(Error::specs(format!(
                "sample count {} is not a whole number of {}-channel frames",
                samples.len(),
                specs.channels()
            )));
        }
        Ok(Self {
            samples: samples.into(),
            specs,
        })
    }

    /// Renders a finite sound into memory so later readers avoid upstream
    /// work.
    pub fn cache(sound: &dyn Sound) -> Result<Self> {
        let mut reader = sound.create_reader()?;
        if reader.length().is_none() {
            return Err(Error::specs("cannot cache a sound of unknown length"));
        }
        let specs = reader.specs();
        let channels = specs.channels();

        let mut samples = Vec::new();
        let mut chunk = vec![0.0f32; 4096 * channels];
        loop {
            let result = reader.read(&mut chunk);
            samples.extend_from_slice(&chunk[..result.frames * channels]);
            if result.eos {
                break;
            }
        }
        Self::from_frames(samples, specs)
    }

    /// Total length in frames.
    pub fn frames(&self) -> u64 {
        (self.samples.len() / self.specs.channels()) as u64
    }

    pub fn specs(&self) -> Specs {
        self.specs
    }
}

impl Sound for MemorySound {
    fn create_reader(&self) -> Result<Box<dyn Reader>> {
        Ok(Box::new(MemoryReader {
            samples: Arc::clone(&self.samples),
            specs: self.specs,
            position: 0,
        }))
    }
}

/// Streams frames out of a shared memory buffer.
#[derive(Debug)]
pub struct MemoryReader {
    samples: Arc<[f32]>,
    specs: Specs,
    position: u64,
}

impl MemoryReader {
    fn total_frames(&self) -> u64 {
        (self.samples.len() / self.specs.channels()) as u64
    }
}

impl Reader for MemoryReader {
    fn specs(&self) -> Specs {
        self.specs
    }

    fn length(&self) -> Option<u64> {
        Some(self.total_frames())
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn seekable(&self) -> bool {
        true
    }

    fn seek(&mut self, frame: u64) -> bool {
        self.position = frame.min(self.total_frames());
        true
    }

    fn read(&mut self, out: &mut [f32]) -> ReadResult {
        let channels = self.specs.channels();
        let want = out.len() / channels;
        let remaining = (self.total_frames() - self.position) as usize;
        let frames = want.min(remaining);

        let start = self.position as usize * channels;
        out[..frames * channels].copy_from_slice(&self.samples[start..start + frames * channels]);
        self.position += frames as u64;
        ReadResult::new(frames, self.position >= self.total_frames())
    }
}
