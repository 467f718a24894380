//! Silence prefix.

use sonance_core::{Error, ReadResult, Reader, Result, Specs};

/// Prefixes the stream with a stretch of silence.
pub struct DelayReader {
    reader: Box<dyn Reader>,
    delay_frames: u64,
    remaining: u64,
    position: u64,
}

impl DelayReader {
    /// `delay` is in seconds of the upstream rate.
    pub fn new(reader: Box<dyn Reader>, delay: f64) -> Result<Self> {
        if !(delay >= 0.0) {
            return Err(Error::specs(format!(
                "delay must be non-negative, got {delay}"
            )));
        }
        let delay_frames = (delay * reader.specs().rate as f64).round() as u64;
        Ok(Self {
            reader,
            delay_frames,
            remaining: delay_frames,
            position: 0,
        })
    }
}

impl Reader for DelayReader {
    fn specs(&self) -> Specs {
        self.reader.specs()
    }

    fn length(&self) -> Option<u64> {
        self.reader.length().map(|len| len + self.delay_frames)
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn seekable(&self) -> bool {
        self.reader.seekable()
    }

    fn seek(&mut self, frame: u64) -> bool {
        let applied = if frame < self.delay_frames {
            if self.reader.seek(0) {
                self.remaining = self.delay_frames - frame;
                true
            } else {
                false
            }
        } else if self.reader.seek(frame - self.delay_frames) {
            self.remaining = 0;
            true
        } else {
            false
        };
        if applied {
            self.position = frame;
        }
        applied
    }

    fn read(&mut self, out: &mut [f32]) -> ReadResult {
        let channels = self.specs().channels();
        let want = out.len() / channels;

        let silent = (self.remaining.min(want as u64)) as usize;
        out[..silent * channels].fill(0.0);
        self.remaining -= silent as u64;

        let mut produced = silent;
        let mut eos = false;
        if produced < want {
            let upstream = self
                .reader
                .read(&mut out[produced * channels..want * channels]);
            produced += upstream.frames;
            eos = upstream.eos;
        }

        self.position += produced as u64;
        ReadResult::new(produced, eos && self.remaining == 0)
    }
}
