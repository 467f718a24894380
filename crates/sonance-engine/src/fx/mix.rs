//! Sample-wise superposition of two streams.

use sonance_core::{Error, ReadResult, Reader, Result, SampleBuffer, Specs};

/// Sums two streams frame by frame.
///
/// When one side ends the other continues alone; the mix ends when both
/// have ended.
pub struct MixReader {
    first: Box<dyn Reader>,
    second: Box<dyn Reader>,
    first_eos: bool,
    second_eos: bool,
    position: u64,
    scratch: SampleBuffer,
}

impl MixReader {
    pub fn new(first: Box<dyn Reader>, second: Box<dyn Reader>) -> Result<Self> {
        if first.specs() != second.specs() {
            return Err(Error::specs(format!(
                "mix requires equal specs, got {:?} and {:?}",
                first.specs(),
                second.specs()
            )));
        }
        Ok(Self {
            first,
            second,
            first_eos: false,
            second_eos: false,
            position: 0,
            scratch: SampleBuffer::new(),
        })
    }
}

impl Reader for MixReader {
    fn specs(&self) -> Specs {
        self.first.specs()
    }

    fn length(&self) -> Option<u64> {
        match (self.first.length(), self.second.length()) {
            (Some(a), Some(b)) => Some(a.max(b)),
            _ => None,
        }
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn seekable(&self) -> bool {
        self.first.seekable() && self.second.seekable()
    }

    fn seek(&mut self, frame: u64) -> bool {
        if !self.first.seek(frame) || !self.second.seek(frame) {
            return false;
        }
        self.first_eos = false;
        self.second_eos = false;
        self.position = frame;
        true
    }

    fn read(&mut self, out: &mut [f32]) -> ReadResult {
        let channels = self.specs().channels();
        let want = out.len() / channels;

        let first_frames = if self.first_eos {
            0
        } else {
            let result = self.first.read(&mut out[..want * channels]);
            self.first_eos = result.eos;
            result.frames
        };
        out[first_frames * channels..want * channels].fill(0.0);

        let second_frames = if self.second_eos {
            0
        } else {
            self.scratch.ensure_size(want * channels);
            let result = self
                .second
                .read(&mut self.scratch.as_mut_slice()[..want * channels]);
            self.second_eos = result.eos;
            result.frames
        };

        let scratch = self.scratch.as_slice();
        for (sample, &other) in out
            .iter_mut()
            .zip(scratch.iter())
            .take(second_frames * channels)
        {
            *sample += other;
        }

        let frames = first_frames.max(second_frames);
        self.position += frames as u64;
        ReadResult::new(frames, self.first_eos && self.second_eos)
    }
}
