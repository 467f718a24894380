//! Backward playback.

use sonance_core::{Error, ReadResult, Reader, Result, SampleBuffer, Specs};

/// Plays a finite, seekable stream back to front.
pub struct ReverseReader {
    reader: Box<dyn Reader>,
    length: u64,
    position: u64,
    scratch: SampleBuffer,
}

impl ReverseReader {
    pub fn new(reader: Box<dyn Reader>) -> Result<Self> {
        if !reader.seekable() {
            return Err(Error::specs("reverse requires a seekable source"));
        }
        let Some(length) = reader.length() else {
            return Err(Error::specs("reverse requires a source of known length"));
        };
        Ok(Self {
            reader,
            length,
            position: 0,
            scratch: SampleBuffer::new(),
        })
    }
}

/// Reads exactly `frames` frames starting at `start`, tolerating short
/// upstream reads.
pub(crate) fn read_segment(
    reader: &mut Box<dyn Reader>,
    start: u64,
    frames: usize,
    channels: usize,
    out: &mut [f32],
) -> usize {
    if !reader.seek(start) {
        return 0;
    }
    let mut filled = 0;
    while filled < frames {
        let result = reader.read(&mut out[filled * channels..frames * channels]);
        filled += result.frames;
        if result.frames == 0 {
            break;
        }
    }
    filled
}

impl Reader for ReverseReader {
    fn specs(&self) -> Specs {
        self.reader.specs()
    }

    fn length(&self) -> Option<u64> {
        Some(self.length)
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn seekable(&self) -> bool {
        true
    }

    fn seek(&mut self, frame: u64) -> bool {
        self.position = frame.min(self.length);
        true
    }

    fn read(&mut self, out: &mut [f32]) -> ReadResult {
        let channels = self.specs().channels();
        let want = out.len() / channels;
        let remaining = (self.length - self.position) as usize;
        let frames = want.min(remaining);
        if frames == 0 {
            return ReadResult::new(0, true);
        }

        self.scratch.ensure_size(frames * channels);
        let start = self.length - self.position - frames as u64;
        let got = read_segment(
            &mut self.reader,
            start,
            frames,
            channels,
            self.scratch.as_mut_slice(),
        );
        if got < frames {
            // Upstream shrank under us; treat the stream as ended.
            self.position = self.length;
            return ReadResult::new(0, true);
        }

        let scratch = self.scratch.as_slice();
        for frame in 0..frames {
            let src = (frames - 1 - frame) * channels;
            out[frame * channels..(frame + 1) * channels]
                .copy_from_slice(&scratch[src..src + channels]);
        }

        self.position += frames as u64;
        ReadResult::new(frames, self.position >= self.length)
    }
}
